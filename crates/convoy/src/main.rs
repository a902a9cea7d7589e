mod build_info;
mod cli;
mod error;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use convoy_core::{Dispatcher, Inventory, ResponseWriter, SingleDeviceFlags};
use convoy_session::SystemFactory;

use crate::cli::{Cli, OutputMode};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    // Progress and per-device failure reporting ride on info-level logs,
    // so the floor is info rather than warn.
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut inventory = load_inventory(&cli)?;

    inventory.prompt_secrets()?;

    let writer = match cli.output {
        OutputMode::File => ResponseWriter::file(cli.add_timestamp),
        OutputMode::Stdout => ResponseWriter::console(),
    };
    let output_dir = writer.output_dir().map(Path::to_path_buf);

    if output_dir.is_some() {
        info!("started sending commands and capturing outputs");
    }

    let dispatcher = Dispatcher::new(Arc::new(SystemFactory::new()));
    let summary = dispatcher.run(&inventory, writer).await?;

    debug!(
        dispatched = summary.dispatched,
        failed = summary.failed,
        "dispatch finished"
    );

    if let Some(dir) = output_dir {
        info!(dir = %dir.display(), "outputs have been saved");
    }

    Ok(())
}

/// Build the inventory from the file, or from discrete flags when
/// `--address` puts us in single-device mode.
fn load_inventory(cli: &Cli) -> Result<Inventory, CliError> {
    let inventory = if let Some(ref address) = cli.address {
        Inventory::from_flags(&SingleDeviceFlags {
            platform: cli.platform.clone().unwrap_or_default(),
            address: address.clone(),
            username: cli.username.clone().unwrap_or_default(),
            password: cli.password.clone().unwrap_or_default(),
            commands: cli.commands.clone().unwrap_or_default(),
        })?
    } else {
        Inventory::from_file(&cli.inventory, cli.filter.as_deref(), cli.commands.as_deref())?
    };

    Ok(inventory)
}
