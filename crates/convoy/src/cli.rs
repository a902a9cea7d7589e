//! Clap derive structures for the `convoy` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// convoy -- run commands against a fleet of network devices
#[derive(Debug, Parser)]
#[command(
    name = "convoy",
    version = crate::build_info::long_version(),
    about = "Run commands against a fleet of network devices",
    long_about = "Runs batches of commands, raw configuration pushes, and structured\n\
        config-management operations against every device in a declarative\n\
        inventory, concurrently, and collects the per-device outputs."
)]
pub struct Cli {
    /// Path to the inventory file
    #[arg(
        long,
        short = 'i',
        env = "CONVOY_INVENTORY",
        default_value = "inventory.yml"
    )]
    pub inventory: PathBuf,

    /// Output destination
    #[arg(long, short = 'o', env = "CONVOY_OUTPUT", default_value = "file")]
    pub output: OutputMode,

    /// Append the run-start timestamp to the output directory
    #[arg(long, short = 't')]
    pub add_timestamp: bool,

    /// Regular expression selecting the devices to run against
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Platform name [single-device mode]
    #[arg(long, short = 'k', long_help = platform_help())]
    pub platform: Option<String>,

    /// Device address; setting it switches to single-device mode
    #[arg(long, short = 'a')]
    pub address: Option<String>,

    /// Username for the connection [single-device mode]
    #[arg(long, short = 'u', env = "CONVOY_USERNAME")]
    pub username: Option<String>,

    /// Password for the connection [single-device mode]
    #[arg(long, short = 'p', env = "CONVOY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Commands to send, separated with `::`; with an inventory this
    /// overrides every device's command list
    #[arg(long, short = 'c')]
    pub commands: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

fn platform_help() -> &'static str {
    use std::sync::OnceLock;

    static HELP: OnceLock<String> = OnceLock::new();

    HELP.get_or_init(|| {
        format!(
            "Platform name [single-device mode]. Platforms with specialized \
             drivers: {}; anything else uses the generic driver.",
            convoy_core::SUPPORTED_PLATFORMS.join(", ")
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// One file per response record under the outputs directory
    File,
    /// Human-readable, colorized terminal output
    Stdout,
}
