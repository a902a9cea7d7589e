//! Per-device unit of concurrent execution.
//!
//! A worker opens a session, runs the device's operation sequence in fixed
//! stage order (structured config-management operations, raw config
//! pushes, command batches), and reduces the outcome to one
//! [`DeviceResult`]. Failures never cross the worker boundary as typed
//! errors: they are logged with the device name and collapse into a
//! payload-less tuple, so one broken device cannot disturb the rest of the
//! run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error};

use convoy_session::{
    CfgResponse, DiffResponse, MultiResponse, Session, SessionError, SessionFactory, SessionOption,
};

use crate::inventory::{CfgOperationType, Device};

/// One response record, tagged by the operation kind that produced it.
/// The output writer matches exhaustively over these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// One command batch: per-command input, output, and failure flag.
    Command(MultiResponse),
    /// A structured config-management result (get-config or load-config).
    Cfg(CfgResponse),
    /// A candidate-vs-datastore diff in its three renderings.
    Diff(DiffResponse),
}

/// The single message a worker emits: a success payload (ordered records)
/// or a failure marker.
#[derive(Debug)]
pub struct DeviceResult {
    pub name: String,
    /// `None` marks the device as failed.
    pub records: Option<Vec<Record>>,
}

#[derive(Debug, Error)]
enum StageError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to read '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("load-config requires either 'config' or 'config-from-file'")]
    MissingPayload,
}

/// Run one device's full operation sequence. Always returns exactly one
/// result; any stage failure short-circuits the remaining stages.
pub(crate) async fn run_device(
    name: &str,
    device: &Device,
    options: Vec<SessionOption>,
    factory: &dyn SessionFactory,
) -> DeviceResult {
    let records = match run_stages(name, device, options, factory).await {
        Ok(records) => Some(records),
        Err(err) => {
            error!(device = name, error = %err, "device failed");
            None
        }
    };

    DeviceResult {
        name: name.to_string(),
        records,
    }
}

async fn run_stages(
    name: &str,
    device: &Device,
    options: Vec<SessionOption>,
    factory: &dyn SessionFactory,
) -> Result<Vec<Record>, StageError> {
    let mut session = factory
        .open(&device.platform, &device.address, &options)
        .await?;

    let mut records = Vec::new();

    let outcome = run_operations(device, session.as_mut(), &mut records).await;

    // Close regardless of how the stages went; close errors are not worth
    // failing an otherwise-successful device over.
    if let Err(err) = session.close().await {
        debug!(device = name, error = %err, "error closing session");
    }

    outcome.map(|()| records)
}

async fn run_operations(
    device: &Device,
    session: &mut dyn Session,
    records: &mut Vec<Record>,
) -> Result<(), StageError> {
    // Stage: structured config-management operations, in array order.
    for operation in &device.cfg_operations {
        match operation.op {
            CfgOperationType::GetConfig => {
                let response = session.get_config(&operation.source).await?;
                records.push(Record::Cfg(response));
            }
            CfgOperationType::LoadConfig => {
                let payload = match (&operation.config, &operation.config_from_file) {
                    (Some(inline), _) => inline.clone(),
                    (None, Some(path)) => read_file(path).await?,
                    (None, None) => return Err(StageError::MissingPayload),
                };

                let response = session.load_config(&payload, operation.replace).await?;
                records.push(Record::Cfg(response));

                if operation.diff {
                    let diff = session.diff_config(&operation.source).await?;
                    records.push(Record::Diff(diff));
                }

                // The candidate is discarded unless the operation asks for
                // a commit explicitly.
                if operation.commit {
                    session.commit_config().await?;
                } else {
                    session.abort_config().await?;
                }
            }
        }
    }

    // Stage: raw config pushes, file-sourced then inline. No records --
    // config pushes are not expected to yield meaningful output.
    if let Some(ref path) = device.send_configs_from_file {
        let configs = read_lines(path).await?;
        session.send_configs(&configs).await?;
    }

    if !device.send_configs.is_empty() {
        session.send_configs(&device.send_configs).await?;
    }

    // Stage: command batches, file-sourced then inline. One record per
    // batch.
    if let Some(ref path) = device.send_commands_from_file {
        let commands = read_lines(path).await?;
        let response = session.send_commands(&commands).await?;
        records.push(Record::Command(response));
    }

    if !device.send_commands.is_empty() {
        let response = session.send_commands(&device.send_commands).await?;
        records.push(Record::Command(response));
    }

    Ok(())
}

async fn read_file(path: &Path) -> Result<String, StageError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StageError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Newline-delimited file, blank lines skipped.
async fn read_lines(path: &Path) -> Result<Vec<String>, StageError> {
    Ok(read_file(path)
        .await?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ToString::to_string)
        .collect())
}
