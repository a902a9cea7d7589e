//! Result sinks: colorized console output or one file per response
//! record under a per-run directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use owo_colors::OwoColorize;
use thiserror::Error;
use tracing::warn;

use crate::worker::{DeviceResult, Record};

/// Base name of the per-run output directory.
pub const OUTPUT_DIR_BASE: &str = "outputs";

const BANNER: &str = "**************************";

/// Output write failures. Logged by the aggregator, never fatal: an output
/// error must not leave the completion count short.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The sink a run writes device results to.
#[derive(Debug)]
pub enum ResponseWriter {
    Console(ConsoleWriter),
    File(FileWriter),
}

impl ResponseWriter {
    /// Console sink: banners and per-record output on the terminal.
    pub fn console() -> Self {
        Self::Console(ConsoleWriter)
    }

    /// File sink under the default `outputs` directory, optionally
    /// suffixed with the run-start timestamp so concurrent runs do not
    /// collide.
    pub fn file(timestamp: bool) -> Self {
        let dir = if timestamp {
            let now = chrono::Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
            PathBuf::from(format!("{OUTPUT_DIR_BASE}_{now}"))
        } else {
            PathBuf::from(OUTPUT_DIR_BASE)
        };

        Self::File(FileWriter { dir })
    }

    /// File sink rooted at an explicit directory.
    pub fn file_at(dir: impl Into<PathBuf>) -> Self {
        Self::File(FileWriter { dir: dir.into() })
    }

    /// The output directory, for the end-of-run summary log. `None` for
    /// the console sink.
    pub fn output_dir(&self) -> Option<&Path> {
        match self {
            Self::Console(_) => None,
            Self::File(writer) => Some(&writer.dir),
        }
    }

    /// Write one device's result. Called from the single aggregator task,
    /// so per-device output is never interleaved.
    pub fn write(&self, result: &DeviceResult) -> Result<(), OutputError> {
        match self {
            Self::Console(writer) => {
                writer.write(result);
                Ok(())
            }
            Self::File(writer) => writer.write(result),
        }
    }
}

// ── Console sink ─────────────────────────────────────────────────────

/// Writes banners and labels to stderr and result text to stdout, green
/// for success, red for failure.
#[derive(Debug)]
pub struct ConsoleWriter;

impl ConsoleWriter {
    fn write(&self, result: &DeviceResult) {
        let Some(ref records) = result.records else {
            eprintln!(
                "{}",
                format!("\n{BANNER}\n{} failed\n{BANNER}", result.name).red()
            );
            return;
        };

        eprintln!(
            "{}",
            format!("\n{BANNER}\n{}\n{BANNER}", result.name).green()
        );

        for record in records {
            match record {
                Record::Command(batch) => {
                    for response in &batch.responses {
                        eprintln!("{}", format!("\n-- {}:", response.input).bold());
                        if response.failed {
                            println!("{}", response.result.red());
                        } else {
                            println!("{}", response.result);
                        }
                    }
                }
                Record::Cfg(response) => {
                    eprintln!("{}", format!("\n-- {}:", response.operation).bold());
                    println!("{}", response.result);
                }
                Record::Diff(diff) => {
                    eprintln!("{}", format!("\n-- {}:", diff.operation).bold());
                    println!("{}", diff.composite());
                }
            }
        }
    }
}

// ── File sink ────────────────────────────────────────────────────────

/// Writes one file per response record under
/// `<dir>/<device-name>/<sanitized-label>`. Each device worker owns its
/// subdirectory exclusively, so no cross-device locking is needed.
#[derive(Debug)]
pub struct FileWriter {
    dir: PathBuf,
}

impl FileWriter {
    fn write(&self, result: &DeviceResult) -> Result<(), OutputError> {
        let Some(ref records) = result.records else {
            // No artifact for a failed device; this line (and the worker's
            // error log) is how the failure stays visible on the file sink.
            warn!(device = %result.name, "device failed, no outputs captured");
            return Ok(());
        };

        let device_dir = self.dir.join(&result.name);
        fs::create_dir_all(&device_dir).map_err(|source| OutputError::CreateDir {
            path: device_dir.clone(),
            source,
        })?;

        for record in records {
            match record {
                Record::Command(batch) => {
                    for response in &batch.responses {
                        write_record(&device_dir, &response.input, &response.result)?;
                    }
                }
                Record::Cfg(response) => {
                    write_record(&device_dir, &response.operation, &response.result)?;
                }
                Record::Diff(diff) => {
                    write_record(&device_dir, &diff.operation, &diff.composite())?;
                }
            }
        }

        Ok(())
    }
}

fn write_record(device_dir: &Path, label: &str, content: &str) -> Result<(), OutputError> {
    let path = device_dir.join(sanitize(label));
    fs::write(&path, content).map_err(|source| OutputError::WriteFile { path, source })
}

/// Reduce an operation label to a safe file name: quotes and commas are
/// stripped, anything outside `[0-9A-Za-z._-]` becomes `-`.
pub fn sanitize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | ','))
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use convoy_session::{CfgResponse, DiffResponse, MultiResponse, Response};

    use super::*;

    fn command_record(input: &str, result: &str) -> Record {
        Record::Command(MultiResponse {
            responses: vec![Response {
                input: input.to_string(),
                result: result.to_string(),
                failed: false,
            }],
        })
    }

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize("show version"), "show-version");
        assert_eq!(sanitize("show ip route 0.0.0.0/0"), "show-ip-route-0.0.0.0-0");
        assert_eq!(sanitize(r#"show run | include "user,name""#), "show-run---include-username");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for label in [
            "show version",
            r#"weird "label", with / and \ stuff"#,
            "already-clean_label.txt",
            "",
        ] {
            let once = sanitize(label);
            assert_eq!(sanitize(&once), once);
            assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
        }
    }

    #[test]
    fn file_writer_writes_one_file_per_response() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResponseWriter::file_at(dir.path().join("outputs"));

        let result = DeviceResult {
            name: "edge-1".to_string(),
            records: Some(vec![
                command_record("show version", "Arista vEOS"),
                command_record("show clock", "12:00:00"),
            ]),
        };

        writer.write(&result).unwrap();

        let base = dir.path().join("outputs").join("edge-1");
        assert_eq!(
            fs::read_to_string(base.join("show-version")).unwrap(),
            "Arista vEOS"
        );
        assert_eq!(
            fs::read_to_string(base.join("show-clock")).unwrap(),
            "12:00:00"
        );
    }

    #[test]
    fn file_writer_renders_diff_records_as_composite() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResponseWriter::file_at(dir.path().join("outputs"));

        let result = DeviceResult {
            name: "edge-1".to_string(),
            records: Some(vec![
                Record::Cfg(CfgResponse {
                    operation: "get-config-running".into(),
                    result: "running config".into(),
                }),
                Record::Diff(DiffResponse {
                    operation: "diff-running".into(),
                    device_diff: "dev".into(),
                    side_by_side_diff: "sbs".into(),
                    unified_diff: "uni".into(),
                }),
            ]),
        };

        writer.write(&result).unwrap();

        let base = dir.path().join("outputs").join("edge-1");
        assert_eq!(
            fs::read_to_string(base.join("get-config-running")).unwrap(),
            "running config"
        );

        let composite = fs::read_to_string(base.join("diff-running")).unwrap();
        assert!(composite.contains("=== device diff ===\ndev"));
        assert!(composite.contains("=== side-by-side diff ===\nsbs"));
        assert!(composite.contains("=== unified diff ===\nuni"));
    }

    #[test]
    fn failed_device_produces_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResponseWriter::file_at(dir.path().join("outputs"));

        let result = DeviceResult {
            name: "edge-1".to_string(),
            records: None,
        };

        writer.write(&result).unwrap();

        assert!(!dir.path().join("outputs").join("edge-1").exists());
    }

    #[test]
    fn console_writer_handles_both_outcomes() {
        let writer = ResponseWriter::console();

        writer
            .write(&DeviceResult {
                name: "edge-1".to_string(),
                records: Some(vec![command_record("show version", "ok")]),
            })
            .unwrap();

        writer
            .write(&DeviceResult {
                name: "edge-2".to_string(),
                records: None,
            })
            .unwrap();
    }

    #[test]
    fn timestamped_directory_extends_the_base_name() {
        let writer = ResponseWriter::file(true);
        let dir = writer.output_dir().unwrap().to_string_lossy().into_owned();
        assert!(dir.starts_with("outputs_"));
        assert!(dir.len() > "outputs_".len());
    }
}
