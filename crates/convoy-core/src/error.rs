// ── Core error types ──
//
// Configuration errors only: everything here is fatal and raised before
// any device worker is launched. Device-scoped failures (connection,
// operation) never surface as typed errors -- they are logged at the
// worker boundary and become a payload-less result tuple.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for inventory resolution and option building.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Inventory errors ─────────────────────────────────────────────
    #[error("failed to read inventory file '{path}': {source}")]
    InventoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed inventory: {0}")]
    InventoryParse(#[from] serde_yaml::Error),

    #[error("no devices to send commands to")]
    NoDevices,

    #[error("invalid device filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("required flag '{flag}' is not set in single-device mode")]
    MissingField { flag: &'static str },

    #[error("credential prompt failed: {0}")]
    Prompt(String),

    // ── Profile resolution errors ────────────────────────────────────
    #[error("device '{device}' references unknown credential profile '{name}'")]
    UnknownCredentialProfile { device: String, name: String },

    #[error("device '{device}' references unknown transport profile '{name}'")]
    UnknownTransportProfile { device: String, name: String },

    #[error("invalid transport type '{value}': expected one of [standard, system, telnet]")]
    InvalidTransportType { value: String },
}
