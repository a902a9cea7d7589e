//! CLI error types with miette diagnostics.
//!
//! Only configuration errors reach this type: per-device failures are
//! reported on the chosen sink and never fail the process.

use miette::Diagnostic;
use thiserror::Error;

use convoy_core::CoreError;

/// Exit codes for the `convoy` binary. Argument parse failures exit with
/// clap's own usage code (2).
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("invalid inventory: {source}")]
    #[diagnostic(
        code(convoy::inventory),
        help(
            "Check the inventory file: top-level maps are 'devices',\n\
             'credentials' and 'transports', and unknown keys are rejected."
        )
    )]
    Inventory {
        #[source]
        source: CoreError,
    },

    #[error("{source}")]
    #[diagnostic(
        code(convoy::single_device),
        help(
            "Single-device mode needs --platform, --username, --password\n\
             and --commands alongside --address."
        )
    )]
    SingleDevice {
        #[source]
        source: CoreError,
    },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Inventory { .. } | Self::SingleDevice { .. } => exit_code::CONFIG,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(source: CoreError) -> Self {
        match source {
            CoreError::MissingField { .. } => Self::SingleDevice { source },
            _ => Self::Inventory { source },
        }
    }
}
