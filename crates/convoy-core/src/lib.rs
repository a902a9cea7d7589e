//! Dispatch-and-aggregation pipeline for running operation batches
//! against a fleet of devices.
//!
//! The pieces, in control-flow order:
//!
//! - **[`Inventory`]** — devices plus named credential/transport profiles,
//!   loaded from a strict YAML file or synthesized from single-device
//!   flags, filtered by a name regex.
//!
//! - **[`OptionBuilder`]** — resolves a device's profile references into
//!   the ordered option list the session capability understands.
//!
//! - **Device workers** ([`worker`]) — one concurrent task per device,
//!   each emitting exactly one [`DeviceResult`].
//!
//! - **[`Dispatcher`]** — fans workers out, funnels their results through
//!   a single aggregator task, and drives the submit/drain completion
//!   protocol.
//!
//! - **[`ResponseWriter`]** — renders results to the console or to one
//!   file per response record.
//!
//! All configuration errors surface before dispatch; per-device failures
//! are reported per device and never fail the run.

pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod options;
pub mod output;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use dispatch::{Dispatcher, RunSummary};
pub use error::CoreError;
pub use inventory::{
    CfgOperation, CfgOperationType, CredentialProfile, Device, Inventory, SingleDeviceFlags,
    TransportProfile, COMMAND_DELIMITER, DEFAULT_PROFILE,
};
pub use options::{OptionBuilder, SUPPORTED_PLATFORMS};
pub use output::{sanitize, OutputError, ResponseWriter, OUTPUT_DIR_BASE};
pub use worker::{DeviceResult, Record};
