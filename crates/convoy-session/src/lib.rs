//! Device session capability consumed by `convoy-core`.
//!
//! This crate defines the seam between the dispatch pipeline and whatever
//! actually talks to a device:
//!
//! - **[`Session`]** — one open connection to one device. Commands, raw
//!   config pushes, and structured config-management operations run through
//!   it and return typed responses.
//!
//! - **[`SessionFactory`]** — opens sessions from a platform name, an
//!   address, and an ordered [`SessionOption`] list. The option list is
//!   layered: when the same concern appears twice, the later entry wins.
//!
//! - **[`system::SystemFactory`]** — the bundled driver. A thin shim over
//!   the local `ssh` binary (the "system" transport); it executes one
//!   remote command per exec and reports structured config-management
//!   operations as unsupported. Real network-OS drivers plug in behind the
//!   same traits.

pub mod error;
pub mod options;
pub mod response;
pub mod system;

pub use error::SessionError;
pub use options::{SessionOption, Transport};
pub use response::{CfgResponse, DiffResponse, MultiResponse, Response};
pub use system::SystemFactory;

use async_trait::async_trait;

/// One open connection to one device.
///
/// Implementations are driven by a single worker at a time, so methods take
/// `&mut self`; no internal locking is expected.
#[async_trait]
pub trait Session: Send {
    /// Send a batch of commands, returning one [`Response`] per command.
    async fn send_commands(&mut self, commands: &[String]) -> Result<MultiResponse, SessionError>;

    /// Push raw configuration lines. The response is not expected to carry
    /// meaningful output.
    async fn send_configs(&mut self, configs: &[String]) -> Result<Response, SessionError>;

    /// Retrieve the named datastore (e.g. "running").
    async fn get_config(&mut self, source: &str) -> Result<CfgResponse, SessionError>;

    /// Load a candidate configuration; `replace` selects replace-vs-merge.
    /// The change stays pending until [`commit_config`](Self::commit_config)
    /// or [`abort_config`](Self::abort_config).
    async fn load_config(&mut self, config: &str, replace: bool)
    -> Result<CfgResponse, SessionError>;

    /// Diff the pending candidate against the named datastore.
    async fn diff_config(&mut self, source: &str) -> Result<DiffResponse, SessionError>;

    /// Commit the pending candidate configuration.
    async fn commit_config(&mut self) -> Result<(), SessionError>;

    /// Discard the pending candidate configuration.
    async fn abort_config(&mut self) -> Result<(), SessionError>;

    /// Tear the connection down. Best effort; workers ignore close errors.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens [`Session`]s for devices.
///
/// A factory is shared across every device worker of a run, so it must be
/// cheap to call concurrently.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a session to `address` using the driver selected by `platform`.
    ///
    /// Driver construction failures and connection/authentication failures
    /// both surface here; callers treat either as the device being
    /// unreachable.
    async fn open(
        &self,
        platform: &str,
        address: &str,
        options: &[SessionOption],
    ) -> Result<Box<dyn Session>, SessionError>;
}
