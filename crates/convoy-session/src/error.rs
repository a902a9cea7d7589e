// ── Session error types ──
//
// Everything a driver can fail with. Callers only distinguish "could not
// get a session" (Driver / Open) from "a session operation failed"
// (Operation / Unsupported / Io); the reason strings are for logs.

use thiserror::Error;

/// Unified error type for session drivers.
#[derive(Debug, Error)]
pub enum SessionError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("failed to construct driver for platform '{platform}': {reason}")]
    Driver { platform: String, reason: String },

    #[error("failed to open session to {address}: {reason}")]
    Open { address: String, reason: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("operation failed: {0}")]
    Operation(String),

    #[error("operation not supported by this driver: {0}")]
    Unsupported(&'static str),

    #[error("session i/o error: {0}")]
    Io(#[from] std::io::Error),
}
