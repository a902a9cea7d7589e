//! Connection option model.
//!
//! Options are collected into an ordered list by the caller and applied in
//! order by drivers — a later option overrides an earlier one for the same
//! concern, which lets defaults be layered below profile overrides without
//! any merge logic.

use std::path::PathBuf;

use secrecy::SecretString;
use strum::{Display, EnumString};

/// Transport used to reach a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    /// In-process SSH implementation.
    #[default]
    Standard,
    /// The local `ssh` binary.
    System,
    /// Plaintext telnet.
    Telnet,
}

/// One connection option. Secrets are wrapped so `Debug` output and logs
/// never leak them.
#[derive(Debug, Clone)]
pub enum SessionOption {
    AuthUsername(String),
    AuthPassword(SecretString),
    AuthSecondary(SecretString),
    AuthPrivateKey(PathBuf),
    AuthStrictKey(bool),
    Port(u16),
    SshConfigFile(PathBuf),
    TransportType(Transport),
}
