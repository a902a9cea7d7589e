//! Declarative inventory: devices plus named credential and transport
//! profiles.
//!
//! The YAML schema is strict -- unknown keys are a hard error, so typos in
//! an inventory fail the run instead of silently dropping settings. All
//! maps are read-only once loading finishes; the only post-load mutation
//! is the CLI-level command override, which replaces every device's
//! command list before dispatch.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use regex::Regex;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::error::CoreError;

/// Name of the implicit profile devices fall back to.
pub const DEFAULT_PROFILE: &str = "default";

/// Delimiter for the `--commands` flag value.
pub const COMMAND_DELIMITER: &str = "::";

// ── Schema ───────────────────────────────────────────────────────────

/// A whole inventory: one run's devices and profiles.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inventory {
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,

    #[serde(default)]
    pub credentials: HashMap<String, CredentialProfile>,

    #[serde(default)]
    pub transports: HashMap<String, TransportProfile>,
}

/// One remote target. Immutable after inventory load (except the global
/// command override).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Device {
    /// Platform identifier; a known platform selects a specialized driver,
    /// anything else the generic one.
    pub platform: String,

    pub address: String,

    /// Credential profile name; `default` when omitted.
    #[serde(default)]
    pub credentials: Option<String>,

    /// Transport profile name; `default` when omitted.
    #[serde(default)]
    pub transport: Option<String>,

    #[serde(default)]
    pub send_commands: Vec<String>,

    #[serde(default)]
    pub send_commands_from_file: Option<PathBuf>,

    #[serde(default)]
    pub send_configs: Vec<String>,

    #[serde(default)]
    pub send_configs_from_file: Option<PathBuf>,

    #[serde(default)]
    pub cfg_operations: Vec<CfgOperation>,
}

impl Device {
    /// Credential profile name to resolve for this device.
    pub fn credential_profile(&self) -> &str {
        self.credentials.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// Transport profile name to resolve for this device.
    pub fn transport_profile(&self) -> &str {
        self.transport.as_deref().unwrap_or(DEFAULT_PROFILE)
    }
}

/// Named credential bundle referenced by devices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CredentialProfile {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: Option<SecretString>,

    /// Secondary / enable password.
    #[serde(default)]
    pub secondary_password: Option<SecretString>,

    #[serde(default)]
    pub private_key: Option<PathBuf>,

    /// Ask for username/password on stdin instead of storing them here.
    #[serde(default)]
    pub prompt: bool,
}

/// Named transport settings referenced by devices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TransportProfile {
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub strict_key: bool,

    #[serde(default)]
    pub ssh_config_file: Option<PathBuf>,

    /// One of `standard`, `system`, `telnet`; validated at option build
    /// time, not at decode time.
    #[serde(default)]
    pub transport: Option<String>,
}

/// A structured config-management action, distinct from raw command or
/// config-text submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CfgOperation {
    #[serde(rename = "type")]
    pub op: CfgOperationType,

    /// Source datastore for get-config and diffs.
    #[serde(default = "default_source")]
    pub source: String,

    /// Inline payload for load-config.
    #[serde(default)]
    pub config: Option<String>,

    /// File-sourced payload for load-config.
    #[serde(default)]
    pub config_from_file: Option<PathBuf>,

    /// Replace instead of merge.
    #[serde(default)]
    pub replace: bool,

    /// Diff the candidate against the source datastore after loading.
    #[serde(default)]
    pub diff: bool,

    /// Commit the candidate. The default is to abort: a load without
    /// `commit: true` is discarded.
    #[serde(default)]
    pub commit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CfgOperationType {
    #[serde(rename = "get-config")]
    GetConfig,
    #[serde(rename = "load-config")]
    LoadConfig,
}

fn default_source() -> String {
    "running".to_string()
}

// ── Single-device flag mode ──────────────────────────────────────────

/// Discrete flags for running against one device without an inventory
/// file. Empty strings mean "not provided".
#[derive(Debug, Clone, Default)]
pub struct SingleDeviceFlags {
    pub platform: String,
    pub address: String,
    pub username: String,
    pub password: String,
    pub commands: String,
}

// ── Loading ──────────────────────────────────────────────────────────

impl Inventory {
    /// Load an inventory file, apply the device-name filter, and apply the
    /// CLI-level command override.
    pub fn from_file(
        path: &Path,
        filter: Option<&str>,
        commands_override: Option<&str>,
    ) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::InventoryRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut inventory: Self = serde_yaml::from_str(&raw)?;

        if let Some(pattern) = filter {
            inventory.filter_devices(pattern)?;
        }

        if inventory.devices.is_empty() {
            return Err(CoreError::NoDevices);
        }

        // User-provided commands take precedence over the inventory.
        if let Some(commands) = commands_override {
            let commands = split_commands(commands);
            for device in inventory.devices.values_mut() {
                device.send_commands.clone_from(&commands);
            }
        }

        debug!(devices = inventory.devices.len(), "inventory loaded");

        Ok(inventory)
    }

    /// Synthesize a one-device inventory from discrete flags. The device is
    /// keyed by its address and wired to a synthetic `default` credential
    /// profile.
    pub fn from_flags(flags: &SingleDeviceFlags) -> Result<Self, CoreError> {
        if flags.platform.is_empty() {
            return Err(CoreError::MissingField { flag: "platform" });
        }
        if flags.username.is_empty() {
            return Err(CoreError::MissingField { flag: "username" });
        }
        if flags.password.is_empty() {
            return Err(CoreError::MissingField { flag: "password" });
        }
        if flags.commands.is_empty() {
            return Err(CoreError::MissingField { flag: "commands" });
        }

        let mut inventory = Self::default();

        inventory.credentials.insert(
            DEFAULT_PROFILE.to_string(),
            CredentialProfile {
                username: flags.username.clone(),
                password: Some(SecretString::from(flags.password.clone())),
                // The enable password mirrors the login password in flag mode.
                secondary_password: Some(SecretString::from(flags.password.clone())),
                ..CredentialProfile::default()
            },
        );

        inventory.devices.insert(
            flags.address.clone(),
            Device {
                platform: flags.platform.clone(),
                address: flags.address.clone(),
                credentials: None,
                transport: None,
                send_commands: split_commands(&flags.commands),
                send_commands_from_file: None,
                send_configs: Vec::new(),
                send_configs_from_file: None,
                cfg_operations: Vec::new(),
            },
        );

        Ok(inventory)
    }

    /// Remove devices whose names do not match `pattern`.
    fn filter_devices(&mut self, pattern: &str) -> Result<(), CoreError> {
        if pattern.is_empty() {
            return Ok(());
        }

        let re = Regex::new(pattern).map_err(|source| CoreError::InvalidFilter {
            pattern: pattern.to_string(),
            source,
        })?;

        self.devices.retain(|name, _| re.is_match(name));

        Ok(())
    }

    /// Interactively fill in credential profiles marked `prompt: true`.
    ///
    /// Reads an echoed username and a masked password from the terminal and
    /// stores them on the profile. Must run before dispatch; workers never
    /// touch stdin.
    pub fn prompt_secrets(&mut self) -> Result<(), CoreError> {
        // BTreeMap-style determinism doesn't matter here, but sort the
        // names so multiple prompts appear in a stable order.
        let mut names: Vec<String> = self
            .credentials
            .iter()
            .filter(|(_, profile)| profile.prompt)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();

        for name in names {
            println!("credential profile '{name}' is set to prompt:");

            let username: String = dialoguer::Input::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(|e| CoreError::Prompt(e.to_string()))?;

            let password = rpassword::prompt_password("Password: ")
                .map_err(|e| CoreError::Prompt(e.to_string()))?;

            if let Some(profile) = self.credentials.get_mut(&name) {
                profile.username = username;
                profile.password = Some(SecretString::from(password));
            }
        }

        Ok(())
    }
}

fn split_commands(commands: &str) -> Vec<String> {
    commands
        .split(COMMAND_DELIMITER)
        .map(ToString::to_string)
        .collect()
}
