//! Turns resolved inventory profiles into the ordered option list the
//! session capability understands.
//!
//! Ordering matters: credentials are layered before transport settings,
//! and the transport defaults are pushed before any profile overrides, so
//! drivers that treat duplicate options as overrides see the right final
//! value without any merge logic here.

use convoy_session::{SessionOption, Transport};

use crate::error::CoreError;
use crate::inventory::{Device, Inventory, DEFAULT_PROFILE};

/// Platforms with specialized drivers. Anything else falls back to the
/// generic driver; the list mostly feeds help/error text.
pub const SUPPORTED_PLATFORMS: &[&str] = &[
    "arista_eos",
    "cisco_iosxr",
    "cisco_iosxe",
    "cisco_nxos",
    "juniper_junos",
    "nokia_sros",
    "nokia_sros_classic",
    "nokia_srlinux",
];

/// Resolves per-device connection options against the inventory's profile
/// maps. Read-only; shared freely.
pub struct OptionBuilder<'a> {
    inventory: &'a Inventory,
}

impl<'a> OptionBuilder<'a> {
    pub fn new(inventory: &'a Inventory) -> Self {
        Self { inventory }
    }

    /// Resolve the full option list for one device: credential profile
    /// first, then transport profile.
    pub fn resolve(&self, name: &str, device: &Device) -> Result<Vec<SessionOption>, CoreError> {
        let mut options = Vec::new();

        self.push_credentials(name, device, &mut options)?;
        self.push_transport(name, device, &mut options)?;

        Ok(options)
    }

    fn push_credentials(
        &self,
        name: &str,
        device: &Device,
        options: &mut Vec<SessionOption>,
    ) -> Result<(), CoreError> {
        let profile_name = device.credential_profile();

        let profile = self.inventory.credentials.get(profile_name).ok_or_else(|| {
            CoreError::UnknownCredentialProfile {
                device: name.to_string(),
                name: profile_name.to_string(),
            }
        })?;

        if !profile.username.is_empty() {
            options.push(SessionOption::AuthUsername(profile.username.clone()));
        }

        if let Some(ref password) = profile.password {
            options.push(SessionOption::AuthPassword(password.clone()));
        }

        if let Some(ref secondary) = profile.secondary_password {
            options.push(SessionOption::AuthSecondary(secondary.clone()));
        }

        if let Some(ref key) = profile.private_key {
            options.push(SessionOption::AuthPrivateKey(key.clone()));
        }

        Ok(())
    }

    fn push_transport(
        &self,
        name: &str,
        device: &Device,
        options: &mut Vec<SessionOption>,
    ) -> Result<(), CoreError> {
        // Baked-in defaults first; profile overrides land after and win.
        options.push(SessionOption::TransportType(Transport::Standard));
        options.push(SessionOption::AuthStrictKey(false));

        let profile_name = device.transport_profile();

        let Some(profile) = self.inventory.transports.get(profile_name) else {
            if profile_name == DEFAULT_PROFILE {
                // The default profile may legitimately be absent; the
                // defaults above stand.
                return Ok(());
            }

            return Err(CoreError::UnknownTransportProfile {
                device: name.to_string(),
                name: profile_name.to_string(),
            });
        };

        if let Some(port) = profile.port {
            options.push(SessionOption::Port(port));
        }

        if profile.strict_key {
            options.push(SessionOption::AuthStrictKey(true));
        }

        if let Some(ref config) = profile.ssh_config_file {
            options.push(SessionOption::SshConfigFile(config.clone()));
        }

        if let Some(ref transport) = profile.transport {
            let parsed: Transport =
                transport
                    .parse()
                    .map_err(|_| CoreError::InvalidTransportType {
                        value: transport.clone(),
                    })?;
            options.push(SessionOption::TransportType(parsed));
        }

        Ok(())
    }
}
