//! The bundled driver: a thin shim over the local `ssh` binary.
//!
//! Matches the "system" transport: every command batch is executed through
//! `ssh(1)`, one exec per command, with authentication delegated to the
//! user's keys, agent, and ssh config. Password options are accepted (the
//! option model is driver-agnostic) but batch mode means key-based auth is
//! what actually works here. Structured config-management operations need a
//! platform-aware driver and report as unsupported.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::SessionError;
use crate::options::{SessionOption, Transport};
use crate::response::{CfgResponse, DiffResponse, MultiResponse, Response};
use crate::{Session, SessionFactory};

/// Opens [`SystemSession`]s. Stateless and shareable across workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFactory;

impl SystemFactory {
    pub fn new() -> Self {
        Self
    }
}

/// Connection settings distilled from an ordered option list.
///
/// Applying options in order gives the documented override behavior for
/// free: the last write to a field wins.
#[derive(Debug, Default)]
struct Resolved {
    username: Option<String>,
    private_key: Option<PathBuf>,
    strict_key: bool,
    port: Option<u16>,
    ssh_config: Option<PathBuf>,
    transport: Transport,
}

impl Resolved {
    fn from_options(options: &[SessionOption]) -> Self {
        let mut resolved = Self::default();

        for option in options {
            match option {
                SessionOption::AuthUsername(user) => resolved.username = Some(user.clone()),
                SessionOption::AuthPrivateKey(path) => resolved.private_key = Some(path.clone()),
                SessionOption::AuthStrictKey(strict) => resolved.strict_key = *strict,
                SessionOption::Port(port) => resolved.port = Some(*port),
                SessionOption::SshConfigFile(path) => resolved.ssh_config = Some(path.clone()),
                SessionOption::TransportType(transport) => resolved.transport = *transport,
                // Passwords cannot be fed to a batch-mode ssh exec; keys,
                // agent, or ssh config carry authentication for this driver.
                SessionOption::AuthPassword(_) | SessionOption::AuthSecondary(_) => {}
            }
        }

        resolved
    }

    /// ssh argument vector, excluding the target address.
    fn ssh_args(&self) -> Vec<String> {
        let mut args = vec!["-o".into(), "BatchMode=yes".into()];

        args.push("-o".into());
        if self.strict_key {
            args.push("StrictHostKeyChecking=yes".into());
        } else {
            args.push("StrictHostKeyChecking=no".into());
        }

        if let Some(ref user) = self.username {
            args.push("-l".into());
            args.push(user.clone());
        }

        if let Some(ref key) = self.private_key {
            args.push("-i".into());
            args.push(key.display().to_string());
        }

        if let Some(port) = self.port {
            args.push("-p".into());
            args.push(port.to_string());
        }

        if let Some(ref config) = self.ssh_config {
            args.push("-F".into());
            args.push(config.display().to_string());
        }

        args
    }
}

#[async_trait]
impl SessionFactory for SystemFactory {
    async fn open(
        &self,
        platform: &str,
        address: &str,
        options: &[SessionOption],
    ) -> Result<Box<dyn Session>, SessionError> {
        let resolved = Resolved::from_options(options);

        if resolved.transport == Transport::Telnet {
            return Err(SessionError::Driver {
                platform: platform.to_string(),
                reason: "telnet transport is not available in the system driver".to_string(),
            });
        }

        let mut session = SystemSession {
            address: address.to_string(),
            args: resolved.ssh_args(),
        };

        // Probe the connection so auth/reachability failures surface at
        // open time rather than on the first command.
        let probe = session.exec("exit").await?;
        if probe.failed {
            return Err(SessionError::Open {
                address: address.to_string(),
                reason: probe.result,
            });
        }

        debug!(address, platform, "session opened");

        Ok(Box::new(session))
    }
}

/// One device reachable through the local `ssh` binary.
pub struct SystemSession {
    address: String,
    args: Vec<String>,
}

impl SystemSession {
    async fn exec(&mut self, command: &str) -> Result<Response, SessionError> {
        let output = Command::new("ssh")
            .args(&self.args)
            .arg(&self.address)
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let failed = !output.status.success();

        Ok(Response {
            input: command.to_string(),
            result: if failed && stdout.is_empty() { stderr } else { stdout },
            failed,
        })
    }
}

#[async_trait]
impl Session for SystemSession {
    async fn send_commands(&mut self, commands: &[String]) -> Result<MultiResponse, SessionError> {
        let mut responses = Vec::with_capacity(commands.len());

        for command in commands {
            responses.push(self.exec(command).await?);
        }

        Ok(MultiResponse { responses })
    }

    async fn send_configs(&mut self, configs: &[String]) -> Result<Response, SessionError> {
        // Config lines go over as one exec so they land in a single remote
        // shell invocation.
        let mut response = self.exec(&configs.join("\n")).await?;
        response.input = "send-configs".to_string();
        Ok(response)
    }

    async fn get_config(&mut self, _source: &str) -> Result<CfgResponse, SessionError> {
        Err(SessionError::Unsupported("get-config"))
    }

    async fn load_config(
        &mut self,
        _config: &str,
        _replace: bool,
    ) -> Result<CfgResponse, SessionError> {
        Err(SessionError::Unsupported("load-config"))
    }

    async fn diff_config(&mut self, _source: &str) -> Result<DiffResponse, SessionError> {
        Err(SessionError::Unsupported("diff-config"))
    }

    async fn commit_config(&mut self) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("commit-config"))
    }

    async fn abort_config(&mut self) -> Result<(), SessionError> {
        Err(SessionError::Unsupported("abort-config"))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        // Nothing persistent to tear down; every exec is its own process.
        Ok(())
    }
}
