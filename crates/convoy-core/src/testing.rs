//! Test doubles for the session capability, shared by the worker and
//! dispatch tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use convoy_session::{
    CfgResponse, DiffResponse, MultiResponse, Response, Session, SessionError, SessionFactory,
    SessionOption,
};

use crate::inventory::Device;

/// Build a minimal device for tests.
pub(crate) fn test_device(platform: &str, address: &str, commands: &[&str]) -> Device {
    Device {
        platform: platform.to_string(),
        address: address.to_string(),
        credentials: None,
        transport: None,
        send_commands: commands.iter().map(ToString::to_string).collect(),
        send_commands_from_file: None,
        send_configs: Vec::new(),
        send_configs_from_file: None,
        cfg_operations: Vec::new(),
    }
}

/// Scripted session factory. Records every call as `<address>:<op>` so
/// tests can assert on call order and absence.
#[derive(Default)]
pub(crate) struct MockFactory {
    fail_open: HashSet<String>,
    fail_command: Option<String>,
    open_delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sessions to `address` fail at open time.
    pub(crate) fn fail_open(mut self, address: &str) -> Self {
        self.fail_open.insert(address.to_string());
        self
    }

    /// Sending this exact command errors the batch.
    pub(crate) fn fail_command(mut self, command: &str) -> Self {
        self.fail_command = Some(command.to_string());
        self
    }

    /// Sleep this long inside open, to shake up worker completion order.
    pub(crate) fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, address: &str, op: &str) {
        self.calls.lock().unwrap().push(format!("{address}:{op}"));
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    async fn open(
        &self,
        _platform: &str,
        address: &str,
        _options: &[SessionOption],
    ) -> Result<Box<dyn Session>, SessionError> {
        self.log(address, "open");

        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_open.contains(address) {
            return Err(SessionError::Open {
                address: address.to_string(),
                reason: "scripted open failure".to_string(),
            });
        }

        Ok(Box::new(MockSession {
            address: address.to_string(),
            fail_command: self.fail_command.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub(crate) struct MockSession {
    address: String,
    fail_command: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSession {
    fn log(&self, op: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{op}", self.address));
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send_commands(&mut self, commands: &[String]) -> Result<MultiResponse, SessionError> {
        self.log("send-commands");

        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            if self.fail_command.as_deref() == Some(command) {
                return Err(SessionError::Operation(format!(
                    "scripted failure for '{command}'"
                )));
            }

            responses.push(Response {
                input: command.clone(),
                result: format!("output of {command}"),
                failed: false,
            });
        }

        Ok(MultiResponse { responses })
    }

    async fn send_configs(&mut self, _configs: &[String]) -> Result<Response, SessionError> {
        self.log("send-configs");
        Ok(Response {
            input: "send-configs".to_string(),
            result: String::new(),
            failed: false,
        })
    }

    async fn get_config(&mut self, source: &str) -> Result<CfgResponse, SessionError> {
        self.log("get-config");
        Ok(CfgResponse {
            operation: format!("get-config-{source}"),
            result: format!("config of {source}"),
        })
    }

    async fn load_config(
        &mut self,
        _config: &str,
        _replace: bool,
    ) -> Result<CfgResponse, SessionError> {
        self.log("load-config");
        Ok(CfgResponse {
            operation: "load-config".to_string(),
            result: "candidate loaded".to_string(),
        })
    }

    async fn diff_config(&mut self, source: &str) -> Result<DiffResponse, SessionError> {
        self.log("diff-config");
        Ok(DiffResponse {
            operation: format!("diff-{source}"),
            device_diff: "device diff".to_string(),
            side_by_side_diff: "side-by-side diff".to_string(),
            unified_diff: "unified diff".to_string(),
        })
    }

    async fn commit_config(&mut self) -> Result<(), SessionError> {
        self.log("commit-config");
        Ok(())
    }

    async fn abort_config(&mut self) -> Result<(), SessionError> {
        self.log("abort-config");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.log("close");
        Ok(())
    }
}
