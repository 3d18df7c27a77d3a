//! Process-backed bridge using `tokio::process`

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{Bridge, StreamTarget};
use crate::config::HubConfig;
use crate::error::{HubError, Result};

/// Runs the bridge executable as a child process
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    bridge_path: String,
    query_timeout: Duration,
}

impl ProcessBridge {
    /// Create a bridge for the given executable
    pub fn new(bridge_path: impl Into<String>) -> Self {
        Self {
            bridge_path: bridge_path.into(),
            query_timeout: Duration::from_secs(30),
        }
    }

    /// Create a bridge from loaded configuration
    pub fn from_config(config: &HubConfig) -> Self {
        Self {
            bridge_path: config.bridge_path.clone(),
            query_timeout: config.query_timeout,
        }
    }

    pub fn bridge_path(&self) -> &str {
        &self.bridge_path
    }

    /// Build a bridge command targeting one device
    fn device_cmd(&self, device: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.bridge_path);
        cmd.arg("-s").arg(device).args(args);
        cmd
    }

    /// Run a query command and return its stdout, mapping every failure to
    /// `BridgeUnavailable`
    async fn query(&self, mut cmd: Command, what: &str) -> Result<String> {
        cmd.stdin(Stdio::null());

        let output = tokio::time::timeout(self.query_timeout, cmd.output())
            .await
            .map_err(|_| {
                HubError::BridgeUnavailable(format!(
                    "{} timed out after {}s",
                    what,
                    self.query_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                HubError::BridgeUnavailable(format!("failed to run {}: {}", self.bridge_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HubError::BridgeUnavailable(format!(
                "{} failed ({}): {}",
                what,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for ProcessBridge {
    fn default() -> Self {
        Self::new("adb")
    }
}

fn check_status(device: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(HubError::InvocationFailure {
            device: device.to_string(),
            message: status.to_string(),
        })
    }
}

#[async_trait]
impl Bridge for ProcessBridge {
    async fn devices_output(&self) -> Result<String> {
        let mut cmd = Command::new(&self.bridge_path);
        cmd.arg("devices");
        debug!("{} devices", self.bridge_path);
        self.query(cmd, "device listing").await
    }

    async fn capture(&self, device: &str, args: &[String]) -> Result<String> {
        debug!("{} -s {} {:?} (captured)", self.bridge_path, device, args);
        let cmd = self.device_cmd(device, args);
        self.query(cmd, &args.join(" ")).await
    }

    async fn invoke(&self, device: &str, args: &[String], streams: StreamTarget) -> Result<()> {
        debug!("{} -s {} {:?} ({:?})", self.bridge_path, device, args, streams);
        let mut cmd = self.device_cmd(device, args);

        let failure = |e: std::io::Error| HubError::InvocationFailure {
            device: device.to_string(),
            message: e.to_string(),
        };

        let mut capture = None;
        match streams {
            StreamTarget::Inherit => {}
            StreamTarget::NullInput => {
                cmd.stdin(Stdio::null());
            }
            StreamTarget::StdoutToFile(path) => {
                let file = std::fs::File::create(&path).map_err(|e| HubError::InvocationFailure {
                    device: device.to_string(),
                    message: format!("cannot create {}: {}", path.display(), e),
                })?;
                cmd.stdin(Stdio::null()).stdout(Stdio::from(file));
                capture = Some(path);
            }
        }

        // Waits for the child to exit, which also drains the wired streams
        let result = match cmd.status().await {
            Ok(status) => check_status(device, status),
            Err(e) => Err(failure(e)),
        };

        if let (Err(_), Some(path)) = (&result, &capture) {
            debug!("Removing partial capture {}", path.display());
            tokio::fs::remove_file(path).await.ok();
        }
        result
    }

    async fn launch(&self, program: &Path, args: &[String]) -> Result<()> {
        debug!("{} {:?}", program.display(), args);
        // Companion tools take the device serial as their final argument
        let device = args.last().cloned().unwrap_or_default();
        let status = Command::new(program).args(args).status().await.map_err(|e| {
            HubError::InvocationFailure {
                device: device.clone(),
                message: format!("failed to run {}: {}", program.display(), e),
            }
        })?;
        check_status(&device, status)
    }
}
