//! Bridge invocation adapter
//!
//! This module provides:
//! - `Bridge`: the seam between dispatch logic and the external bridge process
//! - `process`: the `tokio::process` backed implementation used by the CLI

mod process;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use process::ProcessBridge;

/// How the standard streams of one bridge invocation are wired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// stdin, stdout and stderr are inherited from the calling process
    Inherit,
    /// stdout is written to a local file, stderr inherited, stdin closed.
    /// A file created for a failed invocation is removed again.
    StdoutToFile(PathBuf),
    /// stdin is closed, output inherited
    NullInput,
}

/// External device bridge (adb or a compatible tool)
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Raw standard output of `<bridge> devices`.
    ///
    /// Fails with `BridgeUnavailable` when the bridge cannot be run.
    async fn devices_output(&self) -> Result<String>;

    /// Run `<bridge> -s <device> <args...>` and capture standard output.
    ///
    /// Fails with `BridgeUnavailable`.
    async fn capture(&self, device: &str, args: &[String]) -> Result<String>;

    /// Run `<bridge> -s <device> <args...>` with the given stream wiring.
    ///
    /// Fails with `InvocationFailure` on a non-zero exit or I/O error.
    async fn invoke(&self, device: &str, args: &[String], streams: StreamTarget) -> Result<()>;

    /// Run a companion tool (e.g. a screen mirror) with inherited streams.
    async fn launch(&self, program: &Path, args: &[String]) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory bridge that records every call

    use super::*;
    use crate::error::HubError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Devices,
        Capture { device: String, args: Vec<String> },
        Invoke { device: String, args: Vec<String>, streams: StreamTarget },
        Launch { program: PathBuf, args: Vec<String> },
    }

    #[derive(Default)]
    pub struct RecordingBridge {
        devices: Option<String>,
        packages: HashMap<String, String>,
        failing: HashSet<usize>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingBridge {
        pub fn new() -> Self {
            Self::default()
        }

        /// Attach ready devices in the given order
        pub fn with_devices(mut self, ids: &[&str]) -> Self {
            let mut out = String::from("List of devices attached\n");
            for id in ids {
                out.push_str(&format!("{}\tdevice\n", id));
            }
            out.push('\n');
            self.devices = Some(out);
            self
        }

        pub fn with_devices_output(mut self, output: &str) -> Self {
            self.devices = Some(output.to_string());
            self
        }

        pub fn with_packages(mut self, device: &str, packages: &[&str]) -> Self {
            let listing = packages
                .iter()
                .map(|p| format!("package:{}\n", p))
                .collect::<String>();
            self.packages.insert(device.to_string(), listing);
            self
        }

        /// Make the nth (1-based) `invoke` call fail
        pub fn failing_invocation(mut self, nth: usize) -> Self {
            self.failing.insert(nth);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn invocations(&self) -> Vec<(String, Vec<String>)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Invoke { device, args, .. } => Some((device, args)),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) -> usize {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls
                .iter()
                .filter(|c| matches!(c, Call::Invoke { .. }))
                .count()
        }
    }

    #[async_trait]
    impl Bridge for RecordingBridge {
        async fn devices_output(&self) -> Result<String> {
            self.record(Call::Devices);
            self.devices
                .clone()
                .ok_or_else(|| HubError::BridgeUnavailable("adb: not found".to_string()))
        }

        async fn capture(&self, device: &str, args: &[String]) -> Result<String> {
            self.record(Call::Capture {
                device: device.to_string(),
                args: args.to_vec(),
            });
            Ok(self.packages.get(device).cloned().unwrap_or_default())
        }

        async fn invoke(&self, device: &str, args: &[String], streams: StreamTarget) -> Result<()> {
            let nth = self.record(Call::Invoke {
                device: device.to_string(),
                args: args.to_vec(),
                streams,
            });
            if self.failing.contains(&nth) {
                return Err(HubError::InvocationFailure {
                    device: device.to_string(),
                    message: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }

        async fn launch(&self, program: &Path, args: &[String]) -> Result<()> {
            self.record(Call::Launch {
                program: program.to_path_buf(),
                args: args.to_vec(),
            });
            Ok(())
        }
    }
}
