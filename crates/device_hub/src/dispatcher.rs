//! Command dispatcher: resolves targets for an action and fans bridge
//! invocations out over them, one at a time, in resolution order

use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::actions::{
    capture_path, pull_recording_args, remove_recording_args, screenrecord_args, Action,
    PackageOp,
};
use crate::bridge::{Bridge, StreamTarget};
use crate::config::HubConfig;
use crate::device::{list_devices, Device};
use crate::error::{HubError, Result};
use crate::keyword::KeywordExpression;
use crate::packages::resolve_packages;
use crate::selector::{confirm, select, SelectionMode};
use crate::terminal::Terminal;

/// A device, and optionally a package on it, bound right before an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub device: Device,
    pub package: Option<String>,
}

impl ResolvedTarget {
    pub fn device(device: &Device) -> Self {
        Self {
            device: device.clone(),
            package: None,
        }
    }

    pub fn package(device: &Device, package: &str) -> Self {
        Self {
            device: device.clone(),
            package: Some(package.to_string()),
        }
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(pkg) => write!(f, "{} ({})", self.device, pkg),
            None => write!(f, "{}", self.device),
        }
    }
}

/// A failed invocation within a fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: ResolvedTarget,
    pub message: String,
}

/// Outcome of one dispatched action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: Vec<ResolvedTarget>,
    pub failures: Vec<TargetFailure>,
}

impl DispatchReport {
    /// Number of bridge invocations issued
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs actions against the bridge, prompting through `terminal`
pub struct Dispatcher<'a, B: ?Sized, T: ?Sized> {
    config: &'a HubConfig,
    bridge: &'a B,
    terminal: &'a mut T,
}

impl<'a, B, T> Dispatcher<'a, B, T>
where
    B: Bridge + ?Sized,
    T: Terminal + ?Sized,
{
    pub fn new(config: &'a HubConfig, bridge: &'a B, terminal: &'a mut T) -> Self {
        Self {
            config,
            bridge,
            terminal,
        }
    }

    /// Resolve targets for `action` and invoke the bridge on each
    pub async fn run(&mut self, action: &Action) -> Result<DispatchReport> {
        match action {
            Action::Package { op, keyword } => self.run_package(*op, keyword).await,
            Action::ScreenRecord {
                base_path,
                duration,
            } => self.run_screenrecord(base_path, *duration).await,
            Action::Mirror => self.run_mirror().await,
            Action::Screenshot { base_path } => self.run_screenshot(base_path).await,
            other => {
                let args = other.device_args().unwrap_or_default();
                let streams = match other {
                    Action::Raw(_) => StreamTarget::Inherit,
                    _ => StreamTarget::NullInput,
                };
                let devices = self.select_devices(other.device_selection_mode()).await?;

                let mut report = DispatchReport::default();
                for device in &devices {
                    self.invoke(&mut report, ResolvedTarget::device(device), &args, streams.clone())
                        .await;
                }
                Ok(report)
            }
        }
    }

    /// Enumerate ready devices and let the operator choose among them
    async fn select_devices(&mut self, mode: SelectionMode) -> Result<Vec<Device>> {
        let devices = list_devices(self.bridge).await?;
        if devices.is_empty() {
            return Err(HubError::NoCandidates("No devices connected.".to_string()));
        }

        let chosen = select(&mut *self.terminal, devices, mode, "device", |d: &Device| d.id.clone())?;
        info!(
            "Target device(s): {}",
            chosen
                .iter()
                .map(|d| d.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(chosen)
    }

    async fn invoke(
        &mut self,
        report: &mut DispatchReport,
        target: ResolvedTarget,
        args: &[String],
        streams: StreamTarget,
    ) -> bool {
        self.terminal.write_line(&format!(
            "Executing on {}: {} -s {} {}",
            target.device,
            self.config.bridge_path,
            target.device,
            args.join(" ")
        ));

        let result = self.bridge.invoke(&target.device.id, args, streams).await;
        self.record(report, target, result)
    }

    /// Add one outcome to the report; failures are shown and the fan-out goes on
    fn record(
        &mut self,
        report: &mut DispatchReport,
        target: ResolvedTarget,
        result: Result<()>,
    ) -> bool {
        match result {
            Ok(()) => {
                report.succeeded.push(target);
                true
            }
            Err(e) => {
                warn!("{}: {}", target, e);
                self.terminal.write_line(&format!("Error: {}", e));
                report.failures.push(TargetFailure {
                    target,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    async fn run_screenshot(&mut self, base_path: &Path) -> Result<DispatchReport> {
        let args = Action::Screenshot {
            base_path: base_path.to_path_buf(),
        }
        .device_args()
        .unwrap_or_default();
        let devices = self.select_devices(SelectionMode::SingleRequired).await?;

        let mut report = DispatchReport::default();
        for device in &devices {
            let local = capture_path(base_path, &device.id, "png");
            let ok = self
                .invoke(
                    &mut report,
                    ResolvedTarget::device(device),
                    &args,
                    StreamTarget::StdoutToFile(local.clone()),
                )
                .await;
            if ok {
                self.terminal
                    .write_line(&format!("Saved screenshot to {}", local.display()));
            }
        }
        Ok(report)
    }

    async fn run_screenrecord(
        &mut self,
        base_path: &Path,
        duration: Option<u32>,
    ) -> Result<DispatchReport> {
        let devices = self.select_devices(SelectionMode::SingleRequired).await?;

        let mut report = DispatchReport::default();
        for device in &devices {
            let target = ResolvedTarget::device(device);
            let local = capture_path(base_path, &device.id, "mp4");

            let recorded = self
                .invoke(
                    &mut report,
                    target.clone(),
                    &screenrecord_args(duration),
                    StreamTarget::NullInput,
                )
                .await;
            if !recorded {
                continue;
            }

            let pulled = self
                .invoke(
                    &mut report,
                    target.clone(),
                    &pull_recording_args(&local),
                    StreamTarget::NullInput,
                )
                .await;
            self.invoke(
                &mut report,
                target,
                &remove_recording_args(),
                StreamTarget::NullInput,
            )
            .await;

            if pulled {
                self.terminal
                    .write_line(&format!("Saved recording to {}", local.display()));
            }
        }
        Ok(report)
    }

    async fn run_mirror(&mut self) -> Result<DispatchReport> {
        let tool = self.config.mirror_tool()?;
        let devices = self.select_devices(SelectionMode::SingleRequired).await?;

        let mut report = DispatchReport::default();
        for device in &devices {
            let target = ResolvedTarget::device(device);
            self.terminal
                .write_line(&format!("Mirroring {} with {}", device, tool.display()));
            let args = vec!["-s".to_string(), device.id.clone()];
            let result = self.bridge.launch(&tool, &args).await;
            self.record(&mut report, target, result);
        }
        Ok(report)
    }

    async fn run_package(
        &mut self,
        op: PackageOp,
        keyword: &KeywordExpression,
    ) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();

        if !keyword.is_contains() {
            // Exact identifiers are trusted as typed and never looked up
            let devices = self.select_devices(SelectionMode::MultiOrAll).await?;
            let args = op.bridge_args(keyword.needle());
            for device in &devices {
                let target = ResolvedTarget::package(device, keyword.needle());
                self.invoke(&mut report, target, &args, StreamTarget::NullInput)
                    .await;
            }
            return Ok(report);
        }

        let device = self
            .select_devices(SelectionMode::SingleRequired)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HubError::NoCandidates("No devices connected.".to_string()))?;

        let matches = resolve_packages(self.bridge, &device.id, Some(keyword)).await?;

        let packages = match matches.len() {
            0 => {
                return Err(HubError::NoCandidates(format!(
                    "No package on {} matches {}.",
                    device, keyword
                )))
            }
            1 => {
                if op.is_destructive() {
                    let question = format!("{} {} on {}?", op, matches[0], device);
                    if !confirm(&mut *self.terminal, &question)? {
                        return Err(HubError::Cancelled(format!(
                            "{} of {} not confirmed",
                            op, matches[0]
                        )));
                    }
                }
                matches
            }
            _ => select(
                &mut *self.terminal,
                matches,
                op.package_selection_mode(),
                "package",
                String::clone,
            )?,
        };

        for package in &packages {
            let target = ResolvedTarget::package(&device, package);
            self.invoke(&mut report, target, &op.bridge_args(package), StreamTarget::NullInput)
                .await;
        }
        Ok(report)
    }
}
