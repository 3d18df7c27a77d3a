//! Device enumeration through the bridge

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::bridge::Bridge;
use crate::error::Result;

const BANNER: &str = "List of devices";

/// Connection state reported by the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum DeviceState {
    /// Reported as `device`
    Ready,
    Unauthorized,
    /// Any other state token (offline, recovery, bootloader, ...)
    NotReady(String),
}

impl DeviceState {
    fn from_token(token: &str) -> Self {
        match token {
            "device" => Self::Ready,
            "unauthorized" => Self::Unauthorized,
            other => Self::NotReady(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready => "device",
            Self::Unauthorized => "unauthorized",
            Self::NotReady(s) => s,
        }
    }
}

impl From<DeviceState> for String {
    fn from(state: DeviceState) -> Self {
        state.as_str().to_string()
    }
}

/// One attached device, discovered fresh on every enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    pub state: DeviceState,
}

impl Device {
    pub fn ready(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: DeviceState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == DeviceState::Ready
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Parse `<bridge> devices` output, keeping every state and bridge order
pub fn parse_devices(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        // Daemon startup notices are prefixed with '*'
        if line.is_empty() || line.starts_with(BANNER) || line.starts_with('*') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        devices.push(Device {
            id: parts[0].to_string(),
            state: DeviceState::from_token(parts[1]),
        });
    }

    devices
}

/// All devices the bridge reports, ready or not
pub async fn list_all_devices<B: Bridge + ?Sized>(bridge: &B) -> Result<Vec<Device>> {
    let output = bridge.devices_output().await?;
    Ok(parse_devices(&output))
}

/// Devices reported as ready, in bridge output order
pub async fn list_devices<B: Bridge + ?Sized>(bridge: &B) -> Result<Vec<Device>> {
    let devices: Vec<Device> = list_all_devices(bridge)
        .await?
        .into_iter()
        .filter(Device::is_ready)
        .collect();
    debug!("{} ready device(s)", devices.len());
    Ok(devices)
}
