//! Logical actions and the bridge verbs they compose into

use std::fmt;
use std::path::{Path, PathBuf};

use crate::keyword::KeywordExpression;
use crate::selector::SelectionMode;

/// On-device scratch file for screen recordings
pub const REMOTE_RECORDING: &str = "/sdcard/temp_screenrecord.mp4";

/// Longest recording the device-side recorder accepts, in seconds
pub const MAX_RECORD_SECONDS: u32 = 180;

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Operations applied to one package on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOp {
    AppInfo,
    Uninstall,
    ClearData,
    ForceStop,
    Start,
}

impl PackageOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AppInfo => "app-info",
            Self::Uninstall => "uninstall",
            Self::ClearData => "clear-data",
            Self::ForceStop => "force-stop",
            Self::Start => "start",
        }
    }

    /// Destructive operations confirm before acting on an implicit single match
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Uninstall | Self::ClearData | Self::ForceStop)
    }

    /// Whether several matched packages may be acted on in one run
    pub fn supports_bulk(&self) -> bool {
        self.is_destructive()
    }

    /// Selection mode offered when a contains keyword matches several packages
    pub fn package_selection_mode(&self) -> SelectionMode {
        if self.supports_bulk() {
            SelectionMode::MultiOrAll
        } else {
            SelectionMode::SingleRequired
        }
    }

    /// Bridge arguments for this operation on `package`
    pub fn bridge_args(&self, package: &str) -> Vec<String> {
        match self {
            Self::AppInfo => args(&["shell", "dumpsys", "package", package]),
            Self::Uninstall => args(&["uninstall", package]),
            Self::ClearData => args(&["shell", "pm", "clear", package]),
            Self::ForceStop => args(&["shell", "am", "force-stop", package]),
            Self::Start => args(&[
                "shell",
                "monkey",
                "-p",
                package,
                "-c",
                "android.intent.category.LAUNCHER",
                "1",
            ]),
        }
    }
}

impl fmt::Display for PackageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One logical operator request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenSettings,
    OpenLauncher,
    ListPackages,
    Screenshot {
        base_path: PathBuf,
    },
    ScreenRecord {
        base_path: PathBuf,
        duration: Option<u32>,
    },
    Mirror,
    Package {
        op: PackageOp,
        keyword: KeywordExpression,
    },
    /// Unrecognized subcommand forwarded verbatim
    Raw(Vec<String>),
}

impl Action {
    /// Parse a package keyword and build a package-scoped action
    pub fn package(op: PackageOp, raw_keyword: &str) -> crate::Result<Self> {
        Ok(Self::Package {
            op,
            keyword: KeywordExpression::parse(raw_keyword)?,
        })
    }

    /// How target devices are chosen for this action
    pub fn device_selection_mode(&self) -> SelectionMode {
        match self {
            Self::OpenSettings
            | Self::OpenLauncher
            | Self::Screenshot { .. }
            | Self::ScreenRecord { .. }
            | Self::Mirror => SelectionMode::SingleRequired,
            Self::ListPackages | Self::Raw(_) => SelectionMode::MultiOrAll,
            // Contains keywords resolve against one device's package listing
            Self::Package { keyword, .. } if keyword.is_contains() => {
                SelectionMode::SingleRequired
            }
            Self::Package { .. } => SelectionMode::MultiOrAll,
        }
    }

    /// Bridge arguments for actions that map onto a single verb per device
    pub fn device_args(&self) -> Option<Vec<String>> {
        match self {
            Self::OpenSettings => Some(args(&[
                "shell",
                "am",
                "start",
                "-a",
                "android.settings.SETTINGS",
            ])),
            Self::OpenLauncher => Some(args(&[
                "shell",
                "am",
                "start",
                "-a",
                "android.intent.action.MAIN",
                "-c",
                "android.intent.category.HOME",
            ])),
            Self::ListPackages => Some(crate::packages::list_packages_args()),
            Self::Screenshot { .. } => Some(args(&["exec-out", "screencap", "-p"])),
            Self::Raw(tokens) => Some(tokens.clone()),
            _ => None,
        }
    }
}

/// `<base>_<device>.<ext>` for per-device captures
pub fn capture_path(base: &Path, device: &str, ext: &str) -> PathBuf {
    PathBuf::from(format!("{}_{}.{}", base.display(), device, ext))
}

/// Bridge arguments that record the screen into `REMOTE_RECORDING`
pub fn screenrecord_args(duration: Option<u32>) -> Vec<String> {
    let mut cmd = args(&["shell", "screenrecord"]);
    if let Some(secs) = duration {
        cmd.push("--time-limit".to_string());
        cmd.push(secs.to_string());
    }
    cmd.push(REMOTE_RECORDING.to_string());
    cmd
}

/// Bridge arguments that copy the recording to `local`
pub fn pull_recording_args(local: &Path) -> Vec<String> {
    vec![
        "pull".to_string(),
        REMOTE_RECORDING.to_string(),
        local.display().to_string(),
    ]
}

/// Bridge arguments that delete the on-device recording
pub fn remove_recording_args() -> Vec<String> {
    args(&["shell", "rm", REMOTE_RECORDING])
}
