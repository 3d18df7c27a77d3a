//! Startup configuration loaded once and passed by reference

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{HubError, Result};

/// Config file looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "eadb_config.txt";

/// Bridge executable override
pub const KEY_ADB_PATH: &str = "ADB_PATH";

/// Directory holding the scrcpy executable
pub const KEY_SCRCPY_DIR: &str = "SCRCPY_DIR";

const ENV_ADB_PATH: &str = "EADB_ADB_PATH";
const ENV_SCRCPY_DIR: &str = "EADB_SCRCPY_DIR";
const ENV_QUERY_TIMEOUT: &str = "EADB_QUERY_TIMEOUT";

/// Configuration shared by every component of one command run
#[derive(Debug, Clone, PartialEq)]
pub struct HubConfig {
    /// Bridge executable name or path
    pub bridge_path: String,
    /// Directory containing the screen mirroring tool
    pub mirror_dir: Option<PathBuf>,
    /// File the settings were read from (or would have been)
    pub config_file: PathBuf,
    /// Upper bound for captured bridge queries (device and package listings)
    pub query_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bridge_path: "adb".to_string(),
            mirror_dir: None,
            config_file: PathBuf::from(CONFIG_FILE_NAME),
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl HubConfig {
    /// Load configuration from the config file and process environment.
    ///
    /// A missing config file leaves the defaults in place.
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let path = config_file.unwrap_or_else(default_config_path);
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Read settings from one file
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self {
            config_file: path.to_path_buf(),
            ..Self::default()
        };

        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!("Loaded config file {}", path.display());
                config.apply_settings(&parse_config_file(&contents));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
            }
            Err(e) => return Err(HubError::Io(e)),
        }

        Ok(config)
    }

    fn apply_settings(&mut self, settings: &HashMap<String, String>) {
        if let Some(adb) = settings.get(KEY_ADB_PATH) {
            self.bridge_path = adb.clone();
        }
        if let Some(dir) = settings.get(KEY_SCRCPY_DIR) {
            self.mirror_dir = Some(PathBuf::from(dir));
        }
    }

    /// Overlay environment variables on top of file settings
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(adb) = lookup(ENV_ADB_PATH).filter(|v| !v.trim().is_empty()) {
            self.bridge_path = adb.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_SCRCPY_DIR).filter(|v| !v.trim().is_empty()) {
            self.mirror_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(secs) = lookup(ENV_QUERY_TIMEOUT).and_then(|v| v.trim().parse::<u64>().ok()) {
            self.query_timeout = Duration::from_secs(secs.max(1));
        }
    }

    /// Set the bridge executable
    pub fn with_bridge_path(mut self, bridge_path: impl Into<String>) -> Self {
        self.bridge_path = bridge_path.into();
        self
    }

    /// Set the mirror tool directory
    pub fn with_mirror_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mirror_dir = Some(dir.into());
        self
    }

    /// Path of the scrcpy executable, or `ConfigurationMissing`
    pub fn mirror_tool(&self) -> Result<PathBuf> {
        let dir = self
            .mirror_dir
            .as_ref()
            .ok_or_else(|| HubError::ConfigurationMissing {
                setting: KEY_SCRCPY_DIR.to_string(),
                path: self.config_file.clone(),
            })?;
        let exe = if cfg!(windows) { "scrcpy.exe" } else { "scrcpy" };
        Ok(dir.join(exe))
    }
}

/// `eadb_config.txt` in the directory of the running executable
pub fn default_config_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Parse `KEY=VALUE` lines.
///
/// Blank lines, `//` and `#` comments, and lines without exactly one `=` are
/// skipped. Later keys win.
pub fn parse_config_file(contents: &str) -> HashMap<String, String> {
    let mut settings = HashMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('=').collect();
        if parts.len() != 2 {
            continue;
        }

        let key = parts[0].trim();
        let value = parts[1].trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        settings.insert(key.to_string(), value.to_string());
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_config_file() {
        let settings = parse_config_file(
            "// mirror tool\n\
             SCRCPY_DIR = /opt/scrcpy\n\
             \n\
             # comment\n\
             ADB_PATH=/usr/local/bin/adb\n\
             broken line\n\
             A=B=C\n",
        );
        assert_eq!(settings.len(), 2);
        assert_eq!(settings["SCRCPY_DIR"], "/opt/scrcpy");
        assert_eq!(settings["ADB_PATH"], "/usr/local/bin/adb");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = HubConfig::from_file(&path).unwrap();
        assert_eq!(config.bridge_path, "adb");
        assert_eq!(config.mirror_dir, None);
        assert_eq!(config.config_file, path);
    }

    #[test]
    fn test_file_settings_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "SCRCPY_DIR=/opt/scrcpy\nADB_PATH=/sdk/adb\n").unwrap();

        let config = HubConfig::from_file(&path).unwrap();
        assert_eq!(config.bridge_path, "/sdk/adb");
        assert_eq!(config.mirror_dir, Some(PathBuf::from("/opt/scrcpy")));
        assert!(config.mirror_tool().unwrap().starts_with("/opt/scrcpy"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = HubConfig::default();
        config.apply_env(|key| match key {
            "EADB_ADB_PATH" => Some("/env/adb".to_string()),
            "EADB_QUERY_TIMEOUT" => Some("5".to_string()),
            "EADB_SCRCPY_DIR" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.bridge_path, "/env/adb");
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.mirror_dir, None);
    }

    #[test]
    fn test_mirror_tool_requires_setting() {
        let config = HubConfig::default();
        match config.mirror_tool() {
            Err(HubError::ConfigurationMissing { setting, path }) => {
                assert_eq!(setting, "SCRCPY_DIR");
                assert_eq!(path, PathBuf::from(CONFIG_FILE_NAME));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
