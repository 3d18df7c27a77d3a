//! Configuration module for device_hub
//!
//! This module contains:
//! - `settings`: the startup configuration passed to the dispatcher

mod settings;

pub use settings::{
    default_config_path, parse_config_file, HubConfig, CONFIG_FILE_NAME, KEY_ADB_PATH,
    KEY_SCRCPY_DIR,
};
