//! device_hub: multi-device operations over an adb-style device bridge
//!
//! This library provides:
//! - Device enumeration through the external bridge
//! - Interactive selection of devices and packages (single or "all")
//! - Package resolution against `*contains*` / exact keyword expressions
//! - A dispatcher that fans one logical action out over the chosen targets
//!
//! # Example
//!
//! ```no_run
//! use device_hub::{Action, Dispatcher, HubConfig, PackageOp, ProcessBridge, StdTerminal};
//!
//! #[tokio::main]
//! async fn main() -> device_hub::Result<()> {
//!     let config = HubConfig::load(None)?;
//!     let bridge = ProcessBridge::from_config(&config);
//!     let mut terminal = StdTerminal::new();
//!
//!     let action = Action::package(PackageOp::ForceStop, "*camera*")?;
//!     let report = Dispatcher::new(&config, &bridge, &mut terminal)
//!         .run(&action)
//!         .await?;
//!     println!("{} invocation(s), {} failed", report.attempted(), report.failures.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Bridge backend
pub mod bridge;

// Core functionality
pub mod actions;
pub mod device;
pub mod dispatcher;
pub mod keyword;
pub mod packages;
pub mod selector;
pub mod terminal;

// Re-export commonly used types and functions
pub use error::{HubError, Result};

// Config re-exports
pub use config::{default_config_path, parse_config_file, HubConfig, CONFIG_FILE_NAME};

// Bridge re-exports
pub use bridge::{Bridge, ProcessBridge, StreamTarget};

// Resolution re-exports
pub use device::{list_all_devices, list_devices, parse_devices, Device, DeviceState};
pub use keyword::KeywordExpression;
pub use packages::{parse_package_list, resolve_packages};
pub use selector::{confirm, resolve_selection, select, Selection, SelectionMode};
pub use terminal::{StdTerminal, Terminal};

// Dispatch re-exports
pub use actions::{capture_path, Action, PackageOp, MAX_RECORD_SECONDS};
pub use dispatcher::{DispatchReport, Dispatcher, ResolvedTarget, TargetFailure};
