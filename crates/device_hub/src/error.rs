/// Error types for device selection and bridge dispatch
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Device bridge unavailable: {0}")]
    BridgeUnavailable(String),

    #[error("{0}")]
    NoCandidates(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Command failed on device {device}: {message}")]
    InvocationFailure { device: String, message: String },

    #[error("Missing configuration {setting}. Add a line `{setting}=<value>` to {}", path.display())]
    ConfigurationMissing { setting: String, path: PathBuf },

    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubError {
    /// Outcomes that are reported to the operator but are not failures
    pub fn is_clean_exit(&self) -> bool {
        matches!(self, Self::NoCandidates(_) | Self::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
