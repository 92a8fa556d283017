//! Error types for the slot core

use thiserror::Error;

/// Slot core error type
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl SlotError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SlotError::InvalidConfig(message.into())
    }
}

/// Result type alias
pub type SlotResult<T> = Result<T, SlotError>;
