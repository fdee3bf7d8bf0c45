//! ImageGate Error Types

use thiserror::Error;

/// Result type alias for ImageGate operations
pub type Result<T> = std::result::Result<T, Error>;

/// ImageGate error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Storage errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by a content store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("write of {key} failed: {reason}")]
    Write { key: String, reason: String },

    #[error("listing of {prefix} failed: {reason}")]
    List { prefix: String, reason: String },

    #[error("read of {key} failed: {reason}")]
    Read { key: String, reason: String },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if this error means the object simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<s3::error::S3Error> for StoreError {
    fn from(e: s3::error::S3Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}
