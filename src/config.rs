//! ImageGate Configuration
//!
//! This module provides configuration structures for the image gateway:
//! the HTTP listener, the content store and logging.

use serde::{Deserialize, Serialize};

/// Environment variable naming the target bucket
pub const BUCKET_ENV: &str = "BUCKET_NAME";

/// Main ImageGate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageGateConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Content store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
///
/// The payload limit is fixed at `api::MAX_PAYLOAD_BYTES` and is not a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Answer CORS preflight requests
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Which content store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Amazon S3 (or an S3-compatible endpoint)
    #[default]
    S3,
    /// Process-local map, lost on exit
    Memory,
}

/// Content store configuration
///
/// Keys always live under `store::PUBLIC_PREFIX`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend implementation
    #[serde(default)]
    pub backend: StoreBackend,

    /// Bucket name (the BUCKET_NAME environment variable wins)
    #[serde(default)]
    pub bucket: Option<String>,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3 endpoint (MinIO, LocalStack, ...)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing against the endpoint
    #[serde(default)]
    pub path_style: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_region() -> String {
    std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            bucket: None,
            region: default_region(),
            endpoint: None,
            path_style: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ImageGateConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: ImageGateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// A missing bucket is deliberately not checked here: it surfaces as a
    /// store failure on the first request.
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.bind_address.is_empty() {
            return Err(crate::Error::Config("server.bind_address cannot be empty".into()));
        }

        Ok(())
    }

    /// Resolve the bucket name, preferring the environment
    pub fn bucket_name(&self) -> String {
        std::env::var(BUCKET_ENV)
            .ok()
            .filter(|b| !b.is_empty())
            .or_else(|| self.store.bucket.clone())
            .unwrap_or_default()
    }
}
