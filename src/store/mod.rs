//! Content Store Module
//!
//! Abstracts the object storage holding uploaded images. Every image lives
//! under a fixed key namespace (`public/`) shared by uploads and listings.

mod memory;
mod s3_store;

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;

pub use memory::MemoryStore;
pub use s3_store::S3Store;

/// Key namespace for publicly readable images
pub const PUBLIC_PREFIX: &str = "public/";

/// Content type recorded for every upload, whatever the bytes are
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// An object as returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

/// A stored object with its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
}

/// Object storage used by the upload and list paths
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of the bucket backing this store (may be empty when unconfigured)
    fn bucket(&self) -> &str;

    /// Write an object, replacing any previous object under the same key
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Enumerate every object whose key starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError>;

    /// Read a single object
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;
}

/// Shared handle to a content store
pub type SharedStore = Arc<dyn ContentStore>;

/// Build the configured store backend
pub fn from_config(config: &StoreConfig, bucket: String) -> Result<SharedStore, StoreError> {
    match config.backend {
        StoreBackend::S3 => Ok(Arc::new(S3Store::new(config, bucket)?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new(bucket))),
    }
}

/// Storage key for a file name under a prefix
pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{}{}", prefix, file_name)
}

/// Public address of a stored object
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key(PUBLIC_PREFIX, "a.jpg"), "public/a.jpg");
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("image-bucket-dev", "public/a.jpg"),
            "https://image-bucket-dev.s3.amazonaws.com/public/a.jpg"
        );
    }

    #[test]
    fn test_from_config_memory() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        let store = from_config(&config, "bucket".to_string()).unwrap();
        assert_eq!(store.bucket(), "bucket");
    }
}
