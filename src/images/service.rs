//! Upload and list paths
//!
//! Store failures are re-labelled here as domain errors; the HTTP layer
//! flattens those into a generic 500.

use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info};

use super::FileName;
use crate::error::StoreError;
use crate::store::{object_key, public_url, SharedStore, IMAGE_CONTENT_TYPE};

/// Domain errors raised by the image paths
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to write file to S3")]
    Upload(#[source] StoreError),

    #[error("Failed to list files from S3")]
    List(#[source] StoreError),
}

/// Image operations over a content store
#[derive(Clone)]
pub struct ImageService {
    store: SharedStore,
    prefix: String,
}

impl ImageService {
    /// Create a service writing under `prefix`
    pub fn new(store: SharedStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Store decoded image bytes at `<prefix><file_name>`
    ///
    /// The content type is always `image/jpeg`.
    pub async fn upload(&self, file_name: &FileName, image: Bytes) -> Result<String, ImageError> {
        let bucket = self.store.bucket();
        let key = object_key(&self.prefix, file_name.as_str());

        info!(
            bucket,
            key = %key,
            size = image.len(),
            content_type = IMAGE_CONTENT_TYPE,
            "Starting S3 write operation"
        );

        match self.store.put(&key, image, IMAGE_CONTENT_TYPE).await {
            Ok(()) => {
                info!(bucket, key = %key, "Successfully wrote file to S3");
                Ok(key)
            }
            Err(e) => {
                error!(bucket, key = %key, error = %e, "Error writing to S3");
                Err(ImageError::Upload(e))
            }
        }
    }

    /// Public URLs of every object under the prefix
    pub async fn list(&self) -> Result<Vec<String>, ImageError> {
        let bucket = self.store.bucket();
        info!(bucket, prefix = %self.prefix, "Listing all files in bucket");

        let objects = self.store.list(&self.prefix).await.map_err(|e| {
            error!(bucket, error = %e, "Error listing files from S3");
            ImageError::List(e)
        })?;

        info!(bucket, file_count = objects.len(), "Successfully listed files from S3");

        Ok(objects
            .iter()
            .map(|object| public_url(bucket, &object.key))
            .collect())
    }
}
