//! S3 content store
//!
//! Talks to Amazon S3 (or any S3-compatible endpoint) through `rust-s3`.
//! The client is built once and shared by every request.

use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::{debug, info};

use super::{ContentStore, ObjectSummary, StoredObject};
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Object store backed by an S3 bucket
pub struct S3Store {
    name: String,
    /// None when no bucket name was configured; every call then fails
    bucket: Option<Box<Bucket>>,
}

impl S3Store {
    /// Create a store for `bucket_name` using the default credential chain
    pub fn new(config: &StoreConfig, bucket_name: String) -> Result<Self, StoreError> {
        if bucket_name.is_empty() {
            tracing::warn!("No bucket configured; S3 requests will fail");
            return Ok(Self { name: bucket_name, bucket: None });
        }

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StoreError::Backend(format!("invalid region {}: {}", config.region, e)))?,
        };

        let credentials = Credentials::default()
            .map_err(|e| StoreError::Backend(format!("failed to load AWS credentials: {}", e)))?;

        let mut bucket = Bucket::new(&bucket_name, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        info!("S3 store ready for bucket {}", bucket_name);
        Ok(Self { name: bucket_name, bucket: Some(bucket) })
    }

    fn client(&self) -> Result<&Bucket, StoreError> {
        self.bucket
            .as_deref()
            .ok_or_else(|| StoreError::Backend("no bucket configured".to_string()))
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait::async_trait]
impl ContentStore for S3Store {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        let bucket = self.client()?;

        let response = bucket
            .put_object_with_content_type(key, &body, content_type)
            .await
            .map_err(|e| StoreError::Write { key: key.to_string(), reason: e.to_string() })?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: format!("S3 answered {}", status),
            });
        }

        debug!("PutObject {} ({} bytes) -> {}", key, body.len(), status);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let bucket = self.client()?;

        // `list` follows continuation tokens until the listing is exhausted
        let pages = bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(|e| StoreError::List { prefix: prefix.to_string(), reason: e.to_string() })?;

        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| ObjectSummary {
                key: object.key,
                size: object.size,
                last_modified: Some(object.last_modified),
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let bucket = self.client()?;

        let response = bucket
            .get_object(key)
            .await
            .map_err(|e| StoreError::Read { key: key.to_string(), reason: e.to_string() })?;

        match response.status_code() {
            404 => Err(StoreError::NotFound(key.to_string())),
            status if !is_success(status) => Err(StoreError::Read {
                key: key.to_string(),
                reason: format!("S3 answered {}", status),
            }),
            _ => {
                let content_type = response
                    .headers()
                    .get("content-type")
                    .cloned()
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                Ok(StoredObject {
                    key: key.to_string(),
                    body: response.bytes().clone(),
                    content_type,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_bucket_fails_at_request_time() {
        let store = S3Store::new(&StoreConfig::default(), String::new()).unwrap();
        assert_eq!(store.bucket(), "");

        let err = store.list("public/").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let err = store
            .put("public/a.jpg", Bytes::from_static(b"a"), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(403));
        assert!(!is_success(500));
    }
}
