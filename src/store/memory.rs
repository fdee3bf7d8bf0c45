//! In-memory content store
//!
//! Keeps objects in an ordered map. Used by tests and by local runs that
//! have no bucket to talk to.

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ContentStore, ObjectSummary, StoredObject};
use crate::error::StoreError;

/// Process-local object store
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    /// Create an empty store answering for `bucket`
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Check if the store holds no objects
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        let object = StoredObject {
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: None,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new("bucket");
        store
            .put("public/a.jpg", Bytes::from_static(b"abc"), "image/jpeg")
            .await
            .unwrap();

        let object = store.get("public/a.jpg").await.unwrap();
        assert_eq!(object.body, Bytes::from_static(b"abc"));
        assert_eq!(object.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryStore::new("bucket");
        store.put("public/a.jpg", Bytes::from_static(b"first"), "image/jpeg").await.unwrap();
        store.put("public/a.jpg", Bytes::from_static(b"second"), "image/jpeg").await.unwrap();

        assert_eq!(store.len().await, 1);
        let object = store.get("public/a.jpg").await.unwrap();
        assert_eq!(object.body, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_list_respects_prefix() {
        let store = MemoryStore::new("bucket");
        store.put("private/x.jpg", Bytes::from_static(b"x"), "image/jpeg").await.unwrap();
        store.put("public/b.jpg", Bytes::from_static(b"bb"), "image/jpeg").await.unwrap();
        store.put("public/a.jpg", Bytes::from_static(b"a"), "image/jpeg").await.unwrap();
        store.put("publicity.jpg", Bytes::from_static(b"p"), "image/jpeg").await.unwrap();

        let listed = store.list("public/").await.unwrap();
        let keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["public/a.jpg", "public/b.jpg"]);
        assert_eq!(listed[1].size, 2);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new("bucket");
        let err = store.get("public/none.jpg").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
