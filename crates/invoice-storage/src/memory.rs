//! In-memory object storage, used for development runs and as a test double.

use crate::keys::validate_key;
use crate::traits::{ObjectAccess, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn has_object(&self, storage_key: &str) -> bool {
        self.objects.read().await.contains_key(storage_key)
    }

    /// Place an object directly, as a client upload through a presigned URL would.
    pub async fn put_object(&self, storage_key: &str, data: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .await
            .insert(storage_key.to_string(), data.into());
    }
}

#[async_trait]
impl ObjectAccess for MemoryStorage {
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let expires_at = Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!(
            "memory://{}/{}?expires={}",
            self.bucket, storage_key, expires_at
        ))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        self.put_object(storage_key, data).await;
        Ok(format!("memory://{}/{}", self.bucket, storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.has_object(storage_key).await)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn presign_then_upload_then_delete() {
        let storage = MemoryStorage::new("invoices");
        let url = storage
            .presigned_put_url("tok-1", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.starts_with("memory://invoices/tok-1?expires="));

        storage.put_object("tok-1", b"payload".to_vec()).await;
        assert_eq!(storage.download("tok-1").await.unwrap(), b"payload");

        storage.delete("tok-1").await.unwrap();
        assert!(!storage.has_object("tok-1").await);
        assert!(matches!(
            storage.download("tok-1").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
