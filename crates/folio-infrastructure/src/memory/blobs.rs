use async_trait::async_trait;
use folio_core::store::BlobStore;
use folio_core::{FolioError, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// An object held by [`InMemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Bucketed object store held in memory.
///
/// Uploading to an occupied path fails, matching the hosted store's default
/// no-upsert behaviour.
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    public_base_url: String,
}

impl InMemoryBlobStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Paths stored in `bucket`, sorted.
    pub fn paths(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, path)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(FolioError::validation("object path must not be empty"));
        }
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        let key = (bucket.to_string(), path.to_string());
        if objects.contains_key(&key) {
            return Err(FolioError::remote(
                "upload",
                format!("object '{}/{}' already exists", bucket, path),
            ));
        }
        tracing::debug!(bucket, path, size = bytes.len(), "Stored object");
        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }
}
