//! Blob-storage collaborator trait.

use crate::error::Result;
use async_trait::async_trait;

/// An abstract object store organised in buckets.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path` inside `bucket` and returns the stored path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Returns the public URL for an object. Does not check existence.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Removes the given objects. Missing objects are not an error.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;
}
