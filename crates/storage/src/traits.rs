//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Path-addressed blob storage.
///
/// Keys are `/`-separated relative paths such as
/// `derived/abc123/head/64/<fingerprint>.png`. Each individual operation is
/// atomic: a concurrent reader observes either the old object, the new one,
/// or none, never a partial write.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Put an object atomically, replacing any previous content.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object. Missing objects are reported as `NotFound`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List every object key under a directory-like prefix (ending in `/`).
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Get the name of this storage backend.
    ///
    /// Returns a static string identifier for the backend type (e.g., "memory", "filesystem").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// Called during server startup to ensure the storage is available
    /// before accepting requests.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
