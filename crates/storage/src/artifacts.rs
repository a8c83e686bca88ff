//! Derived artifact cache.

use crate::error::StorageResult;
use crate::traits::ObjectStore;
use bytes::Bytes;
use skinvault_core::{ArtifactKey, Identity};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Maps artifact keys to rendered bytes in an [`ObjectStore`].
///
/// Keys embed the source fingerprint, so entries never need updating in
/// place: a source change simply moves lookups to a new key. Old entries are
/// removed with [`ArtifactStore::invalidate_all`].
#[derive(Clone)]
pub struct ArtifactStore {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetch a cached artifact.
    ///
    /// `Ok(None)` is a plain miss; an `Err` means the cache itself could not
    /// be read.
    #[instrument(skip(self), fields(key = %key.object_key()))]
    pub async fn lookup(&self, key: &ArtifactKey) -> StorageResult<Option<Bytes>> {
        match self.store.get(&key.object_key()).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store an artifact, overwriting any entry under the same key.
    #[instrument(skip(self, bytes), fields(key = %key.object_key(), size = bytes.len()))]
    pub async fn put(&self, key: &ArtifactKey, bytes: Bytes) -> StorageResult<()> {
        self.store.put(&key.object_key(), bytes).await
    }

    /// Remove every artifact of `identity`, across kinds, sizes and
    /// fingerprints. Returns the number of objects removed.
    ///
    /// Objects deleted concurrently by someone else are not counted and are
    /// not an error.
    #[instrument(skip(self))]
    pub async fn invalidate_all(&self, identity: &Identity) -> StorageResult<u64> {
        let prefix = ArtifactKey::identity_prefix(identity);
        let keys = self.store.list(&prefix).await?;

        let mut removed = 0u64;
        for key in keys {
            match self.store.delete(&key).await {
                Ok(()) => removed += 1,
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        debug!(removed, "invalidated artifacts");
        Ok(removed)
    }
}
