//! Source registry: the single writer of uploaded textures.
//!
//! Wraps the record store and the blob store. Every write that changes what
//! an identity's textures are invalidates that identity's derived artifacts
//! before the new record becomes visible.

use bytes::Bytes;
use skinvault_core::{Fingerprint, Identity, SkinModel, SourceTexture, TextureSet, TextureSlot};
use skinvault_metadata::{MetadataError, MetadataStore, TextureCounts};
use skinvault_storage::{ArtifactStore, ObjectStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Source registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no {slot} registered for {identity}")]
    SlotEmpty {
        identity: Identity,
        slot: TextureSlot,
    },

    #[error("no textures registered for {0}")]
    UnknownIdentity(Identity),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Accessor for the current source textures of each identity.
pub struct SourceRegistry {
    blobs: Arc<dyn ObjectStore>,
    records: Arc<dyn MetadataStore>,
    artifacts: ArtifactStore,
}

impl SourceRegistry {
    pub fn new(
        blobs: Arc<dyn ObjectStore>,
        records: Arc<dyn MetadataStore>,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            blobs,
            records,
            artifacts,
        }
    }

    /// Current textures of `identity`, `None` when it has no record.
    pub async fn get(&self, identity: &Identity) -> RegistryResult<Option<TextureSet>> {
        match self.records.get_texture_set(identity).await? {
            Some(row) => Ok(Some(row.into_texture_set()?)),
            None => Ok(None),
        }
    }

    /// Current texture in one slot.
    pub async fn source(
        &self,
        identity: &Identity,
        slot: TextureSlot,
    ) -> RegistryResult<Option<SourceTexture>> {
        Ok(self
            .get(identity)
            .await?
            .and_then(|set| set.slot(slot).cloned()))
    }

    /// Register new raw bytes for a slot and return their fingerprint.
    ///
    /// The blob is written under its content address first, then artifacts
    /// are invalidated, then the record is switched over. The superseded blob
    /// is removed last. Invalidation and cleanup failures are logged only:
    /// stale artifacts are unreachable once the fingerprint changes.
    #[instrument(skip(self, raw), fields(identity = %identity, slot = %slot, size = raw.len()))]
    pub async fn put(
        &self,
        identity: &Identity,
        slot: TextureSlot,
        raw: Bytes,
        model: SkinModel,
    ) -> RegistryResult<Fingerprint> {
        let fingerprint = Fingerprint::compute(&raw);
        let key = SourceTexture::object_key(identity, slot, &fingerprint);

        self.blobs.put(&key, raw).await?;
        self.invalidate(identity).await;

        let previous = match slot {
            TextureSlot::Skin => {
                self.records
                    .upsert_skin(identity, &key, &fingerprint, model)
                    .await?
            }
            TextureSlot::Cape => self.records.upsert_cape(identity, &key, &fingerprint).await?,
        };

        if let Some(previous) = previous.filter(|old| *old != key) {
            self.remove_superseded(identity, slot, &previous).await;
        }

        info!(fingerprint = %fingerprint.short(), "registered texture");
        Ok(fingerprint)
    }

    /// Empty one slot of `identity`.
    #[instrument(skip(self), fields(identity = %identity, slot = %slot))]
    pub async fn delete(&self, identity: &Identity, slot: TextureSlot) -> RegistryResult<()> {
        if self.source(identity, slot).await?.is_none() {
            return Err(RegistryError::SlotEmpty {
                identity: identity.clone(),
                slot,
            });
        }

        self.invalidate(identity).await;

        let cleared = match slot {
            TextureSlot::Skin => self.records.clear_skin(identity).await?,
            TextureSlot::Cape => self.records.clear_cape(identity).await?,
        };
        let Some(key) = cleared else {
            // Lost a race with another delete.
            return Err(RegistryError::SlotEmpty {
                identity: identity.clone(),
                slot,
            });
        };

        self.delete_blob(&key).await;
        info!("deleted texture");
        Ok(())
    }

    /// Remove everything stored for `identity`: both slots, the record and
    /// every derived artifact.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn delete_all(&self, identity: &Identity) -> RegistryResult<()> {
        if self.records.get_texture_set(identity).await?.is_none() {
            return Err(RegistryError::UnknownIdentity(identity.clone()));
        }

        self.invalidate(identity).await;

        let Some(row) = self.records.delete_texture_set(identity).await? else {
            return Err(RegistryError::UnknownIdentity(identity.clone()));
        };
        for key in [row.skin_key, row.cape_key].into_iter().flatten() {
            self.delete_blob(&key).await;
        }

        info!("deleted all textures");
        Ok(())
    }

    /// Raw bytes of a registered texture.
    pub async fn fetch_raw(&self, source: &SourceTexture) -> RegistryResult<Bytes> {
        Ok(self.blobs.get(&source.raw_key).await?)
    }

    /// Raw bytes of a source blob by key, for serving uploads back out.
    ///
    /// Only keys under the source prefix are readable.
    pub async fn fetch_raw_key(&self, key: &str) -> RegistryResult<Bytes> {
        if !key.starts_with(SourceTexture::KEY_PREFIX) {
            return Err(StorageError::NotFound(key.to_string()).into());
        }
        Ok(self.blobs.get(key).await?)
    }

    /// Totals over all records.
    pub async fn stats(&self) -> RegistryResult<TextureCounts> {
        Ok(self.records.texture_counts().await?)
    }

    async fn invalidate(&self, identity: &Identity) {
        match self.artifacts.invalidate_all(identity).await {
            Ok(removed) => crate::metrics::record_invalidation(removed),
            Err(e) => {
                crate::metrics::ARTIFACT_STORE_FAILURES.inc();
                warn!(identity = %identity, error = %e, "artifact invalidation failed");
            }
        }
    }

    async fn remove_superseded(&self, identity: &Identity, slot: TextureSlot, key: &str) {
        // A concurrent upload may have switched the record back to this key.
        match self.source(identity, slot).await {
            Ok(Some(current)) if current.raw_key == key => {}
            Ok(_) => self.delete_blob(key).await,
            Err(e) => warn!(key, error = %e, "skipping cleanup of superseded texture"),
        }
    }

    async fn delete_blob(&self, key: &str) {
        match self.blobs.delete(key).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!(key, error = %e, "failed to delete texture blob"),
        }
    }
}
