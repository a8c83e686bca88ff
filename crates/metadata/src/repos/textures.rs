//! Texture record repository trait.

use crate::error::MetadataResult;
use crate::models::{TextureCounts, TextureRow};
use async_trait::async_trait;
use skinvault_core::{Fingerprint, Identity, SkinModel};

/// Repository for per-identity texture records.
///
/// Slot writers return the key the slot held before the write, so callers
/// can clean up the superseded blob.
#[async_trait]
pub trait TextureRepo: Send + Sync {
    /// Get the record of an identity.
    async fn get_texture_set(&self, identity: &Identity) -> MetadataResult<Option<TextureRow>>;

    /// Set the skin slot, creating the record if needed.
    async fn upsert_skin(
        &self,
        identity: &Identity,
        key: &str,
        fingerprint: &Fingerprint,
        model: SkinModel,
    ) -> MetadataResult<Option<String>>;

    /// Set the cape slot, creating the record if needed.
    async fn upsert_cape(
        &self,
        identity: &Identity,
        key: &str,
        fingerprint: &Fingerprint,
    ) -> MetadataResult<Option<String>>;

    /// Empty the skin slot. Returns the removed key, `None` if it was empty.
    async fn clear_skin(&self, identity: &Identity) -> MetadataResult<Option<String>>;

    /// Empty the cape slot. Returns the removed key, `None` if it was empty.
    async fn clear_cape(&self, identity: &Identity) -> MetadataResult<Option<String>>;

    /// Delete the whole record. Returns it, `None` if there was none.
    async fn delete_texture_set(&self, identity: &Identity) -> MetadataResult<Option<TextureRow>>;

    /// Count records and filled slots.
    async fn texture_counts(&self) -> MetadataResult<TextureCounts>;
}
