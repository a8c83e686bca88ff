//! Database models mapping to the metadata schema.

use crate::error::{MetadataError, MetadataResult};
use skinvault_core::{Fingerprint, Identity, SkinModel, SourceTexture, TextureSet, TextureSlot};
use sqlx::FromRow;
use time::OffsetDateTime;

/// One identity's texture record. An empty slot has a `NULL` key.
#[derive(Debug, Clone, FromRow)]
pub struct TextureRow {
    pub identity: String,
    pub skin_key: Option<String>,
    pub skin_hash: Option<String>,
    pub skin_slim: bool,
    pub cape_key: Option<String>,
    pub cape_hash: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TextureRow {
    /// Convert into the domain view, validating stored identity and hashes.
    pub fn into_texture_set(self) -> MetadataResult<TextureSet> {
        let identity = Identity::parse(&self.identity)
            .map_err(|e| MetadataError::Corrupt(format!("identity {:?}: {e}", self.identity)))?;

        let skin = source(
            &identity,
            TextureSlot::Skin,
            self.skin_key,
            self.skin_hash,
            SkinModel::from_slim(self.skin_slim),
        )?;
        let cape = source(
            &identity,
            TextureSlot::Cape,
            self.cape_key,
            self.cape_hash,
            SkinModel::Classic,
        )?;

        Ok(TextureSet {
            identity,
            skin,
            cape,
        })
    }
}

fn source(
    identity: &Identity,
    slot: TextureSlot,
    key: Option<String>,
    hash: Option<String>,
    model: SkinModel,
) -> MetadataResult<Option<SourceTexture>> {
    match (key, hash) {
        (Some(raw_key), Some(hash)) => {
            let fingerprint = Fingerprint::from_hex(&hash)
                .map_err(|e| MetadataError::Corrupt(format!("{identity} {slot} hash: {e}")))?;
            Ok(Some(SourceTexture {
                identity: identity.clone(),
                slot,
                raw_key,
                fingerprint,
                model,
            }))
        }
        (None, _) => Ok(None),
        (Some(_), None) => Err(MetadataError::Corrupt(format!(
            "{identity} {slot} has a key but no hash"
        ))),
    }
}

/// Aggregate counts over the texture table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureCounts {
    pub identities: u64,
    pub skins: u64,
    pub capes: u64,
}
