//! Source texture and derived render types.

use crate::hash::Fingerprint;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which uploaded texture of an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureSlot {
    /// The primary texture (skin). Source of every derived render.
    Skin,
    /// The secondary texture (cape).
    Cape,
}

impl TextureSlot {
    /// Get the slot as a stable string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skin => "skin",
            Self::Cape => "cape",
        }
    }
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skin geometry variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinModel {
    /// Four-pixel arms.
    #[default]
    Classic,
    /// Three-pixel arms.
    Slim,
}

impl SkinModel {
    pub fn from_slim(slim: bool) -> Self {
        if slim { Self::Slim } else { Self::Classic }
    }

    pub fn is_slim(&self) -> bool {
        matches!(self, Self::Slim)
    }
}

/// Kind of derived render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    /// Face crop, scaled.
    Avatar,
    /// Face crop with the hat overlay composited on top, scaled.
    Head,
}

impl RenderKind {
    /// Get the kind as a stable string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Head => "head",
        }
    }
}

impl fmt::Display for RenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated render edge length in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RenderSize(u32);

impl RenderSize {
    pub const MIN: u32 = 8;
    pub const MAX: u32 = 512;

    /// Validate a requested size.
    pub fn new(size: u32) -> crate::Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&size) {
            return Err(crate::Error::InvalidSize {
                size,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RenderSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A render request as received from the outer service.
///
/// The size is carried unvalidated; the engine rejects it before any I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest {
    pub identity: Identity,
    pub kind: RenderKind,
    pub size: u32,
}

impl RenderRequest {
    pub fn new(identity: Identity, kind: RenderKind, size: u32) -> Self {
        Self {
            identity,
            kind,
            size,
        }
    }
}

/// The current version of one uploaded texture.
///
/// `raw_key` is content-addressed by `fingerprint`, so the bytes it names
/// always hash to the recorded fingerprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceTexture {
    pub identity: Identity,
    pub slot: TextureSlot,
    pub raw_key: String,
    pub fingerprint: Fingerprint,
    pub model: SkinModel,
}

impl SourceTexture {
    /// Object key for the raw bytes of a texture version.
    pub fn object_key(identity: &Identity, slot: TextureSlot, fingerprint: &Fingerprint) -> String {
        format!("{}{identity}/{slot}/{fingerprint}.png", Self::KEY_PREFIX)
    }

    /// Prefix of every raw source object.
    pub const KEY_PREFIX: &'static str = "sources/";
}

/// Both textures of one identity as currently registered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureSet {
    pub identity: Identity,
    pub skin: Option<SourceTexture>,
    pub cape: Option<SourceTexture>,
}

impl TextureSet {
    /// The texture registered in `slot`, if any.
    pub fn slot(&self, slot: TextureSlot) -> Option<&SourceTexture> {
        match slot {
            TextureSlot::Skin => self.skin.as_ref(),
            TextureSlot::Cape => self.cape.as_ref(),
        }
    }
}

/// Cache key of a derived artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub identity: Identity,
    pub kind: RenderKind,
    pub size: RenderSize,
    pub fingerprint: Fingerprint,
}

impl ArtifactKey {
    /// Prefix of every derived artifact object.
    pub const KEY_PREFIX: &'static str = "derived/";

    pub fn new(
        identity: Identity,
        kind: RenderKind,
        size: RenderSize,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            identity,
            kind,
            size,
            fingerprint,
        }
    }

    /// Object key under which the artifact bytes are stored.
    pub fn object_key(&self) -> String {
        format!(
            "{}{}/{}/{}/{}.png",
            Self::KEY_PREFIX,
            self.identity,
            self.kind,
            self.size,
            self.fingerprint
        )
    }

    /// Prefix covering every artifact of `identity`, across kinds, sizes and
    /// fingerprints.
    pub fn identity_prefix(identity: &Identity) -> String {
        format!("{}{identity}/", Self::KEY_PREFIX)
    }
}
