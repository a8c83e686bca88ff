//! Shared handler helpers.

use crate::error::ApiResult;
use crate::state::AppState;
use serde::Serialize;
use skinvault_core::{Identity, TextureSet};

/// Canonicalize an identity taken from the request path.
pub fn parse_identity(raw: &str) -> ApiResult<Identity> {
    Ok(Identity::parse(raw)?)
}

/// Public URL of a stored source blob.
pub fn texture_url(state: &AppState, key: &str) -> String {
    format!("{}/storage/{key}", state.config.server.base_url)
}

/// Plain `{message}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Metadata attached to a skin entry.
#[derive(Debug, Serialize)]
pub struct TextureMetadata {
    pub model: &'static str,
}

/// One entry of a texture map.
#[derive(Debug, Serialize)]
pub struct TextureEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TextureMetadata>,
}

/// Mojang-style texture map, keyed `SKIN` / `CAPE`.
#[derive(Debug, Default, Serialize)]
pub struct TextureMap {
    #[serde(rename = "SKIN", skip_serializing_if = "Option::is_none")]
    pub skin: Option<TextureEntry>,
    #[serde(rename = "CAPE", skip_serializing_if = "Option::is_none")]
    pub cape: Option<TextureEntry>,
}

impl TextureMap {
    pub fn from_set(state: &AppState, set: &TextureSet) -> Self {
        Self {
            skin: set.skin.as_ref().map(|skin| TextureEntry {
                url: texture_url(state, &skin.raw_key),
                metadata: skin
                    .model
                    .is_slim()
                    .then_some(TextureMetadata { model: "slim" }),
            }),
            cape: set.cape.as_ref().map(|cape| TextureEntry {
                url: texture_url(state, &cape.raw_key),
                metadata: None,
            }),
        }
    }
}
