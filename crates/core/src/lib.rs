//! Core domain types and shared logic for the skinvault texture service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Identity keys and content fingerprints
//! - Source textures, render kinds and artifact keys
//! - The image codec and the fixed derivation recipes
//! - Configuration types

pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod identity;
pub mod texture;

pub use codec::Bitmap;
pub use error::{Error, Result};
pub use hash::Fingerprint;
pub use identity::Identity;
pub use texture::{
    ArtifactKey, RenderKind, RenderRequest, RenderSize, SkinModel, SourceTexture, TextureSet,
    TextureSlot,
};
