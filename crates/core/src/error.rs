//! Error types for the core domain.

use crate::texture::TextureSlot;
use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("invalid render size: {size} (must be between {min} and {max})")]
    InvalidSize { size: u32, min: u32, max: u32 },

    #[error("texture decode error: {0}")]
    Decode(String),

    #[error("{slot} texture has invalid dimensions {width}x{height}")]
    DimensionMismatch {
        slot: TextureSlot,
        width: u32,
        height: u32,
    },

    #[error("texture encode error: {0}")]
    Encode(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
