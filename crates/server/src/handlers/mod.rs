//! HTTP request handlers.

pub mod admin;
pub mod common;
pub mod health;
pub mod profile;
pub mod render;
pub mod textures;

pub use admin::*;
pub use health::*;
pub use profile::*;
pub use render::*;
pub use textures::*;

/// Service name reported by health and stats.
pub const SERVICE_NAME: &str = "skinvault";
