//! Texture service for skinvault.
//!
//! This crate provides:
//! - The source registry over the record and blob stores
//! - The derivation engine rendering avatars and heads with an artifact cache
//! - The HTTP surface: profiles, uploads, renders and admin endpoints
//! - Prometheus metrics

pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod routes;
pub mod state;

pub use engine::{RenderEngine, RenderError, RenderOrigin, Rendered};
pub use error::ApiError;
pub use registry::{RegistryError, SourceRegistry};
pub use routes::create_router;
pub use state::AppState;
