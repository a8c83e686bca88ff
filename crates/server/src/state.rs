//! Application state shared across handlers.

use crate::engine::RenderEngine;
use crate::registry::SourceRegistry;
use skinvault_core::config::AppConfig;
use skinvault_metadata::MetadataStore;
use skinvault_storage::{ArtifactStore, ObjectStore};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Blob storage backend holding sources and artifacts.
    pub storage: Arc<dyn ObjectStore>,
    /// Texture record store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Source registry.
    pub registry: Arc<SourceRegistry>,
    /// Derivation engine.
    pub engine: Arc<RenderEngine>,
}

impl AppState {
    /// Wire the registry and engine over the given stores.
    ///
    /// Sources and artifacts share one object store; their key prefixes
    /// never overlap.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let artifacts = ArtifactStore::new(storage.clone());
        let registry = Arc::new(SourceRegistry::new(
            storage.clone(),
            metadata.clone(),
            artifacts.clone(),
        ));
        let engine = Arc::new(RenderEngine::new(
            registry.clone(),
            artifacts,
            config.render.cache_artifacts,
        ));

        Self {
            config: Arc::new(config),
            storage,
            metadata,
            registry,
            engine,
        }
    }
}
