//! Derivation engine.
//!
//! Turns a [`RenderRequest`] into PNG bytes: resolve the identity's skin,
//! consult the artifact cache, derive on a miss and write the result back.
//! Every failure past size validation degrades to a placeholder so callers
//! always get an image.

use crate::registry::SourceRegistry;
use bytes::Bytes;
use serde::Serialize;
use skinvault_core::{
    ArtifactKey, Identity, RenderKind, RenderRequest, RenderSize, SourceTexture, TextureSlot,
    codec,
};
use skinvault_storage::{ArtifactStore, StorageResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors surfaced by [`RenderEngine::render`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render size {size}: must be between {min} and {max}")]
    InvalidSize { size: u32, min: u32, max: u32 },

    #[error("failed to render placeholder: {0}")]
    Placeholder(#[source] skinvault_core::Error),

    #[error("render task failed: {0}")]
    Task(String),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Where the bytes of a render came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderOrigin {
    /// Served from the artifact store.
    Cache,
    /// Derived from the source texture during this request.
    Derived,
    /// Flat fallback image.
    Placeholder,
}

impl RenderOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Derived => "derived",
            Self::Placeholder => "placeholder",
        }
    }
}

/// A finished render.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub bytes: Bytes,
    pub origin: RenderOrigin,
}

/// Counters kept by one engine.
#[derive(Debug, Default)]
pub struct RenderStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    derivations: AtomicU64,
    placeholders: AtomicU64,
    store_failures: AtomicU64,
}

/// Point-in-time copy of [`RenderStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderStatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub derivations: u64,
    pub placeholders: u64,
    pub store_failures: u64,
}

impl RenderStats {
    pub fn snapshot(&self) -> RenderStatsSnapshot {
        RenderStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            derivations: self.derivations.load(Ordering::Relaxed),
            placeholders: self.placeholders.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Render pipeline over the source registry and the artifact store.
pub struct RenderEngine {
    registry: Arc<SourceRegistry>,
    artifacts: ArtifactStore,
    cache_artifacts: bool,
    stats: RenderStats,
}

impl RenderEngine {
    pub fn new(
        registry: Arc<SourceRegistry>,
        artifacts: ArtifactStore,
        cache_artifacts: bool,
    ) -> Self {
        Self {
            registry,
            artifacts,
            cache_artifacts,
            stats: RenderStats::default(),
        }
    }

    pub fn stats(&self) -> RenderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Render `request`.
    ///
    /// Only an out-of-range size is returned as an error, and it is checked
    /// before any I/O.
    #[instrument(skip(self), fields(identity = %request.identity, kind = %request.kind, size = request.size))]
    pub async fn render(&self, request: &RenderRequest) -> RenderResult<Rendered> {
        let size = RenderSize::new(request.size).map_err(|_| {
            crate::metrics::RENDERS_REJECTED.inc();
            RenderError::InvalidSize {
                size: request.size,
                min: RenderSize::MIN,
                max: RenderSize::MAX,
            }
        })?;
        let kind = request.kind;

        let source = match self
            .registry
            .source(&request.identity, TextureSlot::Skin)
            .await
        {
            Ok(Some(source)) => source,
            Ok(None) => return self.placeholder(kind, size).await,
            Err(e) => {
                warn!(error = %e, "source lookup failed, serving placeholder");
                return self.placeholder(kind, size).await;
            }
        };

        let key = ArtifactKey::new(request.identity.clone(), kind, size, source.fingerprint);

        if self.cache_artifacts {
            match self.artifacts.lookup(&key).await {
                Ok(Some(bytes)) => {
                    RenderStats::bump(&self.stats.cache_hits);
                    return Ok(self.finish(kind, bytes, RenderOrigin::Cache));
                }
                Ok(None) => RenderStats::bump(&self.stats.cache_misses),
                Err(e) => {
                    // Cache unavailable: derive without it.
                    RenderStats::bump(&self.stats.cache_misses);
                    self.store_failed();
                    warn!(error = %e, "artifact lookup failed");
                }
            }
        }

        let bytes = match self.derive(kind, size, &source).await {
            Some(bytes) => bytes,
            None => return self.placeholder(kind, size).await,
        };

        if self.cache_artifacts
            && let Err(e) = self.artifacts.put(&key, bytes.clone()).await
        {
            self.store_failed();
            warn!(error = %e, "failed to cache artifact, serving uncached");
        }

        Ok(self.finish(kind, bytes, RenderOrigin::Derived))
    }

    /// Drop every cached artifact of `identity`.
    ///
    /// The registry already calls this on each source write; it is exposed
    /// for callers that change sources behind the registry's back.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn on_source_changed(&self, identity: &Identity) -> StorageResult<u64> {
        let removed = self.artifacts.invalidate_all(identity).await?;
        crate::metrics::record_invalidation(removed);
        debug!(removed, "invalidated artifacts");
        Ok(removed)
    }

    /// Fetch, decode and transform the source. `None` means fall back.
    async fn derive(
        &self,
        kind: RenderKind,
        size: RenderSize,
        source: &SourceTexture,
    ) -> Option<Bytes> {
        let raw = match self.registry.fetch_raw(source).await {
            Ok(raw) => raw,
            Err(e) => {
                crate::metrics::DERIVE_FAILURES
                    .with_label_values(&["source_unavailable"])
                    .inc();
                warn!(key = %source.raw_key, error = %e, "source texture unavailable");
                return None;
            }
        };

        RenderStats::bump(&self.stats.derivations);
        let started = Instant::now();
        let derived = tokio::task::spawn_blocking(move || codec::render(kind, size, &raw)).await;
        crate::metrics::DERIVE_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match derived {
            Ok(Ok(png)) => Some(Bytes::from(png)),
            Ok(Err(e)) => {
                let reason = match e {
                    skinvault_core::Error::DimensionMismatch { .. } => "dimension_mismatch",
                    skinvault_core::Error::Encode(_) => "encode",
                    _ => "decode",
                };
                crate::metrics::DERIVE_FAILURES
                    .with_label_values(&[reason])
                    .inc();
                warn!(
                    fingerprint = %source.fingerprint.short(),
                    error = %e,
                    "stored source texture is unusable, serving placeholder"
                );
                None
            }
            Err(e) => {
                crate::metrics::DERIVE_FAILURES
                    .with_label_values(&["task"])
                    .inc();
                warn!(error = %e, "derivation task failed, serving placeholder");
                None
            }
        }
    }

    async fn placeholder(&self, kind: RenderKind, size: RenderSize) -> RenderResult<Rendered> {
        RenderStats::bump(&self.stats.placeholders);
        let png = tokio::task::spawn_blocking(move || codec::render_placeholder(kind, size))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
            .map_err(RenderError::Placeholder)?;
        Ok(self.finish(kind, Bytes::from(png), RenderOrigin::Placeholder))
    }

    fn finish(&self, kind: RenderKind, bytes: Bytes, origin: RenderOrigin) -> Rendered {
        crate::metrics::RENDERS
            .with_label_values(&[kind.as_str(), origin.as_str()])
            .inc();
        Rendered { bytes, origin }
    }

    fn store_failed(&self) {
        RenderStats::bump(&self.stats.store_failures);
        crate::metrics::ARTIFACT_STORE_FAILURES.inc();
    }
}
