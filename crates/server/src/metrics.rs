//! Prometheus metrics for the skinvault server.
//!
//! Exposes render outcomes, derivation latency, uploads and cache
//! invalidation.
//!
//! The `/metrics` endpoint is unauthenticated to allow scraping. It carries
//! aggregate counters only, no identities or fingerprints.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Render metrics
pub static RENDERS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "skinvault_renders_total",
            "Total renders served by kind and origin",
        ),
        &["kind", "origin"],
    )
    .expect("metric creation failed")
});

pub static RENDERS_REJECTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "skinvault_renders_rejected_total",
        "Total render requests rejected for an invalid size",
    )
    .expect("metric creation failed")
});

pub static DERIVE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "skinvault_derive_duration_seconds",
            "Time spent decoding, cropping, scaling and encoding one render",
        )
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]),
        &["kind"],
    )
    .expect("metric creation failed")
});

pub static DERIVE_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "skinvault_derive_failures_total",
            "Derivations that fell back to a placeholder, by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

// Artifact store metrics
pub static ARTIFACT_STORE_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "skinvault_artifact_store_failures_total",
        "Artifact lookups, writes or invalidations that failed at the storage layer",
    )
    .expect("metric creation failed")
});

pub static INVALIDATIONS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "skinvault_invalidations_total",
        "Total identity-wide artifact invalidations",
    )
    .expect("metric creation failed")
});

pub static ARTIFACTS_INVALIDATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "skinvault_artifacts_invalidated_total",
        "Total derived artifacts removed by invalidation",
    )
    .expect("metric creation failed")
});

// Source metrics
pub static UPLOADS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("skinvault_uploads_total", "Accepted uploads by slot"),
        &["slot"],
    )
    .expect("metric creation failed")
});

pub static UPLOADS_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "skinvault_uploads_rejected_total",
            "Rejected uploads by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

pub static DELETIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("skinvault_deletions_total", "Texture deletions by slot"),
        &["slot"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(RENDERS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RENDERS_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DERIVE_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DERIVE_FAILURES.clone()))
            .expect("metric registration failed");

        REGISTRY
            .register(Box::new(ARTIFACT_STORE_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(INVALIDATIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ARTIFACTS_INVALIDATED.clone()))
            .expect("metric registration failed");

        REGISTRY
            .register(Box::new(UPLOADS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DELETIONS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record one identity-wide invalidation that removed `removed` artifacts.
pub fn record_invalidation(removed: u64) {
    INVALIDATIONS.inc();
    ARTIFACTS_INVALIDATED.inc_by(removed);
}

/// Record an upload rejected before reaching the registry.
pub fn record_upload_rejected(reason: &str) {
    UPLOADS_REJECTED.with_label_values(&[reason]).inc();
}
