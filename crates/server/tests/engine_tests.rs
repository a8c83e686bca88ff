//! Integration tests for the derivation engine.

mod common;

use bytes::Bytes;
use common::TestServer;
use common::fixtures::{
    FlakyArtifactBackend, decode, legacy_skin_png, modern_skin, modern_skin_png, png, skin_image,
};
use image::Rgba;
use skinvault_core::codec::{AVATAR_PLACEHOLDER, HEAD_PLACEHOLDER};
use skinvault_core::{
    ArtifactKey, Fingerprint, Identity, RenderKind, RenderRequest, RenderSize, SkinModel,
    TextureSlot,
};
use skinvault_server::{RenderError, RenderOrigin, Rendered};
use skinvault_storage::ArtifactStore;
use std::sync::Arc;

fn identity(raw: &str) -> Identity {
    Identity::parse(raw).unwrap()
}

async fn put_skin(server: &TestServer, id: &str, raw: Bytes) -> Fingerprint {
    server
        .state
        .registry
        .put(&identity(id), TextureSlot::Skin, raw, SkinModel::Classic)
        .await
        .unwrap()
}

async fn render(server: &TestServer, id: &str, kind: RenderKind, size: u32) -> Rendered {
    server
        .state
        .engine
        .render(&RenderRequest::new(identity(id), kind, size))
        .await
        .unwrap()
}

#[tokio::test]
async fn render_is_idempotent() {
    let server = TestServer::new().await;
    put_skin(&server, "abc123", modern_skin_png(1)).await;

    let first = render(&server, "abc123", RenderKind::Avatar, 64).await;
    let second = render(&server, "abc123", RenderKind::Avatar, 64).await;

    assert_eq!(first.origin, RenderOrigin::Derived);
    assert_eq!(second.origin, RenderOrigin::Cache);
    assert_eq!(first.bytes, second.bytes);
}

#[tokio::test]
async fn cached_render_skips_derivation() {
    let server = TestServer::new().await;
    put_skin(&server, "abc123", modern_skin_png(1)).await;

    render(&server, "abc123", RenderKind::Head, 32).await;
    let after_first = server.state.engine.stats();
    assert_eq!(after_first.derivations, 1);
    assert_eq!(after_first.cache_misses, 1);

    for _ in 0..3 {
        render(&server, "abc123", RenderKind::Head, 32).await;
    }
    let after = server.state.engine.stats();
    assert_eq!(after.derivations, 1);
    assert_eq!(after.cache_hits, 3);

    // A different size is a different artifact.
    render(&server, "abc123", RenderKind::Head, 64).await;
    assert_eq!(server.state.engine.stats().derivations, 2);
}

#[tokio::test]
async fn source_change_hides_old_artifact() {
    let server = TestServer::new().await;
    let old_fp = put_skin(&server, "abc123", modern_skin_png(1)).await;
    let old = render(&server, "abc123", RenderKind::Avatar, 64).await;

    put_skin(&server, "abc123", modern_skin_png(2)).await;

    // Put the stale artifact back under its old key: it must stay unreachable.
    let artifacts = ArtifactStore::new(server.state.storage.clone());
    let stale_key = ArtifactKey::new(
        identity("abc123"),
        RenderKind::Avatar,
        RenderSize::new(64).unwrap(),
        old_fp,
    );
    artifacts.put(&stale_key, old.bytes.clone()).await.unwrap();

    let new = render(&server, "abc123", RenderKind::Avatar, 64).await;
    assert_eq!(new.origin, RenderOrigin::Derived);
    assert_ne!(new.bytes, old.bytes);
}

#[tokio::test]
async fn on_source_changed_drops_cached_renders() {
    let server = TestServer::new().await;
    put_skin(&server, "abc123", modern_skin_png(1)).await;

    render(&server, "abc123", RenderKind::Avatar, 16).await;
    render(&server, "abc123", RenderKind::Head, 16).await;

    let removed = server
        .state
        .engine
        .on_source_changed(&identity("abc123"))
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let again = render(&server, "abc123", RenderKind::Avatar, 16).await;
    assert_eq!(again.origin, RenderOrigin::Derived);
}

#[tokio::test]
async fn unknown_identity_gets_placeholder() {
    let server = TestServer::new().await;

    let avatar = render(&server, "nobody", RenderKind::Avatar, 64).await;
    assert_eq!(avatar.origin, RenderOrigin::Placeholder);
    let image = decode(&avatar.bytes);
    assert_eq!(image.dimensions(), (64, 64));
    assert!(image.pixels().all(|p| *p == AVATAR_PLACEHOLDER));

    let head = render(&server, "nobody", RenderKind::Head, 8).await;
    let image = decode(&head.bytes);
    assert_eq!(image.dimensions(), (8, 8));
    assert!(image.pixels().all(|p| *p == HEAD_PLACEHOLDER));

    assert_eq!(server.state.engine.stats().placeholders, 2);
}

#[tokio::test]
async fn cape_only_identity_gets_placeholder() {
    let server = TestServer::new().await;
    server
        .state
        .registry
        .put(
            &identity("capeonly"),
            TextureSlot::Cape,
            common::fixtures::cape_png(1),
            SkinModel::Classic,
        )
        .await
        .unwrap();

    let rendered = render(&server, "capeonly", RenderKind::Avatar, 32).await;
    assert_eq!(rendered.origin, RenderOrigin::Placeholder);
}

#[tokio::test]
async fn size_bounds_are_enforced() {
    let server = TestServer::new().await;
    put_skin(&server, "abc123", modern_skin_png(1)).await;

    for size in [0, 7, 513, 4096] {
        let result = server
            .state
            .engine
            .render(&RenderRequest::new(
                identity("abc123"),
                RenderKind::Avatar,
                size,
            ))
            .await;
        match result {
            Err(RenderError::InvalidSize { size: got, min, max }) => {
                assert_eq!((got, min, max), (size, 8, 512));
            }
            other => panic!("expected InvalidSize for {size}, got {other:?}"),
        }
    }

    // Rejected before any I/O.
    assert_eq!(server.state.engine.stats().cache_misses, 0);

    for size in [8, 512] {
        let rendered = render(&server, "abc123", RenderKind::Avatar, size).await;
        assert_eq!(decode(&rendered.bytes).dimensions(), (size, size));
    }
}

#[tokio::test]
async fn unknown_identity_with_bad_size_is_still_rejected() {
    let server = TestServer::new().await;
    let result = server
        .state
        .engine
        .render(&RenderRequest::new(identity("nobody"), RenderKind::Head, 7))
        .await;
    assert!(matches!(result, Err(RenderError::InvalidSize { .. })));
}

#[tokio::test]
async fn avatar_scenario_tracks_uploads() {
    let server = TestServer::new().await;
    let source = modern_skin(1);
    put_skin(&server, "abc123", png(&source)).await;

    let first = render(&server, "abc123", RenderKind::Avatar, 64).await;
    let image = decode(&first.bytes);
    assert_eq!(image.dimensions(), (64, 64));
    assert_eq!(image.get_pixel(0, 0), source.get_pixel(8, 8));
    assert_eq!(image.get_pixel(63, 63), source.get_pixel(15, 15));
    // Each source pixel covers an 8x8 block.
    assert_eq!(image.get_pixel(8, 0), source.get_pixel(9, 8));

    put_skin(&server, "abc123", modern_skin_png(2)).await;
    let second = render(&server, "abc123", RenderKind::Avatar, 64).await;
    assert_ne!(first.bytes, second.bytes);
}

#[tokio::test]
async fn head_composites_hat_on_modern_skins_only() {
    let server = TestServer::new().await;

    // Opaque hat replaces the face entirely.
    let opaque = skin_image(64, 64, 5);
    put_skin(&server, "modern", png(&opaque)).await;
    let head = decode(&render(&server, "modern", RenderKind::Head, 8).await.bytes);
    assert_eq!(head.get_pixel(0, 0), opaque.get_pixel(40, 8));
    let avatar = decode(&render(&server, "modern", RenderKind::Avatar, 8).await.bytes);
    assert_eq!(avatar.get_pixel(0, 0), opaque.get_pixel(8, 8));

    // Transparent hat leaves the face visible.
    let clear = modern_skin(6);
    put_skin(&server, "clearhat", png(&clear)).await;
    let head = decode(&render(&server, "clearhat", RenderKind::Head, 8).await.bytes);
    assert_eq!(head.get_pixel(3, 4), clear.get_pixel(11, 12));

    // Legacy skins have no hat layer.
    let legacy = skin_image(64, 32, 7);
    put_skin(&server, "legacy", legacy_skin_png(7)).await;
    let head = decode(&render(&server, "legacy", RenderKind::Head, 8).await.bytes);
    assert_eq!(head.get_pixel(0, 0), legacy.get_pixel(8, 8));
}

#[tokio::test]
async fn corrupt_source_degrades_to_placeholder() {
    let server = TestServer::new().await;
    put_skin(&server, "corrupt", Bytes::from_static(b"definitely not a png")).await;

    let rendered = render(&server, "corrupt", RenderKind::Avatar, 32).await;
    assert_eq!(rendered.origin, RenderOrigin::Placeholder);
    assert!(
        decode(&rendered.bytes)
            .pixels()
            .all(|p| *p == AVATAR_PLACEHOLDER)
    );

    // Decodes, but has the wrong shape.
    put_skin(&server, "square", png(&skin_image(32, 32, 1))).await;
    let rendered = render(&server, "square", RenderKind::Head, 32).await;
    assert_eq!(rendered.origin, RenderOrigin::Placeholder);
}

#[tokio::test]
async fn artifact_store_failure_degrades_to_uncached() {
    let backend = Arc::new(FlakyArtifactBackend::new());
    let server = TestServer::with_storage(backend.clone()).await;
    let source = modern_skin(3);
    put_skin(&server, "abc123", png(&source)).await;

    backend.set_failing(true);

    let first = render(&server, "abc123", RenderKind::Avatar, 16).await;
    let second = render(&server, "abc123", RenderKind::Avatar, 16).await;
    assert_eq!(first.origin, RenderOrigin::Derived);
    assert_eq!(second.origin, RenderOrigin::Derived);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(decode(&first.bytes).get_pixel(0, 0), source.get_pixel(8, 8));

    let stats = server.state.engine.stats();
    assert_eq!(stats.derivations, 2);
    // One failed lookup and one failed write per request.
    assert_eq!(stats.store_failures, 4);

    // Uploads still succeed while invalidation is failing.
    put_skin(&server, "abc123", modern_skin_png(4)).await;

    backend.set_failing(false);
    let recovered = render(&server, "abc123", RenderKind::Avatar, 16).await;
    assert_eq!(recovered.origin, RenderOrigin::Derived);
    assert_ne!(recovered.bytes, first.bytes);
    let cached = render(&server, "abc123", RenderKind::Avatar, 16).await;
    assert_eq!(cached.origin, RenderOrigin::Cache);
}

#[tokio::test]
async fn disabled_cache_always_derives() {
    let server = TestServer::with_config(|config| config.render.cache_artifacts = false).await;
    put_skin(&server, "abc123", modern_skin_png(1)).await;

    let first = render(&server, "abc123", RenderKind::Avatar, 24).await;
    let second = render(&server, "abc123", RenderKind::Avatar, 24).await;
    assert_eq!(first.origin, RenderOrigin::Derived);
    assert_eq!(second.origin, RenderOrigin::Derived);
    assert_eq!(first.bytes, second.bytes);

    let stats = server.state.engine.stats();
    assert_eq!(stats.cache_hits, 0);
    assert_eq!(stats.cache_misses, 0);
    assert_eq!(stats.derivations, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_renders_agree() {
    let server = TestServer::new().await;
    put_skin(&server, "abc123", modern_skin_png(9)).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = server.state.engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .render(&RenderRequest::new(
                    Identity::parse("abc123").unwrap(),
                    RenderKind::Head,
                    128,
                ))
                .await
                .unwrap()
        }));
    }

    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.await.unwrap().bytes);
    }
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));

    let cached = render(&server, "abc123", RenderKind::Head, 128).await;
    assert_eq!(cached.origin, RenderOrigin::Cache);
    assert_eq!(cached.bytes, outputs[0]);
}

#[tokio::test]
async fn placeholder_pixels_are_exact() {
    let server = TestServer::new().await;
    let rendered = render(&server, "nobody", RenderKind::Avatar, 9).await;
    let image = decode(&rendered.bytes);
    assert_eq!(*image.get_pixel(4, 4), Rgba([128, 128, 128, 255]));
}
