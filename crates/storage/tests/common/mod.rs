use skinvault_core::{ArtifactKey, Fingerprint, Identity, RenderKind, RenderSize};
use skinvault_storage::{FilesystemBackend, MemoryBackend, ObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A backend under test, keeping its scratch directory alive.
pub struct TestBackend {
    pub store: Arc<dyn ObjectStore>,
    _dir: Option<TempDir>,
}

/// One instance of every backend.
pub async fn all_backends() -> Vec<TestBackend> {
    let dir = TempDir::new().unwrap();
    let filesystem = FilesystemBackend::new(dir.path()).await.unwrap();
    vec![
        TestBackend {
            store: Arc::new(filesystem),
            _dir: Some(dir),
        },
        TestBackend {
            store: Arc::new(MemoryBackend::new()),
            _dir: None,
        },
    ]
}

#[allow(dead_code)]
pub fn artifact_key(identity: &str, kind: RenderKind, size: u32, source: &[u8]) -> ArtifactKey {
    ArtifactKey::new(
        Identity::parse(identity).unwrap(),
        kind,
        RenderSize::new(size).unwrap(),
        Fingerprint::compute(source),
    )
}
