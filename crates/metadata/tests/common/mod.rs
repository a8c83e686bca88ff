//! Metadata test utilities.

use skinvault_core::{Fingerprint, Identity, SourceTexture, TextureSlot};
use skinvault_metadata::{MetadataStore, PostgresStore, SqliteStore};
use std::sync::Arc;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

/// A store under test, keeping its container alive.
pub struct TestStore {
    pub name: &'static str,
    pub store: Arc<dyn MetadataStore>,
    _container: Option<ContainerAsync<Postgres>>,
}

/// A fresh in-memory SQLite store, plus a PostgreSQL store in a container
/// unless Docker is unavailable or SKIP_POSTGRES_TESTS is set.
///
/// Only container-start failures cause a skip; schema or connection errors
/// against a running container still panic.
pub async fn all_stores() -> Vec<TestStore> {
    let sqlite = SqliteStore::in_memory()
        .await
        .expect("Failed to create SQLite store");
    let mut stores = vec![TestStore {
        name: "sqlite",
        store: Arc::new(sqlite),
        _container: None,
    }];

    if std::env::var("SKIP_POSTGRES_TESTS").is_ok() {
        return stores;
    }

    let container = match Postgres::default().with_tag("15-alpine").start().await {
        Ok(container) => container,
        Err(e) => {
            eprintln!("Skipping PostgreSQL store (Docker unavailable): {e}");
            return stores;
        }
    };
    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    // Default credentials of the postgres module.
    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");
    let postgres = PostgresStore::from_url(&url, 5, Some(10_000))
        .await
        .expect("Failed to open PostgreSQL store");

    stores.push(TestStore {
        name: "postgres",
        store: Arc::new(postgres),
        _container: Some(container),
    });
    stores
}

pub fn identity(raw: &str) -> Identity {
    Identity::parse(raw).unwrap()
}

/// Object key and fingerprint of a source upload.
pub fn source_key(id: &Identity, slot: TextureSlot, data: &[u8]) -> (String, Fingerprint) {
    let fp = Fingerprint::compute(data);
    (SourceTexture::object_key(id, slot, &fp), fp)
}
