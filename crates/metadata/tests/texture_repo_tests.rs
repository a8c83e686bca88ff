// Texture record lifecycle against every supported database.

mod common;

use common::{all_stores, identity, source_key};
use skinvault_core::{SkinModel, TextureSlot};
use skinvault_metadata::{MetadataStore, SqliteStore, TextureCounts, TextureRepo};

#[tokio::test]
async fn test_upsert_skin_creates_and_replaces() {
    for backend in all_stores().await {
        let store = &backend.store;
        let id = identity("abc123");

        assert!(store.get_texture_set(&id).await.unwrap().is_none());

        let (key1, fp1) = source_key(&id, TextureSlot::Skin, b"v1");
        let previous = store
            .upsert_skin(&id, &key1, &fp1, SkinModel::Slim)
            .await
            .unwrap();
        assert!(previous.is_none(), "{}", backend.name);

        let set = store
            .get_texture_set(&id)
            .await
            .unwrap()
            .unwrap()
            .into_texture_set()
            .unwrap();
        let skin = set.skin.unwrap();
        assert_eq!(skin.raw_key, key1);
        assert_eq!(skin.fingerprint, fp1);
        assert_eq!(skin.model, SkinModel::Slim);
        assert!(set.cape.is_none());

        let (key2, fp2) = source_key(&id, TextureSlot::Skin, b"v2");
        let previous = store
            .upsert_skin(&id, &key2, &fp2, SkinModel::Classic)
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some(key1.as_str()), "{}", backend.name);

        let row = store.get_texture_set(&id).await.unwrap().unwrap();
        assert_eq!(row.skin_hash.as_deref(), Some(fp2.to_hex().as_str()));
        assert!(!row.skin_slim);
        assert!(row.updated_at >= row.created_at);
    }
}

#[tokio::test]
async fn test_cape_slot_is_independent() {
    for backend in all_stores().await {
        let store = &backend.store;
        let id = identity("069a79f4-44e9-4726-a5be-fca90e38aaf5");

        let (skin_key, skin_fp) = source_key(&id, TextureSlot::Skin, b"skin");
        let (cape_key, cape_fp) = source_key(&id, TextureSlot::Cape, b"cape");
        store
            .upsert_skin(&id, &skin_key, &skin_fp, SkinModel::Classic)
            .await
            .unwrap();
        store.upsert_cape(&id, &cape_key, &cape_fp).await.unwrap();

        assert_eq!(
            store.clear_skin(&id).await.unwrap().as_deref(),
            Some(skin_key.as_str()),
            "{}",
            backend.name
        );
        assert!(store.clear_skin(&id).await.unwrap().is_none());

        let set = store
            .get_texture_set(&id)
            .await
            .unwrap()
            .unwrap()
            .into_texture_set()
            .unwrap();
        assert!(set.skin.is_none());
        assert_eq!(set.cape.unwrap().fingerprint, cape_fp);
    }
}

#[tokio::test]
async fn test_clear_on_unknown_identity_is_none() {
    for backend in all_stores().await {
        let store = &backend.store;
        let id = identity("ghost");
        assert!(store.clear_skin(&id).await.unwrap().is_none());
        assert!(store.clear_cape(&id).await.unwrap().is_none());
        assert!(store.delete_texture_set(&id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_delete_returns_row_and_counts_update() {
    for backend in all_stores().await {
        let store = &backend.store;
        let a = identity("alice");
        let b = identity("bob");

        let (key, fp) = source_key(&a, TextureSlot::Skin, b"a");
        store
            .upsert_skin(&a, &key, &fp, SkinModel::Classic)
            .await
            .unwrap();
        let (key, fp) = source_key(&a, TextureSlot::Cape, b"a-cape");
        store.upsert_cape(&a, &key, &fp).await.unwrap();
        let (key, fp) = source_key(&b, TextureSlot::Skin, b"b");
        store
            .upsert_skin(&b, &key, &fp, SkinModel::Slim)
            .await
            .unwrap();

        assert_eq!(
            store.texture_counts().await.unwrap(),
            TextureCounts {
                identities: 2,
                skins: 2,
                capes: 1
            },
            "{}",
            backend.name
        );

        let deleted = store.delete_texture_set(&a).await.unwrap().unwrap();
        assert_eq!(deleted.identity, "alice");
        assert!(deleted.cape_key.is_some());
        assert!(store.get_texture_set(&a).await.unwrap().is_none());

        assert_eq!(
            store.texture_counts().await.unwrap(),
            TextureCounts {
                identities: 1,
                skins: 1,
                capes: 0
            },
            "{}",
            backend.name
        );
    }
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    for backend in all_stores().await {
        let store = &backend.store;
        let id = identity("abc123");
        let (key, fp) = source_key(&id, TextureSlot::Cape, b"keep");
        store.upsert_cape(&id, &key, &fp).await.unwrap();

        store.migrate().await.unwrap();
        store.health_check().await.unwrap();
        assert!(
            store.get_texture_set(&id).await.unwrap().is_some(),
            "{}",
            backend.name
        );
    }
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/metadata.db");
    let id = identity("abc123");
    let (key, fp) = source_key(&id, TextureSlot::Skin, b"persist");

    {
        let store = SqliteStore::new(&path, None).await.unwrap();
        store
            .upsert_skin(&id, &key, &fp, SkinModel::Classic)
            .await
            .unwrap();
        store.pool().close().await;
    }

    let store = SqliteStore::new(&path, None).await.unwrap();
    store.health_check().await.unwrap();
    let row = store.get_texture_set(&id).await.unwrap().unwrap();
    assert_eq!(row.skin_key.as_deref(), Some(key.as_str()));
}
