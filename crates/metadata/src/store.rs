//! Metadata store trait and implementations.

use crate::error::MetadataResult;
use crate::models::{TextureCounts, TextureRow};
use crate::repos::TextureRepo;
use async_trait::async_trait;
use skinvault_core::{Fingerprint, Identity, SkinModel, TextureSlot};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: TextureRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open (and create if missing) a SQLite store at `path`.
    ///
    /// `:memory:` opens a database that lives as long as the store.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout = Duration::from_secs(query_timeout_secs.unwrap_or(30));

        let opts = if path.as_os_str() == IN_MEMORY {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        };
        // Prevent transient "database is locked" errors under concurrent access.
        let opts = opts.busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // A single long-lived connection: SQLite serializes writers anyway,
            // and an in-memory database disappears with its connection.
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout,
        };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            query_timeout_secs = query_timeout.as_secs(),
            "opened sqlite metadata store"
        );

        Ok(store)
    }

    /// Open a private in-memory store.
    pub async fn in_memory() -> MetadataResult<Self> {
        Self::new(IN_MEMORY, None).await
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run `query`, warning when it outlives the advisory timeout.
    ///
    /// SQLite cannot cancel a running statement, so the timeout only logs.
    async fn timed<T>(
        &self,
        operation: &'static str,
        query: impl Future<Output = MetadataResult<T>>,
    ) -> MetadataResult<T> {
        let started = Instant::now();
        let result = query.await;
        let elapsed = started.elapsed();
        if elapsed > self.query_timeout {
            tracing::warn!(
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_secs = self.query_timeout.as_secs(),
                "metadata query exceeded advisory timeout"
            );
        }
        result
    }

    async fn upsert_slot(
        &self,
        identity: &Identity,
        slot: TextureSlot,
        key: &str,
        fingerprint: &Fingerprint,
        model: SkinModel,
    ) -> MetadataResult<Option<String>> {
        let now = OffsetDateTime::now_utc();
        let (select, upsert) = match slot {
            TextureSlot::Skin => (
                SELECT_SKIN_KEY,
                sqlx::query(UPSERT_SKIN)
                    .bind(identity.as_str())
                    .bind(key)
                    .bind(fingerprint.to_hex())
                    .bind(model.is_slim())
                    .bind(now)
                    .bind(now),
            ),
            TextureSlot::Cape => (
                SELECT_CAPE_KEY,
                sqlx::query(UPSERT_CAPE)
                    .bind(identity.as_str())
                    .bind(key)
                    .bind(fingerprint.to_hex())
                    .bind(now)
                    .bind(now),
            ),
        };

        let mut tx = self.pool.begin().await?;
        let previous: Option<Option<String>> = sqlx::query_scalar(select)
            .bind(identity.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        upsert.execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(previous.flatten())
    }

    async fn clear_slot(
        &self,
        identity: &Identity,
        slot: TextureSlot,
    ) -> MetadataResult<Option<String>> {
        let (select, clear) = match slot {
            TextureSlot::Skin => (SELECT_SKIN_KEY, CLEAR_SKIN),
            TextureSlot::Cape => (SELECT_CAPE_KEY, CLEAR_CAPE),
        };

        let mut tx = self.pool.begin().await?;
        let previous: Option<Option<String>> = sqlx::query_scalar(select)
            .bind(identity.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let previous = previous.flatten();
        if previous.is_some() {
            sqlx::query(clear)
                .bind(OffsetDateTime::now_utc())
                .bind(identity.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(previous)
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TextureRepo for SqliteStore {
    async fn get_texture_set(&self, identity: &Identity) -> MetadataResult<Option<TextureRow>> {
        self.timed("get_texture_set", async {
            let row = sqlx::query_as::<_, TextureRow>("SELECT * FROM textures WHERE identity = ?")
                .bind(identity.as_str())
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        })
        .await
    }

    async fn upsert_skin(
        &self,
        identity: &Identity,
        key: &str,
        fingerprint: &Fingerprint,
        model: SkinModel,
    ) -> MetadataResult<Option<String>> {
        self.timed(
            "upsert_skin",
            self.upsert_slot(identity, TextureSlot::Skin, key, fingerprint, model),
        )
        .await
    }

    async fn upsert_cape(
        &self,
        identity: &Identity,
        key: &str,
        fingerprint: &Fingerprint,
    ) -> MetadataResult<Option<String>> {
        self.timed(
            "upsert_cape",
            self.upsert_slot(
                identity,
                TextureSlot::Cape,
                key,
                fingerprint,
                SkinModel::Classic,
            ),
        )
        .await
    }

    async fn clear_skin(&self, identity: &Identity) -> MetadataResult<Option<String>> {
        self.timed("clear_skin", self.clear_slot(identity, TextureSlot::Skin))
            .await
    }

    async fn clear_cape(&self, identity: &Identity) -> MetadataResult<Option<String>> {
        self.timed("clear_cape", self.clear_slot(identity, TextureSlot::Cape))
            .await
    }

    async fn delete_texture_set(&self, identity: &Identity) -> MetadataResult<Option<TextureRow>> {
        self.timed("delete_texture_set", async {
            let row = sqlx::query_as::<_, TextureRow>(
                "DELETE FROM textures WHERE identity = ? RETURNING *",
            )
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn texture_counts(&self) -> MetadataResult<TextureCounts> {
        self.timed("texture_counts", async {
            let (identities, skins, capes): (i64, i64, i64) = sqlx::query_as(
                "SELECT COUNT(*), COUNT(skin_key), COUNT(cape_key) FROM textures",
            )
            .fetch_one(&self.pool)
            .await?;
            Ok(TextureCounts {
                identities: identities.max(0) as u64,
                skins: skins.max(0) as u64,
                capes: capes.max(0) as u64,
            })
        })
        .await
    }
}

const SELECT_SKIN_KEY: &str = "SELECT skin_key FROM textures WHERE identity = ?";
const SELECT_CAPE_KEY: &str = "SELECT cape_key FROM textures WHERE identity = ?";

const UPSERT_SKIN: &str = r#"
INSERT INTO textures (identity, skin_key, skin_hash, skin_slim, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
ON CONFLICT(identity) DO UPDATE SET
    skin_key = excluded.skin_key,
    skin_hash = excluded.skin_hash,
    skin_slim = excluded.skin_slim,
    updated_at = excluded.updated_at
"#;

const UPSERT_CAPE: &str = r#"
INSERT INTO textures (identity, cape_key, cape_hash, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT(identity) DO UPDATE SET
    cape_key = excluded.cape_key,
    cape_hash = excluded.cape_hash,
    updated_at = excluded.updated_at
"#;

const CLEAR_SKIN: &str = "UPDATE textures SET skin_key = NULL, skin_hash = NULL, skin_slim = 0, updated_at = ? WHERE identity = ?";
const CLEAR_CAPE: &str =
    "UPDATE textures SET cape_key = NULL, cape_hash = NULL, updated_at = ? WHERE identity = ?";

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS textures (
    identity TEXT PRIMARY KEY,
    skin_key TEXT,
    skin_hash TEXT,
    skin_slim INTEGER NOT NULL DEFAULT 0,
    cape_key TEXT,
    cape_hash TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK ((skin_key IS NULL) = (skin_hash IS NULL)),
    CHECK ((cape_key IS NULL) = (cape_hash IS NULL))
);
"#;
