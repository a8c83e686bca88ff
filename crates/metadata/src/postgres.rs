//! PostgreSQL-based metadata store implementation.

use crate::error::MetadataResult;
use crate::models::{TextureCounts, TextureRow};
use crate::repos::TextureRepo;
use crate::store::MetadataStore;
use async_trait::async_trait;
use skinvault_core::config::PgSslMode;
use skinvault_core::{Fingerprint, Identity, SkinModel, TextureSlot};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Connect using a full connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Connect using individual parameters, so the password can come from
    /// the environment instead of a URL in the config file.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }
        if let Some(pass) = password {
            opts = opts.password(pass);
        }
        if let Some(mode) = ssl_mode {
            opts = opts.ssl_mode(match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            });
        }

        // Never log the password.
        tracing::info!(
            host,
            port,
            database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "connecting to PostgreSQL"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{timeout_ms}ms"))]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(
            max_connections,
            statement_timeout_ms,
            "opened postgres metadata store"
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
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
        let mut tx = self.pool.begin().await?;

        // Row lock so two uploads to one identity report distinct predecessors.
        let previous: Option<Option<String>> = sqlx::query_scalar(select_key_for_update(slot))
            .bind(identity.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let upsert = match slot {
            TextureSlot::Skin => sqlx::query(UPSERT_SKIN)
                .bind(identity.as_str())
                .bind(key)
                .bind(fingerprint.to_hex())
                .bind(model.is_slim())
                .bind(now),
            TextureSlot::Cape => sqlx::query(UPSERT_CAPE)
                .bind(identity.as_str())
                .bind(key)
                .bind(fingerprint.to_hex())
                .bind(now),
        };
        upsert.execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(previous.flatten())
    }

    async fn clear_slot(
        &self,
        identity: &Identity,
        slot: TextureSlot,
    ) -> MetadataResult<Option<String>> {
        let mut tx = self.pool.begin().await?;
        let previous: Option<Option<String>> = sqlx::query_scalar(select_key_for_update(slot))
            .bind(identity.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let previous = previous.flatten();
        if previous.is_some() {
            let clear = match slot {
                TextureSlot::Skin => CLEAR_SKIN,
                TextureSlot::Cape => CLEAR_CAPE,
            };
            sqlx::query(clear)
                .bind(identity.as_str())
                .bind(OffsetDateTime::now_utc())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(previous)
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
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
impl TextureRepo for PostgresStore {
    async fn get_texture_set(&self, identity: &Identity) -> MetadataResult<Option<TextureRow>> {
        let row = sqlx::query_as::<_, TextureRow>("SELECT * FROM textures WHERE identity = $1")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_skin(
        &self,
        identity: &Identity,
        key: &str,
        fingerprint: &Fingerprint,
        model: SkinModel,
    ) -> MetadataResult<Option<String>> {
        self.upsert_slot(identity, TextureSlot::Skin, key, fingerprint, model)
            .await
    }

    async fn upsert_cape(
        &self,
        identity: &Identity,
        key: &str,
        fingerprint: &Fingerprint,
    ) -> MetadataResult<Option<String>> {
        self.upsert_slot(
            identity,
            TextureSlot::Cape,
            key,
            fingerprint,
            SkinModel::Classic,
        )
        .await
    }

    async fn clear_skin(&self, identity: &Identity) -> MetadataResult<Option<String>> {
        self.clear_slot(identity, TextureSlot::Skin).await
    }

    async fn clear_cape(&self, identity: &Identity) -> MetadataResult<Option<String>> {
        self.clear_slot(identity, TextureSlot::Cape).await
    }

    async fn delete_texture_set(&self, identity: &Identity) -> MetadataResult<Option<TextureRow>> {
        let row = sqlx::query_as::<_, TextureRow>(
            "DELETE FROM textures WHERE identity = $1 RETURNING *",
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn texture_counts(&self) -> MetadataResult<TextureCounts> {
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
    }
}

fn select_key_for_update(slot: TextureSlot) -> &'static str {
    match slot {
        TextureSlot::Skin => "SELECT skin_key FROM textures WHERE identity = $1 FOR UPDATE",
        TextureSlot::Cape => "SELECT cape_key FROM textures WHERE identity = $1 FOR UPDATE",
    }
}

const UPSERT_SKIN: &str = r#"
INSERT INTO textures (identity, skin_key, skin_hash, skin_slim, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
ON CONFLICT (identity) DO UPDATE SET
    skin_key = EXCLUDED.skin_key,
    skin_hash = EXCLUDED.skin_hash,
    skin_slim = EXCLUDED.skin_slim,
    updated_at = EXCLUDED.updated_at
"#;

const UPSERT_CAPE: &str = r#"
INSERT INTO textures (identity, cape_key, cape_hash, created_at, updated_at)
VALUES ($1, $2, $3, $4, $4)
ON CONFLICT (identity) DO UPDATE SET
    cape_key = EXCLUDED.cape_key,
    cape_hash = EXCLUDED.cape_hash,
    updated_at = EXCLUDED.updated_at
"#;

const CLEAR_SKIN: &str = "UPDATE textures SET skin_key = NULL, skin_hash = NULL, skin_slim = FALSE, updated_at = $2 WHERE identity = $1";
const CLEAR_CAPE: &str =
    "UPDATE textures SET cape_key = NULL, cape_hash = NULL, updated_at = $2 WHERE identity = $1";

/// SQL schema for PostgreSQL. A single statement: prepared queries cannot
/// carry more than one.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS textures (
    identity TEXT PRIMARY KEY,
    skin_key TEXT,
    skin_hash TEXT,
    skin_slim BOOLEAN NOT NULL DEFAULT FALSE,
    cape_key TEXT,
    cape_hash TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CHECK ((skin_key IS NULL) = (skin_hash IS NULL)),
    CHECK ((cape_key IS NULL) = (cape_hash IS NULL))
)
"#;
