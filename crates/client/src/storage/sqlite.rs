//! SQLite-backed session storage.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use curator_auth::{SessionStorage, StorageError, StorageKey};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

/// Key/value table holding the session, one row per [`StorageKey`].
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `url` and ensure the table exists.
    pub async fn open(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid SQLite URL {url:?}"))?
            .create_if_missing(true);

        // A single long-lived connection: `sqlite::memory:` databases live
        // and die with their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to create SQLite pool for session storage at {url:?}"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_kv (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_kv table")?;

        Ok(Self { pool })
    }

    pub async fn open_path(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create storage directory at {:?}", parent))?;
        }
        Self::open(&format!("sqlite://{}", path.to_string_lossy())).await
    }

    /// `{app_data_dir}/session.db`.
    pub async fn at_default_location() -> anyhow::Result<Self> {
        let mut path = super::app_data_dir()?;
        path.push("session.db");
        Self::open_path(&path).await
    }

    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::open("sqlite::memory:").await
    }
}

#[async_trait]
impl SessionStorage for SqliteStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT value
            FROM session_kv
            WHERE key = ?1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::read(key, e))?;

        row.map(|row| row.try_get::<String, _>("value"))
            .transpose()
            .map_err(|e| StorageError::read(key, e))
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO session_kv (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::write(key, e))?;
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_kv WHERE key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::write(key, e))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_kv")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Unavailable(format!("failed to clear session_kv: {e}")))?;
        Ok(())
    }
}
