//! Settings persistence behind the [`SettingsStore`] trait.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, trace, warn};

use super::{ChannelSettings, SettingsError};

/// Storage for per-channel settings records.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Settings for `chat_id`.
    ///
    /// A missing or unreadable record yields [`ChannelSettings::default`];
    /// failures are logged rather than returned.
    async fn get(&self, chat_id: i64) -> ChannelSettings;

    /// Replace the settings for `chat_id`.
    async fn set(&self, chat_id: i64, settings: &ChannelSettings) -> Result<(), SettingsError>;

    /// Remove the settings for `chat_id`. Returns whether a record existed.
    async fn clear(&self, chat_id: i64) -> Result<bool, SettingsError>;
}

/// [`SettingsStore`] backed by SQLite.
#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Open (or create) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created, or
    /// the schema migration fails.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .pragma("trusted_schema", "OFF");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open settings db at {}", path.display()))?;

        Self::new(pool).await.context("failed to apply settings schema")
    }

    /// Wrap an existing pool, applying the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Database`] if the migration fails.
    pub async fn new(pool: SqlitePool) -> Result<Self, SettingsError> {
        let migration_sql = include_str!("../../migrations/001_settings.sql");
        sqlx::raw_sql(migration_sql).execute(&pool).await?;
        Ok(Self { pool })
    }

    async fn load(&self, chat_id: i64) -> Result<Option<ChannelSettings>, SettingsError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT settings FROM channel_settings WHERE chat_id = ?1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((json,)) = row else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, chat_id: i64) -> ChannelSettings {
        match self.load(chat_id).await {
            Ok(Some(settings)) => {
                trace!(chat_id, "settings loaded");
                settings
            }
            Ok(None) => {
                debug!(chat_id, "no stored settings, using defaults");
                ChannelSettings::default()
            }
            Err(e) => {
                warn!(chat_id, error = %e, "failed to load settings, using defaults");
                ChannelSettings::default()
            }
        }
    }

    async fn set(&self, chat_id: i64, settings: &ChannelSettings) -> Result<(), SettingsError> {
        let json = serde_json::to_string(settings)?;
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO channel_settings (chat_id, settings, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(chat_id) DO UPDATE SET settings = ?2, updated_at = ?3",
        )
        .bind(chat_id)
        .bind(&json)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        debug!(chat_id, "settings saved");
        Ok(())
    }

    async fn clear(&self, chat_id: i64) -> Result<bool, SettingsError> {
        let result = sqlx::query("DELETE FROM channel_settings WHERE chat_id = ?1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        debug!(chat_id, removed = result.rows_affected(), "settings cleared");
        Ok(result.rows_affected() > 0)
    }
}
