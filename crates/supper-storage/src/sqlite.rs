// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`KeyValueStore`] trait.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use supper_config::model::StorageConfig;
use supper_core::{AdapterType, HealthStatus, KeyValueStore, PluginAdapter, SupperError, Versioned};

use crate::database::{Database, map_tr_err};

/// SQLite-backed key-value store.
///
/// Versions start at 1 on insert and grow by one on every write.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the store at the configured path.
    pub async fn open(config: &StorageConfig) -> Result<Self, SupperError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self { db })
    }

    /// Wrap an already opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn now_stamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn to_version(v: i64) -> u64 {
    u64::try_from(v).unwrap_or_default()
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SupperError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SupperError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, SupperError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT value, version FROM kv WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok(Versioned {
                            value: row.get(0)?,
                            version: to_version(row.get(1)?),
                        })
                    },
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<u64, SupperError> {
        let key = key.to_string();
        let value = value.to_string();
        let version: i64 = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "INSERT INTO kv (key, value, version, updated_at) VALUES (?1, ?2, 1, ?3)
                     ON CONFLICT(key) DO UPDATE
                     SET value = excluded.value, version = kv.version + 1, updated_at = excluded.updated_at
                     RETURNING version",
                    params![key, value, now_stamp()],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)?;
        Ok(to_version(version))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        value: &str,
        expected: Option<u64>,
    ) -> Result<u64, SupperError> {
        let owned_key = key.to_string();
        let value = value.to_string();
        let written = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<u64>, rusqlite::Error> {
                let stamp = now_stamp();
                match expected {
                    None => {
                        let changed = conn.execute(
                            "INSERT INTO kv (key, value, version, updated_at) VALUES (?1, ?2, 1, ?3)
                             ON CONFLICT(key) DO NOTHING",
                            params![owned_key, value, stamp],
                        )?;
                        Ok((changed == 1).then_some(1))
                    }
                    Some(v) => {
                        let expected_version = i64::try_from(v).unwrap_or(i64::MAX);
                        let changed = conn.execute(
                            "UPDATE kv SET value = ?2, version = version + 1, updated_at = ?3
                             WHERE key = ?1 AND version = ?4",
                            params![owned_key, value, stamp, expected_version],
                        )?;
                        Ok((changed == 1).then_some(v + 1))
                    }
                }
            })
            .await
            .map_err(map_tr_err)?;

        written.ok_or_else(|| SupperError::Conflict {
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), SupperError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SupperError> {
        let prefix = prefix.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
                )?;
                let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)
    }
}
