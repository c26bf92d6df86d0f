// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`KeyValueStore`] with the same versioning rules as SQLite.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use supper_core::{AdapterType, HealthStatus, KeyValueStore, PluginAdapter, SupperError, Versioned};

/// A process-local store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Versioned>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SupperError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SupperError> {
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, SupperError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<u64, SupperError> {
        let mut entries = self.entries.lock().await;
        let version = entries.get(key).map_or(1, |v| v.version + 1);
        entries.insert(
            key.to_string(),
            Versioned {
                value: value.to_string(),
                version,
            },
        );
        Ok(version)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        value: &str,
        expected: Option<u64>,
    ) -> Result<u64, SupperError> {
        let mut entries = self.entries.lock().await;
        let current = entries.get(key).map(|v| v.version);
        if current != expected {
            return Err(SupperError::Conflict {
                key: key.to_string(),
            });
        }
        let version = current.map_or(1, |v| v + 1);
        entries.insert(
            key.to_string(),
            Versioned {
                value: value.to_string(),
                version,
            },
        );
        Ok(version)
    }

    async fn delete(&self, key: &str) -> Result<(), SupperError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SupperError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
