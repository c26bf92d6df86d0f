// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed JSON access to the key-value store with optimistic concurrency.
//!
//! Every read-modify-write goes through [`Repository::update`] or
//! [`Repository::upsert`]: the record is read together with its version,
//! the closure mutates it, and the write only lands if nobody else wrote
//! the key in between. A lost race re-reads and re-applies the closure.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use supper_core::{KeyValueStore, SupperError};
use tracing::debug;

/// Attempts before a contended update gives up with [`SupperError::Conflict`].
pub const MAX_CAS_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KeyValueStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads a record and its version.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, u64)>, SupperError> {
        let Some(stored) = self.store.get(key).await? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&stored.value).map_err(SupperError::serialization)?;
        Ok(Some((value, stored.version)))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SupperError> {
        Ok(self.load(key).await?.map(|(value, _)| value))
    }

    /// Like [`get`](Self::get) but absence is a [`SupperError::NotFound`].
    pub async fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, SupperError> {
        self.get(key)
            .await?
            .ok_or_else(|| SupperError::not_found(entity_of(key), key))
    }

    /// Creates a record. Fails with [`SupperError::Conflict`] if the key exists.
    pub async fn insert<T: Serialize>(&self, key: &str, value: &T) -> Result<u64, SupperError> {
        let json = serde_json::to_string(value).map_err(SupperError::serialization)?;
        self.store.compare_and_set(key, &json, None).await
    }

    /// Unconditional write.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<u64, SupperError> {
        let json = serde_json::to_string(value).map_err(SupperError::serialization)?;
        self.store.set(key, &json).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), SupperError> {
        self.store.delete(key).await
    }

    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SupperError> {
        self.store.list_keys(prefix).await
    }

    /// Applies `f` to an existing record under compare-and-swap.
    ///
    /// An `Err` from `f` aborts without writing.
    pub async fn update<T, R, F>(&self, key: &str, f: F) -> Result<R, SupperError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut T) -> Result<R, SupperError>,
    {
        self.modify(key, None::<fn() -> T>, f).await
    }

    /// Like [`update`](Self::update) but starts from `init()` when the key is absent.
    pub async fn upsert<T, R, I, F>(&self, key: &str, init: I, f: F) -> Result<R, SupperError>
    where
        T: Serialize + DeserializeOwned,
        I: Fn() -> T,
        F: FnMut(&mut T) -> Result<R, SupperError>,
    {
        self.modify(key, Some(init), f).await
    }

    async fn modify<T, R, I, F>(&self, key: &str, init: Option<I>, mut f: F) -> Result<R, SupperError>
    where
        T: Serialize + DeserializeOwned,
        I: Fn() -> T,
        F: FnMut(&mut T) -> Result<R, SupperError>,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let (mut value, expected) = match self.load::<T>(key).await? {
                Some((value, version)) => (value, Some(version)),
                None => match init.as_ref() {
                    Some(init) => (init(), None),
                    None => return Err(SupperError::not_found(entity_of(key), key)),
                },
            };

            let out = f(&mut value)?;
            let json = serde_json::to_string(&value).map_err(SupperError::serialization)?;
            match self.store.compare_and_set(key, &json, expected).await {
                Ok(_) => return Ok(out),
                Err(SupperError::Conflict { .. }) => {
                    debug!(key, attempt, "version conflict, retrying update");
                }
                Err(e) => return Err(e),
            }
        }
        Err(SupperError::Conflict {
            key: key.to_string(),
        })
    }
}

/// Record kind named by the key prefix, used in not-found errors.
fn entity_of(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use supper_core::{AdapterType, HealthStatus, PluginAdapter, Versioned};
    use supper_storage::MemoryStore;

    fn repo() -> Repository {
        Repository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let err = repo()
            .update::<u32, _, _>("channel:1", |n| {
                *n += 1;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::NotFound { ref entity, .. } if entity == "channel"));
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let repo = repo();
        for _ in 0..3 {
            repo.upsert("counter", || 0u32, |n| {
                *n += 1;
                Ok(())
            })
            .await
            .unwrap();
        }
        assert_eq!(repo.get::<u32>("counter").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn closure_error_aborts_write() {
        let repo = repo();
        repo.put("counter", &7u32).await.unwrap();
        let err = repo
            .update::<u32, (), _>("counter", |_| Err(SupperError::InvalidInput("nope".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::InvalidInput(_)));
        assert_eq!(repo.load::<u32>("counter").await.unwrap(), Some((7, 1)));
    }

    /// Bumps the stored value behind the caller's back on the first N reads.
    struct RacingStore {
        inner: MemoryStore,
        interference: AtomicUsize,
    }

    #[async_trait]
    impl PluginAdapter for RacingStore {
        fn name(&self) -> &str {
            "racing"
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
    impl KeyValueStore for RacingStore {
        async fn get(&self, key: &str) -> Result<Option<Versioned>, SupperError> {
            let current = self.inner.get(key).await?;
            if self.interference.load(Ordering::SeqCst) > 0 {
                self.interference.fetch_sub(1, Ordering::SeqCst);
                if let Some(v) = current.as_ref() {
                    let n: u32 = serde_json::from_str(&v.value).unwrap();
                    self.inner.set(key, &(n + 100).to_string()).await?;
                }
            }
            Ok(current)
        }
        async fn set(&self, key: &str, value: &str) -> Result<u64, SupperError> {
            self.inner.set(key, value).await
        }
        async fn compare_and_set(
            &self,
            key: &str,
            value: &str,
            expected: Option<u64>,
        ) -> Result<u64, SupperError> {
            self.inner.compare_and_set(key, value, expected).await
        }
        async fn delete(&self, key: &str) -> Result<(), SupperError> {
            self.inner.delete(key).await
        }
        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SupperError> {
            self.inner.list_keys(prefix).await
        }
    }

    #[tokio::test]
    async fn conflicting_writer_is_retried_not_clobbered() {
        let store = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            interference: AtomicUsize::new(2),
        });
        store.inner.set("counter", "1").await.unwrap();
        let repo = Repository::new(store.clone());

        repo.update::<u32, _, _>("counter", |n| {
            *n += 1;
            Ok(())
        })
        .await
        .unwrap();

        // Two interfering writes of +100 each survive, plus our +1.
        assert_eq!(repo.get::<u32>("counter").await.unwrap(), Some(202));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_conflict() {
        let store = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            interference: AtomicUsize::new(MAX_CAS_ATTEMPTS),
        });
        store.inner.set("counter", "1").await.unwrap();
        let repo = Repository::new(store);

        let err = repo
            .update::<u32, _, _>("counter", |n| {
                *n += 1;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::Conflict { ref key } if key == "counter"));
    }
}
