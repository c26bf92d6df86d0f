// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store trait with per-key versions.

use async_trait::async_trait;

use crate::error::SupperError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Versioned;

/// Flat key-value persistence with optimistic concurrency.
///
/// Values are opaque strings (JSON in practice). Every successful write
/// bumps the key's version; [`compare_and_set`](KeyValueStore::compare_and_set)
/// only succeeds when the caller saw the latest version. No multi-key
/// transactions are offered.
#[async_trait]
pub trait KeyValueStore: PluginAdapter {
    /// Returns the value and version stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Versioned>, SupperError>;

    /// Unconditionally writes `value`, returning the new version.
    async fn set(&self, key: &str, value: &str) -> Result<u64, SupperError>;

    /// Writes `value` only if the current version equals `expected`.
    ///
    /// `expected == None` means the key must not exist yet. A mismatch
    /// returns [`SupperError::Conflict`].
    async fn compare_and_set(
        &self,
        key: &str,
        value: &str,
        expected: Option<u64>,
    ) -> Result<u64, SupperError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), SupperError>;

    /// Lists every key starting with `prefix`, in ascending order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, SupperError>;
}
