// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned key-value persistence for the Supper dinner orchestrator.
//!
//! Provides a WAL-mode SQLite store with a single-writer concurrency model via
//! `tokio-rusqlite`, and an in-memory store with identical version semantics.

pub mod database;
pub mod memory;
pub mod sqlite;

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
