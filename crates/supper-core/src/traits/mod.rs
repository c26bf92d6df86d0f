// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod clock;
pub mod llm;
pub mod storage;
pub mod transport;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use llm::LlmClient;
pub use storage::KeyValueStore;
pub use transport::ChatTransport;
