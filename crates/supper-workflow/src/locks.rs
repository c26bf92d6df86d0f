// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel serialization of multi-step transitions.

use std::sync::Arc;

use dashmap::DashMap;
use supper_core::ChannelId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per channel.
///
/// Held across a whole transition (ballot → quorum → end, volunteer → select,
/// closer, watchdog restart) so the scheduler and inbound events cannot
/// interleave inside it. Never acquire twice on the same task: the mutex is
/// not reentrant.
#[derive(Debug, Default)]
pub struct ChannelLocks {
    locks: DashMap<ChannelId, Arc<Mutex<()>>>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, channel: ChannelId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let mutex = self.locks.entry(channel).or_default().value().clone();
        mutex.lock_owned().await
    }
}
