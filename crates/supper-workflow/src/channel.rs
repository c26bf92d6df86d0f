// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to per-channel workflow snapshots.

use std::sync::Arc;

use supper_core::{ChannelId, Clock, SupperError};
use tracing::{debug, warn};

use crate::keys;
use crate::models::ChannelState;
use crate::repo::Repository;

#[derive(Clone)]
pub struct ChannelService {
    repo: Repository,
    clock: Arc<dyn Clock>,
    default_cuisines: Vec<String>,
}

impl ChannelService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>, default_cuisines: Vec<String>) -> Self {
        Self {
            repo,
            clock,
            default_cuisines,
        }
    }

    pub async fn get(&self, channel: ChannelId) -> Result<Option<ChannelState>, SupperError> {
        self.repo.get(&keys::channel(channel)).await
    }

    /// Returns the channel's state, registering it with default cuisines if new.
    pub async fn ensure(&self, channel: ChannelId) -> Result<ChannelState, SupperError> {
        self.update(channel, |state| Ok(state.clone())).await
    }

    /// Read-modify-writes the channel snapshot, creating it when absent.
    ///
    /// Every successful update stamps `last_activity`.
    pub async fn update<R, F>(&self, channel: ChannelId, mut f: F) -> Result<R, SupperError>
    where
        F: FnMut(&mut ChannelState) -> Result<R, SupperError>,
    {
        let now = self.clock.now();
        self.repo
            .upsert(
                &keys::channel(channel),
                || ChannelState::new(channel, self.default_cuisines.clone(), now),
                |state: &mut ChannelState| {
                    let out = f(state)?;
                    state.last_activity = now;
                    Ok(out)
                },
            )
            .await
    }

    /// Every registered channel, in key order.
    pub async fn list(&self) -> Result<Vec<ChannelId>, SupperError> {
        let keys = self.repo.list_keys(keys::CHANNEL_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                let parsed = keys::parse_channel(key);
                if parsed.is_none() {
                    warn!(key = %key, "ignoring malformed channel key");
                }
                parsed
            })
            .collect())
    }

    pub async fn set_cuisines(
        &self,
        channel: ChannelId,
        cuisines: Vec<String>,
    ) -> Result<Vec<String>, SupperError> {
        let cuisines: Vec<String> = cuisines
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if cuisines.is_empty() {
            return Err(SupperError::InvalidInput(
                "at least one cuisine is required".into(),
            ));
        }
        self.update(channel, |state| {
            state.cuisines = cuisines.clone();
            Ok(state.cuisines.clone())
        })
        .await
    }

    /// Records a freshly observed member count (bot already excluded).
    pub async fn set_member_count(&self, channel: ChannelId, count: u32) -> Result<(), SupperError> {
        self.update(channel, |state| {
            if state.member_count != count {
                debug!(channel = %channel, from = state.member_count, to = count, "member count changed");
            }
            state.member_count = count;
            Ok(())
        })
        .await
    }
}
