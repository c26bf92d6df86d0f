// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dishes proposed by channel members for upcoming polls.

use std::sync::Arc;

use supper_core::{ChannelId, Clock, Sender, SupperError};
use tracing::{info, warn};

use crate::keys;
use crate::models::UserSuggestion;
use crate::repo::Repository;

#[derive(Clone)]
pub struct SuggestionService {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl SuggestionService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn add(
        &self,
        channel: ChannelId,
        from: &Sender,
        name: &str,
        cuisine: &str,
        description: &str,
    ) -> Result<UserSuggestion, SupperError> {
        let now = self.clock.now();
        let suggestion = UserSuggestion {
            id: keys::suggestion(channel, now.timestamp_millis()),
            channel_id: channel,
            user_id: from.id,
            username: from.display_name().to_string(),
            name: name.to_string(),
            cuisine: cuisine.to_string(),
            description: description.to_string(),
            suggested_at: now,
            used_in_poll: false,
        };
        self.repo.insert(&suggestion.id, &suggestion).await?;
        info!(channel = %channel, suggestion = %suggestion.id, dish = %name, "dish suggested");
        Ok(suggestion)
    }

    /// Suggestions not yet offered in a poll, oldest first.
    pub async fn unused(&self, channel: ChannelId) -> Result<Vec<UserSuggestion>, SupperError> {
        let mut unused = Vec::new();
        for key in self.repo.list_keys(&keys::channel_suggestions(channel)).await? {
            match self.repo.get::<UserSuggestion>(&key).await {
                Ok(Some(s)) if !s.used_in_poll => unused.push(s),
                Ok(_) => {}
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable suggestion"),
            }
        }
        unused.sort_by_key(|s| s.suggested_at);
        Ok(unused)
    }

    pub async fn mark_used(&self, id: &str) -> Result<(), SupperError> {
        self.repo
            .update(id, |s: &mut UserSuggestion| {
                s.used_in_poll = true;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supper_core::{SystemClock, UserId};
    use supper_storage::MemoryStore;

    #[tokio::test]
    async fn used_suggestions_are_filtered() {
        let service = SuggestionService::new(
            Repository::new(Arc::new(MemoryStore::new())),
            Arc::new(SystemClock),
        );
        let ch = ChannelId(3);
        let from = Sender {
            id: UserId(7),
            username: Some("ann".into()),
            first_name: "Ann".into(),
        };
        let lasagna = service
            .add(ch, &from, "Lasagna", "Italian", "Layers")
            .await
            .unwrap();
        assert_eq!(lasagna.username, "ann");
        assert_eq!(service.unused(ch).await.unwrap().len(), 1);

        service.mark_used(&lasagna.id).await.unwrap();
        assert!(service.unused(ch).await.unwrap().is_empty());
    }
}
