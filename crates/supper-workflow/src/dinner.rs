// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dinner record lifecycle: create, finish, rate, record consumption.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use supper_core::{ChannelId, Clock, SupperError, UserId};
use tracing::info;

use crate::channel::ChannelService;
use crate::keys;
use crate::models::{DinnerRecord, Dish};
use crate::repo::Repository;

#[derive(Clone)]
pub struct DinnerService {
    repo: Repository,
    channels: ChannelService,
    clock: Arc<dyn Clock>,
}

impl DinnerService {
    pub fn new(repo: Repository, channels: ChannelService, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            channels,
            clock,
        }
    }

    pub async fn get(&self, dinner_id: &str) -> Result<DinnerRecord, SupperError> {
        self.repo.require(dinner_id).await
    }

    /// Starts a dinner and publishes it as the channel's current dinner.
    pub async fn create(
        &self,
        channel: ChannelId,
        dish: Dish,
        cook: UserId,
        cook_name: &str,
    ) -> Result<DinnerRecord, SupperError> {
        if let Some(active) = self
            .channels
            .get(channel)
            .await?
            .and_then(|state| state.current_dinner)
        {
            return Err(active_dinner_error(channel, &active));
        }

        let now = self.clock.now();
        let id = keys::dinner(channel, now.timestamp_millis());
        let dinner = DinnerRecord {
            id: id.clone(),
            channel_id: channel,
            dish,
            cook,
            cook_name: cook_name.to_string(),
            started_at: now,
            finished_at: None,
            ratings: BTreeMap::new(),
            average_rating: 0.0,
            used_ingredients: Vec::new(),
        };
        self.repo.insert(&id, &dinner).await?;

        self.channels
            .update(channel, |state| {
                if let Some(active) = state.current_dinner.as_deref()
                    && active != id
                {
                    return Err(active_dinner_error(channel, active));
                }
                state.current_dinner = Some(id.clone());
                Ok(())
            })
            .await?;

        info!(channel = %channel, dinner_id = %id, dish = %dinner.dish.name, cook = %cook, "dinner created");
        Ok(dinner)
    }

    /// Marks the channel's current dinner finished and clears the pointer.
    pub async fn finish(&self, channel: ChannelId) -> Result<DinnerRecord, SupperError> {
        let dinner_id = self
            .channels
            .get(channel)
            .await?
            .and_then(|state| state.current_dinner)
            .ok_or_else(|| SupperError::PreconditionFailed("no active dinner".into()))?;

        let now = self.clock.now();
        let dinner = self
            .repo
            .update(&dinner_id, |dinner: &mut DinnerRecord| {
                dinner.finished_at.get_or_insert(now);
                Ok(dinner.clone())
            })
            .await?;

        self.channels
            .update(channel, |state| {
                if state.current_dinner.as_deref() == Some(dinner_id.as_str()) {
                    state.current_dinner = None;
                }
                Ok(())
            })
            .await?;

        info!(channel = %channel, dinner_id = %dinner_id, "dinner finished");
        Ok(dinner)
    }

    /// Stores `user`'s rating (1..=5, re-rating overwrites) and recomputes the mean.
    pub async fn rate(
        &self,
        dinner_id: &str,
        user: UserId,
        rating: u8,
    ) -> Result<DinnerRecord, SupperError> {
        if !(1..=5).contains(&rating) {
            return Err(SupperError::InvalidInput(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        let dinner = self
            .repo
            .update(dinner_id, |dinner: &mut DinnerRecord| {
                dinner.ratings.insert(user, rating);
                dinner.average_rating = mean(&dinner.ratings);
                Ok(dinner.clone())
            })
            .await?;
        info!(dinner_id, user = %user, rating, average = dinner.average_rating, "dinner rated");
        Ok(dinner)
    }

    /// Remembers which ingredients the meal consumed. The fridge is not touched.
    pub async fn record_used_ingredients(
        &self,
        dinner_id: &str,
        ingredients: Vec<String>,
    ) -> Result<DinnerRecord, SupperError> {
        self.repo
            .update(dinner_id, |dinner: &mut DinnerRecord| {
                dinner.used_ingredients = ingredients.clone();
                Ok(dinner.clone())
            })
            .await
    }

    /// Whether any of the channel's dinners started in `[from, to)`.
    pub async fn any_started_between(
        &self,
        channel: ChannelId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, SupperError> {
        // Keys embed the start time, so no record needs to be read.
        let prefix = keys::channel_dinners(channel);
        let (from, to) = (from.timestamp_millis(), to.timestamp_millis());
        Ok(self
            .repo
            .list_keys(&prefix)
            .await?
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix)?.parse::<i64>().ok())
            .any(|millis| millis >= from && millis < to))
    }
}

fn mean(ratings: &BTreeMap<UserId, u8>) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: u32 = ratings.values().map(|&r| u32::from(r)).sum();
    f64::from(total) / ratings.len() as f64
}

fn active_dinner_error(channel: ChannelId, dinner_id: &str) -> SupperError {
    SupperError::PreconditionFailed(format!(
        "channel {channel} already has an active dinner ({dinner_id})"
    ))
}
