// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable records persisted as JSON in the key-value store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use supper_core::{ChannelId, MessageRef, UserId};

/// Per-channel workflow snapshot, stored at `channel:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub channel_id: ChannelId,
    pub cuisines: Vec<String>,
    /// Last observed member count, bot excluded. Zero means never observed.
    #[serde(default)]
    pub member_count: u32,
    /// Poll id of the open vote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_vote: Option<String>,
    /// Id of the dinner being cooked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_dinner: Option<String>,
    /// Poll id of an ended vote whose winner still needs a cook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting_cook: Option<String>,
    /// When the volunteer watchdog first saw `awaiting_cook` without volunteers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volunteer_wait_since: Option<DateTime<Utc>>,
    pub last_activity: DateTime<Utc>,
}

impl ChannelState {
    pub fn new(channel_id: ChannelId, cuisines: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            channel_id,
            cuisines,
            member_count: 0,
            current_vote: None,
            current_dinner: None,
            awaiting_cook: None,
            volunteer_wait_since: None,
            last_activity: now,
        }
    }

    /// No open vote, no pending cook request and no dinner in progress.
    pub fn is_idle(&self) -> bool {
        self.current_vote.is_none() && self.awaiting_cook.is_none() && self.current_dinner.is_none()
    }
}

/// One poll instance, stored at `vote:{channel}:{poll_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteState {
    pub channel_id: ChannelId,
    pub poll_id: String,
    pub message_ref: MessageRef,
    pub options: Vec<String>,
    /// Each user's latest choice.
    #[serde(default)]
    pub votes: BTreeMap<UserId, String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_option: Option<String>,
    /// Volunteers in the order they offered.
    #[serde(default)]
    pub cook_volunteers: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_cook: Option<UserId>,
}

impl VoteState {
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// What is being cooked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// One cooked meal, stored at `dinner:{channel}:{millis}`. The key is the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DinnerRecord {
    pub id: String,
    pub channel_id: ChannelId,
    pub dish: Dish,
    pub cook: UserId,
    #[serde(default)]
    pub cook_name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ratings: BTreeMap<UserId, u8>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub used_ingredients: Vec<String>,
}

impl DinnerRecord {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// One fridge entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// A channel's ingredient inventory, stored at `fridge:{id}`. Keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fridge {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub ingredients: BTreeMap<String, Ingredient>,
    pub last_updated: DateTime<Utc>,
}

impl Fridge {
    pub fn empty(channel_id: ChannelId, now: DateTime<Utc>) -> Self {
        Self {
            channel_id,
            ingredients: BTreeMap::new(),
            last_updated: now,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.ingredients.values().map(|i| i.name.clone()).collect()
    }
}

/// A dish proposed by a channel member with `/suggest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSuggestion {
    pub id: String,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub description: String,
    pub suggested_at: DateTime<Utc>,
    #[serde(default)]
    pub used_in_poll: bool,
}
