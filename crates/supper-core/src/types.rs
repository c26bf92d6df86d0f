// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the collaborator traits and the workflow crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity of a chat channel (one household tenant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a chat user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message previously sent to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub i64);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Llm,
    Storage,
}

// --- Transport types ---

/// A single inline button carrying opaque callback data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of inline buttons attached to an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// A keyboard with all buttons on one row.
    pub fn row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    /// Iterates every callback payload on the keyboard.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
    }
}

/// Handle to a poll created through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRef {
    /// Identifier carried by later ballot deliveries.
    pub poll_id: String,
    /// Message that holds the poll.
    pub message: MessageRef,
}

/// The user behind an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
}

impl Sender {
    /// Username when set, otherwise the first name.
    pub fn display_name(&self) -> &str {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.first_name,
        }
    }
}

/// Events delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A user cast or changed a ballot. Carries only the poll identifier.
    PollAnswer {
        poll_id: String,
        user: Sender,
        option_ids: Vec<u32>,
    },
    /// A user pressed an inline button.
    Callback {
        id: String,
        chat: ChannelId,
        message: MessageRef,
        message_text: Option<String>,
        from: Sender,
        data: String,
    },
    /// A plain message, command or photo.
    Message {
        chat: ChannelId,
        message: MessageRef,
        from: Sender,
        text: Option<String>,
        photo_file_id: Option<String>,
    },
}

// --- LLM types ---

/// One dish proposed by the language model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DishSuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients_needed: Vec<String>,
    #[serde(default)]
    pub ingredients_missing: Vec<String>,
}

/// Recipe details for a named dish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DishInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default, alias = "ingredients")]
    pub ingredients_needed: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub description: String,
}

// --- Storage types ---

/// A stored value together with its monotonically increasing version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: u64,
}
