// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait for the messaging platform (Telegram).

use async_trait::async_trait;

use crate::error::SupperError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelId, InlineKeyboard, MessageRef, PollRef};

/// Outbound side of the chat platform.
///
/// Inbound events are delivered separately as
/// [`InboundEvent`](crate::types::InboundEvent)s; ballot deliveries are
/// asynchronous with respect to poll creation.
#[async_trait]
pub trait ChatTransport: PluginAdapter {
    /// Sends a text message, optionally with an inline keyboard.
    async fn send_message(
        &self,
        chat: ChannelId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef, SupperError>;

    /// Replaces the text of an earlier message and drops its keyboard.
    async fn edit_message(
        &self,
        chat: ChannelId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), SupperError>;

    /// Creates a single-choice, non-anonymous poll.
    async fn create_poll(
        &self,
        chat: ChannelId,
        question: &str,
        options: &[String],
    ) -> Result<PollRef, SupperError>;

    /// Acknowledges an inline button press with a short toast.
    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), SupperError>;

    /// Number of members in the chat, including bots.
    async fn member_count(&self, chat: ChannelId) -> Result<u32, SupperError>;

    /// Downloads an uploaded file. Platform URLs may embed credentials, so
    /// only the bytes cross this boundary.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, SupperError>;
}
