// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for the Supper dinner orchestrator.
//!
//! Implements [`ChatTransport`] for the Telegram Bot API via teloxide and
//! provides a long-polling loop that turns updates into [`InboundEvent`]s.

pub mod handler;
pub mod media;

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use supper_config::model::TelegramConfig;
use supper_core::{
    AdapterType, ChannelId, ChatTransport, HealthStatus, InboundEvent, InlineKeyboard,
    MessageRef, PluginAdapter, PollRef, SupperError,
};
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{
    AllowedUpdate, CallbackQueryId, ChatId, InlineKeyboardButton, InlineKeyboardMarkup,
    InputPollOption, MessageId, ParseMode,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Telegram limits poll options to 100 characters.
const MAX_POLL_OPTION_CHARS: usize = 100;

/// The only update kinds the workflow consumes.
const ALLOWED_UPDATES: [AllowedUpdate; 3] = [
    AllowedUpdate::Message,
    AllowedUpdate::CallbackQuery,
    AllowedUpdate::PollAnswer,
];

// Workflow texts use `*bold*` and `_italic_`, which MarkdownV2 would reject.
#[allow(deprecated)]
const LEGACY_MARKDOWN: ParseMode = ParseMode::Markdown;

/// Telegram transport implementing [`ChatTransport`].
///
/// Messages are sent with legacy Markdown and fall back to plain text when
/// Telegram rejects the entities (e.g. an unbalanced `_` in a username).
pub struct TelegramTransport {
    bot: Bot,
    poll_timeout: Duration,
}

impl TelegramTransport {
    /// Creates a new transport. Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, SupperError> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SupperError::Config("telegram.bot_token is required".into()))?;

        // One client serves both long polls and regular calls, so its deadline
        // must outlast the server-side poll.
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs + config.request_timeout_secs,
            ))
            .build()
            .map_err(|e| SupperError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            bot: Bot::with_client(token, client),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Spawns the long-polling loop and returns the event receiver.
    ///
    /// The loop stops when `cancel` fires or the receiver is dropped.
    pub fn start_polling(&self, cancel: CancellationToken) -> mpsc::Receiver<InboundEvent> {
        let (tx, rx) = mpsc::channel(100);
        let bot = self.bot.clone();
        let timeout_secs = u32::try_from(self.poll_timeout.as_secs()).unwrap_or(u32::MAX);

        tokio::spawn(async move {
            info!("starting Telegram long polling");
            let mut offset = 0_i32;
            loop {
                let request = bot
                    .get_updates()
                    .offset(offset)
                    .timeout(timeout_secs)
                    .allowed_updates(ALLOWED_UPDATES);
                let batch = tokio::select! {
                    result = request.send() => result,
                    _ = cancel.cancelled() => {
                        info!("Telegram polling loop shutting down");
                        break;
                    }
                };

                match batch {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.id.0 as i32 + 1);
                            let Some(event) = handler::to_inbound_event(update) else {
                                continue;
                            };
                            if tx.send(event).await.is_err() {
                                info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let e = transport_error(bot.token(), "getUpdates", e);
                        error!(error = %e, "Telegram polling error");
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                            _ = cancel.cancelled() => break,
                        }
                    }
                }
            }
        });

        rx
    }

    fn error(&self, method: &str, e: impl Display) -> SupperError {
        transport_error(self.bot.token(), method, e)
    }

    #[cfg(test)]
    fn with_api_url(mut self, url: &str) -> Self {
        self.bot = self.bot.set_api_url(url.parse().expect("valid mock server url"));
        self.poll_timeout = Duration::from_secs(0);
        self
    }
}

/// Wraps a Bot API failure. Network errors print the request URL, which
/// embeds the bot token, so the token is masked.
pub(crate) fn transport_error(token: &str, method: &str, e: impl Display) -> SupperError {
    let message = format!("{method} failed: {e}");
    SupperError::Transport {
        message: message.replace(token, "<bot-token>"),
        source: None,
    }
}

fn is_entity_error(e: &RequestError) -> bool {
    e.to_string().contains("can't parse entities")
}

fn keyboard_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.text.clone(), b.callback_data.clone()))
            .collect::<Vec<_>>()
    }))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn message_id(message: MessageRef) -> Result<MessageId, SupperError> {
    i32::try_from(message.0)
        .map(MessageId)
        .map_err(|_| SupperError::Transport {
            message: format!("message id {} is out of range", message.0),
            source: None,
        })
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, SupperError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(
                self.error("getMe", e).to_string(),
            )),
        }
    }

    async fn shutdown(&self) -> Result<(), SupperError> {
        debug!("Telegram transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        chat: ChannelId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef, SupperError> {
        let markup = keyboard.as_ref().map(keyboard_markup);

        let mut request = self
            .bot
            .send_message(ChatId(chat.0), text)
            .parse_mode(LEGACY_MARKDOWN);
        if let Some(markup) = markup.clone() {
            request = request.reply_markup(markup);
        }

        let sent = match request.await {
            Ok(sent) => sent,
            Err(e) if is_entity_error(&e) => {
                warn!(error = %e, "Markdown rejected, sending as plain text");
                let mut plain = self.bot.send_message(ChatId(chat.0), text);
                if let Some(markup) = markup {
                    plain = plain.reply_markup(markup);
                }
                plain.await.map_err(|e| self.error("sendMessage", e))?
            }
            Err(e) => return Err(self.error("sendMessage", e)),
        };
        Ok(MessageRef(i64::from(sent.id.0)))
    }

    async fn edit_message(
        &self,
        chat: ChannelId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), SupperError> {
        let chat_id = ChatId(chat.0);
        let msg_id = message_id(message)?;

        // No reply_markup: Telegram drops the inline keyboard on edit.
        let result = self
            .bot
            .edit_message_text(chat_id, msg_id, text)
            .parse_mode(LEGACY_MARKDOWN)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) if is_entity_error(&e) => {
                warn!(error = %e, "Markdown edit rejected, retrying as plain text");
                self.bot
                    .edit_message_text(chat_id, msg_id, text)
                    .await
                    .map_err(|e| self.error("editMessageText", e))?;
                Ok(())
            }
            Err(e) => Err(self.error("editMessageText", e)),
        }
    }

    async fn create_poll(
        &self,
        chat: ChannelId,
        question: &str,
        options: &[String],
    ) -> Result<PollRef, SupperError> {
        let options = options
            .iter()
            .map(|o| InputPollOption::new(truncate_chars(o, MAX_POLL_OPTION_CHARS)));
        let sent = self
            .bot
            .send_poll(ChatId(chat.0), question, options)
            .is_anonymous(false)
            .allows_multiple_answers(false)
            .await
            .map_err(|e| self.error("sendPoll", e))?;

        let poll = sent.poll().ok_or_else(|| SupperError::Transport {
            message: "sendPoll result carried no poll".into(),
            source: None,
        })?;
        info!(channel = %chat, poll_id = %poll.id.0, "poll created");
        Ok(PollRef {
            poll_id: poll.id.0.clone(),
            message: MessageRef(i64::from(sent.id.0)),
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), SupperError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .text(text)
            .await
            .map_err(|e| self.error("answerCallbackQuery", e))?;
        Ok(())
    }

    async fn member_count(&self, chat: ChannelId) -> Result<u32, SupperError> {
        self.bot
            .get_chat_member_count(ChatId(chat.0))
            .await
            .map_err(|e| self.error("getChatMemberCount", e))
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, SupperError> {
        media::download_file(&self.bot, file_id).await
    }
}
