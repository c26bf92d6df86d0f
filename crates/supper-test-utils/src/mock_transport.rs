// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport` and captures every outbound
//! call (messages, edits, polls, callback answers) for assertion in tests.
//! Message references and poll ids are handed out sequentially. Downloaded
//! files contain `jpeg:<file_id>`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use supper_core::{
    AdapterType, ChannelId, ChatTransport, HealthStatus, InlineKeyboard, MessageRef,
    PluginAdapter, PollRef, SupperError,
};

/// A message passed to `send_message()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat: ChannelId,
    pub message: MessageRef,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

/// A call to `edit_message()`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedMessage {
    pub chat: ChannelId,
    pub message: MessageRef,
    pub text: String,
}

/// A poll opened through `create_poll()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPoll {
    pub chat: ChannelId,
    pub poll: PollRef,
    pub question: String,
    pub options: Vec<String>,
}

/// A toast shown for a button press.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackAnswer {
    pub callback_id: String,
    pub text: String,
}

/// A mock chat transport for testing.
///
/// Member count defaults to `None`, which makes `member_count()` fail the way
/// an unreachable chat API would. Set it with [`MockTransport::set_member_count`].
pub struct MockTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    edits: Arc<Mutex<Vec<EditedMessage>>>,
    polls: Arc<Mutex<Vec<CreatedPoll>>>,
    answers: Arc<Mutex<Vec<CallbackAnswer>>>,
    member_count: Arc<Mutex<Option<u32>>>,
    next_message: AtomicI64,
    next_poll: AtomicI64,
    fail_sends: AtomicBool,
    fail_polls: AtomicBool,
}

impl MockTransport {
    /// Create a new mock transport with empty capture buffers.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            edits: Arc::new(Mutex::new(Vec::new())),
            polls: Arc::new(Mutex::new(Vec::new())),
            answers: Arc::new(Mutex::new(Vec::new())),
            member_count: Arc::new(Mutex::new(None)),
            next_message: AtomicI64::new(1),
            next_poll: AtomicI64::new(1),
            fail_sends: AtomicBool::new(false),
            fail_polls: AtomicBool::new(false),
        }
    }

    /// Total members reported for every chat, bot included. `None` fails the call.
    pub async fn set_member_count(&self, count: Option<u32>) {
        *self.member_count.lock().await = count;
    }

    /// Make `send_message()` fail until switched back.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make `create_poll()` fail until switched back.
    pub fn fail_polls(&self, fail: bool) {
        self.fail_polls.store(fail, Ordering::SeqCst);
    }

    /// Get all messages that were sent.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts of all sent messages, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|m| m.text.clone()).collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Whether any sent or edited text contains `needle`.
    pub async fn saw_text(&self, needle: &str) -> bool {
        let sent = self.sent.lock().await.iter().any(|m| m.text.contains(needle));
        sent || self.edits.lock().await.iter().any(|e| e.text.contains(needle))
    }

    /// The most recent sent message carrying a keyboard.
    pub async fn last_keyboard(&self) -> Option<SentMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.keyboard.is_some())
            .cloned()
    }

    pub async fn edits(&self) -> Vec<EditedMessage> {
        self.edits.lock().await.clone()
    }

    pub async fn polls(&self) -> Vec<CreatedPoll> {
        self.polls.lock().await.clone()
    }

    pub async fn last_poll(&self) -> Option<CreatedPoll> {
        self.polls.lock().await.last().cloned()
    }

    pub async fn answers(&self) -> Vec<CallbackAnswer> {
        self.answers.lock().await.clone()
    }

    /// Text of the toast shown for `callback_id`, if any.
    pub async fn answer_for(&self, callback_id: &str) -> Option<String> {
        self.answers
            .lock()
            .await
            .iter()
            .rev()
            .find(|a| a.callback_id == callback_id)
            .map(|a| a.text.clone())
    }

    /// Clear every capture buffer.
    pub async fn clear(&self) {
        self.sent.lock().await.clear();
        self.edits.lock().await.clear();
        self.polls.lock().await.clear();
        self.answers.lock().await.clear();
    }

    fn next_message_ref(&self) -> MessageRef {
        MessageRef(self.next_message.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable(what: &str) -> SupperError {
    SupperError::Transport {
        message: format!("mock transport: {what} unavailable"),
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, SupperError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SupperError> {
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_message(
        &self,
        chat: ChannelId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef, SupperError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(unavailable("send"));
        }
        let message = self.next_message_ref();
        self.sent.lock().await.push(SentMessage {
            chat,
            message,
            text: text.to_string(),
            keyboard,
        });
        Ok(message)
    }

    async fn edit_message(
        &self,
        chat: ChannelId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), SupperError> {
        self.edits.lock().await.push(EditedMessage {
            chat,
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn create_poll(
        &self,
        chat: ChannelId,
        question: &str,
        options: &[String],
    ) -> Result<PollRef, SupperError> {
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(unavailable("poll"));
        }
        let poll = PollRef {
            poll_id: format!("poll-{}", self.next_poll.fetch_add(1, Ordering::SeqCst)),
            message: self.next_message_ref(),
        };
        self.polls.lock().await.push(CreatedPoll {
            chat,
            poll: poll.clone(),
            question: question.to_string(),
            options: options.to_vec(),
        });
        Ok(poll)
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), SupperError> {
        self.answers.lock().await.push(CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn member_count(&self, _chat: ChannelId) -> Result<u32, SupperError> {
        (*self.member_count.lock().await).ok_or_else(|| unavailable("member count"))
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, SupperError> {
        Ok(format!("jpeg:{file_id}").into_bytes())
    }
}
