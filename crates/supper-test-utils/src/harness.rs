// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end workflow testing.
//!
//! `TestHarness` assembles the orchestrator, scheduler and event handler over
//! an in-memory store, a [`MockTransport`], a [`MockLlm`] and a
//! [`ManualClock`]. Helpers drive the handler with the same events the
//! Telegram poller would produce.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use supper_core::{ChannelId, Clock, InboundEvent, MessageRef, Sender, SupperError, UserId};
use supper_storage::MemoryStore;
use supper_workflow::{EventHandler, Orchestrator, WorkflowScheduler, WorkflowSettings};

use crate::clock::ManualClock;
use crate::mock_llm::MockLlm;
use crate::mock_transport::MockTransport;

/// The chat every harness helper talks to.
pub const CHANNEL: ChannelId = ChannelId(-100_200);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    settings: WorkflowSettings,
    start: DateTime<Utc>,
    member_count: Option<u32>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: WorkflowSettings {
                utc_offset: FixedOffset::east_opt(0),
                ..WorkflowSettings::default()
            },
            start: Utc
                .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            member_count: None,
        }
    }

    /// Adjust the workflow settings. Local time is UTC unless changed here.
    pub fn with_settings(mut self, f: impl FnOnce(&mut WorkflowSettings)) -> Self {
        f(&mut self.settings);
        self
    }

    /// Start the manual clock at `start`.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Chat members as the transport reports them, bot included.
    pub fn with_member_count(mut self, total: u32) -> Self {
        self.member_count = Some(total);
        self
    }

    pub async fn build(self) -> TestHarness {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(MockTransport::new());
        transport.set_member_count(self.member_count).await;
        let llm = Arc::new(MockLlm::new());
        let clock = Arc::new(ManualClock::new(self.start));

        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            transport.clone(),
            llm.clone(),
            clock.clone(),
            self.settings,
        ));

        TestHarness {
            scheduler: WorkflowScheduler::new(orchestrator.clone()),
            handler: EventHandler::new(orchestrator.clone()),
            orchestrator,
            store,
            transport,
            llm,
            clock,
            next_id: AtomicI64::new(1),
        }
    }
}

/// A complete workflow environment with mock collaborators.
pub struct TestHarness {
    pub orchestrator: Arc<Orchestrator>,
    pub scheduler: WorkflowScheduler,
    pub handler: EventHandler,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<MockTransport>,
    pub llm: Arc<MockLlm>,
    pub clock: Arc<ManualClock>,
    next_id: AtomicI64,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// A channel member whose username is `user{id}`.
    pub fn sender(id: i64) -> Sender {
        Sender {
            id: UserId(id),
            username: Some(format!("user{id}")),
            first_name: format!("User {id}"),
        }
    }

    /// Put `names` into the channel's fridge.
    pub async fn stock_fridge(&self, names: &[&str]) -> Result<(), SupperError> {
        let names: Vec<String> = names.iter().map(|n| (*n).to_string()).collect();
        self.orchestrator.fridge().add(CHANNEL, &names).await?;
        Ok(())
    }

    /// Send a text message (or command) from `user`.
    pub async fn say(&self, user: i64, text: &str) -> Result<(), SupperError> {
        self.handler
            .handle(InboundEvent::Message {
                chat: CHANNEL,
                message: MessageRef(10_000 + self.next_id()),
                from: Self::sender(user),
                text: Some(text.to_string()),
                photo_file_id: None,
            })
            .await
    }

    /// Send a photo from `user`, optionally captioned.
    pub async fn photo(&self, user: i64, caption: Option<&str>) -> Result<(), SupperError> {
        self.handler
            .handle(InboundEvent::Message {
                chat: CHANNEL,
                message: MessageRef(10_000 + self.next_id()),
                from: Self::sender(user),
                text: caption.map(str::to_string),
                photo_file_id: Some(format!("file-{}", self.next_id())),
            })
            .await
    }

    /// Cast (or with `None`, retract) `user`'s ballot.
    pub async fn ballot(&self, poll_id: &str, user: i64, option: Option<u32>) -> Result<(), SupperError> {
        self.handler
            .handle(InboundEvent::PollAnswer {
                poll_id: poll_id.to_string(),
                user: Self::sender(user),
                option_ids: option.into_iter().collect(),
            })
            .await
    }

    /// Press the inline button carrying `data` as `user`.
    ///
    /// The press is attributed to the newest sent message showing that
    /// button. Returns the callback id so the toast can be inspected.
    pub async fn press(&self, user: i64, data: &str) -> Result<String, SupperError> {
        self.press_in(CHANNEL, user, data).await
    }

    /// Like [`TestHarness::press`], but from another chat.
    pub async fn press_in(
        &self,
        chat: ChannelId,
        user: i64,
        data: &str,
    ) -> Result<String, SupperError> {
        let shown = self
            .transport
            .sent_messages()
            .await
            .into_iter()
            .rev()
            .find(|m| {
                m.keyboard
                    .as_ref()
                    .is_some_and(|kb| kb.callback_data().any(|d| d == data))
            });
        let (message, message_text) = match shown {
            Some(m) => (m.message, Some(m.text)),
            None => (MessageRef(0), None),
        };
        let id = format!("cb-{}", self.next_id());
        self.handler
            .handle(InboundEvent::Callback {
                id: id.clone(),
                chat,
                message,
                message_text,
                from: Self::sender(user),
                data: data.to_string(),
            })
            .await?;
        Ok(id)
    }

    /// Runs the starter, closer and watchdog once at the current clock time.
    pub async fn tick(&self) -> (usize, usize, usize) {
        let now = self.clock.now();
        (
            self.scheduler.tick_starter(now).await,
            self.scheduler.tick_closer(now).await,
            self.scheduler.tick_watchdog(now).await,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().with_member_count(4).build().await;
        assert!(harness.store.is_empty().await);
        harness.say(1, "/start").await.unwrap();
        assert!(harness.transport.saw_text("Welcome").await);
    }

    #[tokio::test]
    async fn harnesses_are_isolated() {
        let h1 = TestHarness::builder().build().await;
        let h2 = TestHarness::builder().build().await;
        h1.stock_fridge(&["eggs"]).await.unwrap();
        assert_eq!(h1.orchestrator.fridge().list(CHANNEL).await.unwrap().len(), 1);
        assert!(h2.orchestrator.fridge().list(CHANNEL).await.unwrap().is_empty());
    }
}
