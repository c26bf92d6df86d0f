// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral per-chat UI state with a sliding idle window.
//!
//! Nothing here is persisted; a restart starts every chat in
//! [`ChatMode::Normal`]. Expiry is lazy: an entry older than the idle window
//! is evicted by whichever access finds it, there is no background sweep.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use strum::{Display, EnumString};
use supper_core::{ChannelId, Clock};
use tracing::debug;

/// What the next plain message in a chat is interpreted as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Normal,
    AwaitingIngredients,
    AwaitingPhotos,
    AwaitingSuggestion,
}

#[derive(Debug, Clone)]
struct ChatSession {
    mode: ChatMode,
    data: HashMap<String, String>,
    updated_at: DateTime<Utc>,
}

impl ChatSession {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            mode: ChatMode::Normal,
            data: HashMap::new(),
            updated_at: now,
        }
    }
}

pub struct ChatSessionManager {
    sessions: DashMap<ChannelId, ChatSession>,
    idle: Duration,
    clock: Arc<dyn Clock>,
}

impl ChatSessionManager {
    pub fn new(idle: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            idle,
            clock,
        }
    }

    pub fn set_mode(&self, chat: ChannelId, mode: ChatMode) {
        self.write(chat, |session| session.mode = mode);
        debug!(chat = %chat, mode = %mode, "chat mode set");
    }

    /// Current mode; [`ChatMode::Normal`] when absent or expired.
    pub fn mode(&self, chat: ChannelId) -> ChatMode {
        self.read(chat, |session| session.mode).unwrap_or_default()
    }

    pub fn set_data(&self, chat: ChannelId, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.write(chat, |session| {
            session.data.insert(key.to_string(), value);
        });
    }

    pub fn data(&self, chat: ChannelId, key: &str) -> Option<String> {
        self.read(chat, |session| session.data.get(key).cloned())
            .flatten()
    }

    pub fn clear_data(&self, chat: ChannelId) {
        self.write(chat, |session| session.data.clear());
    }

    /// Drops the chat's session entirely.
    pub fn clear(&self, chat: ChannelId) {
        self.sessions.remove(&chat);
    }

    /// Live (unexpired or not yet observed as expired) entries.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_expired(&self, session: &ChatSession, now: DateTime<Utc>) -> bool {
        now - session.updated_at > self.idle
    }

    fn read<R>(&self, chat: ChannelId, f: impl FnOnce(&ChatSession) -> R) -> Option<R> {
        let now = self.clock.now();
        // remove_if takes the shard write lock, so no read guard may be alive here.
        if self
            .sessions
            .remove_if(&chat, |_, session| self.is_expired(session, now))
            .is_some()
        {
            debug!(chat = %chat, "chat session expired");
            return None;
        }
        self.sessions.get(&chat).map(|session| f(&session))
    }

    fn write(&self, chat: ChannelId, f: impl FnOnce(&mut ChatSession)) {
        let now = self.clock.now();
        let mut entry = self.sessions.entry(chat).or_insert_with(|| ChatSession::new(now));
        if self.is_expired(&entry, now) {
            *entry = ChatSession::new(now);
        }
        f(&mut entry);
        entry.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Mutex;

    struct TestClock(Mutex<DateTime<Utc>>);

    impl TestClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn manager() -> (ChatSessionManager, Arc<TestClock>) {
        let clock = Arc::new(TestClock(Mutex::new(DateTime::<Utc>::UNIX_EPOCH)));
        (
            ChatSessionManager::new(Duration::minutes(10), clock.clone()),
            clock,
        )
    }

    #[test]
    fn mode_expires_after_idle_window() {
        let (sessions, clock) = manager();
        let chat = ChannelId(-7);
        sessions.set_mode(chat, ChatMode::AwaitingIngredients);

        clock.advance(Duration::minutes(9));
        assert_eq!(sessions.mode(chat), ChatMode::AwaitingIngredients);

        // The read at T+9 does not refresh the window.
        clock.advance(Duration::minutes(2));
        assert_eq!(sessions.mode(chat), ChatMode::Normal);
        assert!(sessions.is_empty());
    }

    #[test]
    fn writes_refresh_the_window() {
        let (sessions, clock) = manager();
        let chat = ChannelId(1);
        sessions.set_mode(chat, ChatMode::AwaitingPhotos);
        clock.advance(Duration::minutes(8));
        sessions.set_data(chat, "draft", "eggs");
        clock.advance(Duration::minutes(8));
        assert_eq!(sessions.mode(chat), ChatMode::AwaitingPhotos);
        assert_eq!(sessions.data(chat, "draft").as_deref(), Some("eggs"));
    }

    #[test]
    fn set_data_creates_normal_entry() {
        let (sessions, _) = manager();
        let chat = ChannelId(2);
        sessions.set_data(chat, "k", "v");
        assert_eq!(sessions.mode(chat), ChatMode::Normal);
        assert_eq!(sessions.len(), 1);
        sessions.clear_data(chat);
        assert_eq!(sessions.data(chat, "k"), None);
    }

    #[test]
    fn write_after_expiry_starts_fresh() {
        let (sessions, clock) = manager();
        let chat = ChannelId(3);
        sessions.set_mode(chat, ChatMode::AwaitingSuggestion);
        sessions.set_data(chat, "old", "x");
        clock.advance(Duration::minutes(11));
        sessions.set_data(chat, "new", "y");
        assert_eq!(sessions.mode(chat), ChatMode::Normal);
        assert_eq!(sessions.data(chat, "old"), None);
    }

    #[test]
    fn mode_names_are_snake_case() {
        assert_eq!(ChatMode::AwaitingIngredients.to_string(), "awaiting_ingredients");
        assert_eq!(ChatMode::from_str("awaiting_photos").unwrap(), ChatMode::AwaitingPhotos);
    }
}
