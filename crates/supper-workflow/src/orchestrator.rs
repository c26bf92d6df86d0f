// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the workflow services plus the shared "start a dinner poll"
//! sequence used by the daily starter, the watchdog and `/dinner`.

use std::sync::Arc;

use supper_core::{
    ChannelId, ChatTransport, Clock, DishSuggestion, InlineKeyboard, KeyValueStore, LlmClient,
    MessageRef, SupperError, with_timeout,
};
use tracing::{error, info, instrument, warn};

use crate::channel::ChannelService;
use crate::dinner::DinnerService;
use crate::fridge::FridgeService;
use crate::locks::ChannelLocks;
use crate::messages;
use crate::models::UserSuggestion;
use crate::repo::Repository;
use crate::session::ChatSessionManager;
use crate::settings::WorkflowSettings;
use crate::suggestions::SuggestionService;
use crate::vote::VoteEngine;

/// Telegram rejects polls with more options than this.
pub const MAX_POLL_OPTIONS: usize = 10;

/// The LLM always contributes at least this many dishes.
const MIN_AI_SUGGESTIONS: usize = 2;

/// How a workflow start attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A poll is open and tracked.
    PollOpened { poll_id: String },
    /// The channel already has an open vote or an active dinner.
    Busy,
    FridgeUnavailable,
    FridgeEmpty,
    SuggestionsFailed,
    NoSuggestions,
    PollFailed,
}

pub struct Orchestrator {
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: WorkflowSettings,
    pub(crate) channels: ChannelService,
    pub(crate) votes: VoteEngine,
    pub(crate) dinners: DinnerService,
    pub(crate) fridge: FridgeService,
    pub(crate) suggestions: SuggestionService,
    pub(crate) sessions: ChatSessionManager,
    pub(crate) locks: ChannelLocks,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn ChatTransport>,
        llm: Arc<dyn LlmClient>,
        clock: Arc<dyn Clock>,
        settings: WorkflowSettings,
    ) -> Self {
        let repo = Repository::new(store);
        let channels =
            ChannelService::new(repo.clone(), clock.clone(), settings.default_cuisines.clone());
        Self {
            votes: VoteEngine::new(repo.clone(), channels.clone(), clock.clone()),
            dinners: DinnerService::new(repo.clone(), channels.clone(), clock.clone()),
            fridge: FridgeService::new(repo.clone(), clock.clone()),
            suggestions: SuggestionService::new(repo, clock.clone()),
            sessions: ChatSessionManager::new(settings.session_idle, clock.clone()),
            locks: ChannelLocks::new(),
            channels,
            transport,
            llm,
            clock,
            settings,
        }
    }

    pub fn channels(&self) -> &ChannelService {
        &self.channels
    }

    pub fn votes(&self) -> &VoteEngine {
        &self.votes
    }

    pub fn dinners(&self) -> &DinnerService {
        &self.dinners
    }

    pub fn fridge(&self) -> &FridgeService {
        &self.fridge
    }

    pub fn suggestions(&self) -> &SuggestionService {
        &self.suggestions
    }

    pub fn sessions(&self) -> &ChatSessionManager {
        &self.sessions
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    // --- transport helpers ---

    pub(crate) async fn send(&self, channel: ChannelId, text: &str) -> Result<MessageRef, SupperError> {
        with_timeout(
            self.settings.transport_timeout,
            self.transport.send_message(channel, text, None),
        )
        .await
    }

    pub(crate) async fn send_keyboard(
        &self,
        channel: ChannelId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef, SupperError> {
        with_timeout(
            self.settings.transport_timeout,
            self.transport.send_message(channel, text, Some(keyboard)),
        )
        .await
    }

    pub(crate) async fn edit(
        &self,
        channel: ChannelId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), SupperError> {
        with_timeout(
            self.settings.transport_timeout,
            self.transport.edit_message(channel, message, text),
        )
        .await
    }

    /// Sends a message whose delivery nothing depends on; failures are logged.
    pub(crate) async fn notify(&self, channel: ChannelId, text: &str) {
        if let Err(e) = self.send(channel, text).await {
            warn!(channel = %channel, error = %e, "failed to send message");
        }
    }

    pub(crate) async fn notify_keyboard(&self, channel: ChannelId, text: &str, keyboard: InlineKeyboard) {
        if let Err(e) = self.send_keyboard(channel, text, keyboard).await {
            warn!(channel = %channel, error = %e, "failed to send message");
        }
    }

    /// Replaces a progress message, or sends a fresh one when there is none.
    pub(crate) async fn replace(&self, channel: ChannelId, progress: Option<MessageRef>, text: &str) {
        let result = match progress {
            Some(message) => self.edit(channel, message, text).await,
            None => self.send(channel, text).await.map(|_| ()),
        };
        if let Err(e) = result {
            warn!(channel = %channel, error = %e, "failed to update message");
        }
    }

    pub(crate) async fn answer(&self, callback_id: &str, text: &str) {
        let result = with_timeout(
            self.settings.transport_timeout,
            self.transport.answer_callback(callback_id, text),
        )
        .await;
        if let Err(e) = result {
            warn!(callback_id, error = %e, "failed to answer callback");
        }
    }

    pub(crate) async fn member_count(&self, channel: ChannelId) -> Result<u32, SupperError> {
        with_timeout(self.settings.transport_timeout, self.transport.member_count(channel)).await
    }

    pub(crate) async fn llm_call<T, F>(&self, fut: F) -> Result<T, SupperError>
    where
        F: std::future::Future<Output = Result<T, SupperError>>,
    {
        with_timeout(self.settings.llm_timeout, fut).await
    }

    // --- workflow start ---

    /// Runs the full start sequence under the channel lock.
    pub async fn start_workflow(&self, channel: ChannelId) -> Result<StartOutcome, SupperError> {
        let _guard = self.locks.lock(channel).await;
        self.start_workflow_locked(channel).await
    }

    /// Abandons a vote nobody volunteered to cook for and opens a new poll.
    ///
    /// Does nothing unless `poll_id` is still the channel's pending cook request.
    pub async fn restart_workflow(
        &self,
        channel: ChannelId,
        poll_id: &str,
    ) -> Result<Option<StartOutcome>, SupperError> {
        let _guard = self.locks.lock(channel).await;

        let cleared = self
            .channels
            .update(channel, |state| {
                if state.awaiting_cook.as_deref() != Some(poll_id) {
                    return Ok(false);
                }
                state.awaiting_cook = None;
                state.volunteer_wait_since = None;
                Ok(true)
            })
            .await?;
        if !cleared {
            return Ok(None);
        }

        info!(channel = %channel, poll_id, "no cook volunteered, restarting workflow");
        self.notify(channel, messages::NO_VOLUNTEER).await;
        self.start_workflow_locked(channel).await.map(Some)
    }

    #[instrument(skip_all, fields(channel = %channel))]
    pub(crate) async fn start_workflow_locked(
        &self,
        channel: ChannelId,
    ) -> Result<StartOutcome, SupperError> {
        let state = self.channels.ensure(channel).await?;
        if state.current_vote.is_some() || state.current_dinner.is_some() {
            self.notify(channel, messages::ALREADY_PLANNING).await;
            return Ok(StartOutcome::Busy);
        }

        self.notify(channel, messages::DINNER_TIME).await;

        let ingredients = match self.fridge.list(channel).await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "failed to read fridge");
                self.notify(channel, messages::FRIDGE_UNAVAILABLE).await;
                return Ok(StartOutcome::FridgeUnavailable);
            }
        };
        if ingredients.is_empty() {
            self.notify(channel, messages::FRIDGE_EMPTY_FOR_DINNER).await;
            return Ok(StartOutcome::FridgeEmpty);
        }
        let names: Vec<String> = ingredients.into_iter().map(|i| i.name).collect();

        let progress = match self.send(channel, messages::THINKING).await {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, "failed to send progress message");
                None
            }
        };

        let mut user = match self.suggestions.unused(channel).await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to load user suggestions, continuing without them");
                Vec::new()
            }
        };
        let ai_count = ai_suggestion_count(self.settings.suggestion_count, user.len());
        user.truncate(MAX_POLL_OPTIONS.saturating_sub(ai_count));

        let ai = match self
            .llm_call(
                self.llm
                    .suggest_dinner_options(&names, &state.cuisines, ai_count),
            )
            .await
        {
            Ok(list) => list,
            Err(e) if !user.is_empty() => {
                warn!(error = %e, "dish suggestions failed, using member suggestions only");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "dish suggestions failed");
                self.replace(channel, progress, messages::SUGGESTIONS_FAILED).await;
                return Ok(StartOutcome::SuggestionsFailed);
            }
        };

        let (user, ai) = merge_candidates(user, ai);
        if user.is_empty() && ai.is_empty() {
            self.replace(channel, progress, messages::NO_SUGGESTIONS).await;
            return Ok(StartOutcome::NoSuggestions);
        }

        self.replace(channel, progress, &messages::suggestion_list(&user, &ai))
            .await;

        let options: Vec<String> = user
            .iter()
            .map(|s| s.name.clone())
            .chain(ai.iter().map(|s| s.name.clone()))
            .collect();

        let poll = match with_timeout(
            self.settings.transport_timeout,
            self.transport
                .create_poll(channel, messages::POLL_QUESTION, &options),
        )
        .await
        {
            Ok(poll) => poll,
            Err(e) => {
                error!(error = %e, "failed to create poll");
                self.notify(channel, messages::POLL_FAILED).await;
                return Ok(StartOutcome::PollFailed);
            }
        };

        self.votes
            .create_vote(channel, &poll.poll_id, poll.message, options)
            .await?;

        for suggestion in &user {
            if let Err(e) = self.suggestions.mark_used(&suggestion.id).await {
                warn!(suggestion = %suggestion.id, error = %e, "failed to mark suggestion used");
            }
        }

        self.notify(channel, &messages::vote_instructions(self.settings.quorum))
            .await;
        info!(poll_id = %poll.poll_id, "dinner poll opened");
        Ok(StartOutcome::PollOpened {
            poll_id: poll.poll_id,
        })
    }
}

/// LLM dishes to request: the configured count minus member suggestions, but
/// never fewer than [`MIN_AI_SUGGESTIONS`].
pub fn ai_suggestion_count(total: usize, user_suggestions: usize) -> usize {
    if user_suggestions == 0 {
        return total.max(1);
    }
    total.saturating_sub(user_suggestions).max(MIN_AI_SUGGESTIONS)
}

/// Drops nameless dishes and repeats (case-insensitive, member dishes win)
/// and caps the total at [`MAX_POLL_OPTIONS`].
fn merge_candidates(
    user: Vec<UserSuggestion>,
    ai: Vec<DishSuggestion>,
) -> (Vec<UserSuggestion>, Vec<DishSuggestion>) {
    let mut seen: Vec<String> = Vec::new();
    let mut keep = |name: &str| {
        let key = name.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) || seen.len() >= MAX_POLL_OPTIONS {
            return false;
        }
        seen.push(key);
        true
    };
    let user: Vec<UserSuggestion> = user.into_iter().filter(|s| keep(&s.name)).collect();
    let ai: Vec<DishSuggestion> = ai.into_iter().filter(|s| keep(&s.name)).collect();
    (user, ai)
}
