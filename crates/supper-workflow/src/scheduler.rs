// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-triggered workflow tasks: daily starter, daily closer and the
//! cook-volunteer watchdog.
//!
//! Every tick scans all channels. A failure is logged with the channel id and
//! that channel is skipped; the next tick is the retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use supper_core::{ChannelId, SupperError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::messages;
use crate::models::ChannelState;
use crate::orchestrator::{Orchestrator, StartOutcome};
use crate::vote::Tally;

pub struct WorkflowScheduler {
    orchestrator: Arc<Orchestrator>,
}

impl WorkflowScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Spawns the three tick loops and waits until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.orchestrator.settings.tick;
        info!(tick = ?period, "workflow scheduler started");

        let starter = {
            let this = self.clone();
            tokio::spawn(tick_loop("starter", period, cancel.clone(), move || {
                let this = this.clone();
                async move { this.tick_starter(this.now()).await }
            }))
        };
        let closer = {
            let this = self.clone();
            tokio::spawn(tick_loop("closer", period, cancel.clone(), move || {
                let this = this.clone();
                async move { this.tick_closer(this.now()).await }
            }))
        };
        let watchdog = {
            let this = self.clone();
            tokio::spawn(tick_loop("watchdog", period, cancel.clone(), move || {
                let this = this.clone();
                async move { this.tick_watchdog(this.now()).await }
            }))
        };

        for (name, task) in [("starter", starter), ("closer", closer), ("watchdog", watchdog)] {
            if let Err(e) = task.await {
                error!(task = name, error = %e, "scheduler task panicked");
            }
        }
        info!("workflow scheduler stopped");
    }

    fn now(&self) -> DateTime<Utc> {
        self.orchestrator.clock.now()
    }

    async fn snapshots(&self) -> Vec<(ChannelId, ChannelState)> {
        let ids = match self.orchestrator.channels.list().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "failed to list channels");
                return Vec::new();
            }
        };
        let mut out = Vec::with_capacity(ids.len());
        for channel in ids {
            match self.orchestrator.channels.get(channel).await {
                Ok(Some(state)) => out.push((channel, state)),
                Ok(None) => {}
                Err(e) => error!(channel = %channel, error = %e, "failed to read channel state"),
            }
        }
        out
    }

    // --- daily starter ---

    /// Opens a poll in every channel that has not had a workflow today.
    ///
    /// Returns the number of polls opened. Outside the start window this is a no-op.
    pub async fn tick_starter(&self, now: DateTime<Utc>) -> usize {
        if !self.orchestrator.settings.in_start_window(now) {
            return 0;
        }
        let mut opened = 0;
        for (channel, state) in self.snapshots().await {
            match self.is_active_today(&state, now).await {
                Ok(true) => {
                    debug!(channel = %channel, "workflow already ran today");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(channel = %channel, error = %e, "failed to check today's activity");
                    continue;
                }
            }
            info!(channel = %channel, "starting daily dinner workflow");
            match self.orchestrator.start_workflow(channel).await {
                Ok(StartOutcome::PollOpened { .. }) => opened += 1,
                Ok(outcome) => info!(channel = %channel, ?outcome, "daily workflow did not open a poll"),
                Err(e) => error!(channel = %channel, error = %e, "daily workflow failed"),
            }
        }
        opened
    }

    /// Whether the channel is mid-workflow or had a vote or dinner start
    /// during the local calendar day containing `now`.
    pub async fn is_active_today(
        &self,
        state: &ChannelState,
        now: DateTime<Utc>,
    ) -> Result<bool, SupperError> {
        if state.current_vote.is_some() || state.current_dinner.is_some() || state.awaiting_cook.is_some() {
            return Ok(true);
        }
        let (from, to) = self.orchestrator.settings.local_day_bounds(now);
        let channel = state.channel_id;
        if self
            .orchestrator
            .dinners
            .any_started_between(channel, from, to)
            .await?
        {
            return Ok(true);
        }
        self.orchestrator
            .votes
            .any_started_between(channel, from, to)
            .await
    }

    // --- daily closer ---

    /// Force-ends open votes, finishes dinners and drops pending cook requests.
    ///
    /// Returns the number of channels where anything was closed.
    pub async fn tick_closer(&self, now: DateTime<Utc>) -> usize {
        if !self.orchestrator.settings.in_end_window(now) {
            return 0;
        }
        let mut closed = 0;
        for (channel, state) in self.snapshots().await {
            if state.is_idle() {
                continue;
            }
            match self.close_channel(channel).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => error!(channel = %channel, error = %e, "failed to close workflow"),
            }
        }
        closed
    }

    #[instrument(skip_all, fields(channel = %channel))]
    async fn close_channel(&self, channel: ChannelId) -> Result<bool, SupperError> {
        let orch = &self.orchestrator;
        let _guard = orch.locks.lock(channel).await;
        // Re-read under the lock; the snapshot may be stale.
        let Some(state) = orch.channels.get(channel).await? else {
            return Ok(false);
        };
        let mut closed = false;

        if let Some(poll_id) = state.current_vote.as_deref() {
            match orch.votes.get(channel, poll_id).await {
                Ok(vote) if !vote.is_ended() => {
                    let winner = Tally::of(&vote).winner;
                    orch.votes.end_vote(channel, poll_id, winner.clone()).await?;
                    info!(poll_id, "vote closed by daily closer");
                    orch.notify(channel, messages::POLL_CLOSED_LATE).await;
                    match winner {
                        Some(dish) => orch.notify(channel, &messages::winning_dish(&dish)).await,
                        None => orch.notify(channel, messages::NOBODY_VOTED).await,
                    }
                    closed = true;
                }
                Ok(_) => {
                    clear_vote_pointer(orch, channel, poll_id).await?;
                }
                Err(SupperError::NotFound { .. }) => {
                    warn!(poll_id, "current vote record is missing, clearing pointer");
                    clear_vote_pointer(orch, channel, poll_id).await?;
                }
                Err(e) => return Err(e),
            }
        }

        if state.current_dinner.is_some() {
            orch.dinners.finish(channel).await?;
            orch.notify(channel, messages::DINNER_CLOSED_LATE).await;
            closed = true;
        }

        // Any cook request, including one the vote above just produced, ends with the day.
        let dropped = orch
            .channels
            .update(channel, |state| {
                let had = state.awaiting_cook.take().is_some();
                state.volunteer_wait_since = None;
                Ok(had)
            })
            .await?;
        if dropped {
            debug!("pending cook request dropped");
            closed = true;
        }
        Ok(closed)
    }

    // --- cook-volunteer watchdog ---

    /// Advances the volunteer timers; restarts workflows whose grace period ran out.
    ///
    /// Returns the number of restarted workflows.
    pub async fn tick_watchdog(&self, now: DateTime<Utc>) -> usize {
        let mut restarted = 0;
        for (channel, state) in self.snapshots().await {
            let Some(poll_id) = state.awaiting_cook.clone() else {
                continue;
            };
            match self.watch_channel(channel, &poll_id, &state, now).await {
                Ok(true) => restarted += 1,
                Ok(false) => {}
                Err(e) => error!(channel = %channel, poll_id = %poll_id, error = %e, "watchdog failed"),
            }
        }
        restarted
    }

    async fn watch_channel(
        &self,
        channel: ChannelId,
        poll_id: &str,
        state: &ChannelState,
        now: DateTime<Utc>,
    ) -> Result<bool, SupperError> {
        let orch = &self.orchestrator;
        let vote = match orch.votes.get(channel, poll_id).await {
            Ok(vote) => vote,
            Err(SupperError::NotFound { .. }) => {
                warn!(channel = %channel, poll_id, "cook request points at a missing vote, dropping it");
                set_wait(orch, channel, poll_id, None, true).await?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if !vote.cook_volunteers.is_empty() || vote.selected_cook.is_some() {
            if state.volunteer_wait_since.is_some() {
                set_wait(orch, channel, poll_id, None, false).await?;
            }
            return Ok(false);
        }

        match state.volunteer_wait_since {
            None => {
                info!(channel = %channel, poll_id, "waiting for cook volunteers");
                set_wait(orch, channel, poll_id, Some(now), false).await?;
                Ok(false)
            }
            Some(since) if now - since >= orch.settings.volunteer_grace => {
                let outcome = orch.restart_workflow(channel, poll_id).await?;
                Ok(outcome.is_some())
            }
            Some(_) => Ok(false),
        }
    }
}

/// Sets or clears the volunteer timer, but only while `poll_id` is still the
/// pending cook request. `drop_request` also clears the request itself.
async fn set_wait(
    orch: &Orchestrator,
    channel: ChannelId,
    poll_id: &str,
    since: Option<DateTime<Utc>>,
    drop_request: bool,
) -> Result<(), SupperError> {
    orch.channels
        .update(channel, |state| {
            if state.awaiting_cook.as_deref() == Some(poll_id) {
                state.volunteer_wait_since = since;
                if drop_request {
                    state.awaiting_cook = None;
                }
            }
            Ok(())
        })
        .await
}

async fn clear_vote_pointer(
    orch: &Orchestrator,
    channel: ChannelId,
    poll_id: &str,
) -> Result<(), SupperError> {
    orch.channels
        .update(channel, |state| {
            if state.current_vote.as_deref() == Some(poll_id) {
                state.current_vote = None;
            }
            Ok(())
        })
        .await
}

async fn tick_loop<F, Fut>(name: &'static str, period: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = usize>,
{
    let mut interval = tokio::time::interval(period);
    // Skip the first immediate tick.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let count = tick().await;
                if count > 0 {
                    info!(task = name, count, "scheduler tick acted");
                }
            }
            _ = cancel.cancelled() => {
                info!(task = name, "scheduler task shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use supper_core::{
        AdapterType, ChatTransport, Clock, DishInfo, DishSuggestion, HealthStatus, InlineKeyboard,
        LlmClient, MessageRef, PluginAdapter, PollRef,
    };
    use supper_storage::MemoryStore;
    use tracing_test::traced_test;

    use crate::settings::WorkflowSettings;

    const CH: ChannelId = ChannelId(-7);

    /// Collaborators that are never reached by the paths under test.
    struct Offline;

    fn offline() -> SupperError {
        SupperError::Transport {
            message: "offline".into(),
            source: None,
        }
    }

    #[async_trait]
    impl PluginAdapter for Offline {
        fn name(&self) -> &str {
            "offline"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Transport
        }
        async fn health_check(&self) -> Result<HealthStatus, SupperError> {
            Ok(HealthStatus::Unhealthy("offline".into()))
        }
        async fn shutdown(&self) -> Result<(), SupperError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ChatTransport for Offline {
        async fn send_message(&self, _: ChannelId, _: &str, _: Option<InlineKeyboard>) -> Result<MessageRef, SupperError> {
            Err(offline())
        }
        async fn edit_message(&self, _: ChannelId, _: MessageRef, _: &str) -> Result<(), SupperError> {
            Err(offline())
        }
        async fn create_poll(&self, _: ChannelId, _: &str, _: &[String]) -> Result<PollRef, SupperError> {
            Err(offline())
        }
        async fn answer_callback(&self, _: &str, _: &str) -> Result<(), SupperError> {
            Err(offline())
        }
        async fn member_count(&self, _: ChannelId) -> Result<u32, SupperError> {
            Err(offline())
        }
        async fn download_file(&self, _: &str) -> Result<Vec<u8>, SupperError> {
            Err(offline())
        }
    }

    #[async_trait]
    impl LlmClient for Offline {
        async fn suggest_dinner_options(&self, _: &[String], _: &[String], _: usize) -> Result<Vec<DishSuggestion>, SupperError> {
            Err(offline())
        }
        async fn dish_info(&self, _: &str, _: Option<&str>) -> Result<DishInfo, SupperError> {
            Err(offline())
        }
        async fn parse_ingredients(&self, _: &str) -> Result<Vec<String>, SupperError> {
            Err(offline())
        }
        async fn extract_ingredients_from_image(&self, _: &str) -> Result<Vec<String>, SupperError> {
            Err(offline())
        }
    }

    struct Fixed(DateTime<Utc>);

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn closing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 21, 0, 0).unwrap()
    }

    async fn scheduler() -> WorkflowScheduler {
        let settings = WorkflowSettings {
            utc_offset: FixedOffset::east_opt(0),
            ..WorkflowSettings::default()
        };
        let orchestrator = Orchestrator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Offline),
            Arc::new(Offline),
            Arc::new(Fixed(closing_time())),
            settings,
        );
        orchestrator.channels.ensure(CH).await.unwrap();
        WorkflowScheduler::new(Arc::new(orchestrator))
    }

    #[tokio::test]
    #[traced_test]
    async fn watchdog_drops_request_for_missing_vote() {
        let s = scheduler().await;
        s.orchestrator
            .channels
            .update(CH, |state| {
                state.awaiting_cook = Some("ghost".into());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(s.tick_watchdog(closing_time()).await, 0);
        let state = s.orchestrator.channels.get(CH).await.unwrap().unwrap();
        assert_eq!(state.awaiting_cook, None);
        assert!(logs_contain("missing vote"));
    }

    #[tokio::test]
    #[traced_test]
    async fn closer_clears_dangling_vote_pointer() {
        let s = scheduler().await;
        s.orchestrator
            .channels
            .update(CH, |state| {
                state.current_vote = Some("ghost".into());
                Ok(())
            })
            .await
            .unwrap();

        // Nothing was really open, so nothing counts as closed.
        assert_eq!(s.tick_closer(closing_time()).await, 0);
        let state = s.orchestrator.channels.get(CH).await.unwrap().unwrap();
        assert!(state.is_idle());
        assert!(logs_contain("current vote record is missing"));
    }

    #[tokio::test]
    async fn idle_channels_are_left_alone() {
        let s = scheduler().await;
        assert_eq!(s.tick_closer(closing_time()).await, 0);
        assert_eq!(s.tick_watchdog(closing_time()).await, 0);
        // Outside the start window nothing touches the offline collaborators.
        assert_eq!(s.tick_starter(closing_time()).await, 0);
    }
}
