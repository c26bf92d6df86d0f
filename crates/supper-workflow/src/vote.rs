// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable poll lifecycle: ballots, tally, quorum, end and cook volunteers.
//!
//! A vote is written before the channel pointer that references it, so a crash
//! between the two writes leaves an unreferenced vote behind rather than a
//! dangling pointer. Such orphans are harmless: nothing scans for open votes
//! except through the channel snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use supper_core::{ChannelId, Clock, MessageRef, SupperError, UserId};
use tracing::{debug, info, warn};

use crate::channel::ChannelService;
use crate::keys;
use crate::models::VoteState;
use crate::repo::Repository;

/// Fraction of channel members whose ballots close a vote early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quorum {
    pub numerator: u32,
    pub denominator: u32,
}

impl Quorum {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `max(1, ceil(members * numerator / denominator))`, in integers.
    pub fn threshold(&self, members: u32) -> usize {
        let denominator = u64::from(self.denominator.max(1));
        let scaled = u64::from(members) * u64::from(self.numerator);
        let threshold = scaled.div_ceil(denominator).max(1);
        usize::try_from(threshold).unwrap_or(usize::MAX)
    }

    pub fn is_reached(&self, ballots: usize, members: u32) -> bool {
        ballots >= self.threshold(members)
    }
}

/// Ballot counts per option, in declared option order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub counts: Vec<(String, usize)>,
    /// Option with the strictly greatest count; ties go to the earliest option.
    /// `None` when nobody voted.
    pub winner: Option<String>,
}

impl Tally {
    pub fn of(vote: &VoteState) -> Self {
        let mut per_option: BTreeMap<&str, usize> = BTreeMap::new();
        for choice in vote.votes.values() {
            *per_option.entry(choice.as_str()).or_default() += 1;
        }

        let counts: Vec<(String, usize)> = vote
            .options
            .iter()
            .map(|option| (option.clone(), per_option.get(option.as_str()).copied().unwrap_or(0)))
            .collect();

        let mut winner: Option<(&str, usize)> = None;
        for (option, count) in &counts {
            if *count > winner.map_or(0, |(_, best)| best) {
                winner = Some((option.as_str(), *count));
            }
        }

        Self {
            winner: winner.map(|(option, _)| option.to_string()),
            counts,
        }
    }

    pub fn count(&self, option: &str) -> usize {
        self.counts
            .iter()
            .find(|(o, _)| o == option)
            .map_or(0, |(_, n)| *n)
    }
}

/// Result of [`VoteEngine::check_quorum`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumCheck {
    pub reached: bool,
    pub winner: Option<String>,
}

#[derive(Clone)]
pub struct VoteEngine {
    repo: Repository,
    channels: ChannelService,
    clock: Arc<dyn Clock>,
}

impl VoteEngine {
    pub fn new(repo: Repository, channels: ChannelService, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            channels,
            clock,
        }
    }

    pub async fn get(&self, channel: ChannelId, poll_id: &str) -> Result<VoteState, SupperError> {
        self.repo.require(&keys::vote(channel, poll_id)).await
    }

    /// Opens a vote and publishes it as the channel's current vote.
    ///
    /// Rejected while the channel already has an open vote; callers that want
    /// to replace one must end or clear it first.
    pub async fn create_vote(
        &self,
        channel: ChannelId,
        poll_id: &str,
        message_ref: MessageRef,
        options: Vec<String>,
    ) -> Result<VoteState, SupperError> {
        if options.is_empty() {
            return Err(SupperError::InvalidInput(
                "a vote needs at least one option".into(),
            ));
        }
        if let Some(existing) = self
            .channels
            .get(channel)
            .await?
            .and_then(|state| state.current_vote)
        {
            return Err(active_vote_error(channel, &existing));
        }

        let vote = VoteState {
            channel_id: channel,
            poll_id: poll_id.to_string(),
            message_ref,
            options,
            votes: BTreeMap::new(),
            started_at: self.clock.now(),
            ended_at: None,
            winning_option: None,
            cook_volunteers: Vec::new(),
            selected_cook: None,
        };
        self.repo
            .insert(&keys::vote(channel, poll_id), &vote)
            .await
            .map_err(|e| match e {
                SupperError::Conflict { .. } => {
                    SupperError::PreconditionFailed(format!("poll {poll_id} already exists"))
                }
                other => other,
            })?;

        if let Err(e) = self
            .repo
            .put(&keys::poll_index(poll_id), &channel)
            .await
        {
            // The scan fallback in resolve_channel_for_poll heals this later.
            warn!(channel = %channel, poll_id, error = %e, "failed to index poll");
        }

        self.channels
            .update(channel, |state| {
                if let Some(existing) = state.current_vote.as_deref()
                    && existing != poll_id
                {
                    return Err(active_vote_error(channel, existing));
                }
                state.current_vote = Some(poll_id.to_string());
                state.awaiting_cook = None;
                state.volunteer_wait_since = None;
                Ok(())
            })
            .await?;

        info!(channel = %channel, poll_id, options = vote.options.len(), "vote created");
        Ok(vote)
    }

    /// Records `user`'s ballot, replacing any earlier one.
    pub async fn record_vote(
        &self,
        channel: ChannelId,
        poll_id: &str,
        user: UserId,
        option: &str,
    ) -> Result<VoteState, SupperError> {
        let vote = self
            .repo
            .update(&keys::vote(channel, poll_id), |vote: &mut VoteState| {
                if vote.is_ended() {
                    return Err(SupperError::PreconditionFailed(
                        "vote has already ended".into(),
                    ));
                }
                if !vote.options.iter().any(|o| o == option) {
                    return Err(SupperError::InvalidInput(format!("invalid option: {option}")));
                }
                vote.votes.insert(user, option.to_string());
                Ok(vote.clone())
            })
            .await?;
        debug!(channel = %channel, poll_id, user = %user, option, "ballot recorded");
        Ok(vote)
    }

    /// Removes `user`'s ballot (a retracted poll answer).
    pub async fn retract_vote(
        &self,
        channel: ChannelId,
        poll_id: &str,
        user: UserId,
    ) -> Result<VoteState, SupperError> {
        self.repo
            .update(&keys::vote(channel, poll_id), |vote: &mut VoteState| {
                if vote.is_ended() {
                    return Err(SupperError::PreconditionFailed(
                        "vote has already ended".into(),
                    ));
                }
                vote.votes.remove(&user);
                Ok(vote.clone())
            })
            .await
    }

    pub async fn tally(&self, channel: ChannelId, poll_id: &str) -> Result<Tally, SupperError> {
        Ok(Tally::of(&self.get(channel, poll_id).await?))
    }

    /// Whether enough members have voted to close the vote early.
    ///
    /// An ended vote never reports quorum.
    pub async fn check_quorum(
        &self,
        channel: ChannelId,
        poll_id: &str,
        member_count: u32,
        quorum: Quorum,
    ) -> Result<QuorumCheck, SupperError> {
        let vote = self.get(channel, poll_id).await?;
        if vote.is_ended() || !quorum.is_reached(vote.votes.len(), member_count) {
            return Ok(QuorumCheck {
                reached: false,
                winner: None,
            });
        }
        Ok(QuorumCheck {
            reached: true,
            winner: Tally::of(&vote).winner,
        })
    }

    /// Closes the vote with `winner` and clears the channel's current vote.
    ///
    /// With a winner the channel moves on to waiting for a cook.
    pub async fn end_vote(
        &self,
        channel: ChannelId,
        poll_id: &str,
        winner: Option<String>,
    ) -> Result<VoteState, SupperError> {
        let now = self.clock.now();
        let vote = self
            .repo
            .update(&keys::vote(channel, poll_id), |vote: &mut VoteState| {
                if vote.is_ended() {
                    return Err(SupperError::PreconditionFailed(
                        "vote has already ended".into(),
                    ));
                }
                if let Some(w) = winner.as_deref()
                    && !vote.options.iter().any(|o| o == w)
                {
                    return Err(SupperError::InvalidInput(format!("invalid option: {w}")));
                }
                vote.ended_at = Some(now);
                vote.winning_option = winner.clone();
                Ok(vote.clone())
            })
            .await?;

        self.channels
            .update(channel, |state| {
                if state.current_vote.as_deref() == Some(poll_id) {
                    state.current_vote = None;
                }
                if vote.winning_option.is_some() {
                    state.awaiting_cook = Some(poll_id.to_string());
                    state.volunteer_wait_since = None;
                }
                Ok(())
            })
            .await?;

        info!(
            channel = %channel,
            poll_id,
            winner = vote.winning_option.as_deref().unwrap_or("<none>"),
            ballots = vote.votes.len(),
            "vote ended"
        );
        Ok(vote)
    }

    /// Registers `user` as willing to cook the winning dish. Idempotent.
    ///
    /// Only users who voted for the winner may volunteer, unless nobody voted.
    pub async fn add_cook_volunteer(
        &self,
        channel: ChannelId,
        poll_id: &str,
        user: UserId,
    ) -> Result<VoteState, SupperError> {
        self.repo
            .update(&keys::vote(channel, poll_id), |vote: &mut VoteState| {
                let Some(winner) = vote.winning_option.as_deref() else {
                    return Err(SupperError::PreconditionFailed(
                        "vote has no winning dish yet".into(),
                    ));
                };
                if !vote.votes.is_empty() && vote.votes.get(&user).map(String::as_str) != Some(winner) {
                    return Err(SupperError::PreconditionFailed(
                        "did not vote for winning dish".into(),
                    ));
                }
                if !vote.cook_volunteers.contains(&user) {
                    vote.cook_volunteers.push(user);
                }
                Ok(vote.clone())
            })
            .await
    }

    /// Picks the cook from the volunteers and ends the cook request.
    pub async fn select_cook(
        &self,
        channel: ChannelId,
        poll_id: &str,
        user: UserId,
    ) -> Result<VoteState, SupperError> {
        let vote = self
            .repo
            .update(&keys::vote(channel, poll_id), |vote: &mut VoteState| {
                if !vote.cook_volunteers.contains(&user) {
                    return Err(SupperError::PreconditionFailed(
                        "user is not a volunteer".into(),
                    ));
                }
                match vote.selected_cook {
                    Some(cook) if cook != user => {
                        return Err(SupperError::PreconditionFailed(format!(
                            "cook already selected: {cook}"
                        )));
                    }
                    _ => vote.selected_cook = Some(user),
                }
                Ok(vote.clone())
            })
            .await?;

        self.channels
            .update(channel, |state| {
                if state.awaiting_cook.as_deref() == Some(poll_id) {
                    state.awaiting_cook = None;
                }
                state.volunteer_wait_since = None;
                Ok(())
            })
            .await?;

        info!(channel = %channel, poll_id, cook = %user, "cook selected");
        Ok(vote)
    }

    /// Appends a candidate to an open vote. The external poll is not touched.
    pub async fn add_option(
        &self,
        channel: ChannelId,
        poll_id: &str,
        option: &str,
    ) -> Result<VoteState, SupperError> {
        let option = option.trim();
        if option.is_empty() {
            return Err(SupperError::InvalidInput("option must not be empty".into()));
        }
        self.repo
            .update(&keys::vote(channel, poll_id), |vote: &mut VoteState| {
                if vote.is_ended() {
                    return Err(SupperError::PreconditionFailed(
                        "vote has already ended".into(),
                    ));
                }
                if vote.options.iter().any(|o| o == option) {
                    return Err(SupperError::InvalidInput(format!(
                        "option already exists: {option}"
                    )));
                }
                vote.options.push(option.to_string());
                Ok(vote.clone())
            })
            .await
    }

    /// Finds the channel that owns `poll_id`.
    ///
    /// Consults the persisted index first. On a miss, scans every channel's
    /// current vote and then every stored vote key; a hit rewrites the index.
    pub async fn resolve_channel_for_poll(&self, poll_id: &str) -> Result<ChannelId, SupperError> {
        let index_key = keys::poll_index(poll_id);
        if let Some(channel) = self.repo.get::<ChannelId>(&index_key).await? {
            return Ok(channel);
        }

        debug!(poll_id, "poll index miss, scanning channels");
        let mut found = None;
        for channel in self.channels.list().await? {
            let current = self
                .channels
                .get(channel)
                .await?
                .and_then(|state| state.current_vote);
            if current.as_deref() == Some(poll_id) {
                found = Some(channel);
                break;
            }
        }

        if found.is_none() {
            found = self
                .repo
                .list_keys(keys::VOTE_PREFIX)
                .await?
                .iter()
                .filter_map(|key| keys::parse_vote(key))
                .find(|(_, id)| *id == poll_id)
                .map(|(channel, _)| channel);
        }

        let channel = found.ok_or_else(|| SupperError::not_found("channel for poll", poll_id))?;
        if let Err(e) = self.repo.put(&index_key, &channel).await {
            warn!(poll_id, error = %e, "failed to heal poll index");
        } else {
            info!(channel = %channel, poll_id, "poll index healed");
        }
        Ok(channel)
    }

    /// Whether any of the channel's votes started in `[from, to)`.
    pub async fn any_started_between(
        &self,
        channel: ChannelId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, SupperError> {
        for key in self.repo.list_keys(&keys::channel_votes(channel)).await? {
            if let Some(vote) = self.repo.get::<VoteState>(&key).await?
                && vote.started_at >= from
                && vote.started_at < to
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn active_vote_error(channel: ChannelId, poll_id: &str) -> SupperError {
    SupperError::PreconditionFailed(format!(
        "channel {channel} already has an active vote ({poll_id})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use supper_core::SystemClock;
    use supper_storage::MemoryStore;

    fn engine() -> (VoteEngine, Repository) {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let channels = ChannelService::new(repo.clone(), clock.clone(), vec!["Italian".into()]);
        (VoteEngine::new(repo.clone(), channels, clock), repo)
    }

    const CH: ChannelId = ChannelId(-100);

    fn opts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    async fn open(engine: &VoteEngine, poll: &str, options: &[&str]) {
        engine
            .create_vote(CH, poll, MessageRef(1), opts(options))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn last_vote_wins() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A", "B"]).await;
        engine.record_vote(CH, "p1", UserId(1), "A").await.unwrap();
        engine.record_vote(CH, "p1", UserId(1), "B").await.unwrap();

        let vote = engine.get(CH, "p1").await.unwrap();
        assert_eq!(vote.votes.get(&UserId(1)).map(String::as_str), Some("B"));
        let tally = engine.tally(CH, "p1").await.unwrap();
        assert_eq!(tally.count("A"), 0);
        assert_eq!(tally.count("B"), 1);
    }

    #[tokio::test]
    async fn unknown_option_is_invalid_input() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A"]).await;
        let err = engine
            .record_vote(CH, "p1", UserId(1), "Z")
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::InvalidInput(ref m) if m == "invalid option: Z"));
    }

    #[tokio::test]
    async fn create_requires_options_and_idle_channel() {
        let (engine, _) = engine();
        let err = engine
            .create_vote(CH, "p0", MessageRef(1), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::InvalidInput(_)));

        open(&engine, "p1", &["A"]).await;
        let err = engine
            .create_vote(CH, "p2", MessageRef(2), opts(&["B"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn tie_breaks_to_first_declared_option() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A", "B", "C"]).await;
        engine.record_vote(CH, "p1", UserId(1), "C").await.unwrap();
        engine.record_vote(CH, "p1", UserId(2), "B").await.unwrap();

        let tally = engine.tally(CH, "p1").await.unwrap();
        assert_eq!(
            tally.counts,
            vec![("A".into(), 0), ("B".into(), 1), ("C".into(), 1)]
        );
        assert_eq!(tally.winner.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn no_ballots_means_no_winner() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A", "B"]).await;
        assert_eq!(engine.tally(CH, "p1").await.unwrap().winner, None);
    }

    #[tokio::test]
    async fn end_twice_is_rejected_and_keeps_first_result() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A", "B"]).await;
        let first = engine
            .end_vote(CH, "p1", Some("A".into()))
            .await
            .unwrap();

        let err = engine
            .end_vote(CH, "p1", Some("B".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::PreconditionFailed(_)));

        let stored = engine.get(CH, "p1").await.unwrap();
        assert_eq!(stored.winning_option.as_deref(), Some("A"));
        assert_eq!(stored.ended_at, first.ended_at);
    }

    #[tokio::test]
    async fn end_moves_channel_to_cook_request() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A"]).await;
        engine.end_vote(CH, "p1", Some("A".into())).await.unwrap();

        let state = engine.channels.get(CH).await.unwrap().unwrap();
        assert_eq!(state.current_vote, None);
        assert_eq!(state.awaiting_cook.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn ended_vote_never_reports_quorum() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A"]).await;
        engine.record_vote(CH, "p1", UserId(1), "A").await.unwrap();
        engine.end_vote(CH, "p1", Some("A".into())).await.unwrap();
        let check = engine
            .check_quorum(CH, "p1", 1, Quorum::new(2, 3))
            .await
            .unwrap();
        assert!(!check.reached);
    }

    #[tokio::test]
    async fn two_thirds_of_three_members_needs_two_ballots() {
        let (engine, _) = engine();
        let quorum = Quorum::new(2, 3);
        open(&engine, "p1", &["A", "B"]).await;

        engine.record_vote(CH, "p1", UserId(1), "A").await.unwrap();
        let check = engine.check_quorum(CH, "p1", 3, quorum).await.unwrap();
        assert_eq!(check, QuorumCheck { reached: false, winner: None });

        engine.record_vote(CH, "p1", UserId(2), "A").await.unwrap();
        let check = engine.check_quorum(CH, "p1", 3, quorum).await.unwrap();
        assert_eq!(check, QuorumCheck { reached: true, winner: Some("A".into()) });

        engine.record_vote(CH, "p1", UserId(3), "B").await.unwrap();
        let tally = engine.tally(CH, "p1").await.unwrap();
        assert_eq!(tally.counts, vec![("A".into(), 2), ("B".into(), 1)]);
        assert_eq!(tally.winner.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn volunteer_must_have_voted_for_winner() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A", "B"]).await;
        engine.record_vote(CH, "p1", UserId(1), "A").await.unwrap();
        engine.record_vote(CH, "p1", UserId(2), "B").await.unwrap();
        engine.end_vote(CH, "p1", Some("A".into())).await.unwrap();

        let err = engine
            .add_cook_volunteer(CH, "p1", UserId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SupperError::PreconditionFailed(ref m) if m == "did not vote for winning dish"));

        engine.add_cook_volunteer(CH, "p1", UserId(1)).await.unwrap();
        let vote = engine.add_cook_volunteer(CH, "p1", UserId(1)).await.unwrap();
        assert_eq!(vote.cook_volunteers, vec![UserId(1)]);
    }

    #[tokio::test]
    async fn anyone_may_volunteer_when_nobody_voted() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A"]).await;
        engine.end_vote(CH, "p1", Some("A".into())).await.unwrap();
        let vote = engine.add_cook_volunteer(CH, "p1", UserId(9)).await.unwrap();
        assert_eq!(vote.cook_volunteers, vec![UserId(9)]);
    }

    #[tokio::test]
    async fn select_cook_requires_volunteer() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A"]).await;
        engine.end_vote(CH, "p1", Some("A".into())).await.unwrap();

        let err = engine.select_cook(CH, "p1", UserId(5)).await.unwrap_err();
        assert!(matches!(err, SupperError::PreconditionFailed(ref m) if m == "user is not a volunteer"));

        engine.add_cook_volunteer(CH, "p1", UserId(5)).await.unwrap();
        let vote = engine.select_cook(CH, "p1", UserId(5)).await.unwrap();
        assert_eq!(vote.selected_cook, Some(UserId(5)));
        let state = engine.channels.get(CH).await.unwrap().unwrap();
        assert_eq!(state.awaiting_cook, None);
    }

    #[tokio::test]
    async fn add_option_rejects_duplicates_and_ended_votes() {
        let (engine, _) = engine();
        open(&engine, "p1", &["A"]).await;
        let vote = engine.add_option(CH, "p1", "B").await.unwrap();
        assert_eq!(vote.options, opts(&["A", "B"]));

        let err = engine.add_option(CH, "p1", "A").await.unwrap_err();
        assert!(matches!(err, SupperError::InvalidInput(ref m) if m == "option already exists: A"));

        engine.end_vote(CH, "p1", None).await.unwrap();
        let err = engine.add_option(CH, "p1", "C").await.unwrap_err();
        assert!(matches!(err, SupperError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn resolve_heals_missing_index() {
        let (engine, repo) = engine();
        open(&engine, "p1", &["A"]).await;
        assert_eq!(engine.resolve_channel_for_poll("p1").await.unwrap(), CH);

        repo.delete(&keys::poll_index("p1")).await.unwrap();
        assert_eq!(engine.resolve_channel_for_poll("p1").await.unwrap(), CH);
        assert_eq!(
            repo.get::<ChannelId>(&keys::poll_index("p1")).await.unwrap(),
            Some(CH)
        );
    }

    #[tokio::test]
    async fn resolve_finds_historical_votes() {
        let (engine, repo) = engine();
        open(&engine, "old", &["A"]).await;
        engine.end_vote(CH, "old", None).await.unwrap();
        repo.delete(&keys::poll_index("old")).await.unwrap();

        assert_eq!(engine.resolve_channel_for_poll("old").await.unwrap(), CH);
        let err = engine.resolve_channel_for_poll("nope").await.unwrap_err();
        assert!(matches!(err, SupperError::NotFound { ref key, .. } if key == "nope"));
    }

    #[test]
    fn threshold_examples() {
        let q = Quorum::new(2, 3);
        assert_eq!(q.threshold(3), 2);
        assert_eq!(q.threshold(4), 3);
        assert_eq!(q.threshold(1), 1);
        assert_eq!(q.threshold(0), 1);
    }

    proptest! {
        #[test]
        fn quorum_is_monotonic(members in 0u32..500, num in 1u32..10, extra in 0u32..10, ballots in 0usize..600) {
            let q = Quorum::new(num, num + extra);
            let threshold = q.threshold(members);
            prop_assert!(threshold >= 1);
            prop_assert_eq!(q.is_reached(ballots, members), ballots >= threshold);
            if q.is_reached(ballots, members) {
                prop_assert!(q.is_reached(ballots + 1, members));
            }
        }

        #[test]
        fn tally_winner_has_strict_max_and_lowest_index(choices in proptest::collection::vec(0usize..4, 0..30)) {
            let options = opts(&["A", "B", "C", "D"]);
            let vote = VoteState {
                channel_id: CH,
                poll_id: "p".into(),
                message_ref: MessageRef(1),
                votes: choices
                    .iter()
                    .enumerate()
                    .map(|(user, &choice)| (UserId(user as i64), options[choice].clone()))
                    .collect(),
                options: options.clone(),
                started_at: Utc::now(),
                ended_at: None,
                winning_option: None,
                cook_volunteers: vec![],
                selected_cook: None,
            };
            let tally = Tally::of(&vote);
            let total: usize = tally.counts.iter().map(|(_, n)| n).sum();
            prop_assert_eq!(total, choices.len());
            match tally.winner {
                None => prop_assert!(choices.is_empty()),
                Some(ref w) => {
                    let max = tally.counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
                    let first_max = tally.counts.iter().find(|(_, n)| *n == max).map(|(o, _)| o.clone());
                    prop_assert_eq!(Some(w.clone()), first_max);
                }
            }
        }
    }
}
