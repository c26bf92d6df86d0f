// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily starter, daily closer and cook-volunteer watchdog driven by a manual clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use supper_core::DishInfo;
use supper_test_utils::{CHANNEL, TestHarness};
use supper_workflow::messages;

fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
}

async fn harness_at(now: DateTime<Utc>) -> TestHarness {
    let h = TestHarness::builder()
        .with_member_count(4)
        .with_start(now)
        .build()
        .await;
    h.orchestrator.channels().ensure(CHANNEL).await.unwrap();
    h.stock_fridge(&["beets", "cabbage", "potatoes"]).await.unwrap();
    h
}

async fn current_poll(h: &TestHarness) -> Option<String> {
    h.orchestrator
        .channels()
        .get(CHANNEL)
        .await
        .unwrap()
        .unwrap()
        .current_vote
}

/// Opens a poll through the starter and closes it by quorum on "Borscht".
async fn vote_borscht(h: &TestHarness) -> String {
    h.llm.push_suggestions(&["Borscht", "Pelmeni"]).await;
    h.clock.set(at(14, 15, 0));
    assert_eq!(h.scheduler.tick_starter(at(14, 15, 0)).await, 1);
    let poll = current_poll(h).await.unwrap();
    h.ballot(&poll, 1, Some(0)).await.unwrap();
    h.ballot(&poll, 2, Some(0)).await.unwrap();
    poll
}

#[tokio::test]
async fn starter_opens_one_poll_per_day_inside_the_window() {
    let h = harness_at(at(14, 14, 59)).await;
    h.llm.push_suggestions(&["Borscht", "Pelmeni"]).await;

    assert_eq!(h.scheduler.tick_starter(at(14, 14, 59)).await, 0);
    assert_eq!(h.scheduler.tick_starter(at(14, 15, 5)).await, 0);
    assert!(h.transport.polls().await.is_empty());

    assert_eq!(h.scheduler.tick_starter(at(14, 15, 0)).await, 1);
    assert!(h.transport.saw_text(messages::DINNER_TIME).await);
    let poll = current_poll(&h).await.unwrap();

    // Still inside the window: the open vote blocks a second start.
    assert_eq!(h.scheduler.tick_starter(at(14, 15, 1)).await, 0);

    // Once the day is closed, the vote started today still counts as activity.
    h.scheduler.tick_closer(at(14, 21, 0)).await;
    assert!(h.orchestrator.votes().get(CHANNEL, &poll).await.unwrap().is_ended());
    assert_eq!(h.scheduler.tick_starter(at(14, 15, 3)).await, 0);

    // The next day starts fresh.
    h.llm.push_suggestions(&["Vareniki"]).await;
    h.clock.set(at(15, 15, 0));
    assert_eq!(h.scheduler.tick_starter(at(15, 15, 0)).await, 1);
    assert_eq!(h.transport.polls().await.len(), 2);
}

#[tokio::test]
async fn closer_ends_open_vote_with_current_leader() {
    let h = harness_at(at(14, 15, 0)).await;
    h.llm.push_suggestions(&["Borscht", "Pelmeni"]).await;
    h.scheduler.tick_starter(at(14, 15, 0)).await;
    let poll = current_poll(&h).await.unwrap();

    // One ballot of three: no quorum.
    h.ballot(&poll, 3, Some(1)).await.unwrap();

    assert_eq!(h.scheduler.tick_closer(at(14, 20, 59)).await, 0);
    assert_eq!(h.scheduler.tick_closer(at(14, 21, 0)).await, 1);

    let vote = h.orchestrator.votes().get(CHANNEL, &poll).await.unwrap();
    assert_eq!(vote.winning_option.as_deref(), Some("Pelmeni"));
    assert!(h.transport.saw_text(messages::POLL_CLOSED_LATE).await);
    assert!(h.transport.saw_text("The winning dish is *Pelmeni*").await);

    let state = h.orchestrator.channels().get(CHANNEL).await.unwrap().unwrap();
    assert!(state.is_idle());

    // Nothing left to close.
    assert_eq!(h.scheduler.tick_closer(at(14, 21, 1)).await, 0);
}

#[tokio::test]
async fn closer_reports_when_nobody_voted() {
    let h = harness_at(at(14, 15, 0)).await;
    h.llm.push_suggestions(&["Borscht"]).await;
    h.scheduler.tick_starter(at(14, 15, 0)).await;

    assert_eq!(h.scheduler.tick_closer(at(14, 21, 4)).await, 1);
    assert!(h.transport.saw_text(messages::NOBODY_VOTED).await);
}

#[tokio::test]
async fn closer_finishes_the_running_dinner() {
    let h = harness_at(at(14, 15, 0)).await;
    let poll = vote_borscht(&h).await;
    h.llm
        .push_dish_info(DishInfo {
            name: "Borscht".into(),
            ..DishInfo::default()
        })
        .await;
    h.press(1, &format!("volunteer:{poll}")).await.unwrap();
    let dinner_id = h
        .orchestrator
        .channels()
        .get(CHANNEL)
        .await
        .unwrap()
        .unwrap()
        .current_dinner
        .unwrap();

    assert_eq!(h.scheduler.tick_closer(at(14, 21, 0)).await, 1);
    assert!(h.transport.saw_text(messages::DINNER_CLOSED_LATE).await);
    let dinner = h.orchestrator.dinners().get(&dinner_id).await.unwrap();
    assert!(dinner.is_finished());

    // The cook's button no longer applies.
    let cb = h.press(1, &format!("dinner_ready:{dinner_id}")).await.unwrap();
    assert_eq!(
        h.transport.answer_for(&cb).await.as_deref(),
        Some(messages::EXPIRED_BUTTON)
    );
}

#[tokio::test]
async fn watchdog_restarts_after_fifteen_quiet_minutes() {
    let h = harness_at(at(14, 15, 0)).await;
    let first = vote_borscht(&h).await;

    h.clock.set(at(14, 15, 2));
    assert_eq!(h.scheduler.tick_watchdog(at(14, 15, 2)).await, 0);
    let state = h.orchestrator.channels().get(CHANNEL).await.unwrap().unwrap();
    assert_eq!(state.volunteer_wait_since, Some(at(14, 15, 2)));

    assert_eq!(h.scheduler.tick_watchdog(at(14, 15, 16)).await, 0);
    assert!(!h.transport.saw_text(messages::NO_VOLUNTEER).await);

    h.llm.push_suggestions(&["Golubtsi", "Pelmeni"]).await;
    h.clock.set(at(14, 15, 17));
    assert_eq!(h.scheduler.tick_watchdog(at(14, 15, 17)).await, 1);
    assert!(h.transport.saw_text(messages::NO_VOLUNTEER).await);

    let second = current_poll(&h).await.unwrap();
    assert_ne!(second, first);
    assert_eq!(h.transport.polls().await.len(), 2);
    let state = h.orchestrator.channels().get(CHANNEL).await.unwrap().unwrap();
    assert_eq!(state.awaiting_cook, None);
    assert_eq!(state.volunteer_wait_since, None);

    // The abandoned request's button is dead.
    let cb = h.press(1, &format!("volunteer:{first}")).await.unwrap();
    assert_eq!(
        h.transport.answer_for(&cb).await.as_deref(),
        Some(messages::EXPIRED_BUTTON)
    );
    assert_eq!(current_poll(&h).await.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn volunteer_stops_the_watchdog() {
    let h = harness_at(at(14, 15, 0)).await;
    let poll = vote_borscht(&h).await;
    h.scheduler.tick_watchdog(at(14, 15, 1)).await;

    h.llm.fail_dish_info().await;
    h.press(2, &format!("volunteer:{poll}")).await.unwrap();

    assert_eq!(h.scheduler.tick_watchdog(at(14, 15, 40)).await, 0);
    assert!(!h.transport.saw_text(messages::NO_VOLUNTEER).await);
    let state = h.orchestrator.channels().get(CHANNEL).await.unwrap().unwrap();
    assert_eq!(state.volunteer_wait_since, None);
    assert!(state.current_dinner.is_some());
}

#[tokio::test]
async fn wait_timer_survives_a_restart() {
    // The timer lives in the channel record, so a fresh scheduler over the
    // same state still sees how long the request has been waiting.
    let h = harness_at(at(14, 15, 0)).await;
    vote_borscht(&h).await;
    h.scheduler.tick_watchdog(at(14, 15, 1)).await;

    let fresh = supper_workflow::WorkflowScheduler::new(h.orchestrator.clone());
    h.llm.push_suggestions(&["Golubtsi"]).await;
    assert_eq!(fresh.tick_watchdog(at(14, 15, 16)).await, 1);
}

#[tokio::test]
async fn restart_ignores_a_request_that_moved_on() {
    let h = harness_at(at(14, 15, 0)).await;
    let poll = vote_borscht(&h).await;
    assert_eq!(
        h.orchestrator.restart_workflow(CHANNEL, "poll-other").await.unwrap(),
        None
    );
    let state = h.orchestrator.channels().get(CHANNEL).await.unwrap().unwrap();
    assert_eq!(state.awaiting_cook.as_deref(), Some(poll.as_str()));
}

#[tokio::test]
async fn custom_grace_period_is_honoured() {
    let h = TestHarness::builder()
        .with_member_count(4)
        .with_start(at(14, 15, 0))
        .with_settings(|s| s.volunteer_grace = Duration::minutes(5))
        .build()
        .await;
    h.stock_fridge(&["beets"]).await.unwrap();
    h.orchestrator.channels().ensure(CHANNEL).await.unwrap();
    vote_borscht(&h).await;

    h.scheduler.tick_watchdog(at(14, 15, 1)).await;
    h.llm.push_suggestions(&["Golubtsi"]).await;
    assert_eq!(h.scheduler.tick_watchdog(at(14, 15, 6)).await, 1);
}
