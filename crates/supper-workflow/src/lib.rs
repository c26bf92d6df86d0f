// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dinner workflow orchestration for Supper.
//!
//! Per-channel durable state (votes, dinners, fridge, suggestions) lives in a
//! versioned key-value store and is updated with compare-and-swap. On top of
//! that sit the time-triggered [`WorkflowScheduler`] and the inbound
//! [`EventHandler`]; both drive the same [`Orchestrator`].

pub mod callbacks;
pub mod channel;
pub mod dinner;
pub mod fridge;
pub mod handlers;
pub mod keys;
pub mod locks;
pub mod messages;
pub mod models;
pub mod orchestrator;
pub mod repo;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod suggestions;
pub mod vote;

pub use callbacks::CallbackAction;
pub use channel::ChannelService;
pub use dinner::DinnerService;
pub use fridge::{FridgeService, compare_ingredients};
pub use handlers::EventHandler;
pub use locks::ChannelLocks;
pub use models::{ChannelState, DinnerRecord, Dish, Fridge, Ingredient, UserSuggestion, VoteState};
pub use orchestrator::{Orchestrator, StartOutcome};
pub use repo::Repository;
pub use scheduler::WorkflowScheduler;
pub use session::{ChatMode, ChatSessionManager};
pub use settings::WorkflowSettings;
pub use suggestions::SuggestionService;
pub use vote::{Quorum, QuorumCheck, Tally, VoteEngine};
