// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Supper integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic,
//! CI-runnable workflow tests without Telegram or OpenAI.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock chat transport capturing messages, edits and polls
//! - [`MockLlm`] - Mock LLM client with queued responses
//! - [`ManualClock`] - Clock that only advances when told to
//! - [`TestHarness`] - Orchestrator, scheduler and handler wired over the mocks

pub mod clock;
pub mod harness;
pub mod mock_llm;
pub mod mock_transport;

pub use clock::ManualClock;
pub use harness::{CHANNEL, TestHarness};
pub use mock_llm::MockLlm;
pub use mock_transport::MockTransport;
