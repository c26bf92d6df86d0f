// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Supper dinner orchestrator.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Supper configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupperConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// OpenAI-compatible language model settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scheduling, quorum and session settings.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in the welcome message.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "Supper".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Deadline for every outbound Bot API call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// OpenAI-compatible chat completions configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. Required by `serve`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, without the `/chat/completions` suffix.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model name sent with each request.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Deadline for each completion call.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_openai_model(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("supper").join("supper.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "supper.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Dinner workflow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Cuisines assigned to newly registered channels.
    #[serde(default = "default_cuisines")]
    pub cuisines: Vec<String>,

    /// Local hour at which the daily poll starts.
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// Local hour at which open polls and dinners are closed.
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Width of the start and end windows, in minutes past the hour.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,

    /// Cadence of every scheduler task.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Minutes to wait for a cook volunteer before restarting the poll.
    #[serde(default = "default_volunteer_grace_mins")]
    pub volunteer_grace_mins: u32,

    /// Quorum fraction numerator.
    #[serde(default = "default_quorum_numerator")]
    pub quorum_numerator: u32,

    /// Quorum fraction denominator.
    #[serde(default = "default_quorum_denominator")]
    pub quorum_denominator: u32,

    /// Idle minutes after which a chat session reverts to normal mode.
    #[serde(default = "default_session_idle_mins")]
    pub session_idle_mins: u32,

    /// Member count assumed when the platform cannot report one.
    #[serde(default = "default_member_count")]
    pub default_member_count: u32,

    /// Total dishes offered in each poll.
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,

    /// Fixed UTC offset for the daily windows. Unset uses the host's local time.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            cuisines: default_cuisines(),
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            window_minutes: default_window_minutes(),
            tick_secs: default_tick_secs(),
            volunteer_grace_mins: default_volunteer_grace_mins(),
            quorum_numerator: default_quorum_numerator(),
            quorum_denominator: default_quorum_denominator(),
            session_idle_mins: default_session_idle_mins(),
            default_member_count: default_member_count(),
            suggestion_count: default_suggestion_count(),
            utc_offset_minutes: None,
        }
    }
}

fn default_cuisines() -> Vec<String> {
    vec![
        "European".to_string(),
        "Russian".to_string(),
        "Italian".to_string(),
    ]
}

fn default_start_hour() -> u32 {
    15
}

fn default_end_hour() -> u32 {
    21
}

fn default_window_minutes() -> u32 {
    5
}

fn default_tick_secs() -> u64 {
    60
}

fn default_volunteer_grace_mins() -> u32 {
    15
}

fn default_quorum_numerator() -> u32 {
    2
}

fn default_quorum_denominator() -> u32 {
    3
}

fn default_session_idle_mins() -> u32 {
    10
}

fn default_member_count() -> u32 {
    3
}

fn default_suggestion_count() -> usize {
    4
}
