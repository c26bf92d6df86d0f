// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `supper doctor` command implementation.
//!
//! Runs each collaborator's health check so a misconfigured token or an
//! unreadable database shows up before `serve` is started.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use supper_config::model::SupperConfig;
use supper_core::{HealthStatus, PluginAdapter, SupperError};
use supper_openai::OpenAiLlm;
use supper_storage::SqliteStore;
use supper_telegram::TelegramTransport;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `supper doctor` command. Returns `false` when any check failed.
pub async fn run_doctor(config: &SupperConfig, plain: bool) -> bool {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_database(config).await,
        check_telegram(config).await,
        check_openai(config).await,
    ];

    println!();
    println!("  supper doctor");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    !results.iter().any(|r| r.status == CheckStatus::Fail)
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({duration_ms}ms)", result.name, result.message)
    }
}

/// Maps an adapter's health report onto a check result.
async fn adapter_check(name: &str, adapter: &dyn PluginAdapter, start: Instant) -> CheckResult {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(name, CheckStatus::Pass, "healthy", start),
        Ok(HealthStatus::Degraded(msg)) => CheckResult::new(name, CheckStatus::Warn, msg, start),
        Ok(HealthStatus::Unhealthy(msg)) => CheckResult::new(name, CheckStatus::Fail, msg, start),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

fn init_failed(name: &str, e: SupperError, start: Instant) -> CheckResult {
    CheckResult::new(name, CheckStatus::Fail, e.to_string(), start)
}

/// Opens the database if it exists. A missing file is only a warning.
async fn check_database(config: &SupperConfig) -> CheckResult {
    const NAME: &str = "Database";
    let start = Instant::now();
    let path = &config.storage.database_path;

    if !std::path::Path::new(path).exists() {
        return CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("not found: {path} (will be created on first run)"),
            start,
        );
    }

    match SqliteStore::open(&config.storage).await {
        Ok(store) => adapter_check(NAME, &store, start).await,
        Err(e) => init_failed(NAME, e, start),
    }
}

/// Calls `getMe` with the configured bot token.
async fn check_telegram(config: &SupperConfig) -> CheckResult {
    const NAME: &str = "Telegram";
    let start = Instant::now();
    if config.telegram.bot_token.as_deref().is_none_or(str::is_empty) {
        return CheckResult::new(NAME, CheckStatus::Fail, "telegram.bot_token is not set", start);
    }
    match TelegramTransport::new(&config.telegram) {
        Ok(transport) => adapter_check(NAME, &transport, start).await,
        Err(e) => init_failed(NAME, e, start),
    }
}

/// Verifies the OpenAI client can be built. No request is made.
///
/// The key may come from the config or from `OPENAI_API_KEY`.
async fn check_openai(config: &SupperConfig) -> CheckResult {
    const NAME: &str = "OpenAI";
    let start = Instant::now();
    match OpenAiLlm::new(&config.openai) {
        Ok(llm) => adapter_check(NAME, &llm, start).await,
        Err(e) => init_failed(NAME, e, start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_db(path: &str) -> SupperConfig {
        let mut config = SupperConfig::default();
        config.storage.database_path = path.to_string();
        config
    }

    #[tokio::test]
    async fn missing_database_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let result = check_database(&config_with_db(path.to_str().unwrap())).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn existing_database_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supper.db");
        let config = config_with_db(path.to_str().unwrap());
        SqliteStore::open(&config.storage).await.unwrap();

        let result = check_database(&config).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[tokio::test]
    async fn missing_bot_token_fails() {
        let telegram = check_telegram(&SupperConfig::default()).await;
        assert_eq!(telegram.status, CheckStatus::Fail);
        assert!(telegram.message.contains("telegram.bot_token"));
    }

    #[tokio::test]
    async fn configured_openai_key_passes_without_a_request() {
        let mut config = SupperConfig::default();
        config.openai.api_key = Some("sk-test".into());
        assert_eq!(check_openai(&config).await.status, CheckStatus::Pass);
    }

    #[test]
    fn plain_lines_are_tagged() {
        let result = CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Warn,
            message: "not found".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[WARN] Database"));
        assert!(line.ends_with("not found (3ms)"));
    }
}
