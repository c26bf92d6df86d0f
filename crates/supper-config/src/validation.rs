// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as hour ranges, the quorum fraction, and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::SupperConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SupperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let wf = &config.workflow;

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    for (name, hour) in [("start_hour", wf.start_hour), ("end_hour", wf.end_hour)] {
        if hour > 23 {
            errors.push(validation(&format!(
                "workflow.{name} must be between 0 and 23, got {hour}"
            )));
        }
    }

    if wf.window_minutes == 0 || wf.window_minutes > 60 {
        errors.push(validation(&format!(
            "workflow.window_minutes must be between 1 and 60, got {}",
            wf.window_minutes
        )));
    }

    if wf.tick_secs == 0 {
        errors.push(validation("workflow.tick_secs must be positive"));
    }

    if wf.quorum_denominator == 0 {
        errors.push(validation("workflow.quorum_denominator must be positive"));
    } else if wf.quorum_numerator > wf.quorum_denominator {
        errors.push(validation(&format!(
            "workflow.quorum_numerator ({}) must not exceed quorum_denominator ({})",
            wf.quorum_numerator, wf.quorum_denominator
        )));
    }

    if wf.cuisines.iter().all(|c| c.trim().is_empty()) {
        errors.push(validation("workflow.cuisines must name at least one cuisine"));
    }

    if wf.suggestion_count == 0 || wf.suggestion_count > 10 {
        errors.push(validation(&format!(
            "workflow.suggestion_count must be between 1 and 10, got {}",
            wf.suggestion_count
        )));
    }

    if let Some(offset) = wf.utc_offset_minutes.filter(|o| o.abs() > 14 * 60) {
        errors.push(validation(&format!(
            "workflow.utc_offset_minutes must be within +/-840, got {offset}"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that the credentials needed to run the bot are present.
///
/// The OpenAI key may also come from `OPENAI_API_KEY`, which the client reads
/// when `openai.api_key` is unset.
pub fn validate_serve_requirements(config: &SupperConfig) -> Result<(), Vec<ConfigError>> {
    let env_key = std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.trim().is_empty());
    check_credentials(config, env_key)
}

fn check_credentials(config: &SupperConfig, openai_env_key: bool) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    if config
        .telegram
        .bot_token
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "telegram.bot_token".to_string(),
        });
    }
    if !openai_env_key
        && config
            .openai
            .api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "openai.api_key".to_string(),
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = SupperConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = SupperConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn hour_out_of_range_fails_validation() {
        let mut config = SupperConfig::default();
        config.workflow.start_hour = 24;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "start_hour"));
    }

    #[test]
    fn quorum_fraction_above_one_fails_validation() {
        let mut config = SupperConfig::default();
        config.workflow.quorum_numerator = 4;
        config.workflow.quorum_denominator = 3;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "quorum_numerator"));
    }

    #[test]
    fn zero_denominator_fails_validation() {
        let mut config = SupperConfig::default();
        config.workflow.quorum_denominator = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "quorum_denominator"));
    }

    #[test]
    fn all_violations_are_collected() {
        let mut config = SupperConfig::default();
        config.workflow.window_minutes = 0;
        config.workflow.tick_secs = 0;
        config.workflow.cuisines = vec![];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn serve_requires_both_credentials() {
        let mut config = SupperConfig::default();
        let errors = check_credentials(&config, false).unwrap_err();
        assert_eq!(errors.len(), 2);

        config.telegram.bot_token = Some("123:abc".into());
        config.openai.api_key = Some("sk-test".into());
        assert!(check_credentials(&config, false).is_ok());
    }

    #[test]
    fn openai_key_may_come_from_the_environment() {
        let mut config = SupperConfig::default();
        config.telegram.bot_token = Some("123:abc".into());
        assert!(check_credentials(&config, true).is_ok());
    }
}
