// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Later layers win: compiled defaults, `/etc/supper/supper.toml`, the user's
//! XDG config dir, `./supper.toml`, then `SUPPER_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SupperConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: [&str; 5] = ["agent", "telegram", "openai", "storage", "workflow"];

/// Candidate config files, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/supper/supper.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("supper").join("supper.toml"));
    }
    paths.push(PathBuf::from("supper.toml"));
    paths
}

/// Load configuration from every layer.
pub fn load_config() -> Result<SupperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<SupperConfig, figment::Error> {
    Figment::from(Serialized::defaults(SupperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one file, with env overrides on top.
pub fn load_config_from_path(path: &Path) -> Result<SupperConfig, figment::Error> {
    Figment::from(Serialized::defaults(SupperConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::from(Serialized::defaults(SupperConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// `SUPPER_TELEGRAM_BOT_TOKEN` becomes `telegram.bot_token`.
///
/// Only the first `_` after a known section name turns into a dot, so field
/// names keep their underscores. Unknown prefixes pass through unchanged and
/// surface as unknown-field diagnostics.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("SUPPER_").map(|key| {
        let key = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or_else(|| key.to_string())
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_file_has_highest_file_precedence() {
        let paths = config_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/supper/supper.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("supper.toml")));
    }

    #[test]
    fn env_keys_split_only_at_the_section() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SUPPER_WORKFLOW_VOLUNTEER_GRACE_MINS", "20");
            jail.set_env("SUPPER_STORAGE_WAL_MODE", "false");
            let config: SupperConfig = Figment::from(Serialized::defaults(SupperConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.workflow.volunteer_grace_mins, 20);
            assert!(!config.storage.wal_mode);
            Ok(())
        });
    }
}
