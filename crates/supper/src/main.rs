// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supper - a family dinner planner for group chats.
//!
//! This is the binary entry point for the Supper bot.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;
mod shutdown;

use clap::{Parser, Subcommand};

/// Supper - a family dinner planner for group chats.
#[derive(Parser, Debug)]
#[command(name = "supper", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: poll Telegram and drive the daily dinner workflow.
    Serve,
    /// Inspect Supper configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check that storage and collaborators are reachable.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate the merged configuration and print a summary.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match supper_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            supper_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(errors) = supper_config::validate_serve_requirements(&config) {
                supper_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("supper: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => {
            println!("{}", config_summary(&config));
        }
        Some(Commands::Doctor { plain }) => {
            if !doctor::run_doctor(&config, plain).await {
                std::process::exit(1);
            }
        }
        None => {
            println!("supper: use --help for available commands");
        }
    }
}

fn config_summary(config: &supper_config::model::SupperConfig) -> String {
    let wf = &config.workflow;
    let offset = match wf.utc_offset_minutes {
        Some(m) => format!("UTC{:+}min", m),
        None => "host local time".to_string(),
    };
    format!(
        "config OK\n  agent.name      = {}\n  storage         = {}\n  voting window   = {:02}:00 to {:02}:00 ({offset})\n  quorum          = {}/{}\n  cuisines        = {}",
        config.agent.name,
        config.storage.database_path,
        wf.start_hour,
        wf.end_hour,
        wf.quorum_numerator,
        wf.quorum_denominator,
        wf.cuisines.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = supper_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "Supper");
    }

    #[test]
    fn cli_parses_config_check() {
        let cli = Cli::try_parse_from(["supper", "config", "check"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Check
            })
        ));
    }

    #[test]
    fn cli_parses_doctor_plain() {
        let cli = Cli::try_parse_from(["supper", "doctor", "--plain"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Doctor { plain: true })));
    }

    #[test]
    fn summary_mentions_window_and_quorum() {
        let config = supper_config::load_and_validate_str(
            "[workflow]\nstart_hour = 16\nend_hour = 22\nutc_offset_minutes = 180\n",
        )
        .unwrap();
        let summary = config_summary(&config);
        assert!(summary.starts_with("config OK"));
        assert!(summary.contains("16:00 to 22:00 (UTC+180min)"));
        assert!(summary.contains("quorum          = 2/3"));
    }
}
