//! Resilience Rituals command line.
//!
//! ```text
//! main() -> Cli::parse() -> Workspace::open(config, database) -> commands::run()
//!                                                                   |
//!                                                                   v
//!                                                 store action -> drain toasts -> stdout
//! ```
//!
//! Logs go to `~/.resilience/logs/resilience.log` so they never interleave
//! with command output.

mod commands;
mod render;

use anyhow::Result;
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "resilience", version, about = "Build emotional resilience one ritual at a time")]
struct Cli {
    /// Config file (default: ~/.resilience/config.toml)
    #[arg(long, global = true, env = "RESILIENCE_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database file, overriding `[storage] database`
    #[arg(long, global = true, env = "RESILIENCE_DATABASE", value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than mixing logs into command output.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.resilience/logs/resilience.log
    if let Some(data_dir) = resilience_config::data_dir() {
        candidates.push(data_dir.join("logs").join("resilience.log"));
    }

    // Fallback: ./.resilience/logs/resilience.log
    candidates.push(
        PathBuf::from(".resilience")
            .join("logs")
            .join("resilience.log"),
    );

    candidates
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut workspace = commands::Workspace::open(cli.config, cli.database)?;
    let result = commands::run(&mut workspace, cli.command);
    // Toasts raised before a failure still describe what happened.
    render::toasts(&workspace.drain_toasts());
    if let Err(err) = &result {
        tracing::error!("{err:#}");
    }
    result
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "resilience",
            "profile",
            "--database",
            "/tmp/r.db",
            "--config",
            "/tmp/c.toml",
        ])
        .unwrap();
        assert_eq!(cli.database.unwrap().to_str(), Some("/tmp/r.db"));
        assert_eq!(cli.config.unwrap().to_str(), Some("/tmp/c.toml"));
    }
}
