// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! dbchat - chat with your database from the terminal.
//!
//! This is the binary entry point for the dbchat client.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use dbchat_config::model::DbChatConfig;
use dbchat_core::DbChatError;

mod render;
mod shell;

/// dbchat - chat with your database from the terminal.
#[derive(Parser, Debug)]
#[command(name = "dbchat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive chat shell (the default).
    Shell,
    /// List your conversation history.
    History,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match dbchat_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            dbchat_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_logging(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::History) => print_history(&config).await,
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Shell) | None => shell::run_shell(config).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Initializes tracing to stderr; `RUST_LOG` overrides the configured level.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// One-shot listing of the user's conversations.
async fn print_history(config: &DbChatConfig) -> Result<(), DbChatError> {
    let client = dbchat_client::DbChatClient::new(config)?;
    let entries = client.history(&config.user.id).await?;
    if entries.is_empty() {
        println!("no conversations yet");
        return Ok(());
    }
    for entry in entries {
        let title = if entry.title.is_empty() {
            "(untitled)".to_string()
        } else {
            entry.title.clone()
        };
        println!("{}  {title}", entry.thread_id.yellow());
    }
    Ok(())
}

/// Prints the resolved configuration as TOML.
fn print_config(config: &DbChatConfig) -> Result<(), DbChatError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| DbChatError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = dbchat_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.api.timeout_secs, 120);
    }

    #[test]
    fn resolved_config_renders_as_toml() {
        let config = dbchat_config::model::DbChatConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("base_url"));
        assert!(rendered.contains("log_level"));
    }
}
