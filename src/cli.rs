//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and log-level selection.

use clap::Parser;
use std::path::PathBuf;

/// ChatRadar - windowed chat-group monitor with LLM briefings
///
/// Reads chat messages as JSON lines, batches them per group into fixed
/// windows, asks an LLM for a per-group brief and a cross-group rollup,
/// and forwards the rollup to a Telegram chat.
///
/// Examples:
///   chatradar --input messages.jsonl --window-seconds 60
///   tail -f events.jsonl | chatradar --api-key sk-... --debug
///   chatradar --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .chatradar.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON-lines message input (file path, or - for stdin)
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<String>,

    /// Window length in seconds
    #[arg(short, long, value_name = "SECS")]
    pub window_seconds: Option<u64>,

    /// API key for the analysis backend
    #[arg(long, env = "CHATRADAR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "CHATRADAR_BASE_URL")]
    pub base_url: Option<String>,

    /// Model to use for analysis
    #[arg(short, long, env = "CHATRADAR_MODEL")]
    pub model: Option<String>,

    /// Telegram bot token for summary notifications
    #[arg(long, env = "CHATRADAR_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Telegram chat id receiving the summaries
    #[arg(long, value_name = "ID", allow_negative_numbers = true)]
    pub chat_id: Option<i64>,

    /// Debug mode: log rendered chat logs and per-group results
    #[arg(short, long)]
    pub debug: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .chatradar.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(window) = self.window_seconds {
            if window == 0 {
                return Err("Window must be at least 1 second".to_string());
            }
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `debug` is the config-file toggle merged with `--debug`.
    pub fn log_level(&self, debug: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || self.debug || debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
