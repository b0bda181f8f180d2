//! Configuration file handling.
//!
//! This module handles loading, merging and validating configuration from
//! `.chatradar.toml` files.

use crate::backend::{PromptOverrides, PromptTemplate};
use crate::window::{coordinator, processor, queue};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".chatradar.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Window and pipeline settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Analysis backend settings.
    #[serde(default)]
    pub ai: AiConfig,

    /// Notification settings.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Message source settings.
    #[serde(default)]
    pub source: SourceConfig,
}

/// Windowing and pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Length of one analysis window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Enable verbose logging, including rendered chat logs.
    #[serde(default)]
    pub debug: bool,

    /// Pending messages the ingress queue holds before dropping.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Upper bound on concurrent per-group analyses in one tick.
    #[serde(default = "default_max_concurrent_groups")]
    pub max_concurrent_groups: usize,

    /// Messages shorter than this many visible characters are ignored.
    #[serde(default = "default_min_visible_chars")]
    pub min_visible_chars: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            debug: false,
            queue_capacity: default_queue_capacity(),
            max_concurrent_groups: default_max_concurrent_groups(),
            min_visible_chars: default_min_visible_chars(),
        }
    }
}

fn default_window_seconds() -> u64 {
    300
}

fn default_queue_capacity() -> usize {
    queue::DEFAULT_CAPACITY
}

fn default_max_concurrent_groups() -> usize {
    coordinator::DEFAULT_MAX_CONCURRENT_GROUPS
}

fn default_min_visible_chars() -> usize {
    processor::DEFAULT_MIN_VISIBLE_CHARS
}

/// Analysis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Bearer token for the API.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP-level timeout; prompt timeouts are usually tighter.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Overrides for the per-group analysis prompt.
    #[serde(default)]
    pub group_prompt: PromptOverrides,

    /// Overrides for the cross-group rollup prompt.
    #[serde(default)]
    pub summary_prompt: PromptOverrides,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_seconds: default_request_timeout(),
            group_prompt: PromptOverrides::default(),
            summary_prompt: PromptOverrides::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// Telegram bot notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot token. Notifications are disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Target chat id.
    #[serde(default)]
    pub chat_id: i64,

    /// Longest single message the bot sends; longer text is split.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Pause before the single retry of a failed chunk.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_notifier_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: 0,
            max_message_chars: default_max_message_chars(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_seconds: default_notifier_timeout(),
        }
    }
}

fn default_max_message_chars() -> usize {
    3500
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_notifier_timeout() -> u64 {
    15
}

/// Message source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON-lines input file, or `-` for stdin.
    #[serde(default = "default_input")]
    pub input: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
        }
    }
}

fn default_input() -> String {
    "-".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(window) = args.window_seconds {
            self.monitor.window_seconds = window;
        }
        if args.debug {
            self.monitor.debug = true;
        }

        if let Some(ref key) = args.api_key {
            self.ai.api_key = key.clone();
        }
        if let Some(ref url) = args.base_url {
            self.ai.base_url = url.clone();
        }
        if let Some(ref model) = args.model {
            self.ai.model = model.clone();
        }

        if let Some(ref token) = args.bot_token {
            self.notifier.bot_token = Some(token.clone());
        }
        if let Some(chat_id) = args.chat_id {
            self.notifier.chat_id = chat_id;
        }

        if let Some(ref input) = args.input {
            self.source.input = input.clone();
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.window_seconds == 0 {
            bail!("monitor.window_seconds must be at least 1");
        }
        if self.monitor.queue_capacity == 0 {
            bail!("monitor.queue_capacity must be at least 1");
        }
        if self.monitor.max_concurrent_groups == 0 {
            bail!("monitor.max_concurrent_groups must be at least 1");
        }
        if self.ai.api_key.trim().is_empty() {
            bail!("ai.api_key is empty (set it in the config file or CHATRADAR_API_KEY)");
        }
        if !self.ai.base_url.starts_with("http://") && !self.ai.base_url.starts_with("https://") {
            bail!("ai.base_url must start with 'http://' or 'https://'");
        }

        for template in [self.group_prompt(), self.summary_prompt()] {
            if !(0.0..=2.0).contains(&template.temperature) {
                bail!("{} prompt temperature must be between 0.0 and 2.0", template.kind);
            }
            if template.timeout.is_zero() {
                bail!("{} prompt timeout must be at least 1 second", template.kind);
            }
        }

        Ok(())
    }

    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.monitor.window_seconds)
    }

    /// Per-group prompt with file overrides applied.
    pub fn group_prompt(&self) -> PromptTemplate {
        PromptTemplate::group().with_overrides(&self.ai.group_prompt)
    }

    /// Rollup prompt with file overrides applied.
    pub fn summary_prompt(&self) -> PromptTemplate {
        PromptTemplate::summary().with_overrides(&self.ai.summary_prompt)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
