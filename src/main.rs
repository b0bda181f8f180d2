//! ChatRadar - windowed chat-group monitor with LLM briefings
//!
//! Reads chat messages as JSON lines, batches them per group into fixed
//! time windows, analyzes every group through an OpenAI-compatible API and
//! forwards a cross-group rollup to a Telegram chat.
//!
//! Exit codes:
//!   0 - Clean shutdown (Ctrl-C or end of input)
//!   1 - Startup error (invalid arguments or configuration)

mod backend;
mod cli;
mod config;
mod error;
mod models;
mod notifier;
mod source;
#[cfg(test)]
mod test_support;
mod window;

use anyhow::{Context, Result};
use backend::{AnalysisBackend, OpenAiBackend};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use notifier::{Notifier, TelegramNotifier};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use window::{BatchProcessor, EventQueue, GlobalAggregator, WindowCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("ChatRadar v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Exit explicitly: a pending stdin read would otherwise hold up runtime shutdown
    match run_monitor(config).await {
        Ok(()) => {
            info!("Service stopped");
            std::process::exit(0);
        }
        Err(e) => {
            error!("Monitor failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .chatradar.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set ai.api_key (or CHATRADAR_API_KEY) before starting the monitor.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.monitor.debug);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or defaults, apply CLI overrides and validate.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        // An explicit path must load
        Some(ref path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };

    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Wire the pipeline together and run until Ctrl-C or end of input.
async fn run_monitor(config: Config) -> Result<()> {
    let backend: Arc<dyn AnalysisBackend> = Arc::new(OpenAiBackend::new(&config.ai)?);

    let notifier = match TelegramNotifier::from_config(&config.notifier)? {
        Some(bot) => {
            info!("Telegram notifications enabled for chat {}", config.notifier.chat_id);
            let bot: Arc<dyn Notifier> = Arc::new(bot);
            Some(bot)
        }
        None => {
            warn!("No notifier configured; summaries will only be logged");
            None
        }
    };

    let processor = BatchProcessor::new(Arc::clone(&backend), config.group_prompt())
        .with_min_visible_chars(config.monitor.min_visible_chars);
    let aggregator = GlobalAggregator::new(backend, config.summary_prompt(), notifier);
    let coordinator = WindowCoordinator::new(processor, aggregator, config.window_duration())
        .with_max_concurrent_groups(config.monitor.max_concurrent_groups);

    let (queue, rx) = EventQueue::new(config.monitor.queue_capacity);
    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    cancel.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
        }
    });

    let reader = source::open_input(&config.source.input).await?;
    let source_task = tokio::spawn(source::run_source(reader, queue, cancel.clone()));

    coordinator.run(rx, cancel).await;

    match source_task.await {
        Ok(Ok(stats)) => info!(
            "Source finished: {} accepted, {} dropped, {} skipped",
            stats.accepted, stats.dropped, stats.skipped
        ),
        Ok(Err(e)) => error!("Source failed: {}", e),
        Err(e) => error!("Source task failed: {}", e),
    }

    Ok(())
}
