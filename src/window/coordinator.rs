//! Window coordinator: periodic drain, fan-out and rollup.
//!
//! Each tick walks `DRAINING → DISPATCHING → AGGREGATING` and returns to
//! idle. Ingestion runs as its own task and keeps filling the next window
//! while a tick is being processed.

use crate::models::{GroupReport, Message, TickOutcome};
use crate::window::{BatchProcessor, GlobalAggregator, WindowBuffer};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Default bound on concurrent per-group analyses.
pub const DEFAULT_MAX_CONCURRENT_GROUPS: usize = 16;

/// Drives the window lifecycle.
pub struct WindowCoordinator {
    buffer: Arc<WindowBuffer>,
    processor: BatchProcessor,
    aggregator: GlobalAggregator,
    window: Duration,
    max_concurrent_groups: usize,
}

impl WindowCoordinator {
    pub fn new(processor: BatchProcessor, aggregator: GlobalAggregator, window: Duration) -> Self {
        Self {
            buffer: Arc::new(WindowBuffer::new()),
            processor,
            aggregator,
            window,
            max_concurrent_groups: DEFAULT_MAX_CONCURRENT_GROUPS,
        }
    }

    pub fn with_max_concurrent_groups(mut self, limit: usize) -> Self {
        self.max_concurrent_groups = limit.max(1);
        self
    }

    /// The buffer collecting the current window.
    pub fn buffer(&self) -> Arc<WindowBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Run until `cancel` fires or the queue's producers are all gone.
    ///
    /// Cancellation reaches an in-flight tick too: pending backend calls are
    /// abandoned, nothing is aggregated and no new tick starts. When the
    /// input closes, the partial window is flushed with one last tick before
    /// returning.
    pub async fn run(&self, rx: mpsc::Receiver<Message>, cancel: CancellationToken) {
        let mut ingest = tokio::spawn(ingest_messages(rx, self.buffer(), cancel.clone()));

        let mut ticker = interval_at(Instant::now() + self.window, self.window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Analyzer started, monitor window: {:?}", self.window);

        let input_closed = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break false,
                result = &mut ingest => {
                    if let Err(e) = result {
                        error!("Ingestion task failed: {}", e);
                    }
                    break true;
                }
                _ = ticker.tick() => {
                    let outcome = self.tick(&cancel).await;
                    if outcome.summary().is_none() {
                        debug!("Tick finished without summary: {:?}", outcome);
                    }
                }
            }
        };

        if input_closed {
            info!("Input closed, flushing final window");
            let outcome = self.tick(&cancel).await;
            debug!("Final tick finished: {:?}", outcome);
        } else if let Err(e) = ingest.await {
            error!("Ingestion task failed: {}", e);
        }

        info!("Analyzer stopped");
    }

    /// Process one window boundary. A tick interrupted by `cancel` does not
    /// retry; its snapshot is discarded.
    pub async fn tick(&self, cancel: &CancellationToken) -> TickOutcome {
        // DRAINING
        let snapshot = self.buffer.swap();
        if snapshot.is_empty() {
            return TickOutcome::Empty;
        }

        let groups = snapshot.len();
        debug!(
            "--- Monitor report for past {:?}: {} groups ---",
            self.window, groups
        );

        // DISPATCHING: join-all over every group, bounded concurrency
        let processor = &self.processor;
        let mut reports: Vec<GroupReport> = stream::iter(snapshot)
            .map(|(group_id, messages)| async move {
                processor.process(group_id, &messages, cancel).await
            })
            .buffer_unordered(self.max_concurrent_groups)
            .filter_map(|report| async move { report })
            .collect()
            .await;

        if cancel.is_cancelled() {
            info!("Shutdown during tick, dropping {} group(s)", groups);
            return TickOutcome::Cancelled { groups };
        }
        if reports.is_empty() {
            debug!("No group produced a report");
            return TickOutcome::NoReports { groups };
        }
        reports.sort_by_key(|r| r.group_id);

        // AGGREGATING
        match self.aggregator.aggregate(&reports, cancel).await {
            Ok(summary) => TickOutcome::Summarized {
                groups,
                reports: reports.len(),
                summary,
            },
            Err(_) if cancel.is_cancelled() => {
                info!("Shutdown during global summary, nothing sent");
                TickOutcome::Cancelled { groups }
            }
            Err(e) => {
                error!("{}", e);
                TickOutcome::AggregationFailed {
                    groups,
                    reports: reports.len(),
                }
            }
        }
    }
}

/// Move queued messages into the window buffer until cancelled or closed.
async fn ingest_messages(
    mut rx: mpsc::Receiver<Message>,
    buffer: Arc<WindowBuffer>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(message) => buffer.append(message),
                None => break,
            },
        }
    }
    debug!("Ingestion stopped with {} messages pending", buffer.pending());
}
