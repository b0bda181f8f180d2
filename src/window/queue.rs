//! Bounded, non-blocking ingress queue.

use crate::models::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Default number of pending messages held before dropping.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Producer handle of the ingress queue.
///
/// Cheap to clone; every clone feeds the same queue. `enqueue` never waits:
/// when the queue is full the message is dropped and counted.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<Message>,
    dropped: Arc<AtomicU64>,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` pending messages.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let queue = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (queue, rx)
    }

    /// Queue a message without blocking. Returns `false` if it was dropped.
    pub fn enqueue(&self, message: Message) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "Message queue full, dropping message from group {} ({} dropped so far)",
                    message.group_id, total
                );
                false
            }
            Err(TrySendError::Closed(message)) => {
                debug!(
                    "Message queue closed, discarding message from group {}",
                    message.group_id
                );
                false
            }
        }
    }

    /// Number of messages dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
