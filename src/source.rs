//! JSON-lines message source.
//!
//! Each input line is one message:
//! `{"group_id": -1001, "sender_id": 42, "text": "...", "received_at": "2024-05-01T12:00:00Z"}`.
//! `sender_id` and `received_at` are optional.

use crate::error::SourceError;
use crate::models::Message;
use crate::window::EventQueue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counters reported when the source stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub accepted: u64,
    pub dropped: u64,
    pub skipped: u64,
}

/// Open `path` for reading, `-` meaning stdin.
pub async fn open_input(path: &str) -> Result<Box<dyn AsyncBufRead + Send + Unpin>, SourceError> {
    if path == "-" {
        info!("Reading messages from stdin");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| SourceError::Open {
            path: path.to_string(),
            source,
        })?;
    info!("Reading messages from {}", path);
    Ok(Box::new(BufReader::new(file)))
}

/// Feed every decodable line of `reader` into `queue` until EOF or cancel.
pub async fn run_source<R>(
    reader: R,
    queue: EventQueue,
    cancel: CancellationToken,
) -> Result<SourceStats, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = SourceStats::default();

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("Input reached end of stream");
            break;
        };

        match parse_line(&line) {
            Some(message) => {
                if queue.enqueue(message) {
                    stats.accepted += 1;
                } else {
                    stats.dropped += 1;
                }
            }
            None => stats.skipped += 1,
        }
    }

    debug!("Queue dropped {} messages in total", queue.dropped());
    Ok(stats)
}

/// Decode one input line. Blank lines, malformed JSON and empty texts are skipped.
fn parse_line(line: &str) -> Option<Message> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Message>(line) {
        Ok(message) if message.text.is_empty() => None,
        Ok(message) => {
            debug!("Received msg from group {}: {}", message.group_id, message.text);
            Some(message)
        }
        Err(e) => {
            warn!("Skipping malformed input line: {}", e);
            None
        }
    }
}
