//! Outbound notification channel.
//!
//! The coordinator hands each window's global summary to a [`Notifier`].
//! Payload splitting and the single retry live in the implementation.

pub mod telegram;

pub use telegram::TelegramNotifier;

use crate::error::NotifyError;
use async_trait::async_trait;

/// Best-effort delivery of a text message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Split `text` into chunks of at most `max_chars` characters.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
