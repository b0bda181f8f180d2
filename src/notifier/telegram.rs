//! Telegram Bot API notifier.

use crate::config::NotifierConfig;
use crate::error::NotifyError;
use crate::notifier::{split_text, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Sends summaries to a Telegram chat through a bot.
pub struct TelegramNotifier {
    http_client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: i64,
    max_message_chars: usize,
    retry_delay: Duration,
}

impl TelegramNotifier {
    /// Build a notifier, or `None` when the bot is not configured.
    pub fn from_config(config: &NotifierConfig) -> Result<Option<Self>> {
        let token = match config.bot_token.as_deref() {
            Some(token) if !token.is_empty() && config.chat_id != 0 => token,
            _ => return Ok(None),
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Some(Self {
            http_client,
            api_base: TELEGRAM_API.to_string(),
            token: token.to_string(),
            chat_id: config.chat_id,
            max_message_chars: config.max_message_chars,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }))
    }

    async fn send_once(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let response = self
            .http_client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: self.chat_id,
                text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if text.is_empty() {
            return Ok(());
        }

        let chunks = split_text(text, self.max_message_chars);
        debug!("Sending notification in {} part(s)", chunks.len());

        for chunk in &chunks {
            if let Err(e) = self.send_once(chunk).await {
                warn!("Notification send failed, retrying once: {}", e);
                tokio::time::sleep(self.retry_delay).await;
                self.send_once(chunk).await?;
            }
        }
        Ok(())
    }
}
