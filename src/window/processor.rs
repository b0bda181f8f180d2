//! Per-group batch analysis.

use crate::backend::{complete_within, AnalysisBackend, PromptTemplate};
use crate::error::BackendError;
use crate::models::{GroupId, GroupReport, Message};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Messages shorter than this carry no meaning (reactions, single emoji).
pub const DEFAULT_MIN_VISIBLE_CHARS: usize = 2;

/// Turns one group's window into a [`GroupReport`].
///
/// A failing group only loses its own report: every error is logged and
/// mapped to `None`.
pub struct BatchProcessor {
    backend: Arc<dyn AnalysisBackend>,
    template: PromptTemplate,
    min_visible_chars: usize,
}

impl BatchProcessor {
    pub fn new(backend: Arc<dyn AnalysisBackend>, template: PromptTemplate) -> Self {
        Self {
            backend,
            template,
            min_visible_chars: DEFAULT_MIN_VISIBLE_CHARS,
        }
    }

    pub fn with_min_visible_chars(mut self, min_visible_chars: usize) -> Self {
        self.min_visible_chars = min_visible_chars;
        self
    }

    /// Analyze one group's messages. Returns `None` when nothing survives
    /// filtering, the backend call fails or `cancel` fires mid-call.
    pub async fn process(
        &self,
        group_id: GroupId,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Option<GroupReport> {
        if let (Some(first), Some(last)) = (messages.first(), messages.last()) {
            debug!(
                "Group {}: {} messages ({} .. {})",
                group_id,
                messages.len(),
                first.received_at.format("%H:%M:%S"),
                last.received_at.format("%H:%M:%S")
            );
        }

        let chat_log = match self.render_chat_log(messages) {
            Some(log) => log,
            None => {
                debug!("Group {}: no valid discussion", group_id);
                return None;
            }
        };
        debug!("Group {} text to analyze:\n{}", group_id, chat_log);

        match complete_within(self.backend.as_ref(), &self.template, &chat_log, cancel).await {
            Ok(analysis) => {
                debug!("Group {} analysis result:\n{}", group_id, analysis);
                Some(GroupReport::new(group_id, analysis))
            }
            Err(BackendError::Cancelled) => {
                debug!("Group {} analysis cancelled", group_id);
                None
            }
            Err(e) => {
                warn!("Group {} LLM analysis failed: {}", group_id, e);
                None
            }
        }
    }

    /// Render the messages worth analyzing as a newline-delimited log.
    pub fn render_chat_log(&self, messages: &[Message]) -> Option<String> {
        let lines: Vec<String> = messages
            .iter()
            .filter(|m| visible_len(&m.text) >= self.min_visible_chars)
            .map(render_line)
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Number of user-perceived characters, ignoring surrounding whitespace.
fn visible_len(text: &str) -> usize {
    text.trim().graphemes(true).count()
}

fn render_line(message: &Message) -> String {
    let text = message.text.trim().replace(['\r', '\n'], " ");
    format!("{}: {}", message.sender_tag(), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PromptKind;
    use crate::test_support::ScriptedBackend;

    fn processor(backend: Arc<ScriptedBackend>) -> BatchProcessor {
        BatchProcessor::new(backend, PromptTemplate::group())
    }

    fn live() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn test_visible_len() {
        assert_eq!(visible_len("ok"), 2);
        assert_eq!(visible_len("  k  "), 1);
        assert_eq!(visible_len("👍"), 1);
        // Skin-tone modifier forms one grapheme
        assert_eq!(visible_len("👍🏽"), 1);
        assert_eq!(visible_len("🚀🚀"), 2);
    }

    #[test]
    fn test_render_chat_log() {
        let backend = Arc::new(ScriptedBackend::new());
        let messages = vec![
            Message::new(1, Some(7), "BTC breaking out"),
            Message::new(1, None, "k"),
            Message::new(1, None, "who is selling?\nnot me"),
        ];

        let log = processor(backend).render_chat_log(&messages).unwrap();
        assert_eq!(log, "U7: BTC breaking out\nU?: who is selling? not me");
    }

    #[tokio::test]
    async fn test_noise_only_group_skips_backend() {
        let backend = Arc::new(ScriptedBackend::new());
        let messages = vec![
            Message::new(5, Some(1), "👍"),
            Message::new(5, Some(2), "k"),
            Message::new(5, Some(3), " "),
        ];

        let report = processor(backend.clone()).process(5, &messages, &live()).await;

        assert!(report.is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_qualifying_group_calls_backend_once() {
        let backend = Arc::new(ScriptedBackend::new().reply_on("ETH", "ETH sentiment bullish"));
        let messages = vec![
            Message::new(9, Some(1), "ETH to 5k"),
            Message::new(9, Some(2), "👍"),
            Message::new(9, Some(3), "ETH gas is cheap today"),
        ];

        let report = processor(backend.clone()).process(9, &messages, &live()).await.unwrap();

        assert_eq!(report.group_id, 9);
        assert_eq!(report.text, "ETH sentiment bullish");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, PromptKind::Group);
        assert_eq!(calls[0].max_tokens, 800);
        assert!(calls[0].user_text.contains("U1: ETH to 5k\nU3: ETH gas is cheap today"));
    }

    #[tokio::test]
    async fn test_backend_failure_returns_none() {
        let backend = Arc::new(ScriptedBackend::new().fail_on("rug"));
        let messages = vec![Message::new(3, None, "another rug pull")];

        let report = processor(backend.clone()).process(3, &messages, &live()).await;

        assert!(report.is_none());
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_timeout_returns_none() {
        let backend = Arc::new(ScriptedBackend::new().stall_on("hang"));
        let messages = vec![Message::new(3, None, "hang forever")];

        let report = processor(backend).process(3, &messages, &live()).await;
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_call_returns_none() {
        let backend = Arc::new(ScriptedBackend::new().stall_on("stuck"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let messages = vec![Message::new(3, None, "stuck in traffic")];

        let report = processor(backend).process(3, &messages, &cancel).await;
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let backend = Arc::new(ScriptedBackend::new());
        let processor = processor(backend.clone()).with_min_visible_chars(5);
        let messages = vec![Message::new(1, None, "gm gm")];

        assert!(processor.process(1, &messages, &live()).await.is_some());
        assert!(processor
            .process(1, &[Message::new(1, None, "gm")], &live())
            .await
            .is_none());
        assert_eq!(backend.calls().len(), 1);
    }
}
