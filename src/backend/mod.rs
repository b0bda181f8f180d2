//! Analysis backend interface.
//!
//! The windowing engine only knows the [`AnalysisBackend`] trait: text in,
//! prose out. Prompts are carried as named [`PromptTemplate`] values so the
//! per-group and rollup calls differ only in configuration.

pub mod openai;
pub mod prompts;

pub use openai::OpenAiBackend;

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Which of the two prompt configurations a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Analysis of one group's chat log.
    Group,
    /// Rollup of all group reports in a window.
    Summary,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::Group => write!(f, "group"),
            PromptKind::Summary => write!(f, "summary"),
        }
    }
}

/// A single request to the analysis backend.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub kind: PromptKind,
    pub system_prompt: &'a str,
    pub user_text: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Opaque text-analysis service.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Run one completion. Implementations must be cancel-safe: the caller
    /// drops the future when its timeout elapses or shutdown begins.
    async fn complete(&self, request: AnalysisRequest<'_>) -> Result<String, BackendError>;
}

/// Prompt configuration for one kind of analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub kind: PromptKind,
    /// System prompt describing the analyst role and output format.
    pub system: String,
    /// Line placed before the payload in the user message.
    pub user_preamble: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound for the whole call, including retries inside the client.
    pub timeout: Duration,
}

impl PromptTemplate {
    /// Default per-group analysis prompt.
    pub fn group() -> Self {
        Self {
            kind: PromptKind::Group,
            system: prompts::GROUP_BRIEFING.to_string(),
            user_preamble: prompts::GROUP_PREAMBLE.to_string(),
            max_tokens: 800,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        }
    }

    /// Default cross-group rollup prompt.
    pub fn summary() -> Self {
        Self {
            kind: PromptKind::Summary,
            system: prompts::SUMMARY_BRIEFING.to_string(),
            user_preamble: prompts::SUMMARY_PREAMBLE.to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            timeout: Duration::from_secs(45),
        }
    }

    /// Build a request carrying `payload` under this template.
    pub fn request(&self, payload: &str) -> AnalysisRequest<'_> {
        AnalysisRequest {
            kind: self.kind,
            system_prompt: &self.system,
            user_text: format!("{}\n\n{}", self.user_preamble, payload),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Apply overrides from the config file on top of this template.
    pub fn with_overrides(mut self, overrides: &PromptOverrides) -> Self {
        if let Some(ref system) = overrides.system {
            self.system = system.clone();
        }
        if let Some(ref preamble) = overrides.user_preamble {
            self.user_preamble = preamble.clone();
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(secs) = overrides.timeout_seconds {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }
}

/// Optional per-field overrides of a [`PromptTemplate`], as read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_preamble: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// Run `payload` through the backend under the template's timeout.
///
/// The call is abandoned with [`BackendError::Cancelled`] as soon as
/// `cancel` fires. A blank response counts as a failure.
pub async fn complete_within(
    backend: &dyn AnalysisBackend,
    template: &PromptTemplate,
    payload: &str,
    cancel: &CancellationToken,
) -> Result<String, BackendError> {
    let request = template.request(payload);
    debug!(
        "Sending {} analysis request ({} chars, max {} tokens)",
        template.kind,
        request.user_text.len(),
        template.max_tokens
    );

    let call = tokio::time::timeout(template.timeout, backend.complete(request));
    let text = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BackendError::Cancelled),
        result = call => result.map_err(|_| BackendError::Timeout(template.timeout))??,
    };

    if text.trim().is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;

    #[test]
    fn test_default_templates() {
        let group = PromptTemplate::group();
        let summary = PromptTemplate::summary();

        assert_eq!(group.max_tokens, 800);
        assert_eq!(summary.max_tokens, 1000);
        assert_eq!(group.temperature, 0.3);
        assert_eq!(summary.temperature, 0.3);
        assert_eq!(group.timeout, Duration::from_secs(30));
        assert_eq!(summary.timeout, Duration::from_secs(45));
        assert_ne!(group.system, summary.system);
    }

    #[test]
    fn test_request_includes_preamble() {
        let template = PromptTemplate::group();
        let request = template.request("U1: hello world");

        assert_eq!(request.kind, PromptKind::Group);
        assert!(request.user_text.starts_with(prompts::GROUP_PREAMBLE));
        assert!(request.user_text.ends_with("U1: hello world"));
    }

    #[test]
    fn test_overrides() {
        let overrides = PromptOverrides {
            max_tokens: Some(256),
            timeout_seconds: Some(5),
            ..Default::default()
        };
        let template = PromptTemplate::summary().with_overrides(&overrides);

        assert_eq!(template.max_tokens, 256);
        assert_eq!(template.timeout, Duration::from_secs(5));
        assert_eq!(template.system, prompts::SUMMARY_BRIEFING);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_within_times_out() {
        let backend = ScriptedBackend::new().stall_on("slow");
        let cancel = CancellationToken::new();
        let err = complete_within(&backend, &PromptTemplate::group(), "slow", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_within_stops_on_cancel() {
        let backend = ScriptedBackend::new().stall_on("slow");
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let err = complete_within(&backend, &PromptTemplate::group(), "slow", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Cancelled));
        // Returned at cancellation, well before the 30s timeout
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_complete_within_rejects_blank() {
        let backend = ScriptedBackend::new().reply_on("quiet", "   \n");
        let cancel = CancellationToken::new();
        let err = complete_within(&backend, &PromptTemplate::group(), "quiet", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::EmptyResponse));
    }
}
