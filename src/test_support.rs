//! Test doubles for the analysis backend and notifier.

use crate::backend::{AnalysisBackend, AnalysisRequest, PromptKind};
use crate::error::{BackendError, NotifyError};
use crate::notifier::Notifier;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Fail,
    Stall,
}

/// A backend call as seen by [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: PromptKind,
    pub user_text: String,
    pub max_tokens: u32,
}

/// Backend whose behavior is keyed on substrings of the request payload.
///
/// Requests matching no rule are echoed back as `[<kind>] <user text>`.
#[derive(Default)]
pub struct ScriptedBackend {
    rules: Vec<(String, Behavior)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_on(mut self, marker: &str, reply: &str) -> Self {
        self.rules
            .push((marker.to_string(), Behavior::Reply(reply.to_string())));
        self
    }

    pub fn fail_on(mut self, marker: &str) -> Self {
        self.rules.push((marker.to_string(), Behavior::Fail));
        self
    }

    /// Never answer requests containing `marker`.
    pub fn stall_on(mut self, marker: &str) -> Self {
        self.rules.push((marker.to_string(), Behavior::Stall));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: PromptKind) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == kind)
            .collect()
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn complete(&self, request: AnalysisRequest<'_>) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(RecordedCall {
            kind: request.kind,
            user_text: request.user_text.clone(),
            max_tokens: request.max_tokens,
        });

        let behavior = self
            .rules
            .iter()
            .find(|(marker, _)| request.user_text.contains(marker.as_str()))
            .map(|(_, behavior)| behavior.clone());

        match behavior {
            Some(Behavior::Reply(text)) => Ok(text),
            Some(Behavior::Fail) => Err(BackendError::Transport("connection reset".to_string())),
            Some(Behavior::Stall) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Ok(format!("[{}] {}", request.kind, request.user_text)),
        }
    }
}

/// Notifier that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}
