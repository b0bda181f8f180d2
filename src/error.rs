//! Error types for the collaborator seams.
//!
//! Every error here is contained at the component that produced it; the
//! window coordinator only ever sees "no result".

use std::time::Duration;
use thiserror::Error;

/// Failure of a single analysis backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("cannot connect to analysis backend at {0}")]
    Connect(String),

    #[error("failed to send request: {0}")]
    Transport(String),

    #[error("analysis backend error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse backend response: {0}")]
    Decode(String),

    #[error("analysis response is empty")]
    EmptyResponse,

    #[error("request cancelled by shutdown")]
    Cancelled,
}

/// Failure to deliver a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to send notification: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Failure of the cross-group rollup.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("nothing to aggregate")]
    NoReports,

    #[error("global summary failed: {0}")]
    Backend(#[from] BackendError),
}

/// Failure of the message source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open input {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),
}
