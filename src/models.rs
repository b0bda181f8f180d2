//! Data models for the chat monitor.
//!
//! This module contains the core data structures that flow through the
//! windowing pipeline: inbound messages, per-group reports and the
//! cross-group summary.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Identifier of a chat group (channel or chat id on the source network).
pub type GroupId = i64;

/// Snapshot of one window: every group's messages in arrival order.
pub type Window = HashMap<GroupId, Vec<Message>>;

/// A single inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// Group the message was posted in.
    pub group_id: GroupId,
    /// Sender of the message. `None` when the source could not resolve it.
    #[serde(default, deserialize_with = "deserialize_sender")]
    pub sender_id: Option<i64>,
    /// Message body as received.
    pub text: String,
    /// Time the message was received by the source.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Create a message received now.
    pub fn new(group_id: GroupId, sender_id: Option<i64>, text: impl Into<String>) -> Self {
        Self {
            group_id,
            sender_id: sender_id.filter(|id| *id != 0),
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// Returns the sender tag used in rendered chat logs (`U42` or `U?`).
    pub fn sender_tag(&self) -> String {
        match self.sender_id {
            Some(id) => format!("U{}", id),
            None => "U?".to_string(),
        }
    }
}

/// Zero is the "unknown sender" placeholder used by chat sources.
fn deserialize_sender<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.filter(|id| *id != 0))
}

/// Analysis output for one group in one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub group_id: GroupId,
    pub text: String,
}

impl GroupReport {
    pub fn new(group_id: GroupId, text: impl Into<String>) -> Self {
        Self {
            group_id,
            text: text.into(),
        }
    }
}

impl fmt::Display for GroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group {} Report:\n{}", self.group_id, self.text)
    }
}

/// Cross-group rollup of all reports produced in one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSummary {
    pub text: String,
}

impl GlobalSummary {
    /// Text handed to the notifier.
    pub fn notification_text(&self) -> String {
        format!("Global Summary:\n{}", self.text)
    }
}

/// What a single tick of the coordinator accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The window had no messages; nothing was dispatched.
    Empty,
    /// Groups were processed but none produced a report.
    NoReports { groups: usize },
    /// Reports were aggregated into a summary.
    Summarized {
        groups: usize,
        reports: usize,
        summary: GlobalSummary,
    },
    /// Reports were produced but the rollup failed.
    AggregationFailed { groups: usize, reports: usize },
    /// Shutdown interrupted the tick; nothing was aggregated or sent.
    Cancelled { groups: usize },
}

impl TickOutcome {
    /// Returns the summary produced by this tick, if any.
    pub fn summary(&self) -> Option<&GlobalSummary> {
        match self {
            TickOutcome::Summarized { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_tag() {
        assert_eq!(Message::new(1, Some(42), "hi there").sender_tag(), "U42");
        assert_eq!(Message::new(1, None, "hi there").sender_tag(), "U?");
        // Zero is the unresolved placeholder
        assert_eq!(Message::new(1, Some(0), "hi there").sender_tag(), "U?");
    }

    #[test]
    fn test_message_deserialize_defaults() {
        let msg: Message = serde_json::from_str(r#"{"group_id": -100, "text": "gm all"}"#).unwrap();
        assert_eq!(msg.group_id, -100);
        assert_eq!(msg.sender_id, None);
        assert_eq!(msg.text, "gm all");

        let msg: Message =
            serde_json::from_str(r#"{"group_id": 7, "sender_id": 0, "text": "x"}"#).unwrap();
        assert_eq!(msg.sender_id, None);
    }

    #[test]
    fn test_message_deserialize_timestamp() {
        let msg: Message = serde_json::from_str(
            r#"{"group_id": 7, "sender_id": 9, "text": "btc pumping", "received_at": "2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.sender_id, Some(9));
        assert_eq!(msg.received_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn test_report_display() {
        let report = GroupReport::new(12, "ETH chatter");
        assert_eq!(report.to_string(), "Group 12 Report:\nETH chatter");
    }

    #[test]
    fn test_tick_outcome_summary() {
        assert!(TickOutcome::Empty.summary().is_none());
        assert!(TickOutcome::Cancelled { groups: 3 }.summary().is_none());
        let outcome = TickOutcome::Summarized {
            groups: 2,
            reports: 2,
            summary: GlobalSummary {
                text: "all quiet".to_string(),
            },
        };
        assert_eq!(outcome.summary().map(|s| s.text.as_str()), Some("all quiet"));
    }
}
