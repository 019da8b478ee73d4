//! Media Transfer Event Logger
//!
//! Terminal outcomes of media receive/send flows, written as structured
//! entries on the `media_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferOutcome {
    AlreadyHandled,
    DownloadsDisabled,
    UnsafeIdentifier,
    DownloadFailed { error: String, placeholder_written: bool },
    Inline { bytes: usize },
    Stored { path: String, bytes: usize },
    StoreFailed { error: String },
    Sent { content_type: String },
    SendRejected { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferEvent {
    pub message_id: String,
    pub peer: String,
    pub kind: String,
    #[serde(flatten)]
    pub outcome: TransferOutcome,
}

impl TransferEvent {
    pub fn new(
        message_id: impl Into<String>,
        peer: impl Into<String>,
        kind: impl Into<String>,
        outcome: TransferOutcome,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            peer: peer.into(),
            kind: kind.into(),
            outcome,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: TransferEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact the peer and any free-form error text, then emit the entry.
    pub fn log_transfer(mut event: TransferEvent) -> TransferLogEntry {
        event.peer = redact_sensitive_data(&event.peer);
        match &mut event.outcome {
            TransferOutcome::DownloadFailed { error, .. }
            | TransferOutcome::StoreFailed { error }
            | TransferOutcome::SendRejected { reason: error } => {
                *error = redact_sensitive_data(error);
            }
            _ => {}
        }

        let entry = TransferLogEntry {
            timestamp: Utc::now(),
            event,
        };

        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "media_events", entry = %json, "Media transfer event"),
            Err(_) => info!(target: "media_events", entry = ?entry, "Media transfer event"),
        }
        entry
    }
}
