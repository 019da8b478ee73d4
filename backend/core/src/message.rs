use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix the protocol uses for ids of locally composed messages.
const OUTGOING_ID_PREFIX: &str = "3EB0";

/// Identifies a single chat message as delivered by the protocol layer.
///
/// `id` is assigned by the remote side and must be treated as untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub remote_jid: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
}

impl MessageInfo {
    pub fn new(id: impl Into<String>, remote_jid: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            remote_jid: remote_jid.into(),
            timestamp: Utc::now(),
            from_me: false,
            push_name: None,
        }
    }

    /// Info for a message composed locally and about to be sent to `remote_jid`.
    ///
    /// Generated ids are uppercase hex, so they always pass the path-safety check.
    pub fn outgoing(remote_jid: impl Into<String>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
        Self {
            id: format!("{OUTGOING_ID_PREFIX}{}", &suffix[..16]),
            remote_jid: remote_jid.into(),
            timestamp: Utc::now(),
            from_me: true,
            push_name: None,
        }
    }
}

/// A unit handed to the host's notification surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<MessageInfo>,
    pub system: bool,
}

impl NotificationEvent {
    /// Informational notice shown in the conversation of `info`.
    pub fn system_for(info: &MessageInfo, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            info: Some(info.clone()),
            system: true,
        }
    }

    /// Error shown in the conversation of `info`.
    pub fn conversation_error(info: &MessageInfo, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            info: Some(info.clone()),
            system: false,
        }
    }

    pub fn is_error(&self) -> bool {
        !self.system
    }
}
