//! Chat message model and de-duplication fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Origin of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// Authored by the visitor.
    Visitor,
    /// Authored by an agent.
    Agent,
    /// Generated by the system (e.g. "visitor waiting").
    System,
}

impl SenderKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Visitor => "visitor",
            Self::Agent => "agent",
            Self::System => "system",
        }
    }
}

/// One inbound chat message as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Transport-assigned message identifier.
    pub id: String,
    /// Conversation this message belongs to.
    pub chat_id: String,
    /// Message origin.
    pub sender_kind: SenderKind,
    /// Message body.
    pub content: String,
    /// Server-side send time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Whether the message carries enough data to be dispatched.
    ///
    /// Partial payloads arrive during reconnect churn; they are skipped
    /// rather than rejected since notification is best-effort.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && !self.chat_id.is_empty()
    }
}

/// Derived composite key identifying a unique message for de-duplication.
///
/// Computed over chat id, sender kind, timestamp, and content, so a replay
/// of the same message after a reconnect collapses onto one fingerprint
/// even when the transport assigns it a fresh delivery id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for a message.
    #[must_use]
    pub fn of(message: &Message) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(message.chat_id.as_bytes());
        hasher.update(message.sender_kind.as_str().as_bytes());
        hasher.update(message.timestamp.to_rfc3339().as_bytes());
        hasher.update(message.content.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex digest, usable as an external notification id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
