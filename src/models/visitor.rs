//! Visitor session model and the six-bucket queue state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One anonymous end-user in the chat queue, awaiting or engaged with an
/// agent. Belongs to exactly one [`Bucket`] at any time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSession {
    /// Unique visitor identifier.
    pub id: String,
    /// Agent currently serving this visitor, if any.
    #[serde(default)]
    pub assigned_agent_id: Option<String>,
    /// When the visitor entered the queue.
    pub joined_at: DateTime<Utc>,
    /// Last visitor activity (message, page change, typing).
    pub last_activity_at: DateTime<Utc>,
}

/// The six visitor-lifecycle buckets. Bucket membership is a partition of
/// the visitor id space relevant to one agent session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    /// Visitor in an active conversation.
    Active,
    /// Visitor idle in an open conversation.
    Idle,
    /// Visitor waiting for a first response.
    Incoming,
    /// Visitor served by this agent right now.
    CurrentlyServed,
    /// Visitor mid-transfer to another agent.
    PendingTransfer,
    /// Visitor with an outstanding chat invite.
    PendingInvite,
}

impl Bucket {
    /// All buckets in a fixed iteration order.
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::Idle,
        Self::Incoming,
        Self::CurrentlyServed,
        Self::PendingTransfer,
        Self::PendingInvite,
    ];
}

/// Snapshot of the full visitor queue, delivered as one atomic payload by
/// the external transport and swapped wholesale — never merged field by
/// field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    /// Visitors in active conversations.
    #[serde(default)]
    pub active: Vec<VisitorSession>,
    /// Visitors idle in open conversations.
    #[serde(default)]
    pub idle: Vec<VisitorSession>,
    /// Visitors waiting for a first response.
    #[serde(default)]
    pub incoming: Vec<VisitorSession>,
    /// Visitors served by this agent right now.
    #[serde(default)]
    pub currently_served: Vec<VisitorSession>,
    /// Visitors mid-transfer to another agent.
    #[serde(default)]
    pub pending_transfer: Vec<VisitorSession>,
    /// Visitors with outstanding chat invites.
    #[serde(default)]
    pub pending_invite: Vec<VisitorSession>,
    /// Whether the transport is still loading the initial snapshot.
    #[serde(default)]
    pub loading: bool,
}

impl QueueState {
    /// Borrow the ordered collection for one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> &Vec<VisitorSession> {
        match bucket {
            Bucket::Active => &self.active,
            Bucket::Idle => &self.idle,
            Bucket::Incoming => &self.incoming,
            Bucket::CurrentlyServed => &self.currently_served,
            Bucket::PendingTransfer => &self.pending_transfer,
            Bucket::PendingInvite => &self.pending_invite,
        }
    }

    /// Mutably borrow the ordered collection for one bucket.
    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<VisitorSession> {
        match bucket {
            Bucket::Active => &mut self.active,
            Bucket::Idle => &mut self.idle,
            Bucket::Incoming => &mut self.incoming,
            Bucket::CurrentlyServed => &mut self.currently_served,
            Bucket::PendingTransfer => &mut self.pending_transfer,
            Bucket::PendingInvite => &mut self.pending_invite,
        }
    }

    /// Which bucket currently holds the given visitor id, if any.
    #[must_use]
    pub fn bucket_of(&self, id: &str) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| self.bucket(*bucket).iter().any(|v| v.id == id))
    }

    /// Whether any bucket holds the given visitor id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.bucket_of(id).is_some()
    }

    /// Whether every visitor id appears in at most one bucket.
    #[must_use]
    pub fn is_partition(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        Bucket::ALL
            .into_iter()
            .flat_map(|bucket| self.bucket(bucket).iter())
            .all(|visitor| seen.insert(visitor.id.as_str()))
    }
}
