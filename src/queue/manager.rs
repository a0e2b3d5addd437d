//! Six-bucket visitor presence state machine.
//!
//! The manager exclusively owns the [`QueueState`]. Snapshots from the
//! transport replace it wholesale — a partial merge after a reconnect risks
//! a stale view where a transferred visitor appears in two buckets at once.
//! Discrete moves mutate it during a live session and fail loudly when the
//! client and server have diverged.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::visitor::{Bucket, QueueState, VisitorSession};
use crate::{AppError, Result};

/// Owner of the visitor queue plus the per-room read state the selectors
/// serve (active chat, unread counts, typing flags).
#[derive(Debug, Default)]
pub struct QueueManager {
    state: QueueState,
    active_chat_id: Option<String>,
    unread: HashMap<String, u32>,
    typing: HashMap<String, bool>,
}

impl QueueManager {
    /// Create an empty manager; the queue starts in `loading` until the
    /// first snapshot arrives.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: QueueState {
                loading: true,
                ..QueueState::default()
            },
            ..Self::default()
        }
    }

    /// Atomically replace the whole queue with a fresh snapshot.
    ///
    /// Used after the initial load and after a reconnect-triggered resync.
    /// The post-state equals the snapshot exactly, independent of any
    /// in-flight transition; readers never observe a partially updated
    /// bucket set. Unread counts and typing flags are untouched — the
    /// snapshot covers bucket membership only.
    pub fn replace_queue(&mut self, snapshot: QueueState) {
        info!(
            incoming = snapshot.incoming.len(),
            served = snapshot.currently_served.len(),
            loading = snapshot.loading,
            "queue snapshot applied"
        );
        self.state = snapshot;
    }

    /// Move a visitor from one bucket to another.
    ///
    /// Removes `id` from `from` and appends it to `to`, preserving the
    /// partition invariant.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidTransition`] when `id` is not currently in
    /// `from`. This is reported rather than silently ignored so a
    /// client/server desync surfaces at the call site.
    pub fn move_visitor(&mut self, id: &str, from: Bucket, to: Bucket) -> Result<()> {
        let source = self.state.bucket_mut(from);
        let Some(position) = source.iter().position(|v| v.id == id) else {
            return Err(AppError::InvalidTransition(format!(
                "visitor {id} is not in {from:?}"
            )));
        };

        let visitor = source.remove(position);
        self.state.bucket_mut(to).push(visitor);
        debug!(visitor_id = id, ?from, ?to, "visitor moved");
        Ok(())
    }

    /// Mark a chat as open: it becomes the active chat and its unread count
    /// resets.
    pub fn open_chat(&mut self, chat_id: &str) {
        self.unread.remove(chat_id);
        self.active_chat_id = Some(chat_id.to_owned());
    }

    /// Close the currently open chat, if any.
    pub fn close_chat(&mut self) {
        self.active_chat_id = None;
    }

    /// Record one unread message for a room. Messages for the active chat
    /// are read by definition and not counted.
    pub fn record_unread(&mut self, room_id: &str) {
        if self.active_chat_id.as_deref() == Some(room_id) {
            return;
        }
        *self.unread.entry(room_id.to_owned()).or_insert(0) += 1;
    }

    /// Update the typing flag for a room.
    pub fn set_typing(&mut self, room_id: &str, typing: bool) {
        if typing {
            self.typing.insert(room_id.to_owned(), true);
        } else {
            self.typing.remove(room_id);
        }
    }

    // ── Selectors: pure reads, no side effects ──────────

    /// Id of the chat currently open in the console, if any.
    #[must_use]
    pub fn active_chat_id(&self) -> Option<&str> {
        self.active_chat_id.as_deref()
    }

    /// Unread message count for a room.
    #[must_use]
    pub fn unread_count(&self, room_id: &str) -> u32 {
        self.unread.get(room_id).copied().unwrap_or(0)
    }

    /// Whether the visitor in a room is typing.
    #[must_use]
    pub fn is_typing(&self, room_id: &str) -> bool {
        self.typing.get(room_id).copied().unwrap_or(false)
    }

    /// Look up a visitor across all buckets.
    #[must_use]
    pub fn visitor(&self, id: &str) -> Option<&VisitorSession> {
        Bucket::ALL
            .into_iter()
            .flat_map(|bucket| self.state.bucket(bucket).iter())
            .find(|v| v.id == id)
    }

    /// Whether the initial snapshot is still loading.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.loading
    }

    /// Borrow the current queue state.
    #[must_use]
    pub fn state(&self) -> &QueueState {
        &self.state
    }
}
