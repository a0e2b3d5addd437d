//! Message notification engine.
//!
//! Deduplicates inbound messages by fingerprint and decides sound and
//! desktop-notification dispatch. The transport delivers at-least-once —
//! reconnects replay recent messages — so every dispatch decision is gated
//! on a fingerprint the engine has not recorded before.
//!
//! Notification is a best-effort UX feature: malformed or partial message
//! data skips dispatch and never produces an error.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::message::{Fingerprint, Message, SenderKind};
use crate::notify::text;

/// Sound class to play for a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    /// Message arrived in the currently open chat.
    Message,
    /// Visitor-originated event in a background chat.
    Alert,
}

/// Audio output seam. The host application owns actual playback.
pub trait SoundPlayer: Send + Sync {
    /// Play one sound of the given class.
    fn play(&self, sound: Sound);
}

/// Desktop notification seam. The collaborator guarantees idempotent
/// display per id ("show once per id"), so replays with the same
/// fingerprint are safe even across engine instances.
pub trait DesktopNotifier: Send + Sync {
    /// Show a notification at most once for the given id.
    fn show_once(&self, id: &str, title: &str, body: &str);
}

/// Outcome of a [`NotificationEngine::notify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Message data was malformed or partial; nothing dispatched.
    Skipped,
    /// Fingerprint already recorded; nothing dispatched.
    Duplicate,
    /// Fingerprint recorded and dispatch rules evaluated.
    Delivered {
        /// Sound class played, if any.
        sound: Option<Sound>,
        /// Whether a desktop notification was raised.
        desktop: bool,
    },
}

/// Owner of the per-session fingerprint set and dispatch rules.
///
/// The set is bounded: once `capacity` fingerprints are retained the oldest
/// are evicted first, keeping memory flat for very long-lived sessions.
pub struct NotificationEngine {
    sounds: Arc<dyn SoundPlayer>,
    desktop: Arc<dyn DesktopNotifier>,
    seen: HashSet<Fingerprint>,
    order: VecDeque<Fingerprint>,
    capacity: usize,
    tab_hidden: bool,
}

impl NotificationEngine {
    /// Create an engine bound to one chat session's lifetime.
    #[must_use]
    pub fn new(
        capacity: usize,
        sounds: Arc<dyn SoundPlayer>,
        desktop: Arc<dyn DesktopNotifier>,
    ) -> Self {
        Self {
            sounds,
            desktop,
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            tab_hidden: false,
        }
    }

    /// Update the tab visibility input. Desktop notifications are only
    /// raised while the tab is hidden.
    pub fn set_tab_hidden(&mut self, hidden: bool) {
        self.tab_hidden = hidden;
    }

    /// Process one inbound message and dispatch sound/desktop notifications.
    ///
    /// Idempotent under replays: N deliveries of the same message produce
    /// exactly one sound and at most one desktop notification.
    pub fn notify(
        &mut self,
        message: &Message,
        active_chat_id: Option<&str>,
        is_visitor_left: bool,
    ) -> Dispatch {
        if !message.is_well_formed() {
            warn!("partial message payload; dispatch skipped");
            return Dispatch::Skipped;
        }

        let fingerprint = Fingerprint::of(message);
        if self.seen.contains(&fingerprint) {
            debug!(chat_id = %message.chat_id, "duplicate message; dispatch suppressed");
            return Dispatch::Duplicate;
        }
        self.record(fingerprint.clone());

        let in_active_chat = active_chat_id == Some(message.chat_id.as_str());
        // Visitor-originated covers visitor messages, visitor-left, and the
        // system "visitor waiting" event. Agent-authored traffic in
        // background chats never alerts — that would be self-notification.
        let visitor_originated = is_visitor_left
            || matches!(message.sender_kind, SenderKind::Visitor | SenderKind::System);

        let sound = if in_active_chat {
            Some(Sound::Message)
        } else if visitor_originated {
            Some(Sound::Alert)
        } else {
            None
        };

        if let Some(sound) = sound {
            self.sounds.play(sound);
        }

        let desktop = self.tab_hidden && sound.is_some();
        if desktop {
            let (title, body) = text::notification_copy(message, is_visitor_left);
            self.desktop.show_once(fingerprint.as_str(), &title, &body);
        }

        Dispatch::Delivered { sound, desktop }
    }

    /// Number of fingerprints currently retained.
    #[must_use]
    pub fn fingerprint_count(&self) -> usize {
        self.seen.len()
    }

    fn record(&mut self, fingerprint: Fingerprint) {
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(fingerprint.clone());
        self.seen.insert(fingerprint);
    }
}
