//! Live agent session assembly.
//!
//! [`AgentSession`] owns one agent's live session core: the visitor queue,
//! the notification engine, the upload coordinator, the referrer cell, and
//! the connection monitor. All mutable state is scoped to the instance —
//! there are no process-wide globals and no cross-tab synchronization; one
//! session exists per tab/process.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::channel::InboundChannel;
use crate::config::SessionConfig;
use crate::connection::{
    ConnectionEvent, ConnectionMonitor, HttpProbe, MonitorHandle, NetworkSignal, Reachability,
};
use crate::models::connection::ConnectionPhase;
use crate::models::message::Message;
use crate::models::referrer::ReferrerInfo;
use crate::models::upload::{FileMeta, UploadStatus};
use crate::models::visitor::{Bucket, QueueState};
use crate::notify::{DesktopNotifier, Dispatch, NotificationEngine, SoundPlayer};
use crate::presence::{ClockHandle, DurationClock};
use crate::queue::QueueManager;
use crate::upload::{UploadClient, UploadCoordinator};
use crate::Result;

const EVENT_CAPACITY: usize = 16;

/// External queue snapshot channel: the transport that delivers the full
/// six-bucket payload on demand.
pub trait SnapshotSource: Send + Sync {
    /// Fetch a fresh queue snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport cannot produce a snapshot; the
    /// resync wiring logs and leaves the current queue in place.
    fn fetch(&self) -> Pin<Box<dyn Future<Output = Result<QueueState>> + Send + '_>>;
}

/// One agent's live session core with explicit construction and teardown.
pub struct AgentSession {
    config: SessionConfig,
    queue: Arc<Mutex<QueueManager>>,
    notifications: Mutex<NotificationEngine>,
    uploads: Arc<UploadCoordinator>,
    inbound: Mutex<InboundChannel>,
    monitor: MonitorHandle,
    cancel: CancellationToken,
    resync_task: Option<JoinHandle<()>>,
}

impl AgentSession {
    /// Start a session with the production HTTP reachability probe.
    #[must_use]
    pub fn start(
        config: SessionConfig,
        snapshots: Arc<dyn SnapshotSource>,
        sounds: Arc<dyn SoundPlayer>,
        desktop: Arc<dyn DesktopNotifier>,
    ) -> Self {
        let probe: Arc<dyn Reachability> = Arc::new(HttpProbe::new(config.probe_url.clone()));
        Self::start_with_probe(config, snapshots, sounds, desktop, probe)
    }

    /// Start a session with an explicit reachability probe (test seam).
    #[must_use]
    pub fn start_with_probe(
        config: SessionConfig,
        snapshots: Arc<dyn SnapshotSource>,
        sounds: Arc<dyn SoundPlayer>,
        desktop: Arc<dyn DesktopNotifier>,
        probe: Arc<dyn Reachability>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);

        let monitor = ConnectionMonitor::new(
            probe,
            Duration::from_millis(config.probe_retry_ms),
            event_tx,
            cancel.child_token(),
        )
        .spawn();

        let queue = Arc::new(Mutex::new(QueueManager::new()));
        let resync_task = Self::spawn_resync_wiring(
            Arc::clone(&queue),
            snapshots,
            event_rx,
            cancel.child_token(),
        );

        let uploads = Arc::new(UploadCoordinator::new(
            Arc::new(UploadClient::new(config.upload_base_url.clone())),
            Duration::from_millis(config.debounce_ms),
        ));

        let notifications =
            Mutex::new(NotificationEngine::new(config.fingerprint_capacity, sounds, desktop));

        info!("agent session started");

        Self {
            config,
            queue,
            notifications,
            uploads,
            inbound: Mutex::new(InboundChannel::new()),
            monitor,
            cancel,
            resync_task: Some(resync_task),
        }
    }

    /// Consume recovery events and refresh the queue from the snapshot
    /// source. A failed fetch leaves the current queue in place; the next
    /// recovery retries.
    fn spawn_resync_wiring(
        queue: Arc<Mutex<QueueManager>>,
        snapshots: Arc<dyn SnapshotSource>,
        mut event_rx: mpsc::Receiver<ConnectionEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(
            async move {
                loop {
                    let event = tokio::select! {
                        () = cancel.cancelled() => return,
                        event = event_rx.recv() => {
                            let Some(event) = event else { return };
                            event
                        }
                    };

                    match event {
                        ConnectionEvent::ResyncRequired => match snapshots.fetch().await {
                            Ok(snapshot) => {
                                queue.lock().await.replace_queue(snapshot);
                                info!("queue resynced after reconnect");
                            }
                            Err(err) => warn!(%err, "queue resync fetch failed"),
                        },
                    }
                }
            }
            .instrument(info_span!("resync_wiring")),
        )
    }

    // ── Queue ───────────────────────────────────────────

    /// Atomically replace the queue with a fresh snapshot.
    pub async fn replace_queue(&self, snapshot: QueueState) {
        self.queue.lock().await.replace_queue(snapshot);
    }

    /// Move a visitor between buckets.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::InvalidTransition`] when the visitor is
    /// not in the source bucket.
    pub async fn move_visitor(&self, id: &str, from: Bucket, to: Bucket) -> Result<()> {
        self.queue.lock().await.move_visitor(id, from, to)
    }

    /// Open a chat, making it the active conversation.
    pub async fn open_chat(&self, chat_id: &str) {
        self.queue.lock().await.open_chat(chat_id);
    }

    /// Close the active chat.
    pub async fn close_chat(&self) {
        self.queue.lock().await.close_chat();
    }

    /// Record an unread message for a room.
    pub async fn record_unread(&self, room_id: &str) {
        self.queue.lock().await.record_unread(room_id);
    }

    /// Update the typing flag for a room.
    pub async fn set_typing(&self, room_id: &str, typing: bool) {
        self.queue.lock().await.set_typing(room_id, typing);
    }

    /// Id of the currently open chat, if any.
    pub async fn active_chat_id(&self) -> Option<String> {
        self.queue.lock().await.active_chat_id().map(str::to_owned)
    }

    /// Unread message count for a room.
    pub async fn unread_count(&self, room_id: &str) -> u32 {
        self.queue.lock().await.unread_count(room_id)
    }

    /// Whether the visitor in a room is typing.
    pub async fn is_typing(&self, room_id: &str) -> bool {
        self.queue.lock().await.is_typing(room_id)
    }

    /// Current queue state (cloned).
    pub async fn queue_state(&self) -> QueueState {
        self.queue.lock().await.state().clone()
    }

    // ── Notifications ───────────────────────────────────

    /// Process one inbound message against the active chat and dispatch
    /// sound/desktop notifications.
    pub async fn notify(&self, message: &Message, is_visitor_left: bool) -> Dispatch {
        let active_chat_id = self.active_chat_id().await;
        self.notifications
            .lock()
            .await
            .notify(message, active_chat_id.as_deref(), is_visitor_left)
    }

    /// Update the tab visibility input for desktop notification gating.
    pub async fn set_tab_hidden(&self, hidden: bool) {
        self.notifications.lock().await.set_tab_hidden(hidden);
    }

    // ── Uploads ─────────────────────────────────────────

    /// Run one upload attempt through the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Throttled`] inside the debounce window or
    /// [`crate::AppError::Upload`] on service failure.
    pub async fn upload(&self, meta: &FileMeta, bytes: Vec<u8>) -> Result<UploadStatus> {
        self.uploads.upload(meta, bytes).await
    }

    /// Poll an upload session's status.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Upload`] when the poll fails.
    pub async fn poll_upload(&self, session_id: &str) -> Result<UploadStatus> {
        self.uploads.poll_status(session_id).await
    }

    /// Cancel an upload session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Upload`] when the cancellation fails.
    pub async fn cancel_upload(&self, session_id: &str) -> Result<()> {
        self.uploads.cancel(session_id).await
    }

    // ── Connection ──────────────────────────────────────

    /// Feed a browser network signal into the connection monitor.
    pub async fn network_signal(&self, signal: NetworkSignal) {
        self.monitor.signal(signal).await;
    }

    /// Current connection phase (drives the offline indicator).
    #[must_use]
    pub fn connection_phase(&self) -> ConnectionPhase {
        self.monitor.phase()
    }

    /// Subscribe to connection phase changes.
    #[must_use]
    pub fn phase_updates(&self) -> tokio::sync::watch::Receiver<ConnectionPhase> {
        self.monitor.phase_updates()
    }

    // ── Cross-context channel ───────────────────────────

    /// Accept a raw cross-context message (JSON string form).
    pub async fn accept_widget_message(&self, raw: &str) -> bool {
        self.inbound.lock().await.accept_str(raw)
    }

    /// Accept an already-parsed cross-context message.
    pub async fn accept_widget_value(&self, value: &serde_json::Value) -> bool {
        self.inbound.lock().await.accept_value(value)
    }

    /// The last recognized referrer update, if any.
    pub async fn referrer(&self) -> Option<ReferrerInfo> {
        self.inbound.lock().await.referrer().cloned()
    }

    // ── Presence ────────────────────────────────────────

    /// Spawn a presence duration clock for one visitor, torn down with the
    /// session.
    #[must_use]
    pub fn presence_clock(
        &self,
        created_at: DateTime<Utc>,
        server_offset: chrono::Duration,
    ) -> ClockHandle {
        DurationClock::new(
            created_at,
            server_offset,
            Duration::from_millis(self.config.duration_tick_ms),
            self.cancel.child_token(),
        )
        .spawn()
    }

    // ── Teardown ────────────────────────────────────────

    /// Tear the session down: cancels the monitor, resync wiring, and any
    /// presence clocks. In-flight debounce cleanups for already-dispatched
    /// uploads run to completion — their only effect is releasing a lock.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.resync_task.take() {
            let _ = task.await;
        }
        info!("agent session shut down");
    }
}
