//! Upload session coordinator.
//!
//! Drives the four-phase upload protocol with per-file throttling and
//! idempotency. A throttle lock keyed by [`FileKey`] rejects duplicate
//! attempts inside the debounce window without issuing a network call; the
//! lock always self-expires afterwards, so a failed upload can never lock a
//! file key out permanently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::upload::{FileKey, FileMeta, UploadPhase, UploadSession, UploadStatus};
use crate::upload::client::UploadClient;
use crate::{AppError, Result};

/// Coordinator owning the throttle-lock map and the per-key upload
/// sessions. Scoped to one agent session instance — no cross-tab state.
pub struct UploadCoordinator {
    client: Arc<UploadClient>,
    debounce: Duration,
    locks: Arc<Mutex<HashMap<FileKey, Instant>>>,
    sessions: Mutex<HashMap<FileKey, UploadSession>>,
}

impl UploadCoordinator {
    /// Create a coordinator with the given debounce window.
    #[must_use]
    pub fn new(client: Arc<UploadClient>, debounce: Duration) -> Self {
        Self {
            client,
            debounce,
            locks: Arc::new(Mutex::new(HashMap::new())),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Run one logical upload attempt: create session, then direct
    /// multipart transfer. One idempotency key covers both calls and any
    /// internal retry; a fresh `upload` call is a new attempt with a new
    /// key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Throttled`] when an attempt for the same file
    /// key is still inside the debounce window (no network call is made),
    /// or [`AppError::Upload`] when the service rejects the attempt. The
    /// throttle lock self-expires in both cases.
    pub async fn upload(&self, meta: &FileMeta, bytes: Vec<u8>) -> Result<UploadStatus> {
        let key = meta.file_key();
        self.stamp_lock(&key).await?;

        let idempotency_key = Uuid::new_v4().to_string();
        info!(file_key = %key, idempotency_key = %idempotency_key, "upload attempt started");

        let result = self.run_protocol(&key, meta, bytes, &idempotency_key).await;

        // Refresh the stamp so the window counts from completion, then hand
        // the key to the deferred cleanup. Runs on success and failure alike.
        self.schedule_release(key).await;
        result
    }

    /// Poll the server-side status of an upload session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` when the poll fails.
    pub async fn poll_status(&self, session_id: &str) -> Result<UploadStatus> {
        self.client.status(session_id).await
    }

    /// Cancel an upload session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` when the cancellation fails.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        self.client.cancel(session_id).await
    }

    /// The tracked upload session for a file key, if one exists.
    pub async fn session_for(&self, key: &FileKey) -> Option<UploadSession> {
        self.sessions.lock().await.get(key).cloned()
    }

    async fn run_protocol(
        &self,
        key: &FileKey,
        meta: &FileMeta,
        bytes: Vec<u8>,
        idempotency_key: &str,
    ) -> Result<UploadStatus> {
        self.track(key, idempotency_key, UploadPhase::Pending).await;

        // One retry per step, reusing the idempotency key so the service
        // deduplicates server-side.
        let descriptor = match self.client.create_session(meta, idempotency_key).await {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(file_key = %key, %err, "create session failed; retrying once");
                self.client.create_session(meta, idempotency_key).await?
            }
        };

        self.track(key, idempotency_key, UploadPhase::Uploading).await;

        let status = match self
            .client
            .direct_upload(&descriptor.id, meta, bytes.clone(), idempotency_key)
            .await
        {
            Ok(status) => status,
            Err(err) => {
                warn!(file_key = %key, %err, "direct upload failed; retrying once");
                self.client
                    .direct_upload(&descriptor.id, meta, bytes, idempotency_key)
                    .await?
            }
        };

        self.track(key, idempotency_key, status.phase).await;
        info!(file_key = %key, session_id = %status.id, phase = ?status.phase, "upload attempt finished");
        Ok(status)
    }

    /// Reject the attempt if the key's lock is younger than the debounce
    /// window; otherwise stamp the lock for this attempt.
    async fn stamp_lock(&self, key: &FileKey) -> Result<()> {
        let mut locks = self.locks.lock().await;
        if let Some(stamp) = locks.get(key) {
            if stamp.elapsed() < self.debounce {
                debug!(file_key = %key, "upload attempt inside debounce window");
                return Err(AppError::Throttled(format!(
                    "upload for {key} attempted within the debounce window"
                )));
            }
        }
        locks.insert(key.clone(), Instant::now());
        Ok(())
    }

    /// Refresh the lock stamp and schedule its removal after the debounce
    /// window. The cleanup task is deliberately not tied to any
    /// cancellation token: its only effect is releasing the lock, and it
    /// must run even when the upload failed or the session is tearing down.
    async fn schedule_release(&self, key: FileKey) {
        let stamp = Instant::now();
        self.locks.lock().await.insert(key.clone(), stamp);

        let locks = Arc::clone(&self.locks);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let mut locks = locks.lock().await;
            // A newer attempt may have re-stamped the key; only the attempt
            // that wrote this stamp may release it.
            if locks.get(&key).copied() == Some(stamp) {
                locks.remove(&key);
                debug!(file_key = %key, "throttle lock released");
            }
        });
    }

    async fn track(&self, key: &FileKey, idempotency_key: &str, phase: UploadPhase) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            key.clone(),
            UploadSession {
                file_key: key.clone(),
                idempotency_key: idempotency_key.to_owned(),
                phase,
                last_attempt_at: Utc::now(),
            },
        );
    }
}
