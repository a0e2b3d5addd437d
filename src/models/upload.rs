//! Upload session model and wire DTOs for the upload API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-side description of a file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type reported by the picker.
    pub mime_type: String,
}

impl FileMeta {
    /// Derive the throttle key for this file.
    #[must_use]
    pub fn file_key(&self) -> FileKey {
        FileKey(format!("{}:{}:{}", self.name, self.size, self.mime_type))
    }
}

/// Throttle-lock key derived from name, size, and MIME type. Two picks of
/// the same file map to the same key and share one debounce window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey(String);

impl FileKey {
    /// Key text, used in lock maps and log fields.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of an upload session on the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    /// Session created, no bytes transferred yet.
    Pending,
    /// Transfer in progress.
    Uploading,
    /// Transfer finished and accepted.
    Completed,
    /// Session cancelled by the client.
    Cancelled,
}

/// One logical upload attempt tracked by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Throttle key of the file being uploaded.
    pub file_key: FileKey,
    /// Idempotency key shared by every request of this attempt.
    pub idempotency_key: String,
    /// Last observed phase.
    pub phase: UploadPhase,
    /// When the attempt last touched the network.
    pub last_attempt_at: DateTime<Utc>,
}

/// Session descriptor returned by `POST /chat/uploads/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionDescriptor {
    /// Server-assigned upload session id.
    pub id: String,
    /// Initial phase (normally `pending`).
    pub phase: UploadPhase,
}

/// Status payload returned by the direct-upload and poll endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatus {
    /// Upload session id.
    pub id: String,
    /// Current phase.
    pub phase: UploadPhase,
    /// Download URL once the upload completed.
    #[serde(default)]
    pub url: Option<String>,
}
