//! HTTP client for the four-phase upload API.

use reqwest::multipart;

use crate::models::upload::{FileMeta, UploadSessionDescriptor, UploadStatus};
use crate::{AppError, Result};

/// The upload service deduplicates on either header; both are sent for
/// compatibility with older gateway deployments.
const IDEMPOTENCY_HEADER: &str = "idempotency-key";
const X_IDEMPOTENCY_HEADER: &str = "x-idempotency-key";

/// Client for the upload API: create session, direct multipart upload,
/// poll status, cancel.
pub struct UploadClient {
    client: reqwest::Client,
    base_url: String,
}

impl UploadClient {
    /// Build a client against the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `POST /chat/uploads/sessions` — create an upload session.
    ///
    /// Idempotent: the service collapses repeated creates carrying the same
    /// idempotency key onto one session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` on network failure or a non-success
    /// status.
    pub async fn create_session(
        &self,
        meta: &FileMeta,
        idempotency_key: &str,
    ) -> Result<UploadSessionDescriptor> {
        let body = serde_json::json!({
            "fileName": meta.name,
            "fileSize": meta.size,
            "mimeType": meta.mime_type,
        });

        let response = self
            .client
            .post(format!("{}/chat/uploads/sessions", self.base_url))
            .header(X_IDEMPOTENCY_HEADER, idempotency_key)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// `POST /chat/uploads/direct` — transfer the file bytes as multipart
    /// form data, carrying the same idempotency key as the create call.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` on network failure or a non-success
    /// status.
    pub async fn direct_upload(
        &self,
        session_id: &str,
        meta: &FileMeta,
        bytes: Vec<u8>,
        idempotency_key: &str,
    ) -> Result<UploadStatus> {
        let part = multipart::Part::bytes(bytes)
            .file_name(meta.name.clone())
            .mime_str(&meta.mime_type)
            .map_err(|err| AppError::Upload(format!("invalid mime type: {err}")))?;
        let form = multipart::Form::new()
            .text("sessionId", session_id.to_owned())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/chat/uploads/direct", self.base_url))
            .header(X_IDEMPOTENCY_HEADER, idempotency_key)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// `GET /chat/uploads/sessions/{id}` — poll the session status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` on network failure or a non-success
    /// status.
    pub async fn status(&self, session_id: &str) -> Result<UploadStatus> {
        let response = self
            .client
            .get(format!("{}/chat/uploads/sessions/{session_id}", self.base_url))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// `DELETE /chat/uploads/sessions/{id}` — cancel the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upload` on network failure or a non-success
    /// status.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        self.client
            .delete(format!("{}/chat/uploads/sessions/{session_id}", self.base_url))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
