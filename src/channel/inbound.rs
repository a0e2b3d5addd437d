//! Validated cross-context inbound channel.
//!
//! The embedding page posts `widget:referrer-update` messages into the
//! session, as a JSON string or an already-parsed object. Payloads go
//! through an explicit schema check; recognized updates overwrite the
//! single referrer cell, everything else is dropped silently — the channel
//! is shared with unrelated widgets and stray traffic is expected.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::referrer::ReferrerInfo;
use crate::{AppError, Result};

const REFERRER_UPDATE_TYPE: &str = "widget:referrer-update";

/// Wire envelope for cross-context messages. The payload object historically
/// arrived under either `payload` or `data`; both are accepted.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

/// Decode a raw cross-context message into referrer info.
///
/// # Errors
///
/// Returns [`AppError::Channel`] for any unrecognized or malformed shape:
/// non-JSON input, a missing or foreign `type`, or a payload that is not an
/// object. Callers on the live path drop these silently.
pub fn decode_referrer_update(value: &Value) -> Result<ReferrerInfo> {
    let envelope: Envelope = serde_json::from_value(value.clone())
        .map_err(|err| AppError::Channel(format!("bad envelope: {err}")))?;

    if envelope.kind != REFERRER_UPDATE_TYPE {
        return Err(AppError::Channel(format!(
            "unrecognized message type: {}",
            envelope.kind
        )));
    }

    let payload = envelope
        .payload
        .or(envelope.data)
        .ok_or_else(|| AppError::Channel("missing payload".into()))?;

    match payload {
        Value::Object(map) => Ok(ReferrerInfo::new(map)),
        other => Err(AppError::Channel(format!(
            "payload must be an object, got {other}"
        ))),
    }
}

/// Owner of the referrer cell: the last recognized update, no history.
#[derive(Debug, Default)]
pub struct InboundChannel {
    referrer: Option<ReferrerInfo>,
}

impl InboundChannel {
    /// Create an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a raw message that may be a JSON string. Returns whether the
    /// message was recognized; malformed input is dropped silently.
    pub fn accept_str(&mut self, raw: &str) -> bool {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.accept_value(&value),
            Err(err) => {
                debug!(%err, "non-JSON cross-context message dropped");
                false
            }
        }
    }

    /// Accept an already-parsed message value. Returns whether the message
    /// was recognized; malformed input is dropped silently.
    pub fn accept_value(&mut self, value: &Value) -> bool {
        match decode_referrer_update(value) {
            Ok(info) => {
                self.referrer = Some(info);
                true
            }
            Err(err) => {
                debug!(%err, "cross-context message dropped");
                false
            }
        }
    }

    /// The last recognized referrer update, if any.
    #[must_use]
    pub fn referrer(&self) -> Option<&ReferrerInfo> {
        self.referrer.as_ref()
    }
}
