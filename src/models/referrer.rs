//! Referrer info delivered over the cross-context channel.

use serde_json::Map;

/// The last `widget:referrer-update` payload received. Single overwritten
/// cell — no history is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferrerInfo {
    /// Raw payload object from the widget.
    pub payload: Map<String, serde_json::Value>,
}

impl ReferrerInfo {
    /// Wrap a validated payload object.
    #[must_use]
    pub fn new(payload: Map<String, serde_json::Value>) -> Self {
        Self { payload }
    }
}
