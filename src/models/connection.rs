//! Connection reachability phases.

use serde::{Deserialize, Serialize};

/// True reachability of the session, as established by the connection
/// monitor — distinct from the browser's online/offline signal, which lies
/// under captive portals and proxy failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// Reachability confirmed by a successful probe (or never questioned).
    Online,
    /// Browser reported online but the probe has not yet succeeded.
    SuspectedOffline,
    /// Browser reported offline; treated as authoritative.
    ConfirmedOffline,
}

impl ConnectionPhase {
    /// Whether the UI should render the offline indicator.
    #[must_use]
    pub fn is_offline(self) -> bool {
        !matches!(self, Self::Online)
    }
}
