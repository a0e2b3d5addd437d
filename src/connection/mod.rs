//! Connection resilience: reachability probing and phase tracking.

pub mod monitor;
pub mod probe;

pub use monitor::{ConnectionEvent, ConnectionMonitor, MonitorHandle, NetworkSignal};
pub use probe::{HttpProbe, Reachability};
