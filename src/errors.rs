//! Error types shared across the session core.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Queue move referenced a visitor not present in the source bucket;
    /// signals client/server desync and is surfaced to the caller.
    InvalidTransition(String),
    /// Duplicate upload attempt inside the debounce window. Recoverable:
    /// the caller may retry once the window elapses.
    Throttled(String),
    /// Reachability probe failure. Retried automatically by the connection
    /// monitor, never surfaced as a hard error.
    Probe(String),
    /// Network or server failure during upload create/transfer/poll/cancel.
    Upload(String),
    /// Cross-context channel delivered an unusable payload.
    Channel(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::InvalidTransition(msg) => write!(f, "invalid transition: {msg}"),
            Self::Throttled(msg) => write!(f, "throttled: {msg}"),
            Self::Probe(msg) => write!(f, "probe: {msg}"),
            Self::Upload(msg) => write!(f, "upload: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upload(err.to_string())
    }
}
