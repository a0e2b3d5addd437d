//! Session configuration parsing and validation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_debounce_ms() -> u64 {
    500
}

fn default_probe_retry_ms() -> u64 {
    1000
}

fn default_duration_tick_ms() -> u64 {
    5000
}

fn default_fingerprint_capacity() -> usize {
    4096
}

/// Tunable parameters for one live agent session, parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Base URL of the upload API (e.g. `https://api.example.com`).
    pub upload_base_url: String,
    /// Well-known endpoint hit by the reachability probe.
    pub probe_url: String,
    /// Minimum interval between accepted upload attempts for one file key.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Fixed retry interval after a failed reachability probe.
    #[serde(default = "default_probe_retry_ms")]
    pub probe_retry_ms: u64,
    /// Recompute interval for the presence duration clock.
    #[serde(default = "default_duration_tick_ms")]
    pub duration_tick_ms: u64,
    /// Maximum retained message fingerprints before the oldest are evicted.
    #[serde(default = "default_fingerprint_capacity")]
    pub fingerprint_capacity: usize,
}

impl SessionConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read, or
    /// `AppError::Config` for invalid TOML or failed validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.upload_base_url.is_empty() {
            return Err(AppError::Config("upload_base_url must not be empty".into()));
        }

        if self.probe_url.is_empty() {
            return Err(AppError::Config("probe_url must not be empty".into()));
        }

        if self.debounce_ms == 0 {
            return Err(AppError::Config("debounce_ms must be greater than zero".into()));
        }

        if self.probe_retry_ms == 0 {
            return Err(AppError::Config(
                "probe_retry_ms must be greater than zero".into(),
            ));
        }

        if self.duration_tick_ms == 0 {
            return Err(AppError::Config(
                "duration_tick_ms must be greater than zero".into(),
            ));
        }

        if self.fingerprint_capacity == 0 {
            return Err(AppError::Config(
                "fingerprint_capacity must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
