//! Idempotent, throttled file-upload protocol.

pub mod client;
pub mod coordinator;

pub use client::UploadClient;
pub use coordinator::UploadCoordinator;
