#![forbid(unsafe_code)]

//! `livedesk-core` — the live session core of a customer-support chat
//! product.
//!
//! One [`session::AgentSession`] owns the in-memory state of a single
//! agent's live session: the visitor queue, connection-resilience
//! monitoring, message de-duplication with notification dispatch, and the
//! throttled idempotent file-upload protocol. Durable chat history and all
//! UI concerns live outside this crate.

pub mod channel;
pub mod config;
pub mod connection;
pub mod errors;
pub mod models;
pub mod notify;
pub mod presence;
pub mod queue;
pub mod session;
pub mod upload;

pub use config::SessionConfig;
pub use errors::{AppError, Result};
