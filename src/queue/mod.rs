//! Visitor queue ownership and lifecycle.

pub mod manager;

pub use manager::QueueManager;
