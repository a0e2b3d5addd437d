//! Domain model module declarations.

pub mod connection;
pub mod message;
pub mod referrer;
pub mod upload;
pub mod visitor;
