//! Cross-context message channel.

pub mod inbound;

pub use inbound::InboundChannel;
