//! Message de-duplication and notification dispatch.

pub mod engine;
pub mod text;

pub use engine::{DesktopNotifier, Dispatch, NotificationEngine, Sound, SoundPlayer};
