//! Desktop notification copy builders.
//!
//! Pure helpers producing the title/body pair for each notification class.

use crate::models::message::{Message, SenderKind};

const BODY_PREVIEW_LIMIT: usize = 120;

/// Build the title and body for a desktop notification.
///
/// The phrasing differentiates visitor-left, visitor-arrived, and
/// new-message events so the agent can triage from the notification alone.
#[must_use]
pub fn notification_copy(message: &Message, is_visitor_left: bool) -> (String, String) {
    if is_visitor_left {
        return (
            "Visitor left".into(),
            format!("The visitor in chat {} has left.", message.chat_id),
        );
    }

    if message.sender_kind == SenderKind::System {
        return (
            "Visitor waiting".into(),
            format!("A visitor is waiting in chat {}.", message.chat_id),
        );
    }

    (
        "New message".into(),
        format!(
            "Chat {}: {}",
            message.chat_id,
            preview(&message.content)
        ),
    )
}

/// Truncate the message body for notification display.
fn preview(content: &str) -> String {
    if content.chars().count() <= BODY_PREVIEW_LIMIT {
        return content.to_owned();
    }
    let cut: String = content.chars().take(BODY_PREVIEW_LIMIT).collect();
    format!("{cut}…")
}
