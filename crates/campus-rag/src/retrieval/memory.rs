//! Conversation memory transcript

use crate::types::Message;

/// Transcript used when a conversation has no earlier turns
pub const NO_HISTORY: &str = "No previous conversation history.";

/// Format turns oldest first as `User: ...` / `Assistant: ...` lines
pub fn format_transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return NO_HISTORY.to_string();
    }
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
