//! Conversation store trait for chat history

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Conversation, Message, Role};

/// Append-only turn log keyed by conversation id
///
/// Implementations:
/// - `SqliteConversationStore`: `conversations` and `messages` tables in SQLite
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Open a new conversation for `user_id`
    async fn create_conversation(&self, user_id: &str, title: &str) -> Result<Conversation>;

    /// Bump `updated_at` on a conversation owned by `user_id`
    ///
    /// Fails with `ConversationNotFound` when the id is unknown or owned by someone else.
    async fn touch_conversation(&self, user_id: &str, conversation_id: &str) -> Result<Conversation>;

    /// Append one message
    async fn append_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message>;

    /// The last `limit` messages, oldest first
    async fn recent_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
