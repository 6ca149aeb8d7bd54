//! Trait abstractions for runtime I/O
//!
//! The executor only needs to append messages to a conversation; the
//! trait lets tests swap the shared store for a recording mock.

use crate::inbox::{
    Conversation, ConversationId, ConversationStore, InboxAction, Message, MessageId, NewMessage,
    ReduceError,
};
use std::sync::Arc;

/// Destination for copilot questions and committed answers
pub trait ThreadWriter: Send + Sync {
    /// Append a message to a conversation and return its id
    fn append(
        &self,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Result<MessageId, ReduceError>;
}

impl ThreadWriter for ConversationStore {
    fn append(
        &self,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Result<MessageId, ReduceError> {
        let snapshot = self.try_dispatch(&InboxAction::AppendMessage {
            conversation_id: conversation_id.clone(),
            message,
        })?;
        // The returned snapshot is the one this append produced, so its
        // last message is ours even if other writers followed.
        snapshot
            .conversation(conversation_id)
            .and_then(Conversation::last_message)
            .map(Message::id)
            .ok_or_else(|| ReduceError::UnknownConversation(conversation_id.clone()))
    }
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: ThreadWriter + ?Sized> ThreadWriter for Arc<T> {
    fn append(
        &self,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Result<MessageId, ReduceError> {
        (**self).append(conversation_id, message)
    }
}
