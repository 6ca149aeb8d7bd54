//! Immutable inbox snapshots and the pure reducer over them

use super::conversation::{Conversation, ConversationId};
use super::message::{Message, MessageId, NewMessage};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Point-in-time view of every conversation.
///
/// Conversations are shared between snapshots until a transition touches
/// them, so producing a new snapshot only copies what changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboxSnapshot {
    conversations: Vec<Arc<Conversation>>,
    next_message_id: u64,
}

impl InboxSnapshot {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        let next_message_id = conversations
            .iter()
            .flat_map(|c| c.messages().iter().map(|m| m.id().0))
            .max()
            .map_or(1, |max| max + 1);
        Self {
            conversations: conversations.into_iter().map(Arc::new).collect(),
            next_message_id,
        }
    }

    /// Conversations in seed order
    pub fn conversations(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter().map(AsRef::as_ref)
    }

    /// Conversations ordered by most recent activity first
    pub fn newest_first(&self) -> Vec<&Conversation> {
        let mut sorted: Vec<&Conversation> = self.conversations().collect();
        sorted.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        sorted
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.position(id).map(|i| self.conversations[i].as_ref())
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Unread messages in one conversation, `None` for an unknown id
    pub fn unread_count(&self, id: &ConversationId) -> Option<usize> {
        self.conversation(id).map(Conversation::unread_count)
    }

    /// Unread messages across the whole inbox
    pub fn total_unread(&self) -> usize {
        self.conversations().map(Conversation::unread_count).sum()
    }

    /// True when both snapshots hold the very same conversation values
    pub fn shares_state_with(&self, other: &InboxSnapshot) -> bool {
        self.next_message_id == other.next_message_id
            && self.conversations.len() == other.conversations.len()
            && self
                .conversations
                .iter()
                .zip(&other.conversations)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    fn position(&self, id: &ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id() == id)
    }

    fn replace(&self, index: usize, conversation: Conversation) -> Self {
        let mut next = self.clone();
        next.conversations[index] = Arc::new(conversation);
        next
    }
}

/// Transitions the store understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxAction {
    AppendMessage {
        conversation_id: ConversationId,
        message: NewMessage,
    },
    MarkAllRead {
        conversation_id: ConversationId,
    },
    MarkMessageRead {
        conversation_id: ConversationId,
        message_id: MessageId,
    },
}

impl InboxAction {
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            Self::AppendMessage { conversation_id, .. }
            | Self::MarkAllRead { conversation_id }
            | Self::MarkMessageRead { conversation_id, .. } => conversation_id,
        }
    }
}

/// Reasons a transition leaves the snapshot untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    #[error("Conversation not found: {0}")]
    UnknownConversation(ConversationId),
    #[error("Message {message_id} not found in conversation {conversation_id}")]
    UnknownMessage {
        conversation_id: ConversationId,
        message_id: MessageId,
    },
    #[error("Message content is empty")]
    EmptyContent,
}

/// Pure transition function over inbox snapshots.
///
/// Given the same snapshot, action and time it always produces the same
/// result. Actions that change nothing return a snapshot sharing every
/// conversation with the input.
///
/// # Errors
///
/// Unknown conversation or message ids and blank message content.
pub fn reduce(
    snapshot: &InboxSnapshot,
    action: &InboxAction,
    now: DateTime<Utc>,
) -> Result<InboxSnapshot, ReduceError> {
    let conversation_id = action.conversation_id();
    let index = snapshot
        .position(conversation_id)
        .ok_or_else(|| ReduceError::UnknownConversation(conversation_id.clone()))?;
    let conversation = &snapshot.conversations[index];

    match action {
        InboxAction::AppendMessage { message, .. } => {
            if message.is_blank() {
                return Err(ReduceError::EmptyContent);
            }
            let id = MessageId(snapshot.next_message_id);
            let appended = conversation.with_appended(Message::create(id, message.clone(), now));
            let mut next = snapshot.replace(index, appended);
            next.next_message_id += 1;
            Ok(next)
        }

        InboxAction::MarkAllRead { .. } => Ok(conversation
            .with_all_read(now)
            .map_or_else(|| snapshot.clone(), |read| snapshot.replace(index, read))),

        InboxAction::MarkMessageRead { message_id, .. } => {
            match conversation.with_message_read(*message_id, now) {
                Ok(Some(read)) => Ok(snapshot.replace(index, read)),
                Ok(None) => Ok(snapshot.clone()),
                Err(message_id) => Err(ReduceError::UnknownMessage {
                    conversation_id: conversation_id.clone(),
                    message_id,
                }),
            }
        }
    }
}
