//! Conversation type

use super::lifecycle;
use super::message::{Message, MessageChannel, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable conversation identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A conversation with one contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    name: String,
    #[serde(default)]
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<ConversationId>, name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            messages,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All messages in arrival order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Messages exchanged with the contact
    pub fn thread(&self) -> impl Iterator<Item = &Message> {
        self.channel(MessageChannel::Thread)
    }

    /// Copilot questions and answers recorded against this conversation
    pub fn copilot_notes(&self) -> impl Iterator<Item = &Message> {
        self.channel(MessageChannel::Copilot)
    }

    fn channel(&self, channel: MessageChannel) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.channel() == channel)
    }

    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_unread()).count()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Arrival time of the newest message, used for inbox ordering
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(Message::received_time).max()
    }

    pub(super) fn with_appended(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next
    }

    /// Copy with every unread message marked read, or `None` if nothing was unread
    pub(super) fn with_all_read(&self, now: DateTime<Utc>) -> Option<Self> {
        if self.unread_count() == 0 {
            return None;
        }
        let messages = self
            .messages
            .iter()
            .map(|m| lifecycle::mark_read(m, now).unwrap_or_else(|| m.clone()))
            .collect();
        Some(Self {
            id: self.id.clone(),
            name: self.name.clone(),
            messages,
        })
    }

    /// Copy with a single message marked read.
    ///
    /// `Ok(None)` means the message exists but was already read.
    pub(super) fn with_message_read(
        &self,
        id: MessageId,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, MessageId> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id() == id)
            .ok_or(id)?;
        let Some(read) = lifecycle::mark_read(&self.messages[index], now) else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.messages[index] = read;
        Ok(Some(next))
    }
}
