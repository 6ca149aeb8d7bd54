//! Message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message, unique across a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The customer on the other side of the conversation
    Contact,
    /// The operator working the inbox
    Agent,
    /// The copilot assistant
    Assistant,
}

impl SenderRole {
    /// Authored messages are read from the moment they exist
    pub fn is_authored(self) -> bool {
        matches!(self, Self::Agent | Self::Assistant)
    }
}

/// Read state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    Unread,
    Read,
}

/// Which part of the conversation a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageChannel {
    /// Exchanged with the contact
    #[default]
    Thread,
    /// Operator questions to the copilot and its answers
    Copilot,
}

/// Kind of reference backing an assistant answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Document,
    Policy,
}

/// A reference cited by an assistant answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

impl Source {
    pub fn new(id: u32, title: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
        }
    }
}

/// A message in a conversation.
///
/// Everything except `state` and `seen_time` is fixed at creation. Those two
/// fields only move through [`crate::inbox::lifecycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    sender: SenderRole,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    pub(super) state: MessageState,
    received_time: DateTime<Utc>,
    pub(super) seen_time: Option<DateTime<Utc>>,
    #[serde(default)]
    channel: MessageChannel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources: Vec<Source>,
}

impl Message {
    /// Materialize a new message arriving at `now`
    pub(crate) fn create(id: MessageId, new: NewMessage, now: DateTime<Utc>) -> Self {
        let state = if new.sender.is_authored() {
            MessageState::Read
        } else {
            MessageState::Unread
        };
        Self {
            id,
            sender: new.sender,
            content: new.content,
            subject: None,
            state,
            received_time: now,
            seen_time: None,
            channel: new.channel,
            sources: new.sources,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> SenderRole {
        self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn state(&self) -> MessageState {
        self.state
    }

    pub fn is_unread(&self) -> bool {
        self.state == MessageState::Unread
    }

    pub fn received_time(&self) -> DateTime<Utc> {
        self.received_time
    }

    pub fn seen_time(&self) -> Option<DateTime<Utc>> {
        self.seen_time
    }

    pub fn channel(&self) -> MessageChannel {
        self.channel
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }
}

/// Content of a message about to be appended; the store stamps id, state
/// and arrival time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: SenderRole,
    pub content: String,
    pub channel: MessageChannel,
    pub sources: Vec<Source>,
}

impl NewMessage {
    /// Incoming message from the contact
    pub fn contact(content: impl Into<String>) -> Self {
        Self::thread(SenderRole::Contact, content)
    }

    /// Reply composed by the operator
    pub fn agent(content: impl Into<String>) -> Self {
        Self::thread(SenderRole::Agent, content)
    }

    /// Question the operator asked the copilot
    pub fn copilot_question(content: impl Into<String>) -> Self {
        Self {
            sender: SenderRole::Agent,
            content: content.into(),
            channel: MessageChannel::Copilot,
            sources: Vec::new(),
        }
    }

    /// Finished copilot answer
    pub fn copilot_answer(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            sender: SenderRole::Assistant,
            content: content.into(),
            channel: MessageChannel::Copilot,
            sources,
        }
    }

    fn thread(sender: SenderRole, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
            channel: MessageChannel::Thread,
            sources: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
pub(crate) fn unread_contact(id: u64, received: DateTime<Utc>) -> Message {
    Message::create(MessageId(id), NewMessage::contact(format!("message {id}")), received)
}
