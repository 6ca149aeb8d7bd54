//! Conversation data and the shared inbox store
//!
//! Conversations are held in immutable snapshots. Every change goes
//! through the pure [`reduce`] function and is published as a whole new
//! snapshot by [`ConversationStore`].

mod conversation;
pub mod lifecycle;
mod message;
pub mod seed;
mod snapshot;
mod store;

#[cfg(test)]
mod proptests;

pub use conversation::{Conversation, ConversationId};
pub use message::{
    Message, MessageChannel, MessageId, MessageState, NewMessage, SenderRole, Source, SourceKind,
};
pub use snapshot::{reduce, InboxAction, InboxSnapshot, ReduceError};
pub use store::ConversationStore;
