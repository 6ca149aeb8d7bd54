//! Bootstrap data
//!
//! The inbox is loaded once at startup from an ordered JSON list of
//! conversations. The bundled seed is used unless a file is configured.

use super::conversation::{Conversation, ConversationId};
use super::lifecycle::{self, LifecycleViolation};
use super::snapshot::InboxSnapshot;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUNDLED_SEED: &str = include_str!("../../seed/contacts.json");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate conversation id: {0}")]
    DuplicateConversation(ConversationId),
    #[error("duplicate message id {message_id} in conversation {conversation_id}")]
    DuplicateMessage {
        conversation_id: ConversationId,
        message_id: u64,
    },
    #[error("invalid message in conversation {conversation_id}: {violation}")]
    Lifecycle {
        conversation_id: ConversationId,
        violation: LifecycleViolation,
    },
}

/// The bundled demo inbox
///
/// # Errors
///
/// Only if the bundled file is malformed.
pub fn bundled() -> Result<InboxSnapshot, SeedError> {
    from_json(BUNDLED_SEED)
}

/// Load seed data from a JSON file
///
/// # Errors
///
/// I/O failures, malformed JSON and invariant violations.
pub fn load_file(path: &Path) -> Result<InboxSnapshot, SeedError> {
    let data = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&data)
}

/// Parse and validate seed data
///
/// # Errors
///
/// Malformed JSON, duplicate ids, or messages breaking lifecycle invariants.
pub fn from_json(data: &str) -> Result<InboxSnapshot, SeedError> {
    let conversations: Vec<Conversation> = serde_json::from_str(data)?;
    validate(&conversations)?;
    tracing::debug!(conversations = conversations.len(), "Seed data loaded");
    Ok(InboxSnapshot::new(conversations))
}

fn validate(conversations: &[Conversation]) -> Result<(), SeedError> {
    let mut conversation_ids = HashSet::new();
    for conversation in conversations {
        if !conversation_ids.insert(conversation.id()) {
            return Err(SeedError::DuplicateConversation(conversation.id().clone()));
        }

        let mut message_ids = HashSet::new();
        for message in conversation.messages() {
            if !message_ids.insert(message.id()) {
                return Err(SeedError::DuplicateMessage {
                    conversation_id: conversation.id().clone(),
                    message_id: message.id().0,
                });
            }
            lifecycle::validate(message).map_err(|violation| SeedError::Lifecycle {
                conversation_id: conversation.id().clone(),
                violation,
            })?;
        }
    }
    Ok(())
}
