//! Shared conversation store
//!
//! Holds the current [`InboxSnapshot`] behind a `watch` channel. Every
//! dispatch runs the reducer while holding the channel's lock, so
//! transitions are applied one at a time and readers only ever observe
//! complete snapshots.

use super::conversation::ConversationId;
use super::message::{MessageId, NewMessage};
use super::snapshot::{reduce, InboxAction, InboxSnapshot, ReduceError};
use crate::clock::Clock;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the shared inbox state
#[derive(Clone)]
pub struct ConversationStore {
    tx: Arc<watch::Sender<Arc<InboxSnapshot>>>,
    clock: Arc<dyn Clock>,
}

impl ConversationStore {
    pub fn new(initial: InboxSnapshot, clock: Arc<dyn Clock>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self {
            tx: Arc::new(tx),
            clock,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<InboxSnapshot> {
        self.tx.borrow().clone()
    }

    /// Receive a notification whenever a transition changes the snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<InboxSnapshot>> {
        self.tx.subscribe()
    }

    /// Apply an action and return the resulting snapshot.
    ///
    /// An accepted action that changes nothing returns the current
    /// snapshot without notifying subscribers.
    ///
    /// # Errors
    ///
    /// Whatever [`reduce`] rejects; the state is left as it was.
    pub fn try_dispatch(&self, action: &InboxAction) -> Result<Arc<InboxSnapshot>, ReduceError> {
        let mut outcome = None;
        self.tx.send_if_modified(|current| {
            match reduce(current, action, self.clock.now()) {
                Ok(next) if !next.shares_state_with(current) => {
                    *current = Arc::new(next);
                    outcome = Some(Ok(current.clone()));
                    true
                }
                Ok(_) => {
                    tracing::debug!(
                        conversation_id = %action.conversation_id(),
                        "Inbox action changed nothing"
                    );
                    outcome = Some(Ok(current.clone()));
                    false
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        });
        outcome.unwrap_or_else(|| Ok(self.snapshot()))
    }

    /// Apply an action, treating rejections as no-ops.
    ///
    /// Rejected actions (unknown ids, blank content) are logged and return
    /// the unchanged snapshot.
    pub fn dispatch(&self, action: &InboxAction) -> Arc<InboxSnapshot> {
        self.try_dispatch(action).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Inbox action ignored");
            self.snapshot()
        })
    }

    pub fn append_message(
        &self,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Arc<InboxSnapshot> {
        self.dispatch(&InboxAction::AppendMessage {
            conversation_id: conversation_id.clone(),
            message,
        })
    }

    pub fn mark_all_read(&self, conversation_id: &ConversationId) -> Arc<InboxSnapshot> {
        self.dispatch(&InboxAction::MarkAllRead {
            conversation_id: conversation_id.clone(),
        })
    }

    pub fn mark_message_read(
        &self,
        conversation_id: &ConversationId,
        message_id: MessageId,
    ) -> Arc<InboxSnapshot> {
        self.dispatch(&InboxAction::MarkMessageRead {
            conversation_id: conversation_id.clone(),
            message_id,
        })
    }

    pub fn contains(&self, conversation_id: &ConversationId) -> bool {
        self.tx.borrow().contains(conversation_id)
    }

    pub fn unread_count(&self, conversation_id: &ConversationId) -> Option<usize> {
        self.tx.borrow().unread_count(conversation_id)
    }

    pub fn total_unread(&self) -> usize {
        self.tx.borrow().total_unread()
    }
}
