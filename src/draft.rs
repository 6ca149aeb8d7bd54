//! Draft hand-off between the copilot panel and the reply composer
//!
//! A single-slot mailbox: the panel publishes text, the composer takes it
//! exactly once. Publishing again before it is taken overwrites the slot.
//! The composer polls with [`DraftChannel::consume_once`]; taking clears the
//! slot under the lock, so at most one caller ever receives a given draft.

use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable handle to a shared draft slot
#[derive(Clone, Default)]
pub struct DraftChannel {
    slot: Arc<Mutex<Option<String>>>,
}

impl DraftChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` for the composer; returns a draft that was never taken
    pub fn publish(&self, text: impl Into<String>) -> Option<String> {
        let previous = self.lock().replace(text.into());
        if previous.is_some() {
            tracing::debug!("Unconsumed draft overwritten");
        }
        previous
    }

    /// Take the pending draft, leaving the slot empty
    pub fn consume_once(&self) -> Option<String> {
        self.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DraftChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftChannel")
            .field("pending", &self.is_pending())
            .finish()
    }
}
