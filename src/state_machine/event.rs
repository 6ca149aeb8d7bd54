//! Events that drive the copilot

use super::state::SessionId;
use crate::inbox::ConversationId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Operator events
    Submit {
        session_id: SessionId,
        conversation_id: ConversationId,
        question: String,
    },
    /// Dismiss the in-flight answer without asking anything new
    Cancel,

    // Timer events
    ResponseDelayElapsed {
        session_id: SessionId,
    },
    TypingTick {
        session_id: SessionId,
    },
    CompletionDelayElapsed {
        session_id: SessionId,
    },
}
