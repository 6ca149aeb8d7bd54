//! Effects produced by state transitions

use super::event::Event;
use super::state::{RenderFrame, SessionId};
use crate::inbox::{ConversationId, NewMessage, Source};
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop every pending timer of the in-flight session
    CancelTimers,

    /// Tell observers a session was abandoned
    NotifyCancelled { session_id: SessionId },

    /// Record the operator's question right away
    AppendQuestion {
        conversation_id: ConversationId,
        text: String,
    },

    /// Feed `event` back into the runtime after `delay`
    ScheduleTimer { delay: Duration, event: Event },

    /// Publish what the panel shows now
    Render(RenderFrame),

    /// Write the finished answer into the conversation
    CommitResponse {
        session_id: SessionId,
        conversation_id: ConversationId,
        content: String,
        sources: Vec<Source>,
    },
}

impl Effect {
    pub fn schedule(delay: Duration, event: Event) -> Self {
        Effect::ScheduleTimer { delay, event }
    }

    /// The message a commit effect appends
    pub fn committed_message(&self) -> Option<NewMessage> {
        match self {
            Effect::CommitResponse {
                content, sources, ..
            } => Some(NewMessage::copilot_answer(content.clone(), sources.clone())),
            _ => None,
        }
    }
}
