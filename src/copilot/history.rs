//! What the copilot panel shows for a conversation
//!
//! The panel is a projection of the conversation's copilot notes plus the
//! answer being produced. The store is never truncated; only the window is.

use crate::inbox::{Conversation, Message};
use crate::state_machine::RenderFrame;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PanelView {
    /// Nothing asked yet: show the assistant's greeting instead
    pub show_greeting: bool,
    /// Committed questions and answers, oldest first
    pub history: Vec<Message>,
    /// The answer still being produced for this conversation
    pub in_flight: Option<RenderFrame>,
    /// Older notes left out of the window
    pub dropped: usize,
}

impl PanelView {
    /// Panel with no active conversation
    pub fn greeting() -> Self {
        Self {
            show_greeting: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.history.len() + usize::from(self.in_flight.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Project `conversation`'s copilot notes and the current frame into at
/// most `max` entries. The in-flight frame always stays; the oldest notes
/// go first.
pub fn visible_window(conversation: &Conversation, frame: &RenderFrame, max: usize) -> PanelView {
    let in_flight = (frame.is_in_flight()
        && frame.conversation_id.as_ref() == Some(conversation.id()))
    .then(|| frame.clone());

    let notes: Vec<&Message> = conversation.copilot_notes().collect();
    let budget = max.saturating_sub(usize::from(in_flight.is_some()));
    let dropped = notes.len().saturating_sub(budget);

    PanelView {
        show_greeting: notes.is_empty() && in_flight.is_none(),
        history: notes.into_iter().skip(dropped).cloned().collect(),
        in_flight,
        dropped,
    }
}
