//! Copilot state types

use crate::config::WorkspaceConfig;
use crate::copilot::{Catalog, ResponseDefinition};
use crate::inbox::{ConversationId, Source};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Identifier of one question/answer render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How much of an answer has been revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Stage {
    Idle = 0,
    Typing = 1,
    Complete = 2,
}

impl Stage {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Immutable inputs every transition reads
#[derive(Debug, Clone)]
pub struct CopilotContext {
    pub catalog: Arc<Catalog>,
    /// Delay between two revealed characters
    pub typing_tick: Duration,
    /// Delay before typing starts, and again before the answer is committed
    pub response_delay: Duration,
}

impl CopilotContext {
    pub fn new(catalog: Arc<Catalog>, config: &WorkspaceConfig) -> Self {
        Self {
            catalog,
            typing_tick: config.typing_tick,
            response_delay: config.response_delay,
        }
    }
}

/// The in-flight answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub id: SessionId,
    pub conversation_id: ConversationId,
    pub response: Arc<ResponseDefinition>,
    /// Characters revealed so far
    pub cursor: usize,
    body_len: usize,
}

impl ActiveSession {
    pub fn new(
        id: SessionId,
        conversation_id: ConversationId,
        response: Arc<ResponseDefinition>,
    ) -> Self {
        let body_len = response.char_len();
        Self {
            id,
            conversation_id,
            response,
            cursor: 0,
            body_len,
        }
    }

    pub fn body_len(&self) -> usize {
        self.body_len
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.cursor >= self.body_len
    }

    /// Copy with one more character revealed, bounded by the body length
    #[must_use]
    pub fn advanced(&self) -> Self {
        Self {
            cursor: (self.cursor + 1).min(self.body_len),
            ..self.clone()
        }
    }

    /// The revealed prefix of the body
    pub fn revealed(&self) -> String {
        self.response.content.chars().take(self.cursor).collect()
    }
}

/// Copilot panel state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CopilotState {
    /// Nothing asked yet, or the last answer was dismissed
    #[default]
    Idle,
    /// Question accepted; waiting out the response delay
    Pending { session: ActiveSession },
    /// Revealing the body; once fully revealed, waiting out the completion delay
    Typing { session: ActiveSession },
    /// Answer committed; kept so the operator can insert it
    Complete {
        session_id: SessionId,
        conversation_id: ConversationId,
        response: Arc<ResponseDefinition>,
    },
}

impl CopilotState {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Idle | Self::Pending { .. } => Stage::Idle,
            Self::Typing { .. } => Stage::Typing,
            Self::Complete { .. } => Stage::Complete,
        }
    }

    /// The session with timers still running
    pub fn in_flight(&self) -> Option<&ActiveSession> {
        match self {
            Self::Pending { session } | Self::Typing { session } => Some(session),
            Self::Idle | Self::Complete { .. } => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending { .. } => "pending",
            Self::Typing { .. } => "typing",
            Self::Complete { .. } => "complete",
        }
    }
}

/// What the copilot panel shows for the current answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFrame {
    pub session_id: Option<SessionId>,
    pub conversation_id: Option<ConversationId>,
    pub stage: Stage,
    /// Question accepted, no assistant text yet
    pub awaiting: bool,
    pub text: String,
    /// Blinking caret shown while typing
    pub caret: bool,
    pub sources: Vec<Source>,
    /// The answer can be inserted into the composer
    pub offers_insert: bool,
}

impl RenderFrame {
    pub fn idle() -> Self {
        Self {
            session_id: None,
            conversation_id: None,
            stage: Stage::Idle,
            awaiting: false,
            text: String::new(),
            caret: false,
            sources: Vec::new(),
            offers_insert: false,
        }
    }

    pub fn awaiting(session: &ActiveSession) -> Self {
        Self {
            session_id: Some(session.id),
            conversation_id: Some(session.conversation_id.clone()),
            awaiting: true,
            ..Self::idle()
        }
    }

    pub fn typing(session: &ActiveSession) -> Self {
        Self {
            session_id: Some(session.id),
            conversation_id: Some(session.conversation_id.clone()),
            stage: Stage::Typing,
            text: session.revealed(),
            caret: true,
            ..Self::idle()
        }
    }

    pub fn complete(
        session_id: SessionId,
        conversation_id: &ConversationId,
        response: &ResponseDefinition,
    ) -> Self {
        Self {
            session_id: Some(session_id),
            conversation_id: Some(conversation_id.clone()),
            stage: Stage::Complete,
            text: response.content.clone(),
            sources: response.sources.clone(),
            // Insertion is offered alongside the cited sources
            offers_insert: !response.sources.is_empty(),
            ..Self::idle()
        }
    }

    /// Still being produced: awaiting the delay or typing
    pub fn is_in_flight(&self) -> bool {
        self.awaiting || self.stage == Stage::Typing
    }
}

impl Default for RenderFrame {
    fn default() -> Self {
        Self::idle()
    }
}
