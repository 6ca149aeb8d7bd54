//! Pure state transition function
//!
//! Given the same state, context and event it always produces the same
//! result, with no I/O and no timers of its own: waiting is expressed as
//! `ScheduleTimer` effects that feed events back in.

use super::{ActiveSession, CopilotContext, CopilotState, Effect, Event, RenderFrame, SessionId};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: CopilotState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: CopilotState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Events the current state cannot accept
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Question is empty")]
    EmptyQuestion,
    #[error("Timer for session {0} is no longer current")]
    StaleTimer(SessionId),
}

/// Pure transition function
pub fn transition(
    state: &CopilotState,
    context: &CopilotContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Question submission
        // ============================================================

        // Any state + Submit -> Pending. A session still in flight is
        // cancelled before anything of the new one is scheduled.
        (
            _,
            Event::Submit {
                session_id,
                conversation_id,
                question,
            },
        ) => {
            let question = question.trim();
            if question.is_empty() {
                return Err(TransitionError::EmptyQuestion);
            }

            let response = context.catalog.resolve(question).clone();
            let session = ActiveSession::new(session_id, conversation_id.clone(), response);

            Ok(TransitionResult::new(CopilotState::Pending {
                session: session.clone(),
            })
            .with_effects(cancel_in_flight(state))
            .with_effect(Effect::AppendQuestion {
                conversation_id,
                text: question.to_string(),
            })
            .with_effect(Effect::Render(RenderFrame::awaiting(&session)))
            .with_effect(Effect::schedule(
                context.response_delay,
                Event::ResponseDelayElapsed { session_id },
            )))
        }

        (_, Event::Cancel) => {
            if state.is_busy() {
                Ok(TransitionResult::new(CopilotState::Idle)
                    .with_effects(cancel_in_flight(state))
                    .with_effect(Effect::Render(RenderFrame::idle())))
            } else {
                Ok(TransitionResult::new(state.clone()))
            }
        }

        // ============================================================
        // Staged rendering
        // ============================================================

        // Pending + delay elapsed -> Typing with nothing revealed yet
        (CopilotState::Pending { session }, Event::ResponseDelayElapsed { session_id })
            if session.id == session_id =>
        {
            let typing = session.clone();
            Ok(TransitionResult::new(CopilotState::Typing {
                session: typing.clone(),
            })
            .with_effect(Effect::Render(RenderFrame::typing(&typing)))
            .with_effect(next_timer(&typing, context)))
        }

        // Typing + tick -> one more character
        (CopilotState::Typing { session }, Event::TypingTick { session_id })
            if session.id == session_id && !session.is_fully_revealed() =>
        {
            let typing = session.advanced();
            Ok(TransitionResult::new(CopilotState::Typing {
                session: typing.clone(),
            })
            .with_effect(Effect::Render(RenderFrame::typing(&typing)))
            .with_effect(next_timer(&typing, context)))
        }

        // Typing (fully revealed) + completion delay -> Complete, commit
        (CopilotState::Typing { session }, Event::CompletionDelayElapsed { session_id })
            if session.id == session_id && session.is_fully_revealed() =>
        {
            let response = session.response.clone();
            Ok(TransitionResult::new(CopilotState::Complete {
                session_id,
                conversation_id: session.conversation_id.clone(),
                response: response.clone(),
            })
            // Observers see the finished frame before the commit lands
            .with_effect(Effect::Render(RenderFrame::complete(
                session_id,
                &session.conversation_id,
                &response,
            )))
            .with_effect(Effect::CommitResponse {
                session_id,
                conversation_id: session.conversation_id.clone(),
                content: response.content.clone(),
                sources: response.sources.clone(),
            }))
        }

        // ============================================================
        // Stale timers
        // ============================================================

        // A timer from an abandoned session, or one that does not fit the
        // current phase, must never touch the state.
        (
            _,
            Event::ResponseDelayElapsed { session_id }
            | Event::TypingTick { session_id }
            | Event::CompletionDelayElapsed { session_id },
        ) => Err(TransitionError::StaleTimer(session_id)),
    }
}

/// Effects that dispose of whatever session is still running
fn cancel_in_flight(state: &CopilotState) -> Vec<Effect> {
    match state.in_flight() {
        Some(session) => vec![
            Effect::CancelTimers,
            Effect::NotifyCancelled {
                session_id: session.id,
            },
        ],
        None => vec![],
    }
}

/// The next tick while characters remain, then the completion delay
fn next_timer(session: &ActiveSession, context: &CopilotContext) -> Effect {
    if session.is_fully_revealed() {
        Effect::schedule(
            context.response_delay,
            Event::CompletionDelayElapsed {
                session_id: session.id,
            },
        )
    } else {
        Effect::schedule(
            context.typing_tick,
            Event::TypingTick {
                session_id: session.id,
            },
        )
    }
}
