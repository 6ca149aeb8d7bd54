//! Copilot runtime executor

use super::timer::{SessionTimers, TimerHandle};
use super::traits::ThreadWriter;
use super::PanelEvent;

use crate::inbox::NewMessage;
use crate::state_machine::{
    transition, CopilotContext, CopilotState, Effect, Event, RenderFrame, TransitionError,
};
use tokio::sync::{broadcast, mpsc, watch};

/// Generic copilot runtime that can work with any thread writer
pub struct CopilotRuntime<W>
where
    W: ThreadWriter + 'static,
{
    context: CopilotContext,
    state: CopilotState,
    writer: W,
    event_rx: mpsc::Receiver<Event>,
    /// Handed to timers; weak so the loop ends once every handle is gone
    timer_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<PanelEvent>,
    frame_tx: watch::Sender<RenderFrame>,
    timers: SessionTimers,
}

impl<W> CopilotRuntime<W>
where
    W: ThreadWriter + 'static,
{
    pub fn new(
        context: CopilotContext,
        writer: W,
        event_rx: mpsc::Receiver<Event>,
        event_tx: &mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<PanelEvent>,
        frame_tx: watch::Sender<RenderFrame>,
    ) -> Self {
        Self {
            context,
            state: CopilotState::Idle,
            writer,
            event_rx,
            timer_tx: event_tx.downgrade(),
            broadcast_tx,
            frame_tx,
            timers: SessionTimers::default(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting copilot runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    self.process_event(event);
                }
                else => break,
            }
        }

        self.timers.cancel_all();
        tracing::info!("Copilot runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        // Pure state transition
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(TransitionError::StaleTimer(session_id)) => {
                tracing::debug!(%session_id, state = self.state.type_name(), "Discarding stale timer");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Copilot event rejected");
                return;
            }
        };

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::CancelTimers => {
                let cancelled = self.timers.cancel_all();
                tracing::debug!(cancelled, "Cancelled session timers");
            }

            Effect::NotifyCancelled { session_id } => {
                tracing::info!(%session_id, "Copilot session cancelled");
                let _ = self.broadcast_tx.send(PanelEvent::Cancelled { session_id });
            }

            Effect::AppendQuestion {
                conversation_id,
                text,
            } => {
                if let Err(e) = self
                    .writer
                    .append(&conversation_id, NewMessage::copilot_question(text))
                {
                    tracing::warn!(%conversation_id, error = %e, "Failed to record copilot question");
                }
            }

            Effect::ScheduleTimer { delay, event } => {
                self.timers
                    .push(TimerHandle::schedule(delay, event, self.timer_tx.clone()));
            }

            Effect::Render(frame) => {
                if let Some(session) = self.state.in_flight() {
                    tracing::trace!(session_id = %session.id, cursor = session.cursor, "Render");
                }
                self.frame_tx.send_replace(frame.clone());
                let _ = self.broadcast_tx.send(PanelEvent::Frame(frame));
            }

            Effect::CommitResponse {
                session_id,
                conversation_id,
                content,
                sources,
            } => match self
                .writer
                .append(&conversation_id, NewMessage::copilot_answer(content, sources))
            {
                Ok(message_id) => {
                    tracing::info!(%session_id, %conversation_id, %message_id, "Copilot answer committed");
                    let _ = self.broadcast_tx.send(PanelEvent::Committed {
                        session_id,
                        conversation_id,
                        message_id,
                    });
                }
                Err(e) => {
                    tracing::warn!(%session_id, %conversation_id, error = %e, "Failed to commit copilot answer");
                }
            },
        }
    }
}
