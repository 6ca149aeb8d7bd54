//! Runtime for the copilot panel
//!
//! A single task owns the copilot state and applies events one at a time;
//! clients talk to it through a [`CopilotHandle`].

mod executor;
pub mod timer;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::CopilotRuntime;
pub use traits::ThreadWriter;

use crate::inbox::{ConversationId, MessageId};
use crate::state_machine::{CopilotContext, Event, RenderFrame, SessionId};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const BROADCAST_CAPACITY: usize = 1024;

/// Events published to panel observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// The panel content changed (every typing tick produces one)
    Frame(RenderFrame),
    /// A finished answer was written into its conversation
    Committed {
        session_id: SessionId,
        conversation_id: ConversationId,
        message_id: MessageId,
    },
    /// An in-flight answer was abandoned
    Cancelled { session_id: SessionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Copilot runtime has stopped")]
pub struct RuntimeStopped;

/// Handle to interact with the running copilot
#[derive(Clone)]
pub struct CopilotHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<PanelEvent>,
    frame_rx: watch::Receiver<RenderFrame>,
}

impl CopilotHandle {
    /// Ask a question about a conversation; returns the new session's id.
    ///
    /// # Errors
    ///
    /// The runtime task is gone.
    pub async fn submit(
        &self,
        conversation_id: ConversationId,
        question: impl Into<String>,
    ) -> Result<SessionId, RuntimeStopped> {
        let session_id = SessionId::new();
        self.send(Event::Submit {
            session_id,
            conversation_id,
            question: question.into(),
        })
        .await?;
        Ok(session_id)
    }

    /// Abandon the in-flight answer, if any
    ///
    /// # Errors
    ///
    /// The runtime task is gone.
    pub async fn cancel(&self) -> Result<(), RuntimeStopped> {
        self.send(Event::Cancel).await
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeStopped> {
        self.event_tx.send(event).await.map_err(|_| RuntimeStopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Latest rendered frame
    pub fn current_frame(&self) -> RenderFrame {
        self.frame_rx.borrow().clone()
    }
}

/// Spawn a copilot runtime on the current tokio runtime.
///
/// The task stops once every [`CopilotHandle`] has been dropped.
pub fn spawn<W>(context: CopilotContext, writer: W) -> CopilotHandle
where
    W: ThreadWriter + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
    let (frame_tx, frame_rx) = watch::channel(RenderFrame::idle());

    let runtime = CopilotRuntime::new(
        context,
        writer,
        event_rx,
        &event_tx,
        broadcast_tx.clone(),
        frame_tx,
    );
    tokio::spawn(runtime.run());

    CopilotHandle {
        event_tx,
        broadcast_tx,
        frame_rx,
    }
}
