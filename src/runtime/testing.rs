//! Mock implementations and harness for runtime tests

use super::traits::ThreadWriter;
use super::{spawn, CopilotHandle, PanelEvent};
use crate::config::WorkspaceConfig;
use crate::copilot::Catalog;
use crate::inbox::{ConversationId, MessageChannel, MessageId, NewMessage, ReduceError, SenderRole};
use crate::state_machine::{CopilotContext, RenderFrame, Stage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Recording writer
// ============================================================================

/// Writer that records every append instead of touching a store
#[derive(Default)]
pub struct RecordingWriter {
    appended: Mutex<Vec<(ConversationId, NewMessage)>>,
    next_id: AtomicU64,
}

impl RecordingWriter {
    pub fn appended(&self) -> Vec<(ConversationId, NewMessage)> {
        self.appended.lock().unwrap().clone()
    }

    /// Committed assistant answers, in order
    pub fn answers(&self) -> Vec<NewMessage> {
        self.appended()
            .into_iter()
            .map(|(_, m)| m)
            .filter(|m| m.sender == SenderRole::Assistant)
            .collect()
    }

    /// Recorded operator questions, in order
    pub fn questions(&self) -> Vec<String> {
        self.appended()
            .into_iter()
            .map(|(_, m)| m)
            .filter(|m| m.sender == SenderRole::Agent && m.channel == MessageChannel::Copilot)
            .map(|m| m.content)
            .collect()
    }
}

impl ThreadWriter for RecordingWriter {
    fn append(
        &self,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Result<MessageId, ReduceError> {
        self.appended
            .lock()
            .unwrap()
            .push((conversation_id.clone(), message));
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

// ============================================================================
// Runtime builder
// ============================================================================

pub struct TestRuntime {
    catalog: Catalog,
    config: WorkspaceConfig,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::builtin(),
            config: WorkspaceConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_timing(mut self, typing_tick: Duration, response_delay: Duration) -> Self {
        self.config = self
            .config
            .with_typing_tick(typing_tick)
            .with_response_delay(response_delay);
        self
    }

    pub fn spawn(self) -> (CopilotHandle, Arc<RecordingWriter>) {
        let writer = Arc::new(RecordingWriter::default());
        let context = CopilotContext::new(Arc::new(self.catalog), &self.config);
        (spawn(context, writer.clone()), writer)
    }
}

/// Collect panel events until an answer is committed
pub async fn collect_until_commit(rx: &mut broadcast::Receiver<PanelEvent>) -> Vec<PanelEvent> {
    let mut events = Vec::new();
    loop {
        let event = rx.recv().await.expect("panel stream closed");
        let done = matches!(event, PanelEvent::Committed { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

fn frames(events: &[PanelEvent]) -> Vec<&RenderFrame> {
    events
        .iter()
        .filter_map(|e| match e {
            PanelEvent::Frame(f) => Some(f),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copilot::{AssistantProfile, ResponseDefinition};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn refund_question_types_and_commits() {
        let (handle, writer) = TestRuntime::new().spawn();
        let mut rx = handle.subscribe();

        handle.submit("luis".into(), "I want a refund please").await.unwrap();
        let events = collect_until_commit(&mut rx).await;
        let frames = frames(&events);

        let body = Catalog::builtin().resolve("refund").content.clone();
        let body_len = body.chars().count();

        // awaiting, empty typing frame, one frame per tick, complete
        assert_eq!(frames.len(), body_len + 3);
        assert!(frames[0].awaiting);
        assert_eq!(frames[1].stage, Stage::Typing);
        assert!(frames[1].text.is_empty());
        for (i, frame) in frames[1..=body_len].iter().enumerate() {
            assert_eq!(frame.text.chars().count(), i);
        }
        let done = frames.last().unwrap();
        assert_eq!(done.stage, Stage::Complete);
        assert_eq!(done.text, body);
        assert_eq!(done.sources.len(), 3);
        assert!(done.offers_insert);

        assert_eq!(writer.questions(), vec!["I want a refund please".to_string()]);
        let answers = writer.answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].content, body);
        assert_eq!(handle.current_frame(), **done);
    }

    #[tokio::test(start_paused = true)]
    async fn timing_follows_configuration() {
        let catalog = Catalog::new(
            AssistantProfile::default(),
            vec![ResponseDefinition::new("hi", "abcd", vec![])],
            ResponseDefinition::fallback("?"),
            vec![],
        )
        .unwrap();
        let (handle, _writer) = TestRuntime::new()
            .with_catalog(catalog)
            .with_timing(Duration::from_millis(10), Duration::from_millis(100))
            .spawn();
        let mut rx = handle.subscribe();

        let start = Instant::now();
        handle.submit("luis".into(), "hi").await.unwrap();
        collect_until_commit(&mut rx).await;

        // response delay + 4 ticks + completion delay
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(240) && elapsed < Duration::from_millis(250),
            "{elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_question_replaces_first_mid_typing() {
        let (handle, writer) = TestRuntime::new().spawn();
        let mut rx = handle.subscribe();

        let first = handle.submit("luis".into(), "refund").await.unwrap();
        loop {
            if let PanelEvent::Frame(frame) = rx.recv().await.unwrap() {
                if frame.text.chars().count() >= 5 {
                    break;
                }
            }
        }

        let second = handle.submit("luis".into(), "what is the weather").await.unwrap();
        let events = collect_until_commit(&mut rx).await;

        assert!(events.contains(&PanelEvent::Cancelled { session_id: first }));
        let PanelEvent::Committed { session_id, .. } = events.last().unwrap() else {
            panic!("expected commit");
        };
        assert_eq!(*session_id, second);

        // Nothing from the first session surfaces after the cancellation
        let cancelled_at = events
            .iter()
            .position(|e| *e == PanelEvent::Cancelled { session_id: first })
            .unwrap();
        assert!(frames(&events[cancelled_at..])
            .iter()
            .all(|f| f.session_id == Some(second)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        let answers = writer.answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].content, Catalog::builtin().fallback().content);
        assert_eq!(writer.questions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_in_flight_answer() {
        let (handle, writer) = TestRuntime::new().spawn();
        let mut rx = handle.subscribe();

        let session = handle.submit("luis".into(), "refund").await.unwrap();
        handle.cancel().await.unwrap();

        let mut saw_cancel = false;
        while let Ok(Ok(event)) =
            tokio::time::timeout(Duration::from_secs(5), rx.recv()).await
        {
            if event == (PanelEvent::Cancelled { session_id: session }) {
                saw_cancel = true;
            }
            assert!(!matches!(event, PanelEvent::Committed { .. }));
        }

        assert!(saw_cancel);
        assert_eq!(handle.current_frame(), RenderFrame::idle());
        assert!(writer.answers().is_empty());
        assert_eq!(writer.questions(), vec!["refund".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_question_is_ignored() {
        let (handle, writer) = TestRuntime::new().spawn();
        handle.submit("luis".into(), "   ").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(writer.appended().is_empty());
        assert_eq!(handle.current_frame(), RenderFrame::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn runtime_stops_when_handles_drop() {
        let (handle, _writer) = TestRuntime::new().spawn();
        let mut rx = handle.subscribe();
        drop(handle);

        // Sender held by the runtime goes away with it
        let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(matches!(closed, Ok(Err(broadcast::error::RecvError::Closed))));
    }
}
