//! Cancellable timers
//!
//! Each scheduled delay is a spawned task racing a `CancellationToken`.
//! Once cancelled, a timer never delivers its event.

use crate::state_machine::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A pending delayed event
pub struct TimerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Deliver `event` on `event_tx` after `delay` unless cancelled first.
    ///
    /// The sender is weak so pending timers never keep a stopped runtime's
    /// channel open.
    pub fn schedule(delay: Duration, event: Event, event_tx: mpsc::WeakSender<Event>) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if let Some(tx) = event_tx.upgrade() {
                        let _ = tx.send(event).await;
                    }
                }
            }
        });
        Self { token, task }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Timers owned by the in-flight session
#[derive(Default)]
pub struct SessionTimers {
    pending: Vec<TimerHandle>,
}

impl SessionTimers {
    pub fn push(&mut self, timer: TimerHandle) {
        self.pending.retain(|t| !t.is_finished());
        self.pending.push(timer);
    }

    /// Cancel everything; returns how many timers were still pending
    pub fn cancel_all(&mut self) -> usize {
        let pending = self.pending.iter().filter(|t| !t.is_finished()).count();
        for timer in self.pending.drain(..) {
            timer.cancel();
        }
        pending
    }

    pub fn len(&self) -> usize {
        self.pending.iter().filter(|t| !t.is_finished()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
