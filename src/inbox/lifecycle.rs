//! Message lifecycle policy
//!
//! A message moves `unread -> read` exactly once; `read` is terminal.
//! Contact messages are stamped with a seen time on that transition.

use super::message::{Message, MessageState, SenderRole};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A message whose lifecycle fields contradict each other
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleViolation {
    #[error("message {0} has a seen time but is still unread")]
    SeenWhileUnread(u64),
    #[error("message {0} was seen before it was received")]
    SeenBeforeReceived(u64),
}

/// Transition a message to `read`.
///
/// Returns `None` when the message is already read, so callers can keep
/// sharing the original value. The seen time is never overwritten and never
/// precedes the arrival time.
pub fn mark_read(message: &Message, now: DateTime<Utc>) -> Option<Message> {
    if message.state == MessageState::Read {
        return None;
    }

    let mut next = message.clone();
    next.state = MessageState::Read;
    if next.sender() == SenderRole::Contact && next.seen_time.is_none() {
        next.seen_time = Some(now.max(next.received_time()));
    }
    Some(next)
}

/// Check the lifecycle invariants of a single message
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate(message: &Message) -> Result<(), LifecycleViolation> {
    let Some(seen) = message.seen_time() else {
        return Ok(());
    };
    if message.state() != MessageState::Read {
        return Err(LifecycleViolation::SeenWhileUnread(message.id().0));
    }
    if seen < message.received_time() {
        return Err(LifecycleViolation::SeenBeforeReceived(message.id().0));
    }
    Ok(())
}
