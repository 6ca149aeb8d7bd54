//! Property-based tests for the inbox reducer
//!
//! These tests verify the lifecycle invariants hold for any sequence of
//! actions.

use super::message::unread_contact;
use super::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

const IDS: [&str; 3] = ["luis", "ivan", "ghost"];

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap()
}

fn arb_snapshot() -> impl Strategy<Value = InboxSnapshot> {
    (0usize..4, 0usize..4).prop_map(|(luis, ivan)| {
        let mut next_id = 1;
        let mut messages = |count: usize| {
            (0..count)
                .map(|i| {
                    let msg = unread_contact(next_id, base_time() + Duration::minutes(i as i64));
                    next_id += 1;
                    msg
                })
                .collect::<Vec<_>>()
        };
        let luis_messages = messages(luis);
        let ivan_messages = messages(ivan);
        InboxSnapshot::new(vec![
            Conversation::new("luis", "Luis", luis_messages),
            Conversation::new("ivan", "Ivan", ivan_messages),
        ])
    })
}

fn arb_new_message() -> impl Strategy<Value = NewMessage> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(NewMessage::contact),
        "[a-z ]{0,12}".prop_map(NewMessage::agent),
        "[a-z ]{0,12}".prop_map(NewMessage::copilot_question),
        "[a-z ]{1,12}".prop_map(|text| NewMessage::copilot_answer(text, vec![])),
    ]
}

fn arb_action() -> impl Strategy<Value = InboxAction> {
    let id = prop::sample::select(IDS.to_vec()).prop_map(ConversationId::from);
    prop_oneof![
        (id.clone(), arb_new_message()).prop_map(|(conversation_id, message)| {
            InboxAction::AppendMessage {
                conversation_id,
                message,
            }
        }),
        id.clone().prop_map(|conversation_id| InboxAction::MarkAllRead { conversation_id }),
        (id, 1u64..12).prop_map(|(conversation_id, message_id)| {
            InboxAction::MarkMessageRead {
                conversation_id,
                message_id: MessageId(message_id),
            }
        }),
    ]
}

fn apply_all(snapshot: &InboxSnapshot, actions: &[InboxAction]) -> InboxSnapshot {
    actions
        .iter()
        .enumerate()
        .fold(snapshot.clone(), |snap, (i, action)| {
            let now = base_time() + Duration::minutes(30 + i as i64);
            reduce(&snap, action, now).unwrap_or(snap)
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn seen_time_implies_read(
        snapshot in arb_snapshot(),
        actions in prop::collection::vec(arb_action(), 0..20),
    ) {
        let end = apply_all(&snapshot, &actions);
        for conversation in end.conversations() {
            for message in conversation.messages() {
                if message.seen_time().is_some() {
                    prop_assert_eq!(message.state(), MessageState::Read);
                }
                prop_assert!(lifecycle::validate(message).is_ok());
            }
        }
    }

    #[test]
    fn only_contact_messages_acquire_seen_time(
        snapshot in arb_snapshot(),
        actions in prop::collection::vec(arb_action(), 0..20),
    ) {
        let end = apply_all(&snapshot, &actions);
        for conversation in end.conversations() {
            for message in conversation.messages() {
                if message.sender() != SenderRole::Contact {
                    prop_assert!(message.seen_time().is_none());
                }
            }
        }
    }

    #[test]
    fn mark_all_read_is_idempotent(
        snapshot in arb_snapshot(),
        actions in prop::collection::vec(arb_action(), 0..10),
        target in prop::sample::select(IDS.to_vec()),
    ) {
        let snap = apply_all(&snapshot, &actions);
        let action = InboxAction::MarkAllRead { conversation_id: target.into() };
        let now = base_time() + Duration::hours(2);

        match reduce(&snap, &action, now) {
            Ok(once) => {
                let twice = reduce(&once, &action, now + Duration::minutes(1)).unwrap();
                prop_assert_eq!(&once, &twice);
                prop_assert_eq!(once.unread_count(&target.into()), Some(0));
            }
            Err(err) => prop_assert_eq!(err, ReduceError::UnknownConversation(target.into())),
        }
    }

    #[test]
    fn seen_time_is_set_at_most_once(
        snapshot in arb_snapshot(),
        actions in prop::collection::vec(arb_action(), 0..20),
    ) {
        let mut snap = snapshot;
        let mut first_seen = std::collections::HashMap::new();
        for (i, action) in actions.iter().enumerate() {
            let now = base_time() + Duration::minutes(30 + i as i64);
            snap = reduce(&snap, action, now).unwrap_or(snap);
            for conversation in snap.conversations() {
                for message in conversation.messages() {
                    if let Some(seen) = message.seen_time() {
                        let recorded = *first_seen.entry(message.id()).or_insert(seen);
                        prop_assert_eq!(recorded, seen);
                    }
                }
            }
        }
    }

    #[test]
    fn append_preserves_arrival_order(
        snapshot in arb_snapshot(),
        actions in prop::collection::vec(arb_action(), 0..20),
    ) {
        let end = apply_all(&snapshot, &actions);
        for conversation in end.conversations() {
            let times: Vec<_> = conversation.messages().iter().map(Message::received_time).collect();
            prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
            let ids: Vec<_> = conversation.messages().iter().map(Message::id).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn total_unread_is_sum_of_conversations(
        snapshot in arb_snapshot(),
        actions in prop::collection::vec(arb_action(), 0..20),
    ) {
        let end = apply_all(&snapshot, &actions);
        let sum: usize = end.conversations().map(Conversation::unread_count).sum();
        prop_assert_eq!(end.total_unread(), sum);
    }
}
