//! Property-based tests for the copilot state machine
//!
//! A small driver keeps every timer ever scheduled, cancelled or not, and
//! fires them in arbitrary order between operator actions.

use super::*;
use crate::config::WorkspaceConfig;
use crate::copilot::{AssistantProfile, Catalog, ResponseDefinition};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> CopilotContext {
    let catalog = Catalog::new(
        AssistantProfile::default(),
        vec![
            ResponseDefinition::new("refund", "Send the order id.", vec![]),
            ResponseDefinition::new("ship", "Two days.", vec![]),
        ],
        ResponseDefinition::fallback("Rephrase?"),
        vec![],
    )
    .expect("valid catalog");
    CopilotContext::new(Arc::new(catalog), &WorkspaceConfig::default())
}

#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Cancel,
    /// Fire the n-th scheduled timer (modulo how many exist)
    Fire(usize),
}

fn arb_question() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("I want a REFUND".to_string()),
        Just("when will it ship".to_string()),
        "[a-z ]{1,12}",
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => arb_question().prop_map(Op::Submit),
        1 => Just(Op::Cancel),
        6 => any::<usize>().prop_map(Op::Fire),
    ]
}

struct Driver {
    ctx: CopilotContext,
    state: CopilotState,
    timers: Vec<Event>,
    latest: Option<(SessionId, String)>,
    commits: Vec<(SessionId, String)>,
}

impl Driver {
    fn new() -> Self {
        Self {
            ctx: test_context(),
            state: CopilotState::Idle,
            timers: Vec::new(),
            latest: None,
            commits: Vec::new(),
        }
    }

    fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.state, &self.ctx, event)?;
        for effect in &result.effects {
            match effect {
                Effect::ScheduleTimer { event, .. } => self.timers.push(event.clone()),
                Effect::CommitResponse {
                    session_id,
                    content,
                    ..
                } => self.commits.push((*session_id, content.clone())),
                _ => {}
            }
        }
        self.state = result.new_state;
        Ok(())
    }

    fn run(&mut self, op: Op) -> Result<(), TransitionError> {
        match op {
            Op::Submit(question) => {
                let session_id = SessionId::new();
                self.apply(Event::Submit {
                    session_id,
                    conversation_id: "luis".into(),
                    question: question.clone(),
                })?;
                self.latest = Some((session_id, question));
                Ok(())
            }
            Op::Cancel => {
                self.latest = None;
                self.apply(Event::Cancel)
            }
            Op::Fire(n) if !self.timers.is_empty() => {
                let event = self.timers[n % self.timers.len()].clone();
                self.apply(event)
            }
            Op::Fire(_) => Ok(()),
        }
    }

    /// Fire only the newest timer until nothing more is scheduled
    fn drain(&mut self) {
        while let Some(event) = self.timers.last().cloned() {
            if self.apply(event).is_err() {
                break;
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Rejected events never alter the state
    #[test]
    fn prop_rejections_leave_state_untouched(ops in proptest::collection::vec(arb_op(), 0..60)) {
        let mut driver = Driver::new();
        for op in ops {
            let before = driver.state.clone();
            let was_fire = matches!(op, Op::Fire(_));
            if let Err(err) = driver.run(op) {
                if was_fire {
                    prop_assert!(matches!(err, TransitionError::StaleTimer(_)), "{err}");
                } else {
                    prop_assert_eq!(&err, &TransitionError::EmptyQuestion);
                }
                prop_assert_eq!(&driver.state, &before);
            }
        }
    }

    // Every commit belongs to the session that was current when it happened
    // and carries exactly the body resolved for its question
    #[test]
    fn prop_commits_match_latest_submission(ops in proptest::collection::vec(arb_op(), 0..60)) {
        let mut driver = Driver::new();
        for op in ops {
            let commits_before = driver.commits.len();
            let _ = driver.run(op);
            if driver.commits.len() > commits_before {
                let (committed_id, content) = driver.commits.last().cloned().unwrap();
                let (latest_id, question) = driver.latest.clone().expect("commit without a session");
                prop_assert_eq!(committed_id, latest_id);
                prop_assert_eq!(&content, &driver.ctx.catalog.resolve(&question).content);
            }
        }
    }

    // A session that is left alone takes one tick per character, then commits
    #[test]
    fn prop_uninterrupted_session_ticks_per_character(
        question in arb_question().prop_filter("blank", |q| !q.trim().is_empty())
    ) {
        let mut driver = Driver::new();
        driver.run(Op::Submit(question.clone())).unwrap();
        driver.drain();

        let ticks = driver
            .timers
            .iter()
            .filter(|e| matches!(e, Event::TypingTick { .. }))
            .count();
        prop_assert_eq!(ticks, driver.ctx.catalog.resolve(&question).char_len());
        prop_assert_eq!(driver.commits.len(), 1);
        prop_assert_eq!(driver.state.stage(), Stage::Complete);
    }

    // Cancel from any point leaves nothing that can still commit
    #[test]
    fn prop_cancel_prevents_commit(ops in proptest::collection::vec(arb_op(), 0..30)) {
        let mut driver = Driver::new();
        for op in ops {
            let _ = driver.run(op);
        }
        let commits = driver.commits.len();
        driver.run(Op::Cancel).unwrap();
        prop_assert!(!driver.state.is_busy());

        for event in driver.timers.clone() {
            let _ = driver.apply(event);
        }
        prop_assert_eq!(driver.commits.len(), commits);
    }
}
