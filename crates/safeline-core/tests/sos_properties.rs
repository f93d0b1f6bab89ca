//! Property tests for the SOS lifecycle controller.
//!
//! Drives the controller with arbitrary interleavings of user input, ticks
//! (current and stale), and dispatch outcomes, then checks the lifecycle
//! invariants after every event.

use std::time::Duration;

use proptest::prelude::*;
use safeline_core::{
    DeliveryReport, DeliveryStatus, DispatchError, Environment, Escalation, SosAction, SosConfig,
    SosController, SosEvent, SosStatus, TimerId, env::test_utils::MockEnv,
};

#[derive(Debug, Clone)]
enum Op {
    Trigger,
    Cancel,
    Resolve,
    Escalate,
    Tick,
    StaleTick,
    Deliver,
    Fail,
    LateOutcome,
    Retry,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Trigger),
        1 => Just(Op::Cancel),
        1 => Just(Op::Resolve),
        1 => Just(Op::Escalate),
        6 => Just(Op::Tick),
        1 => Just(Op::StaleTick),
        1 => Just(Op::Deliver),
        1 => Just(Op::Fail),
        1 => Just(Op::LateOutcome),
        1 => Just(Op::Retry),
    ]
}

struct Observed {
    automatic_dispatches: u64,
    retries: u64,
    failures: u64,
}

proptest! {
    #[test]
    fn lifecycle_invariants_hold(ops in prop::collection::vec(op(), 0..200)) {
        let env = MockEnv::default();
        let config = SosConfig::default();
        let max_attempts = config.max_dispatch_attempts;
        let mut sos = SosController::new(env.clone(), config);
        let mut stale: Vec<TimerId> = Vec::new();
        let mut seen = Observed { automatic_dispatches: 0, retries: 0, failures: 0 };

        for op in ops {
            env.advance(Duration::from_millis(250));
            let before = sos.state();
            let armed = sos.armed_timer();

            let actions = match op {
                Op::Trigger => sos.handle(SosEvent::Trigger),
                Op::Cancel => sos.handle(SosEvent::Cancel),
                Op::Resolve => sos.handle(SosEvent::Resolve),
                Op::Escalate => sos.handle(SosEvent::Escalate),
                Op::Tick => match armed {
                    Some(id) => sos.handle(SosEvent::TimerFired(id)),
                    None => vec![],
                },
                Op::StaleTick => match stale.last() {
                    Some(&id) => {
                        let actions = sos.handle(SosEvent::TimerFired(id));
                        prop_assert!(actions.is_empty());
                        prop_assert_eq!(&sos.state(), &before);
                        actions
                    },
                    None => vec![],
                },
                Op::Deliver => match before.escalation {
                    Some(escalation) => sos.handle(SosEvent::DispatchCompleted {
                        escalation,
                        outcome: Ok(DeliveryReport { recipients: 1, status: DeliveryStatus::Sent }),
                    }),
                    None => vec![],
                },
                Op::Fail => match before.escalation {
                    Some(escalation) => sos.handle(SosEvent::DispatchCompleted {
                        escalation,
                        outcome: Err(DispatchError::Unavailable("offline".into())),
                    }),
                    None => vec![],
                },
                Op::LateOutcome => {
                    let older = Escalation::new(sos.escalations().saturating_sub(1));
                    let actions = sos.handle(SosEvent::DispatchCompleted {
                        escalation: older,
                        outcome: Err(DispatchError::Cancelled),
                    });
                    if before.escalation != Some(older) {
                        prop_assert!(actions.is_empty());
                        prop_assert_eq!(&sos.state(), &before);
                    }
                    actions
                },
                Op::Retry => sos.handle(SosEvent::RetryDispatch),
            };

            if armed.is_some() && armed != sos.armed_timer() {
                stale.extend(armed);
            }

            for action in &actions {
                match action {
                    SosAction::Dispatch { attempt: 1, .. } => seen.automatic_dispatches += 1,
                    SosAction::Dispatch { attempt, .. } => {
                        prop_assert!(*attempt <= max_attempts);
                        seen.retries += 1;
                    },
                    SosAction::ReportError { .. } => seen.failures += 1,
                    _ => {},
                }
            }

            let state = sos.state();
            prop_assert_eq!(state.activated_at_ms.is_some(), state.status == SosStatus::Active);
            prop_assert_eq!(seen.automatic_dispatches, sos.escalations());
            prop_assert!(seen.retries <= seen.failures);

            if before.status != SosStatus::Countdown || state.status != SosStatus::Countdown {
                if state.status != SosStatus::Countdown {
                    prop_assert!(state.countdown_seconds == 0 || state.countdown_seconds == 5);
                }
            } else {
                prop_assert!(state.countdown_seconds <= before.countdown_seconds);
                prop_assert!(before.countdown_seconds - state.countdown_seconds <= 1);
            }

            let timed = matches!(state.status, SosStatus::Countdown | SosStatus::Resolved);
            prop_assert_eq!(sos.armed_timer().is_some(), timed);
        }
    }
}

/// Trigger, five ticks, no cancel: active with one dispatch.
#[test]
fn five_ticks_escalate_once() {
    let env = MockEnv::default();
    let mut sos = SosController::new(env.clone(), SosConfig::default());
    let mut actions = sos.handle(SosEvent::Trigger);

    for _ in 0..5 {
        env.advance(Duration::from_secs(1));
        let id = sos.armed_timer().unwrap();
        actions.extend(sos.handle(SosEvent::TimerFired(id)));
    }

    let state = sos.state();
    assert_eq!(state.status, SosStatus::Active);
    assert_eq!(state.activated_at_ms, Some(env.wall_clock_ms()));
    assert_eq!(actions.iter().filter(|a| matches!(a, SosAction::Dispatch { .. })).count(), 1);
}
