//! Model-based property tests.
//!
//! Random operation sequences are applied to the reference model and to the
//! production bridge; their observable states must agree after every step.
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelWorld     RealWorld       Compare
//!      (reference)    (Bridge)        states
//! ```

use proptest::prelude::*;
use safeline_harness::{InvariantRegistry, ModelSession, ModelWorld, Operation, RealWorld};

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => Just(Operation::TriggerSos),
        1 => Just(Operation::CancelSos),
        1 => Just(Operation::ResolveSos),
        2 => Just(Operation::RetryAlert),
        4 => Just(Operation::TickSos),
        2 => Just(Operation::StartCheckIn),
        1 => Just(Operation::PauseCheckIn),
        1 => Just(Operation::ResumeCheckIn),
        1 => Just(Operation::DismissCheckIn),
        1 => Just(Operation::EscalateCheckIn),
        1 => Just(Operation::ResetCheckIn),
        2 => any::<u8>().prop_map(|ticks| Operation::TickCheckIn { ticks }),
        2 => Just(Operation::AddContact),
        1 => Just(Operation::RemoveContact),
        3 => any::<bool>().prop_map(|delivered| Operation::CompleteAlert { delivered }),
    ]
}

fn session() -> impl Strategy<Value = ModelSession> {
    (0u32..4, 1u32..4).prop_map(|(countdown_secs, max_dispatch_attempts)| ModelSession {
        countdown_secs,
        max_dispatch_attempts,
        checkin_minutes: 1,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_bridge_matches_model(
        session in session(),
        seed in any::<u64>(),
        ops in prop::collection::vec(operation(), 0..150),
    ) {
        let mut model = ModelWorld::new(session);
        let mut real = RealWorld::new(session, seed);
        let invariants = InvariantRegistry::standard();

        for (step, op) in ops.iter().enumerate() {
            model.apply(op);
            real.apply(op);

            prop_assert_eq!(
                real.observable_state(),
                model.observable_state(),
                "diverged at step {} after {:?}",
                step,
                op
            );
            if let Err(violations) = invariants.check_all(&real.snapshot()) {
                prop_assert!(false, "step {} after {:?}: {:?}", step, op, violations);
            }
        }
    }
}

#[test]
fn check_in_expiry_then_window_escalates() {
    let session = ModelSession::default();
    let mut model = ModelWorld::new(session);
    let mut real = RealWorld::new(session, 1);
    let ops = [
        Operation::AddContact,
        Operation::StartCheckIn,
        Operation::TickCheckIn { ticks: 60 },
        Operation::TickCheckIn { ticks: 1 },
        Operation::CompleteAlert { delivered: true },
    ];

    for op in &ops {
        model.apply(op);
        real.apply(op);
    }

    assert_eq!(real.observable_state(), model.observable_state());
    assert_eq!(real.observable_state().escalations, 1);
    assert_eq!(real.sent().len(), 1);
}
