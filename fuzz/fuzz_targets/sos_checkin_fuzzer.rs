//! Fuzz target for the SOS and check-in controllers
//!
//! Drives the production bridge and the reference model with the same
//! operation sequence.
//!
//! # Strategy
//!
//! - Arbitrary interleavings of SOS, check-in, contact, and transport
//!   operations
//! - Short countdowns and windows so escalations happen within a few ticks
//!
//! # Invariants
//!
//! - Observable state of bridge and model agree after every operation
//! - Standard session invariants hold after every operation
//! - NEVER panic on any operation sequence

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use safeline_harness::{InvariantRegistry, ModelSession, ModelWorld, Operation, RealWorld};

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    seed: u64,
    countdown_secs: u8,
    max_dispatch_attempts: u8,
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: Scenario| {
    let session = ModelSession {
        countdown_secs: u32::from(scenario.countdown_secs % 6),
        max_dispatch_attempts: u32::from(scenario.max_dispatch_attempts % 4) + 1,
        ..ModelSession::default()
    };
    let invariants = InvariantRegistry::standard();

    let mut model = ModelWorld::new(session);
    let mut real = RealWorld::new(session, scenario.seed);

    for (step, op) in scenario.operations.iter().take(256).enumerate() {
        model.apply(op);
        real.apply(op);

        assert_eq!(
            model.observable_state(),
            real.observable_state(),
            "diverged at step {step} after {op:?}"
        );
        invariants.assert_all(&real.snapshot(), &format!("step {step} after {op:?}"));
    }
});
