//! Deterministic simulation harness for SafeLine.
//!
//! Virtual-time implementations of the Environment and Driver traits for
//! deterministic, reproducible testing of whole sessions: countdowns, check-in
//! expiries, flaky messaging, and failing storage.
//!
//! # Scenarios
//!
//! [`Scenario`] runs the production [`safeline_app::Runtime`] over a
//! [`SimDriver`] and returns the final [`World`].
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real bridge, and
//! their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! batch. Use [`InvariantRegistry::standard()`] for the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_transport;
pub mod timer_wheel;

pub use invariants::{
    ActivatedAtIffActive, AlertsWithinAttemptBudget, CheckInRemainingInRange, CountdownInRange,
    Invariant, InvariantKind, InvariantRegistry, InvariantResult, NoLeakedTimers, SessionSnapshot,
    ViewMatchesControllers, Violation,
};
pub use model::{
    ModelCheckIn, ModelDispatch, ModelSession, ModelSos, ModelWorld, ObservableState, Operation,
    RealWorld,
};
pub use scenario::{AlertSummary, Oracle, Scenario, ScenarioError, World, WorldSummary};
pub use sim_driver::{SimDriver, SimDriverError, SimLog};
pub use sim_env::{SIM_EPOCH_MS, SimEnv, SimInstant};
pub use sim_transport::{AlertPolicy, ScriptedTransport, SimLocation};
pub use timer_wheel::TimerWheel;
