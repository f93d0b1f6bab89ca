//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must hold after every batch the runtime
//! processes, whatever the script. The harness extracts observable state from
//! the App, the Bridge, and the driver into a [`SessionSnapshot`], then runs
//! registered [`Invariant`] checks against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SessionSnapshot::capture(runtime.app(), runtime.bridge(), timers, &sent);
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{
    ActivatedAtIffActive, AlertsWithinAttemptBudget, CheckInRemainingInRange, CountdownInRange,
    NoLeakedTimers, ViewMatchesControllers,
};
pub use snapshot::SessionSnapshot;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Identifies a standard invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// `activated_at_ms` is set exactly while SOS is active.
    ActivatedAtIffActive,
    /// Countdown seconds stay within the configured grace period.
    CountdownInRange,
    /// Check-in remaining seconds stay within the selected duration.
    CheckInRemainingInRange,
    /// Every armed platform timer belongs to a controller, and back.
    NoLeakedTimers,
    /// Escalations never send more alerts than attempts allowed.
    AlertsWithinAttemptBudget,
    /// The view mirrors the controllers after every batch.
    ViewMatchesControllers,
    /// Registered from outside the harness.
    Custom(&'static str),
}

impl std::fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ActivatedAtIffActive => "activated_at_iff_active",
            Self::CountdownInRange => "countdown_in_range",
            Self::CheckInRemainingInRange => "checkin_remaining_in_range",
            Self::NoLeakedTimers => "no_leaked_timers",
            Self::AlertsWithinAttemptBudget => "alerts_within_attempt_budget",
            Self::ViewMatchesControllers => "view_matches_controllers",
            Self::Custom(name) => name,
        })
    }
}

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which invariant.
    pub invariant: InvariantKind,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against session state.
pub trait Invariant: Send + Sync {
    /// Which invariant this is.
    fn kind(&self) -> InvariantKind;

    /// Check the invariant against the current state.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Use [`InvariantRegistry::standard()`] for every session invariant.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with every standard session invariant.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ActivatedAtIffActive);
        registry.add(CountdownInRange);
        registry.add(CheckInRemainingInRange);
        registry.add(NoLeakedTimers);
        registry.add(AlertsWithinAttemptBudget);
        registry.add(ViewMatchesControllers);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
