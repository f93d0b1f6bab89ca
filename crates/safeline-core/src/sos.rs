//! SOS lifecycle controller.
//!
//! Owns the single emergency-alert state machine and requests the alert
//! dispatch when escalation completes. Contacts, location, and messaging are
//! collaborators: the controller only asks for a dispatch and is told the
//! outcome.
//!
//! # State Machine
//!
//! ```text
//!          trigger                 countdown hits 0
//!  ┌──────┐ ───────> ┌───────────┐ ───────────────> ┌────────┐
//!  │ Idle │          │ Countdown │                  │ Active │
//!  └──────┘ <─────── └───────────┘                  └────────┘
//!    ^  │   cancel         │ escalate                 ^  │ resolve
//!    │  └─────────────────────────────────────────────┘  v
//!    │                     escalate               ┌──────────┐
//!    └─────────────────────────────────────────── │ Resolved │
//!                  hold elapsed                   └──────────┘
//! ```
//!
//! # Invariants
//!
//! - `activated_at_ms` is `Some` iff the status is `Active`.
//! - The countdown only moves while the status is `Countdown`.
//! - Exactly one automatic dispatch per transition into `Active`. Each
//!   transition gets a new [`Escalation`]; outcomes for older escalations are
//!   ignored.
//! - A failed dispatch keeps the status `Active` and is reported.
//! - Events that do not apply to the current state are no-ops. Ticks from a
//!   timer that is no longer armed are no-ops.

use std::{fmt, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    alert::{DeliveryOutcome, DeliveryReport},
    env::Environment,
    error::DispatchError,
    timer::{TimerCommand, TimerId, TimerMode, TimerOwner, TimerSlot},
};

/// Default grace period before escalation, in seconds.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 5;

/// Default countdown tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default time spent in `Resolved` before returning to `Idle`.
pub const DEFAULT_RESOLVED_HOLD: Duration = Duration::from_secs(2);

/// Default cap on dispatch attempts per escalation (first attempt plus
/// user-requested retries).
pub const DEFAULT_MAX_DISPATCH_ATTEMPTS: u32 = 3;

/// SOS controller configuration.
#[derive(Debug, Clone)]
pub struct SosConfig {
    /// Grace period in ticks. Zero escalates on trigger.
    pub countdown_secs: u32,
    /// Interval between countdown ticks.
    pub tick_interval: Duration,
    /// Time spent in `Resolved`. Zero returns to `Idle` immediately.
    pub resolved_hold: Duration,
    /// Attempts allowed per escalation, including the automatic one.
    pub max_dispatch_attempts: u32,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick_interval: DEFAULT_TICK_INTERVAL,
            resolved_hold: DEFAULT_RESOLVED_HOLD,
            max_dispatch_attempts: DEFAULT_MAX_DISPATCH_ATTEMPTS,
        }
    }
}

/// Sequence number of one transition into `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Escalation(u64);

impl Escalation {
    /// Wrap a raw sequence number.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw sequence number.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Externally visible SOS status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SosStatus {
    /// Resting state.
    Idle,
    /// Cancellable grace period.
    Countdown,
    /// Emergency raised.
    Active,
    /// User confirmed safety; returns to idle on its own.
    Resolved,
}

impl fmt::Display for SosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Countdown => "countdown",
            Self::Active => "active",
            Self::Resolved => "resolved",
        })
    }
}

/// Progress of the alert for the current escalation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for the transport.
    InFlight {
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// Delivered.
    Delivered(DeliveryReport),
    /// Attempt failed.
    Failed {
        /// Attempt that failed.
        attempt: u32,
        /// Why.
        error: DispatchError,
    },
}

/// Read-only snapshot of the SOS state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosState {
    /// Current status.
    pub status: SosStatus,
    /// Wall-clock escalation time. `Some` iff `Active`.
    pub activated_at_ms: Option<u64>,
    /// Remaining grace seconds while counting; the configured default when
    /// idle or resolved; zero when active.
    pub countdown_seconds: u32,
    /// Current escalation while `Active`.
    pub escalation: Option<Escalation>,
    /// Dispatch progress while `Active`.
    pub dispatch: Option<DispatchState>,
}

/// Input to the SOS controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SosEvent {
    /// User pressed SOS.
    Trigger,
    /// User cancelled during the countdown.
    Cancel,
    /// User confirmed they are safe.
    Resolve,
    /// Direct entry into `Active`, skipping the countdown.
    Escalate,
    /// A timer armed by this controller fired.
    TimerFired(TimerId),
    /// Transport finished a dispatch.
    DispatchCompleted {
        /// Escalation the dispatch belonged to.
        escalation: Escalation,
        /// Outcome.
        outcome: DeliveryOutcome,
    },
    /// User asked to send the alert again after a failure.
    RetryDispatch,
    /// Session teardown.
    Shutdown,
}

/// Output of the SOS controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SosAction {
    /// Arm or cancel a timer.
    Timer(TimerCommand),
    /// Compose and send the emergency alert.
    Dispatch {
        /// Escalation to tag the request with.
        escalation: Escalation,
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// Status changed.
    StatusChanged {
        /// Previous status.
        from: SosStatus,
        /// New status.
        to: SosStatus,
    },
    /// Dispatch failed; tell the user.
    ReportError {
        /// Escalation the failure belongs to.
        escalation: Escalation,
        /// Why.
        error: DispatchError,
    },
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Countdown { remaining: u32 },
    Active { activated_at_ms: u64, escalation: Escalation, dispatch: DispatchState },
    Resolved,
}

impl Phase {
    fn status(&self) -> SosStatus {
        match self {
            Self::Idle => SosStatus::Idle,
            Self::Countdown { .. } => SosStatus::Countdown,
            Self::Active { .. } => SosStatus::Active,
            Self::Resolved => SosStatus::Resolved,
        }
    }
}

/// SOS lifecycle state machine.
///
/// Created at session start in `Idle`; never persisted.
#[derive(Debug)]
pub struct SosController<E: Environment> {
    env: E,
    config: SosConfig,
    phase: Phase,
    timer: TimerSlot,
    escalations: u64,
}

impl<E: Environment> SosController<E> {
    /// Create a controller in `Idle`.
    pub fn new(env: E, config: SosConfig) -> Self {
        Self { env, config, phase: Phase::Idle, timer: TimerSlot::new(TimerOwner::Sos), escalations: 0 }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SosEvent) -> Vec<SosAction> {
        match event {
            SosEvent::Trigger => self.trigger(),
            SosEvent::Cancel => self.cancel(),
            SosEvent::Resolve => self.resolve(),
            SosEvent::Escalate => self.escalate(),
            SosEvent::TimerFired(id) => self.timer_fired(id),
            SosEvent::DispatchCompleted { escalation, outcome } => {
                self.dispatch_completed(escalation, outcome)
            },
            SosEvent::RetryDispatch => self.retry_dispatch(),
            SosEvent::Shutdown => self.shutdown(),
        }
    }

    /// Read-only snapshot.
    pub fn state(&self) -> SosState {
        match &self.phase {
            Phase::Idle | Phase::Resolved => SosState {
                status: self.phase.status(),
                activated_at_ms: None,
                countdown_seconds: self.config.countdown_secs,
                escalation: None,
                dispatch: None,
            },
            Phase::Countdown { remaining } => SosState {
                status: SosStatus::Countdown,
                activated_at_ms: None,
                countdown_seconds: *remaining,
                escalation: None,
                dispatch: None,
            },
            Phase::Active { activated_at_ms, escalation, dispatch } => SosState {
                status: SosStatus::Active,
                activated_at_ms: Some(*activated_at_ms),
                countdown_seconds: 0,
                escalation: Some(*escalation),
                dispatch: Some(dispatch.clone()),
            },
        }
    }

    /// Current status.
    pub fn status(&self) -> SosStatus {
        self.phase.status()
    }

    /// Timer currently armed by this controller.
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.timer.armed()
    }

    /// Number of escalations so far.
    pub fn escalations(&self) -> u64 {
        self.escalations
    }

    /// Configuration.
    pub fn config(&self) -> &SosConfig {
        &self.config
    }

    fn trigger(&mut self) -> Vec<SosAction> {
        if !matches!(self.phase, Phase::Idle) {
            debug!(status = %self.status(), "trigger ignored");
            return vec![];
        }
        if self.config.countdown_secs == 0 {
            return self.activate();
        }

        let mut actions = self.transition(Phase::Countdown { remaining: self.config.countdown_secs });
        actions.extend(
            self.timer.arm(self.config.tick_interval, TimerMode::Repeating).into_iter().map(SosAction::Timer),
        );
        actions
    }

    fn cancel(&mut self) -> Vec<SosAction> {
        if !matches!(self.phase, Phase::Countdown { .. }) {
            debug!(status = %self.status(), "cancel ignored");
            return vec![];
        }

        let mut actions: Vec<SosAction> = self.timer.cancel().into_iter().map(SosAction::Timer).collect();
        actions.extend(self.transition(Phase::Idle));
        actions
    }

    fn resolve(&mut self) -> Vec<SosAction> {
        if !matches!(self.phase, Phase::Active { .. }) {
            debug!(status = %self.status(), "resolve ignored");
            return vec![];
        }

        let mut actions = self.transition(Phase::Resolved);
        if self.config.resolved_hold.is_zero() {
            actions.extend(self.transition(Phase::Idle));
        } else {
            actions.extend(
                self.timer.arm(self.config.resolved_hold, TimerMode::OneShot).into_iter().map(SosAction::Timer),
            );
        }
        actions
    }

    fn escalate(&mut self) -> Vec<SosAction> {
        if matches!(self.phase, Phase::Active { .. }) {
            debug!("escalate ignored, already active");
            return vec![];
        }
        self.activate()
    }

    fn timer_fired(&mut self, id: TimerId) -> Vec<SosAction> {
        if !self.timer.accept(id) {
            debug!(timer = %id, status = %self.status(), "stale tick ignored");
            return vec![];
        }

        match self.phase {
            Phase::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.activate()
                } else {
                    self.phase = Phase::Countdown { remaining };
                    vec![]
                }
            },
            Phase::Resolved => self.transition(Phase::Idle),
            Phase::Idle | Phase::Active { .. } => {
                // Slot is disarmed on every entry into these phases.
                warn!(timer = %id, "tick accepted outside a timed phase");
                self.timer.cancel().into_iter().map(SosAction::Timer).collect()
            },
        }
    }

    fn activate(&mut self) -> Vec<SosAction> {
        let mut actions: Vec<SosAction> = self.timer.cancel().into_iter().map(SosAction::Timer).collect();

        self.escalations += 1;
        let escalation = Escalation(self.escalations);
        let activated_at_ms = self.env.wall_clock_ms();
        actions.extend(self.transition(Phase::Active {
            activated_at_ms,
            escalation,
            dispatch: DispatchState::InFlight { attempt: 1 },
        }));

        info!(%escalation, activated_at_ms, "SOS escalated, dispatching alert");
        actions.push(SosAction::Dispatch { escalation, attempt: 1 });
        actions
    }

    fn dispatch_completed(&mut self, completed: Escalation, outcome: DeliveryOutcome) -> Vec<SosAction> {
        let Phase::Active { escalation, dispatch, .. } = &mut self.phase else {
            debug!(escalation = %completed, "dispatch outcome after leaving active, ignored");
            return vec![];
        };
        if *escalation != completed {
            debug!(escalation = %completed, current = %escalation, "outcome for older escalation ignored");
            return vec![];
        }
        let DispatchState::InFlight { attempt } = *dispatch else {
            debug!(escalation = %completed, "duplicate dispatch outcome ignored");
            return vec![];
        };

        match outcome {
            Ok(report) => {
                info!(escalation = %completed, attempt, recipients = report.recipients, "alert delivered");
                *dispatch = DispatchState::Delivered(report);
                vec![]
            },
            Err(error) => {
                warn!(escalation = %completed, attempt, %error, "alert dispatch failed");
                *dispatch = DispatchState::Failed { attempt, error: error.clone() };
                vec![SosAction::ReportError { escalation: completed, error }]
            },
        }
    }

    fn retry_dispatch(&mut self) -> Vec<SosAction> {
        let max_attempts = self.config.max_dispatch_attempts;
        let Phase::Active { escalation, dispatch, .. } = &mut self.phase else {
            debug!("retry ignored, not active");
            return vec![];
        };
        match *dispatch {
            DispatchState::Failed { attempt, .. } if attempt < max_attempts => {
                let attempt = attempt + 1;
                info!(escalation = %escalation, attempt, "retrying alert dispatch");
                *dispatch = DispatchState::InFlight { attempt };
                vec![SosAction::Dispatch { escalation: *escalation, attempt }]
            },
            _ => {
                debug!(escalation = %escalation, "retry ignored");
                vec![]
            },
        }
    }

    fn shutdown(&mut self) -> Vec<SosAction> {
        let mut actions: Vec<SosAction> = self.timer.cancel().into_iter().map(SosAction::Timer).collect();
        if !matches!(self.phase, Phase::Idle) {
            actions.extend(self.transition(Phase::Idle));
        }
        actions
    }

    fn transition(&mut self, next: Phase) -> Vec<SosAction> {
        let from = self.phase.status();
        let to = next.status();
        self.phase = next;
        if from == to {
            return vec![];
        }
        info!(%from, %to, "SOS status changed");
        vec![SosAction::StatusChanged { from, to }]
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future::Future,
        pin::Pin,
        task::{Context, Poll},
    };

    use super::*;
    use crate::alert::DeliveryStatus;

    const NOW_MS: u64 = 1_700_000_000_000;

    struct ImmediateFuture;

    impl Future for ImmediateFuture {
        type Output = ();
        fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
            Poll::Ready(())
        }
    }

    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        type Instant = std::time::Instant;

        #[allow(clippy::disallowed_methods)]
        fn now(&self) -> std::time::Instant {
            std::time::Instant::now()
        }

        fn wall_clock_ms(&self) -> u64 {
            NOW_MS
        }

        fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
            ImmediateFuture
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = i as u8;
            }
        }
    }

    fn controller() -> SosController<TestEnv> {
        SosController::new(TestEnv, SosConfig::default())
    }

    fn tick(sos: &mut SosController<TestEnv>) -> Vec<SosAction> {
        let id = sos.armed_timer().unwrap();
        sos.handle(SosEvent::TimerFired(id))
    }

    fn dispatches(actions: &[SosAction]) -> usize {
        actions.iter().filter(|a| matches!(a, SosAction::Dispatch { .. })).count()
    }

    fn delivered() -> DeliveryOutcome {
        Ok(DeliveryReport { recipients: 2, status: DeliveryStatus::Sent })
    }

    #[test]
    fn starts_idle_with_default_countdown() {
        let sos = controller();
        let state = sos.state();
        assert_eq!(state.status, SosStatus::Idle);
        assert_eq!(state.countdown_seconds, DEFAULT_COUNTDOWN_SECS);
        assert_eq!(state.activated_at_ms, None);
        assert!(sos.armed_timer().is_none());
    }

    #[test]
    fn trigger_arms_repeating_tick() {
        let mut sos = controller();
        let actions = sos.handle(SosEvent::Trigger);

        assert!(matches!(
            actions.as_slice(),
            [
                SosAction::StatusChanged { from: SosStatus::Idle, to: SosStatus::Countdown },
                SosAction::Timer(TimerCommand::Arm { mode: TimerMode::Repeating, .. }),
            ]
        ));
        assert_eq!(sos.state().countdown_seconds, 5);
    }

    #[test]
    fn countdown_escalates_after_five_ticks() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Trigger);

        let mut all = Vec::new();
        for expected in (1..=4).rev() {
            all.extend(tick(&mut sos));
            assert_eq!(sos.state().countdown_seconds, expected);
        }
        all.extend(tick(&mut sos));

        let state = sos.state();
        assert_eq!(state.status, SosStatus::Active);
        assert_eq!(state.activated_at_ms, Some(NOW_MS));
        assert_eq!(state.countdown_seconds, 0);
        assert_eq!(dispatches(&all), 1);
        assert!(sos.armed_timer().is_none());
    }

    #[test]
    fn cancel_resets_countdown_and_disarms() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Trigger);
        let _ = tick(&mut sos);
        let _ = tick(&mut sos);
        let stale = sos.armed_timer().unwrap();

        let actions = sos.handle(SosEvent::Cancel);
        assert!(matches!(
            actions.as_slice(),
            [
                SosAction::Timer(TimerCommand::Cancel { .. }),
                SosAction::StatusChanged { from: SosStatus::Countdown, to: SosStatus::Idle },
            ]
        ));
        assert_eq!(sos.state().countdown_seconds, DEFAULT_COUNTDOWN_SECS);

        // Late tick from the cancelled countdown.
        assert!(sos.handle(SosEvent::TimerFired(stale)).is_empty());
        assert_eq!(sos.status(), SosStatus::Idle);
    }

    #[test]
    fn stale_tick_cannot_shorten_next_countdown() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Trigger);
        let stale = sos.armed_timer().unwrap();
        let _ = sos.handle(SosEvent::Cancel);
        let _ = sos.handle(SosEvent::Trigger);

        assert!(sos.handle(SosEvent::TimerFired(stale)).is_empty());
        assert_eq!(sos.state().countdown_seconds, 5);
    }

    #[test]
    fn cancel_outside_countdown_is_noop() {
        let mut sos = controller();
        assert!(sos.handle(SosEvent::Cancel).is_empty());
        assert_eq!(sos.status(), SosStatus::Idle);

        let _ = sos.handle(SosEvent::Escalate);
        let before = sos.state();
        assert!(sos.handle(SosEvent::Cancel).is_empty());
        assert_eq!(sos.state(), before);
    }

    #[test]
    fn trigger_outside_idle_is_noop() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Trigger);
        let _ = tick(&mut sos);
        assert!(sos.handle(SosEvent::Trigger).is_empty());
        assert_eq!(sos.state().countdown_seconds, 4);
    }

    #[test]
    fn resolve_holds_then_returns_to_idle() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Escalate);

        let actions = sos.handle(SosEvent::Resolve);
        assert!(matches!(
            actions.as_slice(),
            [
                SosAction::StatusChanged { from: SosStatus::Active, to: SosStatus::Resolved },
                SosAction::Timer(TimerCommand::Arm { mode: TimerMode::OneShot, period, .. }),
            ] if *period == DEFAULT_RESOLVED_HOLD
        ));
        assert_eq!(sos.state().activated_at_ms, None);

        let actions = tick(&mut sos);
        assert!(matches!(
            actions.as_slice(),
            [SosAction::StatusChanged { from: SosStatus::Resolved, to: SosStatus::Idle }]
        ));
        assert!(sos.armed_timer().is_none());
    }

    #[test]
    fn zero_hold_resolves_straight_to_idle() {
        let config = SosConfig { resolved_hold: Duration::ZERO, ..SosConfig::default() };
        let mut sos = SosController::new(TestEnv, config);
        let _ = sos.handle(SosEvent::Escalate);
        let _ = sos.handle(SosEvent::Resolve);
        assert_eq!(sos.status(), SosStatus::Idle);
        assert!(sos.armed_timer().is_none());
    }

    #[test]
    fn zero_countdown_escalates_on_trigger() {
        let config = SosConfig { countdown_secs: 0, ..SosConfig::default() };
        let mut sos = SosController::new(TestEnv, config);
        let actions = sos.handle(SosEvent::Trigger);
        assert_eq!(sos.status(), SosStatus::Active);
        assert_eq!(dispatches(&actions), 1);
    }

    #[test]
    fn escalate_skips_countdown_and_is_ignored_when_active() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Trigger);
        let actions = sos.handle(SosEvent::Escalate);

        assert!(matches!(actions.first(), Some(SosAction::Timer(TimerCommand::Cancel { .. }))));
        assert_eq!(dispatches(&actions), 1);
        assert!(sos.handle(SosEvent::Escalate).is_empty());
        assert_eq!(sos.escalations(), 1);
    }

    #[test]
    fn failed_dispatch_stays_active_and_reports() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Escalate);

        let actions = sos.handle(SosEvent::DispatchCompleted {
            escalation: Escalation::new(1),
            outcome: Err(DispatchError::Unavailable("no modem".into())),
        });

        assert!(matches!(
            actions.as_slice(),
            [SosAction::ReportError { error: DispatchError::Unavailable(_), .. }]
        ));
        let state = sos.state();
        assert_eq!(state.status, SosStatus::Active);
        assert!(state.activated_at_ms.is_some());
        assert!(matches!(state.dispatch, Some(DispatchState::Failed { attempt: 1, .. })));
    }

    #[test]
    fn retry_only_after_failure_and_bounded() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Escalate);
        assert!(sos.handle(SosEvent::RetryDispatch).is_empty());

        for attempt in 1..DEFAULT_MAX_DISPATCH_ATTEMPTS {
            let _ = sos.handle(SosEvent::DispatchCompleted {
                escalation: Escalation::new(1),
                outcome: Err(DispatchError::Failed("timeout".into())),
            });
            let actions = sos.handle(SosEvent::RetryDispatch);
            assert_eq!(
                actions,
                vec![SosAction::Dispatch { escalation: Escalation::new(1), attempt: attempt + 1 }]
            );
        }

        let _ = sos.handle(SosEvent::DispatchCompleted {
            escalation: Escalation::new(1),
            outcome: Err(DispatchError::Failed("timeout".into())),
        });
        assert!(sos.handle(SosEvent::RetryDispatch).is_empty());
    }

    #[test]
    fn outcome_for_older_escalation_ignored() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Escalate);
        let _ = sos.handle(SosEvent::Resolve);
        let _ = tick(&mut sos);
        let _ = sos.handle(SosEvent::Escalate);

        let actions = sos.handle(SosEvent::DispatchCompleted {
            escalation: Escalation::new(1),
            outcome: Err(DispatchError::Cancelled),
        });
        assert!(actions.is_empty());
        assert_eq!(sos.state().dispatch, Some(DispatchState::InFlight { attempt: 1 }));

        let _ = sos.handle(SosEvent::DispatchCompleted { escalation: Escalation::new(2), outcome: delivered() });
        assert!(matches!(sos.state().dispatch, Some(DispatchState::Delivered(_))));
    }

    #[test]
    fn duplicate_outcome_ignored() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Escalate);
        let _ = sos.handle(SosEvent::DispatchCompleted { escalation: Escalation::new(1), outcome: delivered() });
        let actions = sos.handle(SosEvent::DispatchCompleted {
            escalation: Escalation::new(1),
            outcome: Err(DispatchError::Cancelled),
        });
        assert!(actions.is_empty());
        assert!(matches!(sos.state().dispatch, Some(DispatchState::Delivered(_))));
    }

    #[test]
    fn shutdown_cancels_timer_and_idles() {
        let mut sos = controller();
        let _ = sos.handle(SosEvent::Trigger);
        let actions = sos.handle(SosEvent::Shutdown);

        assert!(matches!(actions.first(), Some(SosAction::Timer(TimerCommand::Cancel { .. }))));
        assert_eq!(sos.status(), SosStatus::Idle);
        assert!(sos.armed_timer().is_none());
        assert!(sos.handle(SosEvent::Shutdown).is_empty());
    }
}
