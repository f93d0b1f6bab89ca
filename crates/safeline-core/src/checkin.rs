//! Check-in timer controller.
//!
//! A dead-man's switch: the user starts a countdown and must check in before
//! it runs out. At zero the timer expires and waits for the user. If nobody
//! answers within the response window, or the user asks for help, it requests
//! escalation from the SOS controller.
//!
//! # State Machine
//!
//! ```text
//!             start              reaches 0
//!  ┌───────┐ ──────> ┌─────────┐ ────────> ┌─────────┐
//!  │ Setup │         │ Running │           │ Expired │
//!  └───────┘         └─────────┘           └─────────┘
//!     ^  ^      pause │     ^ resume        │      │
//!     │  │            v     │               │      │ escalate / window elapsed
//!     │  │         ┌────────┐               │      │ (emits EscalateToSos)
//!     │  │         │ Paused │               │      │
//!     │  │         └────────┘               │      │
//!     │  └──────────────────────────────────┘      │
//!     │                  dismiss                   │
//!     └────────────────────────────────────────────┘
//!
//!  reset: any state -> Setup
//! ```
//!
//! # Invariants
//!
//! - `remaining_secs` is always within `[0, duration]`.
//! - Expiry happens exactly once per start.
//! - A timer is armed only while `Running`, or while `Expired` with a
//!   response window configured.

use std::{fmt, time::Duration};

use tracing::{debug, info};

use crate::{
    error::InputError,
    timer::{TimerCommand, TimerId, TimerMode, TimerOwner, TimerSlot},
};

/// Durations offered to the user, in minutes.
pub const DURATION_CHOICES_MINUTES: [u32; 5] = [5, 10, 15, 30, 60];

/// Default check-in duration in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 15;

/// Smallest accepted duration in minutes.
pub const MIN_DURATION_MINUTES: u32 = 1;

/// Largest accepted duration in minutes.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Default countdown tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default time to answer an expired check-in before escalating.
pub const DEFAULT_RESPONSE_WINDOW: Duration = Duration::from_secs(60);

/// Check-in controller configuration.
#[derive(Debug, Clone)]
pub struct CheckInConfig {
    /// Initial duration in minutes.
    pub duration_minutes: u32,
    /// Interval between ticks. Each tick removes one second.
    pub tick_interval: Duration,
    /// Time to answer after expiry. `None` waits forever.
    pub response_window: Option<Duration>,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            duration_minutes: DEFAULT_DURATION_MINUTES,
            tick_interval: DEFAULT_TICK_INTERVAL,
            response_window: Some(DEFAULT_RESPONSE_WINDOW),
        }
    }
}

/// Check-in status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckInStatus {
    /// Choosing a duration.
    Setup,
    /// Counting down.
    Running,
    /// Counting suspended.
    Paused,
    /// Reached zero; waiting for the user.
    Expired,
}

impl fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Expired => "expired",
        })
    }
}

/// Read-only snapshot of the check-in timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInState {
    /// Current status.
    pub status: CheckInStatus,
    /// Selected duration in minutes.
    pub duration_minutes: u32,
    /// Seconds left.
    pub remaining_secs: u32,
}

impl CheckInState {
    /// Full duration in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes * 60
    }

    /// Remaining time as `mm:ss`.
    pub fn remaining_display(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }
}

/// Format seconds as zero-padded `mm:ss`. Minutes are not wrapped into hours.
pub fn format_mm_ss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Input to the check-in controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInEvent {
    /// Change the duration. Only honored in `Setup`.
    SelectDuration(u32),
    /// Start counting.
    Start,
    /// Suspend counting.
    Pause,
    /// Continue counting.
    Resume,
    /// A timer armed by this controller fired.
    TimerFired(TimerId),
    /// User confirmed they are safe.
    Dismiss,
    /// User asked for help after expiry.
    Escalate,
    /// Back to `Setup` from anywhere.
    Reset,
    /// Session teardown.
    Shutdown,
}

/// Output of the check-in controller.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInAction {
    /// Arm or cancel a timer.
    Timer(TimerCommand),
    /// Status changed.
    StatusChanged {
        /// Previous status.
        from: CheckInStatus,
        /// New status.
        to: CheckInStatus,
    },
    /// Timer reached zero. Ask "Are you safe?".
    Expired,
    /// Request direct entry into an active SOS.
    EscalateToSos,
    /// Input refused.
    Rejected(InputError),
}

/// Check-in timer state machine.
#[derive(Debug)]
pub struct CheckInTimer {
    config: CheckInConfig,
    status: CheckInStatus,
    duration_minutes: u32,
    remaining_secs: u32,
    timer: TimerSlot,
    expirations: u64,
}

impl CheckInTimer {
    /// Create a controller in `Setup`.
    pub fn new(config: CheckInConfig) -> Self {
        let duration_minutes = config.duration_minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
        Self {
            config,
            status: CheckInStatus::Setup,
            duration_minutes,
            remaining_secs: duration_minutes * 60,
            timer: TimerSlot::new(TimerOwner::CheckIn),
            expirations: 0,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: CheckInEvent) -> Vec<CheckInAction> {
        match event {
            CheckInEvent::SelectDuration(minutes) => self.select_duration(minutes),
            CheckInEvent::Start => self.start(),
            CheckInEvent::Pause => self.pause(),
            CheckInEvent::Resume => self.resume(),
            CheckInEvent::TimerFired(id) => self.timer_fired(id),
            CheckInEvent::Dismiss => self.dismiss(),
            CheckInEvent::Escalate => self.escalate(),
            CheckInEvent::Reset | CheckInEvent::Shutdown => self.reset(),
        }
    }

    /// Read-only snapshot.
    pub fn state(&self) -> CheckInState {
        CheckInState {
            status: self.status,
            duration_minutes: self.duration_minutes,
            remaining_secs: self.remaining_secs,
        }
    }

    /// Current status.
    pub fn status(&self) -> CheckInStatus {
        self.status
    }

    /// Timer currently armed by this controller.
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.timer.armed()
    }

    /// Number of times the timer has expired.
    pub fn expirations(&self) -> u64 {
        self.expirations
    }

    fn select_duration(&mut self, minutes: u32) -> Vec<CheckInAction> {
        if self.status != CheckInStatus::Setup {
            debug!(status = %self.status, "duration change ignored outside setup");
            return vec![];
        }
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
            return vec![CheckInAction::Rejected(InputError::InvalidDuration {
                minutes,
                min: MIN_DURATION_MINUTES,
                max: MAX_DURATION_MINUTES,
            })];
        }
        self.duration_minutes = minutes;
        self.remaining_secs = minutes * 60;
        vec![]
    }

    fn start(&mut self) -> Vec<CheckInAction> {
        if self.status != CheckInStatus::Setup {
            debug!(status = %self.status, "start ignored");
            return vec![];
        }
        self.remaining_secs = self.duration_minutes * 60;
        info!(minutes = self.duration_minutes, "check-in started");
        let mut actions = self.transition(CheckInStatus::Running);
        actions.extend(self.arm_tick());
        actions
    }

    fn pause(&mut self) -> Vec<CheckInAction> {
        if self.status != CheckInStatus::Running {
            debug!(status = %self.status, "pause ignored");
            return vec![];
        }
        let mut actions: Vec<CheckInAction> = self.timer.cancel().into_iter().map(CheckInAction::Timer).collect();
        actions.extend(self.transition(CheckInStatus::Paused));
        actions
    }

    fn resume(&mut self) -> Vec<CheckInAction> {
        if self.status != CheckInStatus::Paused {
            debug!(status = %self.status, "resume ignored");
            return vec![];
        }
        let mut actions = self.transition(CheckInStatus::Running);
        actions.extend(self.arm_tick());
        actions
    }

    fn timer_fired(&mut self, id: TimerId) -> Vec<CheckInAction> {
        if !self.timer.accept(id) {
            debug!(timer = %id, status = %self.status, "stale tick ignored");
            return vec![];
        }

        match self.status {
            CheckInStatus::Running => {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 { self.expire() } else { vec![] }
            },
            CheckInStatus::Expired => {
                info!("check-in response window elapsed");
                self.escalate()
            },
            CheckInStatus::Setup | CheckInStatus::Paused => {
                // Slot is disarmed on every entry into these states.
                self.timer.cancel().into_iter().map(CheckInAction::Timer).collect()
            },
        }
    }

    fn expire(&mut self) -> Vec<CheckInAction> {
        let mut actions: Vec<CheckInAction> = self.timer.cancel().into_iter().map(CheckInAction::Timer).collect();
        self.expirations += 1;
        info!(expirations = self.expirations, "check-in expired");
        actions.extend(self.transition(CheckInStatus::Expired));
        actions.push(CheckInAction::Expired);
        if let Some(window) = self.config.response_window {
            actions.extend(self.timer.arm(window, TimerMode::OneShot).into_iter().map(CheckInAction::Timer));
        }
        actions
    }

    fn dismiss(&mut self) -> Vec<CheckInAction> {
        if self.status != CheckInStatus::Expired {
            debug!(status = %self.status, "dismiss ignored");
            return vec![];
        }
        info!("check-in dismissed, user is safe");
        self.reset()
    }

    fn escalate(&mut self) -> Vec<CheckInAction> {
        if self.status != CheckInStatus::Expired {
            debug!(status = %self.status, "escalate ignored");
            return vec![];
        }
        let mut actions = self.reset();
        info!("check-in escalating to SOS");
        actions.push(CheckInAction::EscalateToSos);
        actions
    }

    fn reset(&mut self) -> Vec<CheckInAction> {
        let mut actions: Vec<CheckInAction> = self.timer.cancel().into_iter().map(CheckInAction::Timer).collect();
        self.remaining_secs = self.duration_minutes * 60;
        actions.extend(self.transition(CheckInStatus::Setup));
        actions
    }

    fn arm_tick(&mut self) -> Vec<CheckInAction> {
        self.timer.arm(self.config.tick_interval, TimerMode::Repeating).into_iter().map(CheckInAction::Timer).collect()
    }

    fn transition(&mut self, to: CheckInStatus) -> Vec<CheckInAction> {
        let from = self.status;
        self.status = to;
        if from == to {
            return vec![];
        }
        debug!(%from, %to, "check-in status changed");
        vec![CheckInAction::StatusChanged { from, to }]
    }
}
