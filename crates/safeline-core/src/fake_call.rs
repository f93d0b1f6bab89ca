//! Fake incoming call.
//!
//! A decoy: after a short delay the device "rings" so the user has an excuse
//! to leave an uncomfortable situation.
//!
//! ```text
//!  Setup ─schedule─> Scheduled ─delay─> Ringing ─answer─> Active
//!    ^                   │                 │                │
//!    │                   └─end─> Setup     └──────end───────┴─> Ended
//!    └──────────────────────── hang-up hold ───────────────────────┘
//! ```

use std::{fmt, time::Duration};

use tracing::debug;

use crate::{
    error::InputError,
    timer::{TimerCommand, TimerId, TimerMode, TimerOwner, TimerSlot},
};

/// Delays offered to the user, in seconds.
pub const DELAY_CHOICES_SECS: [u32; 5] = [3, 5, 10, 15, 30];

/// Default delay before ringing, in seconds.
pub const DEFAULT_DELAY_SECS: u32 = 5;

/// Largest accepted delay, in seconds.
pub const MAX_DELAY_SECS: u32 = 300;

/// Default caller shown on the ringing screen.
pub const DEFAULT_CALLER_NAME: &str = "Mom";

/// Default time the "call ended" screen stays up.
pub const DEFAULT_HANGUP_HOLD: Duration = Duration::from_millis(1500);

/// Fake call configuration.
#[derive(Debug, Clone)]
pub struct FakeCallConfig {
    /// Initial delay in seconds.
    pub delay_secs: u32,
    /// Caller name.
    pub caller_name: String,
    /// Time spent in `Ended` before returning to `Setup`.
    pub hangup_hold: Duration,
    /// Call clock interval.
    pub tick_interval: Duration,
}

impl Default for FakeCallConfig {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_DELAY_SECS,
            caller_name: DEFAULT_CALLER_NAME.to_string(),
            hangup_hold: DEFAULT_HANGUP_HOLD,
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Fake call status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeCallStatus {
    /// Choosing a delay.
    Setup,
    /// Waiting for the delay to elapse.
    Scheduled,
    /// Phone is ringing.
    Ringing,
    /// Call "answered".
    Active,
    /// Call finished.
    Ended,
}

impl fmt::Display for FakeCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Scheduled => "scheduled",
            Self::Ringing => "ringing",
            Self::Active => "active",
            Self::Ended => "ended",
        })
    }
}

/// Read-only snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCallState {
    /// Current status.
    pub status: FakeCallStatus,
    /// Selected delay in seconds.
    pub delay_secs: u32,
    /// Seconds since the call was answered.
    pub elapsed_secs: u32,
    /// Caller shown on screen.
    pub caller_name: String,
}

/// Input to the fake call controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCallEvent {
    /// Change the delay. Only honored in `Setup`.
    SelectDelay(u32),
    /// Start the delay.
    Schedule,
    /// A timer armed by this controller fired.
    TimerFired(TimerId),
    /// Pick up.
    Answer,
    /// Hang up, decline, or abort the pending call.
    End,
    /// Back to `Setup` from anywhere.
    Reset,
    /// Session teardown.
    Shutdown,
}

/// Output of the fake call controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCallAction {
    /// Arm or cancel a timer.
    Timer(TimerCommand),
    /// Status changed.
    StatusChanged {
        /// Previous status.
        from: FakeCallStatus,
        /// New status.
        to: FakeCallStatus,
    },
    /// Start or stop the ringtone and vibration.
    Ring {
        /// Whether ringing should be on.
        on: bool,
    },
    /// Input refused.
    Rejected(InputError),
}

/// Fake call state machine.
#[derive(Debug)]
pub struct FakeCall {
    config: FakeCallConfig,
    status: FakeCallStatus,
    delay_secs: u32,
    elapsed_secs: u32,
    timer: TimerSlot,
}

impl FakeCall {
    /// Create a controller in `Setup`.
    pub fn new(config: FakeCallConfig) -> Self {
        let delay_secs = config.delay_secs.clamp(1, MAX_DELAY_SECS);
        Self {
            config,
            status: FakeCallStatus::Setup,
            delay_secs,
            elapsed_secs: 0,
            timer: TimerSlot::new(TimerOwner::FakeCall),
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: FakeCallEvent) -> Vec<FakeCallAction> {
        match event {
            FakeCallEvent::SelectDelay(secs) => self.select_delay(secs),
            FakeCallEvent::Schedule => self.schedule(),
            FakeCallEvent::TimerFired(id) => self.timer_fired(id),
            FakeCallEvent::Answer => self.answer(),
            FakeCallEvent::End => self.end(),
            FakeCallEvent::Reset | FakeCallEvent::Shutdown => self.reset(),
        }
    }

    /// Read-only snapshot.
    pub fn state(&self) -> FakeCallState {
        FakeCallState {
            status: self.status,
            delay_secs: self.delay_secs,
            elapsed_secs: self.elapsed_secs,
            caller_name: self.config.caller_name.clone(),
        }
    }

    /// Current status.
    pub fn status(&self) -> FakeCallStatus {
        self.status
    }

    /// Timer currently armed by this controller.
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.timer.armed()
    }

    fn select_delay(&mut self, secs: u32) -> Vec<FakeCallAction> {
        if self.status != FakeCallStatus::Setup {
            return vec![];
        }
        if secs == 0 || secs > MAX_DELAY_SECS {
            return vec![FakeCallAction::Rejected(InputError::InvalidDelay { seconds: secs })];
        }
        self.delay_secs = secs;
        vec![]
    }

    fn schedule(&mut self) -> Vec<FakeCallAction> {
        if self.status != FakeCallStatus::Setup {
            return vec![];
        }
        let delay = Duration::from_secs(u64::from(self.delay_secs));
        let mut actions = self.transition(FakeCallStatus::Scheduled);
        actions.extend(self.timer.arm(delay, TimerMode::OneShot).into_iter().map(FakeCallAction::Timer));
        actions
    }

    fn timer_fired(&mut self, id: TimerId) -> Vec<FakeCallAction> {
        if !self.timer.accept(id) {
            debug!(timer = %id, status = %self.status, "stale tick ignored");
            return vec![];
        }
        match self.status {
            FakeCallStatus::Scheduled => {
                let mut actions = self.transition(FakeCallStatus::Ringing);
                actions.push(FakeCallAction::Ring { on: true });
                actions
            },
            FakeCallStatus::Active => {
                self.elapsed_secs += 1;
                vec![]
            },
            FakeCallStatus::Ended => self.transition(FakeCallStatus::Setup),
            FakeCallStatus::Setup | FakeCallStatus::Ringing => {
                self.timer.cancel().into_iter().map(FakeCallAction::Timer).collect()
            },
        }
    }

    fn answer(&mut self) -> Vec<FakeCallAction> {
        if self.status != FakeCallStatus::Ringing {
            return vec![];
        }
        self.elapsed_secs = 0;
        let mut actions = vec![FakeCallAction::Ring { on: false }];
        actions.extend(self.transition(FakeCallStatus::Active));
        actions.extend(
            self.timer
                .arm(self.config.tick_interval, TimerMode::Repeating)
                .into_iter()
                .map(FakeCallAction::Timer),
        );
        actions
    }

    fn end(&mut self) -> Vec<FakeCallAction> {
        match self.status {
            FakeCallStatus::Scheduled => self.reset(),
            FakeCallStatus::Ringing | FakeCallStatus::Active => {
                let mut actions: Vec<FakeCallAction> =
                    self.timer.cancel().into_iter().map(FakeCallAction::Timer).collect();
                if self.status == FakeCallStatus::Ringing {
                    actions.push(FakeCallAction::Ring { on: false });
                }
                actions.extend(self.transition(FakeCallStatus::Ended));
                if self.config.hangup_hold.is_zero() {
                    actions.extend(self.transition(FakeCallStatus::Setup));
                } else {
                    actions.extend(
                        self.timer
                            .arm(self.config.hangup_hold, TimerMode::OneShot)
                            .into_iter()
                            .map(FakeCallAction::Timer),
                    );
                }
                actions
            },
            FakeCallStatus::Setup | FakeCallStatus::Ended => vec![],
        }
    }

    fn reset(&mut self) -> Vec<FakeCallAction> {
        let mut actions: Vec<FakeCallAction> = self.timer.cancel().into_iter().map(FakeCallAction::Timer).collect();
        if self.status == FakeCallStatus::Ringing {
            actions.push(FakeCallAction::Ring { on: false });
        }
        self.elapsed_secs = 0;
        actions.extend(self.transition(FakeCallStatus::Setup));
        actions
    }

    fn transition(&mut self, to: FakeCallStatus) -> Vec<FakeCallAction> {
        let from = self.status;
        self.status = to;
        if from == to {
            return vec![];
        }
        debug!(%from, %to, "fake call status changed");
        vec![FakeCallAction::StatusChanged { from, to }]
    }
}
