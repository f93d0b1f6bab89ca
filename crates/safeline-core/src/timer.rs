//! Timer handles owned by controllers.
//!
//! Controllers never schedule callbacks themselves. They emit
//! [`TimerCommand`]s and receive the resulting ticks back as events carrying
//! the [`TimerId`] that was armed. Every arm allocates a fresh generation, so a
//! tick from a timer that was cancelled (or replaced) can never be mistaken
//! for a tick of the current one.
//!
//! # Stale ticks
//!
//! ```text
//!  arm(gen 1) ──tick(1)──> accepted
//!  cancel(1)
//!  arm(gen 2) ──tick(1)──> rejected (stale)
//!             ──tick(2)──> accepted
//! ```

use std::{fmt, time::Duration};

/// Controller that owns a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerOwner {
    /// SOS lifecycle controller (countdown ticks, resolved hold).
    Sos,
    /// Check-in timer controller (countdown ticks, response window).
    CheckIn,
    /// Fake call controller (ring delay, call clock, hang-up hold).
    FakeCall,
    /// Audio recorder (elapsed-seconds clock).
    Recorder,
}

/// Identity of one armed timer.
///
/// Two ids are equal only if they name the same arm of the same owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    owner: TimerOwner,
    generation: u64,
}

impl TimerId {
    /// Controller that armed this timer.
    pub fn owner(self) -> TimerOwner {
        self.owner
    }

    /// Arm generation within the owner.
    pub fn generation(self) -> u64 {
        self.generation
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.owner, self.generation)
    }
}

/// Whether a timer fires once or keeps firing every period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fires once after `period`, then is disarmed.
    OneShot,
    /// Fires every `period` until cancelled.
    Repeating,
}

/// Instruction for whatever executes timers (driver or simulation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start a timer.
    Arm {
        /// Timer identity, echoed back on every tick.
        id: TimerId,
        /// Delay before the first tick, and between ticks when repeating.
        period: Duration,
        /// One-shot or repeating.
        mode: TimerMode,
    },
    /// Stop a timer. Cancelling an unknown or already-fired timer is a no-op.
    Cancel {
        /// Timer to stop.
        id: TimerId,
    },
}

/// A controller's single timer slot.
///
/// Holds at most one armed timer. Arming while armed cancels the previous
/// timer first, so a slot can never leak a running timer.
#[derive(Debug, Clone)]
pub struct TimerSlot {
    owner: TimerOwner,
    next_generation: u64,
    armed: Option<(TimerId, TimerMode)>,
}

impl TimerSlot {
    /// Create an empty slot for `owner`.
    pub fn new(owner: TimerOwner) -> Self {
        Self { owner, next_generation: 1, armed: None }
    }

    /// Arm a new timer, replacing any armed one.
    ///
    /// Returns the commands to execute, in order.
    pub fn arm(&mut self, period: Duration, mode: TimerMode) -> Vec<TimerCommand> {
        let mut commands = Vec::with_capacity(2);
        if let Some(cancel) = self.cancel() {
            commands.push(cancel);
        }

        let id = TimerId { owner: self.owner, generation: self.next_generation };
        self.next_generation += 1;
        self.armed = Some((id, mode));
        commands.push(TimerCommand::Arm { id, period, mode });
        commands
    }

    /// Cancel the armed timer, if any. Idempotent.
    pub fn cancel(&mut self) -> Option<TimerCommand> {
        self.armed.take().map(|(id, _)| TimerCommand::Cancel { id })
    }

    /// Check a tick against the armed timer.
    ///
    /// Returns `false` for stale ticks. A one-shot timer is disarmed by its
    /// accepted tick.
    pub fn accept(&mut self, id: TimerId) -> bool {
        match self.armed {
            Some((armed, mode)) if armed == id => {
                if mode == TimerMode::OneShot {
                    self.armed = None;
                }
                true
            },
            _ => false,
        }
    }

    /// Currently armed timer.
    pub fn armed(&self) -> Option<TimerId> {
        self.armed.map(|(id, _)| id)
    }

    /// Whether a timer is armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}
