//! Model world - the reference implementation.
//!
//! Tracks only what a user could observe: statuses, counters, and how many
//! alerts left the device. No timers, no environment, no effects.

use std::collections::VecDeque;

use super::operation::{ModelSession, Operation};

/// Reference SOS status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSos {
    /// Resting.
    Idle,
    /// Counting down with this many ticks left.
    Countdown(u32),
    /// Raised.
    Active {
        /// Escalation sequence number.
        escalation: u64,
        /// Alert progress.
        dispatch: ModelDispatch,
    },
    /// Waiting to return to idle.
    Resolved,
}

/// Reference alert progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelDispatch {
    /// Attempt waiting on the transport.
    InFlight(u32),
    /// Delivered.
    Delivered,
    /// Attempt failed.
    Failed(u32),
}

/// Reference check-in status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCheckIn {
    /// Not running.
    Setup,
    /// Counting down.
    Running,
    /// Suspended.
    Paused,
    /// Waiting for the user.
    Expired,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// SOS status.
    pub sos: ModelSos,
    /// Escalations so far.
    pub escalations: u64,
    /// Check-in status.
    pub checkin: ModelCheckIn,
    /// Check-in seconds left.
    pub checkin_remaining: u32,
    /// Check-in expirations so far.
    pub expirations: u64,
    /// Contacts on file.
    pub contacts: usize,
    /// SOS alerts handed to the transport.
    pub alerts_sent: u32,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    session: ModelSession,
    sos: ModelSos,
    escalations: u64,
    checkin: ModelCheckIn,
    checkin_remaining: u32,
    expirations: u64,
    contacts: usize,
    alerts_sent: u32,
    /// Escalations of alerts waiting on the transport, oldest first.
    in_flight: VecDeque<u64>,
}

impl ModelWorld {
    /// Fresh session with no contacts.
    pub fn new(session: ModelSession) -> Self {
        Self {
            session,
            sos: ModelSos::Idle,
            escalations: 0,
            checkin: ModelCheckIn::Setup,
            checkin_remaining: session.checkin_minutes * 60,
            expirations: 0,
            contacts: 0,
            alerts_sent: 0,
            in_flight: VecDeque::new(),
        }
    }

    /// Apply an operation.
    pub fn apply(&mut self, op: &Operation) {
        match *op {
            Operation::TriggerSos => {
                if self.sos == ModelSos::Idle {
                    if self.session.countdown_secs == 0 {
                        self.activate();
                    } else {
                        self.sos = ModelSos::Countdown(self.session.countdown_secs);
                    }
                }
            },
            Operation::CancelSos => {
                if matches!(self.sos, ModelSos::Countdown(_)) {
                    self.sos = ModelSos::Idle;
                }
            },
            Operation::ResolveSos => {
                if matches!(self.sos, ModelSos::Active { .. }) {
                    self.sos = ModelSos::Resolved;
                }
            },
            Operation::RetryAlert => self.retry(),
            Operation::TickSos => match self.sos {
                ModelSos::Countdown(1) => self.activate(),
                ModelSos::Countdown(remaining) => self.sos = ModelSos::Countdown(remaining - 1),
                ModelSos::Resolved => self.sos = ModelSos::Idle,
                ModelSos::Idle | ModelSos::Active { .. } => {},
            },
            Operation::StartCheckIn => {
                if self.checkin == ModelCheckIn::Setup {
                    self.checkin = ModelCheckIn::Running;
                    self.checkin_remaining = self.full_checkin();
                }
            },
            Operation::PauseCheckIn => {
                if self.checkin == ModelCheckIn::Running {
                    self.checkin = ModelCheckIn::Paused;
                }
            },
            Operation::ResumeCheckIn => {
                if self.checkin == ModelCheckIn::Paused {
                    self.checkin = ModelCheckIn::Running;
                }
            },
            Operation::DismissCheckIn => {
                if self.checkin == ModelCheckIn::Expired {
                    self.reset_checkin();
                }
            },
            Operation::EscalateCheckIn => {
                if self.checkin == ModelCheckIn::Expired {
                    self.escalate_from_checkin();
                }
            },
            Operation::ResetCheckIn => self.reset_checkin(),
            Operation::TickCheckIn { ticks } => {
                for _ in 0..ticks {
                    match self.checkin {
                        ModelCheckIn::Running => {
                            self.checkin_remaining -= 1;
                            if self.checkin_remaining == 0 {
                                self.checkin = ModelCheckIn::Expired;
                                self.expirations += 1;
                            }
                        },
                        ModelCheckIn::Expired => self.escalate_from_checkin(),
                        ModelCheckIn::Setup | ModelCheckIn::Paused => break,
                    }
                }
            },
            Operation::AddContact => self.contacts += 1,
            Operation::RemoveContact => self.contacts = self.contacts.saturating_sub(1),
            Operation::CompleteAlert { delivered } => self.complete(delivered),
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            sos: self.sos,
            escalations: self.escalations,
            checkin: self.checkin,
            checkin_remaining: self.checkin_remaining,
            expirations: self.expirations,
            contacts: self.contacts,
            alerts_sent: self.alerts_sent,
        }
    }

    fn full_checkin(&self) -> u32 {
        self.session.checkin_minutes * 60
    }

    fn reset_checkin(&mut self) {
        self.checkin = ModelCheckIn::Setup;
        self.checkin_remaining = self.full_checkin();
    }

    fn escalate_from_checkin(&mut self) {
        self.reset_checkin();
        if !matches!(self.sos, ModelSos::Active { .. }) {
            self.activate();
        }
    }

    fn activate(&mut self) {
        self.escalations += 1;
        self.sos = ModelSos::Active { escalation: self.escalations, dispatch: self.dispatch(1) };
    }

    /// Hand attempt `attempt` to the transport, or fail it on the spot when
    /// nobody can be notified.
    fn dispatch(&mut self, attempt: u32) -> ModelDispatch {
        if self.contacts == 0 {
            return ModelDispatch::Failed(attempt);
        }
        self.alerts_sent += 1;
        self.in_flight.push_back(self.escalations);
        ModelDispatch::InFlight(attempt)
    }

    fn retry(&mut self) {
        let ModelSos::Active { escalation, dispatch: ModelDispatch::Failed(attempt) } = self.sos else {
            return;
        };
        if attempt >= self.session.max_dispatch_attempts {
            return;
        }
        let dispatch = self.dispatch(attempt + 1);
        self.sos = ModelSos::Active { escalation, dispatch };
    }

    fn complete(&mut self, delivered: bool) {
        let Some(completed) = self.in_flight.pop_front() else {
            return;
        };
        if let ModelSos::Active { escalation, dispatch: ModelDispatch::InFlight(attempt) } = self.sos
            && escalation == completed
        {
            let dispatch = if delivered { ModelDispatch::Delivered } else { ModelDispatch::Failed(attempt) };
            self.sos = ModelSos::Active { escalation, dispatch };
        }
    }
}
