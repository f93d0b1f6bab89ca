//! Real side of model-based testing: the production bridge on a simulated
//! environment, with timers fired and alerts completed on demand.

use std::collections::VecDeque;

use safeline_app::{App, AppAction, Bridge, Effect};
use safeline_core::{
    AlertPurpose, AlertRequest, CheckInEvent, CheckInStatus, DeliveryReport, DeliveryStatus,
    DispatchError, DispatchState, NewContact, SosEvent, SosStatus,
};

use super::{
    operation::{ModelSession, Operation},
    world::{ModelCheckIn, ModelDispatch, ModelSos, ObservableState},
};
use crate::{SessionSnapshot, SimEnv};

/// Production bridge driven by [`Operation`]s.
pub struct RealWorld {
    bridge: Bridge<SimEnv>,
    in_flight: VecDeque<AlertRequest>,
    sent: Vec<AlertRequest>,
    added: u32,
}

impl RealWorld {
    /// Fresh session on a simulated environment seeded with `seed`.
    pub fn new(session: ModelSession, seed: u64) -> Self {
        Self {
            bridge: Bridge::new(SimEnv::with_seed(seed), session.config()),
            in_flight: VecDeque::new(),
            sent: Vec::new(),
            added: 0,
        }
    }

    /// Apply an operation.
    pub fn apply(&mut self, op: &Operation) {
        match *op {
            Operation::TriggerSos => self.act(AppAction::Sos(SosEvent::Trigger)),
            Operation::CancelSos => self.act(AppAction::Sos(SosEvent::Cancel)),
            Operation::ResolveSos => self.act(AppAction::Sos(SosEvent::Resolve)),
            Operation::RetryAlert => self.act(AppAction::Sos(SosEvent::RetryDispatch)),
            Operation::TickSos => {
                if let Some(id) = self.bridge.sos().armed_timer() {
                    self.act(AppAction::Sos(SosEvent::TimerFired(id)));
                }
            },
            Operation::StartCheckIn => self.act(AppAction::CheckIn(CheckInEvent::Start)),
            Operation::PauseCheckIn => self.act(AppAction::CheckIn(CheckInEvent::Pause)),
            Operation::ResumeCheckIn => self.act(AppAction::CheckIn(CheckInEvent::Resume)),
            Operation::DismissCheckIn => self.act(AppAction::CheckIn(CheckInEvent::Dismiss)),
            Operation::EscalateCheckIn => self.act(AppAction::CheckIn(CheckInEvent::Escalate)),
            Operation::ResetCheckIn => self.act(AppAction::CheckIn(CheckInEvent::Reset)),
            Operation::TickCheckIn { ticks } => {
                for _ in 0..ticks {
                    let Some(id) = self.bridge.checkin().armed_timer() else { break };
                    self.act(AppAction::CheckIn(CheckInEvent::TimerFired(id)));
                }
            },
            Operation::AddContact => {
                self.added += 1;
                let n = self.added;
                self.act(AppAction::AddContact(NewContact::new(format!("Contact {n}"), format!("555{n:04}"))));
            },
            Operation::RemoveContact => {
                if let Some(first) = self.bridge.contacts().contacts().first() {
                    let id = first.id.clone();
                    self.act(AppAction::RemoveContact(id));
                }
            },
            Operation::CompleteAlert { delivered } => {
                if let Some(request) = self.in_flight.pop_front() {
                    let outcome = if delivered {
                        Ok(DeliveryReport { recipients: request.recipients.len(), status: DeliveryStatus::Sent })
                    } else {
                        Err(DispatchError::Failed("carrier rejected".into()))
                    };
                    self.act(AppAction::AlertCompleted { purpose: request.purpose, outcome });
                }
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let sos_state = self.bridge.sos().state();
        let sos = match sos_state.status {
            SosStatus::Idle => ModelSos::Idle,
            SosStatus::Countdown => ModelSos::Countdown(sos_state.countdown_seconds),
            SosStatus::Resolved => ModelSos::Resolved,
            SosStatus::Active => ModelSos::Active {
                escalation: sos_state.escalation.map_or(0, |e| e.value()),
                dispatch: match sos_state.dispatch {
                    Some(DispatchState::InFlight { attempt }) => ModelDispatch::InFlight(attempt),
                    Some(DispatchState::Delivered(_)) => ModelDispatch::Delivered,
                    Some(DispatchState::Failed { attempt, .. }) => ModelDispatch::Failed(attempt),
                    None => ModelDispatch::Failed(0),
                },
            },
        };

        let checkin = self.bridge.checkin().state();
        ObservableState {
            sos,
            escalations: self.bridge.sos().escalations(),
            checkin: match checkin.status {
                CheckInStatus::Setup => ModelCheckIn::Setup,
                CheckInStatus::Running => ModelCheckIn::Running,
                CheckInStatus::Paused => ModelCheckIn::Paused,
                CheckInStatus::Expired => ModelCheckIn::Expired,
            },
            checkin_remaining: checkin.remaining_secs,
            expirations: self.bridge.checkin().expirations(),
            contacts: self.bridge.contacts().len(),
            alerts_sent: u32::try_from(self.sent.len()).unwrap_or(u32::MAX),
        }
    }

    /// Controller-side invariant snapshot.
    ///
    /// There is no view or platform here: the view is rebuilt from the bridge
    /// and the platform timers are the controllers' own.
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot =
            SessionSnapshot::capture(&self.view(), &self.bridge, self.bridge.armed_timers(), &self.sent);
        snapshot.view_contacts = snapshot.contacts.clone();
        snapshot.view_recorder = snapshot.recorder;
        snapshot.recordings.1 = snapshot.recordings.0;
        snapshot
    }

    /// Bridge under test.
    pub fn bridge(&self) -> &Bridge<SimEnv> {
        &self.bridge
    }

    /// Every SOS alert handed to the transport.
    pub fn sent(&self) -> &[AlertRequest] {
        &self.sent
    }

    fn view(&self) -> App {
        App::new(self.bridge.sos().state(), self.bridge.checkin().state(), self.bridge.fake_call().state())
    }

    fn act(&mut self, action: AppAction) {
        let _ = self.bridge.process_app_action(action);
        for effect in self.bridge.take_effects() {
            if let Effect::SendAlert(request) = effect
                && matches!(request.purpose, AlertPurpose::Sos { .. })
            {
                self.sent.push(request.clone());
                self.in_flight.push_back(request);
            }
        }
    }
}
