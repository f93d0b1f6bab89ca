//! Application state machine.
//!
//! This module defines the [`App`] state machine, which holds what the user
//! sees, completely decoupled from timers, messaging, and storage.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Caches the latest controller snapshots for rendering.
//! - Rejects empty contact fields before they reach the core.
//! - Routes timer ticks to the controller that armed them.
//! - Tracks the transient status message and the check-in prompt.

use safeline_core::{
    CheckInEvent, CheckInState, CheckInStatus, Coordinates, EmergencyContact, FakeCallEvent, FakeCallState,
    NewContact, RecorderEvent, RecorderState, RecorderStatus, Recording, Relationship, SafetyCard, SosEvent,
    SosState, TimerId, TimerOwner,
};

use crate::{AppAction, AppEvent, HomeStatus, Intent};

/// Prompt shown when the check-in timer expires.
pub const CHECK_IN_PROMPT: &str = "Are you safe?";

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    sos: SosState,
    checkin: CheckInState,
    fake_call: FakeCallState,
    recorder: RecorderState,
    recordings: Vec<Recording>,
    contacts: Vec<EmergencyContact>,
    card: SafetyCard,
    location: Option<Coordinates>,
    sharing_location: bool,
    alarm_on: bool,
    /// Check-in expired and is waiting for an answer.
    checkin_prompt: bool,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create an App from the controllers' initial snapshots.
    pub fn new(sos: SosState, checkin: CheckInState, fake_call: FakeCallState) -> Self {
        Self {
            sos,
            checkin,
            fake_call,
            recorder: RecorderState { status: RecorderStatus::Idle, elapsed_secs: 0 },
            recordings: Vec::new(),
            contacts: Vec::new(),
            card: SafetyCard::default(),
            location: None,
            sharing_location: false,
            alarm_on: false,
            checkin_prompt: false,
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Intent(intent) => self.handle_intent(intent),
            AppEvent::TimerFired(id) => vec![Self::route_timer(id)],
            AppEvent::LocationUpdated(location) => {
                self.location = Some(location);
                vec![AppAction::RecordLocation(location), AppAction::Render]
            },
            AppEvent::AlertCompleted { purpose, outcome } => {
                vec![AppAction::AlertCompleted { purpose, outcome }]
            },
            AppEvent::SosChanged(state) => {
                if state == self.sos {
                    return vec![];
                }
                self.sos = state;
                vec![AppAction::Render]
            },
            AppEvent::CheckInChanged(state) => {
                if state == self.checkin {
                    return vec![];
                }
                if state.status != CheckInStatus::Expired {
                    self.checkin_prompt = false;
                }
                self.checkin = state;
                vec![AppAction::Render]
            },
            AppEvent::CheckInExpired => {
                self.checkin_prompt = true;
                self.status_message = Some(CHECK_IN_PROMPT.to_string());
                vec![AppAction::Render]
            },
            AppEvent::FakeCallChanged(state) => {
                if state == self.fake_call {
                    return vec![];
                }
                self.fake_call = state;
                vec![AppAction::Render]
            },
            AppEvent::RecorderChanged(state) => {
                if state == self.recorder {
                    return vec![];
                }
                self.recorder = state;
                vec![AppAction::Render]
            },
            AppEvent::RecordingCaptured { uri, duration_secs } => {
                vec![AppAction::SaveRecording { uri, duration_secs }]
            },
            AppEvent::CaptureFailed { message } => {
                self.status_message = Some(format!("Error: Could not start recording: {message}"));
                vec![AppAction::Recorder(RecorderEvent::CaptureFailed), AppAction::Render]
            },
            AppEvent::RecordingsChanged(recordings) => {
                self.recordings = recordings;
                vec![AppAction::Render]
            },
            AppEvent::ContactsChanged(contacts) => {
                self.contacts = contacts;
                vec![AppAction::Render]
            },
            AppEvent::CardChanged(card) => {
                self.card = card;
                vec![AppAction::Render]
            },
            AppEvent::LocationSharingChanged(on) => {
                self.sharing_location = on;
                self.status_message = Some(
                    if on { "Your location is now being shared" } else { "Location sharing stopped" }
                        .to_string(),
                );
                vec![AppAction::Render]
            },
            AppEvent::AlarmChanged(on) => {
                self.alarm_on = on;
                vec![AppAction::Render]
            },
            AppEvent::Notice { message } => {
                self.status_message = Some(message);
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
            AppEvent::Shutdown => vec![AppAction::Quit],
        }
    }

    fn handle_intent(&mut self, intent: Intent) -> Vec<AppAction> {
        match intent {
            Intent::TriggerSos => vec![AppAction::Sos(SosEvent::Trigger)],
            Intent::CancelSos => vec![AppAction::Sos(SosEvent::Cancel)],
            Intent::ResolveSos => vec![AppAction::Sos(SosEvent::Resolve)],
            Intent::RetryAlert => vec![AppAction::Sos(SosEvent::RetryDispatch)],

            Intent::SelectCheckInDuration(minutes) => {
                vec![AppAction::CheckIn(CheckInEvent::SelectDuration(minutes))]
            },
            Intent::StartCheckIn => vec![AppAction::CheckIn(CheckInEvent::Start)],
            Intent::PauseCheckIn => vec![AppAction::CheckIn(CheckInEvent::Pause)],
            Intent::ResumeCheckIn => vec![AppAction::CheckIn(CheckInEvent::Resume)],
            Intent::DismissCheckIn => vec![AppAction::CheckIn(CheckInEvent::Dismiss)],
            Intent::EscalateCheckIn => vec![AppAction::CheckIn(CheckInEvent::Escalate)],
            Intent::ResetCheckIn => vec![AppAction::CheckIn(CheckInEvent::Reset)],

            Intent::SelectFakeCallDelay(seconds) => {
                vec![AppAction::FakeCall(FakeCallEvent::SelectDelay(seconds))]
            },
            Intent::ScheduleFakeCall => vec![AppAction::FakeCall(FakeCallEvent::Schedule)],
            Intent::AnswerFakeCall => vec![AppAction::FakeCall(FakeCallEvent::Answer)],
            Intent::EndFakeCall => vec![AppAction::FakeCall(FakeCallEvent::End)],
            Intent::ResetFakeCall => vec![AppAction::FakeCall(FakeCallEvent::Reset)],

            Intent::ToggleAlarm => vec![AppAction::ToggleAlarm],
            Intent::ToggleLocationSharing => vec![AppAction::ToggleLocationSharing],

            Intent::ToggleRecording => match self.recorder.status {
                RecorderStatus::Idle => vec![AppAction::Recorder(RecorderEvent::Start)],
                RecorderStatus::Recording => vec![AppAction::Recorder(RecorderEvent::Stop)],
            },
            Intent::DeleteRecording(id) => vec![AppAction::DeleteRecording(id)],

            Intent::AddContact { name, phone, relationship } => {
                match self.contact_fields(name, phone, relationship) {
                    Some(contact) => vec![AppAction::AddContact(contact), AppAction::Render],
                    None => vec![AppAction::Render],
                }
            },
            Intent::UpdateContact { id, name, phone, relationship } => {
                match self.contact_fields(name, phone, relationship) {
                    Some(contact) => vec![AppAction::UpdateContact { id, contact }, AppAction::Render],
                    None => vec![AppAction::Render],
                }
            },
            Intent::RemoveContact(id) => vec![AppAction::RemoveContact(id)],
            Intent::TogglePrimary(id) => vec![AppAction::TogglePrimary(id)],
            Intent::SaveCard(card) => {
                self.status_message = Some("Safety card saved".to_string());
                vec![AppAction::SaveCard(card)]
            },

            Intent::Quit => vec![AppAction::Quit],
        }
    }

    /// Presentation-boundary check: both fields must be non-blank.
    fn contact_fields(&mut self, name: String, phone: String, relationship: Relationship) -> Option<NewContact> {
        if name.trim().is_empty() || phone.trim().is_empty() {
            self.status_message = Some("Please enter a name and phone number".to_string());
            return None;
        }
        Some(NewContact::new(name.trim(), phone.trim()).with_relationship(relationship))
    }

    fn route_timer(id: TimerId) -> AppAction {
        match id.owner() {
            TimerOwner::Sos => AppAction::Sos(SosEvent::TimerFired(id)),
            TimerOwner::CheckIn => AppAction::CheckIn(CheckInEvent::TimerFired(id)),
            TimerOwner::FakeCall => AppAction::FakeCall(FakeCallEvent::TimerFired(id)),
            TimerOwner::Recorder => AppAction::Recorder(RecorderEvent::TimerFired(id)),
        }
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Home screen status line.
    pub fn home_status(&self) -> HomeStatus {
        HomeStatus::from_session(&self.sos, self.contacts.len())
    }

    /// Latest SOS snapshot.
    pub fn sos(&self) -> &SosState {
        &self.sos
    }

    /// Latest check-in snapshot.
    pub fn checkin(&self) -> &CheckInState {
        &self.checkin
    }

    /// Latest fake call snapshot.
    pub fn fake_call(&self) -> &FakeCallState {
        &self.fake_call
    }

    /// Latest recorder snapshot.
    pub fn recorder(&self) -> &RecorderState {
        &self.recorder
    }

    /// Saved recordings, newest first.
    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    /// Contacts in stored order.
    pub fn contacts(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    /// Safety card.
    pub fn card(&self) -> &SafetyCard {
        &self.card
    }

    /// Last known location. `None` until the first fix.
    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// Live location sharing is on.
    pub fn is_sharing_location(&self) -> bool {
        self.sharing_location
    }

    /// Siren is sounding.
    pub fn is_alarm_on(&self) -> bool {
        self.alarm_on
    }

    /// Check-in expired and the user has not answered yet.
    pub fn awaiting_check_in(&self) -> bool {
        self.checkin_prompt
    }

    /// Current status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use safeline_core::{
        CheckInConfig, CheckInTimer, ContactId, FakeCall, FakeCallConfig, SosStatus,
        TimerMode, TimerSlot,
    };

    use super::*;

    fn app() -> App {
        let sos = SosState {
            status: SosStatus::Idle,
            activated_at_ms: None,
            countdown_seconds: 5,
            escalation: None,
            dispatch: None,
        };
        App::new(
            sos,
            CheckInTimer::new(CheckInConfig::default()).state(),
            FakeCall::new(FakeCallConfig::default()).state(),
        )
    }

    fn armed(owner: TimerOwner) -> TimerId {
        let mut slot = TimerSlot::new(owner);
        let _ = slot.arm(std::time::Duration::from_secs(1), TimerMode::OneShot);
        slot.armed().unwrap()
    }

    #[test]
    fn blank_contact_fields_never_reach_the_core() {
        let mut app = app();
        let actions = app.handle(AppEvent::Intent(Intent::AddContact {
            name: "   ".into(),
            phone: "555".into(),
            relationship: Relationship::Friend,
        }));

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.status_message(), Some("Please enter a name and phone number"));
    }

    #[test]
    fn contact_fields_are_trimmed() {
        let mut app = app();
        let actions = app.handle(AppEvent::Intent(Intent::UpdateContact {
            id: ContactId::new("c1"),
            name: " Ana ".into(),
            phone: " 555 ".into(),
            relationship: Relationship::Sibling,
        }));

        assert_eq!(
            actions[0],
            AppAction::UpdateContact {
                id: ContactId::new("c1"),
                contact: NewContact::new("Ana", "555").with_relationship(Relationship::Sibling),
            }
        );
    }

    #[test]
    fn ticks_route_by_owner() {
        let mut app = app();
        let sos = armed(TimerOwner::Sos);
        let checkin = armed(TimerOwner::CheckIn);
        let call = armed(TimerOwner::FakeCall);
        let recorder = armed(TimerOwner::Recorder);

        assert_eq!(app.handle(AppEvent::TimerFired(sos)), vec![AppAction::Sos(SosEvent::TimerFired(sos))]);
        assert_eq!(
            app.handle(AppEvent::TimerFired(checkin)),
            vec![AppAction::CheckIn(CheckInEvent::TimerFired(checkin))]
        );
        assert_eq!(
            app.handle(AppEvent::TimerFired(call)),
            vec![AppAction::FakeCall(FakeCallEvent::TimerFired(call))]
        );
        assert_eq!(
            app.handle(AppEvent::TimerFired(recorder)),
            vec![AppAction::Recorder(RecorderEvent::TimerFired(recorder))]
        );
    }

    #[test]
    fn recording_toggle_follows_recorder_snapshot() {
        let mut app = app();
        assert_eq!(
            app.handle(AppEvent::Intent(Intent::ToggleRecording)),
            vec![AppAction::Recorder(RecorderEvent::Start)]
        );

        app.handle(AppEvent::RecorderChanged(RecorderState { status: RecorderStatus::Recording, elapsed_secs: 0 }));
        assert_eq!(
            app.handle(AppEvent::Intent(Intent::ToggleRecording)),
            vec![AppAction::Recorder(RecorderEvent::Stop)]
        );
    }

    #[test]
    fn failed_capture_resets_recorder_and_tells_user() {
        let mut app = app();
        let actions = app.handle(AppEvent::CaptureFailed { message: "no microphone".into() });

        assert_eq!(actions[0], AppAction::Recorder(RecorderEvent::CaptureFailed));
        assert_eq!(app.status_message(), Some("Error: Could not start recording: no microphone"));
    }

    #[test]
    fn unchanged_snapshot_does_not_render() {
        let mut app = app();
        let same = app.sos().clone();
        assert!(app.handle(AppEvent::SosChanged(same)).is_empty());
    }

    #[test]
    fn check_in_prompt_clears_when_timer_leaves_expired() {
        let mut app = app();
        app.handle(AppEvent::CheckInExpired);
        assert!(app.awaiting_check_in());
        assert_eq!(app.status_message(), Some(CHECK_IN_PROMPT));

        let mut setup = *app.checkin();
        setup.status = CheckInStatus::Setup;
        setup.remaining_secs -= 1;
        app.handle(AppEvent::CheckInChanged(setup));
        assert!(!app.awaiting_check_in());
    }

    #[test]
    fn errors_are_prefixed() {
        let mut app = app();
        app.handle(AppEvent::Error { message: "disk full".into() });
        assert_eq!(app.status_message(), Some("Error: disk full"));
    }

    #[test]
    fn shutdown_quits() {
        assert_eq!(app().handle(AppEvent::Shutdown), vec![AppAction::Quit]);
    }
}
