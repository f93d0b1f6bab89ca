//! Controller-to-Application translation layer.
//!
//! The [`Bridge`] owns the safety controllers and the session data they read,
//! and adapts them to the high-level application lifecycle.
//!
//! # Responsibilities
//!
//! - Feeds [`crate::AppAction`]s into the SOS, check-in, fake call, and
//!   recorder controllers.
//! - Files finished captures in the recording log.
//! - Composes alerts from contacts, the safety card, and the last location
//!   when a controller asks for a dispatch.
//! - Accumulates [`Effect`]s (timers, alerts, persistence, feedback) to be
//!   executed by the runtime in the next I/O cycle.
//! - Converts controller output back into [`crate::AppEvent`]s to update the
//!   UI.

use safeline_core::{
    AlertPurpose, AlertRequest, CheckInAction, CheckInEvent, CheckInTimer, ContactBook, ContactId,
    Coordinates, DeliveryOutcome, DispatchError, EmergencyContact, Environment, FakeCall,
    FakeCallAction, FakeCallEvent, NewContact, Recorder, RecorderAction, RecorderEvent, Recording,
    RecordingId, RecordingLog, SafetyCard, SosAction, SosController, SosEvent, SosStatus, TimerId,
    recording::format_clock,
};
use tracing::{debug, info, warn};

use crate::{AppAction, AppEvent, Effect, FeedbackCue, SessionConfig};

/// Bridge between App and the safety controllers.
///
/// Generic over Environment to support both production and simulation.
pub struct Bridge<E: Environment> {
    env: E,
    sos: SosController<E>,
    checkin: CheckInTimer,
    fake_call: FakeCall,
    recorder: Recorder,
    recordings: RecordingLog,
    contacts: ContactBook,
    card: SafetyCard,
    /// Last location fix. `None` until the provider reports one.
    location: Option<Coordinates>,
    sharing_location: bool,
    /// A location-share alert is waiting for the transport.
    share_in_flight: bool,
    alarm_on: bool,
    effects: Vec<Effect>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with every controller at rest and no contacts.
    pub fn new(env: E, config: SessionConfig) -> Self {
        Self {
            sos: SosController::new(env.clone(), config.sos),
            checkin: CheckInTimer::new(config.checkin),
            fake_call: FakeCall::new(config.fake_call),
            recorder: Recorder::new(),
            recordings: RecordingLog::new(),
            env,
            contacts: ContactBook::new(),
            card: SafetyCard::default(),
            location: None,
            sharing_location: false,
            share_in_flight: false,
            alarm_on: false,
            effects: Vec::new(),
        }
    }

    /// Install persisted contacts, card, and recordings. Nothing is written
    /// back.
    pub fn restore(
        &mut self,
        contacts: Vec<EmergencyContact>,
        card: SafetyCard,
        recordings: Vec<Recording>,
    ) -> Vec<AppEvent> {
        self.contacts = ContactBook::from_contacts(contacts);
        self.card = card;
        self.recordings = RecordingLog::from_recordings(recordings);
        info!(contacts = self.contacts.len(), recordings = self.recordings.len(), "session data restored");
        vec![
            AppEvent::ContactsChanged(self.contacts.contacts().to_vec()),
            AppEvent::CardChanged(self.card.clone()),
            AppEvent::RecordingsChanged(self.recordings.recordings().to_vec()),
        ]
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::Sos(event) => self.sos_event(event),
            AppAction::CheckIn(event) => self.checkin_event(event),
            AppAction::FakeCall(event) => self.fake_call_event(event),
            AppAction::Recorder(event) => self.recorder_event(event),
            AppAction::SaveRecording { uri, duration_secs } => self.save_recording(uri, duration_secs),
            AppAction::DeleteRecording(id) => self.delete_recording(&id),
            AppAction::AddContact(contact) => self.add_contact(contact),
            AppAction::UpdateContact { id, contact } => match self.contacts.update(&id, contact) {
                Ok(()) => {
                    info!(%id, "contact updated");
                    self.contacts_changed()
                },
                Err(e) => vec![AppEvent::Error { message: e.to_string() }],
            },
            AppAction::RemoveContact(id) => match self.contacts.remove(&id) {
                Some(_) => {
                    info!(%id, "contact removed");
                    self.contacts_changed()
                },
                None => {
                    debug!(%id, "remove of unknown contact ignored");
                    vec![]
                },
            },
            AppAction::TogglePrimary(id) => match self.contacts.toggle_primary(&id) {
                Ok(primary) => {
                    info!(%id, primary, "primary flag toggled");
                    self.contacts_changed()
                },
                Err(e) => vec![AppEvent::Error { message: e.to_string() }],
            },
            AppAction::SaveCard(card) => {
                self.card = card;
                self.effects.push(Effect::PersistCard(self.card.clone()));
                vec![AppEvent::CardChanged(self.card.clone())]
            },
            AppAction::RecordLocation(location) => {
                self.location = Some(location);
                vec![]
            },
            AppAction::ToggleLocationSharing => self.toggle_location_sharing(),
            AppAction::ToggleAlarm => self.set_alarm(!self.alarm_on),
            AppAction::AlertCompleted { purpose, outcome } => match purpose {
                AlertPurpose::Sos { escalation } => {
                    self.sos_event(SosEvent::DispatchCompleted { escalation, outcome })
                },
                AlertPurpose::LocationShare => self.location_share_completed(outcome),
            },
            AppAction::Render | AppAction::Quit => vec![],
        }
    }

    /// Shut every controller down: cancel timers, stop the siren and ringtone,
    /// and stop a running capture so it can still be saved.
    pub fn shutdown(&mut self) -> Vec<AppEvent> {
        let mut events = self.sos_event(SosEvent::Shutdown);
        events.extend(self.checkin_event(CheckInEvent::Shutdown));
        events.extend(self.fake_call_event(FakeCallEvent::Shutdown));
        events.extend(self.recorder_event(RecorderEvent::Shutdown));
        events.extend(self.set_alarm(false));
        if self.sharing_location {
            self.sharing_location = false;
            events.push(AppEvent::LocationSharingChanged(false));
        }
        events
    }

    /// Take pending effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Timers currently armed by any controller.
    pub fn armed_timers(&self) -> Vec<TimerId> {
        [
            self.sos.armed_timer(),
            self.checkin.armed_timer(),
            self.fake_call.armed_timer(),
            self.recorder.armed_timer(),
        ]
        .into_iter()
            .flatten()
            .collect()
    }

    /// SOS controller.
    pub fn sos(&self) -> &SosController<E> {
        &self.sos
    }

    /// Check-in timer.
    pub fn checkin(&self) -> &CheckInTimer {
        &self.checkin
    }

    /// Fake call.
    pub fn fake_call(&self) -> &FakeCall {
        &self.fake_call
    }

    /// Audio recorder.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Saved recordings.
    pub fn recordings(&self) -> &RecordingLog {
        &self.recordings
    }

    /// Contact book.
    pub fn contacts(&self) -> &ContactBook {
        &self.contacts
    }

    /// Safety card.
    pub fn card(&self) -> &SafetyCard {
        &self.card
    }

    /// Last location fix.
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

    fn sos_event(&mut self, event: SosEvent) -> Vec<AppEvent> {
        let mut events = Vec::new();
        let mut pending = vec![event];

        while let Some(event) = pending.pop() {
            for action in self.sos.handle(event) {
                match action {
                    SosAction::Timer(command) => self.effects.push(Effect::Timer(command)),
                    SosAction::Dispatch { escalation, attempt } => {
                        match AlertRequest::sos(escalation, &self.contacts, &self.card, self.location) {
                            Ok(request) => {
                                info!(
                                    %escalation,
                                    attempt,
                                    recipients = request.recipients.len(),
                                    located = request.location.is_some(),
                                    "sending emergency alert"
                                );
                                self.effects.push(Effect::SendAlert(request));
                            },
                            // Nothing to hand to the transport: fail the attempt now.
                            Err(error) => {
                                pending.push(SosEvent::DispatchCompleted { escalation, outcome: Err(error) });
                            },
                        }
                    },
                    SosAction::StatusChanged { to, .. } => {
                        if matches!(to, SosStatus::Countdown | SosStatus::Active) {
                            self.effects.push(Effect::Feedback(FeedbackCue::Haptic));
                        }
                    },
                    SosAction::ReportError { error, .. } => {
                        events.push(AppEvent::Error { message: error.user_message() });
                    },
                }
            }
        }

        events.push(AppEvent::SosChanged(self.sos.state()));
        events
    }

    fn checkin_event(&mut self, event: CheckInEvent) -> Vec<AppEvent> {
        let mut events = Vec::new();
        let mut escalate = false;

        for action in self.checkin.handle(event) {
            match action {
                CheckInAction::Timer(command) => self.effects.push(Effect::Timer(command)),
                CheckInAction::StatusChanged { .. } => {},
                CheckInAction::Expired => {
                    self.effects.push(Effect::Feedback(FeedbackCue::Haptic));
                    events.push(AppEvent::CheckInExpired);
                },
                CheckInAction::EscalateToSos => escalate = true,
                CheckInAction::Rejected(e) => events.push(AppEvent::Error { message: e.to_string() }),
            }
        }

        events.push(AppEvent::CheckInChanged(self.checkin.state()));
        if escalate {
            warn!("check-in unanswered, raising SOS");
            events.extend(self.sos_event(SosEvent::Escalate));
        }
        events
    }

    fn fake_call_event(&mut self, event: FakeCallEvent) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in self.fake_call.handle(event) {
            match action {
                FakeCallAction::Timer(command) => self.effects.push(Effect::Timer(command)),
                FakeCallAction::StatusChanged { .. } => {},
                FakeCallAction::Ring { on } => {
                    self.effects.push(Effect::Feedback(FeedbackCue::Ringtone { on }));
                },
                FakeCallAction::Rejected(e) => events.push(AppEvent::Error { message: e.to_string() }),
            }
        }

        events.push(AppEvent::FakeCallChanged(self.fake_call.state()));
        events
    }

    fn recorder_event(&mut self, event: RecorderEvent) -> Vec<AppEvent> {
        for action in self.recorder.handle(event) {
            match action {
                RecorderAction::Timer(command) => self.effects.push(Effect::Timer(command)),
                RecorderAction::StatusChanged { .. } => {},
                RecorderAction::StartCapture => {
                    info!("recording audio evidence");
                    self.effects.push(Effect::Feedback(FeedbackCue::Haptic));
                    self.effects.push(Effect::StartCapture);
                },
                RecorderAction::StopCapture { duration_secs } => {
                    self.effects.push(Effect::Feedback(FeedbackCue::Haptic));
                    self.effects.push(Effect::StopCapture { duration_secs });
                },
            }
        }
        vec![AppEvent::RecorderChanged(self.recorder.state())]
    }

    fn save_recording(&mut self, uri: String, duration_secs: u32) -> Vec<AppEvent> {
        let saved = self.recordings.add(uri, duration_secs, self.env.wall_clock_ms());
        info!(id = %saved.id, duration_secs, "recording saved");
        let message = format!("Recording saved ({})", format_clock(duration_secs));
        let mut events = self.recordings_changed();
        events.push(AppEvent::Notice { message });
        events
    }

    fn delete_recording(&mut self, id: &RecordingId) -> Vec<AppEvent> {
        match self.recordings.remove(id) {
            Some(_) => {
                info!(%id, "recording deleted");
                self.recordings_changed()
            },
            None => vec![AppEvent::Error { message: format!("No recording with id {id}") }],
        }
    }

    fn recordings_changed(&mut self) -> Vec<AppEvent> {
        let recordings = self.recordings.recordings().to_vec();
        self.effects.push(Effect::PersistRecordings(recordings.clone()));
        vec![AppEvent::RecordingsChanged(recordings)]
    }

    fn add_contact(&mut self, contact: NewContact) -> Vec<AppEvent> {
        let id = self.fresh_contact_id();
        match self.contacts.add(id, contact) {
            Ok(added) => {
                info!(id = %added.id, primary = added.is_primary, "contact added");
                self.contacts_changed()
            },
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }

    fn fresh_contact_id(&self) -> ContactId {
        loop {
            let id = ContactId::from_random(self.env.random_u64());
            if !self.contacts.contains(&id) {
                return id;
            }
        }
    }

    fn contacts_changed(&mut self) -> Vec<AppEvent> {
        let contacts = self.contacts.contacts().to_vec();
        self.effects.push(Effect::PersistContacts(contacts.clone()));
        vec![AppEvent::ContactsChanged(contacts)]
    }

    fn toggle_location_sharing(&mut self) -> Vec<AppEvent> {
        if self.sharing_location {
            self.sharing_location = false;
            info!("location sharing stopped");
            return vec![AppEvent::LocationSharingChanged(false)];
        }
        if self.share_in_flight {
            debug!("location share already in flight");
            return vec![];
        }

        match AlertRequest::location_share(&self.contacts, self.location) {
            Ok(request) => {
                info!(recipients = request.recipients.len(), "sharing live location");
                self.share_in_flight = true;
                self.effects.push(Effect::SendAlert(request));
                vec![AppEvent::Notice { message: "Sharing your location...".to_string() }]
            },
            Err(error) => vec![AppEvent::Error { message: share_error_message(&error) }],
        }
    }

    fn location_share_completed(&mut self, outcome: DeliveryOutcome) -> Vec<AppEvent> {
        self.share_in_flight = false;
        match outcome {
            Ok(report) => {
                info!(recipients = report.recipients, status = ?report.status, "location shared");
                self.sharing_location = true;
                vec![AppEvent::LocationSharingChanged(true)]
            },
            Err(error) => {
                warn!(%error, "location share failed");
                vec![AppEvent::Error { message: share_error_message(&error) }]
            },
        }
    }

    fn set_alarm(&mut self, on: bool) -> Vec<AppEvent> {
        if self.alarm_on == on {
            return vec![];
        }
        self.alarm_on = on;
        info!(on, "personal alarm toggled");
        self.effects.push(Effect::Feedback(FeedbackCue::Siren { on }));
        vec![AppEvent::AlarmChanged(on)]
    }
}

fn share_error_message(error: &DispatchError) -> String {
    match error {
        DispatchError::NoContacts => "Please add emergency contacts to share your location".to_string(),
        other => other.user_message(),
    }
}
