//! Observable session state for invariant checking.

use std::collections::{BTreeMap, BTreeSet};

use safeline_app::{App, Bridge};
use safeline_core::{
    AlertPurpose, AlertRequest, CheckInState, EmergencyContact, Environment, Escalation,
    FakeCallState, RecorderState, SosState, TimerId,
};

/// Session state seen from both sides of the runtime: what the controllers
/// hold, what the view shows, and what the driver has armed or sent.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// SOS controller snapshot.
    pub sos: SosState,
    /// SOS snapshot held by the view.
    pub view_sos: SosState,
    /// Configured grace period.
    pub countdown_secs: u32,
    /// Alerts allowed per escalation.
    pub max_dispatch_attempts: u32,
    /// Escalations so far.
    pub escalations: u64,
    /// Check-in controller snapshot.
    pub checkin: CheckInState,
    /// Check-in snapshot held by the view.
    pub view_checkin: CheckInState,
    /// Fake call snapshot.
    pub fake_call: FakeCallState,
    /// Fake call snapshot held by the view.
    pub view_fake_call: FakeCallState,
    /// Recorder snapshot.
    pub recorder: RecorderState,
    /// Recorder snapshot held by the view.
    pub view_recorder: RecorderState,
    /// Saved recordings in the bridge and in the view.
    pub recordings: (usize, usize),
    /// Contacts held by the bridge.
    pub contacts: Vec<EmergencyContact>,
    /// Contacts shown by the view.
    pub view_contacts: Vec<EmergencyContact>,
    /// Siren state in the bridge and in the view.
    pub alarm_on: (bool, bool),
    /// Location sharing state in the bridge and in the view.
    pub sharing_location: (bool, bool),
    /// Timers the controllers consider armed.
    pub controller_timers: BTreeSet<TimerId>,
    /// Timers armed on the platform.
    pub driver_timers: BTreeSet<TimerId>,
    /// SOS alerts handed to the transport, per escalation.
    pub alerts_per_escalation: BTreeMap<Escalation, u32>,
}

impl SessionSnapshot {
    /// Capture a snapshot.
    ///
    /// `driver_timers` are the timers the platform has armed and `sent` every
    /// alert handed to the transport so far.
    pub fn capture<E: Environment>(
        app: &App,
        bridge: &Bridge<E>,
        driver_timers: impl IntoIterator<Item = TimerId>,
        sent: &[AlertRequest],
    ) -> Self {
        let mut alerts_per_escalation = BTreeMap::new();
        for request in sent {
            if let AlertPurpose::Sos { escalation } = request.purpose {
                *alerts_per_escalation.entry(escalation).or_insert(0) += 1;
            }
        }

        let sos = bridge.sos();
        Self {
            sos: sos.state(),
            view_sos: app.sos().clone(),
            countdown_secs: sos.config().countdown_secs,
            max_dispatch_attempts: sos.config().max_dispatch_attempts,
            escalations: sos.escalations(),
            checkin: bridge.checkin().state(),
            view_checkin: *app.checkin(),
            fake_call: bridge.fake_call().state(),
            view_fake_call: app.fake_call().clone(),
            recorder: bridge.recorder().state(),
            view_recorder: *app.recorder(),
            recordings: (bridge.recordings().len(), app.recordings().len()),
            contacts: bridge.contacts().contacts().to_vec(),
            view_contacts: app.contacts().to_vec(),
            alarm_on: (bridge.is_alarm_on(), app.is_alarm_on()),
            sharing_location: (bridge.is_sharing_location(), app.is_sharing_location()),
            controller_timers: bridge.armed_timers().into_iter().collect(),
            driver_timers: driver_timers.into_iter().collect(),
            alerts_per_escalation,
        }
    }
}
