//! Actions produced by [`App`](crate::App).
//!
//! `Render` and `Quit` are handled by the runtime directly; everything else
//! is routed through the [`Bridge`](crate::Bridge) to the controllers.

use safeline_core::{
    AlertPurpose, CheckInEvent, ContactId, Coordinates, DeliveryOutcome, FakeCallEvent, NewContact,
    RecorderEvent, RecordingId, SafetyCard, SosEvent,
};

/// Output of the application state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Redraw the UI.
    Render,

    /// End the session.
    Quit,

    /// Feed the SOS controller.
    Sos(SosEvent),

    /// Feed the check-in timer.
    CheckIn(CheckInEvent),

    /// Feed the fake call.
    FakeCall(FakeCallEvent),

    /// Feed the audio recorder.
    Recorder(RecorderEvent),

    /// File a finished capture in the recording log.
    SaveRecording {
        /// Where the platform stored the audio.
        uri: String,
        /// Length in whole seconds.
        duration_secs: u32,
    },

    /// Delete a saved recording.
    DeleteRecording(RecordingId),

    /// Add a contact.
    AddContact(NewContact),

    /// Edit a contact.
    UpdateContact {
        /// Contact to edit.
        id: ContactId,
        /// New fields.
        contact: NewContact,
    },

    /// Delete a contact.
    RemoveContact(ContactId),

    /// Flip a contact's primary flag.
    TogglePrimary(ContactId),

    /// Replace the safety card.
    SaveCard(SafetyCard),

    /// Remember the latest location fix.
    RecordLocation(Coordinates),

    /// Start or stop live location sharing.
    ToggleLocationSharing,

    /// Siren on/off.
    ToggleAlarm,

    /// Hand a transport result to its owner.
    AlertCompleted {
        /// Purpose echoed from the request.
        purpose: AlertPurpose,
        /// Outcome.
        outcome: DeliveryOutcome,
    },
}
