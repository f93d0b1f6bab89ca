//! User intents.
//!
//! Everything the presentation layer can ask for. Frontends translate their
//! own input (keys, taps, command lines) into an [`Intent`] and hand it to the
//! runtime wrapped in [`AppEvent::Intent`](crate::AppEvent::Intent).

use safeline_core::{ContactId, RecordingId, Relationship, SafetyCard};

/// A user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Press the SOS button.
    TriggerSos,
    /// Cancel the SOS countdown.
    CancelSos,
    /// "I'm safe".
    ResolveSos,
    /// Send the emergency alert again after a failure.
    RetryAlert,

    /// Pick a check-in duration.
    SelectCheckInDuration(u32),
    /// Start the check-in timer.
    StartCheckIn,
    /// Pause the check-in timer.
    PauseCheckIn,
    /// Resume the check-in timer.
    ResumeCheckIn,
    /// Answer the check-in prompt with "I'm safe".
    DismissCheckIn,
    /// Answer the check-in prompt with "Send SOS".
    EscalateCheckIn,
    /// Abandon the check-in and return to setup.
    ResetCheckIn,

    /// Pick a fake call delay.
    SelectFakeCallDelay(u32),
    /// Schedule the fake call.
    ScheduleFakeCall,
    /// Answer the ringing call.
    AnswerFakeCall,
    /// Decline or hang up.
    EndFakeCall,
    /// Cancel a scheduled call and return to setup.
    ResetFakeCall,

    /// Siren on/off.
    ToggleAlarm,
    /// Start or stop sharing the live location.
    ToggleLocationSharing,

    /// Start or stop recording audio evidence.
    ToggleRecording,
    /// Delete a saved recording.
    DeleteRecording(RecordingId),

    /// Add an emergency contact.
    AddContact {
        /// Display name.
        name: String,
        /// Phone number.
        phone: String,
        /// Relationship label.
        relationship: Relationship,
    },
    /// Edit an emergency contact.
    UpdateContact {
        /// Contact to edit.
        id: ContactId,
        /// Display name.
        name: String,
        /// Phone number.
        phone: String,
        /// Relationship label.
        relationship: Relationship,
    },
    /// Delete an emergency contact.
    RemoveContact(ContactId),
    /// Flip a contact's primary flag.
    TogglePrimary(ContactId),
    /// Replace the safety card.
    SaveCard(SafetyCard),

    /// End the session.
    Quit,
}
