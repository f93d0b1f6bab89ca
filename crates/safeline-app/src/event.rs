//! Events consumed by [`App`](crate::App).
//!
//! Three sources feed the app: the driver (user intents, timer ticks, location
//! fixes, transport results), and the [`Bridge`](crate::Bridge), which reports
//! controller snapshots after every change.

use safeline_core::{
    AlertPurpose, CheckInState, Coordinates, DeliveryOutcome, EmergencyContact, FakeCallState,
    RecorderState, Recording, SafetyCard, SosState, TimerId,
};

use crate::Intent;

/// Input to the application state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// User request.
    Intent(Intent),

    /// A timer armed by one of the controllers fired.
    TimerFired(TimerId),

    /// New location fix.
    LocationUpdated(Coordinates),

    /// The messaging transport finished an alert.
    AlertCompleted {
        /// Purpose echoed from the request.
        purpose: AlertPurpose,
        /// Outcome.
        outcome: DeliveryOutcome,
    },

    /// SOS snapshot after a change.
    SosChanged(SosState),

    /// Check-in snapshot after a change.
    CheckInChanged(CheckInState),

    /// The check-in timer reached zero; the user must answer.
    CheckInExpired,

    /// Fake call snapshot after a change.
    FakeCallChanged(FakeCallState),

    /// Recorder snapshot after a change.
    RecorderChanged(RecorderState),

    /// The platform stopped capturing and stored the audio.
    RecordingCaptured {
        /// Where the audio is.
        uri: String,
        /// Length counted by the recorder clock.
        duration_secs: u32,
    },

    /// The platform could not start capturing.
    CaptureFailed {
        /// Reason.
        message: String,
    },

    /// Recording log after a change, newest first.
    RecordingsChanged(Vec<Recording>),

    /// Contact list after a change, in stored order.
    ContactsChanged(Vec<EmergencyContact>),

    /// Safety card after a change.
    CardChanged(SafetyCard),

    /// Live location sharing switched on or off.
    LocationSharingChanged(bool),

    /// Siren switched on or off.
    AlarmChanged(bool),

    /// Informational message for the user.
    Notice {
        /// Message text.
        message: String,
    },

    /// Something failed; tell the user.
    Error {
        /// Message text.
        message: String,
    },

    /// The driver is shutting down (input closed, signal received).
    Shutdown,
}

impl AppEvent {
    /// Processing order within one batch of driver events.
    ///
    /// Reports from the outside world (location fixes, transport outcomes)
    /// go first, so an intent in the same batch sees them: a retry follows
    /// the failure it answers. User intents come next, so a cancel wins over
    /// a tick delivered in the same batch. Timer ticks go last.
    pub fn priority(&self) -> u8 {
        match self {
            Self::LocationUpdated(_) | Self::AlertCompleted { .. } => 0,
            Self::Intent(_) | Self::Shutdown => 1,
            Self::TimerFired(_) => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use safeline_core::{TimerMode, TimerOwner, TimerSlot};

    use super::*;

    #[test]
    fn intents_sort_before_ticks() {
        let mut slot = TimerSlot::new(TimerOwner::Sos);
        let _ = slot.arm(std::time::Duration::from_secs(1), TimerMode::Repeating);
        let tick = AppEvent::TimerFired(slot.armed().unwrap());

        let mut batch = vec![
            tick.clone(),
            AppEvent::Notice { message: "hi".into() },
            AppEvent::Intent(Intent::CancelSos),
        ];
        batch.sort_by_key(AppEvent::priority);

        assert_eq!(batch[0], AppEvent::Intent(Intent::CancelSos));
        assert_eq!(batch[2], tick);
    }

    #[test]
    fn outcomes_sort_before_intents() {
        let completed = AppEvent::AlertCompleted {
            purpose: safeline_core::AlertPurpose::Sos { escalation: safeline_core::Escalation::new(1) },
            outcome: Err(safeline_core::DispatchError::Failed("no signal".into())),
        };
        let mut batch = vec![AppEvent::Intent(Intent::RetryAlert), completed.clone()];
        batch.sort_by_key(AppEvent::priority);

        assert_eq!(batch, vec![completed, AppEvent::Intent(Intent::RetryAlert)]);
    }
}
