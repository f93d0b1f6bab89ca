//! Side effects requested by the [`Bridge`](crate::Bridge).
//!
//! The bridge never performs I/O. It queues [`Effect`]s which the runtime
//! drains after every action and executes through the driver and storage.

use safeline_core::{AlertRequest, EmergencyContact, Recording, SafetyCard, TimerCommand};

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Arm or cancel a timer.
    Timer(TimerCommand),
    /// Hand a message to the messaging transport.
    SendAlert(AlertRequest),
    /// Persist the full contact list.
    PersistContacts(Vec<EmergencyContact>),
    /// Persist the safety card.
    PersistCard(SafetyCard),
    /// Persist the full recording log.
    PersistRecordings(Vec<Recording>),
    /// Start capturing audio.
    StartCapture,
    /// Stop capturing audio and keep the result.
    StopCapture {
        /// Length counted by the recorder clock.
        duration_secs: u32,
    },
    /// Sound, vibration, or ringtone.
    Feedback(FeedbackCue),
}

/// Sensory feedback the platform should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackCue {
    /// Short vibration.
    Haptic,
    /// Incoming-call ringtone.
    Ringtone {
        /// Start or stop.
        on: bool,
    },
    /// Loud personal alarm.
    Siren {
        /// Start or stop.
        on: bool,
    },
}
