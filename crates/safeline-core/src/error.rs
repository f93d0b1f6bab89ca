//! Error types for the safety core.
//!
//! Nothing here is fatal. [`InputError`] is raised by validation at the
//! presentation boundary. [`DispatchError`] describes an alert that could not
//! be delivered; it is reported to the user while the SOS state stays put.

use thiserror::Error;

use crate::{contacts::ContactId, recording::RecordingId};

/// Rejected user input.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    /// Required text field was empty after trimming.
    #[error("{field} is required")]
    EmptyField {
        /// Name of the field.
        field: &'static str,
    },

    /// Contact id does not exist in the contact book.
    #[error("unknown contact: {0}")]
    UnknownContact(ContactId),

    /// Recording id does not exist in the recordings log.
    #[error("unknown recording: {0}")]
    UnknownRecording(RecordingId),

    /// Relationship label outside the supported set.
    #[error("unknown relationship: {0}")]
    UnknownRelationship(String),

    /// Blood group outside the supported set.
    #[error("unknown blood group: {0}")]
    UnknownBloodGroup(String),

    /// Coordinates out of range or not finite.
    #[error("invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates {
        /// Latitude as supplied.
        lat: f64,
        /// Longitude as supplied.
        lon: f64,
    },

    /// Check-in duration outside the accepted range.
    #[error("invalid check-in duration: {minutes} minutes (expected {min}..={max})")]
    InvalidDuration {
        /// Requested duration.
        minutes: u32,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// Fake call delay outside the accepted range.
    #[error("invalid fake call delay: {seconds} seconds")]
    InvalidDelay {
        /// Requested delay.
        seconds: u32,
    },
}

/// Why an alert could not be delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No emergency contacts configured.
    #[error("no emergency contacts configured")]
    NoContacts,

    /// No location fix available for a location-only message.
    #[error("location not yet available")]
    NoLocation,

    /// Messaging transport cannot be used on this device.
    #[error("messaging unavailable: {0}")]
    Unavailable(String),

    /// The user dismissed the outgoing message.
    #[error("message cancelled before sending")]
    Cancelled,

    /// Transport accepted the request but failed to deliver it.
    #[error("delivery failed: {0}")]
    Failed(String),
}

impl DispatchError {
    /// Actionable message for the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoContacts => "Add emergency contacts so alerts can be delivered".to_string(),
            Self::NoLocation => "Still acquiring your GPS signal".to_string(),
            Self::Unavailable(_) => "SMS service is not available on this device.".to_string(),
            Self::Cancelled => "Alert was not sent".to_string(),
            Self::Failed(reason) => format!("Alert delivery failed: {reason}"),
        }
    }
}
