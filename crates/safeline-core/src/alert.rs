//! Alert composition.
//!
//! Turns the session's contacts, safety card, and last-known location into an
//! [`AlertRequest`] for the messaging transport. Composition is pure; delivery
//! is the driver's job and its outcome comes back as a [`DeliveryOutcome`].

use std::fmt::Write as _;

use crate::{
    card::SafetyCard, contacts::ContactBook, error::DispatchError, location::Coordinates,
    sos::Escalation,
};

/// Marker used in place of a map link when no fix has been acquired.
pub const NO_LOCATION_MARKER: &str = "Location: not yet available";

/// Name used when the safety card carries none.
pub const ANONYMOUS_SENDER: &str = "A SafeLine user";

/// Why an alert is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertPurpose {
    /// Emergency alert for one SOS escalation.
    Sos {
        /// Escalation the alert belongs to.
        escalation: Escalation,
    },
    /// One-off live location share.
    LocationShare,
}

/// Message ready for the messaging transport.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    /// Why it is sent. Echoed back with the outcome.
    pub purpose: AlertPurpose,
    /// Phone numbers in notification order.
    pub recipients: Vec<String>,
    /// Message body.
    pub message: String,
    /// Location embedded in the message, if any.
    pub location: Option<Coordinates>,
}

impl AlertRequest {
    /// Compose the emergency alert for `escalation`.
    ///
    /// Fails with [`DispatchError::NoContacts`] when nobody can be notified. A
    /// missing location is not an error; the message says so instead.
    pub fn sos(
        escalation: Escalation,
        contacts: &ContactBook,
        card: &SafetyCard,
        location: Option<Coordinates>,
    ) -> Result<Self, DispatchError> {
        if contacts.is_empty() {
            return Err(DispatchError::NoContacts);
        }
        Ok(Self {
            purpose: AlertPurpose::Sos { escalation },
            recipients: contacts.recipients(),
            message: sos_message(card, location),
            location,
        })
    }

    /// Compose a live location share.
    pub fn location_share(
        contacts: &ContactBook,
        location: Option<Coordinates>,
    ) -> Result<Self, DispatchError> {
        let location = location.ok_or(DispatchError::NoLocation)?;
        if contacts.is_empty() {
            return Err(DispatchError::NoContacts);
        }
        Ok(Self {
            purpose: AlertPurpose::LocationShare,
            recipients: contacts.recipients(),
            message: location_share_message(location),
            location: Some(location),
        })
    }
}

/// Emergency alert body.
pub fn sos_message(card: &SafetyCard, location: Option<Coordinates>) -> String {
    let name = card.display_name().unwrap_or(ANONYMOUS_SENDER);
    let mut message = format!("EMERGENCY SOS: {name} needs help.");
    if card.blood_group.is_known() {
        let _ = write!(message, "\nBlood group: {}", card.blood_group);
    }
    match location {
        Some(location) => {
            let _ = write!(message, "\nLive location: {}", location.maps_url());
        },
        None => {
            message.push('\n');
            message.push_str(NO_LOCATION_MARKER);
        },
    }
    message
}

/// Live location share body.
pub fn location_share_message(location: Coordinates) -> String {
    format!(
        "I'm sending you my live location for my safety. My coordinates are: {}",
        location.maps_url()
    )
}

/// How far the transport got with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Handed to the carrier.
    Sent,
    /// Handed off, but the platform cannot confirm delivery.
    Unknown,
}

/// Successful transport result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Number of recipients the message was addressed to.
    pub recipients: usize,
    /// Delivery confidence.
    pub status: DeliveryStatus,
}

/// Result of one dispatch attempt.
pub type DeliveryOutcome = Result<DeliveryReport, DispatchError>;
