//! External collaborators.
//!
//! The messaging transport and the location provider are platform services.
//! Drivers own an implementation of each and translate their results into
//! [`AppEvent`](crate::AppEvent)s.

use std::future::Future;

use safeline_core::{Coordinates, DeliveryOutcome};

/// Sends a text message to a set of phone numbers.
pub trait MessagingTransport: Send + Sync + 'static {
    /// Deliver `message` to every recipient.
    ///
    /// Never panics; every failure is reported through the outcome.
    fn send_alert(
        &self,
        recipients: &[String],
        message: &str,
    ) -> impl Future<Output = DeliveryOutcome> + Send;
}

/// Reports the device position.
pub trait LocationProvider: Send + Sync + 'static {
    /// Latest fix. `None` while no fix has been acquired.
    fn current_coordinates(&self) -> impl Future<Output = Option<Coordinates>> + Send;
}
