//! Terminal collaborators: a messaging transport that only logs, and a fixed
//! location.
//!
//! A terminal has no SMS gateway. [`LogTransport`] records each alert through
//! `tracing` and reports the hand-off as unconfirmed, or refuses everything
//! when started offline.

use safeline_app::{LocationProvider, MessagingTransport};
use safeline_core::{Coordinates, DeliveryOutcome, DeliveryReport, DeliveryStatus, DispatchError};
use tracing::{info, warn};

/// Messaging transport that writes alerts to the log.
#[derive(Debug, Clone, Default)]
pub struct LogTransport {
    offline: bool,
}

impl LogTransport {
    /// Transport that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with no messaging service.
    pub fn offline() -> Self {
        Self { offline: true }
    }

    fn deliver(&self, recipients: &[String], message: &str) -> DeliveryOutcome {
        if self.offline {
            warn!(recipients = recipients.len(), "no messaging service, alert not sent");
            return Err(DispatchError::Unavailable("no messaging service configured".to_string()));
        }
        for recipient in recipients {
            info!(%recipient, %message, "alert handed off");
        }
        Ok(DeliveryReport { recipients: recipients.len(), status: DeliveryStatus::Unknown })
    }
}

impl MessagingTransport for LogTransport {
    fn send_alert(
        &self,
        recipients: &[String],
        message: &str,
    ) -> impl Future<Output = DeliveryOutcome> + Send {
        std::future::ready(self.deliver(recipients, message))
    }
}

/// Location provider reporting a position given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(Option<Coordinates>);

impl FixedLocation {
    /// Provider reporting `fix` forever.
    pub fn new(fix: Option<Coordinates>) -> Self {
        Self(fix)
    }
}

impl LocationProvider for FixedLocation {
    fn current_coordinates(&self) -> impl Future<Output = Option<Coordinates>> + Send {
        std::future::ready(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hand_off_is_unconfirmed() {
        let recipients = vec!["555-0101".to_string(), "555-0102".to_string()];

        let outcome = LogTransport::new().send_alert(&recipients, "help").await;

        assert_eq!(outcome, Ok(DeliveryReport { recipients: 2, status: DeliveryStatus::Unknown }));
    }

    #[tokio::test]
    async fn offline_refuses() {
        let outcome = LogTransport::offline().send_alert(&["1".to_string()], "help").await;
        assert!(matches!(outcome, Err(DispatchError::Unavailable(_))));
    }
}
