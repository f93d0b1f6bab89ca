//! Derived view state.
//!
//! Small view-model types computed from the controller snapshots held by
//! [`App`](crate::App). They carry no state of their own.

use std::fmt;

use safeline_core::{DispatchError, DispatchState, SosState, SosStatus};

/// One-line summary shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeStatus {
    /// SOS countdown running.
    Activating {
        /// Seconds left.
        seconds: u32,
    },
    /// SOS active and the alert went out, or is on its way.
    AlertsSent,
    /// SOS active but the last dispatch attempt failed.
    AlertFailed(DispatchError),
    /// Briefly shown after "I'm safe".
    Safe,
    /// Idle with contacts configured.
    Ready {
        /// Number of contacts.
        contacts: usize,
    },
    /// Idle with nobody to notify.
    NeedsContacts,
}

impl HomeStatus {
    /// Derive the status line from the SOS snapshot and contact count.
    pub fn from_session(sos: &SosState, contacts: usize) -> Self {
        match sos.status {
            SosStatus::Countdown => Self::Activating { seconds: sos.countdown_seconds },
            SosStatus::Active => match &sos.dispatch {
                Some(DispatchState::Failed { error, .. }) => Self::AlertFailed(error.clone()),
                _ => Self::AlertsSent,
            },
            SosStatus::Resolved => Self::Safe,
            SosStatus::Idle if contacts == 0 => Self::NeedsContacts,
            SosStatus::Idle => Self::Ready { contacts },
        }
    }
}

impl fmt::Display for HomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activating { .. } => f.write_str("SOS activating..."),
            Self::AlertsSent => f.write_str("Emergency alerts sent!"),
            Self::AlertFailed(error) => f.write_str(&error.user_message()),
            Self::Safe => f.write_str("You are safe now"),
            Self::Ready { contacts } => write!(f, "{contacts} contact(s) ready"),
            Self::NeedsContacts => f.write_str("Add emergency contacts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use safeline_core::{DeliveryReport, DeliveryStatus, Escalation};

    use super::*;

    fn sos(status: SosStatus, dispatch: Option<DispatchState>) -> SosState {
        SosState {
            status,
            activated_at_ms: (status == SosStatus::Active).then_some(1),
            countdown_seconds: 3,
            escalation: (status == SosStatus::Active).then(|| Escalation::new(1)),
            dispatch,
        }
    }

    #[test]
    fn idle_depends_on_contacts() {
        let idle = sos(SosStatus::Idle, None);
        assert_eq!(HomeStatus::from_session(&idle, 0).to_string(), "Add emergency contacts");
        assert_eq!(HomeStatus::from_session(&idle, 2).to_string(), "2 contact(s) ready");
    }

    #[test]
    fn active_reports_dispatch_failure() {
        let sent = sos(
            SosStatus::Active,
            Some(DispatchState::Delivered(DeliveryReport { recipients: 1, status: DeliveryStatus::Sent })),
        );
        assert_eq!(HomeStatus::from_session(&sent, 1).to_string(), "Emergency alerts sent!");

        let failed = sos(
            SosStatus::Active,
            Some(DispatchState::Failed { attempt: 1, error: DispatchError::Unavailable("no sms".into()) }),
        );
        assert_eq!(
            HomeStatus::from_session(&failed, 1).to_string(),
            "SMS service is not available on this device."
        );
    }

    #[test]
    fn countdown_and_resolved() {
        assert_eq!(
            HomeStatus::from_session(&sos(SosStatus::Countdown, None), 1),
            HomeStatus::Activating { seconds: 3 }
        );
        assert_eq!(HomeStatus::from_session(&sos(SosStatus::Resolved, None), 1).to_string(), "You are safe now");
    }
}
