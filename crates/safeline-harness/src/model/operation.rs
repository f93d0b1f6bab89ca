//! Operations for model-based testing.
//!
//! Operations are generated by proptest or the fuzzer and applied to both the
//! model and the real implementation.

use std::time::Duration;

use arbitrary::Arbitrary;
use safeline_app::SessionConfig;
use safeline_core::{CheckInConfig, SosConfig};

/// Operations that can be applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// User presses SOS.
    TriggerSos,
    /// User cancels the countdown.
    CancelSos,
    /// User confirms they are safe.
    ResolveSos,
    /// User retries a failed alert.
    RetryAlert,
    /// The SOS timer fires once, if armed.
    TickSos,
    /// User starts the check-in timer.
    StartCheckIn,
    /// User pauses the check-in timer.
    PauseCheckIn,
    /// User resumes the check-in timer.
    ResumeCheckIn,
    /// User answers "I'm safe".
    DismissCheckIn,
    /// User asks for help from the expiry prompt.
    EscalateCheckIn,
    /// User resets the check-in timer.
    ResetCheckIn,
    /// The check-in timer fires up to `ticks` times, stopping once disarmed.
    TickCheckIn {
        /// Upper bound on ticks delivered.
        ticks: u8,
    },
    /// A contact is added.
    AddContact,
    /// The first contact is removed.
    RemoveContact,
    /// The oldest alert waiting on the transport completes.
    CompleteAlert {
        /// Delivered, or failed.
        delivered: bool,
    },
}

/// Session parameters shared by the model and the real implementation.
///
/// Small enough for short operation sequences to reach every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSession {
    /// SOS grace period in ticks.
    pub countdown_secs: u32,
    /// Alert attempts per escalation.
    pub max_dispatch_attempts: u32,
    /// Check-in duration in minutes.
    pub checkin_minutes: u32,
}

impl Default for ModelSession {
    fn default() -> Self {
        Self { countdown_secs: 3, max_dispatch_attempts: 3, checkin_minutes: 1 }
    }
}

impl ModelSession {
    /// Real configuration matching these parameters.
    ///
    /// The check-in response window is one tick long, so an expiry followed by
    /// one more tick escalates.
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            sos: SosConfig {
                countdown_secs: self.countdown_secs,
                max_dispatch_attempts: self.max_dispatch_attempts,
                ..SosConfig::default()
            },
            checkin: CheckInConfig {
                duration_minutes: self.checkin_minutes,
                response_window: Some(Duration::from_secs(1)),
                ..CheckInConfig::default()
            },
            ..SessionConfig::default()
        }
    }
}
