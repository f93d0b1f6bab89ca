//! Session configuration.

use safeline_core::{CheckInConfig, FakeCallConfig, SosConfig};

/// Configuration of every controller in one session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// SOS lifecycle.
    pub sos: SosConfig,
    /// Check-in timer.
    pub checkin: CheckInConfig,
    /// Fake call.
    pub fake_call: FakeCallConfig,
}
