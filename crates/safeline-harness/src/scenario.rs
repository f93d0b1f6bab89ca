//! Scenario builder for end-to-end simulation.
//!
//! A [`Scenario`] describes a session: configuration, contacts on file, what
//! the user does and when, how the network behaves. [`Scenario::run`] drives
//! the production [`Runtime`] over a [`SimDriver`], checks every registered
//! invariant after each batch, and returns the final [`World`] for
//! assertions.
//!
//! ```ignore
//! let world = Scenario::new()
//!     .with_contact("Ana", "555-0101")
//!     .at(Duration::ZERO, Intent::TriggerSos)
//!     .run()
//!     .await?;
//! assert_eq!(world.log.sent.len(), 1);
//! ```

use std::time::Duration;

use safeline_app::{App, AppEvent, Driver, Intent, Runtime, SessionConfig};
use safeline_core::{
    AlertPurpose, ContactBook, ContactId, Coordinates, EmergencyContact, Environment, NewContact,
    Recording, SafetyCard, TimerId,
};
use safeline_store::{ChaoticStorage, MemoryStorage, Storage};
use serde::Serialize;
use tracing::debug;

use crate::{
    InvariantRegistry, ScriptedTransport, SessionSnapshot, SimDriver, SimDriverError, SimEnv,
    SimLocation, SimLog, Violation,
};

/// Final check run against the [`World`] after shutdown.
pub type Oracle = Box<dyn Fn(&World) -> Result<(), String>>;

/// Why a scenario did not complete.
#[derive(Debug)]
pub enum ScenarioError {
    /// The scenario itself is malformed.
    Setup(String),
    /// The driver failed.
    Driver(SimDriverError),
    /// An invariant broke after the batch processed at `at`.
    Invariant {
        /// Virtual time of the batch.
        at: Duration,
        /// Everything that broke.
        violations: Vec<Violation>,
    },
    /// The oracle rejected the final world.
    Oracle(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup(message) => write!(f, "scenario setup: {message}"),
            Self::Driver(e) => write!(f, "{e}"),
            Self::Invariant { at, violations } => {
                let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
                write!(f, "invariant violation at {at:?}: {}", messages.join("; "))
            },
            Self::Oracle(message) => write!(f, "oracle: {message}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<SimDriverError> for ScenarioError {
    fn from(e: SimDriverError) -> Self {
        Self::Driver(e)
    }
}

/// State after a scenario ran to completion.
#[derive(Debug, Clone)]
pub struct World {
    /// Final view state.
    pub app: App,
    /// What the driver observed.
    pub log: SimLog,
    /// What the transport was asked to deliver, in completion order.
    pub deliveries: Vec<(Vec<String>, String)>,
    /// Platform timers still armed after shutdown.
    pub leaked_timers: Vec<TimerId>,
    /// Contacts in storage after shutdown.
    pub stored_contacts: Vec<EmergencyContact>,
    /// Card in storage after shutdown.
    pub stored_card: SafetyCard,
    /// Recording log in storage after shutdown, newest first.
    pub stored_recordings: Vec<Recording>,
    /// SOS escalations during the session.
    pub escalations: u64,
    /// Check-in expirations during the session.
    pub expirations: u64,
    /// Virtual time at shutdown.
    pub elapsed: Duration,
    /// Timer ticks delivered.
    pub timers_fired: u64,
}

/// Stable, serializable digest of a [`World`] for snapshot tests.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    /// Distinct home status lines in order.
    pub status_lines: Vec<String>,
    /// One entry per alert handed to the transport.
    pub alerts: Vec<AlertSummary>,
    /// SOS escalations.
    pub escalations: u64,
    /// Contacts in storage.
    pub stored_contacts: usize,
    /// Virtual seconds elapsed.
    pub elapsed_secs: u64,
}

/// One alert in a [`WorldSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    /// `sos #n` or `location`.
    pub purpose: String,
    /// Phone numbers in notification order.
    pub recipients: Vec<String>,
    /// Message body.
    pub message: String,
}

impl World {
    /// Digest for snapshot tests.
    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            status_lines: self.log.status_lines.clone(),
            alerts: self
                .log
                .sent
                .iter()
                .map(|request| AlertSummary {
                    purpose: match request.purpose {
                        AlertPurpose::Sos { escalation } => format!("sos {escalation}"),
                        AlertPurpose::LocationShare => "location".to_string(),
                    },
                    recipients: request.recipients.clone(),
                    message: request.message.clone(),
                })
                .collect(),
            escalations: self.escalations,
            stored_contacts: self.stored_contacts.len(),
            elapsed_secs: self.elapsed.as_secs(),
        }
    }
}

/// End-to-end session description.
pub struct Scenario {
    seed: u64,
    config: SessionConfig,
    contacts: Vec<NewContact>,
    card: SafetyCard,
    location: Option<Coordinates>,
    script: Vec<(Duration, AppEvent)>,
    transport: ScriptedTransport,
    alert_latency: Duration,
    refuse_alerts: bool,
    refuse_capture: bool,
    storage_failure_rate: f64,
    horizon: Duration,
    invariants: InvariantRegistry,
    oracle: Option<Oracle>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Empty session with default configuration, standard invariants, and a
    /// transport that delivers everything.
    pub fn new() -> Self {
        Self {
            seed: 0,
            config: SessionConfig::default(),
            contacts: Vec::new(),
            card: SafetyCard::default(),
            location: None,
            script: Vec::new(),
            transport: ScriptedTransport::delivering(),
            alert_latency: Duration::from_millis(200),
            refuse_alerts: false,
            refuse_capture: false,
            storage_failure_rate: 0.0,
            horizon: Duration::from_secs(60 * 60),
            invariants: InvariantRegistry::standard(),
            oracle: None,
        }
    }

    /// Seed for the simulated RNG and storage chaos.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Session configuration.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Contact already on file when the session starts.
    #[must_use]
    pub fn with_contact(mut self, name: &str, phone: &str) -> Self {
        self.contacts.push(NewContact::new(name, phone));
        self
    }

    /// Safety card already on file.
    #[must_use]
    pub fn with_card(mut self, card: SafetyCard) -> Self {
        self.card = card;
        self
    }

    /// Location reported by the device from the start.
    #[must_use]
    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    /// User does `intent` at virtual time `at`.
    #[must_use]
    pub fn at(self, at: Duration, intent: Intent) -> Self {
        self.event_at(at, AppEvent::Intent(intent))
    }

    /// Driver delivers `event` at virtual time `at`.
    #[must_use]
    pub fn event_at(mut self, at: Duration, event: AppEvent) -> Self {
        self.script.push((at, event));
        self
    }

    /// Messaging transport.
    #[must_use]
    pub fn with_transport(mut self, transport: ScriptedTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Time the transport takes to answer.
    #[must_use]
    pub fn with_alert_latency(mut self, latency: Duration) -> Self {
        self.alert_latency = latency;
        self
    }

    /// The platform refuses every alert hand-off.
    #[must_use]
    pub fn refusing_alerts(mut self) -> Self {
        self.refuse_alerts = true;
        self
    }

    /// The platform refuses to start audio capture.
    #[must_use]
    pub fn without_microphone(mut self) -> Self {
        self.refuse_capture = true;
        self
    }

    /// Fraction of storage operations that fail.
    #[must_use]
    pub fn with_storage_failure_rate(mut self, rate: f64) -> Self {
        self.storage_failure_rate = rate;
        self
    }

    /// Shut the session down at this virtual time at the latest.
    #[must_use]
    pub fn run_for(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    /// Replace the invariant registry.
    #[must_use]
    pub fn with_invariants(mut self, invariants: InvariantRegistry) -> Self {
        self.invariants = invariants;
        self
    }

    /// Final check against the world.
    #[must_use]
    pub fn oracle(mut self, oracle: Oracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Run the session to completion.
    ///
    /// # Errors
    ///
    /// Fails on malformed setup, a driver error, an invariant violation after
    /// any batch or after shutdown, or an oracle rejection.
    pub async fn run(self) -> Result<World, ScenarioError> {
        let env = SimEnv::with_seed(self.seed);

        let memory = MemoryStorage::new();
        let mut book = ContactBook::new();
        for contact in self.contacts {
            book.add(ContactId::from_random(env.random_u64()), contact)
                .map_err(|e| ScenarioError::Setup(e.to_string()))?;
        }
        memory.store_contacts(book.contacts()).map_err(|e| ScenarioError::Setup(e.to_string()))?;
        memory.store_card(&self.card).map_err(|e| ScenarioError::Setup(e.to_string()))?;
        if !(0.0..=1.0).contains(&self.storage_failure_rate) {
            return Err(ScenarioError::Setup(format!(
                "storage failure rate {} outside 0..=1",
                self.storage_failure_rate
            )));
        }
        let storage = ChaoticStorage::with_seed(memory.clone(), self.storage_failure_rate, self.seed);

        let mut driver = SimDriver::new(env.clone(), self.transport.clone(), SimLocation::new(self.location))
            .with_alert_latency(self.alert_latency)
            .with_horizon(self.horizon);
        if self.refuse_alerts {
            driver = driver.refusing_alerts();
        }
        if self.refuse_capture {
            driver = driver.without_microphone();
        }
        for (at, event) in self.script {
            driver = driver.with_event(at, event);
        }

        let mut runtime = Runtime::new(driver, env.clone(), storage, self.config);
        runtime.start()?;
        check(&self.invariants, &runtime, env.elapsed())?;

        loop {
            let batch = runtime.driver_mut().poll_events().await?;
            debug!(events = batch.len(), at = ?env.elapsed(), "scenario batch");
            let quit = runtime.process_events(batch)?;
            check(&self.invariants, &runtime, env.elapsed())?;
            if quit {
                break;
            }
        }

        runtime.shutdown()?;
        check(&self.invariants, &runtime, env.elapsed())?;

        let world = World {
            app: runtime.app().clone(),
            log: runtime.driver().log().clone(),
            deliveries: self.transport.deliveries(),
            leaked_timers: runtime.driver().armed_timers(),
            stored_contacts: memory.load_contacts().map_err(|e| ScenarioError::Setup(e.to_string()))?,
            stored_card: memory.load_card().map_err(|e| ScenarioError::Setup(e.to_string()))?,
            stored_recordings: memory.load_recordings().map_err(|e| ScenarioError::Setup(e.to_string()))?,
            escalations: runtime.bridge().sos().escalations(),
            expirations: runtime.bridge().checkin().expirations(),
            elapsed: env.elapsed(),
            timers_fired: runtime.driver().timers_fired(),
        };

        if let Some(oracle) = &self.oracle {
            oracle(&world).map_err(ScenarioError::Oracle)?;
        }
        Ok(world)
    }
}

type SimRuntime = Runtime<SimDriver<ScriptedTransport, SimLocation>, SimEnv, ChaoticStorage<MemoryStorage>>;

fn check(invariants: &InvariantRegistry, runtime: &SimRuntime, at: Duration) -> Result<(), ScenarioError> {
    let driver = runtime.driver();
    let snapshot =
        SessionSnapshot::capture(runtime.app(), runtime.bridge(), driver.armed_timers(), &driver.log().sent);
    invariants.check_all(&snapshot).map_err(|violations| ScenarioError::Invariant { at, violations })
}
