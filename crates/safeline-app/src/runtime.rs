//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: view state machine
//! - [`Bridge`]: safety controllers and session data
//! - [`Driver`]: Platform-specific I/O
//! - [`Storage`]: contacts, safety card, and recording persistence

use safeline_core::{DispatchError, Environment, TimerCommand};
use safeline_store::Storage;
use tracing::{debug, info, warn};

use crate::{App, AppAction, AppEvent, Bridge, Driver, Effect, SessionConfig};

/// Generic runtime that orchestrates App, Bridge, Driver, and Storage.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for clocks and randomness
/// - `S`: Persistence backend
pub struct Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: Storage,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
    storage: S,
}

impl<D, E, S> Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: Storage,
{
    /// Create a new runtime with the given driver, environment, and storage.
    pub fn new(driver: D, env: E, storage: S, config: SessionConfig) -> Self {
        let bridge = Bridge::new(env, config);
        let app = App::new(bridge.sos().state(), bridge.checkin().state(), bridge.fake_call().state());
        Self { driver, app, bridge, storage }
    }

    /// Run the main event loop until the user quits or the driver shuts down.
    ///
    /// This is the core orchestration loop that:
    /// 1. Restores contacts, the safety card, and recordings from storage
    /// 2. Polls the driver for event batches
    /// 3. Processes actions and events between App and Bridge
    /// 4. Executes the bridge's effects through the driver and storage
    /// 5. Tears every controller down on exit
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let started = self.driver.now();
        self.start()?;

        loop {
            let events = self.driver.poll_events().await?;
            if self.process_events(events)? {
                break;
            }
        }

        self.shutdown()?;
        info!(elapsed = ?(self.driver.now() - started), "session ended");
        Ok(())
    }

    /// Restore persisted data and draw the first frame.
    ///
    /// A storage failure is not fatal: the session starts with no contacts, a
    /// blank card, or no recordings, and the user is told.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn start(&mut self) -> Result<(), D::Error> {
        let mut degraded = false;
        let contacts = self.storage.load_contacts().unwrap_or_else(|e| {
            warn!(error = %e, "could not load contacts, starting with none");
            degraded = true;
            Vec::new()
        });
        let card = self.storage.load_card().unwrap_or_else(|e| {
            warn!(error = %e, "could not load safety card, starting blank");
            degraded = true;
            Default::default()
        });

        let recordings = self.storage.load_recordings().unwrap_or_else(|e| {
            warn!(error = %e, "could not load recordings, starting with none");
            degraded = true;
            Vec::new()
        });

        for event in self.bridge.restore(contacts, card, recordings) {
            let _ = self.app.handle(event);
        }
        if degraded {
            self.app.set_status("Saved data could not be loaded");
        }

        self.driver.render(&self.app)
    }

    /// Process one batch of driver events.
    ///
    /// The batch is ordered by [`AppEvent::priority`]: outside reports first,
    /// then user intents, then timer ticks.
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub fn process_events(&mut self, mut events: Vec<AppEvent>) -> Result<bool, D::Error> {
        events.sort_by_key(AppEvent::priority);

        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Shut every controller down and stop the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the final render fails.
    pub fn shutdown(&mut self) -> Result<(), D::Error> {
        let mut events = self.bridge.shutdown();
        events.extend(self.execute_effects());

        let actions: Vec<AppAction> = events.into_iter().flat_map(|event| self.app.handle(event)).collect();
        let result = self.process_actions(actions);

        self.driver.stop();
        result.map(|_| ())
    }

    /// Current view state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Controllers and session data.
    pub fn bridge(&self) -> &Bridge<E> {
        &self.bridge
    }

    /// Driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable driver access, for drivers that are stepped from outside.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),

                    // Everything else goes through the bridge
                    AppAction::Sos(_)
                    | AppAction::CheckIn(_)
                    | AppAction::FakeCall(_)
                    | AppAction::Recorder(_)
                    | AppAction::SaveRecording { .. }
                    | AppAction::DeleteRecording(_)
                    | AppAction::AddContact(_)
                    | AppAction::UpdateContact { .. }
                    | AppAction::RemoveContact(_)
                    | AppAction::TogglePrimary(_)
                    | AppAction::SaveCard(_)
                    | AppAction::RecordLocation(_)
                    | AppAction::ToggleLocationSharing
                    | AppAction::ToggleAlarm
                    | AppAction::AlertCompleted { .. } => {
                        let mut events = self.bridge.process_app_action(action);
                        events.extend(self.execute_effects());
                        for event in events {
                            let new_actions = self.app.handle(event);
                            pending_actions.extend(new_actions);
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Execute pending bridge effects.
    ///
    /// Failures become events for the App; none of them end the session.
    fn execute_effects(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for effect in self.bridge.take_effects() {
            match effect {
                Effect::Timer(TimerCommand::Arm { id, period, mode }) => {
                    debug!(timer = %id, ?period, ?mode, "arming timer");
                    self.driver.arm_timer(id, period, mode);
                },
                Effect::Timer(TimerCommand::Cancel { id }) => {
                    debug!(timer = %id, "cancelling timer");
                    self.driver.cancel_timer(id);
                },
                Effect::SendAlert(request) => {
                    let purpose = request.purpose;
                    if let Err(e) = self.driver.send_alert(request) {
                        warn!(error = %e, ?purpose, "alert hand-off failed");
                        events.push(AppEvent::AlertCompleted {
                            purpose,
                            outcome: Err(DispatchError::Unavailable(e.to_string())),
                        });
                    }
                },
                Effect::PersistContacts(contacts) => {
                    if let Err(e) = self.storage.store_contacts(&contacts) {
                        warn!(error = %e, "failed to persist contacts");
                        events.push(AppEvent::Error { message: format!("Could not save contacts: {e}") });
                    }
                },
                Effect::PersistCard(card) => {
                    if let Err(e) = self.storage.store_card(&card) {
                        warn!(error = %e, "failed to persist safety card");
                        events.push(AppEvent::Error { message: format!("Could not save safety card: {e}") });
                    }
                },
                Effect::PersistRecordings(recordings) => {
                    if let Err(e) = self.storage.store_recordings(&recordings) {
                        warn!(error = %e, "failed to persist recordings");
                        events.push(AppEvent::Error { message: format!("Could not save recordings: {e}") });
                    }
                },
                Effect::StartCapture => {
                    if let Err(e) = self.driver.start_capture() {
                        warn!(error = %e, "audio capture did not start");
                        events.push(AppEvent::CaptureFailed { message: e.to_string() });
                    }
                },
                Effect::StopCapture { duration_secs } => match self.driver.stop_capture() {
                    Ok(Some(uri)) => events.push(AppEvent::RecordingCaptured { uri, duration_secs }),
                    Ok(None) => debug!("capture stopped with nothing to save"),
                    Err(e) => {
                        warn!(error = %e, "audio capture could not be finalized");
                        events.push(AppEvent::Error { message: format!("Could not save recording: {e}") });
                    },
                },
                Effect::Feedback(cue) => self.driver.feedback(cue),
            }
        }

        events
    }
}
