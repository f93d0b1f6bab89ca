//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific timers, input, messaging, audio capture, and output,
//! while the generic [`crate::Runtime`] handles all orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use safeline_core::{AlertRequest, TimerId, TimerMode};

use crate::{App, AppEvent, FeedbackCue};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the CLI and in simulation.
///
/// # Implementations
///
/// - **CLI**: tokio timers, stdin commands, logging messaging transport
/// - **Simulation**: virtual timer wheel and scripted transport outcomes
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Wait for the next batch of events.
    ///
    /// A batch holds everything that became ready together: user intents,
    /// fired timers, location fixes, and transport results. An empty batch is
    /// allowed and means nothing happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the event source fails.
    fn poll_events(&mut self) -> impl Future<Output = Result<Vec<AppEvent>, Self::Error>> + Send;

    /// Arm a timer. A timer with the same id replaces the previous one.
    ///
    /// When it fires the driver reports [`AppEvent::TimerFired`]; a repeating
    /// timer keeps firing every `period` until cancelled.
    fn arm_timer(&mut self, id: TimerId, period: Duration, mode: TimerMode);

    /// Cancel a timer. Unknown ids are ignored.
    fn cancel_timer(&mut self, id: TimerId);

    /// Start delivering an alert.
    ///
    /// Delivery is asynchronous; the outcome comes back as
    /// [`AppEvent::AlertCompleted`] in a later batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot even be handed off. The runtime
    /// reports that to the owner as a transport failure.
    fn send_alert(&mut self, request: AlertRequest) -> Result<(), Self::Error>;

    /// Produce sensory feedback. Best effort.
    fn feedback(&mut self, cue: FeedbackCue);

    /// Start capturing audio from the microphone.
    ///
    /// # Errors
    ///
    /// Returns an error if capture cannot start (no device, no permission).
    /// The runtime tells the recorder, which goes back to idle.
    fn start_capture(&mut self) -> Result<(), Self::Error>;

    /// Stop capturing and store what was captured.
    ///
    /// Returns where the audio was stored, or `None` if nothing was captured.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture could not be finalized.
    fn stop_capture(&mut self) -> Result<Option<String>, Self::Error>;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop timers and background work and clean up resources.
    fn stop(&mut self);
}
