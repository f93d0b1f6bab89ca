//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`safeline_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Each call to [`Driver::poll_events`] jumps the virtual clock to the next
//! thing that can happen (a scripted event, a timer deadline, or an alert
//! completing) and returns everything due at that instant as one batch. A
//! changed location fix is reported first, without moving the clock.

use std::{collections::VecDeque, time::Duration};

use safeline_app::{App, AppEvent, Driver, FeedbackCue, LocationProvider, MessagingTransport};
use safeline_core::{AlertRequest, Coordinates, Environment, TimerId, TimerMode};
use tracing::trace;

use crate::{SimEnv, SimInstant, TimerWheel};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Everything the driver observed, for assertions after a run.
#[derive(Debug, Clone, Default)]
pub struct SimLog {
    /// Alerts handed to the transport, in order.
    pub sent: Vec<AlertRequest>,
    /// Feedback cues with the virtual time they were emitted at.
    pub feedback: Vec<(u64, FeedbackCue)>,
    /// Distinct home status lines, in the order they appeared.
    pub status_lines: Vec<String>,
    /// Finished audio captures as (start, stop) virtual milliseconds.
    pub captures: Vec<(u64, u64)>,
    /// Number of frames rendered.
    pub renders: usize,
    /// Whether `stop` was called.
    pub stopped: bool,
}

/// Simulation driver for deterministic testing.
pub struct SimDriver<T, L> {
    env: SimEnv,
    wheel: TimerWheel,
    script: VecDeque<(u64, AppEvent)>,
    in_flight: Vec<(u64, AlertRequest)>,
    transport: T,
    location: L,
    last_location: Option<Coordinates>,
    alert_latency_ms: u64,
    horizon_ms: u64,
    refuse_alerts: bool,
    refuse_capture: bool,
    capture_started: Option<u64>,
    log: SimLog,
}

impl<T: MessagingTransport, L: LocationProvider> SimDriver<T, L> {
    /// Create a driver on `env` that sends through `transport` and reads
    /// `location`. Runs for at most an hour of virtual time.
    pub fn new(env: SimEnv, transport: T, location: L) -> Self {
        Self {
            env,
            wheel: TimerWheel::new(),
            script: VecDeque::new(),
            in_flight: Vec::new(),
            transport,
            location,
            last_location: None,
            alert_latency_ms: 0,
            horizon_ms: 60 * 60 * 1000,
            refuse_alerts: false,
            refuse_capture: false,
            capture_started: None,
            log: SimLog::default(),
        }
    }

    /// Deliver `event` at virtual time `at`. Events at the same time keep
    /// their order.
    #[must_use]
    pub fn with_event(mut self, at: Duration, event: AppEvent) -> Self {
        let at_ms = duration_ms(at);
        let index = self.script.partition_point(|(t, _)| *t <= at_ms);
        self.script.insert(index, (at_ms, event));
        self
    }

    /// Time between handing an alert to the transport and its completion.
    #[must_use]
    pub fn with_alert_latency(mut self, latency: Duration) -> Self {
        self.alert_latency_ms = duration_ms(latency);
        self
    }

    /// Shut down once nothing is due before `horizon`.
    #[must_use]
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon_ms = duration_ms(horizon);
        self
    }

    /// Refuse every alert hand-off, as a platform without messaging would.
    #[must_use]
    pub fn refusing_alerts(mut self) -> Self {
        self.refuse_alerts = true;
        self
    }

    /// Refuse to start audio capture, as a device without microphone access
    /// would.
    #[must_use]
    pub fn without_microphone(mut self) -> Self {
        self.refuse_capture = true;
        self
    }

    /// A capture is running.
    pub fn is_capturing(&self) -> bool {
        self.capture_started.is_some()
    }

    /// Simulated environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Observations so far.
    pub fn log(&self) -> &SimLog {
        &self.log
    }

    /// Timers currently armed on the wheel.
    pub fn armed_timers(&self) -> Vec<TimerId> {
        self.wheel.armed()
    }

    /// Total timer ticks delivered.
    pub fn timers_fired(&self) -> u64 {
        self.wheel.fired()
    }

    /// Messaging transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn next_wake(&self) -> Option<u64> {
        let script = self.script.front().map(|(at, _)| *at);
        let alerts = self.in_flight.iter().map(|(due, _)| *due).min();
        [script, self.wheel.next_deadline(), alerts].into_iter().flatten().min()
    }
}

impl<T: MessagingTransport, L: LocationProvider> Driver for SimDriver<T, L> {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_events(&mut self) -> Result<Vec<AppEvent>, Self::Error> {
        // A new fix is reported on its own, before time moves.
        if let Some(fix) = self.location.current_coordinates().await
            && self.last_location != Some(fix)
        {
            self.last_location = Some(fix);
            return Ok(vec![AppEvent::LocationUpdated(fix)]);
        }

        let Some(wake) = self.next_wake() else {
            return Ok(vec![AppEvent::Shutdown]);
        };
        if wake > self.horizon_ms {
            self.env.advance_to(SimEnv::instant_at(Duration::from_millis(self.horizon_ms)));
            return Ok(vec![AppEvent::Shutdown]);
        }

        self.env.advance_to(SimEnv::instant_at(Duration::from_millis(wake)));
        let now = self.env.now().as_millis();
        trace!(now_ms = now, "simulation step");

        let mut batch: Vec<AppEvent> =
            self.wheel.pop_due(now).into_iter().map(AppEvent::TimerFired).collect();

        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.in_flight).into_iter().partition(|(at, _)| *at <= now);
        self.in_flight = pending;
        for (_, request) in due {
            let outcome = self.transport.send_alert(&request.recipients, &request.message).await;
            batch.push(AppEvent::AlertCompleted { purpose: request.purpose, outcome });
        }

        while let Some((at, _)) = self.script.front()
            && *at <= now
        {
            if let Some((_, event)) = self.script.pop_front() {
                batch.push(event);
            }
        }

        Ok(batch)
    }

    fn arm_timer(&mut self, id: TimerId, period: Duration, mode: TimerMode) {
        let now = self.env.now().as_millis();
        self.wheel.arm(id, now, period, mode);
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.wheel.cancel(id);
    }

    fn send_alert(&mut self, request: AlertRequest) -> Result<(), Self::Error> {
        if self.refuse_alerts {
            return Err(SimDriverError("messaging is not available".to_string()));
        }
        let due = self.env.now().as_millis() + self.alert_latency_ms;
        self.log.sent.push(request.clone());
        self.in_flight.push((due, request));
        Ok(())
    }

    fn feedback(&mut self, cue: FeedbackCue) {
        self.log.feedback.push((self.env.now().as_millis(), cue));
    }

    fn start_capture(&mut self) -> Result<(), Self::Error> {
        if self.refuse_capture {
            return Err(SimDriverError("microphone permission denied".to_string()));
        }
        self.capture_started = Some(self.env.now().as_millis());
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<Option<String>, Self::Error> {
        let Some(started) = self.capture_started.take() else {
            return Ok(None);
        };
        self.log.captures.push((started, self.env.now().as_millis()));
        Ok(Some(format!("sim://capture/{}", self.log.captures.len())))
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.log.renders += 1;
        let line = app.home_status().to_string();
        if self.log.status_lines.last() != Some(&line) {
            self.log.status_lines.push(line);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.log.stopped = true;
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
