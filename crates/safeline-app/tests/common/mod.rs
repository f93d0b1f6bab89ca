//! Recording driver shared by the runtime tests.

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, VecDeque},
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use safeline_app::{App, AppEvent, Driver, FeedbackCue};
use safeline_core::{
    AlertRequest, DeliveryOutcome, Environment, TimerId, TimerMode,
    env::test_utils::{MockEnv, MockInstant},
};

/// One scripted driver turn.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver these events as one batch.
    Events(Vec<AppEvent>),
    /// Fire every armed timer once, then append `extra` to the same batch.
    Fire(Vec<AppEvent>),
    /// Complete every in-flight alert with `outcome`.
    Complete(DeliveryOutcome),
}

/// Everything the runtime asked the driver to do.
#[derive(Debug, Default)]
pub struct Record {
    pub armed: BTreeMap<TimerId, (Duration, TimerMode)>,
    pub in_flight: Vec<AlertRequest>,
    pub sent: Vec<AlertRequest>,
    pub feedback: Vec<FeedbackCue>,
    pub renders: usize,
    pub capturing: bool,
    pub captures: usize,
    pub stopped: bool,
}

/// Scripted driver that records its effects.
pub struct RecordingDriver {
    env: MockEnv,
    steps: VecDeque<Step>,
    record: Arc<Mutex<Record>>,
    refuse_alerts: bool,
    refuse_capture: bool,
}

impl RecordingDriver {
    pub fn new(env: MockEnv, steps: impl IntoIterator<Item = Step>) -> (Self, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        let driver = Self {
            env,
            steps: steps.into_iter().collect(),
            record: Arc::clone(&record),
            refuse_alerts: false,
            refuse_capture: false,
        };
        (driver, record)
    }

    /// Fail every `send_alert` hand-off.
    pub fn refusing_alerts(mut self) -> Self {
        self.refuse_alerts = true;
        self
    }

    /// Fail every `start_capture`, as a device without microphone access.
    pub fn without_microphone(mut self) -> Self {
        self.refuse_capture = true;
        self
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    /// Produce the next batch without going through the async API.
    pub fn next_batch(&mut self) -> Vec<AppEvent> {
        let mut record = self.record.lock().unwrap();
        match self.steps.pop_front() {
            None => vec![AppEvent::Shutdown],
            Some(Step::Events(events)) => events,
            Some(Step::Fire(extra)) => {
                self.env.advance(Duration::from_secs(1));
                let mut batch = Vec::new();
                let mut fired_once = Vec::new();
                for (&id, &(_, mode)) in &record.armed {
                    batch.push(AppEvent::TimerFired(id));
                    if mode == TimerMode::OneShot {
                        fired_once.push(id);
                    }
                }
                for id in fired_once {
                    record.armed.remove(&id);
                }
                batch.extend(extra);
                batch
            },
            Some(Step::Complete(outcome)) => std::mem::take(&mut record.in_flight)
                .into_iter()
                .map(|request| AppEvent::AlertCompleted { purpose: request.purpose, outcome: outcome.clone() })
                .collect(),
        }
    }
}

impl Driver for RecordingDriver {
    type Error = io::Error;
    type Instant = MockInstant;

    fn poll_events(&mut self) -> impl Future<Output = Result<Vec<AppEvent>, io::Error>> + Send {
        std::future::ready(Ok(self.next_batch()))
    }

    fn arm_timer(&mut self, id: TimerId, period: Duration, mode: TimerMode) {
        self.record.lock().unwrap().armed.insert(id, (period, mode));
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.record.lock().unwrap().armed.remove(&id);
    }

    fn send_alert(&mut self, request: AlertRequest) -> Result<(), io::Error> {
        if self.refuse_alerts {
            return Err(io::Error::other("messaging not permitted"));
        }
        let mut record = self.record.lock().unwrap();
        record.sent.push(request.clone());
        record.in_flight.push(request);
        Ok(())
    }

    fn feedback(&mut self, cue: FeedbackCue) {
        self.record.lock().unwrap().feedback.push(cue);
    }

    fn start_capture(&mut self) -> Result<(), io::Error> {
        if self.refuse_capture {
            return Err(io::Error::other("microphone permission denied"));
        }
        self.record.lock().unwrap().capturing = true;
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<Option<String>, io::Error> {
        let mut record = self.record.lock().unwrap();
        if !std::mem::take(&mut record.capturing) {
            return Ok(None);
        }
        record.captures += 1;
        Ok(Some(format!("file:///evidence/{}.m4a", record.captures)))
    }

    fn now(&self) -> MockInstant {
        self.env.now()
    }

    fn render(&mut self, _app: &App) -> Result<(), io::Error> {
        self.record.lock().unwrap().renders += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.record.lock().unwrap().stopped = true;
    }
}
