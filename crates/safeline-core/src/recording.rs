//! Audio evidence recordings.
//!
//! The [`Recorder`] only keeps the clock: it asks the platform to start and
//! stop capturing and counts whole seconds in between. The platform answers a
//! stop with the location of the captured audio, and the session files it in
//! the [`RecordingLog`], newest first.
//!
//! ```text
//!  Idle ─start─> Recording ─stop─> Idle
//!                   │  ^
//!                   └──┘ 1 s tick: elapsed += 1
//! ```

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timer::{TimerCommand, TimerId, TimerMode, TimerOwner, TimerSlot};

/// Identifier of a saved recording: the capture's wall-clock millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordingId(String);

impl RecordingId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a recording saved at `timestamp_ms`.
    pub fn from_timestamp(timestamp_ms: u64) -> Self {
        Self(timestamp_ms.to_string())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of one saved recording. The audio itself lives at `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Identifier.
    pub id: RecordingId,
    /// Where the platform stored the audio.
    pub uri: String,
    /// Length in whole seconds, as counted by the recorder clock.
    pub duration_secs: u32,
    /// Save time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// `mm:ss` rendering of a second count.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Saved recordings, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingLog {
    recordings: Vec<Recording>,
}

impl RecordingLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log from persisted recordings, kept in the order given.
    pub fn from_recordings(recordings: Vec<Recording>) -> Self {
        Self { recordings }
    }

    /// Recordings, newest first.
    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    /// Number of recordings.
    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    /// No recordings saved.
    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    /// Recording by id.
    pub fn get(&self, id: &RecordingId) -> Option<&Recording> {
        self.recordings.iter().find(|r| &r.id == id)
    }

    /// File a capture saved at `timestamp_ms` at the front of the log.
    ///
    /// Two saves in the same millisecond get distinct ids: the later one
    /// takes the next free millisecond.
    pub fn add(&mut self, uri: impl Into<String>, duration_secs: u32, timestamp_ms: u64) -> &Recording {
        let mut stamp = timestamp_ms;
        while self.get(&RecordingId::from_timestamp(stamp)).is_some() {
            stamp += 1;
        }
        self.recordings.insert(
            0,
            Recording { id: RecordingId::from_timestamp(stamp), uri: uri.into(), duration_secs, timestamp_ms },
        );
        &self.recordings[0]
    }

    /// Delete a recording. Returns it if it existed.
    pub fn remove(&mut self, id: &RecordingId) -> Option<Recording> {
        let index = self.recordings.iter().position(|r| &r.id == id)?;
        Some(self.recordings.remove(index))
    }
}

/// Recorder status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecorderStatus {
    /// Not capturing.
    Idle,
    /// Capturing, clock running.
    Recording,
}

impl fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        })
    }
}

/// Read-only snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderState {
    /// Current status.
    pub status: RecorderStatus,
    /// Whole seconds captured so far. Zero while idle.
    pub elapsed_secs: u32,
}

/// Input to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderEvent {
    /// Begin capturing.
    Start,
    /// Finish capturing and keep the result.
    Stop,
    /// A timer armed by this controller fired.
    TimerFired(TimerId),
    /// The platform could not start capturing.
    CaptureFailed,
    /// Session teardown. A running capture is stopped and kept.
    Shutdown,
}

/// Output of the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderAction {
    /// Arm or cancel a timer.
    Timer(TimerCommand),
    /// Status changed.
    StatusChanged {
        /// Previous status.
        from: RecorderStatus,
        /// New status.
        to: RecorderStatus,
    },
    /// Ask the platform to start capturing audio.
    StartCapture,
    /// Ask the platform to stop capturing and save what it has.
    StopCapture {
        /// Length to file the capture under.
        duration_secs: u32,
    },
}

/// Audio recorder clock.
#[derive(Debug)]
pub struct Recorder {
    status: RecorderStatus,
    elapsed_secs: u32,
    tick_interval: Duration,
    timer: TimerSlot,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    /// Idle recorder counting one second per tick.
    pub fn new() -> Self {
        Self {
            status: RecorderStatus::Idle,
            elapsed_secs: 0,
            tick_interval: Duration::from_secs(1),
            timer: TimerSlot::new(TimerOwner::Recorder),
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: RecorderEvent) -> Vec<RecorderAction> {
        match event {
            RecorderEvent::Start => self.start(),
            RecorderEvent::Stop | RecorderEvent::Shutdown => self.stop(),
            RecorderEvent::TimerFired(id) => self.timer_fired(id),
            RecorderEvent::CaptureFailed => self.abandon(),
        }
    }

    /// Read-only snapshot.
    pub fn state(&self) -> RecorderState {
        RecorderState { status: self.status, elapsed_secs: self.elapsed_secs }
    }

    /// Current status.
    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    /// Timer currently armed by this controller.
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.timer.armed()
    }

    fn start(&mut self) -> Vec<RecorderAction> {
        if self.status == RecorderStatus::Recording {
            return vec![];
        }
        self.elapsed_secs = 0;
        let mut actions = self.transition(RecorderStatus::Recording);
        actions.push(RecorderAction::StartCapture);
        actions.extend(
            self.timer.arm(self.tick_interval, TimerMode::Repeating).into_iter().map(RecorderAction::Timer),
        );
        actions
    }

    fn stop(&mut self) -> Vec<RecorderAction> {
        if self.status != RecorderStatus::Recording {
            return vec![];
        }
        let duration_secs = self.elapsed_secs;
        let mut actions: Vec<RecorderAction> = self.timer.cancel().into_iter().map(RecorderAction::Timer).collect();
        actions.push(RecorderAction::StopCapture { duration_secs });
        self.elapsed_secs = 0;
        actions.extend(self.transition(RecorderStatus::Idle));
        actions
    }

    fn abandon(&mut self) -> Vec<RecorderAction> {
        let mut actions: Vec<RecorderAction> = self.timer.cancel().into_iter().map(RecorderAction::Timer).collect();
        self.elapsed_secs = 0;
        actions.extend(self.transition(RecorderStatus::Idle));
        actions
    }

    fn timer_fired(&mut self, id: TimerId) -> Vec<RecorderAction> {
        if !self.timer.accept(id) {
            debug!(timer = %id, status = %self.status, "stale tick ignored");
            return vec![];
        }
        match self.status {
            RecorderStatus::Recording => {
                self.elapsed_secs = self.elapsed_secs.saturating_add(1);
                vec![]
            },
            RecorderStatus::Idle => self.timer.cancel().into_iter().map(RecorderAction::Timer).collect(),
        }
    }

    fn transition(&mut self, to: RecorderStatus) -> Vec<RecorderAction> {
        let from = self.status;
        self.status = to;
        if from == to {
            return vec![];
        }
        debug!(%from, %to, "recorder status changed");
        vec![RecorderAction::StatusChanged { from, to }]
    }
}
