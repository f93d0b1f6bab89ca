//! Terminal driver for the interactive session.
//!
//! Implements the [`Driver`] trait with tokio: commands arrive as lines on
//! stdin, timers are spawned tasks, and alerts are handed to the messaging
//! transport on a background task. Every result is funnelled back through one
//! channel and drained into the next batch.
//!
//! There is no microphone here: a capture only marks the span on screen and
//! hands back a numbered placeholder uri so the recordings log can be used.

use std::{collections::HashMap, io::Write, sync::Arc, time::Duration};

use safeline_app::{App, AppEvent, Driver, FeedbackCue, LocationProvider, MessagingTransport};
use safeline_core::{AlertRequest, Coordinates, TimerId, TimerMode};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{CliError, Command, HELP, parse_line, render::frame};

/// How often the location provider is asked for a new fix while idle.
const LOCATION_POLL: Duration = Duration::from_millis(500);

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver<T, L, W> {
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    lines: UnboundedReceiver<String>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    transport: Arc<T>,
    location: L,
    last_location: Option<Coordinates>,
    out: W,
    last_frame: Option<String>,
    capturing: bool,
    captures: u32,
}

impl<T, L, W> TerminalDriver<T, L, W>
where
    T: MessagingTransport,
    L: LocationProvider,
    W: Write + Send,
{
    /// Driver reading commands from stdin.
    ///
    /// Must be called inside a tokio runtime. Closing stdin ends the session.
    pub fn new(transport: T, location: L, out: W) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    },
                }
            }
        });
        Self::from_lines(rx, transport, location, out)
    }

    /// Driver reading commands from a channel. The session ends when every
    /// sender is dropped.
    pub fn from_lines(lines: UnboundedReceiver<String>, transport: T, location: L, out: W) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx,
            lines,
            timers: HashMap::new(),
            transport: Arc::new(transport),
            location,
            last_location: None,
            out,
            last_frame: None,
            capturing: false,
            captures: 0,
        }
    }

    /// Timers with a live task.
    pub fn armed_timers(&self) -> usize {
        self.timers.values().filter(|task| !task.is_finished()).count()
    }

    fn read_line(&mut self, line: &str) -> Result<Vec<AppEvent>, CliError> {
        match parse_line(line) {
            Ok(Some(Command::Intent(intent))) => Ok(vec![AppEvent::Intent(intent)]),
            Ok(Some(Command::Help)) => {
                writeln!(self.out, "{HELP}")?;
                Ok(Vec::new())
            },
            Ok(None) => Ok(Vec::new()),
            Err(e) => Ok(vec![AppEvent::Error { message: e.to_string() }]),
        }
    }
}

impl<T, L, W> Driver for TerminalDriver<T, L, W>
where
    T: MessagingTransport,
    L: LocationProvider,
    W: Write + Send,
{
    type Error = CliError;
    type Instant = std::time::Instant;

    async fn poll_events(&mut self) -> Result<Vec<AppEvent>, Self::Error> {
        let mut batch = tokio::select! {
            biased;

            Some(event) = self.events_rx.recv() => vec![event],

            line = self.lines.recv() => match line {
                Some(line) => self.read_line(&line)?,
                None => vec![AppEvent::Shutdown],
            },

            () = tokio::time::sleep(LOCATION_POLL) => Vec::new(),
        };

        while let Ok(event) = self.events_rx.try_recv() {
            batch.push(event);
        }

        // Rides along with the batch; the runtime applies it before intents.
        if let Some(fix) = self.location.current_coordinates().await
            && self.last_location != Some(fix)
        {
            self.last_location = Some(fix);
            batch.push(AppEvent::LocationUpdated(fix));
        }
        Ok(batch)
    }

    fn arm_timer(&mut self, id: TimerId, period: Duration, mode: TimerMode) {
        self.cancel_timer(id);
        self.timers.retain(|_, task| !task.is_finished());

        let tx = self.events_tx.clone();
        let period = period.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            match mode {
                TimerMode::OneShot => {
                    tokio::time::sleep(period).await;
                    let _ = tx.send(AppEvent::TimerFired(id));
                },
                TimerMode::Repeating => {
                    let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                    loop {
                        ticks.tick().await;
                        if tx.send(AppEvent::TimerFired(id)).is_err() {
                            break;
                        }
                    }
                },
            }
        });
        self.timers.insert(id, task);
    }

    fn cancel_timer(&mut self, id: TimerId) {
        if let Some(task) = self.timers.remove(&id) {
            task.abort();
        }
    }

    fn send_alert(&mut self, request: AlertRequest) -> Result<(), Self::Error> {
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        debug!(purpose = ?request.purpose, recipients = request.recipients.len(), "handing alert to transport");

        tokio::spawn(async move {
            let outcome = transport.send_alert(&request.recipients, &request.message).await;
            let _ = tx.send(AppEvent::AlertCompleted { purpose: request.purpose, outcome });
        });
        Ok(())
    }

    fn start_capture(&mut self) -> Result<(), Self::Error> {
        if !self.capturing {
            self.capturing = true;
            writeln!(self.out, "[recording on]")?;
        }
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<Option<String>, Self::Error> {
        if !std::mem::take(&mut self.capturing) {
            return Ok(None);
        }
        self.captures += 1;
        writeln!(self.out, "[recording off]")?;
        Ok(Some(format!("terminal://capture/{}", self.captures)))
    }

    fn feedback(&mut self, cue: FeedbackCue) {
        let text = match cue {
            FeedbackCue::Haptic => "[vibrate]",
            FeedbackCue::Ringtone { on: true } => "[ringtone on]",
            FeedbackCue::Ringtone { on: false } => "[ringtone off]",
            FeedbackCue::Siren { on: true } => "[siren on]",
            FeedbackCue::Siren { on: false } => "[siren off]",
        };
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!(error = %e, ?cue, "feedback not shown");
        }
    }

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let frame = frame(app);
        if self.last_frame.as_ref() != Some(&frame) {
            writeln!(self.out, "{frame}")?;
            self.out.flush()?;
            self.last_frame = Some(frame);
        }
        Ok(())
    }

    fn stop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}

impl<T, L, W> Drop for TerminalDriver<T, L, W> {
    fn drop(&mut self) {
        for task in self.timers.values() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use safeline_app::Intent;
    use safeline_core::{TimerCommand, TimerOwner, TimerSlot};

    use super::*;
    use crate::{FixedLocation, LogTransport};

    type TestDriver = TerminalDriver<LogTransport, FixedLocation, Vec<u8>>;

    fn driver() -> (UnboundedSender<String>, TestDriver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, TerminalDriver::from_lines(rx, LogTransport::new(), FixedLocation::default(), Vec::new()))
    }

    fn timer_id() -> TimerId {
        match TimerSlot::new(TimerOwner::FakeCall).arm(Duration::from_millis(5), TimerMode::OneShot)[..] {
            [TimerCommand::Arm { id, .. }] => id,
            _ => panic!("expected one arm command"),
        }
    }

    #[tokio::test]
    async fn lines_become_intents() {
        let (tx, mut driver) = driver();
        tx.send("sos".to_string()).unwrap();

        let batch = driver.poll_events().await.unwrap();

        assert_eq!(batch, vec![AppEvent::Intent(Intent::TriggerSos)]);
    }

    #[tokio::test]
    async fn bad_lines_become_errors() {
        let (tx, mut driver) = driver();
        tx.send("dance".to_string()).unwrap();

        let batch = driver.poll_events().await.unwrap();

        assert!(matches!(batch.as_slice(), [AppEvent::Error { message }] if message.contains("dance")));
    }

    #[tokio::test]
    async fn closed_input_shuts_down() {
        let (tx, mut driver) = driver();
        drop(tx);

        assert_eq!(driver.poll_events().await.unwrap(), vec![AppEvent::Shutdown]);
    }

    #[tokio::test]
    async fn one_shot_timer_fires_once() {
        let (_tx, mut driver) = driver();
        let id = timer_id();
        driver.arm_timer(id, Duration::from_millis(5), TimerMode::OneShot);

        let batch = driver.poll_events().await.unwrap();

        assert_eq!(batch, vec![AppEvent::TimerFired(id)]);
    }

    #[tokio::test]
    async fn cancelled_timer_stays_silent() {
        let (_tx, mut driver) = driver();
        let id = timer_id();
        driver.arm_timer(id, Duration::from_millis(5), TimerMode::Repeating);
        driver.cancel_timer(id);

        let batch = driver.poll_events().await.unwrap();

        assert!(batch.is_empty());
        assert_eq!(driver.armed_timers(), 0);
    }

    /// Reports a slightly different fix on every call, like a walking user.
    #[derive(Default)]
    struct MovingLocation(std::sync::atomic::AtomicU32);

    impl LocationProvider for MovingLocation {
        fn current_coordinates(&self) -> impl Future<Output = Option<Coordinates>> + Send {
            let step = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            std::future::ready(Coordinates::new(10.0 + f64::from(step) * 1e-6, 20.0).ok())
        }
    }

    #[tokio::test]
    async fn moving_location_does_not_starve_timers_or_input() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut driver = TerminalDriver::from_lines(rx, LogTransport::new(), MovingLocation::default(), Vec::new());
        let id = timer_id();
        driver.arm_timer(id, Duration::from_millis(1), TimerMode::Repeating);
        tx.send("cancel".to_string()).unwrap();

        let (mut ticks, mut intents, mut fixes) = (0, 0, 0);
        for _ in 0..20 {
            for event in driver.poll_events().await.unwrap() {
                match event {
                    AppEvent::TimerFired(_) => ticks += 1,
                    AppEvent::Intent(_) => intents += 1,
                    AppEvent::LocationUpdated(_) => fixes += 1,
                    _ => {},
                }
            }
        }

        assert!(ticks > 0);
        assert_eq!(intents, 1);
        assert_eq!(fixes, 20);
    }

    #[tokio::test]
    async fn fix_joins_the_batch_it_arrives_with() {
        let (tx, rx) = mpsc::unbounded_channel();
        let fix = Coordinates::new(51.5, -0.12).unwrap();
        let mut driver = TerminalDriver::from_lines(rx, LogTransport::new(), FixedLocation::new(Some(fix)), Vec::new());
        tx.send("sos".to_string()).unwrap();

        let first = driver.poll_events().await.unwrap();
        tx.send("cancel".to_string()).unwrap();
        let second = driver.poll_events().await.unwrap();

        assert_eq!(first, vec![AppEvent::Intent(Intent::TriggerSos), AppEvent::LocationUpdated(fix)]);
        assert_eq!(second, vec![AppEvent::Intent(Intent::CancelSos)]);
    }

    #[test]
    fn captures_get_numbered_uris() {
        let (_tx, mut driver) = driver();
        assert_eq!(driver.stop_capture().unwrap(), None);

        driver.start_capture().unwrap();
        driver.start_capture().unwrap();
        let first = driver.stop_capture().unwrap();
        driver.start_capture().unwrap();
        let second = driver.stop_capture().unwrap();

        assert_eq!(first.as_deref(), Some("terminal://capture/1"));
        assert_eq!(second.as_deref(), Some("terminal://capture/2"));
        assert_eq!(
            String::from_utf8(driver.out.clone()).unwrap(),
            "[recording on]\n[recording off]\n[recording on]\n[recording off]\n"
        );
    }

    #[test]
    fn feedback_is_written() {
        let (_tx, mut driver) = driver();
        driver.feedback(FeedbackCue::Siren { on: true });
        driver.feedback(FeedbackCue::Haptic);

        assert_eq!(String::from_utf8(driver.out.clone()).unwrap(), "[siren on]\n[vibrate]\n");
    }
}
