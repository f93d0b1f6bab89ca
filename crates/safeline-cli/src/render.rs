//! Text frame for the interactive session.

use std::fmt::Write;

use safeline_app::App;
use safeline_core::{
    DeliveryStatus, DispatchState, FakeCallStatus, RecorderStatus, SosStatus, checkin::format_mm_ss,
    recording::format_clock,
};

/// Render the session as a few lines of text.
pub fn frame(app: &App) -> String {
    let mut out = format!("SafeLine | {}", app.home_status());
    let sos = app.sos();

    match (sos.status, &sos.dispatch) {
        (SosStatus::Countdown, _) => {
            let _ = write!(out, "\n  Sending alerts in {}s, type 'cancel' to stop", sos.countdown_seconds);
        },
        (SosStatus::Active, Some(dispatch)) => {
            let progress = match dispatch {
                DispatchState::InFlight { attempt } => format!("sending (attempt {attempt})"),
                DispatchState::Delivered(report) => match report.status {
                    DeliveryStatus::Sent => format!("sent to {} contact(s)", report.recipients),
                    DeliveryStatus::Unknown => {
                        format!("handed off for {} contact(s), delivery unconfirmed", report.recipients)
                    },
                },
                DispatchState::Failed { attempt, .. } => format!("attempt {attempt} failed, type 'retry'"),
            };
            let _ = write!(out, "\n  Alert: {progress}. Type 'safe' once you are safe");
        },
        _ => {},
    }

    let checkin = app.checkin();
    let _ = write!(out, "\n  Check-in: {} {}", checkin.status, checkin.remaining_display());

    let call = app.fake_call();
    if call.status != FakeCallStatus::Setup {
        let _ = write!(out, "\n  Fake call: {} ({})", call.status, call.caller_name);
        if call.status == FakeCallStatus::Active {
            let _ = write!(out, " {}", format_mm_ss(call.elapsed_secs));
        }
    }

    if app.is_alarm_on() {
        out.push_str("\n  Siren ON");
    }
    if app.is_sharing_location() {
        out.push_str("\n  Sharing location");
    }
    let recorder = app.recorder();
    if recorder.status == RecorderStatus::Recording {
        let _ = write!(out, "\n  Recording {}, type 'record' to stop", format_clock(recorder.elapsed_secs));
    }
    match app.recordings().len() {
        0 => {},
        1 => out.push_str("\n  1 saved recording"),
        n => {
            let _ = write!(out, "\n  {n} saved recordings");
        },
    }
    if let Some(message) = app.status_message() {
        let _ = write!(out, "\n  > {message}");
        if app.awaiting_check_in() {
            out.push_str(" Type 'ok' or 'helpme'");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use safeline_app::AppEvent;
    use safeline_core::{
        CheckInConfig, CheckInTimer, FakeCall, FakeCallConfig, RecorderState, RecordingLog, SosState,
    };

    use super::*;

    fn app(sos: SosState) -> App {
        App::new(
            sos,
            CheckInTimer::new(CheckInConfig::default()).state(),
            FakeCall::new(FakeCallConfig::default()).state(),
        )
    }

    fn idle() -> SosState {
        SosState {
            status: SosStatus::Idle,
            activated_at_ms: None,
            countdown_seconds: 5,
            escalation: None,
            dispatch: None,
        }
    }

    #[test]
    fn resting_frame() {
        insta::assert_snapshot!(frame(&app(idle())), @r###"
        SafeLine | Add emergency contacts
          Check-in: setup 15:00
        "###);
    }

    #[test]
    fn countdown_frame() {
        let sos = SosState { status: SosStatus::Countdown, countdown_seconds: 3, ..idle() };
        let mut app = app(sos);
        app.set_status("Hold on");

        insta::assert_snapshot!(frame(&app), @r###"
        SafeLine | SOS activating...
          Sending alerts in 3s, type 'cancel' to stop
          Check-in: setup 15:00
          > Hold on
        "###);
    }

    #[test]
    fn recording_frame() {
        let mut app = app(idle());
        let mut log = RecordingLog::new();
        log.add("file:///a.m4a", 4, 1_000);
        log.add("file:///b.m4a", 9, 2_000);
        app.handle(AppEvent::RecordingsChanged(log.recordings().to_vec()));
        app.handle(AppEvent::RecorderChanged(RecorderState { status: RecorderStatus::Recording, elapsed_secs: 75 }));

        insta::assert_snapshot!(frame(&app), @r###"
        SafeLine | Add emergency contacts
          Check-in: setup 15:00
          Recording 01:15, type 'record' to stop
          2 saved recordings
        "###);
    }
}
