//! Session command lines.
//!
//! One line per command. Words are case-insensitive; contact fields after
//! `add` are separated by commas so names may contain spaces.

use safeline_app::Intent;
use safeline_core::{ContactId, RecordingId, Relationship};

use crate::CliError;

/// Shown by `help`.
pub const HELP: &str = "\
commands:
  sos | cancel | safe | retry         SOS: trigger, cancel countdown, I'm safe, resend
  checkin <minutes> | checkin start | pause | resume | reset
  ok | helpme                         answer an expired check-in
  call [delay <secs>] | answer | hangup | call reset
  alarm | share                       toggle siren, share location
  record | record delete <id>         start or stop audio evidence, drop a recording
  add <name>, <phone>[, <relationship>] | remove <id> | primary <id>
  quit";

/// A parsed session line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Something for the app.
    Intent(Intent),
    /// Print [`HELP`].
    Help,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CliError> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let unknown = || CliError::UnknownCommand(line.to_string());

    let intent = match (head.to_ascii_lowercase().as_str(), rest.to_ascii_lowercase().as_str()) {
        ("", _) => return Ok(None),
        ("help" | "?", _) => return Ok(Some(Command::Help)),
        ("sos", "") => Intent::TriggerSos,
        ("cancel", "") => Intent::CancelSos,
        ("safe", "") => Intent::ResolveSos,
        ("retry", "") => Intent::RetryAlert,
        ("checkin", "start") => Intent::StartCheckIn,
        ("checkin", "pause") | ("pause", "") => Intent::PauseCheckIn,
        ("checkin", "resume") | ("resume", "") => Intent::ResumeCheckIn,
        ("checkin", "reset") => Intent::ResetCheckIn,
        ("checkin", minutes) => Intent::SelectCheckInDuration(minutes.parse().map_err(|_| unknown())?),
        ("ok", "") => Intent::DismissCheckIn,
        ("helpme", "") => Intent::EscalateCheckIn,
        ("call", "") => Intent::ScheduleFakeCall,
        ("call", "reset") => Intent::ResetFakeCall,
        ("call", args) => {
            let secs = args.strip_prefix("delay").ok_or_else(unknown)?.trim();
            Intent::SelectFakeCallDelay(secs.parse().map_err(|_| unknown())?)
        },
        ("answer", "") => Intent::AnswerFakeCall,
        ("hangup", "") => Intent::EndFakeCall,
        ("alarm", "") => Intent::ToggleAlarm,
        ("share", "") => Intent::ToggleLocationSharing,
        ("record", "") => Intent::ToggleRecording,
        ("record", args) if args.starts_with("delete ") => {
            Intent::DeleteRecording(RecordingId::new(rest["delete".len()..].trim()))
        },
        ("add", _) => parse_contact(rest)?,
        ("remove", _) if !rest.is_empty() => Intent::RemoveContact(ContactId::new(rest)),
        ("primary", _) if !rest.is_empty() => Intent::TogglePrimary(ContactId::new(rest)),
        ("quit" | "exit", "") => Intent::Quit,
        _ => return Err(unknown()),
    };
    Ok(Some(Command::Intent(intent)))
}

fn parse_contact(fields: &str) -> Result<Intent, CliError> {
    let mut parts = fields.split(',').map(str::trim);
    let name = parts.next().unwrap_or_default().to_string();
    let phone = parts.next().unwrap_or_default().to_string();
    let relationship = match parts.next() {
        Some(label) if !label.is_empty() => label.parse()?,
        _ => Relationship::default(),
    };
    Ok(Intent::AddContact { name, phone, relationship })
}
