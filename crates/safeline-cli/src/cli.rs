//! Command-line arguments.

use std::{path::PathBuf, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand};
use safeline_app::SessionConfig;
use safeline_core::{
    CheckInConfig, Coordinates, FakeCallConfig, InputError, SosConfig,
    checkin::{MAX_DURATION_MINUTES, MIN_DURATION_MINUTES},
    fake_call::MAX_DELAY_SECS,
};

/// SafeLine personal safety companion
#[derive(Parser, Debug)]
#[command(name = "safeline")]
#[command(about = "Personal safety companion: SOS alerts, check-in timer, fake call")]
#[command(version)]
pub struct Args {
    /// Database holding contacts and the safety card
    #[arg(long, global = true, default_value = "safeline.redb")]
    pub db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage emergency contacts
    #[command(subcommand)]
    Contacts(ContactsCommand),

    /// Show or edit the safety card
    #[command(subcommand)]
    Card(CardCommand),

    /// Print the emergency message that SOS would send
    Preview(LocationArgs),

    /// List emergency helplines with their dial links
    Directory,

    /// Manage audio evidence recordings
    #[command(subcommand)]
    Recordings(RecordingsCommand),

    /// Start an interactive session
    Session(SessionArgs),
}

/// Contact management.
#[derive(Subcommand, Debug)]
pub enum ContactsCommand {
    /// List contacts in notification order
    List,

    /// Add a contact
    Add {
        /// Display name
        name: String,
        /// Phone number
        phone: String,
        /// Relationship (parent, sibling, spouse, partner, friend, colleague,
        /// neighbor, other)
        #[arg(short, long, default_value = "friend")]
        relationship: String,
    },

    /// Replace a contact's name, phone, and relationship
    Edit {
        /// Contact id
        id: String,
        /// Display name
        name: String,
        /// Phone number
        phone: String,
        /// Relationship
        #[arg(short, long, default_value = "friend")]
        relationship: String,
    },

    /// Remove a contact
    Remove {
        /// Contact id
        id: String,
    },

    /// Toggle a contact's primary flag
    Primary {
        /// Contact id
        id: String,
    },
}

/// Recordings log commands.
#[derive(Subcommand, Debug)]
pub enum RecordingsCommand {
    /// List recordings, newest first
    List,

    /// Delete a recording from the log
    Delete {
        /// Recording id
        id: String,
    },
}

/// Safety card commands.
#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Print the card
    Show,

    /// Update card fields; omitted fields are kept
    Set(CardFields),
}

/// Safety card fields.
#[derive(ClapArgs, Debug, Default)]
pub struct CardFields {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,
    /// Blood group (A+, A-, B+, B-, AB+, AB-, O+, O-, unknown)
    #[arg(long)]
    pub blood_group: Option<String>,
    /// Allergies
    #[arg(long)]
    pub allergies: Option<String>,
    /// Medications
    #[arg(long)]
    pub medications: Option<String>,
    /// Medical conditions
    #[arg(long)]
    pub conditions: Option<String>,
    /// Date of birth
    #[arg(long)]
    pub date_of_birth: Option<String>,
    /// Home address
    #[arg(long)]
    pub address: Option<String>,
}

/// Device position.
#[derive(ClapArgs, Debug, Default)]
pub struct LocationArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,
    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,
}

impl LocationArgs {
    /// Validated coordinates, if both were given.
    pub fn coordinates(&self) -> Result<Option<Coordinates>, InputError> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map(Some),
            _ => Ok(None),
        }
    }
}

/// Interactive session options.
#[derive(ClapArgs, Debug)]
pub struct SessionArgs {
    /// SOS grace period in seconds (0 sends immediately)
    #[arg(long, default_value_t = safeline_core::sos::DEFAULT_COUNTDOWN_SECS)]
    pub countdown_secs: u32,

    /// Time "You are safe now" stays up, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub resolved_hold_ms: u64,

    /// Initial check-in duration in minutes
    #[arg(long, default_value_t = safeline_core::checkin::DEFAULT_DURATION_MINUTES)]
    pub checkin_minutes: u32,

    /// Seconds to answer an expired check-in before SOS starts (0 waits
    /// forever)
    #[arg(long, default_value_t = 60)]
    pub response_window_secs: u64,

    /// Fake call delay in seconds
    #[arg(long, default_value_t = safeline_core::fake_call::DEFAULT_DELAY_SECS)]
    pub fake_call_secs: u32,

    /// Caller shown by the fake call
    #[arg(long, default_value = safeline_core::fake_call::DEFAULT_CALLER_NAME)]
    pub caller: String,

    /// Refuse every alert, as a device without messaging would
    #[arg(long)]
    pub offline: bool,

    /// Device position
    #[command(flatten)]
    pub location: LocationArgs,
}

impl SessionArgs {
    /// Controller configuration.
    ///
    /// Rejects check-in durations and fake call delays the controllers would
    /// otherwise clamp without telling anyone.
    pub fn session_config(&self) -> Result<SessionConfig, InputError> {
        let minutes = self.checkin_minutes;
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
            return Err(InputError::InvalidDuration {
                minutes,
                min: MIN_DURATION_MINUTES,
                max: MAX_DURATION_MINUTES,
            });
        }
        if self.fake_call_secs == 0 || self.fake_call_secs > MAX_DELAY_SECS {
            return Err(InputError::InvalidDelay { seconds: self.fake_call_secs });
        }

        Ok(SessionConfig {
            sos: SosConfig {
                countdown_secs: self.countdown_secs,
                resolved_hold: Duration::from_millis(self.resolved_hold_ms),
                ..SosConfig::default()
            },
            checkin: CheckInConfig {
                duration_minutes: self.checkin_minutes,
                response_window: (self.response_window_secs > 0)
                    .then(|| Duration::from_secs(self.response_window_secs)),
                ..CheckInConfig::default()
            },
            fake_call: FakeCallConfig {
                delay_secs: self.fake_call_secs,
                caller_name: self.caller.clone(),
                ..FakeCallConfig::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_flags_map_onto_config() {
        let args = Args::try_parse_from([
            "safeline",
            "session",
            "--countdown-secs",
            "0",
            "--response-window-secs",
            "0",
            "--lat",
            "-33.9",
            "--lon",
            "18.4",
        ])
        .unwrap();

        let Command::Session(session) = args.command else { panic!("expected session") };
        let config = session.session_config().unwrap();
        assert_eq!(config.sos.countdown_secs, 0);
        assert_eq!(config.checkin.response_window, None);
        assert!(session.location.coordinates().unwrap().is_some());
    }

    #[test]
    fn recordings_subcommands_parse() {
        let args = Args::try_parse_from(["safeline", "recordings", "delete", "1700000000000"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Recordings(RecordingsCommand::Delete { ref id }) if id == "1700000000000"
        ));

        let args = Args::try_parse_from(["safeline", "directory"]).unwrap();
        assert!(matches!(args.command, Command::Directory));
    }

    #[test]
    fn out_of_range_session_flags_are_rejected() {
        let session = |flags: &[&str]| {
            let args = Args::try_parse_from(["safeline", "session"].iter().chain(flags).copied()).unwrap();
            let Command::Session(session) = args.command else { panic!("expected session") };
            session.session_config()
        };

        assert!(matches!(
            session(&["--checkin-minutes", "0"]),
            Err(InputError::InvalidDuration { minutes: 0, min: 1, max: 1440 })
        ));
        assert!(matches!(
            session(&["--checkin-minutes", "1441"]),
            Err(InputError::InvalidDuration { minutes: 1441, .. })
        ));
        assert!(matches!(session(&["--fake-call-secs", "0"]), Err(InputError::InvalidDelay { seconds: 0 })));
        assert!(session(&["--checkin-minutes", "1440"]).is_ok());
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Args::try_parse_from(["safeline", "preview", "--lat", "10"]).is_err());
    }

    #[test]
    fn db_flag_is_global() {
        let args = Args::try_parse_from(["safeline", "contacts", "list", "--db", "/tmp/x.redb"]).unwrap();
        assert_eq!(args.db, PathBuf::from("/tmp/x.redb"));
    }
}
