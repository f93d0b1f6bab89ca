//! SafeLine terminal front end
//!
//! Manages emergency contacts and the safety card from the command line, and
//! runs an interactive session driving the same [`safeline_app::Runtime`]
//! used in simulation.
//!
//! # Components
//!
//! - [`Args`]: clap argument definitions
//! - [`commands`]: one-shot contact, card, preview, helpline, and recording
//!   commands
//! - [`TerminalDriver`]: tokio [`safeline_app::Driver`] over stdin and stdout
//! - [`LogTransport`], [`FixedLocation`]: terminal stand-ins for SMS and GPS
//! - [`SystemEnv`]: production clock and RNG

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cli;
pub mod commands;
mod error;
mod input;
mod render;
mod session;
mod system_env;
mod terminal;
mod transport;

pub use cli::{
    Args, CardCommand, CardFields, Command as CliCommand, ContactsCommand, LocationArgs, RecordingsCommand, SessionArgs,
};
pub use error::CliError;
pub use input::{Command, HELP, parse_line};
pub use render::frame;
pub use session::{run_session, run_with_driver};
pub use system_env::SystemEnv;
pub use terminal::TerminalDriver;
pub use transport::{FixedLocation, LogTransport};
