//! Application layer for SafeLine
//!
//! Pure view state, the controller bridge, and a generic runtime, enabling
//! deterministic simulation testing with the same code that runs in the CLI.
//!
//! # Components
//!
//! - [`App`]: view state machine (intents, snapshots, status line)
//! - [`Bridge`]: owns the safety controllers and turns their output into
//!   [`Effect`]s
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`MessagingTransport`], [`LocationProvider`]: platform collaborators
//! - [`Runtime`]: Generic orchestration loop using Driver and Storage

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod config;
mod driver;
mod effect;
mod event;
mod intent;
mod runtime;
mod state;
mod transport;

pub use action::AppAction;
pub use app::{App, CHECK_IN_PROMPT};
pub use bridge::Bridge;
pub use config::SessionConfig;
pub use driver::Driver;
pub use effect::{Effect, FeedbackCue};
pub use event::AppEvent;
pub use intent::Intent;
pub use runtime::Runtime;
pub use state::HomeStatus;
pub use transport::{LocationProvider, MessagingTransport};
