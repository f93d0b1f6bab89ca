//! Safety core for SafeLine
//!
//! Sans-IO state machines for personal-safety flows. Every controller consumes
//! events and returns actions; timers, messaging, and storage are executed by
//! the caller.
//!
//! # Components
//!
//! - [`SosController`]: emergency alert lifecycle (idle, countdown, active,
//!   resolved)
//! - [`CheckInTimer`]: dead-man's switch that escalates into SOS
//! - [`FakeCall`]: decoy incoming call
//! - [`Recorder`], [`RecordingLog`]: audio evidence clock and saved captures
//! - [`HELPLINES`]: one-tap emergency numbers
//! - [`ContactBook`], [`SafetyCard`], [`Coordinates`]: session data
//! - [`AlertRequest`]: alert composition for the messaging transport
//! - [`Environment`]: clock and randomness abstraction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod alert;
pub mod card;
pub mod checkin;
pub mod contacts;
pub mod directory;
pub mod env;
pub mod error;
pub mod fake_call;
pub mod location;
pub mod recording;
pub mod sos;
pub mod timer;

pub use alert::{AlertPurpose, AlertRequest, DeliveryOutcome, DeliveryReport, DeliveryStatus};
pub use card::{BloodGroup, SafetyCard};
pub use checkin::{CheckInAction, CheckInConfig, CheckInEvent, CheckInState, CheckInStatus, CheckInTimer};
pub use contacts::{ContactBook, ContactId, EmergencyContact, NewContact, Relationship};
pub use directory::{HELPLINES, Helpline, find_helpline};
pub use env::Environment;
pub use error::{DispatchError, InputError};
pub use fake_call::{FakeCall, FakeCallAction, FakeCallConfig, FakeCallEvent, FakeCallState, FakeCallStatus};
pub use location::Coordinates;
pub use recording::{
    Recorder, RecorderAction, RecorderEvent, RecorderState, RecorderStatus, Recording, RecordingId, RecordingLog,
};
pub use sos::{
    DispatchState, Escalation, SosAction, SosConfig, SosController, SosEvent, SosState, SosStatus,
};
pub use timer::{TimerCommand, TimerId, TimerMode, TimerOwner, TimerSlot};
