//! CLI error type.

use std::io;

use safeline_core::InputError;
use safeline_store::StorageError;
use thiserror::Error;

/// Errors surfaced by commands and the interactive session.
#[derive(Debug, Error)]
pub enum CliError {
    /// Terminal or stdout failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Contacts or card could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Rejected user input.
    #[error("{0}")]
    Input(#[from] InputError),

    /// Session line that is not a command.
    #[error("unknown command: {0} (type 'help')")]
    UnknownCommand(String),
}
