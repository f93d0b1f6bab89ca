//! SafeLine CLI entry point.

use std::io::{self, Write};

use clap::Parser;
use safeline_cli::{
    Args, CardCommand, CliCommand, CliError, ContactsCommand, RecordingsCommand, SystemEnv, commands,
    run_session,
};
use safeline_core::{ContactId, RecordingId};
use safeline_store::RedbStorage;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let storage = RedbStorage::open(&args.db)?;

    match args.command {
        CliCommand::Session(session) => run_session(storage, &session).await?,
        command => run_command(command, &storage, &mut io::stdout().lock())?,
    }
    Ok(())
}

fn run_command(command: CliCommand, storage: &RedbStorage, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        CliCommand::Contacts(ContactsCommand::List) => commands::list_contacts(storage, out),
        CliCommand::Contacts(ContactsCommand::Add { name, phone, relationship }) => {
            let contact = commands::new_contact(&name, &phone, &relationship)?;
            commands::add_contact(storage, &SystemEnv::new(), contact, out).map(|_| ())
        },
        CliCommand::Contacts(ContactsCommand::Edit { id, name, phone, relationship }) => {
            let contact = commands::new_contact(&name, &phone, &relationship)?;
            commands::edit_contact(storage, &ContactId::new(id), contact, out)
        },
        CliCommand::Contacts(ContactsCommand::Remove { id }) => {
            commands::remove_contact(storage, &ContactId::new(id), out)
        },
        CliCommand::Contacts(ContactsCommand::Primary { id }) => {
            commands::toggle_primary(storage, &ContactId::new(id), out)
        },
        CliCommand::Card(CardCommand::Show) => commands::show_card(storage, out),
        CliCommand::Card(CardCommand::Set(fields)) => commands::set_card(storage, fields, out),
        CliCommand::Preview(location) => commands::preview(storage, location.coordinates()?, out),
        CliCommand::Directory => commands::list_helplines(out),
        CliCommand::Recordings(RecordingsCommand::List) => commands::list_recordings(storage, out),
        CliCommand::Recordings(RecordingsCommand::Delete { id }) => {
            commands::delete_recording(storage, &RecordingId::new(id), out)
        },
        // Needs the async runtime; started from main.
        CliCommand::Session(_) => Ok(()),
    }
}
