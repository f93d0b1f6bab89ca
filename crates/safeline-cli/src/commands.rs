//! One-shot commands: contacts, safety card, message preview, helplines,
//! recordings.
//!
//! Each command loads what it needs from storage, applies the same
//! validation the session uses, writes back, and prints a short report.

use std::io::Write;

use safeline_core::{
    AlertRequest, BloodGroup, ContactBook, ContactId, Coordinates, Environment, Escalation, HELPLINES,
    InputError, NewContact, RecordingId, RecordingLog, Relationship, SafetyCard, recording::format_clock,
};
use safeline_store::Storage;
use tracing::info;

use crate::{CardFields, CliError};

/// Print contacts in notification order.
pub fn list_contacts(storage: &impl Storage, out: &mut impl Write) -> Result<(), CliError> {
    let book = ContactBook::from_contacts(storage.load_contacts()?);
    if book.is_empty() {
        writeln!(out, "No emergency contacts yet. Add one with 'safeline contacts add'.")?;
        return Ok(());
    }
    for contact in book.dispatch_order() {
        let marker = if contact.is_primary { "*" } else { " " };
        writeln!(
            out,
            "{marker} {}  {}  {}  ({})",
            contact.id, contact.name, contact.phone, contact.relationship
        )?;
    }
    Ok(())
}

/// Add a contact under a fresh random id.
pub fn add_contact(
    storage: &impl Storage,
    env: &impl Environment,
    contact: NewContact,
    out: &mut impl Write,
) -> Result<ContactId, CliError> {
    let mut book = ContactBook::from_contacts(storage.load_contacts()?);
    let id = loop {
        let id = ContactId::from_random(env.random_u64());
        if !book.contains(&id) {
            break id;
        }
    };

    let added = book.add(id.clone(), contact)?;
    writeln!(out, "Added {} ({})", added.name, added.id)?;
    storage.store_contacts(book.contacts())?;
    info!(contact = %id, "contact added");
    Ok(id)
}

/// Replace a contact's editable fields.
pub fn edit_contact(
    storage: &impl Storage,
    id: &ContactId,
    contact: NewContact,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut book = ContactBook::from_contacts(storage.load_contacts()?);
    book.update(id, contact)?;
    storage.store_contacts(book.contacts())?;
    writeln!(out, "Updated {id}")?;
    Ok(())
}

/// Remove a contact.
pub fn remove_contact(storage: &impl Storage, id: &ContactId, out: &mut impl Write) -> Result<(), CliError> {
    let mut book = ContactBook::from_contacts(storage.load_contacts()?);
    let removed = book.remove(id).ok_or_else(|| InputError::UnknownContact(id.clone()))?;
    storage.store_contacts(book.contacts())?;
    writeln!(out, "Removed {}", removed.name)?;
    Ok(())
}

/// Flip a contact's primary flag.
pub fn toggle_primary(storage: &impl Storage, id: &ContactId, out: &mut impl Write) -> Result<(), CliError> {
    let mut book = ContactBook::from_contacts(storage.load_contacts()?);
    let primary = book.toggle_primary(id)?;
    storage.store_contacts(book.contacts())?;
    writeln!(out, "{id} is {}", if primary { "primary" } else { "no longer primary" })?;
    Ok(())
}

/// Contact fields from command-line strings.
pub fn new_contact(name: &str, phone: &str, relationship: &str) -> Result<NewContact, CliError> {
    let relationship: Relationship = relationship.parse()?;
    Ok(NewContact::new(name, phone).with_relationship(relationship))
}

/// Print the safety card.
pub fn show_card(storage: &impl Storage, out: &mut impl Write) -> Result<(), CliError> {
    let card = storage.load_card()?;
    if card.is_blank() {
        writeln!(out, "Safety card is empty. Fill it in with 'safeline card set'.")?;
        return Ok(());
    }

    let rows = [
        ("Name", card.full_name.as_str()),
        ("Blood group", card.blood_group.label()),
        ("Allergies", card.allergies.as_str()),
        ("Medications", card.medications.as_str()),
        ("Conditions", card.medical_conditions.as_str()),
        ("Date of birth", card.date_of_birth.as_str()),
        ("Address", card.address.as_str()),
    ];
    for (label, value) in rows {
        let value = if value.trim().is_empty() { "-" } else { value };
        writeln!(out, "{label:<14}{value}")?;
    }
    Ok(())
}

/// Merge the given fields into the stored card and save it.
pub fn set_card(storage: &impl Storage, fields: CardFields, out: &mut impl Write) -> Result<(), CliError> {
    let mut card = storage.load_card()?;
    apply_fields(&mut card, fields)?;
    storage.store_card(&card)?;
    writeln!(out, "Safety card saved")?;
    Ok(())
}

fn apply_fields(card: &mut SafetyCard, fields: CardFields) -> Result<(), InputError> {
    if let Some(group) = fields.blood_group {
        card.blood_group = group.parse::<BloodGroup>()?;
    }
    let text = [
        (fields.name, &mut card.full_name),
        (fields.allergies, &mut card.allergies),
        (fields.medications, &mut card.medications),
        (fields.conditions, &mut card.medical_conditions),
        (fields.date_of_birth, &mut card.date_of_birth),
        (fields.address, &mut card.address),
    ];
    for (value, slot) in text {
        if let Some(value) = value {
            *slot = value.trim().to_string();
        }
    }
    Ok(())
}

/// Print the emergency message an SOS would send right now.
pub fn preview(
    storage: &impl Storage,
    location: Option<Coordinates>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let book = ContactBook::from_contacts(storage.load_contacts()?);
    let card = storage.load_card()?;

    match AlertRequest::sos(Escalation::new(1), &book, &card, location) {
        Ok(request) => {
            writeln!(out, "To: {}", request.recipients.join(", "))?;
            writeln!(out, "{}", request.message)?;
        },
        Err(e) => writeln!(out, "{}", e.user_message())?,
    }
    Ok(())
}

/// Print the emergency helplines with their dial links.
pub fn list_helplines(out: &mut impl Write) -> Result<(), CliError> {
    for line in HELPLINES {
        writeln!(out, "{:<6}{:<20}{}", line.number, line.name, line.dial_uri())?;
    }
    Ok(())
}

/// Print saved recordings, newest first.
pub fn list_recordings(storage: &impl Storage, out: &mut impl Write) -> Result<(), CliError> {
    let log = RecordingLog::from_recordings(storage.load_recordings()?);
    if log.is_empty() {
        writeln!(out, "No recordings yet. Type 'record' during a session.")?;
        return Ok(());
    }
    for recording in log.recordings() {
        writeln!(out, "{}  {}  {}", recording.id, format_clock(recording.duration_secs), recording.uri)?;
    }
    Ok(())
}

/// Drop a recording from the log. The captured file itself is left alone.
pub fn delete_recording(storage: &impl Storage, id: &RecordingId, out: &mut impl Write) -> Result<(), CliError> {
    let mut log = RecordingLog::from_recordings(storage.load_recordings()?);
    let removed = log.remove(id).ok_or_else(|| InputError::UnknownRecording(id.clone()))?;
    storage.store_recordings(log.recordings())?;
    writeln!(out, "Deleted recording {} ({})", removed.id, format_clock(removed.duration_secs))?;
    info!(recording = %id, "recording deleted");
    Ok(())
}
