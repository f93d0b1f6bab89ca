//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! Contacts, the safety card, and recording metadata survive app restarts.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};
use safeline_core::{EmergencyContact, Recording, SafetyCard};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{Storage, StorageError};

/// Positional list table.
type ListTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// Table: contacts
/// Key: insertion position as big-endian u32 [4 bytes]
/// Value: CBOR-encoded `EmergencyContact`
const CONTACTS: ListTable = TableDefinition::new("contacts");

/// Table: recordings
/// Key: position in the log (newest first) as big-endian u32 [4 bytes]
/// Value: CBOR-encoded `Recording`
const RECORDINGS: ListTable = TableDefinition::new("recordings");

/// Table: profile
/// Key: record name (UTF-8)
/// Value: CBOR-encoded record
const PROFILE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("profile");

/// Profile key of the safety card.
const SAFETY_CARD_KEY: &[u8] = b"safety_card";

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (CONTACTS, RECORDINGS, PROFILE).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(CONTACTS).map_err(|e| StorageError::Io(e.to_string()))?;
            let _ = txn.open_table(RECORDINGS).map_err(|e| StorageError::Io(e.to_string()))?;
            let _ = txn.open_table(PROFILE).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        debug!(path = %path.as_ref().display(), "opened safety store");
        Ok(Self { db: Arc::new(db) })
    }

    fn load_list<T: DeserializeOwned>(&self, definition: ListTable) -> Result<Vec<T>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(definition).map_err(|e| StorageError::Io(e.to_string()))?;

        // Keys are big-endian positions, so iteration order is list order.
        let mut items = Vec::new();
        for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
            let (_, value) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            items.push(decode(value.value())?);
        }

        Ok(items)
    }

    fn store_list<T: Serialize>(&self, definition: ListTable, items: &[T]) -> Result<(), StorageError> {
        let encoded = items.iter().map(|item| encode(item)).collect::<Result<Vec<_>, _>>()?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(definition).map_err(|e| StorageError::Io(e.to_string()))?;

            let mut stale = Vec::new();
            for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
                let (key, _) = result.map_err(|e| StorageError::Io(e.to_string()))?;
                stale.push(key.value().to_vec());
            }
            for key in stale {
                table.remove(key.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
            }

            for (position, bytes) in encoded.iter().enumerate() {
                let key = encode_position(position)?;
                table
                    .insert(key.as_slice(), bytes.as_slice())
                    .map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }
}

impl Storage for RedbStorage {
    fn load_contacts(&self) -> Result<Vec<EmergencyContact>, StorageError> {
        self.load_list(CONTACTS)
    }

    fn store_contacts(&self, contacts: &[EmergencyContact]) -> Result<(), StorageError> {
        self.store_list(CONTACTS, contacts)
    }

    fn load_card(&self) -> Result<SafetyCard, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(PROFILE).map_err(|e| StorageError::Io(e.to_string()))?;

        match table.get(SAFETY_CARD_KEY).map_err(|e| StorageError::Io(e.to_string()))? {
            Some(value) => decode(value.value()),
            None => Ok(SafetyCard::default()),
        }
    }

    fn store_card(&self, card: &SafetyCard) -> Result<(), StorageError> {
        let bytes = encode(card)?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(PROFILE).map_err(|e| StorageError::Io(e.to_string()))?;
            table
                .insert(SAFETY_CARD_KEY, bytes.as_slice())
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn load_recordings(&self) -> Result<Vec<Recording>, StorageError> {
        self.load_list(RECORDINGS)
    }

    fn store_recordings(&self, recordings: &[Recording]) -> Result<(), StorageError> {
        self.store_list(RECORDINGS, recordings)
    }
}

fn encode_position(position: usize) -> Result<[u8; 4], StorageError> {
    let position = u32::try_from(position)
        .map_err(|_| StorageError::Serialization(format!("list position {position} overflows")))?;
    Ok(position.to_be_bytes())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use safeline_core::{BloodGroup, ContactId, RecordingLog, Relationship};
    use tempfile::TempDir;

    use super::*;

    fn contact(id: &str, relationship: Relationship, primary: bool) -> EmergencyContact {
        EmergencyContact {
            id: ContactId::new(id),
            name: format!("Contact {id}"),
            phone: format!("+1 555 01{id}"),
            relationship,
            is_primary: primary,
        }
    }

    fn open_temp() -> (TempDir, RedbStorage) {
        let dir = TempDir::new().unwrap();
        let storage = RedbStorage::open(dir.path().join("safeline.redb")).unwrap();
        (dir, storage)
    }

    #[test]
    fn fresh_database_loads_defaults() {
        let (_dir, storage) = open_temp();
        assert!(storage.load_contacts().unwrap().is_empty());
        assert_eq!(storage.load_card().unwrap(), SafetyCard::default());
        assert!(storage.load_recordings().unwrap().is_empty());
    }

    #[test]
    fn shrinking_list_drops_tail() {
        let (_dir, storage) = open_temp();
        let contacts: Vec<_> = (0..12)
            .map(|i| contact(&format!("{i:02}"), Relationship::Friend, i == 0))
            .collect();
        storage.store_contacts(&contacts).unwrap();
        storage.store_contacts(&contacts[..3]).unwrap();

        assert_eq!(storage.load_contacts().unwrap(), contacts[..3].to_vec());
    }

    #[test]
    fn order_survives_more_than_ten_entries() {
        let (_dir, storage) = open_temp();
        let contacts: Vec<_> =
            (0..300).map(|i| contact(&format!("{i}"), Relationship::Other, false)).collect();
        storage.store_contacts(&contacts).unwrap();

        let ids: Vec<_> = storage.load_contacts().unwrap().into_iter().map(|c| c.id).collect();
        let expected: Vec<_> = contacts.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("safeline.redb");
        let card = SafetyCard {
            full_name: "Jo Doe".into(),
            blood_group: BloodGroup::BNegative,
            allergies: "latex".into(),
            ..SafetyCard::default()
        };
        let contacts = vec![contact("1", Relationship::Parent, true)];
        let mut log = RecordingLog::new();
        log.add("file:///evidence/1.m4a", 42, 1_700_000_000_000);

        {
            let storage = RedbStorage::open(&path).unwrap();
            storage.store_contacts(&contacts).unwrap();
            storage.store_card(&card).unwrap();
            storage.store_recordings(log.recordings()).unwrap();
        }

        let storage = RedbStorage::open(&path).unwrap();
        assert_eq!(storage.load_contacts().unwrap(), contacts);
        assert_eq!(storage.load_card().unwrap(), card);
        assert_eq!(storage.load_recordings().unwrap(), log.recordings());
    }

    #[test]
    fn recordings_and_contacts_do_not_share_positions() {
        let (_dir, storage) = open_temp();
        let mut log = RecordingLog::new();
        log.add("file:///a.m4a", 1, 100);
        log.add("file:///b.m4a", 2, 200);
        storage.store_recordings(log.recordings()).unwrap();
        storage.store_contacts(&[contact("1", Relationship::Friend, true)]).unwrap();

        let loaded = storage.load_recordings().unwrap();
        assert_eq!(loaded.iter().map(|r| r.duration_secs).collect::<Vec<_>>(), [2, 1]);
        storage.store_recordings(&[]).unwrap();
        assert!(storage.load_recordings().unwrap().is_empty());
        assert_eq!(storage.load_contacts().unwrap().len(), 1);
    }
}
