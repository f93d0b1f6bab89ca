#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex};

use safeline_core::{EmergencyContact, Recording, SafetyCard};

use super::{Storage, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// All state is wrapped in Arc<Mutex<>> to allow Clone and concurrent access.
/// Thread-safe through Mutex, but uses `lock().expect()` which will panic if
/// the mutex is poisoned - acceptable for test code.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Default)]
struct MemoryStorageInner {
    /// `None` until the first save.
    contacts: Option<Vec<EmergencyContact>>,
    /// `None` until the first save.
    card: Option<SafetyCard>,
    recordings: Vec<Recording>,
    /// Successful writes, for tests.
    writes: usize,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn write_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").writes
    }

    /// Whether a card was ever saved.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn has_card(&self) -> bool {
        self.inner.lock().expect("Mutex poisoned").card.is_some()
    }
}

impl Storage for MemoryStorage {
    #[allow(clippy::expect_used)]
    fn load_contacts(&self) -> Result<Vec<EmergencyContact>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.contacts.clone().unwrap_or_default())
    }

    #[allow(clippy::expect_used)]
    fn store_contacts(&self, contacts: &[EmergencyContact]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.contacts = Some(contacts.to_vec());
        inner.writes += 1;
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn load_card(&self) -> Result<SafetyCard, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.card.clone().unwrap_or_default())
    }

    #[allow(clippy::expect_used)]
    fn store_card(&self, card: &SafetyCard) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.card = Some(card.clone());
        inner.writes += 1;
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn load_recordings(&self) -> Result<Vec<Recording>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").recordings.clone())
    }

    #[allow(clippy::expect_used)]
    fn store_recordings(&self, recordings: &[Recording]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.recordings = recordings.to_vec();
        inner.writes += 1;
        Ok(())
    }
}
