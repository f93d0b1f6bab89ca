//! Storage for SafeLine
//!
//! Trait-based abstraction for the persisted entities: the emergency contact
//! list, the safety card, and the audio recording log. The trait is synchronous; the session
//! runtime calls it between events.
//!
//! # Implementations
//!
//! - [`MemoryStorage`]: shared in-memory maps for tests and simulation
//! - [`RedbStorage`]: durable `redb` database with CBOR values
//! - [`ChaoticStorage`]: wrapper that injects deterministic failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;
use safeline_core::{EmergencyContact, Recording, SafetyCard};

pub use self::redb::RedbStorage;

/// Storage abstraction for contacts, the safety card, and recordings.
///
/// Must be Clone (shared between the runtime and tools), Send + Sync, and
/// synchronous. Implementations share internal state via Arc, so clones access
/// the same underlying storage.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Load all contacts in insertion order.
    ///
    /// Returns an empty list if nothing was ever saved.
    fn load_contacts(&self) -> Result<Vec<EmergencyContact>, StorageError>;

    /// Replace the stored contact list.
    ///
    /// # Invariants
    ///
    /// - Post: a subsequent `load_contacts` returns exactly `contacts`, in
    ///   order
    /// - The replacement is atomic: readers see the old list or the new one
    fn store_contacts(&self, contacts: &[EmergencyContact]) -> Result<(), StorageError>;

    /// Load the safety card.
    ///
    /// Never absent: returns [`SafetyCard::default`] if nothing was saved.
    fn load_card(&self) -> Result<SafetyCard, StorageError>;

    /// Overwrite the safety card.
    fn store_card(&self, card: &SafetyCard) -> Result<(), StorageError>;

    /// Load recording metadata, newest first.
    ///
    /// Returns an empty list if nothing was ever saved.
    fn load_recordings(&self) -> Result<Vec<Recording>, StorageError>;

    /// Replace the stored recording log. Same guarantees as
    /// [`Storage::store_contacts`].
    fn store_recordings(&self, recordings: &[Recording]) -> Result<(), StorageError>;
}
