//! Fuzz target for contact persistence under storage failures
//!
//! Edits a contact book and persists every change through `ChaoticStorage`.
//!
//! # Strategy
//!
//! - Variable failure rates (0% to 90%)
//! - Arbitrary add, remove, and primary toggles, including unknown ids
//!
//! # Invariants
//!
//! - Storage errors are returned, never panics
//! - The stored list is always the last list whose write succeeded
//! - The first contact added to an empty book is primary

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use safeline_core::{ContactBook, ContactId, EmergencyContact, NewContact};
use safeline_store::{ChaoticStorage, MemoryStorage, Storage};

#[derive(Debug, Clone, Arbitrary)]
struct ChaosScenario {
    chaos_seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    operations: Vec<ContactOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum ContactOperation {
    Add { name: String, phone: String },
    Remove { id: u8 },
    TogglePrimary { id: u8 },
    Reload,
}

fuzz_target!(|scenario: ChaosScenario| {
    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let inner = MemoryStorage::new();
    let storage = ChaoticStorage::with_seed(inner.clone(), failure_rate, scenario.chaos_seed);

    let mut book = ContactBook::new();
    let mut committed: Vec<EmergencyContact> = Vec::new();
    let mut next_id = 0u64;

    for op in scenario.operations.into_iter().take(128) {
        let changed = match op {
            ContactOperation::Add { name, phone } => {
                let was_empty = book.is_empty();
                next_id += 1;
                match book.add(ContactId::from_random(next_id), NewContact::new(name, phone)) {
                    Ok(added) => {
                        assert_eq!(added.is_primary, was_empty);
                        true
                    },
                    Err(_) => false,
                }
            },
            ContactOperation::Remove { id } => {
                book.remove(&ContactId::from_random(u64::from(id))).is_some()
            },
            ContactOperation::TogglePrimary { id } => {
                book.toggle_primary(&ContactId::from_random(u64::from(id))).is_ok()
            },
            ContactOperation::Reload => {
                if let Ok(loaded) = storage.load_contacts() {
                    assert_eq!(loaded, committed);
                }
                false
            },
        };

        if changed && storage.store_contacts(book.contacts()).is_ok() {
            committed = book.contacts().to_vec();
        }
        assert_eq!(inner.load_contacts().expect("memory storage never fails"), committed);
    }
});
