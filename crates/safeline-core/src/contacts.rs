//! Emergency contacts.
//!
//! The [`ContactBook`] is owned by the session. The SOS controller never holds
//! contacts; recipients are read from the book at dispatch time.
//!
//! # Notification order
//!
//! Any number of contacts may be flagged primary. [`ContactBook::dispatch_order`]
//! yields primaries first, then everyone else, each group in insertion order.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Generated contact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(String);

impl ContactId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier derived from 64 random bits.
    pub fn from_random(value: u64) -> Self {
        Self(format!("{value:016x}"))
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relationship of a contact to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// Mother or father.
    Parent,
    /// Brother or sister.
    Sibling,
    /// Husband or wife.
    Spouse,
    /// Partner.
    Partner,
    /// Friend.
    #[default]
    Friend,
    /// Colleague.
    Colleague,
    /// Neighbor.
    Neighbor,
    /// Anything else.
    Other,
}

impl Relationship {
    /// Every relationship, in display order.
    pub const ALL: [Self; 8] = [
        Self::Parent,
        Self::Sibling,
        Self::Spouse,
        Self::Partner,
        Self::Friend,
        Self::Colleague,
        Self::Neighbor,
        Self::Other,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Parent => "Parent",
            Self::Sibling => "Sibling",
            Self::Spouse => "Spouse",
            Self::Partner => "Partner",
            Self::Friend => "Friend",
            Self::Colleague => "Colleague",
            Self::Neighbor => "Neighbor",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Relationship {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InputError::UnknownRelationship(trimmed.to_string()))
    }
}

/// A person notified during an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Generated identifier.
    pub id: ContactId,
    /// Display name.
    pub name: String,
    /// Phone number as entered. Only checked for non-emptiness.
    pub phone: String,
    /// Relationship label.
    pub relationship: Relationship,
    /// Notified ahead of non-primary contacts.
    pub is_primary: bool,
}

/// Contact fields supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Relationship label.
    pub relationship: Relationship,
}

impl NewContact {
    /// Contact with the default relationship.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self { name: name.into(), phone: phone.into(), relationship: Relationship::default() }
    }

    /// Set the relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = relationship;
        self
    }

    /// Trim fields and reject empty ones.
    pub fn validate(self) -> Result<Self, InputError> {
        let name = self.name.trim().to_string();
        let phone = self.phone.trim().to_string();
        if name.is_empty() {
            return Err(InputError::EmptyField { field: "name" });
        }
        if phone.is_empty() {
            return Err(InputError::EmptyField { field: "phone" });
        }
        Ok(Self { name, phone, relationship: self.relationship })
    }
}

/// The session's emergency contacts, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactBook {
    contacts: Vec<EmergencyContact>,
}

impl ContactBook {
    /// Empty contact book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Book restored from storage. Order is preserved.
    pub fn from_contacts(contacts: Vec<EmergencyContact>) -> Self {
        Self { contacts }
    }

    /// Add a contact under `id`.
    ///
    /// The first contact added to an empty book becomes primary.
    pub fn add(&mut self, id: ContactId, contact: NewContact) -> Result<&EmergencyContact, InputError> {
        let contact = contact.validate()?;
        let is_primary = self.contacts.is_empty();
        let index = self.contacts.len();
        self.contacts.push(EmergencyContact {
            id,
            name: contact.name,
            phone: contact.phone,
            relationship: contact.relationship,
            is_primary,
        });
        Ok(&self.contacts[index])
    }

    /// Replace the editable fields of a contact. The primary flag is kept.
    pub fn update(&mut self, id: &ContactId, contact: NewContact) -> Result<(), InputError> {
        let contact = contact.validate()?;
        let existing = self.get_mut(id)?;
        existing.name = contact.name;
        existing.phone = contact.phone;
        existing.relationship = contact.relationship;
        Ok(())
    }

    /// Remove a contact. Unknown ids return `None`.
    pub fn remove(&mut self, id: &ContactId) -> Option<EmergencyContact> {
        let index = self.contacts.iter().position(|c| &c.id == id)?;
        Some(self.contacts.remove(index))
    }

    /// Flip the primary flag. Returns the new value.
    pub fn toggle_primary(&mut self, id: &ContactId) -> Result<bool, InputError> {
        let contact = self.get_mut(id)?;
        contact.is_primary = !contact.is_primary;
        Ok(contact.is_primary)
    }

    /// Look up a contact.
    pub fn get(&self, id: &ContactId) -> Option<&EmergencyContact> {
        self.contacts.iter().find(|c| &c.id == id)
    }

    /// Whether `id` is taken.
    pub fn contains(&self, id: &ContactId) -> bool {
        self.get(id).is_some()
    }

    /// Contacts in insertion order.
    pub fn contacts(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    /// Number of contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts in notification order: primaries, then the rest.
    pub fn dispatch_order(&self) -> Vec<&EmergencyContact> {
        let primaries = self.contacts.iter().filter(|c| c.is_primary);
        let others = self.contacts.iter().filter(|c| !c.is_primary);
        primaries.chain(others).collect()
    }

    /// Phone numbers in notification order.
    pub fn recipients(&self) -> Vec<String> {
        self.dispatch_order().into_iter().map(|c| c.phone.clone()).collect()
    }

    fn get_mut(&mut self, id: &ContactId) -> Result<&mut EmergencyContact, InputError> {
        self.contacts
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| InputError::UnknownContact(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(n: u64) -> ContactId {
        ContactId::from_random(n)
    }

    #[test]
    fn first_contact_becomes_primary() {
        let mut book = ContactBook::new();
        book.add(id(1), NewContact::new("Ana", "555-0101")).unwrap();
        book.add(id(2), NewContact::new("Ben", "555-0102")).unwrap();

        assert!(book.contacts()[0].is_primary);
        assert!(!book.contacts()[1].is_primary);
    }

    #[test]
    fn add_trims_and_rejects_empty_fields() {
        let mut book = ContactBook::new();
        let added = book.add(id(1), NewContact::new("  Ana ", " 555 ")).unwrap();
        assert_eq!(added.name, "Ana");
        assert_eq!(added.phone, "555");

        assert_eq!(
            book.add(id(2), NewContact::new("   ", "555")),
            Err(InputError::EmptyField { field: "name" })
        );
        assert_eq!(
            book.add(id(3), NewContact::new("Ben", "")),
            Err(InputError::EmptyField { field: "phone" })
        );
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn default_relationship_is_friend() {
        assert_eq!(NewContact::new("Ana", "1").relationship, Relationship::Friend);
    }

    #[test]
    fn relationship_parses_case_insensitively() {
        assert_eq!("parent".parse::<Relationship>(), Ok(Relationship::Parent));
        assert_eq!(" Neighbor ".parse::<Relationship>(), Ok(Relationship::Neighbor));
        assert!("boss".parse::<Relationship>().is_err());
    }

    #[test]
    fn toggle_primary_flips_and_reports_unknown() {
        let mut book = ContactBook::new();
        book.add(id(1), NewContact::new("Ana", "1")).unwrap();

        assert_eq!(book.toggle_primary(&id(1)), Ok(false));
        assert_eq!(book.toggle_primary(&id(1)), Ok(true));
        assert_eq!(book.toggle_primary(&id(9)), Err(InputError::UnknownContact(id(9))));
    }

    #[test]
    fn update_keeps_primary_flag() {
        let mut book = ContactBook::new();
        book.add(id(1), NewContact::new("Ana", "1")).unwrap();
        book.update(&id(1), NewContact::new("Ana Maria", "2").with_relationship(Relationship::Sibling))
            .unwrap();

        let contact = book.get(&id(1)).unwrap();
        assert_eq!(contact.name, "Ana Maria");
        assert_eq!(contact.phone, "2");
        assert_eq!(contact.relationship, Relationship::Sibling);
        assert!(contact.is_primary);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut book = ContactBook::new();
        book.add(id(1), NewContact::new("Ana", "1")).unwrap();
        assert!(book.remove(&id(2)).is_none());
        assert_eq!(book.len(), 1);
        assert!(book.remove(&id(1)).is_some());
        assert!(book.is_empty());
    }

    #[test]
    fn multiple_primaries_keep_insertion_order() {
        let mut book = ContactBook::new();
        book.add(id(1), NewContact::new("Ana", "1")).unwrap();
        book.add(id(2), NewContact::new("Ben", "2")).unwrap();
        book.add(id(3), NewContact::new("Cleo", "3")).unwrap();
        book.add(id(4), NewContact::new("Dev", "4")).unwrap();
        book.toggle_primary(&id(3)).unwrap();

        assert_eq!(book.recipients(), vec!["1", "3", "2", "4"]);
    }

    proptest! {
        #[test]
        fn dispatch_order_is_stable_partition(flags in prop::collection::vec(any::<bool>(), 0..16)) {
            let mut book = ContactBook::new();
            for (i, _) in flags.iter().enumerate() {
                book.add(id(i as u64), NewContact::new(format!("c{i}"), format!("{i}"))).unwrap();
            }
            for (i, flag) in flags.iter().enumerate() {
                if book.get(&id(i as u64)).unwrap().is_primary != *flag {
                    book.toggle_primary(&id(i as u64)).unwrap();
                }
            }

            let order = book.dispatch_order();
            prop_assert_eq!(order.len(), flags.len());

            let split = order.iter().position(|c| !c.is_primary).unwrap_or(order.len());
            prop_assert!(order[..split].iter().all(|c| c.is_primary));
            prop_assert!(order[split..].iter().all(|c| !c.is_primary));

            for group in [&order[..split], &order[split..]] {
                let positions: Vec<usize> = group
                    .iter()
                    .map(|c| book.contacts().iter().position(|x| x.id == c.id).unwrap())
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
