//! Digital safety card.
//!
//! One card per user. A default card always exists; saving overwrites it
//! wholesale.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative.
    #[serde(rename = "O-")]
    ONegative,
    /// Not known or not disclosed.
    #[default]
    Unknown,
}

impl BloodGroup {
    /// Every blood group, in display order.
    pub const ALL: [Self; 9] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::AbPositive,
        Self::AbNegative,
        Self::OPositive,
        Self::ONegative,
        Self::Unknown,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the group is known.
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BloodGroup {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InputError::UnknownBloodGroup(trimmed.to_string()))
    }
}

/// Medical and identity details shown to first responders.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyCard {
    /// Full legal name.
    pub full_name: String,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Known allergies, free text.
    pub allergies: String,
    /// Current medications, free text.
    pub medications: String,
    /// Medical conditions, free text.
    pub medical_conditions: String,
    /// Date of birth as entered.
    pub date_of_birth: String,
    /// Home address.
    pub address: String,
}

impl SafetyCard {
    /// Whether nothing has been filled in.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Trimmed full name, if set.
    pub fn display_name(&self) -> Option<&str> {
        let name = self.full_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

// Medical free text stays out of logs.
impl fmt::Debug for SafetyCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafetyCard")
            .field("full_name_present", &!self.full_name.is_empty())
            .field("blood_group", &self.blood_group)
            .field("allergies_present", &!self.allergies.is_empty())
            .field("medications_present", &!self.medications.is_empty())
            .field("medical_conditions_present", &!self.medical_conditions.is_empty())
            .field("date_of_birth_present", &!self.date_of_birth.is_empty())
            .field("address_present", &!self.address.is_empty())
            .finish()
    }
}
