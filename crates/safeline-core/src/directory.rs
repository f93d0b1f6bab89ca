//! One-tap emergency helplines.
//!
//! A fixed directory; nothing here is user-editable or persisted. Dialing is
//! the platform's job, so each entry only knows how to describe itself as a
//! `tel:` link.

use std::fmt;

/// A public helpline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Helpline {
    /// Service name.
    pub name: &'static str,
    /// Short dial code.
    pub number: &'static str,
}

impl Helpline {
    /// Link that asks the platform dialer to call this line.
    pub fn dial_uri(self) -> String {
        format!("tel:{}", self.number)
    }
}

impl fmt::Display for Helpline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.number)
    }
}

/// Every helpline, in display order.
pub const HELPLINES: [Helpline; 5] = [
    Helpline { name: "National Emergency", number: "112" },
    Helpline { name: "Police", number: "100" },
    Helpline { name: "Women Helpline", number: "1091" },
    Helpline { name: "Ambulance", number: "102" },
    Helpline { name: "Domestic Abuse", number: "181" },
];

/// Helpline by dial code or by name, case-insensitive.
pub fn find_helpline(query: &str) -> Option<Helpline> {
    let query = query.trim();
    HELPLINES
        .into_iter()
        .find(|line| line.number == query || line.name.eq_ignore_ascii_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_emergency_comes_first() {
        assert_eq!(HELPLINES[0].number, "112");
        assert_eq!(HELPLINES[0].dial_uri(), "tel:112");
    }

    #[test]
    fn numbers_are_unique() {
        let mut numbers: Vec<_> = HELPLINES.iter().map(|line| line.number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), HELPLINES.len());
    }

    #[test]
    fn lookup_by_number_or_name() {
        assert_eq!(find_helpline("1091").map(|l| l.name), Some("Women Helpline"));
        assert_eq!(find_helpline(" police ").map(|l| l.number), Some("100"));
        assert_eq!(find_helpline("999"), None);
    }
}
