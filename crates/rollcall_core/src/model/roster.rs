//! Roster entries and email normalization.

use serde::{Deserialize, Serialize};

/// One enrolled participant of a classroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub email: String,
    pub name: String,
}

impl RosterEntry {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Lookup key for this entry.
    pub fn key(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Canonical lookup key for an email address.
///
/// Trims surrounding whitespace and lower-cases. Returns an empty string for
/// blank input; callers treat an empty key as "no identity".
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Case-insensitive email equality.
pub fn same_email(left: &str, right: &str) -> bool {
    normalize_email(left) == normalize_email(right)
}
