//! Caller identity resolved against a classroom's owner set.

use crate::model::classroom::OwnerSet;
use crate::model::roster::normalize_email;

/// Current caller as seen by attendance use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Normalized caller email.
    pub email: String,
    /// Whether the caller may mutate attendance in this classroom.
    pub is_owner: bool,
}

impl Caller {
    /// Resolves `email` against the classroom's owner set.
    pub fn resolve(email: &str, owners: &OwnerSet) -> Self {
        Self {
            email: normalize_email(email),
            is_owner: owners.is_owner(email),
        }
    }
}
