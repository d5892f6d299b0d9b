//! Display-name collation.
//!
//! # Responsibility
//! - Build sort keys that order names the way people read them: accents and
//!   case do not push a name past the end of the alphabet.
//!
//! # Invariants
//! - Primary comparison ignores case and diacritics (`Émile` sorts with `E`).
//! - Names equal at the primary level fall back to the lower-cased
//!   composed form, so `Elan` precedes `Élan`.
//! - Keys compare totally; callers keep stable sorts for exact ties.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sort key for a human-facing label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: String,
    secondary: String,
}

impl CollationKey {
    pub fn new(label: &str) -> Self {
        let trimmed = label.trim();
        let primary = trimmed
            .nfd()
            .filter(|ch| !is_combining_mark(*ch))
            .flat_map(char::to_lowercase)
            .collect();
        let secondary = trimmed.nfc().flat_map(char::to_lowercase).collect();
        Self { primary, secondary }
    }
}
