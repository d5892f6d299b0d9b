//! Roster merge.

use crate::model::attendance::AttendanceRecord;
use crate::model::collation::CollationKey;
use crate::model::roster::{normalize_email, RosterEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Output ordering for merged views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Keep roster order.
    Roster,
    /// Ascending by name (email when the name is missing), ignoring case
    /// and accents.
    #[default]
    Name,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "roster" => Some(Self::Roster),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

/// Merges raw session attendance with the roster.
///
/// - Raw records are keyed by normalized email; later duplicates overwrite
///   earlier ones. Records without an email are skipped.
/// - Roster entries matching `teacher_email` are dropped.
/// - Each remaining roster entry yields its stored record unchanged, or an
///   `unmarked` placeholder.
/// - Repeated roster emails each yield their own row.
pub fn merge_attendance(
    raw: &[AttendanceRecord],
    roster: &[RosterEntry],
    teacher_email: &str,
    order: SortOrder,
) -> Vec<AttendanceRecord> {
    let mut by_email: HashMap<String, &AttendanceRecord> = HashMap::with_capacity(raw.len());
    for record in raw {
        if let Some(key) = record.key() {
            by_email.insert(key, record);
        }
    }

    let teacher_key = normalize_email(teacher_email);
    let mut merged: Vec<AttendanceRecord> = roster
        .iter()
        .filter(|entry| teacher_key.is_empty() || entry.key() != teacher_key)
        .map(|entry| match by_email.get(&entry.key()) {
            Some(record) => (*record).clone(),
            None => AttendanceRecord::unmarked_for(entry),
        })
        .collect();

    if order == SortOrder::Name {
        sort_by_label(&mut merged);
    }
    merged
}

/// Stable sort by display label, ignoring case and accents.
pub fn sort_by_label(records: &mut [AttendanceRecord]) {
    records.sort_by_cached_key(|record| CollationKey::new(record.display_label()));
}
