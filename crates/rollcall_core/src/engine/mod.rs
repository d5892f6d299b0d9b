//! Roster reconciliation and attendance stats.
//!
//! # Responsibility
//! - Merge sparse session attendance against the authoritative roster.
//! - Derive per-session and cross-session counts from merged or raw data.
//! - Apply status changes to a merged view without touching persistence.
//!
//! # Invariants
//! - Every function here is pure: same inputs, same outputs.
//! - Merged length equals the teacher-filtered roster length.
//! - `present + absent + unmarked == total` for every stats value.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod merge;
pub mod stats;
pub mod update;

pub use merge::{merge_attendance, sort_by_label, SortOrder};
pub use stats::{
    aggregate_for_student, aggregate_for_teacher, attendance_percentage, compute_stats,
    AggregateStats, AttendanceStats,
};
pub use update::set_status;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The target email has no row in the merged view.
    StudentNotInView(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StudentNotInView(email) => {
                write!(f, "student is not part of the attendance view: {email}")
            }
        }
    }
}

impl Error for EngineError {}
