//! Attendance counts and percentages.
//!
//! Percentages are whole numbers rounded half-up, and `0` when the
//! denominator is `0`.

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Session};
use serde::{Deserialize, Serialize};

/// Counts over one merged attendance view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub present_count: u32,
    pub absent_count: u32,
    pub unmarked_count: u32,
    pub total_students: u32,
    pub attendance_percentage: u32,
}

/// Counts summed over many sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub present_count: u32,
    pub absent_count: u32,
    /// Teacher view: every attendance entry. Student view: sessions where
    /// the student was marked present or absent.
    pub denominator: u32,
    pub attendance_percentage: u32,
}

/// `round(part / whole * 100)` with half-up rounding; `0` for an empty whole.
pub fn attendance_percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    ((part * 200 + whole) / (whole * 2)) as u32
}

/// Derives counts from a merged view.
pub fn compute_stats(merged: &[AttendanceRecord]) -> AttendanceStats {
    let mut stats = AttendanceStats::default();
    for record in merged {
        match record.status {
            AttendanceStatus::Present => stats.present_count += 1,
            AttendanceStatus::Absent => stats.absent_count += 1,
            AttendanceStatus::Unmarked => stats.unmarked_count += 1,
        }
    }
    stats.total_students = merged.len() as u32;
    stats.attendance_percentage = attendance_percentage(stats.present_count, stats.total_students);
    stats
}

/// Owner view across sessions: every stored record counts toward the
/// denominator, including unmarked ones.
pub fn aggregate_for_teacher(sessions: &[Session]) -> AggregateStats {
    let mut aggregate = AggregateStats::default();
    for session in sessions {
        let per_session = compute_stats(&session.attendance);
        aggregate.present_count += per_session.present_count;
        aggregate.absent_count += per_session.absent_count;
        aggregate.denominator += per_session.total_students;
    }
    aggregate.attendance_percentage =
        attendance_percentage(aggregate.present_count, aggregate.denominator);
    aggregate
}

/// Student view across sessions: only the student's own record, and only
/// sessions where that record is present or absent count toward the
/// denominator.
pub fn aggregate_for_student(sessions: &[Session], student_email: &str) -> AggregateStats {
    let mut aggregate = AggregateStats::default();
    for record in sessions
        .iter()
        .filter_map(|session| session.record_for(student_email))
    {
        match record.status {
            AttendanceStatus::Present => aggregate.present_count += 1,
            AttendanceStatus::Absent => aggregate.absent_count += 1,
            AttendanceStatus::Unmarked => continue,
        }
        aggregate.denominator += 1;
    }
    aggregate.attendance_percentage =
        attendance_percentage(aggregate.present_count, aggregate.denominator);
    aggregate
}
