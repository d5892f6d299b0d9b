//! Status changes on a merged view.

use super::merge::{sort_by_label, SortOrder};
use super::{EngineError, EngineResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::roster::normalize_email;

/// Returns a copy of `merged` with `email`'s status replaced and stamped.
///
/// Every row whose email matches (case-insensitive) is updated; other rows
/// are untouched. The input is not modified, so callers keep it as the
/// rollback point.
///
/// # Errors
/// - `EngineError::StudentNotInView` when no row matches `email`.
pub fn set_status(
    merged: &[AttendanceRecord],
    email: &str,
    status: AttendanceStatus,
    marked_by: &str,
    now_ms: i64,
    order: SortOrder,
) -> EngineResult<Vec<AttendanceRecord>> {
    let wanted = normalize_email(email);
    let mut next = merged.to_vec();
    let mut matched = false;

    for record in next
        .iter_mut()
        .filter(|record| !wanted.is_empty() && record.key().as_deref() == Some(wanted.as_str()))
    {
        record.status = status;
        record.marked_at = Some(now_ms);
        record.marked_by = Some(marked_by.to_string());
        matched = true;
    }

    if !matched {
        return Err(EngineError::StudentNotInView(email.to_string()));
    }
    if order == SortOrder::Name {
        sort_by_label(&mut next);
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::set_status;
    use crate::engine::merge::{merge_attendance, SortOrder};
    use crate::engine::EngineError;
    use crate::model::attendance::AttendanceStatus;
    use crate::model::roster::RosterEntry;

    #[test]
    fn set_status_stamps_only_the_target() {
        let roster = vec![
            RosterEntry::new("a@x.com", "Alice"),
            RosterEntry::new("b@x.com", "Bob"),
        ];
        let merged = merge_attendance(&[], &roster, "t@x.com", SortOrder::Name);
        let next = set_status(
            &merged,
            "B@X.com",
            AttendanceStatus::Present,
            "t@x.com",
            1_700_000_000_000,
            SortOrder::Name,
        )
        .expect("bob is in the view");

        assert_eq!(next[0].status, AttendanceStatus::Unmarked);
        assert_eq!(next[0].marked_at, None);
        assert_eq!(next[1].status, AttendanceStatus::Present);
        assert_eq!(next[1].marked_at, Some(1_700_000_000_000));
        assert_eq!(next[1].marked_by.as_deref(), Some("t@x.com"));
        assert_eq!(merged[1].status, AttendanceStatus::Unmarked);
    }

    #[test]
    fn unknown_student_is_rejected() {
        let roster = vec![RosterEntry::new("a@x.com", "Alice")];
        let merged = merge_attendance(&[], &roster, "t@x.com", SortOrder::Roster);
        let err = set_status(
            &merged,
            "ghost@x.com",
            AttendanceStatus::Absent,
            "t@x.com",
            1,
            SortOrder::Roster,
        )
        .expect_err("ghost is not in the view");
        assert_eq!(err, EngineError::StudentNotInView("ghost@x.com".to_string()));
    }
}
