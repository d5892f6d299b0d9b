//! Attendance records and sessions.
//!
//! # Responsibility
//! - Define the per-session attendance record exactly as the session store
//!   supplies it (sparse, possibly stale, possibly missing an email).
//! - Provide the closed status set and its display/storage forms.
//!
//! # Invariants
//! - A record with a blank `student_email` never matches a roster entry.
//! - `marked_at` is Unix epoch milliseconds.

use crate::model::roster::{normalize_email, RosterEntry};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Attendance state of one student in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Unmarked,
}

impl AttendanceStatus {
    /// Stable storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Unmarked => "unmarked",
        }
    }

    /// Display label used by report output.
    pub fn capitalized(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Unmarked => "Unmarked",
        }
    }

    /// Parses a storage/wire value. Matching is exact.
    pub fn parse(value: &str) -> Result<Self, StatusParseError> {
        match value {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "unmarked" => Ok(Self::Unmarked),
            other => Err(StatusParseError(other.to_string())),
        }
    }

    /// Whether this status counts as a decision (present or absent).
    pub fn is_marked(self) -> bool {
        !matches!(self, Self::Unmarked)
    }
}

impl Display for AttendanceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown attendance status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParseError(pub String);

impl Display for StatusParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported attendance status `{}`; expected present|absent|unmarked",
            self.0
        )
    }
}

impl Error for StatusParseError {}

/// One student's attendance entry inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default)]
    pub student_email: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub marked_at: Option<i64>,
    #[serde(default)]
    pub marked_by: Option<String>,
}

impl AttendanceRecord {
    /// Placeholder record for a roster entry with no stored attendance.
    pub fn unmarked_for(entry: &RosterEntry) -> Self {
        Self {
            student_email: Some(entry.email.clone()),
            student_name: Some(entry.name.clone()),
            status: AttendanceStatus::Unmarked,
            marked_at: None,
            marked_by: None,
        }
    }

    /// Normalized email key, or `None` when the record carries no identity.
    pub fn key(&self) -> Option<String> {
        self.student_email
            .as_deref()
            .map(normalize_email)
            .filter(|key| !key.is_empty())
    }

    /// Label used for name ordering: the name when non-empty, else the email.
    pub fn display_label(&self) -> &str {
        self.student_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.student_email.as_deref())
            .unwrap_or("")
    }
}

/// A single attendance-taking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub classroom_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
}

impl Session {
    /// Finds this session's record for `email`, last one wins.
    pub fn record_for(&self, email: &str) -> Option<&AttendanceRecord> {
        let wanted = normalize_email(email);
        if wanted.is_empty() {
            return None;
        }
        self.attendance
            .iter()
            .rev()
            .find(|record| record.key().as_deref() == Some(wanted.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::{AttendanceRecord, AttendanceStatus, Session};
    use crate::model::roster::RosterEntry;

    #[test]
    fn status_parse_roundtrip_and_rejects_unknown() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Unmarked,
        ] {
            assert_eq!(AttendanceStatus::parse(status.as_str()), Ok(status));
        }
        assert!(AttendanceStatus::parse("Present").is_err());
        assert!(AttendanceStatus::parse("late").is_err());
    }

    #[test]
    fn record_deserializes_camel_case_with_nulls() {
        let record: AttendanceRecord = serde_json::from_str(
            r#"{"studentEmail":null,"studentName":null,"status":"absent","markedAt":null,"markedBy":null}"#,
        )
        .expect("record json should parse");
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.key(), None);
    }

    #[test]
    fn blank_email_has_no_key() {
        let record = AttendanceRecord {
            student_email: Some("   ".to_string()),
            student_name: None,
            status: AttendanceStatus::Present,
            marked_at: None,
            marked_by: None,
        };
        assert_eq!(record.key(), None);
    }

    #[test]
    fn display_label_falls_back_to_email() {
        let mut record = AttendanceRecord::unmarked_for(&RosterEntry::new("z@x.com", "Zed"));
        assert_eq!(record.display_label(), "Zed");
        record.student_name = None;
        assert_eq!(record.display_label(), "z@x.com");
        record.student_name = Some(String::new());
        assert_eq!(record.display_label(), "z@x.com");
        record.student_name = Some("  ".to_string());
        assert_eq!(record.display_label(), "  ");
    }

    #[test]
    fn session_record_for_is_case_insensitive() {
        let session = Session {
            id: "s1".to_string(),
            classroom_id: "c1".to_string(),
            title: "Week 1".to_string(),
            description: String::new(),
            date: "2026-09-01".to_string(),
            attendance: vec![AttendanceRecord {
                student_email: Some("Foo@Bar.com".to_string()),
                student_name: None,
                status: AttendanceStatus::Present,
                marked_at: Some(1),
                marked_by: None,
            }],
        };
        assert!(session.record_for("foo@bar.com").is_some());
        assert!(session.record_for("").is_none());
    }
}
