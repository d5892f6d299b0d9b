//! Session and attendance storage.
//!
//! # Responsibility
//! - Persist sessions and their sparse attendance rows.
//! - Accept single-student status mutations keyed by session and email.
//!
//! # Invariants
//! - `date` is stored as `YYYY-MM-DD`; writes reject anything else.
//! - `update_status` is an upsert; the last write for a student wins.
//! - Sessions list in `date ASC, created_at ASC, id ASC` order.

use super::{RepoError, RepoResult};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Session};
use crate::model::roster::normalize_email;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const SESSION_SELECT_SQL: &str = "SELECT id, classroom_id, title, description, date FROM sessions";

/// Input for creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub classroom_id: String,
    pub title: String,
    pub description: String,
    pub date: String,
}

/// One student's status mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub session_id: String,
    pub student_email: String,
    pub student_name: Option<String>,
    pub status: AttendanceStatus,
    pub marked_at: Option<i64>,
    pub marked_by: Option<String>,
}

impl StatusUpdate {
    /// Builds an update carrying the stamped fields of `record`.
    pub fn from_record(session_id: &str, record: &AttendanceRecord) -> Option<Self> {
        Some(Self {
            session_id: session_id.to_string(),
            student_email: record.student_email.clone().filter(|_| record.key().is_some())?,
            student_name: record.student_name.clone(),
            status: record.status,
            marked_at: record.marked_at,
            marked_by: record.marked_by.clone(),
        })
    }
}

/// Session store contract consumed by the attendance service.
pub trait SessionStore {
    fn create_session(&self, input: &NewSession) -> RepoResult<Session>;
    fn get_session(&self, session_id: &str) -> RepoResult<Option<Session>>;
    fn list_sessions(&self, classroom_id: &str) -> RepoResult<Vec<Session>>;
    fn update_status(&self, update: &StatusUpdate) -> RepoResult<()>;
    fn delete_session(&self, session_id: &str) -> RepoResult<()>;
}

/// SQLite-backed session store.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_attendance(&self, session_id: &str) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_email, student_name, status, marked_at, marked_by
             FROM attendance
             WHERE session_id = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([session_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let status_text: String = row.get(2)?;
            let status = AttendanceStatus::parse(&status_text).map_err(|err| {
                RepoError::InvalidData(format!("attendance.status for `{session_id}`: {err}"))
            })?;
            records.push(AttendanceRecord {
                student_email: Some(row.get(0)?),
                student_name: row.get(1)?,
                status,
                marked_at: row.get(3)?,
                marked_by: row.get(4)?,
            });
        }
        Ok(records)
    }

    fn hydrate(&self, rows: Vec<SessionRow>) -> RepoResult<Vec<Session>> {
        rows.into_iter()
            .map(|row| -> RepoResult<Session> {
                let attendance = self.load_attendance(&row.id)?;
                Ok(Session {
                    id: row.id,
                    classroom_id: row.classroom_id,
                    title: row.title,
                    description: row.description,
                    date: row.date,
                    attendance,
                })
            })
            .collect()
    }
}

struct SessionRow {
    id: String,
    classroom_id: String,
    title: String,
    description: String,
    date: String,
}

fn parse_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        classroom_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
    })
}

impl SessionStore for SqliteSessionRepository<'_> {
    fn create_session(&self, input: &NewSession) -> RepoResult<Session> {
        validate_new_session(input)?;
        let id = Uuid::new_v4().to_string();

        let inserted = self.conn.execute(
            "INSERT INTO sessions (id, classroom_id, title, description, date)
             SELECT ?1, id, ?3, ?4, ?5 FROM classrooms WHERE id = ?2;",
            params![
                id,
                input.classroom_id,
                input.title.trim(),
                input.description,
                input.date.trim(),
            ],
        )?;
        if inserted == 0 {
            return Err(RepoError::not_found("classroom", input.classroom_id.as_str()));
        }

        Ok(Session {
            id,
            classroom_id: input.classroom_id.clone(),
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            date: input.date.trim().to_string(),
            attendance: Vec::new(),
        })
    }

    fn get_session(&self, session_id: &str) -> RepoResult<Option<Session>> {
        let row = self
            .conn
            .query_row(
                &format!("{SESSION_SELECT_SQL} WHERE id = ?1;"),
                [session_id],
                parse_session_row,
            )
            .optional()?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_sessions(&self, classroom_id: &str) -> RepoResult<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT_SQL}
             WHERE classroom_id = ?1
             ORDER BY date ASC, created_at ASC, id ASC;"
        ))?;
        let rows = stmt
            .query_map([classroom_id], parse_session_row)?
            .collect::<Result<Vec<_>, _>>()?;
        self.hydrate(rows)
    }

    fn update_status(&self, update: &StatusUpdate) -> RepoResult<()> {
        let email_key = normalize_email(&update.student_email);
        if email_key.is_empty() {
            return Err(RepoError::Validation(
                "student email must not be empty".to_string(),
            ));
        }

        let changed = self.conn.execute(
            "INSERT INTO attendance (
                session_id,
                email_key,
                student_email,
                student_name,
                status,
                marked_at,
                marked_by
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7 FROM sessions WHERE id = ?1
            ON CONFLICT(session_id, email_key) DO UPDATE SET
                student_email = excluded.student_email,
                student_name = COALESCE(excluded.student_name, attendance.student_name),
                status = excluded.status,
                marked_at = excluded.marked_at,
                marked_by = excluded.marked_by;",
            params![
                update.session_id,
                email_key,
                update.student_email.trim(),
                update.student_name.as_deref(),
                update.status.as_str(),
                update.marked_at,
                update.marked_by.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("session", update.session_id.as_str()));
        }
        Ok(())
    }

    fn delete_session(&self, session_id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1;", [session_id])?;
        if changed == 0 {
            return Err(RepoError::not_found("session", session_id));
        }
        Ok(())
    }
}

fn validate_new_session(input: &NewSession) -> RepoResult<()> {
    if input.title.trim().is_empty() {
        return Err(RepoError::Validation("session title must not be empty".to_string()));
    }
    NaiveDate::parse_from_str(input.date.trim(), "%Y-%m-%d").map_err(|err| {
        RepoError::Validation(format!(
            "session date `{}` must be YYYY-MM-DD: {err}",
            input.date
        ))
    })?;
    Ok(())
}
