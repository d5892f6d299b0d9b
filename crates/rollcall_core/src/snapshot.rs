//! JSON classroom snapshots.
//!
//! A snapshot is the shape the classroom backend hands out for one
//! classroom: metadata, roster, sessions with raw attendance and optional
//! materials. `import_snapshot` loads it into the SQLite stores.

use crate::model::attendance::Session;
use crate::model::classroom::Classroom;
use crate::model::material::{Material, MaterialInput};
use crate::model::roster::RosterEntry;
use crate::repo::classroom_repo::{ClassroomRepository, RosterSource, SqliteClassroomRepository};
use crate::repo::material_repo::{MaterialRepository, SqliteMaterialRepository};
use crate::repo::RepoError;
use log::info;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomSnapshot {
    pub classroom: Classroom,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub materials: Vec<MaterialInput>,
}

#[derive(Debug)]
pub enum SnapshotError {
    Parse(serde_json::Error),
    Repo(RepoError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid classroom snapshot: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SnapshotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

impl ClassroomSnapshot {
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sessions with `classroom_id` defaulted to the snapshot's classroom.
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .cloned()
            .map(|mut session| {
                if session.classroom_id.is_empty() {
                    session.classroom_id = self.classroom.id.clone();
                }
                session
            })
            .collect()
    }
}

/// Writes `snapshot` into the stores in one transaction.
///
/// Every stored session of the classroom is replaced by the snapshot's
/// sessions, raw attendance included, so sessions missing from the snapshot
/// are gone afterwards. Materials for the classroom are replaced and
/// re-classified. Records without an email are skipped since the store
/// keys rows by email.
pub fn import_snapshot(conn: &Connection, snapshot: &ClassroomSnapshot) -> Result<(), SnapshotError> {
    let tx = conn.unchecked_transaction()?;
    let classrooms = SqliteClassroomRepository::new(&tx);
    classrooms.upsert_classroom(&snapshot.classroom)?;
    classrooms.replace_roster(&snapshot.classroom.id, &snapshot.roster)?;

    // Attendance rows follow through the session foreign key cascade.
    let removed_sessions = tx.execute(
        "DELETE FROM sessions WHERE classroom_id = ?1;",
        [&snapshot.classroom.id],
    )?;

    let mut attendance_rows = 0usize;
    for session in snapshot.sessions() {
        // A session filed under another classroom may still share the id.
        tx.execute("DELETE FROM sessions WHERE id = ?1;", [&session.id])?;
        tx.execute(
            "INSERT INTO sessions (id, classroom_id, title, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                session.id,
                session.classroom_id,
                session.title,
                session.description,
                session.date,
            ],
        )?;
        for record in &session.attendance {
            let (Some(key), Some(email)) = (record.key(), record.student_email.as_deref()) else {
                continue;
            };
            tx.execute(
                "INSERT INTO attendance (
                    session_id, email_key, student_email, student_name, status, marked_at, marked_by
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(session_id, email_key) DO UPDATE SET
                    student_email = excluded.student_email,
                    student_name = excluded.student_name,
                    status = excluded.status,
                    marked_at = excluded.marked_at,
                    marked_by = excluded.marked_by;",
                params![
                    session.id,
                    key,
                    email.trim(),
                    record.student_name,
                    record.status.as_str(),
                    record.marked_at,
                    record.marked_by,
                ],
            )?;
            attendance_rows += 1;
        }
    }

    tx.execute(
        "DELETE FROM materials WHERE classroom_id = ?1;",
        [&snapshot.classroom.id],
    )?;
    let materials = SqliteMaterialRepository::new(&tx);
    for input in &snapshot.materials {
        materials.add_material(&snapshot.classroom.id, &Material::ingest(input.clone()))?;
    }

    tx.commit()?;
    info!(
        "event=snapshot_import module=snapshot status=ok classroom_id={} roster={} sessions={} removed_sessions={} attendance_rows={} materials={}",
        snapshot.classroom.id,
        snapshot.roster.len(),
        snapshot.sessions.len(),
        removed_sessions,
        attendance_rows,
        snapshot.materials.len()
    );
    Ok(())
}
