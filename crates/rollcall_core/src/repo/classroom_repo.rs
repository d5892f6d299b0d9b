//! Classroom metadata and roster storage.
//!
//! # Invariants
//! - Roster order is the insertion order passed to `replace_roster`.
//! - Replacing a roster is atomic.

use super::{RepoError, RepoResult};
use crate::model::classroom::{Classroom, Member, TeacherRef};
use crate::model::roster::RosterEntry;
use rusqlite::{params, Connection, OptionalExtension};

/// Source of the authoritative roster for a classroom.
pub trait RosterSource {
    fn list_roster(&self, classroom_id: &str) -> RepoResult<Vec<RosterEntry>>;
    fn replace_roster(&self, classroom_id: &str, entries: &[RosterEntry]) -> RepoResult<()>;
}

/// Classroom metadata store.
pub trait ClassroomRepository {
    fn upsert_classroom(&self, classroom: &Classroom) -> RepoResult<()>;
    fn get_classroom(&self, classroom_id: &str) -> RepoResult<Option<Classroom>>;
}

/// SQLite-backed classroom and roster store.
pub struct SqliteClassroomRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClassroomRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_classroom(&self, classroom_id: &str) -> RepoResult<()> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM classrooms WHERE id = ?1;",
                [classroom_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(RepoError::not_found("classroom", classroom_id));
        }
        Ok(())
    }
}

impl ClassroomRepository for SqliteClassroomRepository<'_> {
    fn upsert_classroom(&self, classroom: &Classroom) -> RepoResult<()> {
        if classroom.id.trim().is_empty() {
            return Err(RepoError::Validation("classroom id must not be empty".to_string()));
        }
        let teachers_json = serde_json::to_string(&classroom.teachers)
            .map_err(|err| RepoError::Validation(format!("unserializable teachers: {err}")))?;
        let members_json = serde_json::to_string(&classroom.members)
            .map_err(|err| RepoError::Validation(format!("unserializable members: {err}")))?;

        self.conn.execute(
            "INSERT INTO classrooms (id, name, owner_email, teachers_json, members_json)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                owner_email = excluded.owner_email,
                teachers_json = excluded.teachers_json,
                members_json = excluded.members_json,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                classroom.id.as_str(),
                classroom.name.as_str(),
                classroom.owner_email.as_deref(),
                teachers_json,
                members_json,
            ],
        )?;
        Ok(())
    }

    fn get_classroom(&self, classroom_id: &str) -> RepoResult<Option<Classroom>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, owner_email, teachers_json, members_json
                 FROM classrooms
                 WHERE id = ?1;",
                [classroom_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, owner_email, teachers_json, members_json)) = row else {
            return Ok(None);
        };
        let teachers: Vec<TeacherRef> = serde_json::from_str(&teachers_json).map_err(|err| {
            RepoError::InvalidData(format!("classrooms.teachers_json for `{id}`: {err}"))
        })?;
        let members: Vec<Member> = serde_json::from_str(&members_json).map_err(|err| {
            RepoError::InvalidData(format!("classrooms.members_json for `{id}`: {err}"))
        })?;

        Ok(Some(Classroom {
            id,
            name,
            owner_email,
            teachers,
            members,
        }))
    }
}

impl RosterSource for SqliteClassroomRepository<'_> {
    fn list_roster(&self, classroom_id: &str) -> RepoResult<Vec<RosterEntry>> {
        self.require_classroom(classroom_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT email, name
             FROM roster_entries
             WHERE classroom_id = ?1
             ORDER BY position ASC;",
        )?;
        let entries = stmt
            .query_map([classroom_id], |row| {
                Ok(RosterEntry {
                    email: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn replace_roster(&self, classroom_id: &str, entries: &[RosterEntry]) -> RepoResult<()> {
        self.require_classroom(classroom_id)?;
        if let Some(blank) = entries.iter().position(|entry| entry.key().is_empty()) {
            return Err(RepoError::Validation(format!(
                "roster entry {blank} has an empty email"
            )));
        }

        // Joins the caller's transaction when one is already open.
        let tx = if self.conn.is_autocommit() {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };
        self.conn.execute(
            "DELETE FROM roster_entries WHERE classroom_id = ?1;",
            [classroom_id],
        )?;
        {
            let mut insert = self.conn.prepare(
                "INSERT INTO roster_entries (classroom_id, position, email, name)
                 VALUES (?1, ?2, ?3, ?4);",
            )?;
            for (position, entry) in entries.iter().enumerate() {
                insert.execute(params![
                    classroom_id,
                    position as i64,
                    entry.email.trim(),
                    entry.name.as_str(),
                ])?;
            }
        }
        if let Some(tx) = tx {
            tx.commit()?;
        }
        Ok(())
    }
}
