//! Attendance store bootstrap.
//!
//! # Responsibility
//! - Open the attendance database and bring it to the latest schema.
//! - Refuse files that claim a rollcall schema version but lack its tables.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A returned connection has every table in `ATTENDANCE_TABLES`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Tables every migrated attendance store carries.
pub const ATTENDANCE_TABLES: [&str; 5] = [
    "classrooms",
    "roster_entries",
    "sessions",
    "attendance",
    "materials",
];

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    Sqlite(rusqlite::Error),
    /// The file was written by a newer rollcall build.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// `user_version` says migrated, but a store table is absent.
    MissingTable { table: &'static str, db_version: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open attendance store `{}`: {source}", path.display())
            }
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "attendance store schema {db_version} is newer than supported {latest_supported}"
            ),
            Self::MissingTable { table, db_version } => write!(
                f,
                "not an attendance store: schema {db_version} has no `{table}` table"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Sqlite(source) => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::MissingTable { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
