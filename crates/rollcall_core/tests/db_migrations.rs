use rollcall_core::db::migrations::latest_version;
use rollcall_core::db::{open_db, open_db_in_memory, DbError, ATTENDANCE_TABLES};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ATTENDANCE_TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn reopening_a_database_file_keeps_its_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO classrooms (id, name) VALUES ('bio-101', 'Biology');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let name: String = second
        .query_row("SELECT name FROM classrooms WHERE id = 'bio-101';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(name, "Biology");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn current_version_without_store_tables_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE notes (id TEXT PRIMARY KEY);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::MissingTable { table, db_version } => {
            assert_eq!(table, "classrooms");
            assert_eq!(db_version, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unopenable_file_error_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("rollcall.sqlite3");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(&err, DbError::Open { path: failed, .. } if failed == &path));
    assert!(err.to_string().contains("rollcall.sqlite3"));
}

#[test]
fn attendance_status_is_constrained_by_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO classrooms (id, name) VALUES ('bio-101', 'Biology');
         INSERT INTO sessions (id, classroom_id, title, date)
         VALUES ('s1', 'bio-101', 'Week 1', '2026-09-01');",
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO attendance (session_id, email_key, student_email, status)
         VALUES ('s1', 'a@x.com', 'a@x.com', 'late');",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
