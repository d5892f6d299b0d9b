use rollcall_core::db::open_db_in_memory;
use rollcall_core::{
    AttendanceStatus, Classroom, ClassroomRepository, Material, MaterialInput, MaterialKind,
    MaterialRepository, NewSession, RepoError, RosterEntry, RosterSource, SessionStore,
    SqliteClassroomRepository, SqliteMaterialRepository, SqliteSessionRepository, StatusUpdate,
    TeacherRef,
};

#[test]
fn classroom_roundtrip_preserves_membership_shapes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClassroomRepository::new(&conn);

    let mut classroom = Classroom::new("bio-101", "Biology");
    classroom.owner_email = Some("teach@school.edu".to_string());
    classroom.teachers = vec![
        TeacherRef::Email("co@school.edu".to_string()),
        TeacherRef::Object {
            email: "aide@school.edu".to_string(),
        },
    ];
    repo.upsert_classroom(&classroom).unwrap();

    let loaded = repo.get_classroom("bio-101").unwrap().unwrap();
    assert_eq!(loaded, classroom);

    classroom.name = "Biology II".to_string();
    repo.upsert_classroom(&classroom).unwrap();
    assert_eq!(
        repo.get_classroom("bio-101").unwrap().unwrap().name,
        "Biology II"
    );
    assert!(repo.get_classroom("missing").unwrap().is_none());
}

#[test]
fn roster_keeps_order_and_replaces_atomically() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded_classroom(&conn);

    repo.replace_roster(
        "bio-101",
        &[
            RosterEntry::new("zed@x.com", "Zed"),
            RosterEntry::new("amy@x.com", "Amy"),
        ],
    )
    .unwrap();
    let roster = repo.list_roster("bio-101").unwrap();
    assert_eq!(roster[0].email, "zed@x.com");
    assert_eq!(roster[1].email, "amy@x.com");

    let err = repo
        .replace_roster(
            "bio-101",
            &[RosterEntry::new("new@x.com", "New"), RosterEntry::new(" ", "Blank")],
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.list_roster("bio-101").unwrap().len(), 2);
}

#[test]
fn roster_for_unknown_classroom_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClassroomRepository::new(&conn);
    let err = repo.list_roster("nope").unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "classroom", .. }));
}

#[test]
fn create_session_validates_and_lists_by_date() {
    let conn = open_db_in_memory().unwrap();
    seeded_classroom(&conn);
    let sessions = SqliteSessionRepository::new(&conn);

    let later = sessions
        .create_session(&new_session("Week 2", "2026-09-08"))
        .unwrap();
    let earlier = sessions
        .create_session(&new_session("Week 1", "2026-09-01"))
        .unwrap();

    let listed = sessions.list_sessions("bio-101").unwrap();
    let ids: Vec<_> = listed.iter().map(|session| session.id.as_str()).collect();
    assert_eq!(ids, vec![earlier.id.as_str(), later.id.as_str()]);
    assert!(listed.iter().all(|session| session.attendance.is_empty()));

    let err = sessions
        .create_session(&new_session("Bad date", "09/01/2026"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    let err = sessions
        .create_session(&new_session("  ", "2026-09-01"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let mut orphan = new_session("Orphan", "2026-09-01");
    orphan.classroom_id = "missing".to_string();
    let err = sessions.create_session(&orphan).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "classroom", .. }));
}

#[test]
fn update_status_upserts_one_row_per_student() {
    let conn = open_db_in_memory().unwrap();
    seeded_classroom(&conn);
    let sessions = SqliteSessionRepository::new(&conn);
    let session = sessions
        .create_session(&new_session("Week 1", "2026-09-01"))
        .unwrap();

    sessions
        .update_status(&StatusUpdate {
            session_id: session.id.clone(),
            student_email: "Amy@X.com".to_string(),
            student_name: Some("Amy".to_string()),
            status: AttendanceStatus::Present,
            marked_at: Some(100),
            marked_by: Some("teach@school.edu".to_string()),
        })
        .unwrap();
    sessions
        .update_status(&StatusUpdate {
            session_id: session.id.clone(),
            student_email: "amy@x.com".to_string(),
            student_name: None,
            status: AttendanceStatus::Absent,
            marked_at: Some(200),
            marked_by: Some("teach@school.edu".to_string()),
        })
        .unwrap();

    let loaded = sessions.get_session(&session.id).unwrap().unwrap();
    assert_eq!(loaded.attendance.len(), 1);
    let record = &loaded.attendance[0];
    assert_eq!(record.status, AttendanceStatus::Absent);
    assert_eq!(record.marked_at, Some(200));
    assert_eq!(record.student_name.as_deref(), Some("Amy"));
    assert_eq!(record.student_email.as_deref(), Some("amy@x.com"));
}

#[test]
fn update_status_rejects_unknown_session_and_blank_email() {
    let conn = open_db_in_memory().unwrap();
    seeded_classroom(&conn);
    let sessions = SqliteSessionRepository::new(&conn);

    let mut update = StatusUpdate {
        session_id: "missing".to_string(),
        student_email: "amy@x.com".to_string(),
        student_name: None,
        status: AttendanceStatus::Present,
        marked_at: None,
        marked_by: None,
    };
    let err = sessions.update_status(&update).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "session", .. }));

    update.student_email = "  ".to_string();
    let err = sessions.update_status(&update).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn delete_session_cascades_attendance() {
    let conn = open_db_in_memory().unwrap();
    seeded_classroom(&conn);
    let sessions = SqliteSessionRepository::new(&conn);
    let session = sessions
        .create_session(&new_session("Week 1", "2026-09-01"))
        .unwrap();
    sessions
        .update_status(&StatusUpdate {
            session_id: session.id.clone(),
            student_email: "amy@x.com".to_string(),
            student_name: None,
            status: AttendanceStatus::Present,
            marked_at: Some(1),
            marked_by: None,
        })
        .unwrap();

    sessions.delete_session(&session.id).unwrap();
    assert!(sessions.get_session(&session.id).unwrap().is_none());
    let orphans: i64 = conn
        .query_row("SELECT COUNT(*) FROM attendance;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphans, 0);

    let err = sessions.delete_session(&session.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "session", .. }));
}

#[test]
fn materials_store_their_ingested_kind() {
    let conn = open_db_in_memory().unwrap();
    seeded_classroom(&conn);
    let repo = SqliteMaterialRepository::new(&conn);

    let video = Material::ingest(MaterialInput {
        title: "Mitosis explained".to_string(),
        url: Some("https://youtu.be/abc".to_string()),
        ..MaterialInput::default()
    });
    let worksheet = Material::ingest(MaterialInput {
        title: "Worksheet".to_string(),
        file_name: Some("cells.pdf".to_string()),
        ..MaterialInput::default()
    });
    repo.add_material("bio-101", &video).unwrap();
    repo.add_material("bio-101", &worksheet).unwrap();

    let all = repo.list_materials("bio-101", None).unwrap();
    assert_eq!(all, vec![video.clone(), worksheet]);
    let videos = repo
        .list_materials("bio-101", Some(MaterialKind::Video))
        .unwrap();
    assert_eq!(videos, vec![video]);
    assert!(repo
        .list_materials("bio-101", Some(MaterialKind::Link))
        .unwrap()
        .is_empty());
}

fn seeded_classroom(conn: &rusqlite::Connection) -> SqliteClassroomRepository<'_> {
    let repo = SqliteClassroomRepository::new(conn);
    let mut classroom = Classroom::new("bio-101", "Biology");
    classroom.owner_email = Some("teach@school.edu".to_string());
    repo.upsert_classroom(&classroom).unwrap();
    repo
}

fn new_session(title: &str, date: &str) -> NewSession {
    NewSession {
        classroom_id: "bio-101".to_string(),
        title: title.to_string(),
        description: String::new(),
        date: date.to_string(),
    }
}
