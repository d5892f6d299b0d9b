use rollcall_core::{
    compute_stats, merge_attendance, set_status, AttendanceRecord, AttendanceStatus, RosterEntry,
    SortOrder,
};

const TEACHER: &str = "teacher@x.com";

#[test]
fn merge_scenario_alice_present_bob_unmarked() {
    let roster = alice_and_bob();
    let raw = vec![record("a@x.com", AttendanceStatus::Present)];

    let merged = merge_attendance(&raw, &roster, TEACHER, SortOrder::Name);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].student_email.as_deref(), Some("a@x.com"));
    assert_eq!(merged[0].status, AttendanceStatus::Present);
    assert_eq!(merged[1].student_email.as_deref(), Some("b@x.com"));
    assert_eq!(merged[1].student_name.as_deref(), Some("Bob"));
    assert_eq!(merged[1].status, AttendanceStatus::Unmarked);
    assert_eq!(merged[1].marked_at, None);
    assert_eq!(merged[1].marked_by, None);

    let stats = compute_stats(&merged);
    assert_eq!(stats.present_count, 1);
    assert_eq!(stats.absent_count, 0);
    assert_eq!(stats.unmarked_count, 1);
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.attendance_percentage, 50);
}

#[test]
fn empty_attendance_leaves_everyone_unmarked() {
    let roster = vec![
        RosterEntry::new("a@x.com", "Alice"),
        RosterEntry::new("b@x.com", "Bob"),
        RosterEntry::new("c@x.com", "Carol"),
    ];
    let merged = merge_attendance(&[], &roster, TEACHER, SortOrder::Roster);
    assert_eq!(merged.len(), 3);
    assert!(merged
        .iter()
        .all(|record| record.status == AttendanceStatus::Unmarked));
    assert_eq!(compute_stats(&merged).attendance_percentage, 0);
}

#[test]
fn teacher_is_excluded_even_with_a_record() {
    let mut roster = alice_and_bob();
    roster.push(RosterEntry::new("Teacher@X.com", "Ms. T"));
    let raw = vec![record("teacher@x.com", AttendanceStatus::Present)];

    let merged = merge_attendance(&raw, &roster, TEACHER, SortOrder::Roster);
    assert_eq!(merged.len(), 2);
    assert!(merged
        .iter()
        .all(|record| record.key().as_deref() != Some("teacher@x.com")));
    assert_eq!(compute_stats(&merged).present_count, 0);
}

#[test]
fn stale_records_are_dropped_and_never_counted() {
    let roster = alice_and_bob();
    let raw = vec![
        record("gone@x.com", AttendanceStatus::Present),
        record("b@x.com", AttendanceStatus::Absent),
    ];
    let merged = merge_attendance(&raw, &roster, TEACHER, SortOrder::Roster);
    let stats = compute_stats(&merged);
    assert_eq!(merged.len(), 2);
    assert_eq!(stats.present_count, 0);
    assert_eq!(stats.absent_count, 1);
}

#[test]
fn email_matching_ignores_case() {
    let roster = vec![RosterEntry::new("foo@bar.com", "Foo")];
    let raw = vec![record("Foo@Bar.com", AttendanceStatus::Present)];
    let merged = merge_attendance(&raw, &roster, TEACHER, SortOrder::Roster);
    assert_eq!(merged[0].status, AttendanceStatus::Present);
    assert_eq!(merged[0].student_email.as_deref(), Some("Foo@Bar.com"));
}

#[test]
fn existing_records_pass_through_unchanged() {
    let roster = alice_and_bob();
    let stored = AttendanceRecord {
        student_email: Some("a@x.com".to_string()),
        student_name: None,
        status: AttendanceStatus::Absent,
        marked_at: Some(1_700_000_000_000),
        marked_by: Some(TEACHER.to_string()),
    };
    let merged = merge_attendance(&[stored.clone()], &roster, TEACHER, SortOrder::Roster);
    assert_eq!(merged[0], stored);
}

#[test]
fn merge_is_idempotent_over_its_own_output() {
    let roster = vec![
        RosterEntry::new("c@x.com", "carol"),
        RosterEntry::new("a@x.com", "Alice"),
        RosterEntry::new("b@x.com", "Bob"),
        RosterEntry::new(TEACHER, "Teacher"),
    ];
    let raw = vec![
        record("B@x.com", AttendanceStatus::Absent),
        record("stale@x.com", AttendanceStatus::Present),
        record("a@x.com", AttendanceStatus::Present),
    ];

    for order in [SortOrder::Roster, SortOrder::Name] {
        let once = merge_attendance(&raw, &roster, TEACHER, order);
        let twice = merge_attendance(&once, &roster, TEACHER, order);
        assert_eq!(once, twice);
    }
}

#[test]
fn merged_length_and_status_counts_hold_for_varied_inputs() {
    let statuses = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Unmarked,
    ];
    for roster_len in 0..8usize {
        let roster: Vec<RosterEntry> = (0..roster_len)
            .map(|index| RosterEntry::new(format!("s{index}@x.com"), format!("Student {index}")))
            .collect();
        for raw_len in 0..10usize {
            let raw: Vec<AttendanceRecord> = (0..raw_len)
                .map(|index| record(&format!("S{}@x.com", index * 3 % 11), statuses[index % 3]))
                .collect();
            let merged = merge_attendance(&raw, &roster, TEACHER, SortOrder::Name);
            assert_eq!(merged.len(), roster_len);

            let stats = compute_stats(&merged);
            assert_eq!(
                stats.present_count + stats.absent_count + stats.unmarked_count,
                stats.total_students
            );
            let expected = if stats.total_students == 0 {
                0
            } else {
                (f64::from(stats.present_count) * 100.0 / f64::from(stats.total_students)).round()
                    as u32
            };
            assert_eq!(stats.attendance_percentage, expected);
        }
    }
}

#[test]
fn set_status_absent_leaves_percentage_unchanged() {
    let roster = alice_and_bob();
    let raw = vec![record("a@x.com", AttendanceStatus::Present)];
    let merged = merge_attendance(&raw, &roster, TEACHER, SortOrder::Name);

    let next = set_status(
        &merged,
        "b@x.com",
        AttendanceStatus::Absent,
        TEACHER,
        1_700_000_000_000,
        SortOrder::Name,
    )
    .unwrap();

    assert_eq!(next[0], merged[0]);
    assert_eq!(next[1].status, AttendanceStatus::Absent);
    assert_eq!(next[1].marked_at, Some(1_700_000_000_000));
    assert_eq!(next[1].marked_by.as_deref(), Some(TEACHER));

    let stats = compute_stats(&next);
    assert_eq!(stats.present_count, 1);
    assert_eq!(stats.absent_count, 1);
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.attendance_percentage, 50);
}

#[test]
fn updates_for_different_students_commute() {
    let roster = alice_and_bob();
    let merged = merge_attendance(&[], &roster, TEACHER, SortOrder::Name);

    let alice_first = set_status(&merged, "a@x.com", AttendanceStatus::Present, TEACHER, 5, SortOrder::Name)
        .and_then(|view| set_status(&view, "b@x.com", AttendanceStatus::Absent, TEACHER, 5, SortOrder::Name))
        .unwrap();
    let bob_first = set_status(&merged, "b@x.com", AttendanceStatus::Absent, TEACHER, 5, SortOrder::Name)
        .and_then(|view| set_status(&view, "a@x.com", AttendanceStatus::Present, TEACHER, 5, SortOrder::Name))
        .unwrap();

    assert_eq!(alice_first, bob_first);
}

#[test]
fn same_student_updates_are_last_write_wins() {
    let roster = alice_and_bob();
    let merged = merge_attendance(&[], &roster, TEACHER, SortOrder::Roster);
    let next = set_status(&merged, "a@x.com", AttendanceStatus::Present, TEACHER, 1, SortOrder::Roster)
        .and_then(|view| set_status(&view, "A@x.com", AttendanceStatus::Absent, TEACHER, 2, SortOrder::Roster))
        .unwrap();
    assert_eq!(next[0].status, AttendanceStatus::Absent);
    assert_eq!(next[0].marked_at, Some(2));
}

#[test]
fn name_order_places_accented_names_with_their_base_letter() {
    let roster = vec![
        RosterEntry::new("z@x.com", "Zoe"),
        RosterEntry::new("e@x.com", "Émile"),
        RosterEntry::new("d@x.com", "daniel"),
        RosterEntry::new("e2@x.com", "EMILE"),
        RosterEntry::new("e3@x.com", "emile"),
    ];
    let merged = merge_attendance(&[], &roster, TEACHER, SortOrder::Name);
    let order: Vec<&str> = merged.iter().map(|record| record.display_label()).collect();
    assert_eq!(order, vec!["daniel", "EMILE", "emile", "Émile", "Zoe"]);
}

fn alice_and_bob() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("a@x.com", "Alice"),
        RosterEntry::new("b@x.com", "Bob"),
    ]
}

fn record(email: &str, status: AttendanceStatus) -> AttendanceRecord {
    AttendanceRecord {
        student_email: Some(email.to_string()),
        student_name: None,
        status,
        marked_at: None,
        marked_by: None,
    }
}
