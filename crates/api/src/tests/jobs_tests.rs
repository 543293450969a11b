// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use aula_domain::{AttendanceStatus, Catalog, SessionState};
use aula_persistence::Persistence;
use time::Duration;
use time::macros::{date, datetime, time};

use super::helpers::{
    OTHER_STUDENT, PASSWORD, STUDENT, WEEK, add, bcheck_id, coach_actor, create_test_cause,
    create_test_session, now, outcome, setup, student_actor,
};
use crate::{
    AuthenticatedActor, LoginRequest, MaintenanceReport, SetSessionStateRequest, expire_sessions,
    finalize_due_sessions, login, mark_attendance, purge_closed_lines, purge_expired_trash,
    recompute_current_units, run_maintenance, set_session_state,
};

/// Session 1 (Tuesday 10:00-11:00) booked by the fixture student and started.
fn setup_started_session() -> (Persistence, Catalog, AuthenticatedActor) {
    let (mut persistence, catalog) = setup();
    persistence
        .insert_session(&create_test_session(
            1,
            bcheck_id(3),
            date!(2026 - 03 - 10),
            time!(10:00),
            10,
        ))
        .unwrap();
    let student = student_actor(&mut persistence, STUDENT);
    assert_eq!(add(&mut persistence, &catalog, &student, 1).status, "ok");
    let coach = coach_actor(&mut persistence);
    set_session_state(
        &mut persistence,
        &catalog,
        &coach,
        1,
        &SetSessionStateRequest {
            target: String::from("started"),
        },
        &create_test_cause(),
        now(),
    )
    .unwrap();
    (persistence, catalog, coach)
}

#[test]
fn test_finalization_waits_for_the_grace_period() {
    let (mut persistence, catalog, _coach) = setup_started_session();

    let early = finalize_due_sessions(&mut persistence, &catalog, datetime!(2026 - 03 - 10 11:29));
    assert_eq!(early.unwrap(), 0);
    assert_eq!(
        persistence.get_session(1).unwrap().unwrap().state,
        SessionState::Started
    );

    let due = finalize_due_sessions(&mut persistence, &catalog, datetime!(2026 - 03 - 10 11:30));
    assert_eq!(due.unwrap(), 1);
    assert_eq!(
        persistence.get_session(1).unwrap().unwrap().state,
        SessionState::Done
    );
    let history = persistence.list_history(STUDENT).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attendance_status, AttendanceStatus::Absent);

    let again = finalize_due_sessions(&mut persistence, &catalog, datetime!(2026 - 03 - 10 12:00));
    assert_eq!(again.unwrap(), 0);
    assert_eq!(persistence.list_history(STUDENT).unwrap().len(), 1);
}

#[test]
fn test_grace_period_comes_from_config() {
    let (mut persistence, catalog, _coach) = setup_started_session();
    persistence
        .set_config_value("booking.finalize_grace_minutes", "0")
        .unwrap();

    let due = finalize_due_sessions(&mut persistence, &catalog, datetime!(2026 - 03 - 10 11:00));

    assert_eq!(due.unwrap(), 1);
}

#[test]
fn test_finalization_keeps_marked_outcomes() {
    let (mut persistence, catalog, coach) = setup_started_session();
    mark_attendance(
        &mut persistence,
        &catalog,
        &coach,
        1,
        &outcome(STUDENT, AttendanceStatus::Attended),
        &create_test_cause(),
        now(),
    )
    .unwrap();

    finalize_due_sessions(&mut persistence, &catalog, datetime!(2026 - 03 - 10 12:00)).unwrap();

    let history = persistence.list_history(STUDENT).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attendance_status, AttendanceStatus::Attended);
    assert_eq!(
        persistence.get_student(STUDENT).unwrap().unwrap().current_unit,
        3
    );
}

#[test]
fn test_closed_lines_go_to_trash_and_expire() {
    let (mut persistence, catalog, _coach) = setup_started_session();
    let closed_at = datetime!(2026 - 03 - 10 12:00);
    finalize_due_sessions(&mut persistence, &catalog, closed_at).unwrap();

    assert_eq!(purge_closed_lines(&mut persistence, closed_at).unwrap(), 1);
    assert!(persistence.list_agenda_lines(STUDENT, WEEK).unwrap().is_empty());
    assert_eq!(persistence.list_trash(STUDENT).unwrap().len(), 1);
    assert_eq!(purge_closed_lines(&mut persistence, closed_at).unwrap(), 0);

    let retention_end = closed_at + Duration::days(8);
    assert_eq!(purge_expired_trash(&mut persistence, retention_end).unwrap(), 0);
    assert_eq!(
        purge_expired_trash(&mut persistence, retention_end + Duration::minutes(1)).unwrap(),
        1
    );
    assert!(persistence.list_trash(STUDENT).unwrap().is_empty());
}

#[test]
fn test_recompute_repairs_stale_current_units() {
    let (mut persistence, catalog) = setup();
    persistence.update_current_unit(STUDENT, 6).unwrap();

    assert_eq!(recompute_current_units(&mut persistence, &catalog).unwrap(), 1);
    assert_eq!(
        persistence.get_student(STUDENT).unwrap().unwrap().current_unit,
        1
    );
    assert_eq!(
        persistence.get_student(OTHER_STUDENT).unwrap().unwrap().current_unit,
        1
    );
    assert_eq!(recompute_current_units(&mut persistence, &catalog).unwrap(), 0);
}

#[test]
fn test_expired_portal_sessions_are_deleted() {
    let (mut persistence, _catalog) = setup();
    student_actor(&mut persistence, STUDENT);
    login(
        &mut persistence,
        &LoginRequest {
            login: String::from("student7"),
            password: String::from(PASSWORD),
        },
        now(),
    )
    .unwrap();

    assert_eq!(expire_sessions(&mut persistence, now()).unwrap(), 0);
    assert_eq!(
        expire_sessions(&mut persistence, now() + Duration::hours(12)).unwrap(),
        1
    );
}

#[test]
fn test_maintenance_run_is_idempotent() {
    let (mut persistence, catalog, _coach) = setup_started_session();
    let at = datetime!(2026 - 03 - 10 12:00);

    let first = run_maintenance(&mut persistence, &catalog, at).unwrap();
    assert_eq!(first.finalized_sessions, 1);
    assert_eq!(first.purged_lines, 1);
    assert_eq!(first.purged_trash, 0);

    let second = run_maintenance(&mut persistence, &catalog, at).unwrap();
    assert_eq!(second, MaintenanceReport::default());
}
