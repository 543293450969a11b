// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use aula_domain::{AttendanceStatus, ProfileState};
use aula_persistence::Persistence;
use time::macros::{date, time};

use super::helpers::{
    CAMPUS, ONLINE_CAMPUS, OTHER_STUDENT, STUDENT, WEEK, add, bcheck_id, bskill_id, coach_actor,
    create_test_cause, create_test_session, create_test_student, create_user, now, setup,
    student_actor, take_subject,
};
use crate::{
    AddToAgendaRequest, AgendaQuery, ApiError, MyAgendaQuery, RemoveFromAgendaRequest,
    add_to_agenda, list_agenda, my_agenda, progress, remove_from_agenda,
};

fn insert_week(persistence: &mut Persistence) {
    persistence
        .insert_session(&create_test_session(
            1,
            bcheck_id(1),
            date!(2026 - 03 - 10),
            time!(10:00),
            10,
        ))
        .unwrap();
    persistence
        .insert_session(&create_test_session(
            2,
            bskill_id(1, 1),
            date!(2026 - 03 - 12),
            time!(10:00),
            10,
        ))
        .unwrap();
    let mut online = create_test_session(3, bcheck_id(2), date!(2026 - 03 - 12), time!(14:00), 10);
    online.campus_id = ONLINE_CAMPUS;
    persistence.insert_session(&online).unwrap();
    // Next week; never listed for this week.
    persistence
        .insert_session(&create_test_session(
            4,
            bcheck_id(1),
            date!(2026 - 03 - 17),
            time!(10:00),
            10,
        ))
        .unwrap();
}

#[test]
fn test_agenda_groups_week_sessions_by_day() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);

    let agenda = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery {
            week: Some(String::from("2026-03-11")),
            ..AgendaQuery::default()
        },
        now(),
    )
    .unwrap();

    assert_eq!(agenda.week_start, "2026-03-09");
    assert_eq!(agenda.current_unit, 1);
    assert_eq!(agenda.days.len(), 2);
    assert_eq!(agenda.days[0].date, "2026-03-10");
    assert_eq!(agenda.days[0].weekday, "Tuesday");
    assert_eq!(agenda.days[1].date, "2026-03-12");
    let thursday: Vec<i64> = agenda.days[1].sessions.iter().map(|s| s.session_id).collect();
    assert_eq!(thursday, vec![2, 3]);
    let first = &agenda.days[0].sessions[0];
    assert_eq!(first.time_start, "10:00");
    assert_eq!(first.time_end, "11:00");
    assert_eq!(first.subject_name, "BCheck 1");
    assert_eq!(first.teacher_name.as_deref(), Some("Ana"));
    assert_eq!(first.city, "Bogota");
    assert!(first.line_id.is_none());
}

#[test]
fn test_agenda_filters_are_saved_on_the_weekly_plan() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);

    let filtered = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery {
            campus: Some(ONLINE_CAMPUS),
            ..AgendaQuery::default()
        },
        now(),
    )
    .unwrap();
    assert_eq!(filtered.campus_id, Some(ONLINE_CAMPUS));
    assert_eq!(filtered.days.len(), 1);
    assert_eq!(filtered.days[0].sessions[0].session_id, 3);

    // No filters given: the plan's saved campus applies.
    let remembered = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery::default(),
        now(),
    )
    .unwrap();
    assert_eq!(remembered.campus_id, Some(ONLINE_CAMPUS));
    assert_eq!(remembered.days.len(), 1);

    let plan = persistence.find_weekly_plan(STUDENT, WEEK).unwrap().unwrap();
    assert_eq!(plan.filter_campus_id, Some(ONLINE_CAMPUS));
}

#[test]
fn test_agenda_rejects_unknown_delivery_mode() {
    let (mut persistence, catalog) = setup();
    let student = student_actor(&mut persistence, STUDENT);

    let result = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery {
            mode: Some(String::from("teleport")),
            ..AgendaQuery::default()
        },
        now(),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

#[test]
fn test_agenda_marks_booked_sessions() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);
    let line_id = add(&mut persistence, &catalog, &student, 1)
        .line
        .unwrap()
        .line_id;

    let agenda = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery::default(),
        now(),
    )
    .unwrap();

    assert_eq!(agenda.days[0].sessions[0].line_id, Some(line_id));
}

#[test]
fn test_repeated_add_returns_the_same_line() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);

    let first = add(&mut persistence, &catalog, &student, 1);
    let second = add(&mut persistence, &catalog, &student, 1);

    assert_eq!(first.status, "ok");
    assert_eq!(second.status, "ok");
    assert_eq!(second.code.as_deref(), Some("duplicate_booking"));
    assert_eq!(
        first.line.unwrap().line_id,
        second.line.unwrap().line_id
    );
    assert_eq!(persistence.list_session_enrollments(1).unwrap().len(), 1);
}

#[test]
fn test_add_then_remove_restores_counts() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);
    let lines_before = persistence.list_agenda_lines(STUDENT, WEEK).unwrap().len();
    let seats_before = persistence.count_seats_held(1).unwrap();

    let line_id = add(&mut persistence, &catalog, &student, 1)
        .line
        .unwrap()
        .line_id;
    let response = remove_from_agenda(
        &mut persistence,
        &catalog,
        &student,
        &RemoveFromAgendaRequest { line_id },
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert_eq!(response.status, "ok");
    assert!(!response.late_cancel);
    assert_eq!(response.removed, vec![line_id]);
    assert_eq!(
        persistence.list_agenda_lines(STUDENT, WEEK).unwrap().len(),
        lines_before
    );
    assert_eq!(persistence.count_seats_held(1).unwrap(), seats_before);
}

#[test]
fn test_removing_bcheck_removes_its_skills() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);
    let bcheck_line = add(&mut persistence, &catalog, &student, 1)
        .line
        .unwrap()
        .line_id;
    let skill = add(&mut persistence, &catalog, &student, 2);
    assert_eq!(skill.status, "ok", "{}", skill.message);
    let skill_line = skill.line.unwrap().line_id;

    let response = remove_from_agenda(
        &mut persistence,
        &catalog,
        &student,
        &RemoveFromAgendaRequest {
            line_id: bcheck_line,
        },
        &create_test_cause(),
        now(),
    )
    .unwrap();

    assert_eq!(response.dependent_line_ids, vec![skill_line]);
    assert!(response.removed.contains(&bcheck_line));
    assert!(response.removed.contains(&skill_line));
    assert!(persistence.list_agenda_lines(STUDENT, WEEK).unwrap().is_empty());
}

#[test]
fn test_removing_another_students_line_is_refused() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let owner = student_actor(&mut persistence, STUDENT);
    let other = student_actor(&mut persistence, OTHER_STUDENT);
    let line_id = add(&mut persistence, &catalog, &owner, 1)
        .line
        .unwrap()
        .line_id;

    let result = remove_from_agenda(
        &mut persistence,
        &catalog,
        &other,
        &RemoveFromAgendaRequest { line_id },
        &create_test_cause(),
        now(),
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
    assert_eq!(persistence.list_agenda_lines(STUDENT, WEEK).unwrap().len(), 1);
}

#[test]
fn test_add_validates_week_start() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);

    let result = add_to_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AddToAgendaRequest {
            session_id: 1,
            week_start: Some(String::from("next week")),
        },
        &create_test_cause(),
        now(),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "week_start"
    ));
}

#[test]
fn test_my_agenda_lists_the_weeks_lines() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);
    add(&mut persistence, &catalog, &student, 1);
    add(&mut persistence, &catalog, &student, 4);

    let agenda = my_agenda(
        &mut persistence,
        &catalog,
        &student,
        &MyAgendaQuery { week: None },
        now(),
    )
    .unwrap();

    assert_eq!(agenda.week_start, "2026-03-09");
    assert_eq!(agenda.lines.len(), 1);
    assert_eq!(agenda.lines[0].session_id, 1);
    assert_eq!(agenda.lines[0].subject_name, "BCheck 1");
    assert_eq!(agenda.lines[0].enrollment_state.as_deref(), Some("confirmed"));

    let next = my_agenda(
        &mut persistence,
        &catalog,
        &student,
        &MyAgendaQuery {
            week: Some(String::from("2026-03-16")),
        },
        now(),
    )
    .unwrap();
    assert_eq!(next.lines.len(), 1);
    assert_eq!(next.lines[0].session_id, 4);
}

#[test]
fn test_progress_summarizes_history() {
    let (mut persistence, catalog) = setup();
    let student = student_actor(&mut persistence, STUDENT);
    let coach = coach_actor(&mut persistence);
    take_subject(
        &mut persistence,
        &catalog,
        &student,
        &coach,
        1,
        bcheck_id(1),
        date!(2026 - 03 - 10),
        AttendanceStatus::Attended,
    );
    take_subject(
        &mut persistence,
        &catalog,
        &student,
        &coach,
        2,
        bskill_id(1, 1),
        date!(2026 - 03 - 11),
        AttendanceStatus::Absent,
    );

    let response = progress(&mut persistence, &catalog, &student).unwrap();

    assert_eq!(response.student_id, STUDENT);
    assert_eq!(response.program_id, 1);
    assert_eq!(response.summary.current_unit, 1);
    assert_eq!(response.summary.attended, 1);
    assert_eq!(response.summary.absent, 1);
    assert!(response.summary.completed_units.is_empty());
    assert!(
        response
            .summary
            .subjects
            .iter()
            .any(|s| s.subject_id == bcheck_id(1) && s.completed)
    );
}

#[test]
fn test_account_without_student_cannot_use_portal() {
    let (mut persistence, catalog) = setup();
    let coach = coach_actor(&mut persistence);

    let result = list_agenda(
        &mut persistence,
        &catalog,
        &coach,
        &AgendaQuery::default(),
        now(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_pending_password_change_blocks_the_portal() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    let student = student_actor(&mut persistence, STUDENT);
    persistence
        .set_must_change_password(student.user_id, true)
        .unwrap();

    let agenda = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery::default(),
        now(),
    );
    assert!(matches!(
        agenda,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "password_change_required"
    ));

    let response = add(&mut persistence, &catalog, &student, 1);
    assert_eq!(response.status, "error");
    assert_eq!(response.code.as_deref(), Some("password_change_required"));
}

#[test]
fn test_profile_without_scheduling_is_denied() {
    let (mut persistence, catalog) = setup();
    insert_week(&mut persistence);
    persistence
        .insert_profile_state(&ProfileState {
            id: 1,
            code: String::from("HOLD"),
            name: String::from("On hold"),
            can_schedule: false,
            can_view_agenda: true,
        })
        .unwrap();
    let mut held = create_test_student(30, super::helpers::LEVEL_LOW);
    held.profile_state_id = Some(1);
    held.preferred_campus_id = Some(CAMPUS);
    persistence.insert_student(&held).unwrap();
    persistence
        .insert_enrollment(&super::helpers::create_test_enrollment(
            300,
            30,
            super::helpers::LEVEL_LOW,
        ))
        .unwrap();
    let student = create_user(&mut persistence, "held", "student", Some(30));

    let agenda = list_agenda(
        &mut persistence,
        &catalog,
        &student,
        &AgendaQuery::default(),
        now(),
    )
    .unwrap();
    assert_eq!(agenda.days.len(), 2);

    let response = add(&mut persistence, &catalog, &student, 1);
    assert_eq!(response.status, "error");
    assert_eq!(response.code.as_deref(), Some("permission_denied"));
}
