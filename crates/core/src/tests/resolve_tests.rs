// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    LEVEL_HIGH, LEVEL_LOW, TEMPLATE_BLOCK, TEMPLATE_PAIR, TEMPLATE_SKILL_TWO, bcheck_id,
    bskill_id, completed_through, create_test_catalog, create_test_session, create_test_student,
    history_row, now, snapshot,
};
use crate::{
    BookingDecision, BookingRejection, StudentSnapshot, evaluate_booking,
    preview_effective_subjects, resolve_effective_subject,
};
use aula_domain::{
    AttendanceStatus, Catalog, ClassSession, DeliveryMode, Enrollment, EnrollmentState,
};
use time::macros::{date, time};

fn template_session(template_id: i64) -> ClassSession {
    let mut session = create_test_session(1, None, date!(2026 - 03 - 10), time!(10:00));
    session.template_id = Some(template_id);
    session
}

/// A student who completed units 1-4 and missed the B-check of unit 5.
fn student_with_absent_bcheck_five() -> StudentSnapshot {
    let mut student = create_test_student(8, LEVEL_LOW);
    student.history = completed_through(4);
    student
        .history
        .push(history_row(80, bcheck_id(5), AttendanceStatus::Absent));
    student
}

#[test]
fn test_recovery_rule_resolves_absent_unit() {
    let catalog: Catalog = create_test_catalog();
    let mut student = student_with_absent_bcheck_five();
    let mut session = template_session(TEMPLATE_PAIR);
    session.audience_unit_from = Some(5);
    session.audience_unit_to = Some(6);

    let effective = resolve_effective_subject(&catalog, &student, &session).unwrap();
    assert_eq!(effective.subject_id, bcheck_id(5));
    assert_eq!(effective.unit_number, Some(5));

    let decision = evaluate_booking(&catalog, &student, &snapshot(session.clone()), now()).unwrap();
    assert!(matches!(decision, BookingDecision::Admit { effective, .. } if effective.subject_id == bcheck_id(5)));

    student
        .history
        .push(history_row(81, bcheck_id(5), AttendanceStatus::Attended));
    let effective = resolve_effective_subject(&catalog, &student, &session).unwrap();
    assert_eq!(effective.subject_id, bcheck_id(6));
}

#[test]
fn test_pair_template_starts_at_placement_level() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(9, LEVEL_HIGH);

    let effective =
        resolve_effective_subject(&catalog, &student, &template_session(TEMPLATE_PAIR)).unwrap();

    assert_eq!(effective.subject_id, bcheck_id(5));
}

#[test]
fn test_per_unit_template_uses_current_unit_and_skill_number() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(2);

    let effective =
        resolve_effective_subject(&catalog, &student, &template_session(TEMPLATE_SKILL_TWO))
            .unwrap();

    assert_eq!(effective.subject_id, bskill_id(3, 2));
}

#[test]
fn test_block_template_resolves_covering_oral_test() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(5);

    let effective =
        resolve_effective_subject(&catalog, &student, &template_session(TEMPLATE_BLOCK)).unwrap();

    assert_eq!(effective.subject_id, 301);
}

#[test]
fn test_no_matching_enrollment() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let mut session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    session.program_id = 2;

    let rejection = resolve_effective_subject(&catalog, &student, &session).unwrap_err();

    assert_eq!(
        rejection,
        BookingRejection::NoEffectiveSubject {
            reason: String::from("no matching enrollment")
        }
    );
}

#[test]
fn test_active_enrollment_overrides_student_plan() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.student.program_id = Some(2);
    student.enrollments.push(Enrollment {
        id: 1,
        student_id: 7,
        subject_id: None,
        program_id: 1,
        plan_id: Some(10),
        phase_id: None,
        level_id: None,
        campus_id: None,
        delivery_mode: DeliveryMode::Presential,
        state: EnrollmentState::Enrolled,
        start_date: date!(2026 - 01 - 01),
        end_date: None,
        final_grade: None,
    });
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    assert!(resolve_effective_subject(&catalog, &student, &session).is_ok());
}

#[test]
fn test_template_without_subject_for_unit() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(8);

    let rejection =
        resolve_effective_subject(&catalog, &student, &template_session(TEMPLATE_SKILL_TWO))
            .unwrap_err();

    assert_eq!(rejection.code(), "no_effective_subject");
}

#[test]
fn test_preview_skips_unresolvable_sessions() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let resolvable = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    let mut foreign = create_test_session(2, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(12:00));
    foreign.program_id = 2;

    let preview = preview_effective_subjects(&catalog, &student, [&resolvable, &foreign]);

    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].0, 1);
    assert_eq!(preview[0].1.subject_id, bcheck_id(1));
}
