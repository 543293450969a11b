// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    LEVEL_LOW, ONLINE, PHYSICAL, PLAN, PROGRAM, bcheck_id, booked_line, bskill_id,
    completed_through, create_test_catalog, create_test_seed, create_test_session,
    create_test_student, history_row, now, snapshot, subject,
};
use crate::{BookingDecision, BookingRejection, StudentSnapshot, evaluate_booking};
use aula_domain::{
    AttendanceStatus, Catalog, DeliveryMode, Enrollment, EnrollmentState, FreezePeriod,
    FreezeState, ProfileState, SessionEnrollment, SessionEnrollmentState, SessionState,
    SubjectCategory, SubjectClassification,
};
use time::macros::{date, time};

/// A student in unit 3 with the B-check of unit 3 attended.
fn student_in_unit_three() -> StudentSnapshot {
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(2);
    student
        .history
        .push(history_row(90, bcheck_id(3), AttendanceStatus::Attended));
    student
}

fn admitted_subject(decision: BookingDecision) -> i64 {
    match decision {
        BookingDecision::Admit { effective, .. } => effective.subject_id,
        BookingDecision::AlreadyBooked { .. } => panic!("expected a new booking"),
    }
}

#[test]
fn test_prerequisite_gate_admits_skill_of_started_unit() {
    let catalog: Catalog = create_test_catalog();
    let student = student_in_unit_three();
    let session = create_test_session(1, Some(bskill_id(3, 2)), date!(2026 - 03 - 10), time!(10:00));

    let decision = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap();

    assert_eq!(admitted_subject(decision), bskill_id(3, 2));
}

#[test]
fn test_missing_prerequisite_lists_bcheck_unit() {
    let catalog: Catalog = create_test_catalog();
    let student = student_in_unit_three();
    let session = create_test_session(1, Some(bskill_id(4, 1)), date!(2026 - 03 - 10), time!(10:00));

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap_err();

    assert_eq!(rejection.code(), "missing_prerequisites");
    let BookingRejection::MissingPrerequisites(missing) = &rejection else {
        panic!("expected missing prerequisites, got {rejection:?}");
    };
    assert_eq!(missing.bcheck_units, vec![4]);
    assert!(rejection.to_string().contains("BCheck unidades: 4"));
}

#[test]
fn test_booked_bcheck_line_satisfies_prerequisite_but_must_come_first() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(2);

    let later_bcheck = create_test_session(5, Some(bcheck_id(3)), date!(2026 - 03 - 12), time!(10:00));
    student.lines.push(booked_line(1, &later_bcheck, bcheck_id(3)));
    let skill = create_test_session(6, Some(bskill_id(3, 1)), date!(2026 - 03 - 11), time!(10:00));

    let rejection =
        evaluate_booking(&catalog, &student, &snapshot(skill.clone()), now()).unwrap_err();
    assert_eq!(rejection, BookingRejection::UnitOrderingViolation { unit: 3 });

    let earlier_bcheck = create_test_session(7, Some(bcheck_id(3)), date!(2026 - 03 - 10), time!(10:00));
    student.lines = vec![booked_line(2, &earlier_bcheck, bcheck_id(3))];
    let decision = evaluate_booking(&catalog, &student, &snapshot(skill), now()).unwrap();
    assert_eq!(admitted_subject(decision), bskill_id(3, 1));
}

#[test]
fn test_bcheck_on_online_campus_is_presential_exception() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let mut session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    session.campus_id = ONLINE;
    session.delivery_mode = DeliveryMode::Virtual;

    let decision = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap();

    assert_eq!(admitted_subject(decision), bcheck_id(1));
}

#[test]
fn test_virtual_oral_test_is_open_to_presential_student() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(4);
    let mut session = create_test_session(1, Some(300), date!(2026 - 03 - 10), time!(10:00));
    session.campus_id = ONLINE;
    session.delivery_mode = DeliveryMode::Virtual;
    session.audience_unit_to = Some(4);

    assert!(evaluate_booking(&catalog, &student, &snapshot(session), now()).is_ok());
}

#[test]
fn test_virtual_skill_is_rejected_for_presential_student() {
    let catalog: Catalog = create_test_catalog();
    let student = student_in_unit_three();
    let mut session = create_test_session(1, Some(bskill_id(3, 1)), date!(2026 - 03 - 10), time!(10:00));
    session.delivery_mode = DeliveryMode::Virtual;

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap_err();

    assert_eq!(
        rejection,
        BookingRejection::DeliveryModeMismatch {
            reason: String::from("presential students cannot book virtual sessions")
        }
    );
}

#[test]
fn test_skill_on_online_campus_is_rejected_for_presential_student() {
    let catalog: Catalog = create_test_catalog();
    let student = student_in_unit_three();
    let mut session = create_test_session(1, Some(bskill_id(3, 1)), date!(2026 - 03 - 10), time!(10:00));
    session.campus_id = ONLINE;

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap_err();

    assert_eq!(rejection.code(), "delivery_mode_mismatch");
}

#[test]
fn test_virtual_student_cannot_book_presential_session() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.student.preferred_delivery_mode = DeliveryMode::Virtual;
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session.clone()), now()).unwrap_err();
    assert_eq!(rejection.code(), "delivery_mode_mismatch");

    student.student.preferred_delivery_mode = DeliveryMode::Hybrid;
    assert!(evaluate_booking(&catalog, &student, &snapshot(session), now()).is_ok());
}

#[test]
fn test_capacity_counts_other_students_only() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    let mut nearly_full = snapshot(session);
    nearly_full.seats_held_by_others = 9;
    assert!(evaluate_booking(&catalog, &student, &nearly_full, now()).is_ok());

    nearly_full.seats_held_by_others = 10;
    assert_eq!(
        evaluate_booking(&catalog, &student, &nearly_full, now()).unwrap_err(),
        BookingRejection::NoCapacity
    );
}

#[test]
fn test_zero_capacity_leaves_session_uncapped() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let mut session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    session.max_capacity = 0;

    let mut crowded = snapshot(session);
    crowded.seats_held_by_others = 250;

    assert!(evaluate_booking(&catalog, &student, &crowded, now()).is_ok());
}

#[test]
fn test_capacity_message_hides_counts() {
    let message = BookingRejection::NoCapacity.to_string();
    assert!(!message.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_unbookable_sessions() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let base = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    let mut draft = base.clone();
    draft.state = SessionState::Draft;
    let mut unpublished = base.clone();
    unpublished.is_published = false;
    let mut inactive = base.clone();
    inactive.active = false;
    let past = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 08), time!(10:00));

    for session in [draft, unpublished, inactive, past] {
        let rejection = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap_err();
        assert_eq!(rejection.code(), "session_not_bookable");
    }
}

#[test]
fn test_audience_window() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let mut session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    session.audience_unit_from = Some(3);
    session.audience_unit_to = Some(5);

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap_err();

    assert_eq!(
        rejection,
        BookingRejection::AudienceOutOfRange {
            unit: 1,
            from: 3,
            to: 5
        }
    );
}

#[test]
fn test_oral_test_audience_sits_at_block_end() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student.history = completed_through(4);
    let mut session = create_test_session(1, Some(300), date!(2026 - 03 - 10), time!(10:00));
    session.audience_unit_from = Some(1);
    session.audience_unit_to = Some(4);

    assert!(evaluate_booking(&catalog, &student, &snapshot(session.clone()), now()).is_ok());

    let early = create_test_student(8, LEVEL_LOW);
    let rejection = evaluate_booking(&catalog, &early, &snapshot(session), now()).unwrap_err();
    assert_eq!(rejection.code(), "audience_out_of_range");
}

#[test]
fn test_completed_subject_is_not_repeated_unless_pooled() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    student
        .history
        .push(history_row(1, bcheck_id(1), AttendanceStatus::Attended));
    let mut session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session.clone()), now()).unwrap_err();
    assert_eq!(rejection.code(), "already_completed");

    session.elective_pool_id = Some(3);
    assert!(evaluate_booking(&catalog, &student, &snapshot(session), now()).is_ok());
}

#[test]
fn test_time_conflict_with_other_line() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    let other = create_test_session(9, Some(bcheck_id(2)), date!(2026 - 03 - 10), time!(10:30));
    student.lines.push(booked_line(4, &other, bcheck_id(2)));
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    let rejection = evaluate_booking(&catalog, &student, &snapshot(session), now()).unwrap_err();

    assert!(matches!(
        rejection,
        BookingRejection::TimeConflict { line_id: 4, .. }
    ));
}

#[test]
fn test_existing_line_is_idempotent_success() {
    let catalog: Catalog = create_test_catalog();
    let mut student = create_test_student(7, LEVEL_LOW);
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    student.lines.push(booked_line(12, &session, bcheck_id(1)));

    let mut full = snapshot(session);
    full.seats_held_by_others = 10;
    let decision = evaluate_booking(&catalog, &student, &full, now()).unwrap();

    assert_eq!(
        decision,
        BookingDecision::AlreadyBooked {
            line_id: 12,
            effective_subject_id: bcheck_id(1)
        }
    );
}

#[test]
fn test_cancelled_enrollment_is_reactivated_and_recorded_one_is_not() {
    let catalog: Catalog = create_test_catalog();
    let student = create_test_student(7, LEVEL_LOW);
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    let mut with_enrollment = snapshot(session);
    let mut enrollment = SessionEnrollment {
        id: 33,
        session_id: 1,
        student_id: 7,
        effective_subject_id: bcheck_id(1),
        effective_unit_number: Some(1),
        state: SessionEnrollmentState::Cancelled,
        notes: None,
        late_cancel: false,
    };
    with_enrollment.student_enrollment = Some(enrollment.clone());

    let decision = evaluate_booking(&catalog, &student, &with_enrollment, now()).unwrap();
    assert!(matches!(
        decision,
        BookingDecision::Admit {
            existing_enrollment: Some(SessionEnrollment { id: 33, .. }),
            ..
        }
    ));

    enrollment.state = SessionEnrollmentState::Absent;
    with_enrollment.student_enrollment = Some(enrollment);
    let rejection = evaluate_booking(&catalog, &student, &with_enrollment, now()).unwrap_err();
    assert_eq!(rejection.code(), "session_not_bookable");
}

/// A catalog with a unit-3 review subject classified as a prerequisite and
/// a unit-3 workshop gated by it.
fn catalog_with_classified_gate() -> Catalog {
    let mut seed = create_test_seed();
    let mut review = subject(400, String::from("Unit review"), LEVEL_LOW, SubjectCategory::Regular);
    review.classification = SubjectClassification::Prerequisite;
    review.unit_number = Some(3);
    let mut workshop = subject(401, String::from("Workshop"), LEVEL_LOW, SubjectCategory::Regular);
    workshop.unit_number = Some(3);
    workshop.prerequisite_ids.insert(400);
    seed.subjects.extend([review, workshop]);
    Catalog::from_seed(seed).unwrap()
}

#[test]
fn test_classified_prerequisite_gates_like_a_bcheck() {
    let catalog = catalog_with_classified_gate();
    let mut student = student_in_unit_three();
    let workshop = create_test_session(2, Some(401), date!(2026 - 03 - 12), time!(10:00));

    let rejection =
        evaluate_booking(&catalog, &student, &snapshot(workshop.clone()), now()).unwrap_err();
    let BookingRejection::MissingPrerequisites(missing) = &rejection else {
        panic!("expected missing prerequisites, got {rejection:?}");
    };
    assert_eq!(missing.bcheck_units, vec![3]);

    let review = create_test_session(1, Some(400), date!(2026 - 03 - 10), time!(10:00));
    student.lines.push(booked_line(1, &review, 400));
    let decision = evaluate_booking(&catalog, &student, &snapshot(workshop), now()).unwrap();
    assert_eq!(admitted_subject(decision), 401);
}

fn ending_enrollment(end_date: time::Date) -> Enrollment {
    Enrollment {
        id: 70,
        student_id: 7,
        subject_id: None,
        program_id: PROGRAM,
        plan_id: Some(PLAN),
        phase_id: Some(100),
        level_id: Some(LEVEL_LOW),
        campus_id: Some(PHYSICAL),
        delivery_mode: DeliveryMode::Presential,
        state: EnrollmentState::Enrolled,
        start_date: date!(2026 - 01 - 05),
        end_date: Some(end_date),
        final_grade: None,
    }
}

#[test]
fn test_ended_enrollment_blocks_booking_until_freeze_extends_it() {
    let catalog: Catalog = create_test_catalog();
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));
    let mut student = create_test_student(7, LEVEL_LOW);
    student.enrollments.push(ending_enrollment(date!(2026 - 03 - 01)));

    let rejection =
        evaluate_booking(&catalog, &student, &snapshot(session.clone()), now()).unwrap_err();
    assert_eq!(rejection.code(), "permission_denied");

    student.freezes.push(FreezePeriod {
        id: 1,
        student_id: 7,
        enrollment_id: 70,
        start_date: date!(2026 - 02 - 10),
        end_date: date!(2026 - 02 - 23),
        state: FreezeState::Approved,
        reason_id: None,
        is_special: false,
    });
    assert!(evaluate_booking(&catalog, &student, &snapshot(session), now()).is_ok());
}

#[test]
fn test_portal_gates_come_first() {
    let catalog: Catalog = create_test_catalog();
    let session = create_test_session(1, Some(bcheck_id(1)), date!(2026 - 03 - 10), time!(10:00));

    let mut must_change = create_test_student(7, LEVEL_LOW);
    must_change.must_change_password = true;
    assert_eq!(
        evaluate_booking(&catalog, &must_change, &snapshot(session.clone()), now()).unwrap_err(),
        BookingRejection::PasswordChangeRequired
    );

    let mut blocked = create_test_student(7, LEVEL_LOW);
    blocked.profile = Some(ProfileState {
        id: 1,
        code: String::from("debt"),
        name: String::from("Outstanding balance"),
        can_schedule: false,
        can_view_agenda: true,
    });
    assert_eq!(
        evaluate_booking(&catalog, &blocked, &snapshot(session.clone()), now())
            .unwrap_err()
            .code(),
        "permission_denied"
    );

    let mut frozen = create_test_student(7, LEVEL_LOW);
    frozen.freezes.push(FreezePeriod {
        id: 1,
        student_id: 7,
        enrollment_id: 1,
        start_date: date!(2026 - 03 - 01),
        end_date: date!(2026 - 03 - 15),
        state: FreezeState::Approved,
        reason_id: None,
        is_special: false,
    });
    let rejection = evaluate_booking(&catalog, &frozen, &snapshot(session), now()).unwrap_err();
    assert_eq!(
        rejection,
        BookingRejection::PermissionDenied {
            reason: String::from("enrollment frozen")
        }
    );
}

#[test]
fn test_every_rejection_has_a_distinct_code() {
    let rejections = [
        BookingRejection::NoEffectiveSubject {
            reason: String::new(),
        },
        BookingRejection::NoCapacity,
        BookingRejection::SessionNotBookable {
            reason: String::new(),
        },
        BookingRejection::DeliveryModeMismatch {
            reason: String::new(),
        },
        BookingRejection::AudienceOutOfRange {
            unit: 1,
            from: 2,
            to: 3,
        },
        BookingRejection::AlreadyCompleted {
            subject: String::new(),
        },
        BookingRejection::MissingPrerequisites(crate::MissingPrerequisites::default()),
        BookingRejection::TimeConflict {
            line_id: 1,
            subject: String::new(),
            start: String::new(),
        },
        BookingRejection::UnitOrderingViolation { unit: 1 },
        BookingRejection::PermissionDenied {
            reason: String::new(),
        },
        BookingRejection::PasswordChangeRequired,
    ];
    let codes: std::collections::BTreeSet<&str> = rejections.iter().map(BookingRejection::code).collect();
    assert_eq!(codes.len(), rejections.len());
}
