// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;

use std::collections::BTreeSet;

use aula::{BookingPolicy, Command, State, TransitionResult};
use aula_audit::{Actor, Cause};
use aula_domain::{
    Campus, CampusType, Catalog, CatalogSeed, ClassSession, DeliveryMode, Enrollment,
    EnrollmentState, Level, Phase, Plan, Program, SessionState, Student, Subject,
    SubjectCategory, SubjectClassification, Teacher,
};
use time::macros::{date, datetime};
use time::{Date, PrimitiveDateTime, Time};

use crate::{PersistTransitionResult, Persistence, PersistenceError};

pub const PROGRAM: i64 = 1;
pub const PLAN: i64 = 10;
pub const PHASE: i64 = 100;
pub const LEVEL_LOW: i64 = 1000;
pub const LEVEL_HIGH: i64 = 1001;
pub const CAMPUS: i64 = 1;
pub const TEACHER: i64 = 1;
pub const STUDENT: i64 = 7;
pub const OTHER_STUDENT: i64 = 8;

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("student:7"), String::from("student"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn now() -> PrimitiveDateTime {
    datetime!(2026 - 03 - 09 08:00)
}

pub fn bcheck_id(unit: u32) -> i64 {
    100 + i64::from(unit)
}

pub fn bskill_id(unit: u32, number: u32) -> i64 {
    200 + i64::from(unit) * 10 + i64::from(number)
}

fn subject(id: i64, name: String, level_id: i64, category: SubjectCategory, unit: u32) -> Subject {
    Subject {
        id,
        name,
        alias: None,
        code: format!("S{id}"),
        level_id,
        category,
        classification: SubjectClassification::Regular,
        unit_number: Some(unit),
        bskill_number: None,
        unit_block_start: None,
        unit_block_end: None,
        sequence: 0,
        evaluable: true,
        prerequisite_ids: BTreeSet::new(),
        plan_ids: BTreeSet::new(),
    }
}

/// Units 1-4 in A1 and 5-8 in A2; each skill is gated by its unit's B-check.
pub fn create_test_seed() -> CatalogSeed {
    let mut subjects = Vec::new();
    for unit in 1..=8 {
        let level_id = if unit <= 4 { LEVEL_LOW } else { LEVEL_HIGH };
        let mut bcheck = subject(
            bcheck_id(unit),
            format!("BCheck {unit}"),
            level_id,
            SubjectCategory::BCheck,
            unit,
        );
        bcheck.classification = SubjectClassification::Prerequisite;
        subjects.push(bcheck);
        for number in 1..=4 {
            let mut skill = subject(
                bskill_id(unit, number),
                format!("Skill {unit}.{number}"),
                level_id,
                SubjectCategory::BSkills,
                unit,
            );
            skill.bskill_number = Some(number);
            skill.prerequisite_ids.insert(bcheck_id(unit));
            subjects.push(skill);
        }
    }

    CatalogSeed {
        programs: vec![Program {
            id: PROGRAM,
            name: String::from("English"),
            code: String::from("ENG"),
            program_type: String::from("language"),
        }],
        plans: vec![Plan {
            id: PLAN,
            name: String::from("Standard"),
            code: String::from("STD"),
            program_id: PROGRAM,
        }],
        phases: vec![Phase {
            id: PHASE,
            name: String::from("Basic"),
            sequence: 1,
            program_id: PROGRAM,
        }],
        levels: vec![
            Level {
                id: LEVEL_LOW,
                name: String::from("A1"),
                sequence: 1,
                phase_id: PHASE,
                min_unit: 1,
                max_unit: 4,
            },
            Level {
                id: LEVEL_HIGH,
                name: String::from("A2"),
                sequence: 2,
                phase_id: PHASE,
                min_unit: 5,
                max_unit: 8,
            },
        ],
        subjects,
        campuses: vec![Campus {
            id: CAMPUS,
            name: String::from("Centro"),
            code: String::from("CEN"),
            city: String::from("Bogota"),
            campus_type: CampusType::Physical,
        }],
        classrooms: Vec::new(),
        teachers: vec![Teacher {
            id: TEACHER,
            name: String::from("Ana"),
        }],
        templates: Vec::new(),
    }
}

pub fn create_test_student(id: i64) -> Student {
    Student {
        id,
        name: format!("Student {id}"),
        document: format!("DOC{id}"),
        program_id: Some(PROGRAM),
        plan_id: Some(PLAN),
        current_phase_id: Some(PHASE),
        current_level_id: Some(LEVEL_LOW),
        preferred_delivery_mode: DeliveryMode::Presential,
        preferred_campus_id: Some(CAMPUS),
        profile_state_id: None,
        current_unit: 1,
    }
}

pub fn create_test_enrollment(id: i64, student_id: i64) -> Enrollment {
    Enrollment {
        id,
        student_id,
        subject_id: None,
        program_id: PROGRAM,
        plan_id: Some(PLAN),
        phase_id: Some(PHASE),
        level_id: Some(LEVEL_LOW),
        campus_id: Some(CAMPUS),
        delivery_mode: DeliveryMode::Presential,
        state: EnrollmentState::Enrolled,
        start_date: date!(2026 - 01 - 05),
        end_date: None,
        final_grade: None,
    }
}

pub fn create_test_session(
    id: i64,
    subject_id: i64,
    date: Date,
    start: Time,
    max_capacity: u32,
) -> ClassSession {
    ClassSession {
        id,
        agenda_id: None,
        program_id: PROGRAM,
        subject_id: Some(subject_id),
        template_id: None,
        teacher_id: TEACHER,
        campus_id: CAMPUS,
        subcampus_id: None,
        date,
        time_start: start,
        time_end: start + time::Duration::hours(1),
        delivery_mode: DeliveryMode::Presential,
        max_capacity,
        audience_unit_from: Some(1),
        audience_unit_to: Some(8),
        meeting_link: None,
        is_published: true,
        active: true,
        state: SessionState::Active,
        elective_pool_id: None,
    }
}

/// A database with the test catalog and two enrolled students.
pub fn setup() -> (Persistence, Catalog) {
    let mut persistence = Persistence::new_in_memory().unwrap();
    persistence.seed_catalog(&create_test_seed()).unwrap();
    for (enrollment_id, student_id) in [(70, STUDENT), (80, OTHER_STUDENT)] {
        persistence
            .insert_student(&create_test_student(student_id))
            .unwrap();
        persistence
            .insert_enrollment(&create_test_enrollment(enrollment_id, student_id))
            .unwrap();
    }
    let catalog = persistence.load_catalog().unwrap();
    (persistence, catalog)
}

/// Plans a booking from fresh snapshots.
pub fn plan_booking(
    persistence: &mut Persistence,
    catalog: &Catalog,
    student_id: i64,
    session_id: i64,
) -> TransitionResult {
    let state = State::new(now(), BookingPolicy::default())
        .with_student(persistence.load_student_snapshot(student_id).unwrap())
        .with_session(
            persistence
                .load_session_snapshot(session_id, student_id)
                .unwrap(),
        );
    aula::apply(
        catalog,
        &state,
        Command::BookSession,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap()
}

pub fn book(
    persistence: &mut Persistence,
    catalog: &Catalog,
    student_id: i64,
    session_id: i64,
) -> Result<PersistTransitionResult, PersistenceError> {
    let result = plan_booking(persistence, catalog, student_id, session_id);
    persistence.persist_transition(&result, now())
}

/// Applies a session-level command against the session's roster.
pub fn apply_to_session(
    persistence: &mut Persistence,
    catalog: &Catalog,
    session_id: i64,
    command: Command,
    at: PrimitiveDateTime,
) -> TransitionResult {
    let state = State::new(at, BookingPolicy::default())
        .with_session(persistence.load_session_snapshot(session_id, 0).unwrap())
        .with_roster(persistence.load_roster(session_id).unwrap());
    aula::apply(
        catalog,
        &state,
        command,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap()
}
