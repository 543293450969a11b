// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::collections::BTreeSet;

use aula_audit::Cause;
use aula_domain::{
    AttendanceStatus, Campus, CampusType, Catalog, CatalogSeed, ClassSession, DeliveryMode,
    Enrollment, EnrollmentState, Level, MappingMode, Phase, Plan, Program, SessionState,
    SessionTemplate, Student, Subject, SubjectCategory, SubjectClassification, Teacher,
};
use aula_persistence::{NewPortalUser, Persistence};
use time::macros::{date, datetime};
use time::{Date, PrimitiveDateTime, Time};

use crate::{
    AddToAgendaRequest, AddToAgendaResponse, AttendanceOutcomeRequest, AuthenticatedActor,
    FinalizeSessionRequest, SetSessionStateRequest, add_to_agenda, finalize_session,
    set_session_state,
};

pub const PROGRAM: i64 = 1;
pub const PLAN: i64 = 10;
pub const PHASE: i64 = 100;
pub const LEVEL_LOW: i64 = 1000;
pub const LEVEL_HIGH: i64 = 1001;
pub const CAMPUS: i64 = 1;
pub const ONLINE_CAMPUS: i64 = 2;
pub const TEACHER: i64 = 1;
pub const BCHECK_TEMPLATE: i64 = 1;
pub const STUDENT: i64 = 7;
pub const OTHER_STUDENT: i64 = 8;
pub const PASSWORD: &str = "Welcome123";

pub fn now() -> PrimitiveDateTime {
    datetime!(2026 - 03 - 09 08:00)
}

/// Monday of the fixture week.
pub const WEEK: Date = date!(2026 - 03 - 09);

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-1"), String::from("API request"))
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

/// Units 1-4 in A1 and 5-8 in A2, a physical and an online campus, and a
/// B-check template that maps to the student's pending B-check.
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
        campuses: vec![
            Campus {
                id: CAMPUS,
                name: String::from("Centro"),
                code: String::from("CEN"),
                city: String::from("Bogota"),
                campus_type: CampusType::Physical,
            },
            Campus {
                id: ONLINE_CAMPUS,
                name: String::from("Virtual"),
                code: String::from("VIR"),
                city: String::from("Online"),
                campus_type: CampusType::Online,
            },
        ],
        classrooms: Vec::new(),
        teachers: vec![Teacher {
            id: TEACHER,
            name: String::from("Ana"),
        }],
        templates: vec![SessionTemplate {
            id: BCHECK_TEMPLATE,
            name: String::from("BCheck"),
            category: SubjectCategory::BCheck,
            mapping_mode: MappingMode::Pair,
            skill_number: None,
        }],
    }
}

pub fn create_test_student(id: i64, level_id: i64) -> Student {
    Student {
        id,
        name: format!("Student {id}"),
        document: format!("DOC{id}"),
        program_id: Some(PROGRAM),
        plan_id: Some(PLAN),
        current_phase_id: Some(PHASE),
        current_level_id: Some(level_id),
        preferred_delivery_mode: DeliveryMode::Presential,
        preferred_campus_id: Some(CAMPUS),
        profile_state_id: None,
        current_unit: 1,
    }
}

pub fn create_test_enrollment(id: i64, student_id: i64, level_id: i64) -> Enrollment {
    Enrollment {
        id,
        student_id,
        subject_id: None,
        program_id: PROGRAM,
        plan_id: Some(PLAN),
        phase_id: Some(PHASE),
        level_id: Some(level_id),
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

/// A session that maps to the student's pending B-check.
pub fn create_template_session(id: i64, date: Date, start: Time, from: u32, to: u32) -> ClassSession {
    ClassSession {
        subject_id: None,
        template_id: Some(BCHECK_TEMPLATE),
        audience_unit_from: Some(from),
        audience_unit_to: Some(to),
        ..create_test_session(id, 0, date, start, 10)
    }
}

pub fn add_student(persistence: &mut Persistence, student_id: i64, level_id: i64) {
    persistence
        .insert_student(&create_test_student(student_id, level_id))
        .unwrap();
    persistence
        .insert_enrollment(&create_test_enrollment(
            student_id * 10,
            student_id,
            level_id,
        ))
        .unwrap();
}

/// A database with the test catalog and two A1 students.
pub fn setup() -> (Persistence, Catalog) {
    let mut persistence = Persistence::new_in_memory().unwrap();
    persistence.seed_catalog(&create_test_seed()).unwrap();
    add_student(&mut persistence, STUDENT, LEVEL_LOW);
    add_student(&mut persistence, OTHER_STUDENT, LEVEL_LOW);
    let catalog = persistence.load_catalog().unwrap();
    (persistence, catalog)
}

pub fn create_user(
    persistence: &mut Persistence,
    login: &str,
    role: &str,
    student_id: Option<i64>,
) -> AuthenticatedActor {
    persistence
        .create_portal_user(
            &NewPortalUser {
                login,
                display_name: login,
                password: PASSWORD,
                role,
                student_id,
                must_change_password: false,
            },
            now(),
        )
        .unwrap();
    let user = persistence.get_user_by_login(login).unwrap().unwrap();
    AuthenticatedActor::from_user(&user).unwrap()
}

pub fn student_actor(persistence: &mut Persistence, student_id: i64) -> AuthenticatedActor {
    create_user(
        persistence,
        &format!("student{student_id}"),
        "student",
        Some(student_id),
    )
}

pub fn coach_actor(persistence: &mut Persistence) -> AuthenticatedActor {
    create_user(persistence, "coach", "coach", None)
}

pub fn admin_actor(persistence: &mut Persistence) -> AuthenticatedActor {
    create_user(persistence, "admin", "admin", None)
}

pub fn add(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    session_id: i64,
) -> AddToAgendaResponse {
    add_to_agenda(
        persistence,
        catalog,
        actor,
        &AddToAgendaRequest {
            session_id,
            week_start: None,
        },
        &create_test_cause(),
        now(),
    )
    .unwrap()
}

pub fn outcome(student_id: i64, status: AttendanceStatus) -> AttendanceOutcomeRequest {
    AttendanceOutcomeRequest {
        student_id,
        status: status.to_string(),
        novedad: None,
        notes: None,
    }
}

/// Starts a session and finalizes it with the given outcomes.
pub fn run_session(
    persistence: &mut Persistence,
    catalog: &Catalog,
    coach: &AuthenticatedActor,
    session_id: i64,
    outcomes: Vec<AttendanceOutcomeRequest>,
) -> Vec<i64> {
    set_session_state(
        persistence,
        catalog,
        coach,
        session_id,
        &SetSessionStateRequest {
            target: String::from("started"),
        },
        &create_test_cause(),
        now(),
    )
    .unwrap();
    finalize_session(
        persistence,
        catalog,
        coach,
        session_id,
        &FinalizeSessionRequest { outcomes },
        &create_test_cause(),
        now(),
    )
    .unwrap()
    .history_ids
}

/// Books `subject_id` in a new session and records the outcome.
#[allow(clippy::too_many_arguments)]
pub fn take_subject(
    persistence: &mut Persistence,
    catalog: &Catalog,
    student: &AuthenticatedActor,
    coach: &AuthenticatedActor,
    session_id: i64,
    subject_id: i64,
    date: Date,
    status: AttendanceStatus,
) {
    persistence
        .insert_session(&create_test_session(
            session_id,
            subject_id,
            date,
            time::macros::time!(18:00),
            10,
        ))
        .unwrap();
    let response = add(persistence, catalog, student, session_id);
    assert_eq!(response.status, "ok", "{}", response.message);
    let student_id = student.student_id.unwrap();
    run_session(
        persistence,
        catalog,
        coach,
        session_id,
        vec![outcome(student_id, status)],
    );
}
