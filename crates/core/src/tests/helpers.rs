// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BookedLine, SessionSnapshot, StudentSnapshot};
use aula_audit::{Actor, Cause};
use aula_domain::{
    AttendanceStatus, Campus, CampusType, Catalog, CatalogSeed, ClassSession, DeliveryMode,
    HistoryRecord, Level, MappingMode, Novedad, Phase, Plan, Program, SessionState,
    SessionTemplate, Student, Subject, SubjectCategory, SubjectClassification,
};
use std::collections::BTreeSet;
use time::macros::{date, datetime, time};
use time::{Date, PrimitiveDateTime, Time};

pub const PROGRAM: i64 = 1;
pub const PLAN: i64 = 10;
pub const LEVEL_LOW: i64 = 1000;
pub const LEVEL_HIGH: i64 = 1001;
pub const PHYSICAL: i64 = 1;
pub const ONLINE: i64 = 2;
pub const TEMPLATE_SKILL_TWO: i64 = 50;
pub const TEMPLATE_PAIR: i64 = 51;
pub const TEMPLATE_BLOCK: i64 = 52;

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("student:7"), String::from("student"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Portal request"))
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

pub fn subject(id: i64, name: String, level_id: i64, category: SubjectCategory) -> Subject {
    Subject {
        id,
        name,
        alias: None,
        code: format!("S{id}"),
        level_id,
        category,
        classification: SubjectClassification::Regular,
        unit_number: None,
        bskill_number: None,
        unit_block_start: None,
        unit_block_end: None,
        sequence: 0,
        evaluable: true,
        prerequisite_ids: BTreeSet::new(),
        plan_ids: BTreeSet::new(),
    }
}

pub fn create_test_catalog() -> Catalog {
    Catalog::from_seed(create_test_seed()).unwrap()
}

/// Units 1-4 in A1, 5-8 in A2; each skill is gated by its unit's B-check.
pub fn create_test_seed() -> CatalogSeed {
    let mut subjects = Vec::new();
    for unit in 1..=8 {
        let level_id = if unit <= 4 { LEVEL_LOW } else { LEVEL_HIGH };
        let mut bcheck = subject(
            bcheck_id(unit),
            format!("BCheck {unit}"),
            level_id,
            SubjectCategory::BCheck,
        );
        bcheck.classification = SubjectClassification::Prerequisite;
        bcheck.unit_number = Some(unit);
        subjects.push(bcheck);
        for number in 1..=4 {
            let mut skill = subject(
                bskill_id(unit, number),
                format!("Skill {unit}.{number}"),
                level_id,
                SubjectCategory::BSkills,
            );
            skill.unit_number = Some(unit);
            skill.bskill_number = Some(number);
            skill.prerequisite_ids.insert(bcheck_id(unit));
            subjects.push(skill);
        }
    }
    for (id, level_id, start, end) in [(300, LEVEL_LOW, 1, 4), (301, LEVEL_HIGH, 5, 8)] {
        let mut oral = subject(
            id,
            String::from("Oral Test"),
            level_id,
            SubjectCategory::OralTest,
        );
        oral.unit_block_start = Some(start);
        oral.unit_block_end = Some(end);
        subjects.push(oral);
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
            id: 100,
            name: String::from("Basic"),
            sequence: 1,
            program_id: PROGRAM,
        }],
        levels: vec![
            Level {
                id: LEVEL_LOW,
                name: String::from("A1"),
                sequence: 1,
                phase_id: 100,
                min_unit: 1,
                max_unit: 4,
            },
            Level {
                id: LEVEL_HIGH,
                name: String::from("A2"),
                sequence: 2,
                phase_id: 100,
                min_unit: 5,
                max_unit: 8,
            },
        ],
        subjects,
        campuses: vec![physical_campus(), online_campus()],
        classrooms: Vec::new(),
        teachers: Vec::new(),
        templates: vec![
            SessionTemplate {
                id: TEMPLATE_SKILL_TWO,
                name: String::from("Skill 2"),
                category: SubjectCategory::BSkills,
                mapping_mode: MappingMode::PerUnit,
                skill_number: Some(2),
            },
            SessionTemplate {
                id: TEMPLATE_PAIR,
                name: String::from("B-check"),
                category: SubjectCategory::BCheck,
                mapping_mode: MappingMode::Pair,
                skill_number: None,
            },
            SessionTemplate {
                id: TEMPLATE_BLOCK,
                name: String::from("Oral"),
                category: SubjectCategory::OralTest,
                mapping_mode: MappingMode::Block,
                skill_number: None,
            },
        ],
    }
}

pub fn physical_campus() -> Campus {
    Campus {
        id: PHYSICAL,
        name: String::from("Centro"),
        code: String::from("CEN"),
        city: String::from("Bogota"),
        campus_type: CampusType::Physical,
    }
}

pub fn online_campus() -> Campus {
    Campus {
        id: ONLINE,
        name: String::from("Virtual"),
        code: String::from("VIR"),
        city: String::from("Online"),
        campus_type: CampusType::Online,
    }
}

pub fn create_test_student(id: i64, level_id: i64) -> StudentSnapshot {
    StudentSnapshot::new(Student {
        id,
        name: format!("Student {id}"),
        document: format!("DOC{id}"),
        program_id: Some(PROGRAM),
        plan_id: Some(PLAN),
        current_phase_id: Some(100),
        current_level_id: Some(level_id),
        preferred_delivery_mode: DeliveryMode::Presential,
        preferred_campus_id: Some(PHYSICAL),
        profile_state_id: None,
        current_unit: 1,
    })
}

pub fn history_row(id: i64, subject_id: i64, status: AttendanceStatus) -> HistoryRecord {
    HistoryRecord {
        id,
        student_id: 7,
        session_id: Some(1000 + id),
        enrollment_id: None,
        session_date: date!(2026 - 02 - 02),
        session_time_start: time!(08:00),
        session_time_end: time!(09:00),
        program_id: PROGRAM,
        plan_id: Some(PLAN),
        phase_id: Some(100),
        level_id: Some(LEVEL_LOW),
        subject_id,
        teacher_id: Some(1),
        campus_id: Some(PHYSICAL),
        delivery_mode: DeliveryMode::Presential,
        attendance_status: status,
        novedad: Novedad::Normal,
        notes: None,
        grade: None,
        created_at: datetime!(2026 - 02 - 02 09:00),
    }
}

/// Attended B-check and four skills for every unit up to `last_unit`.
pub fn completed_through(last_unit: u32) -> Vec<HistoryRecord> {
    let mut rows = Vec::new();
    let mut id = 1;
    for unit in 1..=last_unit {
        rows.push(history_row(id, bcheck_id(unit), AttendanceStatus::Attended));
        id += 1;
        for number in 1..=4 {
            rows.push(history_row(
                id,
                bskill_id(unit, number),
                AttendanceStatus::Attended,
            ));
            id += 1;
        }
    }
    rows
}

pub fn create_test_session(id: i64, subject_id: Option<i64>, date: Date, start: Time) -> ClassSession {
    let end = start + time::Duration::hours(1);
    ClassSession {
        id,
        agenda_id: None,
        program_id: PROGRAM,
        subject_id,
        template_id: None,
        teacher_id: 1,
        campus_id: PHYSICAL,
        subcampus_id: None,
        date,
        time_start: start,
        time_end: end,
        delivery_mode: DeliveryMode::Presential,
        max_capacity: 10,
        audience_unit_from: Some(1),
        audience_unit_to: Some(8),
        meeting_link: None,
        is_published: true,
        active: true,
        state: SessionState::Active,
        elective_pool_id: None,
    }
}

pub fn snapshot(session: ClassSession) -> SessionSnapshot {
    let campus = if session.campus_id == ONLINE {
        online_campus()
    } else {
        physical_campus()
    };
    SessionSnapshot {
        session,
        campus,
        seats_held_by_others: 0,
        student_enrollment: None,
    }
}

pub fn booked_line(line_id: i64, session: &ClassSession, effective_subject_id: i64) -> BookedLine {
    BookedLine {
        line_id,
        plan_id: 1,
        session_id: session.id,
        effective_subject_id,
        date: session.date,
        start: session.datetime_start(),
        end: session.datetime_end(),
        session_state: session.state,
        enrollment_id: Some(line_id + 500),
        enrollment_state: Some(aula_domain::SessionEnrollmentState::Confirmed),
    }
}
