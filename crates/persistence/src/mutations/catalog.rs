// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Import touchpoints: the writes external catalog, ledger and agenda tools
//! perform. The engine itself never edits these tables.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use aula_domain::{
    Agenda, CatalogSeed, ClassSession, Enrollment, FreezePeriod, FreezeReason, ProfileState,
    Student,
};

use crate::data_models::{
    AgendaRow, CampusRow, ClassSessionRow, ClassroomRow, EnrollmentRow, FreezePeriodRow,
    LevelRow, PhaseRow, PlanRow, ProfileStateRow, ProgramRow, StudentRow, SubjectRow,
    TeacherRow, TemplateRow,
};
use crate::diesel_schema::{
    academic_history, agendas, campuses, class_sessions, classrooms, enrollments,
    freeze_periods, freeze_reasons, levels, phases, plans, profile_states, programs,
    session_templates, students, subject_plans, subject_prerequisites, subject_progress,
    subjects, teachers,
};
use crate::error::PersistenceError;

/// Writes a whole catalog in one transaction.
///
/// # Errors
///
/// Returns an error if any row violates a constraint; nothing is written then.
pub fn seed_catalog(conn: &mut SqliteConnection, seed: &CatalogSeed) -> Result<(), PersistenceError> {
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        for program in &seed.programs {
            diesel::insert_into(programs::table)
                .values(&ProgramRow::from_domain(program))
                .execute(conn)?;
        }
        for plan in &seed.plans {
            diesel::insert_into(plans::table)
                .values(&PlanRow::from_domain(plan))
                .execute(conn)?;
        }
        for phase in &seed.phases {
            diesel::insert_into(phases::table)
                .values(&PhaseRow::from_domain(phase))
                .execute(conn)?;
        }
        for level in &seed.levels {
            diesel::insert_into(levels::table)
                .values(&LevelRow::from_domain(level)?)
                .execute(conn)?;
        }
        for subject in &seed.subjects {
            diesel::insert_into(subjects::table)
                .values(&SubjectRow::from_domain(subject)?)
                .execute(conn)?;
        }
        // Edges go in once every subject exists.
        for subject in &seed.subjects {
            for prerequisite_id in &subject.prerequisite_ids {
                diesel::insert_into(subject_prerequisites::table)
                    .values((
                        subject_prerequisites::subject_id.eq(subject.id),
                        subject_prerequisites::prerequisite_id.eq(prerequisite_id),
                    ))
                    .execute(conn)?;
            }
            for plan_id in &subject.plan_ids {
                diesel::insert_into(subject_plans::table)
                    .values((
                        subject_plans::subject_id.eq(subject.id),
                        subject_plans::plan_id.eq(plan_id),
                    ))
                    .execute(conn)?;
            }
        }
        for campus in &seed.campuses {
            diesel::insert_into(campuses::table)
                .values(&CampusRow::from_domain(campus))
                .execute(conn)?;
        }
        for classroom in &seed.classrooms {
            diesel::insert_into(classrooms::table)
                .values(&ClassroomRow::from_domain(classroom)?)
                .execute(conn)?;
        }
        for teacher in &seed.teachers {
            diesel::insert_into(teachers::table)
                .values(&TeacherRow::from_domain(teacher))
                .execute(conn)?;
        }
        for template in &seed.templates {
            diesel::insert_into(session_templates::table)
                .values(&TemplateRow::from_domain(template)?)
                .execute(conn)?;
        }
        Ok(())
    })?;

    info!(
        programs = seed.programs.len(),
        subjects = seed.subjects.len(),
        campuses = seed.campuses.len(),
        "Seeded catalog"
    );
    Ok(())
}

/// Inserts a profile state.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_profile_state(
    conn: &mut SqliteConnection,
    profile: &ProfileState,
) -> Result<(), PersistenceError> {
    diesel::insert_into(profile_states::table)
        .values(&ProfileStateRow::from_domain(profile))
        .execute(conn)?;
    Ok(())
}

/// Inserts a student.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_student(conn: &mut SqliteConnection, student: &Student) -> Result<(), PersistenceError> {
    diesel::insert_into(students::table)
        .values(&StudentRow::from_domain(student)?)
        .execute(conn)?;
    info!(student_id = student.id, "Inserted student");
    Ok(())
}

/// Inserts a ledger entry.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<(), PersistenceError> {
    diesel::insert_into(enrollments::table)
        .values(&EnrollmentRow::from_domain(enrollment)?)
        .execute(conn)?;
    Ok(())
}

/// Inserts a freeze reason.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_freeze_reason(
    conn: &mut SqliteConnection,
    reason: &FreezeReason,
) -> Result<(), PersistenceError> {
    diesel::insert_into(freeze_reasons::table)
        .values((
            freeze_reasons::reason_id.eq(reason.id),
            freeze_reasons::name.eq(&reason.name),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts a freeze period.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_freeze_period(
    conn: &mut SqliteConnection,
    freeze: &FreezePeriod,
) -> Result<(), PersistenceError> {
    diesel::insert_into(freeze_periods::table)
        .values(&FreezePeriodRow::from_domain(freeze)?)
        .execute(conn)?;
    Ok(())
}

/// Inserts an agenda.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_agenda(conn: &mut SqliteConnection, agenda: &Agenda) -> Result<(), PersistenceError> {
    diesel::insert_into(agendas::table)
        .values(&AgendaRow::from_domain(agenda)?)
        .execute(conn)?;
    Ok(())
}

/// Inserts a class session, deriving its start and end datetimes.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_session(
    conn: &mut SqliteConnection,
    session: &ClassSession,
) -> Result<(), PersistenceError> {
    diesel::insert_into(class_sessions::table)
        .values(&ClassSessionRow::from_domain(session)?)
        .execute(conn)?;
    info!(session_id = session.id, date = %session.date, "Inserted session");
    Ok(())
}

/// Records the grade tracked for a student in a subject.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn set_subject_grade(
    conn: &mut SqliteConnection,
    student_id: i64,
    subject_id: i64,
    grade: Option<f64>,
) -> Result<(), PersistenceError> {
    diesel::replace_into(subject_progress::table)
        .values((
            subject_progress::student_id.eq(student_id),
            subject_progress::subject_id.eq(subject_id),
            subject_progress::grade.eq(grade),
        ))
        .execute(conn)?;
    Ok(())
}

/// Deletes a student and everything they own.
///
/// Students with academic history are archival and are never deleted.
///
/// # Errors
///
/// Returns `StudentArchived` if history exists, `NotFound` if the student
/// does not exist, or an error if the delete fails.
pub fn delete_student(conn: &mut SqliteConnection, student_id: i64) -> Result<(), PersistenceError> {
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let history_rows: i64 = academic_history::table
            .filter(academic_history::student_id.eq(student_id))
            .count()
            .get_result(conn)?;
        if history_rows > 0 {
            return Err(PersistenceError::StudentArchived { student_id });
        }
        let deleted: usize =
            diesel::delete(students::table.filter(students::student_id.eq(student_id)))
                .execute(conn)?;
        if deleted == 0 {
            return Err(PersistenceError::NotFound(format!("Student {student_id}")));
        }
        Ok(())
    })?;
    info!(student_id, "Deleted student");
    Ok(())
}
