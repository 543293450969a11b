// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendance, finalization, session lifecycle and amendment commits.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use aula::{AmendmentPlan, AttendancePlan, NewHistoryRow, ProgressionUpdate, SessionTransitionPlan};
use aula_audit::AuditEvent;
use aula_domain::EnrollmentState;

use crate::data_models::{
    AttendanceCommit, format_date, format_datetime, format_time, from_unit,
};
use crate::diesel_schema::{
    academic_history, class_sessions, enrollments, history_amendments, students,
};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::mutations::booking::apply_enrollment_updates;

/// Inserts a history row unless the (student, session) key already has one.
///
/// Returns the new row's ID, or `None` when the row already existed.
fn insert_history_row(
    conn: &mut SqliteConnection,
    row: &NewHistoryRow,
) -> Result<Option<i64>, PersistenceError> {
    let inserted: usize = diesel::insert_or_ignore_into(academic_history::table)
        .values((
            academic_history::student_id.eq(row.student_id),
            academic_history::session_id.eq(row.session_id),
            academic_history::enrollment_id.eq(row.enrollment_id),
            academic_history::session_date.eq(format_date(row.session_date)?),
            academic_history::session_time_start.eq(format_time(row.session_time_start)?),
            academic_history::session_time_end.eq(format_time(row.session_time_end)?),
            academic_history::program_id.eq(row.program_id),
            academic_history::plan_id.eq(row.plan_id),
            academic_history::phase_id.eq(row.phase_id),
            academic_history::level_id.eq(row.level_id),
            academic_history::subject_id.eq(row.subject_id),
            academic_history::teacher_id.eq(row.teacher_id),
            academic_history::campus_id.eq(row.campus_id),
            academic_history::delivery_mode.eq(row.delivery_mode.as_str()),
            academic_history::attendance_status.eq(row.attendance_status.as_str()),
            academic_history::novedad.eq(row.novedad.as_str()),
            academic_history::notes.eq(&row.notes),
            academic_history::grade.eq(row.grade),
            academic_history::created_at.eq(format_datetime(row.created_at)?),
        ))
        .execute(conn)?;
    if inserted == 0 {
        debug!(
            student_id = row.student_id,
            session_id = row.session_id,
            "History row already exists"
        );
        return Ok(None);
    }
    Ok(Some(
        academic_history::table
            .filter(academic_history::student_id.eq(row.student_id))
            .filter(academic_history::session_id.eq(row.session_id))
            .select(academic_history::history_id)
            .first(conn)?,
    ))
}

/// Materializes a student's progression.
///
/// The level and phase only move when a level was cleared; the first
/// attendance starts an `enrolled` ledger entry.
pub(crate) fn apply_progression(
    conn: &mut SqliteConnection,
    progression: &ProgressionUpdate,
) -> Result<(), PersistenceError> {
    diesel::update(students::table.filter(students::student_id.eq(progression.student_id)))
        .set(students::current_unit.eq(from_unit(progression.current_unit)?))
        .execute(conn)?;
    if let (Some(level_id), Some(phase_id)) = (progression.level_id, progression.phase_id) {
        diesel::update(students::table.filter(students::student_id.eq(progression.student_id)))
            .set((
                students::current_level_id.eq(level_id),
                students::current_phase_id.eq(phase_id),
            ))
            .execute(conn)?;
        if progression.level_cleared {
            info!(
                student_id = progression.student_id,
                level_id, "Student cleared a level"
            );
        }
    }
    if let Some(enrollment_id) = progression.enrollment_started {
        diesel::update(
            enrollments::table
                .filter(enrollments::enrollment_id.eq(enrollment_id))
                .filter(enrollments::state.eq(EnrollmentState::Enrolled.as_str())),
        )
        .set(enrollments::state.eq(EnrollmentState::InProgress.as_str()))
        .execute(conn)?;
    }
    Ok(())
}

/// Commits attendance outcomes or a finalization.
///
/// Seat states, history rows (idempotent on (student, session)), progression,
/// the session transition and the audit event are written in one
/// transaction.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is written then.
pub fn commit_attendance(
    conn: &mut SqliteConnection,
    plan: &AttendancePlan,
    event: &AuditEvent,
) -> Result<AttendanceCommit, PersistenceError> {
    let commit = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        apply_enrollment_updates(conn, &plan.enrollment_updates)?;

        let mut history_ids: Vec<i64> = Vec::new();
        for row in &plan.history_rows {
            history_ids.extend(insert_history_row(conn, row)?);
        }
        for progression in &plan.progressions {
            apply_progression(conn, progression)?;
        }
        if let Some(state) = plan.session_transition {
            diesel::update(class_sessions::table.filter(class_sessions::session_id.eq(plan.session_id)))
                .set(class_sessions::state.eq(state.as_str()))
                .execute(conn)?;
        }

        let event_id = persist_audit_event(conn, event)?;
        Ok(AttendanceCommit {
            history_ids,
            event_id,
        })
    })?;

    info!(
        session_id = plan.session_id,
        history_rows = commit.history_ids.len(),
        finalized = plan.session_transition.is_some(),
        "Committed attendance"
    );
    Ok(commit)
}

/// Commits a session lifecycle move.
///
/// The move only applies while the session is still in the state it was
/// planned from. Absences owed to late cancellations are projected with it.
///
/// # Errors
///
/// Returns `Other` if the session changed state since it was loaded, or an
/// error if a write fails.
pub fn commit_session_transition(
    conn: &mut SqliteConnection,
    plan: &SessionTransitionPlan,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let event_id = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let moved: usize = diesel::update(
            class_sessions::table
                .filter(class_sessions::session_id.eq(plan.session_id))
                .filter(class_sessions::state.eq(plan.from.as_str())),
        )
        .set(class_sessions::state.eq(plan.to.as_str()))
        .execute(conn)?;
        if moved == 0 {
            return Err(PersistenceError::Other(format!(
                "session {} is no longer {}",
                plan.session_id, plan.from
            )));
        }
        apply_enrollment_updates(conn, &plan.enrollment_updates)?;
        for row in &plan.history_rows {
            insert_history_row(conn, row)?;
        }
        persist_audit_event(conn, event)
    })?;

    info!(
        session_id = plan.session_id,
        from = %plan.from,
        to = %plan.to,
        absences = plan.history_rows.len(),
        "Session moved"
    );
    Ok(event_id)
}

/// Records an amendment over a history row and re-materializes the
/// student's progression.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is written then.
pub fn commit_amendment(
    conn: &mut SqliteConnection,
    plan: &AmendmentPlan,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let amendment_id = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let amendment_id: i64 = diesel::insert_into(history_amendments::table)
            .values((
                history_amendments::history_id.eq(plan.history_id),
                history_amendments::attendance_status
                    .eq(plan.attendance_status.map(|s| s.as_str())),
                history_amendments::novedad.eq(plan.novedad.map(|n| n.as_str())),
                history_amendments::grade.eq(plan.grade),
                history_amendments::reason.eq(&plan.reason),
                history_amendments::created_at.eq(format_datetime(plan.created_at)?),
            ))
            .returning(history_amendments::amendment_id)
            .get_result(conn)?;
        apply_progression(conn, &plan.progression)?;
        persist_audit_event(conn, event)?;
        Ok(amendment_id)
    })?;

    info!(
        history_id = plan.history_id,
        amendment_id, "Recorded history amendment"
    );
    Ok(amendment_id)
}
