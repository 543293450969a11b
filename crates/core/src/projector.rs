// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Projects attendance outcomes into academic history and derives the
//! progression they cause.

use crate::context::StudentSnapshot;
use aula_domain::{
    AttendanceStatus, Catalog, ClassSession, DeliveryMode, EnrollmentState, HistoryRecord,
    Novedad, SessionEnrollment, active_enrollments, current_unit,
};
use time::{Date, PrimitiveDateTime, Time};

/// A history row ready to be inserted. Keyed by (student, session).
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryRow {
    pub student_id: i64,
    pub session_id: i64,
    pub enrollment_id: Option<i64>,
    pub session_date: Date,
    pub session_time_start: Time,
    pub session_time_end: Time,
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub level_id: Option<i64>,
    pub subject_id: i64,
    pub teacher_id: Option<i64>,
    pub campus_id: Option<i64>,
    pub delivery_mode: DeliveryMode,
    pub attendance_status: AttendanceStatus,
    pub novedad: Novedad,
    pub notes: Option<String>,
    pub grade: Option<f64>,
    pub created_at: PrimitiveDateTime,
}

impl NewHistoryRow {
    /// The row as it will read once stored, for progression recomputation.
    #[must_use]
    pub fn as_record(&self) -> HistoryRecord {
        HistoryRecord {
            id: 0,
            student_id: self.student_id,
            session_id: Some(self.session_id),
            enrollment_id: self.enrollment_id,
            session_date: self.session_date,
            session_time_start: self.session_time_start,
            session_time_end: self.session_time_end,
            program_id: self.program_id,
            plan_id: self.plan_id,
            phase_id: self.phase_id,
            level_id: self.level_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            campus_id: self.campus_id,
            delivery_mode: self.delivery_mode,
            attendance_status: self.attendance_status,
            novedad: self.novedad,
            notes: self.notes.clone(),
            grade: self.grade,
            created_at: self.created_at,
        }
    }
}

/// The coach's outcome for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub novedad: Option<Novedad>,
    pub notes: Option<String>,
}

/// Changes to a student's materialized progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionUpdate {
    pub student_id: i64,
    pub current_unit: u32,
    /// Level and phase the student moves to when a level was cleared.
    pub level_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub level_cleared: bool,
    /// An `enrolled` enrollment that moves to `in_progress`.
    pub enrollment_started: Option<i64>,
}

/// Returns whether `student` already has a history row for `session_id`.
#[must_use]
pub fn has_history_row(student: &StudentSnapshot, session_id: i64) -> bool {
    student
        .history
        .iter()
        .any(|h| h.session_id == Some(session_id))
}

/// Builds the history row for one student's outcome in a session.
///
/// Date, times, teacher, campus and delivery mode come from the session;
/// plan and enrollment from the ledger; level, phase and subject from the
/// effective subject.
#[must_use]
pub fn project_row(
    catalog: &Catalog,
    session: &ClassSession,
    enrollment: &SessionEnrollment,
    student: &StudentSnapshot,
    mark: &AttendanceMark,
    grade: Option<f64>,
    now: PrimitiveDateTime,
) -> NewHistoryRow {
    let subject = catalog.subject(enrollment.effective_subject_id);
    let level_id = subject.map(|s| s.level_id);
    let phase_id = level_id
        .and_then(|id| catalog.level(id))
        .map(|level| level.phase_id);
    let ledger_entry = active_enrollments(&student.enrollments)
        .into_iter()
        .find(|e| e.program_id == session.program_id);
    let plan_id = student
        .program_plan(catalog)
        .filter(|pp| pp.program_id == session.program_id)
        .and_then(|pp| pp.plan_id);

    NewHistoryRow {
        student_id: student.student.id,
        session_id: session.id,
        enrollment_id: ledger_entry.map(|e| e.id),
        session_date: session.date,
        session_time_start: session.time_start,
        session_time_end: session.time_end,
        program_id: session.program_id,
        plan_id,
        phase_id,
        level_id,
        subject_id: enrollment.effective_subject_id,
        teacher_id: Some(session.teacher_id),
        campus_id: Some(session.campus_id),
        delivery_mode: session.delivery_mode,
        attendance_status: mark.status,
        novedad: mark.novedad.unwrap_or_default(),
        notes: mark.notes.clone(),
        grade,
        created_at: now,
    }
}

/// Recomputes a student's progression as if `new_rows` were already stored.
///
/// When the new current unit belongs to a later level than the student's
/// current one, the level is cleared and the student moves to it. The first
/// attendance under an `enrolled` ledger entry starts that entry.
#[must_use]
pub fn progression_after(
    catalog: &Catalog,
    student: &StudentSnapshot,
    program_id: i64,
    new_rows: &[NewHistoryRow],
) -> ProgressionUpdate {
    let mut history = student.history.clone();
    history.extend(new_rows.iter().map(NewHistoryRow::as_record));
    let unit = current_unit(&history, catalog, student.unit_floor(catalog));

    let current_sequence = student
        .student
        .current_level_id
        .and_then(|id| catalog.level(id))
        .map(|level| level.sequence);
    let next_level = catalog
        .level_for_unit(program_id, unit)
        .filter(|level| current_sequence.is_none_or(|seq| level.sequence > seq));

    let any_attended = new_rows
        .iter()
        .any(|r| r.attendance_status == AttendanceStatus::Attended);
    let enrollment_started = if any_attended {
        active_enrollments(&student.enrollments)
            .into_iter()
            .find(|e| e.program_id == program_id && e.state == EnrollmentState::Enrolled)
            .map(|e| e.id)
    } else {
        None
    };

    ProgressionUpdate {
        student_id: student.student.id,
        current_unit: unit,
        level_id: next_level.map(|level| level.id),
        phase_id: next_level.map(|level| level.phase_id),
        level_cleared: next_level.is_some() && current_sequence.is_some(),
        enrollment_started,
    }
}
