// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Student, ledger and booked-line queries.

use std::collections::BTreeMap;

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use aula::{BookedLine, StudentSnapshot};
use aula_domain::{
    Enrollment, FreezePeriod, ProfileState, SessionEnrollment, SessionEnrollmentState, Student,
};

use crate::data_models::{
    ClassSessionRow, EnrollmentRow, FreezePeriodRow, ProfileStateRow, SessionEnrollmentRow,
    StudentRow, WeeklyPlanLineRow, parse_datetime,
};
use crate::diesel_schema::{
    class_sessions, enrollments, freeze_periods, portal_users, profile_states,
    session_enrollments, students, subject_progress, weekly_plan_lines, weekly_plans,
};
use crate::error::PersistenceError;
use crate::queries::history::list_history;

/// Retrieves a student by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the student is not found.
pub fn get_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<Student>, PersistenceError> {
    students::table
        .filter(students::student_id.eq(student_id))
        .select(StudentRow::as_select())
        .first::<StudentRow>(conn)
        .optional()?
        .map(StudentRow::into_domain)
        .transpose()
}

/// Lists every student ID in ascending order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_student_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, PersistenceError> {
    Ok(students::table
        .select(students::student_id)
        .order(students::student_id.asc())
        .load(conn)?)
}

fn get_profile_state(
    conn: &mut SqliteConnection,
    profile_state_id: i64,
) -> Result<Option<ProfileState>, PersistenceError> {
    Ok(profile_states::table
        .filter(profile_states::profile_state_id.eq(profile_state_id))
        .select(ProfileStateRow::as_select())
        .first::<ProfileStateRow>(conn)
        .optional()?
        .map(ProfileStateRow::into_domain))
}

/// Lists the ledger entries of a student.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_enrollments(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<Enrollment>, PersistenceError> {
    enrollments::table
        .filter(enrollments::student_id.eq(student_id))
        .select(EnrollmentRow::as_select())
        .order(enrollments::enrollment_id.asc())
        .load::<EnrollmentRow>(conn)?
        .into_iter()
        .map(EnrollmentRow::into_domain)
        .collect()
}

fn list_freeze_periods(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<FreezePeriod>, PersistenceError> {
    freeze_periods::table
        .filter(freeze_periods::student_id.eq(student_id))
        .select(FreezePeriodRow::as_select())
        .load::<FreezePeriodRow>(conn)?
        .into_iter()
        .map(FreezePeriodRow::into_domain)
        .collect()
}

fn must_change_password(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<bool, PersistenceError> {
    let flagged: i64 = portal_users::table
        .filter(portal_users::student_id.eq(student_id))
        .filter(portal_users::must_change_password.ne(0))
        .count()
        .get_result(conn)?;
    Ok(flagged > 0)
}

/// Loads the student's seat in each of the given sessions.
///
/// Open seats win over cancelled ones; among cancelled seats the newest wins.
pub(crate) fn seats_by_session(
    conn: &mut SqliteConnection,
    student_id: i64,
    session_ids: &[i64],
) -> Result<BTreeMap<i64, SessionEnrollment>, PersistenceError> {
    let rows: Vec<SessionEnrollmentRow> = session_enrollments::table
        .filter(session_enrollments::student_id.eq(student_id))
        .filter(session_enrollments::session_id.eq_any(session_ids))
        .select(SessionEnrollmentRow::as_select())
        .order(session_enrollments::enrollment_id.asc())
        .load(conn)?;

    let mut seats: BTreeMap<i64, SessionEnrollment> = BTreeMap::new();
    for row in rows {
        let seat = row.into_domain()?;
        let keep_existing = seats.get(&seat.session_id).is_some_and(|current| {
            current.state != SessionEnrollmentState::Cancelled
                && seat.state == SessionEnrollmentState::Cancelled
        });
        if !keep_existing {
            seats.insert(seat.session_id, seat);
        }
    }
    Ok(seats)
}

/// Loads every weekly-plan line of the student with its session and seat.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_booked_lines(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<BookedLine>, PersistenceError> {
    let rows: Vec<WeeklyPlanLineRow> = weekly_plan_lines::table
        .inner_join(weekly_plans::table)
        .filter(weekly_plans::student_id.eq(student_id))
        .select(WeeklyPlanLineRow::as_select())
        .order(weekly_plan_lines::start_datetime.asc())
        .load(conn)?;
    let session_ids: Vec<i64> = rows.iter().map(|r| r.session_id).collect();

    let sessions: BTreeMap<i64, ClassSessionRow> = class_sessions::table
        .filter(class_sessions::session_id.eq_any(&session_ids))
        .select(ClassSessionRow::as_select())
        .load::<ClassSessionRow>(conn)?
        .into_iter()
        .map(|s| (s.session_id, s))
        .collect();
    let seats = seats_by_session(conn, student_id, &session_ids)?;

    let mut lines: Vec<BookedLine> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(session_row) = sessions.get(&row.session_id) else {
            continue;
        };
        let seat = seats.get(&row.session_id);
        lines.push(BookedLine {
            line_id: row.line_id,
            plan_id: row.plan_id,
            session_id: row.session_id,
            effective_subject_id: row.effective_subject_id,
            date: crate::data_models::parse_date(&row.line_date)?,
            start: parse_datetime(&session_row.datetime_start)?,
            end: parse_datetime(&session_row.datetime_end)?,
            session_state: crate::data_models::parse_text(&session_row.state)?,
            enrollment_id: seat.map(|s| s.id),
            enrollment_state: seat.map(|s| s.state),
        });
    }
    Ok(lines)
}

/// Loads everything the booking engine reads about one student.
///
/// History is returned with amendments applied.
///
/// # Errors
///
/// Returns `NotFound` if the student does not exist, or an error if a query
/// fails.
pub fn load_student_snapshot(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<StudentSnapshot, PersistenceError> {
    let student = get_student(conn, student_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Student {student_id}")))?;
    let profile = match student.profile_state_id {
        Some(id) => get_profile_state(conn, id)?,
        None => None,
    };

    let mut snapshot = StudentSnapshot::new(student);
    snapshot.profile = profile;
    snapshot.must_change_password = must_change_password(conn, student_id)?;
    snapshot.enrollments = list_enrollments(conn, student_id)?;
    snapshot.freezes = list_freeze_periods(conn, student_id)?;
    snapshot.history = list_history(conn, student_id)?;
    snapshot.lines = list_booked_lines(conn, student_id)?;

    debug!(
        student_id,
        history = snapshot.history.len(),
        lines = snapshot.lines.len(),
        "Loaded student snapshot"
    );
    Ok(snapshot)
}

/// The grade tracked for a student in a subject, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_subject_grade(
    conn: &mut SqliteConnection,
    student_id: i64,
    subject_id: i64,
) -> Result<Option<f64>, PersistenceError> {
    Ok(subject_progress::table
        .filter(subject_progress::student_id.eq(student_id))
        .filter(subject_progress::subject_id.eq(subject_id))
        .select(subject_progress::grade)
        .first::<Option<f64>>(conn)
        .optional()?
        .flatten())
}
