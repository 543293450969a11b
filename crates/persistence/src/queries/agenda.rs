// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Published agenda, seat and weekly-plan queries.

use std::collections::BTreeMap;

use diesel::SqliteConnection;
use diesel::prelude::*;
use num_traits::ToPrimitive;
use time::{Date, PrimitiveDateTime};
use tracing::debug;

use aula::{RosterEntry, SessionSnapshot};
use aula_domain::{ClassSession, SessionEnrollmentState, SessionState, WeeklyPlan};

use crate::data_models::{
    AgendaLine, ClassSessionRow, SessionEnrollmentRow, SessionFilter, TrashRow, TrashedLine,
    WeeklyPlanLineRow, WeeklyPlanRow, format_date, format_datetime,
};
use crate::diesel_schema::{
    campuses, class_sessions, session_enrollments, weekly_plan_line_trash, weekly_plan_lines,
    weekly_plans,
};
use crate::error::PersistenceError;
use crate::queries::catalog::get_campus;
use crate::queries::students::{get_subject_grade, load_student_snapshot, seats_by_session};

const SEAT_STATES: [&str; 2] = [
    SessionEnrollmentState::Pending.as_str(),
    SessionEnrollmentState::Confirmed.as_str(),
];

const BOOKABLE_STATES: [&str; 2] = [
    SessionState::Active.as_str(),
    SessionState::WithEnrollment.as_str(),
];

/// Retrieves a session by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the session is not found.
pub fn get_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Option<ClassSession>, PersistenceError> {
    class_sessions::table
        .filter(class_sessions::session_id.eq(session_id))
        .select(ClassSessionRow::as_select())
        .first::<ClassSessionRow>(conn)
        .optional()?
        .map(ClassSessionRow::into_domain)
        .transpose()
}

/// Counts the seats held in a session (pending or confirmed enrollments),
/// optionally leaving one student out.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_seats_held(
    conn: &mut SqliteConnection,
    session_id: i64,
    excluding_student_id: Option<i64>,
) -> Result<u32, PersistenceError> {
    let mut query = session_enrollments::table
        .filter(session_enrollments::session_id.eq(session_id))
        .filter(session_enrollments::state.eq_any(SEAT_STATES))
        .into_boxed();
    if let Some(student_id) = excluding_student_id {
        query = query.filter(session_enrollments::student_id.ne(student_id));
    }
    let held: i64 = query.count().get_result(conn)?;
    held.to_u32()
        .ok_or_else(|| PersistenceError::ReconstructionError(format!("seat count {held}")))
}

/// Loads everything the booking engine reads about a session for one student.
///
/// # Errors
///
/// Returns `NotFound` if the session does not exist, or an error if a
/// query fails.
pub fn load_session_snapshot(
    conn: &mut SqliteConnection,
    session_id: i64,
    student_id: i64,
) -> Result<SessionSnapshot, PersistenceError> {
    let session = get_session(conn, session_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Session {session_id}")))?;
    let campus = get_campus(conn, session.campus_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Campus {}", session.campus_id)))?;
    let seats_held_by_others = count_seats_held(conn, session_id, Some(student_id))?;
    let student_enrollment = seats_by_session(conn, student_id, &[session_id])?.remove(&session_id);

    debug!(
        session_id,
        student_id, seats_held_by_others, "Loaded session snapshot"
    );
    Ok(SessionSnapshot {
        session,
        campus,
        seats_held_by_others,
        student_enrollment,
    })
}

/// Lists every seat ever taken in a session.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_session_enrollments(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Vec<aula_domain::SessionEnrollment>, PersistenceError> {
    session_enrollments::table
        .filter(session_enrollments::session_id.eq(session_id))
        .select(SessionEnrollmentRow::as_select())
        .order(session_enrollments::enrollment_id.asc())
        .load::<SessionEnrollmentRow>(conn)?
        .into_iter()
        .map(SessionEnrollmentRow::into_domain)
        .collect()
}

/// Loads the session's seats with each student's snapshot and tracked grade.
///
/// Cancelled seats are left out; a student appears at most once.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn load_roster(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Vec<RosterEntry>, PersistenceError> {
    let seats = list_session_enrollments(conn, session_id)?;
    let mut roster: Vec<RosterEntry> = Vec::new();
    for enrollment in seats
        .into_iter()
        .filter(|s| s.state != SessionEnrollmentState::Cancelled)
    {
        if roster
            .iter()
            .any(|r| r.enrollment.student_id == enrollment.student_id)
        {
            continue;
        }
        let student = load_student_snapshot(conn, enrollment.student_id)?;
        let grade = get_subject_grade(conn, enrollment.student_id, enrollment.effective_subject_id)?;
        roster.push(RosterEntry {
            enrollment,
            student,
            grade,
        });
    }
    debug!(session_id, seats = roster.len(), "Loaded roster");
    Ok(roster)
}

fn load_sessions(
    conn: &mut SqliteConnection,
    filter: &SessionFilter,
    bookable_after: Option<PrimitiveDateTime>,
) -> Result<Vec<ClassSession>, PersistenceError> {
    let mut query = class_sessions::table
        .filter(class_sessions::is_published.ne(0))
        .filter(class_sessions::active.ne(0))
        .select(ClassSessionRow::as_select())
        .into_boxed();

    if let Some(start) = filter.start_date {
        query = query.filter(class_sessions::session_date.ge(format_date(start)?));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(class_sessions::session_date.le(format_date(end)?));
    }
    if let Some(campus_id) = filter.campus_id {
        query = query.filter(class_sessions::campus_id.eq(campus_id));
    }
    if let Some(city) = &filter.city {
        let campus_ids = campuses::table
            .filter(campuses::city.eq(city.clone()))
            .select(campuses::campus_id);
        query = query.filter(class_sessions::campus_id.eq_any(campus_ids));
    }
    if let Some(mode) = filter.delivery_mode {
        query = query.filter(class_sessions::delivery_mode.eq(mode.as_str()));
    }
    if let Some(subject_id) = filter.subject_id {
        query = query.filter(class_sessions::subject_id.eq(subject_id));
    }
    if let Some(now) = bookable_after {
        query = query
            .filter(class_sessions::state.eq_any(BOOKABLE_STATES))
            .filter(class_sessions::datetime_start.gt(format_datetime(now)?));
    }

    query
        .order((
            class_sessions::datetime_start.asc(),
            class_sessions::session_id.asc(),
        ))
        .load::<ClassSessionRow>(conn)?
        .into_iter()
        .map(ClassSessionRow::into_domain)
        .collect()
}

/// Lists the sessions the portal may offer: published, active, bookable and
/// starting after `now`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_portal_sessions(
    conn: &mut SqliteConnection,
    filter: &SessionFilter,
    now: PrimitiveDateTime,
) -> Result<Vec<ClassSession>, PersistenceError> {
    load_sessions(conn, filter, Some(now))
}

/// Lists published, active sessions in any state for external consumers.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_published_sessions(
    conn: &mut SqliteConnection,
    filter: &SessionFilter,
) -> Result<Vec<ClassSession>, PersistenceError> {
    load_sessions(conn, filter, None)
}

/// Finds the student's plan for the week starting on `week_start`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_weekly_plan(
    conn: &mut SqliteConnection,
    student_id: i64,
    week_start: Date,
) -> Result<Option<WeeklyPlan>, PersistenceError> {
    weekly_plans::table
        .filter(weekly_plans::student_id.eq(student_id))
        .filter(weekly_plans::week_start.eq(format_date(week_start)?))
        .select(WeeklyPlanRow::as_select())
        .first::<WeeklyPlanRow>(conn)
        .optional()?
        .map(WeeklyPlanRow::into_domain)
        .transpose()
}

/// Lists the lines of the student's plan for a week, with their sessions and
/// the student's seats.
///
/// # Errors
///
/// Returns an error if a query fails.
pub fn list_agenda_lines(
    conn: &mut SqliteConnection,
    student_id: i64,
    week_start: Date,
) -> Result<Vec<AgendaLine>, PersistenceError> {
    let Some(plan) = find_weekly_plan(conn, student_id, week_start)? else {
        return Ok(Vec::new());
    };
    let rows: Vec<WeeklyPlanLineRow> = weekly_plan_lines::table
        .filter(weekly_plan_lines::plan_id.eq(plan.id))
        .select(WeeklyPlanLineRow::as_select())
        .order(weekly_plan_lines::start_datetime.asc())
        .load(conn)?;
    let session_ids: Vec<i64> = rows.iter().map(|r| r.session_id).collect();

    let mut sessions: BTreeMap<i64, ClassSession> = BTreeMap::new();
    for row in class_sessions::table
        .filter(class_sessions::session_id.eq_any(&session_ids))
        .select(ClassSessionRow::as_select())
        .load::<ClassSessionRow>(conn)?
    {
        let session = row.into_domain()?;
        sessions.insert(session.id, session);
    }
    let mut seats = seats_by_session(conn, student_id, &session_ids)?;

    let mut lines: Vec<AgendaLine> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(session) = sessions.get(&row.session_id) else {
            continue;
        };
        let enrollment = seats.remove(&row.session_id);
        lines.push(AgendaLine {
            line: row.into_domain()?,
            session: session.clone(),
            enrollment,
        });
    }
    Ok(lines)
}

/// Lists started sessions whose end is at or before `cutoff`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_started_sessions_ending_by(
    conn: &mut SqliteConnection,
    cutoff: PrimitiveDateTime,
) -> Result<Vec<ClassSession>, PersistenceError> {
    class_sessions::table
        .filter(class_sessions::state.eq(SessionState::Started.as_str()))
        .filter(class_sessions::datetime_end.le(format_datetime(cutoff)?))
        .select(ClassSessionRow::as_select())
        .order(class_sessions::datetime_end.asc())
        .load::<ClassSessionRow>(conn)?
        .into_iter()
        .map(ClassSessionRow::into_domain)
        .collect()
}

/// Lists a student's trashed lines, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_trash(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<TrashedLine>, PersistenceError> {
    Ok(weekly_plan_line_trash::table
        .filter(weekly_plan_line_trash::student_id.eq(student_id))
        .select(TrashRow::as_select())
        .order(weekly_plan_line_trash::trash_id.desc())
        .load::<TrashRow>(conn)?
        .into_iter()
        .map(TrashRow::into_data)
        .collect())
}
