// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking and cancellation commits.
//!
//! Each commit runs in one `IMMEDIATE` transaction, so the write lock is
//! taken before the seat recount and concurrent bookers serialize on it.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::{Date, PrimitiveDateTime};
use tracing::{debug, info, warn};

use aula::{BookingPlan, CancellationPlan, EnrollmentUpdate};
use aula_audit::AuditEvent;
use aula_domain::{SessionEnrollmentState, SessionState, has_seat};

use crate::data_models::{
    BookingCommit, CancellationCommit, format_date, format_datetime, from_unit, to_unit,
};
use crate::diesel_schema::{
    class_sessions, session_enrollments, weekly_plan_line_trash, weekly_plan_lines, weekly_plans,
};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::queries::agenda::count_seats_held;

/// Returns the student's plan for the week, creating it on first access.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn get_or_create_weekly_plan(
    conn: &mut SqliteConnection,
    student_id: i64,
    week_start: Date,
) -> Result<i64, PersistenceError> {
    let week: String = format_date(week_start)?;
    diesel::insert_or_ignore_into(weekly_plans::table)
        .values((
            weekly_plans::student_id.eq(student_id),
            weekly_plans::week_start.eq(&week),
        ))
        .execute(conn)?;
    Ok(weekly_plans::table
        .filter(weekly_plans::student_id.eq(student_id))
        .filter(weekly_plans::week_start.eq(&week))
        .select(weekly_plans::plan_id)
        .first(conn)?)
}

/// Persists the agenda filters a student used for a week.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn save_plan_filters(
    conn: &mut SqliteConnection,
    student_id: i64,
    week_start: Date,
    campus_id: Option<i64>,
    city: Option<&str>,
) -> Result<i64, PersistenceError> {
    let plan_id = get_or_create_weekly_plan(conn, student_id, week_start)?;
    diesel::update(weekly_plans::table.filter(weekly_plans::plan_id.eq(plan_id)))
        .set((
            weekly_plans::filter_campus_id.eq(campus_id),
            weekly_plans::filter_city.eq(city),
        ))
        .execute(conn)?;
    Ok(plan_id)
}

/// Applies seat state changes.
pub(crate) fn apply_enrollment_updates(
    conn: &mut SqliteConnection,
    updates: &[EnrollmentUpdate],
) -> Result<(), PersistenceError> {
    for update in updates {
        diesel::update(
            session_enrollments::table
                .filter(session_enrollments::enrollment_id.eq(update.enrollment_id)),
        )
        .set((
            session_enrollments::state.eq(update.state.as_str()),
            session_enrollments::late_cancel.eq(i32::from(update.late_cancel)),
        ))
        .execute(conn)?;
    }
    Ok(())
}

fn confirm_seat(conn: &mut SqliteConnection, plan: &BookingPlan) -> Result<i64, PersistenceError> {
    let unit: Option<i32> = plan.effective_unit_number.map(from_unit).transpose()?;

    // A seat taken since the snapshot was loaded is reused as well.
    let existing: Option<i64> = match plan.existing_enrollment_id {
        Some(id) => Some(id),
        None => session_enrollments::table
            .filter(session_enrollments::session_id.eq(plan.session_id))
            .filter(session_enrollments::student_id.eq(plan.student_id))
            .filter(session_enrollments::state.ne(SessionEnrollmentState::Cancelled.as_str()))
            .select(session_enrollments::enrollment_id)
            .first(conn)
            .optional()?,
    };

    if let Some(enrollment_id) = existing {
        diesel::update(
            session_enrollments::table.filter(session_enrollments::enrollment_id.eq(enrollment_id)),
        )
        .set((
            session_enrollments::effective_subject_id.eq(plan.effective_subject_id),
            session_enrollments::effective_unit_number.eq(unit),
            session_enrollments::state.eq(SessionEnrollmentState::Confirmed.as_str()),
            session_enrollments::late_cancel.eq(0),
        ))
        .execute(conn)?;
        return Ok(enrollment_id);
    }

    Ok(diesel::insert_into(session_enrollments::table)
        .values((
            session_enrollments::session_id.eq(plan.session_id),
            session_enrollments::student_id.eq(plan.student_id),
            session_enrollments::effective_subject_id.eq(plan.effective_subject_id),
            session_enrollments::effective_unit_number.eq(unit),
            session_enrollments::state.eq(SessionEnrollmentState::Confirmed.as_str()),
        ))
        .returning(session_enrollments::enrollment_id)
        .get_result(conn)?)
}

/// Commits an admitted booking.
///
/// Within one transaction: recounts the seats held by other students
/// against the session's capacity, upserts the weekly-plan line, creates or
/// re-activates the seat as `confirmed`, moves the session from `active` to
/// `with_enrollment`, and writes the audit event.
///
/// # Errors
///
/// Returns `CapacityExceeded` if the recount finds the session full; nothing
/// is written then. Returns an error if any write fails.
pub fn commit_booking(
    conn: &mut SqliteConnection,
    plan: &BookingPlan,
    event: &AuditEvent,
) -> Result<BookingCommit, PersistenceError> {
    let commit = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let capacity: i32 = class_sessions::table
            .filter(class_sessions::session_id.eq(plan.session_id))
            .select(class_sessions::max_capacity)
            .first(conn)?;
        let held: u32 = count_seats_held(conn, plan.session_id, Some(plan.student_id))?;
        if !has_seat(to_unit(capacity)?, held) {
            warn!(
                session_id = plan.session_id,
                student_id = plan.student_id,
                "Seat recount found the session full"
            );
            return Err(PersistenceError::CapacityExceeded {
                session_id: plan.session_id,
            });
        }

        let plan_id = get_or_create_weekly_plan(conn, plan.student_id, plan.week_start)?;
        diesel::insert_or_ignore_into(weekly_plan_lines::table)
            .values((
                weekly_plan_lines::plan_id.eq(plan_id),
                weekly_plan_lines::session_id.eq(plan.session_id),
                weekly_plan_lines::effective_subject_id.eq(plan.effective_subject_id),
                weekly_plan_lines::start_datetime.eq(format_datetime(plan.start_datetime)?),
                weekly_plan_lines::line_date.eq(format_date(plan.date)?),
            ))
            .execute(conn)?;
        let line_id: i64 = weekly_plan_lines::table
            .filter(weekly_plan_lines::plan_id.eq(plan_id))
            .filter(weekly_plan_lines::session_id.eq(plan.session_id))
            .select(weekly_plan_lines::line_id)
            .first(conn)?;

        let enrollment_id = confirm_seat(conn, plan)?;

        if plan.activate_session {
            diesel::update(
                class_sessions::table
                    .filter(class_sessions::session_id.eq(plan.session_id))
                    .filter(class_sessions::state.eq(SessionState::Active.as_str())),
            )
            .set(class_sessions::state.eq(SessionState::WithEnrollment.as_str()))
            .execute(conn)?;
        }

        let event_id = persist_audit_event(conn, event)?;
        Ok(BookingCommit {
            line_id,
            plan_id,
            enrollment_id,
            event_id,
        })
    })?;

    info!(
        student_id = plan.student_id,
        session_id = plan.session_id,
        line_id = commit.line_id,
        enrollment_id = commit.enrollment_id,
        "Committed booking"
    );
    Ok(commit)
}

fn trash_line(
    conn: &mut SqliteConnection,
    student_id: i64,
    line_id: i64,
    reason: &str,
    now: PrimitiveDateTime,
) -> Result<bool, PersistenceError> {
    let line: Option<(i64, i64, i64, String, String)> = weekly_plan_lines::table
        .filter(weekly_plan_lines::line_id.eq(line_id))
        .select((
            weekly_plan_lines::plan_id,
            weekly_plan_lines::session_id,
            weekly_plan_lines::effective_subject_id,
            weekly_plan_lines::start_datetime,
            weekly_plan_lines::line_date,
        ))
        .first(conn)
        .optional()?;
    let Some((plan_id, session_id, effective_subject_id, start_datetime, line_date)) = line else {
        return Ok(false);
    };

    diesel::insert_into(weekly_plan_line_trash::table)
        .values((
            weekly_plan_line_trash::line_id.eq(line_id),
            weekly_plan_line_trash::plan_id.eq(plan_id),
            weekly_plan_line_trash::student_id.eq(student_id),
            weekly_plan_line_trash::session_id.eq(session_id),
            weekly_plan_line_trash::effective_subject_id.eq(effective_subject_id),
            weekly_plan_line_trash::start_datetime.eq(start_datetime),
            weekly_plan_line_trash::line_date.eq(line_date),
            weekly_plan_line_trash::deleted_at.eq(format_datetime(now)?),
            weekly_plan_line_trash::reason.eq(reason),
        ))
        .execute(conn)?;
    diesel::delete(weekly_plan_lines::table.filter(weekly_plan_lines::line_id.eq(line_id)))
        .execute(conn)?;
    Ok(true)
}

/// Commits a planned cancellation.
///
/// The line and its dependents move to the trash vault, their seats change
/// as planned, and the audit event is written, all in one transaction.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is written then.
pub fn commit_cancellation(
    conn: &mut SqliteConnection,
    student_id: i64,
    plan: &CancellationPlan,
    event: &AuditEvent,
    now: PrimitiveDateTime,
) -> Result<CancellationCommit, PersistenceError> {
    let commit = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let mut removed_line_ids: Vec<i64> = Vec::new();
        let reason = if plan.late_cancel {
            "late_cancel"
        } else {
            "cancelled"
        };
        if trash_line(conn, student_id, plan.line_id, reason, now)? {
            removed_line_ids.push(plan.line_id);
        }
        for line_id in &plan.dependent_line_ids {
            if trash_line(conn, student_id, *line_id, "dependent", now)? {
                removed_line_ids.push(*line_id);
            }
        }
        apply_enrollment_updates(conn, &plan.enrollment_updates)?;
        let event_id = persist_audit_event(conn, event)?;
        Ok(CancellationCommit {
            removed_line_ids,
            event_id,
        })
    })?;

    if plan.late_cancel {
        info!(student_id, line_id = plan.line_id, "Committed late cancellation");
    } else {
        info!(student_id, line_id = plan.line_id, "Committed cancellation");
    }
    debug!(removed = ?commit.removed_line_ids, "Lines moved to trash");
    Ok(commit)
}
