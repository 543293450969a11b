// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Sweeps run by scheduled jobs. Every sweep is idempotent.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::PrimitiveDateTime;
use tracing::info;

use aula_domain::SessionState;

use crate::data_models::{format_datetime, from_unit};
use crate::diesel_schema::{
    class_sessions, students, weekly_plan_line_trash, weekly_plan_lines, weekly_plans,
};
use crate::error::PersistenceError;

const CLOSED_STATES: [&str; 2] = [SessionState::Done.as_str(), SessionState::Cancelled.as_str()];

/// Moves lines referencing done or cancelled sessions to the trash vault.
///
/// # Errors
///
/// Returns an error if the sweep fails; nothing is removed then.
pub fn purge_closed_session_lines(
    conn: &mut SqliteConnection,
    now: PrimitiveDateTime,
) -> Result<usize, PersistenceError> {
    let deleted_at: String = format_datetime(now)?;
    let purged = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let closed_sessions = class_sessions::table
            .filter(class_sessions::state.eq_any(CLOSED_STATES))
            .select(class_sessions::session_id);
        let lines: Vec<(i64, i64, i64, i64, i64, String, String)> = weekly_plan_lines::table
            .inner_join(weekly_plans::table)
            .filter(weekly_plan_lines::session_id.eq_any(closed_sessions))
            .select((
                weekly_plan_lines::line_id,
                weekly_plan_lines::plan_id,
                weekly_plans::student_id,
                weekly_plan_lines::session_id,
                weekly_plan_lines::effective_subject_id,
                weekly_plan_lines::start_datetime,
                weekly_plan_lines::line_date,
            ))
            .load(conn)?;

        for (line_id, plan_id, student_id, session_id, subject_id, start, date) in &lines {
            diesel::insert_into(weekly_plan_line_trash::table)
                .values((
                    weekly_plan_line_trash::line_id.eq(line_id),
                    weekly_plan_line_trash::plan_id.eq(plan_id),
                    weekly_plan_line_trash::student_id.eq(student_id),
                    weekly_plan_line_trash::session_id.eq(session_id),
                    weekly_plan_line_trash::effective_subject_id.eq(subject_id),
                    weekly_plan_line_trash::start_datetime.eq(start),
                    weekly_plan_line_trash::line_date.eq(date),
                    weekly_plan_line_trash::deleted_at.eq(&deleted_at),
                    weekly_plan_line_trash::reason.eq("session_closed"),
                ))
                .execute(conn)?;
            diesel::delete(weekly_plan_lines::table.filter(weekly_plan_lines::line_id.eq(line_id)))
                .execute(conn)?;
        }
        Ok(lines.len())
    })?;

    if purged > 0 {
        info!(purged, "Purged lines of closed sessions");
    }
    Ok(purged)
}

/// Deletes trashed lines deleted before `cutoff`.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn purge_trash(
    conn: &mut SqliteConnection,
    cutoff: PrimitiveDateTime,
) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(
        weekly_plan_line_trash::table
            .filter(weekly_plan_line_trash::deleted_at.lt(format_datetime(cutoff)?)),
    )
    .execute(conn)?;
    if deleted > 0 {
        info!(deleted, "Purged trash vault");
    }
    Ok(deleted)
}

/// Stores a recomputed current unit.
///
/// Returns whether the stored value changed.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn update_current_unit(
    conn: &mut SqliteConnection,
    student_id: i64,
    current_unit: u32,
) -> Result<bool, PersistenceError> {
    let unit: i32 = from_unit(current_unit)?;
    let changed: usize = diesel::update(
        students::table
            .filter(students::student_id.eq(student_id))
            .filter(students::current_unit.ne(unit)),
    )
    .set(students::current_unit.eq(unit))
    .execute(conn)?;
    Ok(changed > 0)
}
