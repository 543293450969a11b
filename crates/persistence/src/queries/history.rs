// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Academic history queries. History rows are immutable; readers see them
//! through their amendments.

use diesel::SqliteConnection;
use diesel::prelude::*;

use aula_domain::{HistoryAmendment, HistoryRecord, apply_amendments};

use crate::data_models::{AmendmentRow, HistoryRow};
use crate::diesel_schema::{academic_history, history_amendments};
use crate::error::PersistenceError;

/// Lists a student's history rows as stored, oldest session first.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_raw_history(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<HistoryRecord>, PersistenceError> {
    academic_history::table
        .filter(academic_history::student_id.eq(student_id))
        .select(HistoryRow::as_select())
        .order((
            academic_history::session_date.asc(),
            academic_history::session_time_start.asc(),
            academic_history::history_id.asc(),
        ))
        .load::<HistoryRow>(conn)?
        .into_iter()
        .map(HistoryRow::into_domain)
        .collect()
}

/// Lists the amendments recorded against a student's history rows.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_amendments(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<HistoryAmendment>, PersistenceError> {
    let history_ids = academic_history::table
        .filter(academic_history::student_id.eq(student_id))
        .select(academic_history::history_id);
    history_amendments::table
        .filter(history_amendments::history_id.eq_any(history_ids))
        .select(AmendmentRow::as_select())
        .order(history_amendments::amendment_id.asc())
        .load::<AmendmentRow>(conn)?
        .into_iter()
        .map(AmendmentRow::into_domain)
        .collect()
}

/// Lists a student's history with amendments applied.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored value is invalid.
pub fn list_history(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<HistoryRecord>, PersistenceError> {
    let history = list_raw_history(conn, student_id)?;
    let amendments = list_amendments(conn, student_id)?;
    Ok(apply_amendments(&history, &amendments))
}

/// Retrieves one history row as stored.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the row does not exist.
pub fn get_history_record(
    conn: &mut SqliteConnection,
    history_id: i64,
) -> Result<Option<HistoryRecord>, PersistenceError> {
    academic_history::table
        .filter(academic_history::history_id.eq(history_id))
        .select(HistoryRow::as_select())
        .first::<HistoryRow>(conn)
        .optional()?
        .map(HistoryRow::into_domain)
        .transpose()
}

