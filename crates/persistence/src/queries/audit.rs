// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use diesel::SqliteConnection;
use diesel::prelude::*;

use aula_audit::{AuditEvent, AuditScope};

use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Diesel Queryable struct for audit event rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct AuditEventRow {
    event_id: i64,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
    student_id: Option<i64>,
    session_id: Option<i64>,
}

impl AuditEventRow {
    fn into_event(self) -> Result<AuditEvent, PersistenceError> {
        let event = AuditEvent::new(
            serde_json::from_str(&self.actor_json)?,
            serde_json::from_str(&self.cause_json)?,
            serde_json::from_str(&self.action_json)?,
            serde_json::from_str(&self.before_snapshot_json)?,
            serde_json::from_str(&self.after_snapshot_json)?,
            AuditScope::new(self.student_id, self.session_id),
        );
        Ok(event.with_id(self.event_id))
    }
}

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns `NotFound` if the event does not exist, or an error if it cannot
/// be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first::<AuditEventRow>(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Audit event {event_id}")))?
        .into_event()
}

/// Lists the audit events touching a student, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn list_student_events(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    audit_events::table
        .filter(audit_events::student_id.eq(student_id))
        .select(AuditEventRow::as_select())
        .order(audit_events::event_id.asc())
        .load::<AuditEventRow>(conn)?
        .into_iter()
        .map(AuditEventRow::into_event)
        .collect()
}

/// Lists the audit events touching a session, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn list_session_events(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    audit_events::table
        .filter(audit_events::session_id.eq(session_id))
        .select(AuditEventRow::as_select())
        .order(audit_events::event_id.asc())
        .load::<AuditEventRow>(conn)?
        .into_iter()
        .map(AuditEventRow::into_event)
        .collect()
}
