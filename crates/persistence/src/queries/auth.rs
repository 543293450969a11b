// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Portal user and session queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::{PortalSessionData, PortalUserData};
use crate::diesel_schema::{password_history, portal_sessions, portal_users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for portal user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = portal_users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct PortalUserRow {
    user_id: i64,
    login: String,
    display_name: String,
    password_hash: String,
    role: String,
    student_id: Option<i64>,
    must_change_password: i32,
    is_disabled: i32,
    created_at: String,
    last_login_at: Option<String>,
}

impl PortalUserRow {
    fn into_data(self) -> PortalUserData {
        PortalUserData {
            user_id: self.user_id,
            login: self.login,
            display_name: self.display_name,
            password_hash: self.password_hash,
            role: self.role,
            student_id: self.student_id,
            must_change_password: self.must_change_password != 0,
            is_disabled: self.is_disabled != 0,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Diesel Queryable struct for portal session rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = portal_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct PortalSessionRow {
    session_id: i64,
    session_token: String,
    user_id: i64,
    created_at: String,
    last_activity_at: String,
    expires_at: String,
}

/// Retrieves a portal user by login.
///
/// Logins are compared case-insensitively; they are stored lowercase.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_login(
    conn: &mut SqliteConnection,
    login: &str,
) -> Result<Option<PortalUserData>, PersistenceError> {
    let normalized_login: String = login.trim().to_lowercase();
    debug!(login = %normalized_login, "Looking up portal user");

    Ok(portal_users::table
        .filter(portal_users::login.eq(&normalized_login))
        .select(PortalUserRow::as_select())
        .first::<PortalUserRow>(conn)
        .optional()?
        .map(PortalUserRow::into_data))
}

/// Retrieves a portal user by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_id(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<PortalUserData>, PersistenceError> {
    Ok(portal_users::table
        .filter(portal_users::user_id.eq(user_id))
        .select(PortalUserRow::as_select())
        .first::<PortalUserRow>(conn)
        .optional()?
        .map(PortalUserRow::into_data))
}

/// Retrieves a portal session by token.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the session is not found.
pub fn get_session_by_token(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<Option<PortalSessionData>, PersistenceError> {
    Ok(portal_sessions::table
        .filter(portal_sessions::session_token.eq(session_token))
        .select(PortalSessionRow::as_select())
        .first::<PortalSessionRow>(conn)
        .optional()?
        .map(|row| PortalSessionData {
            session_id: row.session_id,
            session_token: row.session_token,
            user_id: row.user_id,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            expires_at: row.expires_at,
        }))
}

/// Returns the user's most recent password hashes, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_recent_password_hashes(
    conn: &mut SqliteConnection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<String>, PersistenceError> {
    Ok(password_history::table
        .filter(password_history::user_id.eq(user_id))
        .select(password_history::password_hash)
        .order(password_history::entry_id.desc())
        .limit(limit)
        .load(conn)?)
}

/// Counts portal users.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_users(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(portal_users::table.count().get_result(conn)?)
}
