// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Portal user and session mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::PrimitiveDateTime;
use tracing::{debug, info};

use crate::data_models::format_datetime;
use crate::diesel_schema::{password_history, portal_sessions, portal_users};
use crate::error::PersistenceError;

fn hash_password(password: &str) -> Result<String, PersistenceError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
}

/// A portal account to create.
#[derive(Debug, Clone, Copy)]
pub struct NewPortalUser<'a> {
    pub login: &'a str,
    pub display_name: &'a str,
    pub password: &'a str,
    pub role: &'a str,
    pub student_id: Option<i64>,
    pub must_change_password: bool,
}

/// Creates a portal user.
///
/// The login is stored lowercase; the password is hashed with bcrypt and
/// recorded in the password history.
///
/// # Errors
///
/// Returns an error if the login already exists or the write fails.
pub fn create_portal_user(
    conn: &mut SqliteConnection,
    user: &NewPortalUser<'_>,
    now: PrimitiveDateTime,
) -> Result<i64, PersistenceError> {
    let normalized_login: String = user.login.trim().to_lowercase();
    let password_hash: String = hash_password(user.password)?;
    let created_at: String = format_datetime(now)?;

    let user_id = conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let user_id: i64 = diesel::insert_into(portal_users::table)
            .values((
                portal_users::login.eq(&normalized_login),
                portal_users::display_name.eq(user.display_name),
                portal_users::password_hash.eq(&password_hash),
                portal_users::role.eq(user.role),
                portal_users::student_id.eq(user.student_id),
                portal_users::must_change_password.eq(i32::from(user.must_change_password)),
                portal_users::created_at.eq(&created_at),
            ))
            .returning(portal_users::user_id)
            .get_result(conn)?;
        diesel::insert_into(password_history::table)
            .values((
                password_history::user_id.eq(user_id),
                password_history::password_hash.eq(&password_hash),
                password_history::created_at.eq(&created_at),
            ))
            .execute(conn)?;
        Ok(user_id)
    })?;

    info!(user_id, login = %normalized_login, role = user.role, "Created portal user");
    Ok(user_id)
}

/// Replaces a user's password and clears the forced-change flag.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn update_password(
    conn: &mut SqliteConnection,
    user_id: i64,
    new_password: &str,
    now: PrimitiveDateTime,
) -> Result<(), PersistenceError> {
    let password_hash: String = hash_password(new_password)?;
    let changed_at: String = format_datetime(now)?;
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        diesel::update(portal_users::table.filter(portal_users::user_id.eq(user_id)))
            .set((
                portal_users::password_hash.eq(&password_hash),
                portal_users::must_change_password.eq(0),
            ))
            .execute(conn)?;
        diesel::insert_into(password_history::table)
            .values((
                password_history::user_id.eq(user_id),
                password_history::password_hash.eq(&password_hash),
                password_history::created_at.eq(&changed_at),
            ))
            .execute(conn)?;
        Ok(())
    })?;
    info!(user_id, "Password changed");
    Ok(())
}

/// Flags or clears the forced password change for a user.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn set_must_change_password(
    conn: &mut SqliteConnection,
    user_id: i64,
    required: bool,
) -> Result<(), PersistenceError> {
    diesel::update(portal_users::table.filter(portal_users::user_id.eq(user_id)))
        .set(portal_users::must_change_password.eq(i32::from(required)))
        .execute(conn)?;
    Ok(())
}

/// Records a successful login.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn update_last_login(
    conn: &mut SqliteConnection,
    user_id: i64,
    now: PrimitiveDateTime,
) -> Result<(), PersistenceError> {
    debug!(user_id, "Updating last_login_at");
    diesel::update(portal_users::table.filter(portal_users::user_id.eq(user_id)))
        .set(portal_users::last_login_at.eq(Some(format_datetime(now)?)))
        .execute(conn)?;
    Ok(())
}

/// Creates a bearer session.
///
/// # Errors
///
/// Returns an error if the token already exists or the write fails.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    user_id: i64,
    now: PrimitiveDateTime,
    expires_at: PrimitiveDateTime,
) -> Result<i64, PersistenceError> {
    let created_at: String = format_datetime(now)?;
    let session_id: i64 = diesel::insert_into(portal_sessions::table)
        .values((
            portal_sessions::session_token.eq(session_token),
            portal_sessions::user_id.eq(user_id),
            portal_sessions::created_at.eq(&created_at),
            portal_sessions::last_activity_at.eq(&created_at),
            portal_sessions::expires_at.eq(format_datetime(expires_at)?),
        ))
        .returning(portal_sessions::session_id)
        .get_result(conn)?;
    info!(session_id, user_id, "Created portal session");
    Ok(session_id)
}

/// Records activity on a session.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn touch_session(
    conn: &mut SqliteConnection,
    session_id: i64,
    now: PrimitiveDateTime,
) -> Result<(), PersistenceError> {
    diesel::update(portal_sessions::table.filter(portal_sessions::session_id.eq(session_id)))
        .set(portal_sessions::last_activity_at.eq(format_datetime(now)?))
        .execute(conn)?;
    Ok(())
}

/// Deletes a session by token.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_session(conn: &mut SqliteConnection, session_token: &str) -> Result<(), PersistenceError> {
    diesel::delete(portal_sessions::table.filter(portal_sessions::session_token.eq(session_token)))
        .execute(conn)?;
    debug!("Deleted portal session");
    Ok(())
}

/// Deletes every session that expired at or before `now`.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: PrimitiveDateTime,
) -> Result<usize, PersistenceError> {
    let deleted: usize = diesel::delete(
        portal_sessions::table.filter(portal_sessions::expires_at.le(format_datetime(now)?)),
    )
    .execute(conn)?;
    if deleted > 0 {
        info!(deleted, "Deleted expired portal sessions");
    }
    Ok(deleted)
}
