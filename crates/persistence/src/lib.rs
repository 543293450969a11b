// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the academy booking engine.
//!
//! This crate stores the catalog, the enrollment ledger, the published
//! agenda, weekly plans, academic history, portal accounts and the audit
//! log in `SQLite` through Diesel.
//!
//! ## Storage
//!
//! - Migrations are embedded and run when a connection is opened
//! - Foreign key enforcement is switched on and verified at startup
//! - File databases run in WAL mode
//! - In-memory databases get a unique shared-cache name per call, so tests
//!   are isolated without relying on timestamps
//!
//! ## Commits
//!
//! The booking engine plans every change from snapshots; this crate applies
//! the plan. Each commit runs in one `IMMEDIATE` transaction together with
//! its audit event. Booking commits recount seats inside the transaction and
//! fail with [`PersistenceError::CapacityExceeded`] when the session filled
//! up after the snapshot was taken.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{Date, PrimitiveDateTime};
use tracing::info;

use aula::{Effect, RosterEntry, SessionSnapshot, StudentSnapshot, TransitionResult};
use aula_audit::AuditEvent;
use aula_domain::{
    Agenda, Catalog, CatalogSeed, ClassSession, Enrollment, FreezePeriod, FreezeReason,
    HistoryRecord, ProfileState, SessionEnrollment, Student, WeeklyPlan,
};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{
    AgendaLine, AttendanceCommit, BookingCommit, CancellationCommit, PortalSessionData,
    PortalUserData, SessionFilter, TrashedLine, format_datetime, parse_datetime,
};
pub use error::PersistenceError;
pub use mutations::NewPortalUser;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What persisting a transition wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistTransitionResult {
    Booked(BookingCommit),
    /// The student already held the session; nothing was written.
    AlreadyBooked { line_id: i64 },
    Cancelled(CancellationCommit),
    Attendance(AttendanceCommit),
    SessionMoved { event_id: i64 },
    Amended { amendment_id: i64 },
}

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique shared in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url = format!("file:memdb_aula_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection =
            backend::sqlite::open(&shared_memory_url, backend::sqlite::Storage::Memory)?;
        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let conn: SqliteConnection = backend::sqlite::open(path_str, backend::sqlite::Storage::File)?;
        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Catalog & imports
    // ========================================================================

    /// Loads and validates the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogInvalid` if the stored catalog fails validation (for
    /// example a prerequisite cycle), or an error if loading fails.
    pub fn load_catalog(&mut self) -> Result<Catalog, PersistenceError> {
        let seed = queries::catalog::load_catalog_seed(&mut self.conn)?;
        let catalog =
            Catalog::from_seed(seed).map_err(|e| PersistenceError::CatalogInvalid(e.to_string()))?;
        info!("Catalog loaded and validated");
        Ok(catalog)
    }

    /// Writes a whole catalog in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any row violates a constraint.
    pub fn seed_catalog(&mut self, seed: &CatalogSeed) -> Result<(), PersistenceError> {
        mutations::catalog::seed_catalog(&mut self.conn, seed)
    }

    /// Inserts a profile state.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_profile_state(&mut self, profile: &ProfileState) -> Result<(), PersistenceError> {
        mutations::catalog::insert_profile_state(&mut self.conn, profile)
    }

    /// Inserts a student.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_student(&mut self, student: &Student) -> Result<(), PersistenceError> {
        mutations::catalog::insert_student(&mut self.conn, student)
    }

    /// Inserts a ledger entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<(), PersistenceError> {
        mutations::catalog::insert_enrollment(&mut self.conn, enrollment)
    }

    /// Inserts a freeze reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_freeze_reason(&mut self, reason: &FreezeReason) -> Result<(), PersistenceError> {
        mutations::catalog::insert_freeze_reason(&mut self.conn, reason)
    }

    /// Inserts a freeze period.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_freeze_period(&mut self, freeze: &FreezePeriod) -> Result<(), PersistenceError> {
        mutations::catalog::insert_freeze_period(&mut self.conn, freeze)
    }

    /// Inserts an agenda.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_agenda(&mut self, agenda: &Agenda) -> Result<(), PersistenceError> {
        mutations::catalog::insert_agenda(&mut self.conn, agenda)
    }

    /// Inserts a class session.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_session(&mut self, session: &ClassSession) -> Result<(), PersistenceError> {
        mutations::catalog::insert_session(&mut self.conn, session)
    }

    /// Records the grade tracked for a student in a subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_subject_grade(
        &mut self,
        student_id: i64,
        subject_id: i64,
        grade: Option<f64>,
    ) -> Result<(), PersistenceError> {
        mutations::catalog::set_subject_grade(&mut self.conn, student_id, subject_id, grade)
    }

    /// Deletes a student without academic history.
    ///
    /// # Errors
    ///
    /// Returns `StudentArchived` if the student has history.
    pub fn delete_student(&mut self, student_id: i64) -> Result<(), PersistenceError> {
        mutations::catalog::delete_student(&mut self.conn, student_id)
    }

    // ========================================================================
    // Students & history
    // ========================================================================

    /// Retrieves a student by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_student(&mut self, student_id: i64) -> Result<Option<Student>, PersistenceError> {
        queries::students::get_student(&mut self.conn, student_id)
    }

    /// Lists every student ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_student_ids(&mut self) -> Result<Vec<i64>, PersistenceError> {
        queries::students::list_student_ids(&mut self.conn)
    }

    /// Lists a student's ledger entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_enrollments(&mut self, student_id: i64) -> Result<Vec<Enrollment>, PersistenceError> {
        queries::students::list_enrollments(&mut self.conn, student_id)
    }

    /// Loads everything the booking engine reads about one student.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the student does not exist.
    pub fn load_student_snapshot(
        &mut self,
        student_id: i64,
    ) -> Result<StudentSnapshot, PersistenceError> {
        queries::students::load_student_snapshot(&mut self.conn, student_id)
    }

    /// Lists a student's history with amendments applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_history(&mut self, student_id: i64) -> Result<Vec<HistoryRecord>, PersistenceError> {
        queries::history::list_history(&mut self.conn, student_id)
    }

    /// Lists a student's history rows as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_raw_history(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<HistoryRecord>, PersistenceError> {
        queries::history::list_raw_history(&mut self.conn, student_id)
    }

    /// Retrieves one history row as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_history_record(
        &mut self,
        history_id: i64,
    ) -> Result<Option<HistoryRecord>, PersistenceError> {
        queries::history::get_history_record(&mut self.conn, history_id)
    }

    // ========================================================================
    // Agenda
    // ========================================================================

    /// Retrieves a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session(&mut self, session_id: i64) -> Result<Option<ClassSession>, PersistenceError> {
        queries::agenda::get_session(&mut self.conn, session_id)
    }

    /// Loads everything the booking engine reads about a session for a student.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub fn load_session_snapshot(
        &mut self,
        session_id: i64,
        student_id: i64,
    ) -> Result<SessionSnapshot, PersistenceError> {
        queries::agenda::load_session_snapshot(&mut self.conn, session_id, student_id)
    }

    /// Counts the pending and confirmed seats of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_seats_held(&mut self, session_id: i64) -> Result<u32, PersistenceError> {
        queries::agenda::count_seats_held(&mut self.conn, session_id, None)
    }

    /// Lists every seat ever taken in a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_session_enrollments(
        &mut self,
        session_id: i64,
    ) -> Result<Vec<SessionEnrollment>, PersistenceError> {
        queries::agenda::list_session_enrollments(&mut self.conn, session_id)
    }

    /// Loads a session's roster.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn load_roster(&mut self, session_id: i64) -> Result<Vec<RosterEntry>, PersistenceError> {
        queries::agenda::load_roster(&mut self.conn, session_id)
    }

    /// Lists the sessions the portal may offer at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_portal_sessions(
        &mut self,
        filter: &SessionFilter,
        now: PrimitiveDateTime,
    ) -> Result<Vec<ClassSession>, PersistenceError> {
        queries::agenda::list_portal_sessions(&mut self.conn, filter, now)
    }

    /// Lists published, active sessions for external consumers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_published_sessions(
        &mut self,
        filter: &SessionFilter,
    ) -> Result<Vec<ClassSession>, PersistenceError> {
        queries::agenda::list_published_sessions(&mut self.conn, filter)
    }

    /// Finds the student's plan for a week.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_weekly_plan(
        &mut self,
        student_id: i64,
        week_start: Date,
    ) -> Result<Option<WeeklyPlan>, PersistenceError> {
        queries::agenda::find_weekly_plan(&mut self.conn, student_id, week_start)
    }

    /// Returns the student's plan for the week, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn get_or_create_weekly_plan(
        &mut self,
        student_id: i64,
        week_start: Date,
    ) -> Result<i64, PersistenceError> {
        mutations::booking::get_or_create_weekly_plan(&mut self.conn, student_id, week_start)
    }

    /// Persists the agenda filters a student used for a week.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_plan_filters(
        &mut self,
        student_id: i64,
        week_start: Date,
        campus_id: Option<i64>,
        city: Option<&str>,
    ) -> Result<i64, PersistenceError> {
        mutations::booking::save_plan_filters(&mut self.conn, student_id, week_start, campus_id, city)
    }

    /// Lists the student's lines for a week.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn list_agenda_lines(
        &mut self,
        student_id: i64,
        week_start: Date,
    ) -> Result<Vec<AgendaLine>, PersistenceError> {
        queries::agenda::list_agenda_lines(&mut self.conn, student_id, week_start)
    }

    /// Lists started sessions whose end is at or before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_started_sessions_ending_by(
        &mut self,
        cutoff: PrimitiveDateTime,
    ) -> Result<Vec<ClassSession>, PersistenceError> {
        queries::agenda::list_started_sessions_ending_by(&mut self.conn, cutoff)
    }

    /// Lists a student's trashed lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_trash(&mut self, student_id: i64) -> Result<Vec<TrashedLine>, PersistenceError> {
        queries::agenda::list_trash(&mut self.conn, student_id)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Persists the writes of a transition together with its audit event.
    ///
    /// `AlreadyBooked` writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if a booking lost the race for the last
    /// seat, or an error if any write fails.
    pub fn persist_transition(
        &mut self,
        result: &TransitionResult,
        now: PrimitiveDateTime,
    ) -> Result<PersistTransitionResult, PersistenceError> {
        let event = &result.audit_event;
        match &result.effect {
            Effect::Booked(plan) => Ok(PersistTransitionResult::Booked(
                mutations::booking::commit_booking(&mut self.conn, plan, event)?,
            )),
            Effect::AlreadyBooked { line_id, .. } => {
                Ok(PersistTransitionResult::AlreadyBooked { line_id: *line_id })
            }
            Effect::Cancelled(plan) => {
                let student_id = event.scope.student_id.ok_or_else(|| {
                    PersistenceError::Other(String::from("cancellation event without a student"))
                })?;
                Ok(PersistTransitionResult::Cancelled(
                    mutations::booking::commit_cancellation(
                        &mut self.conn,
                        student_id,
                        plan,
                        event,
                        now,
                    )?,
                ))
            }
            Effect::Attendance(plan) => Ok(PersistTransitionResult::Attendance(
                mutations::attendance::commit_attendance(&mut self.conn, plan, event)?,
            )),
            Effect::SessionMoved(plan) => Ok(PersistTransitionResult::SessionMoved {
                event_id: mutations::attendance::commit_session_transition(
                    &mut self.conn,
                    plan,
                    event,
                )?,
            }),
            Effect::Amended(plan) => Ok(PersistTransitionResult::Amended {
                amendment_id: mutations::attendance::commit_amendment(
                    &mut self.conn,
                    plan,
                    event,
                )?,
            }),
        }
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Moves lines of done or cancelled sessions to the trash vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the sweep fails.
    pub fn purge_closed_session_lines(
        &mut self,
        now: PrimitiveDateTime,
    ) -> Result<usize, PersistenceError> {
        mutations::maintenance::purge_closed_session_lines(&mut self.conn, now)
    }

    /// Deletes trashed lines deleted before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn purge_trash(&mut self, cutoff: PrimitiveDateTime) -> Result<usize, PersistenceError> {
        mutations::maintenance::purge_trash(&mut self.conn, cutoff)
    }

    /// Stores a recomputed current unit; returns whether it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_current_unit(
        &mut self,
        student_id: i64,
        current_unit: u32,
    ) -> Result<bool, PersistenceError> {
        mutations::maintenance::update_current_unit(&mut self.conn, student_id, current_unit)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Reads one configuration parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_config_value(&mut self, key: &str) -> Result<Option<String>, PersistenceError> {
        queries::config::get_config_value(&mut self.conn, key)
    }

    /// Reads every configuration parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_config(&mut self) -> Result<BTreeMap<String, String>, PersistenceError> {
        queries::config::list_config(&mut self.conn)
    }

    /// Sets a configuration parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_config_value(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        mutations::config::set_config_value(&mut self.conn, key, value)
    }

    /// Sets a configuration parameter only when it has no value yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn seed_config_value(&mut self, key: &str, value: &str) -> Result<bool, PersistenceError> {
        mutations::config::seed_config_value(&mut self.conn, key, value)
    }

    // ========================================================================
    // Portal auth
    // ========================================================================

    /// Creates a portal user.
    ///
    /// # Errors
    ///
    /// Returns an error if the login exists or the write fails.
    pub fn create_portal_user(
        &mut self,
        user: &NewPortalUser<'_>,
        now: PrimitiveDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::auth::create_portal_user(&mut self.conn, user, now)
    }

    /// Retrieves a portal user by login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_login(
        &mut self,
        login: &str,
    ) -> Result<Option<PortalUserData>, PersistenceError> {
        queries::auth::get_user_by_login(&mut self.conn, login)
    }

    /// Retrieves a portal user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: i64) -> Result<Option<PortalUserData>, PersistenceError> {
        queries::auth::get_user_by_id(&mut self.conn, user_id)
    }

    /// Counts portal users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_users(&mut self) -> Result<i64, PersistenceError> {
        queries::auth::count_users(&mut self.conn)
    }

    /// Returns the user's most recent password hashes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_recent_password_hashes(
        &mut self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<String>, PersistenceError> {
        queries::auth::list_recent_password_hashes(&mut self.conn, user_id, limit)
    }

    /// Replaces a user's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_password(
        &mut self,
        user_id: i64,
        new_password: &str,
        now: PrimitiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::auth::update_password(&mut self.conn, user_id, new_password, now)
    }

    /// Flags or clears the forced password change for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_must_change_password(
        &mut self,
        user_id: i64,
        required: bool,
    ) -> Result<(), PersistenceError> {
        mutations::auth::set_must_change_password(&mut self.conn, user_id, required)
    }

    /// Records a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_last_login(
        &mut self,
        user_id: i64,
        now: PrimitiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::auth::update_last_login(&mut self.conn, user_id, now)
    }

    /// Creates a bearer session.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn create_session(
        &mut self,
        session_token: &str,
        user_id: i64,
        now: PrimitiveDateTime,
        expires_at: PrimitiveDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::auth::create_session(&mut self.conn, session_token, user_id, now, expires_at)
    }

    /// Retrieves a bearer session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<PortalSessionData>, PersistenceError> {
        queries::auth::get_session_by_token(&mut self.conn, session_token)
    }

    /// Records activity on a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn touch_session(
        &mut self,
        session_id: i64,
        now: PrimitiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::auth::touch_session(&mut self.conn, session_id, now)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::auth::delete_session(&mut self.conn, session_token)
    }

    /// Deletes expired sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_expired_sessions(
        &mut self,
        now: PrimitiveDateTime,
    ) -> Result<usize, PersistenceError> {
        mutations::auth::delete_expired_sessions(&mut self.conn, now)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists a standalone audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event does not exist.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Lists the audit events touching a student.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_student_events(
        &mut self,
        student_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_student_events(&mut self.conn, student_id)
    }

    /// Lists the audit events touching a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_session_events(
        &mut self,
        session_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_session_events(&mut self.conn, session_id)
    }
}
