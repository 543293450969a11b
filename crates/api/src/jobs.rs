// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Periodic maintenance jobs.
//!
//! Every job is idempotent: running it twice in a row changes nothing the
//! second time.

use time::{Duration, PrimitiveDateTime};
use tracing::{debug, error, info};

use aula::{Command, TransitionResult, apply};
use aula_audit::{Actor, Cause};
use aula_domain::{Catalog, ClassSession};
use aula_persistence::{PersistTransitionResult, Persistence};

use crate::config::PolicyBundle;
use crate::error::{ApiError, translate_core_error, translate_persistence_error};
use crate::handlers::session_state;
use crate::request_response::MaintenanceReport;

fn finalize_one(
    persistence: &mut Persistence,
    catalog: &Catalog,
    policy: &PolicyBundle,
    session: &ClassSession,
    now: PrimitiveDateTime,
) -> Result<usize, ApiError> {
    let state = session_state(persistence, session.id, policy, now)?;
    let result: TransitionResult = apply(
        catalog,
        &state,
        Command::FinalizeSession {
            outcomes: Vec::new(),
        },
        Actor::system("finalizer"),
        Cause::new(
            String::from("finalize-sweep"),
            format!("Session {} ended past the grace period", session.id),
        ),
    )
    .map_err(translate_core_error)?;

    match persistence
        .persist_transition(&result, now)
        .map_err(translate_persistence_error)?
    {
        PersistTransitionResult::Attendance(commit) => Ok(commit.history_ids.len()),
        other => Err(ApiError::Internal {
            message: format!("Unexpected finalization result: {other:?}"),
        }),
    }
}

/// Finalizes started sessions that ended more than the grace period ago.
///
/// A session that fails to finalize is logged and left for the next run.
///
/// # Errors
///
/// Returns an error if the policy or the due sessions cannot be read.
pub fn finalize_due_sessions(
    persistence: &mut Persistence,
    catalog: &Catalog,
    now: PrimitiveDateTime,
) -> Result<usize, ApiError> {
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let cutoff: PrimitiveDateTime = now - Duration::minutes(policy.booking.finalize_grace_minutes);
    let due: Vec<ClassSession> = persistence
        .list_started_sessions_ending_by(cutoff)
        .map_err(translate_persistence_error)?;

    let mut finalized: usize = 0;
    for session in &due {
        match finalize_one(persistence, catalog, &policy, session, now) {
            Ok(rows) => {
                info!(session_id = session.id, history_rows = rows, "Auto-finalized session");
                finalized += 1;
            }
            Err(e) => error!(session_id = session.id, error = %e, "Auto-finalization failed"),
        }
    }
    Ok(finalized)
}

/// Moves agenda lines of done or cancelled sessions to the trash.
///
/// # Errors
///
/// Returns an error if the sweep fails.
pub fn purge_closed_lines(
    persistence: &mut Persistence,
    now: PrimitiveDateTime,
) -> Result<usize, ApiError> {
    let purged: usize = persistence
        .purge_closed_session_lines(now)
        .map_err(translate_persistence_error)?;
    if purged > 0 {
        info!(purged, "Trashed lines of closed sessions");
    }
    Ok(purged)
}

/// Recomputes and stores every student's current unit.
///
/// # Errors
///
/// Returns an error if a student cannot be loaded or updated.
pub fn recompute_current_units(
    persistence: &mut Persistence,
    catalog: &Catalog,
) -> Result<usize, ApiError> {
    let student_ids: Vec<i64> = persistence
        .list_student_ids()
        .map_err(translate_persistence_error)?;

    let mut updated: usize = 0;
    for student_id in student_ids {
        let student = persistence
            .load_student_snapshot(student_id)
            .map_err(translate_persistence_error)?;
        let unit: u32 = student.current_unit(catalog);
        if persistence
            .update_current_unit(student_id, unit)
            .map_err(translate_persistence_error)?
        {
            debug!(student_id, current_unit = unit, "Current unit changed");
            updated += 1;
        }
    }
    info!(updated, "Recomputed current units");
    Ok(updated)
}

/// Deletes trashed lines older than the retention period.
///
/// # Errors
///
/// Returns an error if the policy cannot be read or the delete fails.
pub fn purge_expired_trash(
    persistence: &mut Persistence,
    now: PrimitiveDateTime,
) -> Result<usize, ApiError> {
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let cutoff: PrimitiveDateTime = now - Duration::days(policy.trash_retention_days);
    let purged: usize = persistence
        .purge_trash(cutoff)
        .map_err(translate_persistence_error)?;
    if purged > 0 {
        info!(purged, retention_days = policy.trash_retention_days, "Purged trash");
    }
    Ok(purged)
}

/// Deletes expired portal sessions.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn expire_sessions(
    persistence: &mut Persistence,
    now: PrimitiveDateTime,
) -> Result<usize, ApiError> {
    let expired: usize = persistence
        .delete_expired_sessions(now)
        .map_err(translate_persistence_error)?;
    if expired > 0 {
        info!(expired, "Deleted expired portal sessions");
    }
    Ok(expired)
}

/// Runs every maintenance job in order.
///
/// Finalization runs first so its sessions' lines are trashed in the same
/// pass and the recompute sees the new history.
///
/// # Errors
///
/// Returns the first job error.
pub fn run_maintenance(
    persistence: &mut Persistence,
    catalog: &Catalog,
    now: PrimitiveDateTime,
) -> Result<MaintenanceReport, ApiError> {
    Ok(MaintenanceReport {
        finalized_sessions: finalize_due_sessions(persistence, catalog, now)?,
        purged_lines: purge_closed_lines(persistence, now)?,
        updated_students: recompute_current_units(persistence, catalog)?,
        purged_trash: purge_expired_trash(persistence, now)?,
        expired_sessions: expire_sessions(persistence, now)?,
    })
}
