// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod admission;
mod apply;
mod cancel;
mod command;
mod context;
mod error;
mod projector;
mod rejection;
mod resolve;
mod state;

#[cfg(test)]
mod tests;

use aula_domain::{Catalog, ClassSession, SessionState};
use time::PrimitiveDateTime;

// Re-export public types and functions
pub use admission::{BookingDecision, evaluate_booking};
pub use apply::apply;
pub use cancel::{CancellationPlan, EnrollmentUpdate, plan_cancellation};
pub use command::Command;
pub use context::{BookedLine, BookingPolicy, RosterEntry, SessionSnapshot, StudentSnapshot};
pub use error::CoreError;
pub use projector::{
    AttendanceMark, NewHistoryRow, ProgressionUpdate, has_history_row, progression_after,
    project_row,
};
pub use rejection::{BookingRejection, MissingPrerequisites};
pub use resolve::{EffectiveSubject, resolve_effective_subject};
pub use state::{
    AmendmentPlan, AttendancePlan, BookingPlan, Effect, SessionTransitionPlan, State,
    TransitionResult,
};

/// Returns whether a started session is past its end plus the grace period.
///
/// Read-only; the finalization sweep uses it to pick sessions to close.
#[must_use]
pub fn is_due_for_finalization(
    session: &ClassSession,
    now: PrimitiveDateTime,
    grace_minutes: i64,
) -> bool {
    session.state == SessionState::Started
        && session.datetime_end() + time::Duration::minutes(grace_minutes) <= now
}

/// Previews the subject a student would consume in each session.
///
/// Sessions that cannot be resolved are omitted. This is a read-only helper
/// for rendering the agenda; it creates no audit events.
#[must_use]
pub fn preview_effective_subjects<'a>(
    catalog: &Catalog,
    student: &StudentSnapshot,
    sessions: impl IntoIterator<Item = &'a ClassSession>,
) -> Vec<(i64, EffectiveSubject)> {
    sessions
        .into_iter()
        .filter_map(|session| {
            resolve_effective_subject(catalog, student, session)
                .ok()
                .map(|effective| (session.id, effective))
        })
        .collect()
}
