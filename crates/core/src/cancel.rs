// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::{BookedLine, BookingPolicy, StudentSnapshot};
use crate::error::CoreError;
use aula_domain::{Catalog, SessionEnrollmentState, SubjectCategory};
use time::PrimitiveDateTime;

/// A state change to apply to a session enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentUpdate {
    pub enrollment_id: i64,
    pub session_id: i64,
    pub state: SessionEnrollmentState,
    pub late_cancel: bool,
}

/// Everything removing a line changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationPlan {
    pub line_id: i64,
    pub session_id: i64,
    /// Lines removed because they depended on the cancelled subject.
    pub dependent_line_ids: Vec<i64>,
    /// Enrollment changes for the line and its dependents.
    pub enrollment_updates: Vec<EnrollmentUpdate>,
    /// The cancellation fell inside the penalty window.
    pub late_cancel: bool,
}

/// Returns whether `candidate` depends on the subject booked by `cancelled`.
///
/// A line depends on another when both sit in the same unit and either the
/// cancelled subject is in the candidate's prerequisite closure, or the
/// cancelled subject gates the unit and the candidate is a skill.
fn depends_on(catalog: &Catalog, cancelled_subject_id: i64, candidate_subject_id: i64) -> bool {
    let (Some(cancelled), Some(candidate)) = (
        catalog.subject(cancelled_subject_id),
        catalog.subject(candidate_subject_id),
    ) else {
        return false;
    };
    if cancelled.unit_number.is_none() || cancelled.unit_number != candidate.unit_number {
        return false;
    }
    let gated_skill =
        cancelled.is_prerequisite() && candidate.category == SubjectCategory::BSkills;
    gated_skill
        || catalog
            .prerequisite_closure(candidate.id)
            .contains(&cancelled.id)
}

fn release_seat(line: &BookedLine, state: SessionEnrollmentState, late: bool) -> Option<EnrollmentUpdate> {
    let enrollment_id = line.enrollment_id?;
    let current = line.enrollment_state?;
    current.can_transition_to(state).then_some(EnrollmentUpdate {
        enrollment_id,
        session_id: line.session_id,
        state,
        late_cancel: late,
    })
}

/// Plans the removal of `line_id` from the student's agenda.
///
/// Lines on done or cancelled sessions are simply removed. Otherwise the
/// seat is released: as a cancellation when at least
/// `min_advance_minutes_cancel` remain before the start, or as an absence
/// with a late-cancel penalty when less remain. Future lines depending on the
/// cancelled subject are removed too and their seats cancelled without
/// penalty.
///
/// # Errors
///
/// Returns `NotFound` if the line is not one of the student's lines.
pub fn plan_cancellation(
    catalog: &Catalog,
    student: &StudentSnapshot,
    line_id: i64,
    policy: &BookingPolicy,
    now: PrimitiveDateTime,
) -> Result<CancellationPlan, CoreError> {
    let line = student
        .lines
        .iter()
        .find(|l| l.line_id == line_id)
        .ok_or(CoreError::NotFound {
            entity: "Line",
            id: line_id,
        })?;

    if !line.is_live() {
        return Ok(CancellationPlan {
            line_id,
            session_id: line.session_id,
            dependent_line_ids: Vec::new(),
            enrollment_updates: Vec::new(),
            late_cancel: false,
        });
    }

    let minutes_left = (line.start - now).whole_minutes();
    let late_cancel = minutes_left < policy.min_advance_minutes_cancel;
    let target = if late_cancel {
        SessionEnrollmentState::Absent
    } else {
        SessionEnrollmentState::Cancelled
    };

    let mut enrollment_updates: Vec<EnrollmentUpdate> =
        release_seat(line, target, late_cancel).into_iter().collect();

    let dependents: Vec<&BookedLine> = student
        .lines
        .iter()
        .filter(|l| {
            l.line_id != line_id
                && l.is_live()
                && l.start > now
                && depends_on(catalog, line.effective_subject_id, l.effective_subject_id)
        })
        .collect();
    enrollment_updates.extend(
        dependents
            .iter()
            .filter_map(|l| release_seat(l, SessionEnrollmentState::Cancelled, false)),
    );

    Ok(CancellationPlan {
        line_id,
        session_id: line.session_id,
        dependent_line_ids: dependents.iter().map(|l| l.line_id).collect(),
        enrollment_updates,
        late_cancel,
    })
}
