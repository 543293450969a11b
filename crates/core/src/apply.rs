// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::admission::{BookingDecision, evaluate_booking};
use crate::cancel::{EnrollmentUpdate, plan_cancellation};
use crate::command::Command;
use crate::context::{RosterEntry, SessionSnapshot, StudentSnapshot};
use crate::error::CoreError;
use crate::projector::{
    AttendanceMark, NewHistoryRow, ProgressionUpdate, has_history_row, progression_after,
    project_row,
};
use crate::state::{
    AmendmentPlan, AttendancePlan, BookingPlan, Effect, SessionTransitionPlan, State,
    TransitionResult,
};
use aula_audit::{Action, Actor, AuditEvent, AuditScope, Cause, StateSnapshot};
use aula_domain::{
    AttendanceStatus, Catalog, Novedad, SessionEnrollmentState, SessionState, week_start_of,
};

/// Applies a command to the loaded state, producing the writes and audit event.
///
/// # Arguments
///
/// * `catalog` - The validated catalog
/// * `state` - The loaded snapshot (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Errors
///
/// Returns an error if:
/// - The booking engine rejects the request
/// - A state machine forbids the requested transition
/// - The state lacks a snapshot the command needs
pub fn apply(
    catalog: &Catalog,
    state: &State,
    command: Command,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let action_name = command.name();
    match command {
        Command::BookSession => {
            let student = require_student(state)?;
            let snapshot = require_session(state)?;
            book(catalog, state, student, snapshot, actor, cause)
        }
        Command::CancelBooking { line_id } => {
            let student = require_student(state)?;
            let plan = plan_cancellation(catalog, student, line_id, &state.policy, state.now)?;

            let before = StateSnapshot::new(format!(
                "lines={} session={}",
                student.lines.len(),
                plan.session_id
            ));
            let after = StateSnapshot::new(format!(
                "lines={} late_cancel={} dependents={}",
                student
                    .lines
                    .len()
                    .saturating_sub(1 + plan.dependent_line_ids.len()),
                plan.late_cancel,
                plan.dependent_line_ids.len()
            ));
            let action = Action::new(
                String::from(action_name),
                Some(format!(
                    "Removed line {line_id} of session {}{}",
                    plan.session_id,
                    if plan.late_cancel {
                        " (late cancel)"
                    } else {
                        ""
                    }
                )),
            );
            let scope = AuditScope::new(Some(student.student.id), Some(plan.session_id));
            Ok(TransitionResult {
                audit_event: AuditEvent::new(actor, cause, action, before, after, scope),
                effect: Effect::Cancelled(plan),
            })
        }
        Command::MarkAttendance(mark) => {
            let snapshot = require_session(state)?;
            let plan = mark_attendance(catalog, state, snapshot, &mark)?;
            let action = Action::new(
                String::from(action_name),
                Some(format!(
                    "Student {} marked {} in session {}",
                    mark.student_id, mark.status, snapshot.session.id
                )),
            );
            let event = attendance_event(snapshot, &plan, actor, cause, action, Some(mark.student_id));
            Ok(TransitionResult {
                audit_event: event,
                effect: Effect::Attendance(plan),
            })
        }
        Command::FinalizeSession { outcomes } => {
            let snapshot = require_session(state)?;
            finalize(catalog, state, snapshot, &outcomes, actor, cause)
        }
        Command::TransitionSession { target } => {
            let snapshot = require_session(state)?;
            if target == SessionState::Done {
                return finalize(catalog, state, snapshot, &[], actor, cause);
            }
            transition_session(catalog, state, snapshot, target, actor, cause)
        }
        Command::AmendHistory {
            history_id,
            attendance_status,
            novedad,
            grade,
            reason,
        } => {
            let student = require_student(state)?;
            if reason.trim().is_empty() {
                return Err(CoreError::InvalidCommand(String::from(
                    "an amendment needs a reason",
                )));
            }
            if attendance_status.is_none() && novedad.is_none() && grade.is_none() {
                return Err(CoreError::InvalidCommand(String::from(
                    "an amendment must change the status, novedad or grade",
                )));
            }
            if attendance_status == Some(AttendanceStatus::Pending) {
                return Err(CoreError::InvalidCommand(String::from(
                    "history cannot be amended back to pending",
                )));
            }

            let mut amended = student.clone();
            let row = amended
                .history
                .iter_mut()
                .find(|h| h.id == history_id)
                .ok_or(CoreError::NotFound {
                    entity: "HistoryRecord",
                    id: history_id,
                })?;
            let before = StateSnapshot::new(format!(
                "status={} novedad={} grade={:?}",
                row.attendance_status, row.novedad, row.grade
            ));
            if let Some(status) = attendance_status {
                row.attendance_status = status;
            }
            if let Some(value) = novedad {
                row.novedad = value;
            }
            if grade.is_some() {
                row.grade = grade;
            }
            let after = StateSnapshot::new(format!(
                "status={} novedad={} grade={:?}",
                row.attendance_status, row.novedad, row.grade
            ));
            let program_id = row.program_id;
            let session_id = row.session_id;
            let progression = progression_after(catalog, &amended, program_id, &[]);

            let action = Action::new(
                String::from(action_name),
                Some(format!("Amended history row {history_id}: {reason}")),
            );
            let scope = AuditScope::new(Some(student.student.id), session_id);
            Ok(TransitionResult {
                audit_event: AuditEvent::new(actor, cause, action, before, after, scope),
                effect: Effect::Amended(AmendmentPlan {
                    history_id,
                    attendance_status,
                    novedad,
                    grade,
                    reason,
                    created_at: state.now,
                    progression,
                }),
            })
        }
    }
}

fn require_student(state: &State) -> Result<&StudentSnapshot, CoreError> {
    state
        .student
        .as_ref()
        .ok_or(CoreError::MissingContext("student snapshot"))
}

fn require_session(state: &State) -> Result<&SessionSnapshot, CoreError> {
    state
        .session
        .as_ref()
        .ok_or(CoreError::MissingContext("session snapshot"))
}

fn book(
    catalog: &Catalog,
    state: &State,
    student: &StudentSnapshot,
    snapshot: &SessionSnapshot,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let session = &snapshot.session;
    let scope = AuditScope::new(Some(student.student.id), Some(session.id));
    let decision = evaluate_booking(catalog, student, snapshot, state.now)?;

    match decision {
        BookingDecision::AlreadyBooked {
            line_id,
            effective_subject_id,
        } => {
            let unchanged = StateSnapshot::new(format!("line={line_id}"));
            let action = Action::new(
                String::from("BookSession"),
                Some(format!(
                    "Session {} already booked on line {line_id}",
                    session.id
                )),
            );
            Ok(TransitionResult {
                audit_event: AuditEvent::new(
                    actor,
                    cause,
                    action,
                    unchanged.clone(),
                    unchanged,
                    scope,
                ),
                effect: Effect::AlreadyBooked {
                    line_id,
                    effective_subject_id,
                },
            })
        }
        BookingDecision::Admit {
            effective,
            existing_enrollment,
        } => {
            let plan = BookingPlan {
                student_id: student.student.id,
                session_id: session.id,
                effective_subject_id: effective.subject_id,
                effective_unit_number: effective.unit_number,
                week_start: week_start_of(session.date),
                start_datetime: session.datetime_start(),
                date: session.date,
                max_capacity: session.max_capacity,
                existing_enrollment_id: existing_enrollment.map(|e| e.id),
                activate_session: session.state == SessionState::Active,
            };
            let before = StateSnapshot::new(format!(
                "seats_held={} session_state={}",
                snapshot.seats_held_by_others, session.state
            ));
            let after = StateSnapshot::new(format!(
                "seats_held={} session_state={}",
                snapshot.seats_held_by_others + 1,
                if plan.activate_session {
                    SessionState::WithEnrollment
                } else {
                    session.state
                }
            ));
            let action = Action::new(
                String::from("BookSession"),
                Some(format!(
                    "Booked session {} as subject {}",
                    session.id, effective.subject_id
                )),
            );
            Ok(TransitionResult {
                audit_event: AuditEvent::new(actor, cause, action, before, after, scope),
                effect: Effect::Booked(plan),
            })
        }
    }
}

fn validated_outcome(status: AttendanceStatus) -> Result<SessionEnrollmentState, CoreError> {
    match status {
        AttendanceStatus::Attended => Ok(SessionEnrollmentState::Attended),
        AttendanceStatus::Absent => Ok(SessionEnrollmentState::Absent),
        AttendanceStatus::Pending => Err(CoreError::InvalidCommand(String::from(
            "attendance must be attended or absent",
        ))),
    }
}

fn require_started(snapshot: &SessionSnapshot) -> Result<(), CoreError> {
    if snapshot.session.state != SessionState::Started {
        return Err(CoreError::InvalidCommand(format!(
            "attendance is recorded on started sessions, session {} is {}",
            snapshot.session.id, snapshot.session.state
        )));
    }
    Ok(())
}

/// Projects one outcome, skipping the history row if one already exists.
fn project_outcome(
    catalog: &Catalog,
    state: &State,
    snapshot: &SessionSnapshot,
    entry: &RosterEntry,
    mark: &AttendanceMark,
) -> (Option<NewHistoryRow>, Option<ProgressionUpdate>) {
    if has_history_row(&entry.student, snapshot.session.id) {
        return (None, None);
    }
    let row = project_row(
        catalog,
        &snapshot.session,
        &entry.enrollment,
        &entry.student,
        mark,
        entry.grade,
        state.now,
    );
    let progression = progression_after(
        catalog,
        &entry.student,
        snapshot.session.program_id,
        std::slice::from_ref(&row),
    );
    (Some(row), Some(progression))
}

fn mark_attendance(
    catalog: &Catalog,
    state: &State,
    snapshot: &SessionSnapshot,
    mark: &AttendanceMark,
) -> Result<AttendancePlan, CoreError> {
    require_started(snapshot)?;
    let target = validated_outcome(mark.status)?;
    let entry = state
        .roster
        .iter()
        .find(|e| e.enrollment.student_id == mark.student_id)
        .ok_or(CoreError::NotFound {
            entity: "SessionEnrollment",
            id: mark.student_id,
        })?;

    let mut enrollment = entry.enrollment.clone();
    enrollment.transition_to(target)?;

    let (row, progression) = project_outcome(catalog, state, snapshot, entry, mark);
    Ok(AttendancePlan {
        session_id: snapshot.session.id,
        enrollment_updates: vec![EnrollmentUpdate {
            enrollment_id: enrollment.id,
            session_id: snapshot.session.id,
            state: target,
            late_cancel: false,
        }],
        history_rows: row.into_iter().collect(),
        progressions: progression.into_iter().collect(),
        session_transition: None,
    })
}

fn finalize(
    catalog: &Catalog,
    state: &State,
    snapshot: &SessionSnapshot,
    outcomes: &[AttendanceMark],
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let mut session = snapshot.session.clone();
    session.transition_to(SessionState::Done)?;

    let mut plan = AttendancePlan {
        session_id: session.id,
        enrollment_updates: Vec::new(),
        history_rows: Vec::new(),
        progressions: Vec::new(),
        session_transition: Some(SessionState::Done),
    };

    for entry in &state.roster {
        let enrollment = &entry.enrollment;
        let mark = match enrollment.state {
            SessionEnrollmentState::Confirmed => {
                let mark = outcomes
                    .iter()
                    .find(|m| m.student_id == enrollment.student_id)
                    .cloned()
                    .unwrap_or(AttendanceMark {
                        student_id: enrollment.student_id,
                        status: AttendanceStatus::Absent,
                        novedad: None,
                        notes: None,
                    });
                let target = validated_outcome(mark.status)?;
                plan.enrollment_updates.push(EnrollmentUpdate {
                    enrollment_id: enrollment.id,
                    session_id: session.id,
                    state: target,
                    late_cancel: false,
                });
                mark
            }
            SessionEnrollmentState::Attended | SessionEnrollmentState::Absent => AttendanceMark {
                student_id: enrollment.student_id,
                status: if enrollment.state == SessionEnrollmentState::Attended {
                    AttendanceStatus::Attended
                } else {
                    AttendanceStatus::Absent
                },
                novedad: Some(Novedad::Normal),
                notes: enrollment.notes.clone(),
            },
            SessionEnrollmentState::Pending | SessionEnrollmentState::Cancelled => continue,
        };
        let (row, progression) = project_outcome(catalog, state, snapshot, entry, &mark);
        plan.history_rows.extend(row);
        plan.progressions.extend(progression);
    }

    let attended = plan
        .history_rows
        .iter()
        .filter(|r| r.attendance_status == AttendanceStatus::Attended)
        .count();
    let before = StateSnapshot::new(format!(
        "state={} roster={}",
        snapshot.session.state,
        state.roster.len()
    ));
    let after = StateSnapshot::new(format!(
        "state={} history_rows={} attended={attended}",
        session.state,
        plan.history_rows.len()
    ));
    let action = Action::new(
        String::from("FinalizeSession"),
        Some(format!(
            "Finalized session {} with {} history rows",
            session.id,
            plan.history_rows.len()
        )),
    );
    Ok(TransitionResult {
        audit_event: AuditEvent::new(
            actor,
            cause,
            action,
            before,
            after,
            AuditScope::new(None, Some(session.id)),
        ),
        effect: Effect::Attendance(plan),
    })
}

fn transition_session(
    catalog: &Catalog,
    state: &State,
    snapshot: &SessionSnapshot,
    target: SessionState,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let from = snapshot.session.state;
    let mut session = snapshot.session.clone();
    session.transition_to(target)?;

    let enrollment_updates: Vec<EnrollmentUpdate> = if target == SessionState::Cancelled {
        state
            .roster
            .iter()
            .filter(|e| e.enrollment.state == SessionEnrollmentState::Confirmed)
            .map(|e| EnrollmentUpdate {
                enrollment_id: e.enrollment.id,
                session_id: session.id,
                state: SessionEnrollmentState::Cancelled,
                late_cancel: false,
            })
            .collect()
    } else {
        Vec::new()
    };

    // Late cancellations left absent seats that no finalization will project.
    let history_rows: Vec<NewHistoryRow> = if target == SessionState::Cancelled {
        state
            .roster
            .iter()
            .filter(|e| {
                e.enrollment.state == SessionEnrollmentState::Absent && e.enrollment.late_cancel
            })
            .filter_map(|entry| {
                let mark = AttendanceMark {
                    student_id: entry.enrollment.student_id,
                    status: AttendanceStatus::Absent,
                    novedad: Some(Novedad::Normal),
                    notes: entry.enrollment.notes.clone(),
                };
                project_outcome(catalog, state, snapshot, entry, &mark).0
            })
            .collect()
    } else {
        Vec::new()
    };

    let action = Action::new(
        String::from("TransitionSession"),
        Some(format!("Session {} moved from {from} to {target}", session.id)),
    );
    Ok(TransitionResult {
        audit_event: AuditEvent::new(
            actor,
            cause,
            action,
            StateSnapshot::new(format!("state={from}")),
            StateSnapshot::new(format!("state={target}")),
            AuditScope::new(None, Some(session.id)),
        ),
        effect: Effect::SessionMoved(SessionTransitionPlan {
            session_id: session.id,
            from,
            to: target,
            enrollment_updates,
            history_rows,
        }),
    })
}

fn attendance_event(
    snapshot: &SessionSnapshot,
    plan: &AttendancePlan,
    actor: Actor,
    cause: Cause,
    action: Action,
    student_id: Option<i64>,
) -> AuditEvent {
    let before = StateSnapshot::new(format!("session_state={}", snapshot.session.state));
    let after = StateSnapshot::new(format!(
        "enrollment_updates={} history_rows={}",
        plan.enrollment_updates.len(),
        plan.history_rows.len()
    ));
    AuditEvent::new(
        actor,
        cause,
        action,
        before,
        after,
        AuditScope::new(student_id, Some(snapshot.session.id)),
    )
}
