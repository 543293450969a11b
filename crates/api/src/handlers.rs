// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for the portal, staff and account operations.
//!
//! Handlers are synchronous and take the current time explicitly. Each one
//! authorizes the actor, loads fresh snapshots, applies a core command and
//! persists the result.

use std::collections::BTreeMap;
use std::str::FromStr;

use num_traits::ToPrimitive;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime, Time};
use tracing::{debug, info, warn};

use aula::{
    AttendanceMark, BookingRejection, Command, CoreError, Effect, State, StudentSnapshot,
    TransitionResult, apply, preview_effective_subjects,
};
use aula_audit::Cause;
use aula_domain::{
    AttendanceStatus, Catalog, ClassSession, DeliveryMode, HistoryRecord, Novedad,
    SessionEnrollmentState, SessionState, progress_summary, week_start_of,
};
use aula_persistence::{
    AgendaLine, Persistence, PersistenceError, PersistTransitionResult, PortalUserData,
    SessionFilter, format_datetime,
};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService};
use crate::capabilities::compute_portal_capabilities;
use crate::config::PolicyBundle;
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::request_response::{
    AddToAgendaRequest, AddToAgendaResponse, AgendaDay, AgendaLineInfo, AgendaQuery,
    AgendaSessionInfo, AmendHistoryRequest, AmendHistoryResponse, AttendanceOutcomeRequest,
    AttendanceResponse, ChangePasswordRequest, ChangePasswordResponse, FinalizeSessionRequest,
    ListAgendaResponse, LoginRequest, LoginResponse, MissingPrerequisitesInfo, MyAgendaQuery,
    MyAgendaResponse, ProgressResponse, RemoveFromAgendaRequest, RemoveFromAgendaResponse,
    SetSessionStateRequest, SetSessionStateResponse, WhoAmIResponse,
};

/// A lost capacity race is retried once with fresh snapshots.
const BOOKING_ATTEMPTS: usize = 2;

const STATUS_OK: &str = "ok";
const STATUS_ERROR: &str = "error";

/// Parses a `YYYY-MM-DD` request field.
///
/// # Errors
///
/// Returns `InvalidInput` naming `field` if the value is not a date.
pub fn parse_date(field: &str, value: &str) -> Result<Date, ApiError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|e| {
        ApiError::InvalidInput {
            field: field.to_string(),
            message: format!("'{value}' is not a YYYY-MM-DD date: {e}"),
        }
    })
}

pub(crate) fn format_time(value: Time) -> String {
    format!("{:02}:{:02}", value.hour(), value.minute())
}

pub(crate) fn subject_name(catalog: &Catalog, subject_id: i64) -> String {
    catalog.subject(subject_id).map_or_else(
        || format!("Subject {subject_id}"),
        |s| s.display_name().to_string(),
    )
}

fn internal(message: String) -> ApiError {
    ApiError::Internal { message }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// The Monday of the requested week, or of the current one.
fn requested_week(week: Option<&str>, now: PrimitiveDateTime) -> Result<Date, ApiError> {
    let day: Date = match non_blank(week) {
        Some(value) => parse_date("week", &value)?,
        None => now.date(),
    };
    Ok(week_start_of(day))
}

/// Loads the caller's student snapshot for a read-only portal page.
fn load_portal_student(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<StudentSnapshot, ApiError> {
    let student_id: i64 = AuthorizationService::authorize_portal(actor)?;
    let student: StudentSnapshot = persistence
        .load_student_snapshot(student_id)
        .map_err(translate_persistence_error)?;

    if student.must_change_password {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from(BookingRejection::PasswordChangeRequired.code()),
            message: BookingRejection::PasswordChangeRequired.to_string(),
        });
    }
    if student.profile.as_ref().is_some_and(|p| !p.can_view_agenda) {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("permission_denied"),
            message: String::from("Your profile does not allow viewing the agenda"),
        });
    }
    Ok(student)
}

fn line_info(
    catalog: &Catalog,
    line_id: i64,
    session: &ClassSession,
    effective_subject_id: i64,
    enrollment_state: Option<SessionEnrollmentState>,
    late_cancel: bool,
) -> AgendaLineInfo {
    AgendaLineInfo {
        line_id,
        session_id: session.id,
        effective_subject_id,
        subject_name: subject_name(catalog, effective_subject_id),
        date: session.date.to_string(),
        time_start: format_time(session.time_start),
        time_end: format_time(session.time_end),
        campus_id: session.campus_id,
        delivery_mode: session.delivery_mode.to_string(),
        session_state: session.state.to_string(),
        enrollment_state: enrollment_state.map(|s| s.to_string()),
        late_cancel,
    }
}

fn agenda_line_info(catalog: &Catalog, agenda_line: &AgendaLine) -> AgendaLineInfo {
    line_info(
        catalog,
        agenda_line.line.id,
        &agenda_line.session,
        agenda_line.line.effective_subject_id,
        agenda_line.enrollment.as_ref().map(|e| e.state),
        agenda_line.enrollment.as_ref().is_some_and(|e| e.late_cancel),
    )
}

fn rejected_booking(rejection: &BookingRejection) -> AddToAgendaResponse {
    let missing_prerequisites = match rejection {
        BookingRejection::MissingPrerequisites(missing) => Some(MissingPrerequisitesInfo {
            bcheck_units: missing.bcheck_units.clone(),
            bskill_units: missing.bskill_units.clone(),
            other: missing.other.clone(),
            summary: missing.to_string(),
        }),
        _ => None,
    };
    AddToAgendaResponse {
        status: String::from(STATUS_ERROR),
        message: rejection.to_string(),
        code: Some(String::from(rejection.code())),
        line: None,
        missing_prerequisites,
        no_capacity: matches!(rejection, BookingRejection::NoCapacity).then_some(true),
    }
}

// ========================================================================
// Portal
// ========================================================================

/// Lists the sessions the caller may book in a week, grouped by day.
///
/// Campus and city filters given in the query are saved on the weekly plan;
/// without them the plan's saved filters apply. Sessions for which no
/// effective subject resolves are not shown.
///
/// # Errors
///
/// Returns an error if:
/// - The account has no student or the student may not view the agenda
/// - A forced password change is pending
/// - A query parameter is malformed
/// - A database operation fails
pub fn list_agenda(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    query: &AgendaQuery,
    now: PrimitiveDateTime,
) -> Result<ListAgendaResponse, ApiError> {
    let student: StudentSnapshot = load_portal_student(persistence, actor)?;
    let student_id: i64 = student.student.id;
    let week_start: Date = requested_week(query.week.as_deref(), now)?;
    let delivery_mode: Option<DeliveryMode> = non_blank(query.mode.as_deref())
        .map(|mode| DeliveryMode::from_str(&mode))
        .transpose()
        .map_err(translate_domain_error)?;

    let requested_city: Option<String> = non_blank(query.city.as_deref());
    let (campus_id, city) = if query.campus.is_some() || requested_city.is_some() {
        persistence
            .save_plan_filters(student_id, week_start, query.campus, requested_city.as_deref())
            .map_err(translate_persistence_error)?;
        (query.campus, requested_city)
    } else {
        persistence
            .get_or_create_weekly_plan(student_id, week_start)
            .map_err(translate_persistence_error)?;
        persistence
            .find_weekly_plan(student_id, week_start)
            .map_err(translate_persistence_error)?
            .map_or((None, None), |plan| (plan.filter_campus_id, plan.filter_city))
    };

    let filter: SessionFilter = SessionFilter {
        start_date: Some(week_start),
        end_date: Some(week_start + Duration::days(6)),
        campus_id,
        city: city.clone(),
        delivery_mode,
        subject_id: None,
    };
    let sessions: Vec<ClassSession> = persistence
        .list_portal_sessions(&filter, now)
        .map_err(translate_persistence_error)?;
    let effective: BTreeMap<i64, aula::EffectiveSubject> =
        preview_effective_subjects(catalog, &student, &sessions)
            .into_iter()
            .collect();

    let mut days: BTreeMap<Date, Vec<AgendaSessionInfo>> = BTreeMap::new();
    for session in &sessions {
        let Some(subject) = effective.get(&session.id) else {
            continue;
        };
        let campus = catalog.campus(session.campus_id);
        days.entry(session.date)
            .or_default()
            .push(AgendaSessionInfo {
                session_id: session.id,
                date: session.date.to_string(),
                time_start: format_time(session.time_start),
                time_end: format_time(session.time_end),
                subject_id: subject.subject_id,
                subject_name: subject_name(catalog, subject.subject_id),
                unit_number: subject.unit_number,
                campus_id: session.campus_id,
                campus_name: campus.map_or_else(String::new, |c| c.name.clone()),
                city: campus.map_or_else(String::new, |c| c.city.clone()),
                delivery_mode: session.delivery_mode.to_string(),
                teacher_name: catalog.teacher(session.teacher_id).map(|t| t.name.clone()),
                meeting_link: session.meeting_link.clone(),
                line_id: student.line_for_session(session.id).map(|l| l.line_id),
            });
    }

    debug!(
        student_id,
        week_start = %week_start,
        sessions = sessions.len(),
        "Listed agenda"
    );

    Ok(ListAgendaResponse {
        week_start: week_start.to_string(),
        campus_id,
        city,
        delivery_mode: delivery_mode.map(|m| m.to_string()),
        current_unit: student.current_unit(catalog),
        days: days
            .into_iter()
            .map(|(date, sessions)| AgendaDay {
                date: date.to_string(),
                weekday: date.weekday().to_string(),
                sessions,
            })
            .collect(),
    })
}

/// Adds a session to the caller's agenda.
///
/// Booking refusals are returned in the payload with `status = "error"`.
/// Booking a session already on the agenda succeeds with code
/// `duplicate_booking`. If the last seat is taken between planning and
/// commit, the booking is planned again once before reporting `no_capacity`.
///
/// # Errors
///
/// Returns an error if the account has no student, the session does not
/// exist, or a database operation fails.
pub fn add_to_agenda(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    request: &AddToAgendaRequest,
    cause: &Cause,
    now: PrimitiveDateTime,
) -> Result<AddToAgendaResponse, ApiError> {
    let student_id: i64 = AuthorizationService::authorize_portal(actor)?;
    if let Some(week) = non_blank(request.week_start.as_deref()) {
        parse_date("week_start", &week)?;
    }
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;

    for attempt in 1..=BOOKING_ATTEMPTS {
        let student = persistence
            .load_student_snapshot(student_id)
            .map_err(translate_persistence_error)?;
        let snapshot = persistence
            .load_session_snapshot(request.session_id, student_id)
            .map_err(translate_persistence_error)?;
        let session: ClassSession = snapshot.session.clone();
        let held_state = snapshot.student_enrollment.as_ref().map(|e| e.state);
        let state: State = State::new(now, policy.booking.clone())
            .with_student(student)
            .with_session(snapshot);

        let result: TransitionResult = match apply(
            catalog,
            &state,
            Command::BookSession,
            actor.to_audit_actor(),
            cause.clone(),
        ) {
            Ok(result) => result,
            Err(CoreError::Rejected(rejection)) => {
                warn!(
                    student_id,
                    session_id = request.session_id,
                    code = rejection.code(),
                    "Booking rejected"
                );
                return Ok(rejected_booking(&rejection));
            }
            Err(e) => return Err(translate_core_error(e)),
        };

        let effective_subject_id: i64 = match &result.effect {
            Effect::Booked(plan) => plan.effective_subject_id,
            Effect::AlreadyBooked {
                effective_subject_id,
                ..
            } => *effective_subject_id,
            other => return Err(internal(format!("Unexpected booking effect: {other:?}"))),
        };

        match persistence.persist_transition(&result, now) {
            Ok(PersistTransitionResult::Booked(commit)) => {
                info!(
                    student_id,
                    session_id = session.id,
                    line_id = commit.line_id,
                    effective_subject_id,
                    event_id = commit.event_id,
                    "Booked session"
                );
                return Ok(AddToAgendaResponse {
                    status: String::from(STATUS_OK),
                    message: format!(
                        "{} was added to your agenda",
                        subject_name(catalog, effective_subject_id)
                    ),
                    code: None,
                    line: Some(line_info(
                        catalog,
                        commit.line_id,
                        &session,
                        effective_subject_id,
                        Some(SessionEnrollmentState::Confirmed),
                        false,
                    )),
                    missing_prerequisites: None,
                    no_capacity: None,
                });
            }
            Ok(PersistTransitionResult::AlreadyBooked { line_id }) => {
                debug!(student_id, session_id = session.id, line_id, "Session already booked");
                return Ok(AddToAgendaResponse {
                    status: String::from(STATUS_OK),
                    message: String::from("This session is already on your agenda"),
                    code: Some(String::from("duplicate_booking")),
                    line: Some(line_info(
                        catalog,
                        line_id,
                        &session,
                        effective_subject_id,
                        held_state,
                        false,
                    )),
                    missing_prerequisites: None,
                    no_capacity: None,
                });
            }
            Ok(other) => return Err(internal(format!("Unexpected booking result: {other:?}"))),
            Err(PersistenceError::CapacityExceeded { session_id }) => {
                warn!(student_id, session_id, attempt, "Session filled before commit");
            }
            Err(e) => return Err(translate_persistence_error(e)),
        }
    }

    Ok(rejected_booking(&BookingRejection::NoCapacity))
}

/// Removes a line from the caller's agenda.
///
/// Lines that depend on the removed one are removed too. Removing too close
/// to the start is a late cancel: it succeeds but records an absence.
///
/// # Errors
///
/// Returns an error if the account has no student, the line is not the
/// caller's, or a database operation fails.
pub fn remove_from_agenda(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    request: &RemoveFromAgendaRequest,
    cause: &Cause,
    now: PrimitiveDateTime,
) -> Result<RemoveFromAgendaResponse, ApiError> {
    let student_id: i64 = AuthorizationService::authorize_portal(actor)?;
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let student = persistence
        .load_student_snapshot(student_id)
        .map_err(translate_persistence_error)?;
    let state: State = State::new(now, policy.booking).with_student(student);

    let result: TransitionResult = match apply(
        catalog,
        &state,
        Command::CancelBooking {
            line_id: request.line_id,
        },
        actor.to_audit_actor(),
        cause.clone(),
    ) {
        Ok(result) => result,
        Err(CoreError::Rejected(rejection)) => {
            warn!(student_id, line_id = request.line_id, code = rejection.code(), "Removal rejected");
            return Ok(RemoveFromAgendaResponse {
                status: String::from(STATUS_ERROR),
                message: rejection.to_string(),
                code: Some(String::from(rejection.code())),
                removed: Vec::new(),
                late_cancel: false,
                dependent_line_ids: Vec::new(),
            });
        }
        Err(e) => return Err(translate_core_error(e)),
    };

    let Effect::Cancelled(plan) = &result.effect else {
        return Err(internal(format!(
            "Unexpected cancellation effect: {:?}",
            result.effect
        )));
    };
    let late_cancel: bool = plan.late_cancel;
    let dependent_line_ids: Vec<i64> = plan.dependent_line_ids.clone();

    let removed: Vec<i64> = match persistence
        .persist_transition(&result, now)
        .map_err(translate_persistence_error)?
    {
        PersistTransitionResult::Cancelled(commit) => commit.removed_line_ids,
        other => return Err(internal(format!("Unexpected cancellation result: {other:?}"))),
    };

    info!(
        student_id,
        line_id = request.line_id,
        late_cancel,
        dependents = dependent_line_ids.len(),
        "Removed agenda line"
    );

    let message: String = if late_cancel {
        String::from("Removed from your agenda; the late cancellation counts as an absence")
    } else {
        String::from("Removed from your agenda")
    };
    Ok(RemoveFromAgendaResponse {
        status: String::from(STATUS_OK),
        message,
        code: None,
        removed,
        late_cancel,
        dependent_line_ids,
    })
}

/// Lists the caller's booked lines for a week.
///
/// # Errors
///
/// Returns an error if the account may not view the agenda, the week is
/// malformed, or a database operation fails.
pub fn my_agenda(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    query: &MyAgendaQuery,
    now: PrimitiveDateTime,
) -> Result<MyAgendaResponse, ApiError> {
    let student: StudentSnapshot = load_portal_student(persistence, actor)?;
    let week_start: Date = requested_week(query.week.as_deref(), now)?;
    let lines: Vec<AgendaLine> = persistence
        .list_agenda_lines(student.student.id, week_start)
        .map_err(translate_persistence_error)?;

    Ok(MyAgendaResponse {
        week_start: week_start.to_string(),
        lines: lines
            .iter()
            .map(|line| agenda_line_info(catalog, line))
            .collect(),
    })
}

/// Summarizes the caller's progress through their program.
///
/// # Errors
///
/// Returns an error if the account may not view the agenda, the student has
/// no program, or a database operation fails.
pub fn progress(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
) -> Result<ProgressResponse, ApiError> {
    let student: StudentSnapshot = load_portal_student(persistence, actor)?;
    let program_plan = student
        .program_plan(catalog)
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Enrollment"),
            message: format!("Student {} has no program", student.student.id),
        })?;

    Ok(ProgressResponse {
        student_id: student.student.id,
        program_id: program_plan.program_id,
        plan_id: program_plan.plan_id,
        summary: progress_summary(
            &student.history,
            catalog,
            program_plan.program_id,
            program_plan.plan_id,
            student.unit_floor(catalog),
        ),
    })
}

// ========================================================================
// Staff
// ========================================================================

pub(crate) fn session_state(
    persistence: &mut Persistence,
    session_id: i64,
    policy: &PolicyBundle,
    now: PrimitiveDateTime,
) -> Result<State, ApiError> {
    // No student books here; the snapshot carries no student seat.
    let snapshot = persistence
        .load_session_snapshot(session_id, 0)
        .map_err(translate_persistence_error)?;
    let roster = persistence
        .load_roster(session_id)
        .map_err(translate_persistence_error)?;
    Ok(State::new(now, policy.booking.clone())
        .with_session(snapshot)
        .with_roster(roster))
}

fn parse_mark(outcome: &AttendanceOutcomeRequest) -> Result<AttendanceMark, ApiError> {
    Ok(AttendanceMark {
        student_id: outcome.student_id,
        status: AttendanceStatus::from_str(&outcome.status).map_err(translate_domain_error)?,
        novedad: non_blank(outcome.novedad.as_deref())
            .map(|n| Novedad::from_str(&n))
            .transpose()
            .map_err(translate_domain_error)?,
        notes: non_blank(outcome.notes.as_deref()),
    })
}

fn attendance_response(
    session_id: i64,
    persisted: PersistTransitionResult,
) -> Result<AttendanceResponse, ApiError> {
    match persisted {
        PersistTransitionResult::Attendance(commit) => Ok(AttendanceResponse {
            session_id,
            history_ids: commit.history_ids,
            event_id: commit.event_id,
        }),
        other => Err(internal(format!("Unexpected attendance result: {other:?}"))),
    }
}

/// Moves a session through its lifecycle.
///
/// Moving to `done` finalizes the session: unmarked confirmed seats become
/// absences and history rows are written.
///
/// # Errors
///
/// Returns an error if the actor is not staff, the move is not permitted,
/// or a database operation fails.
pub fn set_session_state(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    session_id: i64,
    request: &SetSessionStateRequest,
    cause: &Cause,
    now: PrimitiveDateTime,
) -> Result<SetSessionStateResponse, ApiError> {
    AuthorizationService::authorize_staff(actor, "set_session_state")?;
    let target: SessionState =
        SessionState::from_str(&request.target).map_err(translate_domain_error)?;
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let state: State = session_state(persistence, session_id, &policy, now)?;
    let from: SessionState = state
        .session
        .as_ref()
        .map_or(SessionState::Draft, |s| s.session.state);

    let result: TransitionResult = apply(
        catalog,
        &state,
        Command::TransitionSession { target },
        actor.to_audit_actor(),
        cause.clone(),
    )
    .map_err(translate_core_error)?;

    let (event_id, history_ids) = match persistence
        .persist_transition(&result, now)
        .map_err(translate_persistence_error)?
    {
        PersistTransitionResult::SessionMoved { event_id } => (event_id, Vec::new()),
        PersistTransitionResult::Attendance(commit) => (commit.event_id, commit.history_ids),
        other => return Err(internal(format!("Unexpected session result: {other:?}"))),
    };

    info!(
        session_id,
        from = %from,
        to = %target,
        event_id,
        history_rows = history_ids.len(),
        "Session moved"
    );

    Ok(SetSessionStateResponse {
        session_id,
        from: from.to_string(),
        to: target.to_string(),
        event_id,
        history_ids,
    })
}

/// Records one student's outcome while the session runs.
///
/// # Errors
///
/// Returns an error if the actor is not staff, the session is not started,
/// the student holds no confirmed seat, or a database operation fails.
pub fn mark_attendance(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    session_id: i64,
    request: &AttendanceOutcomeRequest,
    cause: &Cause,
    now: PrimitiveDateTime,
) -> Result<AttendanceResponse, ApiError> {
    AuthorizationService::authorize_staff(actor, "mark_attendance")?;
    let mark: AttendanceMark = parse_mark(request)?;
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let state: State = session_state(persistence, session_id, &policy, now)?;

    let result: TransitionResult = apply(
        catalog,
        &state,
        Command::MarkAttendance(mark),
        actor.to_audit_actor(),
        cause.clone(),
    )
    .map_err(translate_core_error)?;
    let persisted = persistence
        .persist_transition(&result, now)
        .map_err(translate_persistence_error)?;
    let response: AttendanceResponse = attendance_response(session_id, persisted)?;

    info!(
        session_id,
        student_id = request.student_id,
        status = %request.status,
        event_id = response.event_id,
        "Attendance recorded"
    );
    Ok(response)
}

/// Finalizes a started session with the coach's outcomes.
///
/// # Errors
///
/// Returns an error if the actor is not staff, the session is not started,
/// an outcome is malformed, or a database operation fails.
pub fn finalize_session(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    session_id: i64,
    request: &FinalizeSessionRequest,
    cause: &Cause,
    now: PrimitiveDateTime,
) -> Result<AttendanceResponse, ApiError> {
    AuthorizationService::authorize_staff(actor, "finalize_session")?;
    let outcomes: Vec<AttendanceMark> = request
        .outcomes
        .iter()
        .map(parse_mark)
        .collect::<Result<_, _>>()?;
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let state: State = session_state(persistence, session_id, &policy, now)?;

    let result: TransitionResult = apply(
        catalog,
        &state,
        Command::FinalizeSession { outcomes },
        actor.to_audit_actor(),
        cause.clone(),
    )
    .map_err(translate_core_error)?;
    let persisted = persistence
        .persist_transition(&result, now)
        .map_err(translate_persistence_error)?;
    let response: AttendanceResponse = attendance_response(session_id, persisted)?;

    info!(
        session_id,
        history_rows = response.history_ids.len(),
        event_id = response.event_id,
        "Session finalized"
    );
    Ok(response)
}

/// Layers a correction over a history row.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the row does not exist,
/// the correction is empty or lacks a reason, or a database operation fails.
pub fn amend_history(
    persistence: &mut Persistence,
    catalog: &Catalog,
    actor: &AuthenticatedActor,
    history_id: i64,
    request: &AmendHistoryRequest,
    cause: &Cause,
    now: PrimitiveDateTime,
) -> Result<AmendHistoryResponse, ApiError> {
    AuthorizationService::authorize_amend_history(actor)?;
    let attendance_status: Option<AttendanceStatus> =
        non_blank(request.attendance_status.as_deref())
            .map(|s| AttendanceStatus::from_str(&s))
            .transpose()
            .map_err(translate_domain_error)?;
    let novedad: Option<Novedad> = non_blank(request.novedad.as_deref())
        .map(|n| Novedad::from_str(&n))
        .transpose()
        .map_err(translate_domain_error)?;

    let record: HistoryRecord = persistence
        .get_history_record(history_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("HistoryRecord"),
            message: format!("History row {history_id} does not exist"),
        })?;
    let student = persistence
        .load_student_snapshot(record.student_id)
        .map_err(translate_persistence_error)?;
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let state: State = State::new(now, policy.booking).with_student(student);

    let result: TransitionResult = apply(
        catalog,
        &state,
        Command::AmendHistory {
            history_id,
            attendance_status,
            novedad,
            grade: request.grade,
            reason: request.reason.clone(),
        },
        actor.to_audit_actor(),
        cause.clone(),
    )
    .map_err(translate_core_error)?;

    match persistence
        .persist_transition(&result, now)
        .map_err(translate_persistence_error)?
    {
        PersistTransitionResult::Amended { amendment_id } => {
            info!(
                history_id,
                amendment_id,
                student_id = record.student_id,
                "History amended"
            );
            Ok(AmendHistoryResponse {
                history_id,
                amendment_id,
            })
        }
        other => Err(internal(format!("Unexpected amendment result: {other:?}"))),
    }
}

// ========================================================================
// Accounts
// ========================================================================

/// Logs in and opens a bearer session.
///
/// # Errors
///
/// Returns `AuthenticationFailed` on bad credentials or a disabled account.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
    now: PrimitiveDateTime,
) -> Result<LoginResponse, ApiError> {
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    let (session_token, actor, user) = AuthenticationService::login(
        persistence,
        &request.login,
        &request.password,
        now,
        policy.session_ttl_hours,
    )?;
    let expires_at: String = format_datetime(now + Duration::hours(policy.session_ttl_hours))
        .map_err(translate_persistence_error)?;

    Ok(LoginResponse {
        session_token,
        login: user.login,
        display_name: user.display_name,
        role: String::from(actor.role.as_str()),
        must_change_password: user.must_change_password,
        expires_at,
    })
}

/// Ends the caller's session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Changes the caller's password and clears any forced change.
///
/// # Errors
///
/// Returns an error if the current password is wrong, the new one violates
/// the password policy or was used recently, or the write fails.
pub fn change_password(
    persistence: &mut Persistence,
    user: &PortalUserData,
    request: &ChangePasswordRequest,
    now: PrimitiveDateTime,
) -> Result<ChangePasswordResponse, ApiError> {
    let current_ok: bool =
        bcrypt::verify(&request.current_password, &user.password_hash).unwrap_or(false);
    if !current_ok {
        warn!(login = %user.login, "Password change with wrong current password");
        return Err(ApiError::AuthenticationFailed {
            reason: String::from("Current password is incorrect"),
        });
    }

    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    policy.password.validate(
        &request.new_password,
        &request.new_password_confirmation,
        &user.login,
        &user.display_name,
    )?;
    if policy.password.disallow_reuse > 0 {
        let limit: i64 = policy.password.disallow_reuse.to_i64().unwrap_or(i64::MAX);
        let recent: Vec<String> = persistence
            .list_recent_password_hashes(user.user_id, limit)
            .map_err(translate_persistence_error)?;
        policy.password.check_reuse(&request.new_password, &recent)?;
    }

    persistence
        .update_password(user.user_id, &request.new_password, now)
        .map_err(translate_persistence_error)?;

    info!(login = %user.login, "Password changed");
    Ok(ChangePasswordResponse {
        message: String::from("Password changed"),
    })
}

/// Describes the caller's account and what the portal should offer.
///
/// # Errors
///
/// Returns an error if the linked student cannot be loaded.
pub fn whoami(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    user: &PortalUserData,
) -> Result<WhoAmIResponse, ApiError> {
    let profile = match actor.student_id {
        Some(student_id) => {
            persistence
                .load_student_snapshot(student_id)
                .map_err(translate_persistence_error)?
                .profile
        }
        None => None,
    };

    Ok(WhoAmIResponse {
        login: user.login.clone(),
        display_name: user.display_name.clone(),
        role: String::from(actor.role.as_str()),
        student_id: actor.student_id,
        must_change_password: user.must_change_password,
        capabilities: compute_portal_capabilities(actor, user, profile.as_ref()),
    })
}
