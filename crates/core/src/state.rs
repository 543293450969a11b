// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::cancel::{CancellationPlan, EnrollmentUpdate};
use crate::context::{BookingPolicy, RosterEntry, SessionSnapshot, StudentSnapshot};
use crate::projector::{NewHistoryRow, ProgressionUpdate};
use aula_audit::AuditEvent;
use aula_domain::{AttendanceStatus, Novedad, SessionState};
use time::{Date, PrimitiveDateTime};

/// The snapshot a command is applied against.
///
/// Callers load only the parts the command needs; `apply` reports
/// `MissingContext` for anything absent.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub now: PrimitiveDateTime,
    pub policy: BookingPolicy,
    pub student: Option<StudentSnapshot>,
    pub session: Option<SessionSnapshot>,
    /// Every enrollment of the loaded session, for attendance and finalization.
    pub roster: Vec<RosterEntry>,
}

impl State {
    #[must_use]
    pub const fn new(now: PrimitiveDateTime, policy: BookingPolicy) -> Self {
        Self {
            now,
            policy,
            student: None,
            session: None,
            roster: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_student(mut self, student: StudentSnapshot) -> Self {
        self.student = Some(student);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: SessionSnapshot) -> Self {
        self.session = Some(session);
        self
    }

    #[must_use]
    pub fn with_roster(mut self, roster: Vec<RosterEntry>) -> Self {
        self.roster = roster;
        self
    }
}

/// What committing a booking writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPlan {
    pub student_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub effective_unit_number: Option<u32>,
    pub week_start: Date,
    pub start_datetime: PrimitiveDateTime,
    pub date: Date,
    pub max_capacity: u32,
    /// An earlier enrollment of the student in this session, re-activated or
    /// reused instead of inserting a new one.
    pub existing_enrollment_id: Option<i64>,
    /// Move the session from `active` to `with_enrollment`.
    pub activate_session: bool,
}

/// What recording attendance outcomes writes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePlan {
    pub session_id: i64,
    pub enrollment_updates: Vec<EnrollmentUpdate>,
    pub history_rows: Vec<NewHistoryRow>,
    pub progressions: Vec<ProgressionUpdate>,
    /// Set when the session moves as part of the plan (finalization).
    pub session_transition: Option<SessionState>,
}

/// A session lifecycle move outside finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTransitionPlan {
    pub session_id: i64,
    pub from: SessionState,
    pub to: SessionState,
    /// Seats released because the session was cancelled.
    pub enrollment_updates: Vec<EnrollmentUpdate>,
    /// Absences owed to late cancellations on a cancelled session.
    pub history_rows: Vec<NewHistoryRow>,
}

/// A correction to an immutable history row.
#[derive(Debug, Clone, PartialEq)]
pub struct AmendmentPlan {
    pub history_id: i64,
    pub attendance_status: Option<AttendanceStatus>,
    pub novedad: Option<Novedad>,
    pub grade: Option<f64>,
    pub reason: String,
    pub created_at: PrimitiveDateTime,
    pub progression: ProgressionUpdate,
}

/// The writes a command produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Booked(BookingPlan),
    /// The student already held the session; nothing is written.
    AlreadyBooked {
        line_id: i64,
        effective_subject_id: i64,
    },
    Cancelled(CancellationPlan),
    Attendance(AttendancePlan),
    SessionMoved(SessionTransitionPlan),
    Amended(AmendmentPlan),
}

/// The result of a successful command application.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub effect: Effect,
    pub audit_event: AuditEvent,
}
