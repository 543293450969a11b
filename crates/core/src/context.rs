// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use aula_domain::{
    Campus, Catalog, ClassSession, Enrollment, FreezePeriod, HistoryRecord, ProfileState,
    ProgramPlan, SessionEnrollment, SessionEnrollmentState, SessionState, Student,
    current_unit, program_plan_of, unit_floor,
};
use time::{Date, PrimitiveDateTime};

/// A weekly-plan line joined with what the engine needs to know about its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedLine {
    pub line_id: i64,
    pub plan_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub date: Date,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
    pub session_state: SessionState,
    /// The student's enrollment in the line's session, if any.
    pub enrollment_id: Option<i64>,
    pub enrollment_state: Option<SessionEnrollmentState>,
}

impl BookedLine {
    /// Lines whose session can still take place.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.session_state.is_terminal()
    }
}

/// Everything the engine reads about one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentSnapshot {
    pub student: Student,
    pub profile: Option<ProfileState>,
    pub must_change_password: bool,
    pub enrollments: Vec<Enrollment>,
    pub freezes: Vec<FreezePeriod>,
    /// History with amendments already applied.
    pub history: Vec<HistoryRecord>,
    pub lines: Vec<BookedLine>,
}

impl StudentSnapshot {
    /// Creates a snapshot with no ledger, history or bookings.
    #[must_use]
    pub const fn new(student: Student) -> Self {
        Self {
            student,
            profile: None,
            must_change_password: false,
            enrollments: Vec::new(),
            freezes: Vec::new(),
            history: Vec::new(),
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn program_plan(&self, catalog: &Catalog) -> Option<ProgramPlan> {
        program_plan_of(&self.student, &self.enrollments, catalog)
    }

    #[must_use]
    pub fn unit_floor(&self, catalog: &Catalog) -> u32 {
        unit_floor(catalog, self.student.current_level_id)
    }

    /// The current unit derived from history.
    #[must_use]
    pub fn current_unit(&self, catalog: &Catalog) -> u32 {
        current_unit(&self.history, catalog, self.unit_floor(catalog))
    }

    #[must_use]
    pub fn line_for_session(&self, session_id: i64) -> Option<&BookedLine> {
        self.lines.iter().find(|l| l.session_id == session_id)
    }
}

/// Everything the engine reads about one session when booking it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: ClassSession,
    pub campus: Campus,
    /// Seats held by other students (pending or confirmed enrollments).
    pub seats_held_by_others: u32,
    /// The booking student's enrollment in this session, in any state.
    pub student_enrollment: Option<SessionEnrollment>,
}

/// Cancellation and finalization policy in force for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPolicy {
    pub policy_id: String,
    /// Cancelling closer than this to the start is a late cancel.
    pub min_advance_minutes_cancel: i64,
    /// Started sessions are finalized this long after they end.
    pub finalize_grace_minutes: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            policy_id: String::from("default"),
            min_advance_minutes_cancel: 0,
            finalize_grace_minutes: 30,
        }
    }
}

/// One seat in a session being finalized, with its student's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub enrollment: SessionEnrollment,
    pub student: StudentSnapshot,
    /// Grade copied from the student's subject progress, if tracked.
    pub grade: Option<f64>,
}
