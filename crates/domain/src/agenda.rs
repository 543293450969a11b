// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{DeliveryMode, SessionEnrollmentState, SessionState};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, PrimitiveDateTime, Time};

/// Staff-side container grouping the sessions of one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    pub id: i64,
    pub name: String,
    pub campus_id: Option<i64>,
    pub week_start: Date,
}

/// A scheduled class.
///
/// A session either names its subject directly or carries a template that is
/// resolved per student at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: i64,
    pub agenda_id: Option<i64>,
    pub program_id: i64,
    pub subject_id: Option<i64>,
    pub template_id: Option<i64>,
    pub teacher_id: i64,
    pub campus_id: i64,
    pub subcampus_id: Option<i64>,
    pub date: Date,
    pub time_start: Time,
    pub time_end: Time,
    pub delivery_mode: DeliveryMode,
    /// Seat limit. Zero leaves the session uncapped.
    pub max_capacity: u32,
    pub audience_unit_from: Option<u32>,
    pub audience_unit_to: Option<u32>,
    pub meeting_link: Option<String>,
    pub is_published: bool,
    pub active: bool,
    pub state: SessionState,
    pub elective_pool_id: Option<i64>,
}

impl ClassSession {
    /// Checks the session's shape invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSession` if:
    /// - neither a subject nor a template is set
    /// - the audience window is inverted
    /// - the session does not end after it starts
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidSession {
            session_id: self.id,
            reason: reason.to_string(),
        };
        if self.subject_id.is_none() && self.template_id.is_none() {
            return Err(invalid("a session needs a subject or a template"));
        }
        if let (Some(from), Some(to)) = (self.audience_unit_from, self.audience_unit_to)
            && from > to
        {
            return Err(invalid("audience window starts after it ends"));
        }
        if self.time_start >= self.time_end {
            return Err(invalid("session must end after it starts"));
        }
        Ok(())
    }

    #[must_use]
    pub const fn datetime_start(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.date, self.time_start)
    }

    #[must_use]
    pub const fn datetime_end(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.date, self.time_end)
    }

    /// Returns whether the session belongs on the published agenda at `now`.
    #[must_use]
    pub fn is_portal_visible(&self, now: PrimitiveDateTime) -> bool {
        self.is_published && self.active && self.state.is_bookable() && self.datetime_start() > now
    }

    /// Returns whether one more student fits beside `held_by_others` seats.
    #[must_use]
    pub const fn has_seat_for(&self, held_by_others: u32) -> bool {
        has_seat(self.max_capacity, held_by_others)
    }

    /// Sessions in an elective pool may be taken again after attendance.
    #[must_use]
    pub const fn is_repeatable(&self) -> bool {
        self.elective_pool_id.is_some()
    }

    /// Validates and applies a state transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionTransition` if the move is not permitted.
    pub fn transition_to(&mut self, target: SessionState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidSessionTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }
}

/// A student's seat in a session, with the subject it consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnrollment {
    pub id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub effective_subject_id: i64,
    pub effective_unit_number: Option<u32>,
    pub state: SessionEnrollmentState,
    pub notes: Option<String>,
    /// Set when the seat was released inside the penalty window.
    pub late_cancel: bool,
}

impl SessionEnrollment {
    /// Validates and applies a state transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnrollmentTransition` if the move is not permitted.
    pub fn transition_to(&mut self, target: SessionEnrollmentState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidEnrollmentTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }
}

/// One week of a student's bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub id: i64,
    pub student_id: i64,
    pub week_start: Date,
    pub filter_campus_id: Option<i64>,
    pub filter_city: Option<String>,
}

/// A booking linking a weekly plan to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlanLine {
    pub id: i64,
    pub plan_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub start_datetime: PrimitiveDateTime,
    pub date: Date,
}

/// Monday of the week containing `date`.
#[must_use]
pub fn week_start_of(date: Date) -> Date {
    let offset = i64::from(date.weekday().number_days_from_monday());
    date.checked_sub(Duration::days(offset)).unwrap_or(date)
}

/// Returns whether two half-open intervals overlap.
#[must_use]
pub fn intervals_overlap(
    a_start: PrimitiveDateTime,
    a_end: PrimitiveDateTime,
    b_start: PrimitiveDateTime,
    b_end: PrimitiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Returns whether a session capped at `max_capacity` admits one more
/// student beside `held_by_others`. A cap of zero means no limit.
#[must_use]
pub const fn has_seat(max_capacity: u32, held_by_others: u32) -> bool {
    max_capacity == 0 || held_by_others < max_capacity
}
