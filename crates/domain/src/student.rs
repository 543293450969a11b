// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::catalog::Catalog;
use crate::error::DomainError;
use crate::types::{DeliveryMode, EnrollmentState, FreezeState};
use serde::{Deserialize, Serialize};
use time::Date;

/// A profile state gates what a student may do on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileState {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub can_schedule: bool,
    pub can_view_agenda: bool,
}

/// A student and their denormalized curricular position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub document: String,
    pub program_id: Option<i64>,
    pub plan_id: Option<i64>,
    pub current_phase_id: Option<i64>,
    pub current_level_id: Option<i64>,
    pub preferred_delivery_mode: DeliveryMode,
    pub preferred_campus_id: Option<i64>,
    pub profile_state_id: Option<i64>,
    /// Materialized progression; recomputed from history.
    pub current_unit: u32,
}

/// An entitlement fact from the enrollment ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: Option<i64>,
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub phase_id: Option<i64>,
    pub level_id: Option<i64>,
    pub campus_id: Option<i64>,
    pub delivery_mode: DeliveryMode,
    pub state: EnrollmentState,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub final_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeReason {
    pub id: i64,
    pub name: String,
}

/// A pause on an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezePeriod {
    pub id: i64,
    pub student_id: i64,
    pub enrollment_id: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub state: FreezeState,
    pub reason_id: Option<i64>,
    pub is_special: bool,
}

impl FreezePeriod {
    /// Checks that the period does not end before it starts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFreezePeriod` when `end_date < start_date`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.end_date < self.start_date {
            return Err(DomainError::InvalidFreezePeriod {
                freeze_id: self.id,
            });
        }
        Ok(())
    }

    /// Inclusive length of the freeze in days.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).whole_days() + 1
    }

    /// Returns whether an approved freeze covers `date`.
    #[must_use]
    pub fn blocks(&self, date: Date) -> bool {
        self.state == FreezeState::Approved && date >= self.start_date && date <= self.end_date
    }
}

/// Enrollments that still grant entitlement, most recent first.
#[must_use]
pub fn active_enrollments(enrollments: &[Enrollment]) -> Vec<&Enrollment> {
    let mut active: Vec<&Enrollment> = enrollments.iter().filter(|e| e.state.is_active()).collect();
    active.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
    active
}

/// Which fallback produced a student's program and plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramPlanSource {
    ActiveEnrollment,
    StudentRecord,
    AnyEnrollment,
    CurrentLevel,
}

/// A resolved (program, plan) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramPlan {
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub source: ProgramPlanSource,
}

/// Resolves the program and plan a student is studying.
///
/// Fallback order:
/// 1. the most recent active enrollment
/// 2. the student's own program and plan fields
/// 3. the most recent enrollment of any state, including completed
/// 4. the program of the student's current level, with its default plan
#[must_use]
pub fn program_plan_of(
    student: &Student,
    enrollments: &[Enrollment],
    catalog: &Catalog,
) -> Option<ProgramPlan> {
    if let Some(enrollment) = active_enrollments(enrollments).first() {
        return Some(ProgramPlan {
            program_id: enrollment.program_id,
            plan_id: enrollment.plan_id,
            source: ProgramPlanSource::ActiveEnrollment,
        });
    }

    if let Some(program_id) = student.program_id {
        return Some(ProgramPlan {
            program_id,
            plan_id: student.plan_id,
            source: ProgramPlanSource::StudentRecord,
        });
    }

    if let Some(enrollment) = enrollments
        .iter()
        .filter(|e| e.state != EnrollmentState::Cancelled)
        .max_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)))
    {
        return Some(ProgramPlan {
            program_id: enrollment.program_id,
            plan_id: enrollment.plan_id,
            source: ProgramPlanSource::AnyEnrollment,
        });
    }

    let program_id = catalog.program_of_level(student.current_level_id?)?;
    Some(ProgramPlan {
        program_id,
        plan_id: catalog.default_plan_of(program_id).map(|p| p.id),
        source: ProgramPlanSource::CurrentLevel,
    })
}

/// End date of an enrollment extended by its approved freezes.
#[must_use]
pub fn effective_end_date(enrollment: &Enrollment, freezes: &[FreezePeriod]) -> Option<Date> {
    let end = enrollment.end_date?;
    let frozen_days: i64 = freezes
        .iter()
        .filter(|f| f.enrollment_id == enrollment.id && f.state == FreezeState::Approved)
        .map(FreezePeriod::days)
        .sum();
    end.checked_add(time::Duration::days(frozen_days))
}

/// Returns whether an approved freeze blocks the student on `date`.
#[must_use]
pub fn is_frozen_on(freezes: &[FreezePeriod], date: Date) -> bool {
    freezes.iter().any(|f| f.blocks(date))
}
