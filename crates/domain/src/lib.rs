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

mod agenda;
mod catalog;
mod error;
mod history;
mod student;
mod types;

#[cfg(test)]
mod tests;

pub use agenda::{
    Agenda, ClassSession, SessionEnrollment, WeeklyPlan, WeeklyPlanLine, has_seat,
    intervals_overlap, week_start_of,
};
pub use catalog::{
    Campus, Catalog, CatalogSeed, Classroom, Level, Phase, Plan, Program, SessionTemplate,
    Subject, Teacher,
};
pub use error::DomainError;
pub use history::{
    BSKILLS_TO_COMPLETE_UNIT, HistoryAmendment, HistoryRecord, ProgressSummary,
    SubjectCompletion, apply_amendments, attended_subjects, completed_units, current_unit,
    is_completed, pending_bcheck_unit, progress_summary,
};
pub use student::{
    Enrollment, FreezePeriod, FreezeReason, ProfileState, ProgramPlan, ProgramPlanSource,
    Student, active_enrollments, effective_end_date, is_frozen_on, program_plan_of,
};
pub use types::{
    AttendanceStatus, CampusType, DeliveryMode, EnrollmentState, FreezeState, MappingMode,
    Novedad, SessionEnrollmentState, SessionState, SubjectCategory, SubjectClassification,
};

/// The first unit of the student's current level, or 1.
///
/// Placement assigns a level; progression never drops below its first unit.
#[must_use]
pub fn unit_floor(catalog: &Catalog, current_level_id: Option<i64>) -> u32 {
    current_level_id
        .and_then(|id| catalog.level(id))
        .map_or(1, |level| level.min_unit)
}
