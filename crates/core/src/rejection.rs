// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::Serialize;
use thiserror::Error;

/// Prerequisites a booking is missing, grouped for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MissingPrerequisites {
    /// Units whose B-check is missing.
    pub bcheck_units: Vec<u32>,
    /// Units with a missing skill prerequisite.
    pub bskill_units: Vec<u32>,
    /// Names of other missing prerequisites.
    pub other: Vec<String>,
}

impl MissingPrerequisites {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bcheck_units.is_empty() && self.bskill_units.is_empty() && self.other.is_empty()
    }
}

fn join_units(units: &[u32]) -> String {
    units
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for MissingPrerequisites {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if !self.bcheck_units.is_empty() {
            parts.push(format!("BCheck unidades: {}", join_units(&self.bcheck_units)));
        }
        if !self.bskill_units.is_empty() {
            parts.push(format!("BSkills unidades: {}", join_units(&self.bskill_units)));
        }
        if !self.other.is_empty() {
            parts.push(format!("Otros: {}", self.other.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Why the booking engine refused a request.
///
/// Each variant is a distinct, user-visible failure. Capacity failures never
/// carry seat counts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingRejection {
    #[error("No subject could be resolved for this session: {reason}")]
    NoEffectiveSubject { reason: String },
    #[error("No seats available, please pick another time")]
    NoCapacity,
    #[error("This session cannot be booked: {reason}")]
    SessionNotBookable { reason: String },
    #[error("Delivery mode mismatch: {reason}")]
    DeliveryModeMismatch { reason: String },
    #[error("Your current unit {unit} is outside this session's audience ({from}-{to})")]
    AudienceOutOfRange { unit: u32, from: u32, to: u32 },
    #[error("You already completed {subject}")]
    AlreadyCompleted { subject: String },
    #[error("Missing prerequisites: {0}")]
    MissingPrerequisites(MissingPrerequisites),
    #[error("This session overlaps with {subject} at {start}")]
    TimeConflict {
        line_id: i64,
        subject: String,
        start: String,
    },
    #[error("The B-check of unit {unit} must be taken before its skills")]
    UnitOrderingViolation { unit: u32 },
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },
    #[error("You must change your password before booking")]
    PasswordChangeRequired,
}

impl BookingRejection {
    /// Stable machine-readable code for the rejection.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoEffectiveSubject { .. } => "no_effective_subject",
            Self::NoCapacity => "no_capacity",
            Self::SessionNotBookable { .. } => "session_not_bookable",
            Self::DeliveryModeMismatch { .. } => "delivery_mode_mismatch",
            Self::AudienceOutOfRange { .. } => "audience_out_of_range",
            Self::AlreadyCompleted { .. } => "already_completed",
            Self::MissingPrerequisites(_) => "missing_prerequisites",
            Self::TimeConflict { .. } => "time_conflict",
            Self::UnitOrderingViolation { .. } => "unit_ordering_violation",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::PasswordChangeRequired => "password_change_required",
        }
    }

    pub(crate) fn no_subject(reason: &str) -> Self {
        Self::NoEffectiveSubject {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_bookable(reason: &str) -> Self {
        Self::SessionNotBookable {
            reason: reason.to_string(),
        }
    }
}
