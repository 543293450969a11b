// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Implements `FromStr` and `Display` for an enum whose `as_str` names
/// every variant by its stored text.
macro_rules! stored_text {
    ($ty:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == Self::$variant.as_str() {
                        return Ok(Self::$variant);
                    }
                )+
                Err(DomainError::InvalidEnumValue {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

/// The curricular category of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectCategory {
    /// Gating subject that anchors one unit.
    #[serde(rename = "bcheck")]
    BCheck,
    /// Skill subject within a unit.
    #[serde(rename = "bskills")]
    BSkills,
    /// Block evaluation covering a contiguous range of units.
    OralTest,
    /// Any other subject.
    Regular,
    /// Placement test; never counted towards progression.
    Placement,
}

impl SubjectCategory {
    /// Returns the stored text of this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BCheck => "bcheck",
            Self::BSkills => "bskills",
            Self::OralTest => "oral_test",
            Self::Regular => "regular",
            Self::Placement => "placement",
        }
    }
}

stored_text!(
    SubjectCategory,
    "subject category",
    [BCheck, BSkills, OralTest, Regular, Placement]
);

/// How a subject is classified for prerequisite purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectClassification {
    Prerequisite,
    Regular,
    Evaluation,
}

impl SubjectClassification {
    /// Returns the stored text of this classification.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::Regular => "regular",
            Self::Evaluation => "evaluation",
        }
    }
}

stored_text!(
    SubjectClassification,
    "subject classification",
    [Prerequisite, Regular, Evaluation]
);

/// Whether a campus is a physical site or the online campus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampusType {
    Physical,
    Online,
}

impl CampusType {
    /// Returns the stored text of this campus type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Online => "online",
        }
    }
}

stored_text!(CampusType, "campus type", [Physical, Online]);

/// Delivery modality of a session, enrollment, or student preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    Presential,
    Virtual,
    Hybrid,
}

impl DeliveryMode {
    /// Returns the stored text of this delivery mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Presential => "presential",
            Self::Virtual => "virtual",
            Self::Hybrid => "hybrid",
        }
    }
}

stored_text!(DeliveryMode, "delivery mode", [Presential, Virtual, Hybrid]);

/// Lifecycle state of an enrollment in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
    Draft,
    Pending,
    Enrolled,
    InProgress,
    Completed,
    Cancelled,
    /// Legacy state still present in imported data.
    Active,
}

impl EnrollmentState {
    /// Returns the stored text of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Enrolled => "enrolled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Active => "active",
        }
    }

    /// Returns whether the enrollment still grants entitlement.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Enrolled | Self::InProgress | Self::Active | Self::Pending | Self::Draft
        )
    }
}

stored_text!(
    EnrollmentState,
    "enrollment state",
    [
        Draft, Pending, Enrolled, InProgress, Completed, Cancelled, Active
    ]
);

/// Lifecycle state of a class session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Draft,
    Active,
    WithEnrollment,
    Started,
    Done,
    Cancelled,
}

impl SessionState {
    /// Returns the stored text of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::WithEnrollment => "with_enrollment",
            Self::Started => "started",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Checks if a transition from this state to another is valid.
    ///
    /// Valid transitions are:
    /// - Draft → Active → `WithEnrollment` → Started → Done
    /// - Active → Started (a session may start with no bookings)
    /// - any non-terminal state → Cancelled
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Active)
                | (Self::Active, Self::WithEnrollment | Self::Started)
                | (Self::WithEnrollment, Self::Started)
                | (Self::Started, Self::Done)
                | (
                    Self::Draft | Self::Active | Self::WithEnrollment | Self::Started,
                    Self::Cancelled
                )
        )
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Returns whether the portal may offer the session for booking.
    #[must_use]
    pub const fn is_bookable(&self) -> bool {
        matches!(self, Self::Active | Self::WithEnrollment)
    }
}

stored_text!(
    SessionState,
    "session state",
    [Draft, Active, WithEnrollment, Started, Done, Cancelled]
);

/// Lifecycle state of a student's seat in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnrollmentState {
    Pending,
    Confirmed,
    Attended,
    Absent,
    Cancelled,
}

impl SessionEnrollmentState {
    /// Returns the stored text of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Attended => "attended",
            Self::Absent => "absent",
            Self::Cancelled => "cancelled",
        }
    }

    /// Checks if a transition from this state to another is valid.
    ///
    /// `Attended` and `Absent` are terminal.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Attended | Self::Absent | Self::Cancelled)
                | (Self::Cancelled, Self::Pending)
        )
    }

    /// Returns whether this enrollment occupies a seat.
    #[must_use]
    pub const fn holds_seat(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Returns whether an attendance outcome has been recorded.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Attended | Self::Absent)
    }
}

stored_text!(
    SessionEnrollmentState,
    "session enrollment state",
    [Pending, Confirmed, Attended, Absent, Cancelled]
);

/// Attendance outcome stored on a history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Attended,
    Absent,
    Pending,
}

impl AttendanceStatus {
    /// Returns the stored text of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attended => "attended",
            Self::Absent => "absent",
            Self::Pending => "pending",
        }
    }
}

stored_text!(
    AttendanceStatus,
    "attendance status",
    [Attended, Absent, Pending]
);

/// Coach annotation attached to an attendance outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Novedad {
    #[default]
    Normal,
    Retraso,
    SalidaTemprana,
    Comportamiento,
    ParticipacionDestacada,
    Otro,
}

impl Novedad {
    /// Returns the stored text of this annotation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Retraso => "retraso",
            Self::SalidaTemprana => "salida_temprana",
            Self::Comportamiento => "comportamiento",
            Self::ParticipacionDestacada => "participacion_destacada",
            Self::Otro => "otro",
        }
    }
}

stored_text!(
    Novedad,
    "novedad",
    [
        Normal,
        Retraso,
        SalidaTemprana,
        Comportamiento,
        ParticipacionDestacada,
        Otro
    ]
);

/// Approval state of a freeze request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeState {
    Draft,
    Pending,
    Approved,
    Rejected,
    Finished,
}

impl FreezeState {
    /// Returns the stored text of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Finished => "finished",
        }
    }
}

stored_text!(
    FreezeState,
    "freeze state",
    [Draft, Pending, Approved, Rejected, Finished]
);

/// How a session template maps onto a concrete subject for a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// One skill of the student's current unit.
    PerUnit,
    /// The B-check of the recovery or next pending unit.
    Pair,
    /// The oral test whose block brackets the current unit.
    Block,
}

impl MappingMode {
    /// Returns the stored text of this mapping mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerUnit => "per_unit",
            Self::Pair => "pair",
            Self::Block => "block",
        }
    }
}

stored_text!(MappingMode, "mapping mode", [PerUnit, Pair, Block]);
