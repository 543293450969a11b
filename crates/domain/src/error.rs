// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A stored value does not name a known variant.
    InvalidEnumValue {
        /// The enum being parsed (e.g. "`SessionState`").
        kind: &'static str,
        /// The offending value.
        value: String,
    },
    /// A subject violates its category invariants.
    InvalidSubject {
        /// The subject identifier.
        subject_id: i64,
        /// Description of the violated invariant.
        reason: String,
    },
    /// The prerequisite graph of a program contains a cycle.
    CyclicPrerequisites {
        /// The program whose graph is cyclic.
        program_id: i64,
        /// The subjects along the detected cycle, in walk order.
        cycle: Vec<i64>,
    },
    /// A catalog node references a parent that does not exist.
    DanglingReference {
        /// The kind of the referencing entity.
        entity: &'static str,
        /// The referencing entity identifier.
        entity_id: i64,
        /// The missing referenced identifier.
        missing_id: i64,
    },
    /// A level's unit range is empty.
    InvalidLevelRange {
        /// The level identifier.
        level_id: i64,
        /// Lower bound.
        min_unit: u32,
        /// Upper bound.
        max_unit: u32,
    },
    /// A class session violates its shape invariants.
    InvalidSession {
        /// The session identifier.
        session_id: i64,
        /// Description of the violated invariant.
        reason: String,
    },
    /// A session state transition is not permitted.
    InvalidSessionTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },
    /// A session enrollment state transition is not permitted.
    InvalidEnrollmentTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },
    /// A freeze period ends before it starts.
    InvalidFreezePeriod {
        /// The freeze period identifier.
        freeze_id: i64,
    },
    /// Failed to parse a date or time.
    DateParseError {
        /// The invalid string.
        value: String,
        /// The parsing error message.
        error: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEnumValue { kind, value } => {
                write!(f, "Invalid {kind} value: '{value}'")
            }
            Self::InvalidSubject { subject_id, reason } => {
                write!(f, "Subject {subject_id} is invalid: {reason}")
            }
            Self::CyclicPrerequisites { program_id, cycle } => {
                let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "Prerequisite graph of program {program_id} is cyclic: {}",
                    path.join(" -> ")
                )
            }
            Self::DanglingReference {
                entity,
                entity_id,
                missing_id,
            } => {
                write!(f, "{entity} {entity_id} references missing id {missing_id}")
            }
            Self::InvalidLevelRange {
                level_id,
                min_unit,
                max_unit,
            } => {
                write!(
                    f,
                    "Level {level_id} has an empty unit range {min_unit}..={max_unit}"
                )
            }
            Self::InvalidSession { session_id, reason } => {
                write!(f, "Session {session_id} is invalid: {reason}")
            }
            Self::InvalidSessionTransition { from, to } => {
                write!(f, "Session cannot move from '{from}' to '{to}'")
            }
            Self::InvalidEnrollmentTransition { from, to } => {
                write!(f, "Session enrollment cannot move from '{from}' to '{to}'")
            }
            Self::InvalidFreezePeriod { freeze_id } => {
                write!(f, "Freeze period {freeze_id} ends before it starts")
            }
            Self::DateParseError { value, error } => {
                write!(f, "Failed to parse '{value}': {error}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
