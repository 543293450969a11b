// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use aula::{BookingRejection, CoreError};
use aula_domain::DomainError;
use aula_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// Booking refusals on the portal are not errors: they are returned in the
/// response payload. `BookingRejected` only surfaces from staff operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The sync endpoint was called without a valid API key.
    InvalidApiKey,
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// The booking engine refused the request.
    BookingRejected {
        /// Stable rejection code.
        code: String,
        /// A human-readable description.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The stored state changed under the request.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::InvalidApiKey => write!(f, "Invalid or missing API key"),
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::BookingRejected { code, message } => {
                write!(f, "Booking rejected ({code}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidEnumValue { kind, value } => ApiError::InvalidInput {
            field: kind.replace(' ', "_"),
            message: format!("'{value}' is not a valid {kind}"),
        },
        DomainError::InvalidSessionTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("session_lifecycle"),
            message: format!("Session cannot move from '{from}' to '{to}'"),
        },
        DomainError::InvalidEnrollmentTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("enrollment_lifecycle"),
            message: format!("Seat cannot move from '{from}' to '{to}'"),
        },
        DomainError::DateParseError { value, error } => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Failed to parse date '{value}': {error}"),
        },
        DomainError::InvalidSession { session_id, reason } => ApiError::DomainRuleViolation {
            rule: String::from("session_shape"),
            message: format!("Session {session_id} is invalid: {reason}"),
        },
        DomainError::InvalidFreezePeriod { freeze_id } => ApiError::InvalidInput {
            field: String::from("freeze_period"),
            message: format!("Freeze period {freeze_id} ends before it starts"),
        },
        err @ (DomainError::InvalidSubject { .. }
        | DomainError::CyclicPrerequisites { .. }
        | DomainError::DanglingReference { .. }
        | DomainError::InvalidLevelRange { .. }) => ApiError::Internal {
            message: format!("Catalog is inconsistent: {err}"),
        },
    }
}

/// Translates a booking rejection raised outside the portal booking flow.
#[must_use]
pub fn translate_rejection(rejection: &BookingRejection) -> ApiError {
    ApiError::BookingRejected {
        code: rejection.code().to_string(),
        message: rejection.to_string(),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Rejected(rejection) => translate_rejection(&rejection),
        CoreError::MissingContext(what) => ApiError::Internal {
            message: format!("Missing context: {what}"),
        },
        CoreError::NotFound { entity, id } => ApiError::ResourceNotFound {
            resource_type: entity.to_string(),
            message: format!("{entity} {id} does not exist"),
        },
        CoreError::InvalidCommand(message) => ApiError::DomainRuleViolation {
            rule: String::from("invalid_command"),
            message,
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(message) => ApiError::ResourceNotFound {
            resource_type: String::from("Resource"),
            message,
        },
        PersistenceError::CapacityExceeded { .. } => ApiError::BookingRejected {
            code: String::from(BookingRejection::NoCapacity.code()),
            message: BookingRejection::NoCapacity.to_string(),
        },
        PersistenceError::StudentArchived { student_id } => ApiError::DomainRuleViolation {
            rule: String::from("student_archived"),
            message: format!("Student {student_id} has academic history and cannot be deleted"),
        },
        PersistenceError::Other(message) => ApiError::Conflict { message },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
