// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::rejection::BookingRejection;
use aula_domain::DomainError;

/// Errors that can occur while planning a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The booking engine refused the request.
    Rejected(BookingRejection),
    /// The caller did not load a snapshot the command needs.
    MissingContext(&'static str),
    /// A referenced record is not part of the loaded snapshot.
    NotFound {
        /// The kind of record.
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },
    /// The command is well-formed but not applicable in the current state.
    InvalidCommand(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Rejected(rejection) => write!(f, "Booking rejected: {rejection}"),
            Self::MissingContext(what) => write!(f, "Missing context: {what}"),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::InvalidCommand(msg) => write!(f, "Invalid command: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<BookingRejection> for CoreError {
    fn from(rejection: BookingRejection) -> Self {
        Self::Rejected(rejection)
    }
}
