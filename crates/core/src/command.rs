// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::projector::AttendanceMark;
use aula_domain::{AttendanceStatus, Novedad, SessionState};

/// A command represents user or system intent as data only.
///
/// Commands are the only way to request booking state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Book the loaded session for the loaded student.
    BookSession,
    /// Remove one of the loaded student's lines.
    CancelBooking {
        /// The weekly-plan line to remove.
        line_id: i64,
    },
    /// Record one student's outcome while the session runs.
    MarkAttendance(AttendanceMark),
    /// Close the session, applying coach outcomes; unmarked seats become absences.
    FinalizeSession {
        /// Outcomes keyed by student.
        outcomes: Vec<AttendanceMark>,
    },
    /// Move the loaded session through its lifecycle.
    TransitionSession {
        /// The requested state.
        target: SessionState,
    },
    /// Layer a correction over one of the loaded student's history rows.
    AmendHistory {
        /// The history row to correct.
        history_id: i64,
        /// Replacement attendance status.
        attendance_status: Option<AttendanceStatus>,
        /// Replacement annotation.
        novedad: Option<Novedad>,
        /// Replacement grade.
        grade: Option<f64>,
        /// Why the correction was made.
        reason: String,
    },
}

impl Command {
    /// The audit action name of this command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BookSession => "BookSession",
            Self::CancelBooking { .. } => "CancelBooking",
            Self::MarkAttendance(_) => "MarkAttendance",
            Self::FinalizeSession { .. } => "FinalizeSession",
            Self::TransitionSession { .. } => "TransitionSession",
            Self::AmendHistory { .. } => "AmendHistory",
        }
    }
}
