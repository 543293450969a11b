// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Dates travel as `YYYY-MM-DD`, times as `HH:MM` and datetimes as
//! `YYYY-MM-DD HH:MM:SS`.

use aula_domain::ProgressSummary;

// ========================================================================
// Portal
// ========================================================================

/// Query for the weekly agenda.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgendaQuery {
    /// Any date of the requested week; defaults to the current week.
    pub week: Option<String>,
    /// Campus filter; persisted on the weekly plan.
    pub campus: Option<i64>,
    /// City filter; persisted on the weekly plan.
    pub city: Option<String>,
    /// Delivery mode filter (`presential`, `virtual`, `hybrid`).
    pub mode: Option<String>,
}

/// A session offered on the agenda, as the student would consume it.
///
/// Carries no seat counts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgendaSessionInfo {
    pub session_id: i64,
    pub date: String,
    pub time_start: String,
    pub time_end: String,
    /// The subject this student would consume.
    pub subject_id: i64,
    pub subject_name: String,
    pub unit_number: Option<u32>,
    pub campus_id: i64,
    pub campus_name: String,
    pub city: String,
    pub delivery_mode: String,
    pub teacher_name: Option<String>,
    pub meeting_link: Option<String>,
    /// The line holding this session, when already booked.
    pub line_id: Option<i64>,
}

/// One day of the agenda.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgendaDay {
    pub date: String,
    pub weekday: String,
    pub sessions: Vec<AgendaSessionInfo>,
}

/// API response for the weekly agenda.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListAgendaResponse {
    pub week_start: String,
    pub campus_id: Option<i64>,
    pub city: Option<String>,
    pub delivery_mode: Option<String>,
    pub current_unit: u32,
    pub days: Vec<AgendaDay>,
}

/// API request to add a session to the student's agenda.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddToAgendaRequest {
    pub session_id: i64,
    /// The week the portal was showing; the plan week follows the session date.
    pub week_start: Option<String>,
}

/// A booked line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AgendaLineInfo {
    pub line_id: i64,
    pub session_id: i64,
    pub effective_subject_id: i64,
    pub subject_name: String,
    pub date: String,
    pub time_start: String,
    pub time_end: String,
    pub campus_id: i64,
    pub delivery_mode: String,
    pub session_state: String,
    /// The student's seat state, if a seat exists.
    pub enrollment_state: Option<String>,
    pub late_cancel: bool,
}

/// Prerequisites a refused booking is missing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MissingPrerequisitesInfo {
    pub bcheck_units: Vec<u32>,
    pub bskill_units: Vec<u32>,
    pub other: Vec<String>,
    /// Human-readable summary, e.g. `BCheck unidades: 4`.
    pub summary: String,
}

/// API response for adding a session.
///
/// Refusals are not HTTP errors: `status` is `error` and `code` carries the
/// rejection kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddToAgendaResponse {
    /// `ok` or `error`.
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<AgendaLineInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_prerequisites: Option<MissingPrerequisitesInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_capacity: Option<bool>,
}

/// API request to remove a line from the student's agenda.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoveFromAgendaRequest {
    pub line_id: i64,
}

/// API response for removing a line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoveFromAgendaResponse {
    /// `ok` or `error`.
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Every line removed, the requested one first.
    pub removed: Vec<i64>,
    pub late_cancel: bool,
    pub dependent_line_ids: Vec<i64>,
}

/// Query for the student's own agenda.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MyAgendaQuery {
    pub week: Option<String>,
}

/// API response for the student's own agenda.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MyAgendaResponse {
    pub week_start: String,
    pub lines: Vec<AgendaLineInfo>,
}

/// API response for the student's progress.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProgressResponse {
    pub student_id: i64,
    pub program_id: i64,
    pub plan_id: Option<i64>,
    pub summary: ProgressSummary,
}

// ========================================================================
// Staff
// ========================================================================

/// API request to move a session through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetSessionStateRequest {
    /// Target state, e.g. `started` or `done`.
    pub target: String,
}

/// API response for a session lifecycle move.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetSessionStateResponse {
    pub session_id: i64,
    pub from: String,
    pub to: String,
    pub event_id: i64,
    /// History rows written when the move finalized the session.
    pub history_ids: Vec<i64>,
}

/// One student's outcome in a session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttendanceOutcomeRequest {
    pub student_id: i64,
    /// `attended` or `absent`.
    pub status: String,
    pub novedad: Option<String>,
    pub notes: Option<String>,
}

/// API request to finalize a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FinalizeSessionRequest {
    #[serde(default)]
    pub outcomes: Vec<AttendanceOutcomeRequest>,
}

/// API response for attendance and finalization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttendanceResponse {
    pub session_id: i64,
    /// Newly written history rows.
    pub history_ids: Vec<i64>,
    pub event_id: i64,
}

/// API request to amend a history row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AmendHistoryRequest {
    pub attendance_status: Option<String>,
    pub novedad: Option<String>,
    pub grade: Option<f64>,
    pub reason: String,
}

/// API response for a history amendment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AmendHistoryResponse {
    pub history_id: i64,
    pub amendment_id: i64,
}

// ========================================================================
// Auth
// ========================================================================

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// API response for successful login.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginResponse {
    /// The session token (opaque).
    pub session_token: String,
    pub login: String,
    pub display_name: String,
    pub role: String,
    /// The portal only allows a password change until this is cleared.
    pub must_change_password: bool,
    pub expires_at: String,
}

/// API request to change the caller's password.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// API response for successful password change.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChangePasswordResponse {
    pub message: String,
}

/// Represents whether a specific action is permitted.
///
/// Serializes to JSON as true/false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The action is permitted.
    Allowed,
    /// The action is not permitted.
    Denied,
}

impl Capability {
    /// Returns true if the capability is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Creates a capability from a boolean value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::Allowed } else { Self::Denied }
    }
}

impl serde::Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(self.is_allowed())
    }
}

impl<'de> serde::Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let b = bool::deserialize(deserializer)?;
        Ok(Self::from_bool(b))
    }
}

/// What the portal should offer an account.
///
/// Advisory only; every handler still authorizes on its own.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortalCapabilities {
    pub can_view_agenda: Capability,
    pub can_book: Capability,
    pub can_manage_sessions: Capability,
    pub can_amend_history: Capability,
    pub can_change_password: Capability,
}

/// API response for the current account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WhoAmIResponse {
    pub login: String,
    pub display_name: String,
    pub role: String,
    pub student_id: Option<i64>,
    pub must_change_password: bool,
    pub capabilities: PortalCapabilities,
}

// ========================================================================
// Sync
// ========================================================================

/// Query for the published-sessions export.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PublishedSessionsQuery {
    pub campus_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub subject_id: Option<i64>,
    /// `json` (default) or `csv`.
    pub format: Option<String>,
    /// API key passed as a query parameter.
    pub api_key: Option<String>,
}

/// One exported session. Flat so it serializes to a CSV row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PublishedSessionInfo {
    pub session_id: i64,
    pub date: String,
    pub time_start: String,
    pub time_end: String,
    pub program_id: i64,
    pub subject_id: Option<i64>,
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub template_id: Option<i64>,
    pub template_name: Option<String>,
    pub teacher_id: i64,
    pub teacher_name: Option<String>,
    pub campus_id: i64,
    pub campus_name: Option<String>,
    pub city: Option<String>,
    pub delivery_mode: String,
    pub max_capacity: u32,
    pub audience_unit_from: Option<u32>,
    pub audience_unit_to: Option<u32>,
    pub state: String,
    pub meeting_link: Option<String>,
}

/// JSON body of the published-sessions export.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PublishedSessionsResponse {
    pub count: usize,
    pub sessions: Vec<PublishedSessionInfo>,
}

// ========================================================================
// Jobs
// ========================================================================

/// What one maintenance run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MaintenanceReport {
    pub finalized_sessions: usize,
    pub purged_lines: usize,
    pub updated_students: usize,
    pub purged_trash: usize,
    pub expired_sessions: usize,
}
