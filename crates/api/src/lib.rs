// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the Aula booking engine.
//!
//! Handlers here authenticate and authorize callers, load snapshots from
//! persistence, apply core commands and translate every failure into an
//! [`ApiError`]. They are transport-agnostic; the server crate maps them to
//! HTTP.

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
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod capabilities;
mod config;
mod error;
mod handlers;
mod jobs;
mod password_policy;
mod request_response;
mod sync;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use capabilities::compute_portal_capabilities;
pub use config::{
    KEY_ALLOW_NO_KEY, KEY_API_KEY, KEY_DEFAULT_POLICY, KEY_FINALIZE_GRACE,
    KEY_MIN_ADVANCE_CANCEL, KEY_PASSWORD_DISALLOW_REUSE, KEY_PASSWORD_MIN_LENGTH,
    KEY_PASSWORD_REQUIRE_NUMBER, KEY_PASSWORD_REQUIRE_SPECIAL, KEY_PASSWORD_REQUIRE_UPPER,
    KEY_SESSION_TTL_HOURS, KEY_TRASH_RETENTION_DAYS, PolicyBundle,
};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error, translate_rejection,
};
pub use handlers::{
    add_to_agenda, amend_history, change_password, finalize_session, list_agenda, login, logout,
    mark_attendance, my_agenda, parse_date, progress, remove_from_agenda, set_session_state,
    whoami,
};
pub use jobs::{
    expire_sessions, finalize_due_sessions, purge_closed_lines, purge_expired_trash,
    recompute_current_units, run_maintenance,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AddToAgendaRequest, AddToAgendaResponse, AgendaDay, AgendaLineInfo, AgendaQuery,
    AgendaSessionInfo, AmendHistoryRequest, AmendHistoryResponse, AttendanceOutcomeRequest,
    AttendanceResponse, Capability, ChangePasswordRequest, ChangePasswordResponse,
    FinalizeSessionRequest, ListAgendaResponse, LoginRequest, LoginResponse, MaintenanceReport,
    MissingPrerequisitesInfo, MyAgendaQuery, MyAgendaResponse, PortalCapabilities,
    ProgressResponse, PublishedSessionInfo, PublishedSessionsQuery, PublishedSessionsResponse,
    RemoveFromAgendaRequest, RemoveFromAgendaResponse, SetSessionStateRequest,
    SetSessionStateResponse, WhoAmIResponse,
};
pub use sync::{
    ExportBody, ExportFormat, authorize_sync, export_published_sessions, list_published_sessions,
    render_export,
};
