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
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod session;

#[cfg(test)]
mod tests;

use aula_api::{
    AddToAgendaRequest, AddToAgendaResponse, AgendaQuery, AmendHistoryRequest,
    AmendHistoryResponse, ApiError, AttendanceOutcomeRequest, AttendanceResponse,
    AuthenticatedActor, ChangePasswordRequest, ChangePasswordResponse, ExportBody,
    FinalizeSessionRequest, KEY_API_KEY, ListAgendaResponse, LoginRequest, LoginResponse,
    MaintenanceReport, MyAgendaQuery, MyAgendaResponse, ProgressResponse, PublishedSessionsQuery,
    RemoveFromAgendaRequest, RemoveFromAgendaResponse, SetSessionStateRequest,
    SetSessionStateResponse, WhoAmIResponse, add_to_agenda, amend_history, change_password,
    export_published_sessions, finalize_session, list_agenda, login, logout, mark_attendance,
    my_agenda, progress, remove_from_agenda, run_maintenance, set_session_state, whoami,
};
use aula_audit::Cause;
use aula_domain::Catalog;
use aula_persistence::{Persistence, PersistenceError};
use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::live::{LiveEvent, LiveEventBroadcaster, live_events_handler};
use crate::session::{SessionUser, bearer_token};

/// Aula Server - HTTP server for the Aula academy booking engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "AULA_DATABASE")]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, env = "AULA_PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(short, long, env = "AULA_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Sync API key, stored as `api.key` if none is configured yet
    #[arg(long, env = "AULA_API_KEY")]
    api_key: Option<String>,

    /// Seconds between maintenance sweeps
    #[arg(long, env = "AULA_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    sweep_interval_secs: u64,

    /// Offset of the academy's wall clock from UTC, in hours
    #[arg(
        long,
        env = "AULA_UTC_OFFSET_HOURS",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    utc_offset_hours: i8,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single writer; every request holds the lock for its whole unit of work.
    persistence: Arc<Mutex<Persistence>>,
    /// Validated at startup and read-only afterwards.
    catalog: Arc<Catalog>,
    broadcaster: Arc<LiveEventBroadcaster>,
    /// Session times are academy wall-clock times.
    utc_offset: UtcOffset,
}

impl AppState {
    /// The academy's current wall-clock time.
    #[must_use]
    pub fn now(&self) -> PrimitiveDateTime {
        let now: OffsetDateTime = OffsetDateTime::now_utc().to_offset(self.utc_offset);
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator.
    pub error: bool,
    /// Error message.
    pub message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } | ApiError::InvalidApiKey => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } | ApiError::BookingRejected { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for HttpError {
    fn from(err: PersistenceError) -> Self {
        error!(error = %err, "Persistence error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Persistence error: {err}"),
        }
    }
}

/// Builds the audit cause for a request.
fn request_cause(action: &str, actor: &AuthenticatedActor) -> Cause {
    Cause::new(
        format!("http:{action}"),
        format!("{action} requested by {}", actor.login),
    )
}

// ========================================================================
// Portal
// ========================================================================

/// Handler for GET `/agenda` endpoint.
async fn handle_list_agenda(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<ListAgendaResponse>, HttpError> {
    let now: PrimitiveDateTime = app_state.now();
    let mut persistence = app_state.persistence.lock().await;
    let response: ListAgendaResponse =
        list_agenda(&mut persistence, &app_state.catalog, &actor, &query, now)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/agenda/add` endpoint.
///
/// Refusals come back as a 200 with `status: "error"` and a code.
async fn handle_add_to_agenda(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<AddToAgendaRequest>,
) -> Result<Json<AddToAgendaResponse>, HttpError> {
    info!(login = %actor.login, session_id = req.session_id, "Handling add_to_agenda request");

    let now: PrimitiveDateTime = app_state.now();
    let cause: Cause = request_cause("add_to_agenda", &actor);
    let mut persistence = app_state.persistence.lock().await;
    let response: AddToAgendaResponse = add_to_agenda(
        &mut persistence,
        &app_state.catalog,
        &actor,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    if response.code.is_none()
        && let (Some(line), Some(student_id)) = (&response.line, actor.student_id)
    {
        app_state.broadcaster.broadcast(&LiveEvent::BookingAdded {
            session_id: line.session_id,
            student_id,
            line_id: line.line_id,
        });
    }
    Ok(Json(response))
}

/// Handler for POST `/agenda/remove` endpoint.
async fn handle_remove_from_agenda(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<RemoveFromAgendaRequest>,
) -> Result<Json<RemoveFromAgendaResponse>, HttpError> {
    info!(login = %actor.login, line_id = req.line_id, "Handling remove_from_agenda request");

    let now: PrimitiveDateTime = app_state.now();
    let cause: Cause = request_cause("remove_from_agenda", &actor);
    let mut persistence = app_state.persistence.lock().await;
    let response: RemoveFromAgendaResponse = remove_from_agenda(
        &mut persistence,
        &app_state.catalog,
        &actor,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    if !response.removed.is_empty()
        && let Some(student_id) = actor.student_id
    {
        app_state.broadcaster.broadcast(&LiveEvent::BookingRemoved {
            student_id,
            line_ids: response.removed.clone(),
            late_cancel: response.late_cancel,
        });
    }
    Ok(Json(response))
}

/// Handler for GET `/my-agenda` endpoint.
async fn handle_my_agenda(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
    Query(query): Query<MyAgendaQuery>,
) -> Result<Json<MyAgendaResponse>, HttpError> {
    let now: PrimitiveDateTime = app_state.now();
    let mut persistence = app_state.persistence.lock().await;
    let response: MyAgendaResponse =
        my_agenda(&mut persistence, &app_state.catalog, &actor, &query, now)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/progress` endpoint.
async fn handle_progress(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _user): SessionUser,
) -> Result<Json<ProgressResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ProgressResponse = progress(&mut persistence, &app_state.catalog, &actor)?;
    drop(persistence);
    Ok(Json(response))
}

// ========================================================================
// Auth
// ========================================================================

/// Handler for POST `/auth/login` endpoint.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let now: PrimitiveDateTime = app_state.now();
    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = login(&mut persistence, &req, now)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for POST `/auth/logout` endpoint.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    SessionUser(actor, _user): SessionUser,
) -> Result<StatusCode, HttpError> {
    let token: String = bearer_token(&headers)
        .ok()
        .flatten()
        .map(String::from)
        .unwrap_or_default();
    let mut persistence = app_state.persistence.lock().await;
    logout(&mut persistence, &token)?;
    drop(persistence);
    info!(login = %actor.login, "Portal logout");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST `/auth/change-password` endpoint.
async fn handle_change_password(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(_actor, user): SessionUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, HttpError> {
    let now: PrimitiveDateTime = app_state.now();
    let mut persistence = app_state.persistence.lock().await;
    let response: ChangePasswordResponse = change_password(&mut persistence, &user, &req, now)?;
    drop(persistence);
    Ok(Json(response))
}

/// Handler for GET `/auth/whoami` endpoint.
async fn handle_whoami(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, user): SessionUser,
) -> Result<Json<WhoAmIResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: WhoAmIResponse = whoami(&mut persistence, &actor, &user)?;
    drop(persistence);
    Ok(Json(response))
}

// ========================================================================
// Staff
// ========================================================================

/// Handler for POST `/sessions/{session_id}/state` endpoint.
async fn handle_set_session_state(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<SetSessionStateRequest>,
) -> Result<Json<SetSessionStateResponse>, HttpError> {
    info!(login = %actor.login, session_id, target = %req.target, "Handling set_session_state request");

    let now: PrimitiveDateTime = app_state.now();
    let cause: Cause = request_cause("set_session_state", &actor);
    let mut persistence = app_state.persistence.lock().await;
    let response: SetSessionStateResponse = set_session_state(
        &mut persistence,
        &app_state.catalog,
        &actor,
        session_id,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    app_state
        .broadcaster
        .broadcast(&LiveEvent::SessionStateChanged {
            session_id,
            from: response.from.clone(),
            to: response.to.clone(),
        });
    if !response.history_ids.is_empty() {
        app_state
            .broadcaster
            .broadcast(&LiveEvent::AttendanceRecorded {
                session_id,
                history_ids: response.history_ids.clone(),
            });
    }
    Ok(Json(response))
}

/// Handler for POST `/sessions/{session_id}/attendance` endpoint.
async fn handle_mark_attendance(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<AttendanceOutcomeRequest>,
) -> Result<Json<AttendanceResponse>, HttpError> {
    let now: PrimitiveDateTime = app_state.now();
    let cause: Cause = request_cause("mark_attendance", &actor);
    let mut persistence = app_state.persistence.lock().await;
    let response: AttendanceResponse = mark_attendance(
        &mut persistence,
        &app_state.catalog,
        &actor,
        session_id,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    app_state
        .broadcaster
        .broadcast(&LiveEvent::AttendanceRecorded {
            session_id,
            history_ids: response.history_ids.clone(),
        });
    Ok(Json(response))
}

/// Handler for POST `/sessions/{session_id}/finalize` endpoint.
async fn handle_finalize_session(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<FinalizeSessionRequest>,
) -> Result<Json<AttendanceResponse>, HttpError> {
    info!(login = %actor.login, session_id, outcomes = req.outcomes.len(), "Handling finalize_session request");

    let now: PrimitiveDateTime = app_state.now();
    let cause: Cause = request_cause("finalize_session", &actor);
    let mut persistence = app_state.persistence.lock().await;
    let response: AttendanceResponse = finalize_session(
        &mut persistence,
        &app_state.catalog,
        &actor,
        session_id,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    app_state
        .broadcaster
        .broadcast(&LiveEvent::AttendanceRecorded {
            session_id,
            history_ids: response.history_ids.clone(),
        });
    Ok(Json(response))
}

/// Handler for POST `/history/{history_id}/amend` endpoint.
async fn handle_amend_history(
    AxumState(app_state): AxumState<AppState>,
    Path(history_id): Path<i64>,
    SessionUser(actor, _user): SessionUser,
    Json(req): Json<AmendHistoryRequest>,
) -> Result<Json<AmendHistoryResponse>, HttpError> {
    let now: PrimitiveDateTime = app_state.now();
    let cause: Cause = Cause::new(format!("http:amend_history:{history_id}"), req.reason.clone());
    let mut persistence = app_state.persistence.lock().await;
    let response: AmendHistoryResponse = amend_history(
        &mut persistence,
        &app_state.catalog,
        &actor,
        history_id,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    app_state
        .broadcaster
        .broadcast(&LiveEvent::HistoryAmended { history_id });
    Ok(Json(response))
}

// ========================================================================
// Sync
// ========================================================================

/// Handler for GET `/api/v1/sessions/published` endpoint.
///
/// The key may come as a bearer token or the `api_key` query parameter.
async fn handle_published_sessions(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Query(query): Query<PublishedSessionsQuery>,
) -> Response {
    let bearer: Option<&str> = bearer_token(&headers).ok().flatten();
    let mut persistence = app_state.persistence.lock().await;
    let result: Result<ExportBody, ApiError> =
        export_published_sessions(&mut persistence, &app_state.catalog, &query, bearer);
    drop(persistence);

    match result {
        Ok(export) => ([(CONTENT_TYPE, export.content_type)], export.body).into_response(),
        Err(ApiError::InvalidApiKey) => {
            warn!("Sync request with invalid or missing API key");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": ApiError::InvalidApiKey.to_string() })),
            )
                .into_response()
        }
        Err(e) => HttpError::from(e).into_response(),
    }
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/agenda", get(handle_list_agenda))
        .route("/agenda/add", post(handle_add_to_agenda))
        .route("/agenda/remove", post(handle_remove_from_agenda))
        .route("/my-agenda", get(handle_my_agenda))
        .route("/progress", get(handle_progress))
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/change-password", post(handle_change_password))
        .route("/auth/whoami", get(handle_whoami))
        .route("/sessions/{session_id}/state", post(handle_set_session_state))
        .route("/sessions/{session_id}/attendance", post(handle_mark_attendance))
        .route("/sessions/{session_id}/finalize", post(handle_finalize_session))
        .route("/history/{history_id}/amend", post(handle_amend_history))
        .route("/api/v1/sessions/published", get(handle_published_sessions))
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

/// Runs one maintenance sweep under the persistence lock.
async fn sweep(app_state: &AppState) {
    let now: PrimitiveDateTime = app_state.now();
    let mut persistence = app_state.persistence.lock().await;
    let result: Result<MaintenanceReport, ApiError> =
        run_maintenance(&mut persistence, &app_state.catalog, now);
    drop(persistence);

    match result {
        Ok(report) => {
            info!(?report, "Maintenance sweep completed");
            if report.finalized_sessions > 0 {
                app_state
                    .broadcaster
                    .broadcast(&LiveEvent::SessionsFinalized {
                        count: report.finalized_sessions,
                    });
            }
        }
        Err(e) => error!(error = %e, "Maintenance sweep failed"),
    }
}

/// Stores the CLI key as `api.key` unless one is already configured.
fn seed_api_key(persistence: &mut Persistence, api_key: &str) -> Result<(), PersistenceError> {
    if persistence.get_config_value(KEY_API_KEY)?.is_some() {
        info!("Keeping configured sync API key");
        return Ok(());
    }
    persistence.set_config_value(KEY_API_KEY, api_key)?;
    info!("Stored sync API key from the command line");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Aula Server");

    let mut persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    // A catalog that fails validation stops the server here.
    let catalog: Catalog = persistence.load_catalog()?;

    if let Some(api_key) = &args.api_key {
        seed_api_key(&mut persistence, api_key)?;
    }

    let utc_offset: UtcOffset = UtcOffset::from_hms(args.utc_offset_hours, 0, 0)?;
    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        catalog: Arc::new(catalog),
        broadcaster: Arc::new(LiveEventBroadcaster::new()),
        utc_offset,
    };

    let sweeper: AppState = app_state.clone();
    let interval_secs: u64 = args.sweep_interval_secs.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            sweep(&sweeper).await;
        }
    });
    info!(interval_secs, "Maintenance sweep scheduled");

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
