// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Published-session export for external consumers.

use std::str::FromStr;

use tracing::{debug, warn};

use aula_domain::{Catalog, ClassSession};
use aula_persistence::{Persistence, SessionFilter};

use crate::config::PolicyBundle;
use crate::error::{ApiError, translate_persistence_error};
use crate::handlers::{format_time, parse_date};
use crate::request_response::{
    PublishedSessionInfo, PublishedSessionsQuery, PublishedSessionsResponse,
};

/// Export body encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(ApiError::InvalidInput {
                field: String::from("format"),
                message: format!("Unsupported format '{s}'; expected json or csv"),
            }),
        }
    }
}

/// A rendered export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBody {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Checks the key presented by a sync client.
///
/// Without a configured key the endpoint is closed unless
/// `api.allow_no_key` is set.
///
/// # Errors
///
/// Returns `InvalidApiKey` if the key is missing or wrong.
pub fn authorize_sync(policy: &PolicyBundle, presented: Option<&str>) -> Result<(), ApiError> {
    match (&policy.api_key, presented.map(str::trim)) {
        (Some(expected), Some(given)) if given == expected.as_str() => Ok(()),
        (None, _) if policy.allow_no_key => Ok(()),
        (Some(_), Some(_)) => {
            warn!("Sync request with a wrong API key");
            Err(ApiError::InvalidApiKey)
        }
        _ => {
            warn!("Sync request without an API key");
            Err(ApiError::InvalidApiKey)
        }
    }
}

fn session_info(catalog: &Catalog, session: &ClassSession) -> PublishedSessionInfo {
    let subject = session.subject_id.and_then(|id| catalog.subject(id));
    let campus = catalog.campus(session.campus_id);
    PublishedSessionInfo {
        session_id: session.id,
        date: session.date.to_string(),
        time_start: format_time(session.time_start),
        time_end: format_time(session.time_end),
        program_id: session.program_id,
        subject_id: session.subject_id,
        subject_code: subject.map(|s| s.code.clone()),
        subject_name: subject.map(|s| s.display_name().to_string()),
        template_id: session.template_id,
        template_name: session
            .template_id
            .and_then(|id| catalog.template(id))
            .map(|t| t.name.clone()),
        teacher_id: session.teacher_id,
        teacher_name: catalog.teacher(session.teacher_id).map(|t| t.name.clone()),
        campus_id: session.campus_id,
        campus_name: campus.map(|c| c.name.clone()),
        city: campus.map(|c| c.city.clone()),
        delivery_mode: session.delivery_mode.to_string(),
        max_capacity: session.max_capacity,
        audience_unit_from: session.audience_unit_from,
        audience_unit_to: session.audience_unit_to,
        state: session.state.to_string(),
        meeting_link: session.meeting_link.clone(),
    }
}

/// Lists published, active sessions matching the query.
///
/// # Errors
///
/// Returns an error if a date is malformed or the query fails.
pub fn list_published_sessions(
    persistence: &mut Persistence,
    catalog: &Catalog,
    query: &PublishedSessionsQuery,
) -> Result<Vec<PublishedSessionInfo>, ApiError> {
    let filter: SessionFilter = SessionFilter {
        start_date: query
            .start_date
            .as_deref()
            .map(|d| parse_date("start_date", d))
            .transpose()?,
        end_date: query
            .end_date
            .as_deref()
            .map(|d| parse_date("end_date", d))
            .transpose()?,
        campus_id: query.campus_id,
        subject_id: query.subject_id,
        ..SessionFilter::default()
    };
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
        && end < start
    {
        return Err(ApiError::InvalidInput {
            field: String::from("end_date"),
            message: format!("end_date {end} is before start_date {start}"),
        });
    }

    let sessions: Vec<ClassSession> = persistence
        .list_published_sessions(&filter)
        .map_err(translate_persistence_error)?;
    debug!(count = sessions.len(), "Listed published sessions");

    Ok(sessions
        .iter()
        .map(|session| session_info(catalog, session))
        .collect())
}

/// Renders an export in the requested format.
///
/// # Errors
///
/// Returns `Internal` if serialization fails.
pub fn render_export(
    sessions: Vec<PublishedSessionInfo>,
    format: ExportFormat,
) -> Result<ExportBody, ApiError> {
    let body: Vec<u8> = match format {
        ExportFormat::Json => serde_json::to_vec(&PublishedSessionsResponse {
            count: sessions.len(),
            sessions,
        })
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to encode JSON export: {e}"),
        })?,
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for session in &sessions {
                writer.serialize(session).map_err(|e| ApiError::Internal {
                    message: format!("Failed to encode CSV row: {e}"),
                })?;
            }
            writer.into_inner().map_err(|e| ApiError::Internal {
                message: format!("Failed to flush CSV export: {e}"),
            })?
        }
    };

    Ok(ExportBody {
        content_type: format.content_type(),
        body,
    })
}

/// Authorizes, lists and renders in one call.
///
/// # Errors
///
/// Returns `InvalidApiKey` for a bad key, `InvalidInput` for a bad query,
/// or an error if the query or encoding fails.
pub fn export_published_sessions(
    persistence: &mut Persistence,
    catalog: &Catalog,
    query: &PublishedSessionsQuery,
    bearer_key: Option<&str>,
) -> Result<ExportBody, ApiError> {
    let policy: PolicyBundle = PolicyBundle::load(persistence)?;
    authorize_sync(&policy, bearer_key.or(query.api_key.as_deref()))?;
    let format: ExportFormat = query
        .format
        .as_deref()
        .map_or(Ok(ExportFormat::Json), ExportFormat::from_str)?;
    let sessions: Vec<PublishedSessionInfo> =
        list_published_sessions(persistence, catalog, query)?;
    render_export(sessions, format)
}
