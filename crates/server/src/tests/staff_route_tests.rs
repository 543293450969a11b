// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use aula_api::ApiError;
use axum::http::StatusCode;
use serde_json::json;

use super::helpers::{STUDENT, body_json, create_test_app, login_as, send};
use crate::HttpError;
use crate::live::LiveEvent;

#[tokio::test]
async fn test_coach_runs_a_session_and_admin_amends() {
    let (state, app) = create_test_app();
    let student = login_as(&app, "student7").await;
    send(
        &app,
        "POST",
        "/agenda/add",
        Some(&student),
        Some(json!({ "session_id": 1 })),
    )
    .await;
    let mut events = state.broadcaster.subscribe();
    let coach = login_as(&app, "coach").await;

    let started = send(
        &app,
        "POST",
        "/sessions/1/state",
        Some(&coach),
        Some(json!({ "target": "started" })),
    )
    .await;
    assert_eq!(started.status(), StatusCode::OK);
    assert_eq!(body_json(started).await["to"], "started");
    assert!(matches!(
        events.try_recv(),
        Ok(LiveEvent::SessionStateChanged { session_id: 1, .. })
    ));

    let finalized = send(
        &app,
        "POST",
        "/sessions/1/finalize",
        Some(&coach),
        Some(json!({
            "outcomes": [{ "student_id": STUDENT, "status": "absent" }]
        })),
    )
    .await;
    assert_eq!(finalized.status(), StatusCode::OK);
    let history_id = body_json(finalized).await["history_ids"][0]
        .as_i64()
        .unwrap();
    assert!(matches!(
        events.try_recv(),
        Ok(LiveEvent::AttendanceRecorded { session_id: 1, .. })
    ));

    let amend_body = json!({
        "attendance_status": "attended",
        "reason": "marked the wrong student"
    });
    let by_coach = send(
        &app,
        "POST",
        &format!("/history/{history_id}/amend"),
        Some(&coach),
        Some(amend_body.clone()),
    )
    .await;
    assert_eq!(by_coach.status(), StatusCode::FORBIDDEN);

    let admin = login_as(&app, "admin").await;
    let amended = send(
        &app,
        "POST",
        &format!("/history/{history_id}/amend"),
        Some(&admin),
        Some(amend_body),
    )
    .await;
    assert_eq!(amended.status(), StatusCode::OK);
    assert_eq!(body_json(amended).await["history_id"], history_id);
}

#[tokio::test]
async fn test_students_cannot_change_session_state() {
    let (_state, app) = create_test_app();
    let student = login_as(&app, "student7").await;

    let response = send(
        &app,
        "POST",
        "/sessions/1/state",
        Some(&student),
        Some(json!({ "target": "started" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_illegal_transition_is_unprocessable() {
    let (_state, app) = create_test_app();
    let coach = login_as(&app, "coach").await;

    let response = send(
        &app,
        "POST",
        "/sessions/1/state",
        Some(&coach),
        Some(json!({ "target": "done" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_api_errors_map_to_statuses() {
    let cases = [
        (
            ApiError::AuthenticationFailed {
                reason: String::from("x"),
            },
            StatusCode::UNAUTHORIZED,
        ),
        (ApiError::InvalidApiKey, StatusCode::UNAUTHORIZED),
        (
            ApiError::Unauthorized {
                action: String::from("x"),
                required_role: String::from("admin"),
            },
            StatusCode::FORBIDDEN,
        ),
        (
            ApiError::InvalidInput {
                field: String::from("week"),
                message: String::from("x"),
            },
            StatusCode::BAD_REQUEST,
        ),
        (
            ApiError::ResourceNotFound {
                resource_type: String::from("Session"),
                message: String::from("x"),
            },
            StatusCode::NOT_FOUND,
        ),
        (
            ApiError::Conflict {
                message: String::from("x"),
            },
            StatusCode::CONFLICT,
        ),
        (
            ApiError::BookingRejected {
                code: String::from("no_capacity"),
                message: String::from("x"),
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            ApiError::Internal {
                message: String::from("x"),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(HttpError::from(err).status, status);
    }
}
