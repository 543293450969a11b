// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeSet;
use std::sync::Arc;

use aula_domain::{
    Campus, CampusType, CatalogSeed, ClassSession, DeliveryMode, Enrollment, EnrollmentState,
    Level, Phase, Plan, Program, SessionState, Student, Subject, SubjectCategory,
    SubjectClassification, Teacher,
};
use aula_persistence::{NewPortalUser, Persistence};
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use serde_json::Value;
use time::macros::{date, time};
use time::{Duration, UtcOffset};
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::live::LiveEventBroadcaster;
use crate::{AppState, build_router};

pub const STUDENT: i64 = 7;
pub const PASSWORD: &str = "Welcome123";
pub const API_KEY: &str = "sync-secret";

fn bcheck(unit: u32) -> Subject {
    Subject {
        id: 100 + i64::from(unit),
        name: format!("BCheck {unit}"),
        alias: None,
        code: format!("BC{unit}"),
        level_id: 1000,
        category: SubjectCategory::BCheck,
        classification: SubjectClassification::Prerequisite,
        unit_number: Some(unit),
        bskill_number: None,
        unit_block_start: None,
        unit_block_end: None,
        sequence: i32::try_from(unit).unwrap(),
        evaluable: true,
        prerequisite_ids: BTreeSet::new(),
        plan_ids: BTreeSet::new(),
    }
}

fn seed() -> CatalogSeed {
    CatalogSeed {
        programs: vec![Program {
            id: 1,
            name: String::from("English"),
            code: String::from("ENG"),
            program_type: String::from("language"),
        }],
        plans: vec![Plan {
            id: 10,
            name: String::from("Standard"),
            code: String::from("STD"),
            program_id: 1,
        }],
        phases: vec![Phase {
            id: 100,
            name: String::from("Basic"),
            sequence: 1,
            program_id: 1,
        }],
        levels: vec![Level {
            id: 1000,
            name: String::from("A1"),
            sequence: 1,
            phase_id: 100,
            min_unit: 1,
            max_unit: 4,
        }],
        subjects: vec![bcheck(1), bcheck(2)],
        campuses: vec![Campus {
            id: 1,
            name: String::from("Centro"),
            code: String::from("CEN"),
            city: String::from("Bogota"),
            campus_type: CampusType::Physical,
        }],
        teachers: vec![Teacher {
            id: 1,
            name: String::from("Ana"),
        }],
        ..CatalogSeed::default()
    }
}

fn create_user(persistence: &mut Persistence, login: &str, role: &str, student_id: Option<i64>) {
    persistence
        .create_portal_user(
            &NewPortalUser {
                login,
                display_name: login,
                password: PASSWORD,
                role,
                student_id,
                must_change_password: false,
            },
            time::macros::datetime!(2026 - 01 - 05 09:00),
        )
        .unwrap();
}

/// An app with one student, a coach, an admin, and session 1 two days out.
pub fn create_test_app_state() -> AppState {
    let mut persistence = Persistence::new_in_memory().unwrap();
    persistence.seed_catalog(&seed()).unwrap();
    persistence
        .insert_student(&Student {
            id: STUDENT,
            name: String::from("Laura"),
            document: String::from("DOC7"),
            program_id: Some(1),
            plan_id: Some(10),
            current_phase_id: Some(100),
            current_level_id: Some(1000),
            preferred_delivery_mode: DeliveryMode::Presential,
            preferred_campus_id: Some(1),
            profile_state_id: None,
            current_unit: 1,
        })
        .unwrap();
    persistence
        .insert_enrollment(&Enrollment {
            id: 70,
            student_id: STUDENT,
            subject_id: None,
            program_id: 1,
            plan_id: Some(10),
            phase_id: Some(100),
            level_id: Some(1000),
            campus_id: Some(1),
            delivery_mode: DeliveryMode::Presential,
            state: EnrollmentState::Enrolled,
            start_date: date!(2026 - 01 - 05),
            end_date: None,
            final_grade: None,
        })
        .unwrap();
    create_user(&mut persistence, "student7", "student", Some(STUDENT));
    create_user(&mut persistence, "coach", "coach", None);
    create_user(&mut persistence, "admin", "admin", None);
    persistence.set_config_value("api.key", API_KEY).unwrap();
    let catalog = persistence.load_catalog().unwrap();

    let app_state = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        catalog: Arc::new(catalog),
        broadcaster: Arc::new(LiveEventBroadcaster::new()),
        utc_offset: UtcOffset::UTC,
    };
    let session_date = app_state.now().date() + Duration::days(2);
    app_state
        .persistence
        .try_lock()
        .unwrap()
        .insert_session(&ClassSession {
            id: 1,
            agenda_id: None,
            program_id: 1,
            subject_id: Some(101),
            template_id: None,
            teacher_id: 1,
            campus_id: 1,
            subcampus_id: None,
            date: session_date,
            time_start: time!(10:00),
            time_end: time!(11:00),
            delivery_mode: DeliveryMode::Presential,
            max_capacity: 10,
            audience_unit_from: Some(1),
            audience_unit_to: Some(4),
            meeting_link: None,
            is_published: true,
            active: true,
            state: SessionState::Active,
            elective_pool_id: None,
        })
        .unwrap();
    app_state
}

pub fn create_test_app() -> (AppState, Router) {
    let app_state = create_test_app_state();
    let app = build_router(app_state.clone());
    (app_state, app)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Logs in and returns the session token.
pub async fn login_as(app: &Router, login: &str) -> String {
    let response = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({ "login": login, "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["session_token"]
        .as_str()
        .unwrap()
        .to_string()
}
