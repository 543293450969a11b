// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::Duration;

use super::helpers::{PASSWORD, STUDENT, coach_actor, create_user, now, setup, student_actor};
use crate::{
    ApiError, AuthenticationService, Capability, ChangePasswordRequest, LoginRequest, Role,
    change_password, login, logout, whoami,
};

fn login_request(login: &str, password: &str) -> LoginRequest {
    LoginRequest {
        login: login.to_string(),
        password: password.to_string(),
    }
}

fn change_request(current: &str, new: &str) -> ChangePasswordRequest {
    ChangePasswordRequest {
        current_password: current.to_string(),
        new_password: new.to_string(),
        new_password_confirmation: new.to_string(),
    }
}

#[test]
fn test_login_opens_a_session() {
    let (mut persistence, _catalog) = setup();
    student_actor(&mut persistence, STUDENT);

    let response = login(&mut persistence, &login_request("Student7", PASSWORD), now()).unwrap();

    assert_eq!(response.login, "student7");
    assert_eq!(response.role, "student");
    assert!(!response.must_change_password);
    assert_eq!(response.session_token.len(), 64);
    assert_eq!(response.expires_at, "2026-03-09 20:00:00");

    let (actor, user) =
        AuthenticationService::validate_session(&mut persistence, &response.session_token, now())
            .unwrap();
    assert_eq!(actor.role, Role::Student);
    assert_eq!(actor.student_id, Some(STUDENT));
    assert!(user.last_login_at.is_some());
}

#[test]
fn test_login_failures_do_not_reveal_which_part_was_wrong() {
    let (mut persistence, _catalog) = setup();
    student_actor(&mut persistence, STUDENT);

    let wrong_password = login(&mut persistence, &login_request("student7", "nope"), now());
    let unknown = login(&mut persistence, &login_request("ghost", PASSWORD), now());

    let message = |result: Result<_, ApiError>| match result {
        Err(ApiError::AuthenticationFailed { reason }) => reason,
        other => panic!("expected an authentication failure, got {other:?}"),
    };
    assert_eq!(message(wrong_password), "Invalid login or password");
    assert_eq!(message(unknown), "Invalid login or password");
}

#[test]
fn test_session_ttl_comes_from_config() {
    let (mut persistence, _catalog) = setup();
    student_actor(&mut persistence, STUDENT);
    persistence
        .set_config_value("portal.session_ttl_hours", "1")
        .unwrap();

    let response = login(&mut persistence, &login_request("student7", PASSWORD), now()).unwrap();
    assert_eq!(response.expires_at, "2026-03-09 09:00:00");

    let expired = AuthenticationService::validate_session(
        &mut persistence,
        &response.session_token,
        now() + Duration::hours(1),
    );
    assert!(expired.is_err());
}

#[test]
fn test_logout_ends_the_session() {
    let (mut persistence, _catalog) = setup();
    student_actor(&mut persistence, STUDENT);
    let token = login(&mut persistence, &login_request("student7", PASSWORD), now())
        .unwrap()
        .session_token;

    logout(&mut persistence, &token).unwrap();

    assert!(AuthenticationService::validate_session(&mut persistence, &token, now()).is_err());
}

#[test]
fn test_whoami_reports_capabilities() {
    let (mut persistence, _catalog) = setup();
    let student = student_actor(&mut persistence, STUDENT);
    let coach = coach_actor(&mut persistence);

    let user = persistence.get_user_by_id(student.user_id).unwrap().unwrap();
    let me = whoami(&mut persistence, &student, &user).unwrap();
    assert_eq!(me.student_id, Some(STUDENT));
    assert_eq!(me.capabilities.can_book, Capability::Allowed);
    assert_eq!(me.capabilities.can_view_agenda, Capability::Allowed);
    assert_eq!(me.capabilities.can_manage_sessions, Capability::Denied);
    assert_eq!(me.capabilities.can_amend_history, Capability::Denied);

    let coach_user = persistence.get_user_by_id(coach.user_id).unwrap().unwrap();
    let staff = whoami(&mut persistence, &coach, &coach_user).unwrap();
    assert_eq!(staff.role, "coach");
    assert_eq!(staff.capabilities.can_book, Capability::Denied);
    assert_eq!(staff.capabilities.can_manage_sessions, Capability::Allowed);
}

#[test]
fn test_forced_change_leaves_only_password_capability() {
    let (mut persistence, _catalog) = setup();
    let student = student_actor(&mut persistence, STUDENT);
    persistence
        .set_must_change_password(student.user_id, true)
        .unwrap();
    let user = persistence.get_user_by_id(student.user_id).unwrap().unwrap();

    let me = whoami(&mut persistence, &student, &user).unwrap();

    assert!(me.must_change_password);
    assert_eq!(me.capabilities.can_view_agenda, Capability::Denied);
    assert_eq!(me.capabilities.can_book, Capability::Denied);
    assert_eq!(me.capabilities.can_change_password, Capability::Allowed);
}

#[test]
fn test_change_password_clears_forced_change() {
    let (mut persistence, _catalog) = setup();
    let student = student_actor(&mut persistence, STUDENT);
    persistence
        .set_must_change_password(student.user_id, true)
        .unwrap();
    let user = persistence.get_user_by_id(student.user_id).unwrap().unwrap();

    change_password(
        &mut persistence,
        &user,
        &change_request(PASSWORD, "Brandnew42"),
        now(),
    )
    .unwrap();

    let user = persistence.get_user_by_id(student.user_id).unwrap().unwrap();
    assert!(!user.must_change_password);
    assert!(login(&mut persistence, &login_request("student7", "Brandnew42"), now()).is_ok());
    assert!(login(&mut persistence, &login_request("student7", PASSWORD), now()).is_err());
}

#[test]
fn test_change_password_enforces_policy() {
    let (mut persistence, _catalog) = setup();
    let student = create_user(&mut persistence, "laura", "student", Some(STUDENT));
    let user = persistence.get_user_by_id(student.user_id).unwrap().unwrap();

    let wrong_current = change_password(
        &mut persistence,
        &user,
        &change_request("Guess1234", "Brandnew42"),
        now(),
    );
    assert!(matches!(
        wrong_current,
        Err(ApiError::AuthenticationFailed { .. })
    ));

    let too_weak = change_password(&mut persistence, &user, &change_request(PASSWORD, "short"), now());
    assert!(matches!(
        too_weak,
        Err(ApiError::PasswordPolicyViolation { .. })
    ));

    let reused = change_password(
        &mut persistence,
        &user,
        &change_request(PASSWORD, PASSWORD),
        now(),
    );
    assert!(matches!(reused, Err(ApiError::PasswordPolicyViolation { .. })));

    let mismatched = change_password(
        &mut persistence,
        &user,
        &ChangePasswordRequest {
            current_password: PASSWORD.to_string(),
            new_password: String::from("Brandnew42"),
            new_password_confirmation: String::from("Brandnew43"),
        },
        now(),
    );
    assert!(matches!(
        mismatched,
        Err(ApiError::PasswordPolicyViolation { .. })
    ));
}

#[test]
fn test_reuse_window_follows_config() {
    let (mut persistence, _catalog) = setup();
    persistence
        .set_config_value("password.disallow_reuse", "0")
        .unwrap();
    let student = student_actor(&mut persistence, STUDENT);
    let user = persistence.get_user_by_id(student.user_id).unwrap().unwrap();

    assert!(
        change_password(
            &mut persistence,
            &user,
            &change_request(PASSWORD, PASSWORD),
            now(),
        )
        .is_ok()
    );
}
