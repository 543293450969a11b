// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use time::{Duration, PrimitiveDateTime};
use tracing::{info, warn};

use aula_audit::Actor;
use aula_persistence::{Persistence, PersistenceError, PortalSessionData, PortalUserData, parse_datetime};

use crate::error::AuthError;

/// Portal account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Books and cancels sessions on their own agenda.
    Student,
    /// Records attendance and runs the session lifecycle.
    Coach,
    /// Everything a coach can do, plus history amendments.
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }

    /// Parses a stored role.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for an unknown role.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        match value.trim().to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "coach" => Ok(Self::Coach),
            "admin" => Ok(Self::Admin),
            _ => Err(AuthError::AuthenticationFailed {
                reason: format!("Invalid role: {value}"),
            }),
        }
    }

    const fn is_staff(self) -> bool {
        matches!(self, Self::Coach | Self::Admin)
    }
}

/// An authenticated portal account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    pub user_id: i64,
    pub login: String,
    pub role: Role,
    /// The student this account books for, if any.
    pub student_id: Option<i64>,
}

impl AuthenticatedActor {
    #[must_use]
    pub const fn new(user_id: i64, login: String, role: Role, student_id: Option<i64>) -> Self {
        Self {
            user_id,
            login,
            role,
            student_id,
        }
    }

    /// Builds the actor from a stored user.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored role is unknown.
    pub fn from_user(user: &PortalUserData) -> Result<Self, AuthError> {
        Ok(Self::new(
            user.user_id,
            user.login.clone(),
            Role::parse(&user.role)?,
            user.student_id,
        ))
    }

    /// Converts this authenticated actor into an audit Actor.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.login.clone(), String::from(self.role.as_str()))
    }
}

/// Role checks for every protected operation.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Returns the student a portal request acts for.
    ///
    /// Any role may use the portal, provided the account is linked to a
    /// student.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the account has no student.
    pub fn authorize_portal(actor: &AuthenticatedActor) -> Result<i64, AuthError> {
        actor.student_id.ok_or_else(|| AuthError::Unauthorized {
            action: String::from("portal"),
            required_role: String::from("Student"),
        })
    }

    /// Checks that the actor may run staff operations on sessions.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the actor is a coach or an admin.
    pub fn authorize_staff(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        if actor.role.is_staff() {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Coach"),
            })
        }
    }

    /// Checks that the actor may amend academic history.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the actor is an admin.
    pub fn authorize_amend_history(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Student | Role::Coach => Err(AuthError::Unauthorized {
                action: String::from("amend_history"),
                required_role: String::from("Admin"),
            }),
        }
    }
}

/// Bearer-session authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Verifies credentials and opens a session.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `login` - The login, matched case-insensitively
    /// * `password` - The plaintext password
    /// * `now` - The current time
    /// * `ttl_hours` - How long the session stays valid
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `user`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong, the account is disabled,
    /// or the session cannot be stored.
    pub fn login(
        persistence: &mut Persistence,
        login: &str,
        password: &str,
        now: PrimitiveDateTime,
        ttl_hours: i64,
    ) -> Result<(String, AuthenticatedActor, PortalUserData), AuthError> {
        let user: PortalUserData = persistence
            .get_user_by_login(login)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                warn!(login, "Login for unknown account");
                Self::bad_credentials()
            })?;

        let verified: bool = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
        if !verified {
            warn!(login = %user.login, "Login with wrong password");
            return Err(Self::bad_credentials());
        }

        if user.is_disabled {
            warn!(login = %user.login, "Login for disabled account");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is disabled"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_user(&user)?;
        let session_token: String = Self::generate_session_token();
        let expires_at: PrimitiveDateTime = now + Duration::hours(ttl_hours);

        persistence
            .create_session(&session_token, user.user_id, now, expires_at)
            .map_err(Self::map_persistence_error)?;
        persistence
            .update_last_login(user.user_id, now)
            .map_err(Self::map_persistence_error)?;

        info!(login = %user.login, role = actor.role.as_str(), "Portal login");
        Ok((session_token, actor, user))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// # Returns
    ///
    /// A tuple of (`authenticated_actor`, `user`)
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the account
    /// is disabled.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
        now: PrimitiveDateTime,
    ) -> Result<(AuthenticatedActor, PortalUserData), AuthError> {
        let session: PortalSessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: PrimitiveDateTime =
            parse_datetime(&session.expires_at).map_err(Self::map_persistence_error)?;
        if now >= expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: PortalUserData = persistence
            .get_user_by_id(session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Account not found"),
            })?;

        if user.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is disabled"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_user(&user)?;

        persistence
            .touch_session(session.session_id, now)
            .map_err(Self::map_persistence_error)?;

        Ok((actor, user))
    }

    /// Ends a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be deleted.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(Self::map_persistence_error)
    }

    /// Generates a 256-bit hex session token.
    fn generate_session_token() -> String {
        (0..4)
            .map(|_| format!("{:016x}", rand::random::<u64>()))
            .collect()
    }

    fn bad_credentials() -> AuthError {
        AuthError::AuthenticationFailed {
            reason: String::from("Invalid login or password"),
        }
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}
