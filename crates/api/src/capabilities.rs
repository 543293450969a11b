// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for portal UI gating.
//!
//! Capabilities tell the portal what to offer an account. They are advisory
//! only and do not replace backend authorization checks.

use aula_domain::ProfileState;
use aula_persistence::PortalUserData;

use crate::auth::{AuthenticatedActor, Role};
use crate::request_response::{Capability, PortalCapabilities};

/// Computes portal capabilities for an account.
///
/// Capabilities depend on:
/// - Account role and disabled state
/// - Whether a forced password change is pending
/// - The linked student's profile flags
#[must_use]
pub fn compute_portal_capabilities(
    actor: &AuthenticatedActor,
    user: &PortalUserData,
    profile: Option<&ProfileState>,
) -> PortalCapabilities {
    if user.is_disabled {
        return PortalCapabilities {
            can_view_agenda: Capability::Denied,
            can_book: Capability::Denied,
            can_manage_sessions: Capability::Denied,
            can_amend_history: Capability::Denied,
            can_change_password: Capability::Denied,
        };
    }

    // Only the password change is open until it happens
    if user.must_change_password {
        return PortalCapabilities {
            can_view_agenda: Capability::Denied,
            can_book: Capability::Denied,
            can_manage_sessions: Capability::Denied,
            can_amend_history: Capability::Denied,
            can_change_password: Capability::Allowed,
        };
    }

    let has_student: bool = actor.student_id.is_some();
    PortalCapabilities {
        can_view_agenda: Capability::from_bool(
            has_student && profile.is_none_or(|p| p.can_view_agenda),
        ),
        can_book: Capability::from_bool(has_student && profile.is_none_or(|p| p.can_schedule)),
        can_manage_sessions: Capability::from_bool(matches!(actor.role, Role::Coach | Role::Admin)),
        can_amend_history: Capability::from_bool(actor.role == Role::Admin),
        can_change_password: Capability::Allowed,
    }
}
