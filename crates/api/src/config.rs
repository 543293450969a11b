// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Runtime policy loaded from the `config_parameters` table.
//!
//! Every request reads a fresh [`PolicyBundle`], so parameter changes take
//! effect without a restart. Malformed values fall back to their defaults
//! and are logged.

use std::collections::BTreeMap;

use aula::BookingPolicy;
use aula_persistence::Persistence;
use num_traits::ToPrimitive;
use tracing::warn;

use crate::error::{ApiError, translate_persistence_error};
use crate::password_policy::PasswordPolicy;

pub const KEY_MIN_ADVANCE_CANCEL: &str = "booking.min_advance_minutes_cancel";
pub const KEY_DEFAULT_POLICY: &str = "booking.default_policy";
pub const KEY_FINALIZE_GRACE: &str = "booking.finalize_grace_minutes";
pub const KEY_API_KEY: &str = "api.key";
pub const KEY_ALLOW_NO_KEY: &str = "api.allow_no_key";
pub const KEY_TRASH_RETENTION_DAYS: &str = "trash_retention_days";
pub const KEY_SESSION_TTL_HOURS: &str = "portal.session_ttl_hours";
pub const KEY_PASSWORD_MIN_LENGTH: &str = "password.min_length";
pub const KEY_PASSWORD_REQUIRE_UPPER: &str = "password.require_upper";
pub const KEY_PASSWORD_REQUIRE_NUMBER: &str = "password.require_number";
pub const KEY_PASSWORD_REQUIRE_SPECIAL: &str = "password.require_special";
pub const KEY_PASSWORD_DISALLOW_REUSE: &str = "password.disallow_reuse";

const DEFAULT_TRASH_RETENTION_DAYS: i64 = 8;
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// The policy in force for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyBundle {
    pub booking: BookingPolicy,
    pub trash_retention_days: i64,
    pub session_ttl_hours: i64,
    /// The sync API key; `None` when unset or blank.
    pub api_key: Option<String>,
    /// Serve the sync endpoint without a key when none is configured.
    pub allow_no_key: bool,
    pub password: PasswordPolicy,
}

impl Default for PolicyBundle {
    fn default() -> Self {
        Self {
            booking: BookingPolicy::default(),
            trash_retention_days: DEFAULT_TRASH_RETENTION_DAYS,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            api_key: None,
            allow_no_key: false,
            password: PasswordPolicy::default(),
        }
    }
}

impl PolicyBundle {
    /// Builds a bundle from raw parameters, falling back to defaults.
    #[must_use]
    pub fn from_parameters(params: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let booking = BookingPolicy {
            policy_id: params
                .get(KEY_DEFAULT_POLICY)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map_or(defaults.booking.policy_id, String::from),
            min_advance_minutes_cancel: read_non_negative(
                params,
                KEY_MIN_ADVANCE_CANCEL,
                defaults.booking.min_advance_minutes_cancel,
            ),
            finalize_grace_minutes: read_non_negative(
                params,
                KEY_FINALIZE_GRACE,
                defaults.booking.finalize_grace_minutes,
            ),
        };

        let password = PasswordPolicy {
            min_length: read_count(params, KEY_PASSWORD_MIN_LENGTH, defaults.password.min_length),
            require_upper: read_flag(
                params,
                KEY_PASSWORD_REQUIRE_UPPER,
                defaults.password.require_upper,
            ),
            require_number: read_flag(
                params,
                KEY_PASSWORD_REQUIRE_NUMBER,
                defaults.password.require_number,
            ),
            require_special: read_flag(
                params,
                KEY_PASSWORD_REQUIRE_SPECIAL,
                defaults.password.require_special,
            ),
            disallow_reuse: read_count(
                params,
                KEY_PASSWORD_DISALLOW_REUSE,
                defaults.password.disallow_reuse,
            ),
        };

        Self {
            booking,
            trash_retention_days: read_non_negative(
                params,
                KEY_TRASH_RETENTION_DAYS,
                defaults.trash_retention_days,
            ),
            session_ttl_hours: read_positive(
                params,
                KEY_SESSION_TTL_HOURS,
                defaults.session_ttl_hours,
            ),
            api_key: params
                .get(KEY_API_KEY)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from),
            allow_no_key: read_flag(params, KEY_ALLOW_NO_KEY, defaults.allow_no_key),
            password,
        }
    }

    /// Loads the bundle from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be read.
    pub fn load(persistence: &mut Persistence) -> Result<Self, ApiError> {
        let params = persistence
            .list_config()
            .map_err(translate_persistence_error)?;
        Ok(Self::from_parameters(&params))
    }
}

fn read_integer(params: &BTreeMap<String, String>, key: &str) -> Option<i64> {
    let raw = params.get(key)?;
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring malformed integer parameter");
            None
        }
    }
}

fn read_non_negative(params: &BTreeMap<String, String>, key: &str, default: i64) -> i64 {
    match read_integer(params, key) {
        Some(value) if value < 0 => {
            warn!(key, value, "Negative parameter, using default");
            default
        }
        Some(value) => value,
        None => default,
    }
}

fn read_positive(params: &BTreeMap<String, String>, key: &str, default: i64) -> i64 {
    match read_integer(params, key) {
        Some(value) if value <= 0 => {
            warn!(key, value, "Non-positive parameter, using default");
            default
        }
        Some(value) => value,
        None => default,
    }
}

fn read_count(params: &BTreeMap<String, String>, key: &str, default: usize) -> usize {
    read_integer(params, key).map_or(default, |value| {
        value.to_usize().unwrap_or_else(|| {
            warn!(key, value, "Parameter out of range, using default");
            default
        })
    })
}

fn read_flag(params: &BTreeMap<String, String>, key: &str, default: bool) -> bool {
    let Some(raw) = params.get(key) else {
        return default;
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(key, value = %raw, "Ignoring malformed boolean parameter");
            default
        }
    }
}
