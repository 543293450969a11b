// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use crate::diesel_schema::config_parameters;
use crate::error::PersistenceError;

/// Sets a configuration parameter, replacing any previous value.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn set_config_value(
    conn: &mut SqliteConnection,
    key: &str,
    value: &str,
) -> Result<(), PersistenceError> {
    diesel::replace_into(config_parameters::table)
        .values((
            config_parameters::param_key.eq(key),
            config_parameters::param_value.eq(value),
        ))
        .execute(conn)?;
    info!(key, "Configuration parameter set");
    Ok(())
}

/// Sets a configuration parameter only when it has no value yet.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn seed_config_value(
    conn: &mut SqliteConnection,
    key: &str,
    value: &str,
) -> Result<bool, PersistenceError> {
    let inserted: usize = diesel::insert_or_ignore_into(config_parameters::table)
        .values((
            config_parameters::param_key.eq(key),
            config_parameters::param_value.eq(value),
        ))
        .execute(conn)?;
    Ok(inserted > 0)
}
