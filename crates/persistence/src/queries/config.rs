// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::BTreeMap;

use diesel::SqliteConnection;
use diesel::prelude::*;

use crate::diesel_schema::config_parameters;
use crate::error::PersistenceError;

/// Reads one configuration parameter.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_config_value(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<String>, PersistenceError> {
    Ok(config_parameters::table
        .filter(config_parameters::param_key.eq(key))
        .select(config_parameters::param_value)
        .first::<String>(conn)
        .optional()?)
}

/// Reads every configuration parameter.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_config(
    conn: &mut SqliteConnection,
) -> Result<BTreeMap<String, String>, PersistenceError> {
    let rows: Vec<(String, String)> = config_parameters::table
        .select((config_parameters::param_key, config_parameters::param_value))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}
