// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::Persistence;

#[test]
fn test_in_memory_database_enforces_foreign_keys() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_migrations_seed_config_defaults() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    let config = persistence.list_config().unwrap();
    assert_eq!(
        config.get("booking.min_advance_minutes_cancel").map(String::as_str),
        Some("0")
    );
    assert_eq!(
        config.get("booking.finalize_grace_minutes").map(String::as_str),
        Some("30")
    );
    assert_eq!(config.get("api.allow_no_key").map(String::as_str), Some("false"));
    assert_eq!(config.get("trash_retention_days").map(String::as_str), Some("8"));
    assert!(!config.contains_key("api.key"));
}

#[test]
fn test_seed_config_value_keeps_existing_value() {
    let mut persistence = Persistence::new_in_memory().unwrap();

    persistence
        .set_config_value("booking.min_advance_minutes_cancel", "120")
        .unwrap();
    let inserted = persistence
        .seed_config_value("booking.min_advance_minutes_cancel", "0")
        .unwrap();
    assert!(!inserted);
    assert_eq!(
        persistence
            .get_config_value("booking.min_advance_minutes_cancel")
            .unwrap()
            .as_deref(),
        Some("120")
    );

    assert!(persistence.seed_config_value("api.key", "secret").unwrap());
    assert_eq!(
        persistence.get_config_value("api.key").unwrap().as_deref(),
        Some("secret")
    );
}

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first = Persistence::new_in_memory().unwrap();
    let mut second = Persistence::new_in_memory().unwrap();

    first.set_config_value("api.key", "one").unwrap();
    assert_eq!(second.get_config_value("api.key").unwrap(), None);
}
