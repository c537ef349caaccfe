use super::*;
use std::collections::HashMap;

fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let env: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    Config::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn empty_environment_uses_defaults() {
    let config = config_from(&[]).expect("defaults");
    assert_eq!(config, Config::default());
    assert_eq!(config.port, 3000);
    assert!(config.database_url.is_none());
    assert!(config.chat_history_limit.is_none());
}

#[test]
fn reads_every_variable() {
    let config = config_from(&[
        ("PORT", "8080"),
        ("DATABASE_URL", "postgres://localhost/sv"),
        ("DB_MAX_CONNECTIONS", "12"),
        ("OUTBOX_EVENT_CAPACITY", "4"),
        ("CHAT_HISTORY_LIMIT", "200"),
        ("COOKIE_SECURE", "yes"),
        ("USER_COOKIE_DAYS", "7"),
    ])
    .expect("valid");

    assert_eq!(config.port, 8080);
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/sv"));
    assert_eq!(config.db_max_connections, 12);
    assert_eq!(config.outbox_event_capacity, 4);
    assert_eq!(config.chat_history_limit, Some(200));
    assert!(config.cookie_secure);
    assert_eq!(config.user_cookie_days, 7);
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let config = config_from(&[("PORT", "  "), ("DATABASE_URL", "")]).expect("valid");
    assert_eq!(config.port, DEFAULT_PORT);
    assert!(config.database_url.is_none());
}

#[test]
fn zero_chat_limit_means_unbounded() {
    let config = config_from(&[("CHAT_HISTORY_LIMIT", "0")]).expect("valid");
    assert!(config.chat_history_limit.is_none());
}

#[test]
fn invalid_number_names_the_key() {
    let err = config_from(&[("PORT", "eighty")]).expect_err("invalid port");
    assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    assert_eq!(err.error_code(), "E_CONFIG_INVALID");
}

#[test]
fn zero_outbox_capacity_is_rejected() {
    let err = config_from(&[("OUTBOX_EVENT_CAPACITY", "0")]).expect_err("zero capacity");
    assert!(matches!(err, ConfigError::Zero { key: "OUTBOX_EVENT_CAPACITY" }));
}

#[test]
fn non_positive_cookie_lifetime_is_rejected() {
    for raw in ["0", "-3"] {
        let err = config_from(&[("USER_COOKIE_DAYS", raw)]).expect_err("non-positive cookie days");
        assert!(matches!(err, ConfigError::Zero { key: "USER_COOKIE_DAYS" }), "USER_COOKIE_DAYS={raw}");
    }
}

#[test]
fn invalid_bool_is_rejected() {
    let err = config_from(&[("COOKIE_SECURE", "maybe")]).expect_err("bad bool");
    assert!(matches!(err, ConfigError::Invalid { key: "COOKIE_SECURE", .. }));
}

#[test]
fn parse_bool_accepts_common_spellings() {
    for raw in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(raw), Some(true), "{raw}");
    }
    for raw in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(raw), Some(false), "{raw}");
    }
    assert_eq!(parse_bool("2"), None);
}
