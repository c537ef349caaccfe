//! Process configuration read from the environment.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` (if present) and builds a `Config` once at startup.
//! Everything else receives the parsed values through `AppState`; no other
//! module reads the environment.
//!
//! Variables:
//! - `PORT` (default 3000)
//! - `DATABASE_URL` (optional; users are kept in memory when absent)
//! - `DB_MAX_CONNECTIONS` (default 5)
//! - `OUTBOX_EVENT_CAPACITY` (default 32, must be non-zero)
//! - `CHAT_HISTORY_LIMIT` (default 0 = unbounded)
//! - `COOKIE_SECURE` (default false)
//! - `USER_COOKIE_DAYS` (default 30)

use std::str::FromStr;

use crate::frame::ErrorCode;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_OUTBOX_EVENT_CAPACITY: usize = 32;
pub const DEFAULT_USER_COOKIE_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Per-connection queue depth for `seeked` events.
    pub outbox_event_capacity: usize,
    /// `None` keeps every chat message for the life of the room.
    pub chat_history_limit: Option<usize>,
    pub cookie_secure: bool,
    pub user_cookie_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            outbox_event_capacity: DEFAULT_OUTBOX_EVENT_CAPACITY,
            chat_history_limit: None,
            cookie_secure: false,
            user_cookie_days: DEFAULT_USER_COOKIE_DAYS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "E_CONFIG_INVALID",
            Self::Zero { .. } => "E_CONFIG_ZERO",
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unset and blank values fall
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is set but does not parse, or if a
    /// count or lifetime that must be positive is not.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let outbox_event_capacity = parse(&get, "OUTBOX_EVENT_CAPACITY", DEFAULT_OUTBOX_EVENT_CAPACITY)?;
        if outbox_event_capacity == 0 {
            return Err(ConfigError::Zero { key: "OUTBOX_EVENT_CAPACITY" });
        }
        let db_max_connections = parse(&get, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Zero { key: "DB_MAX_CONNECTIONS" });
        }
        let user_cookie_days = parse(&get, "USER_COOKIE_DAYS", DEFAULT_USER_COOKIE_DAYS)?;
        if user_cookie_days <= 0 {
            return Err(ConfigError::Zero { key: "USER_COOKIE_DAYS" });
        }

        let chat_history_limit = match parse::<usize>(&get, "CHAT_HISTORY_LIMIT", 0)? {
            0 => None,
            n => Some(n),
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
        };

        Ok(Self {
            port: parse(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL"),
            db_max_connections,
            outbox_event_capacity,
            chat_history_limit,
            cookie_secure,
            user_cookie_days,
        })
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
