//! Process settings from the environment (after `.env` is loaded by the binary).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/chatterie.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from any variable source; unset or blank variables take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: parse_var("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), Some(5))?,
            busy_timeout: Duration::from_secs(parse_var(
                "DB_BUSY_TIMEOUT_SECS",
                get("DB_BUSY_TIMEOUT_SECS"),
                Some(5),
            )?),
            body_limit_bytes: parse_var("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), Some(2 * 1024 * 1024))?,
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
        None => default.ok_or(ConfigError::Invalid {
            var,
            value: String::new(),
        }),
    }
}
