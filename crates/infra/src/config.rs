//! Process configuration loaded from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use stockledger_observability::LogFormat;

use crate::movement::DEFAULT_MAX_RETRIES;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was not set and the dev default is in use.
    pub jwt_secret_is_default: bool,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub max_db_connections: u32,
    pub movement_max_retries: u32,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET");

        Ok(Self {
            bind_addr: parse_or(&get, "STOCKLEDGER_BIND_ADDR", || {
                SocketAddr::from(([0, 0, 0, 0], 8080))
            })?,
            jwt_secret_is_default: jwt_secret.is_none(),
            jwt_secret: jwt_secret.unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            database_url: get("DATABASE_URL"),
            max_db_connections: parse_or(&get, "STOCKLEDGER_MAX_DB_CONNECTIONS", || {
                DEFAULT_MAX_DB_CONNECTIONS
            })?,
            movement_max_retries: parse_or(&get, "STOCKLEDGER_MOVEMENT_RETRIES", || {
                DEFAULT_MAX_RETRIES
            })?,
            log_format: parse_or(&get, "STOCKLEDGER_LOG_FORMAT", LogFormat::default)?,
        })
    }
}

fn parse_or<T, G, D>(get: &G, var: &'static str, default: D) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
    G: Fn(&str) -> Option<String>,
    D: FnOnce() -> T,
{
    match get(var) {
        None => Ok(default()),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.jwt_secret_is_default);
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.max_db_connections, DEFAULT_MAX_DB_CONNECTIONS);
        assert_eq!(cfg.movement_max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            ("STOCKLEDGER_BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/stock"),
            ("STOCKLEDGER_MAX_DB_CONNECTIONS", "12"),
            ("STOCKLEDGER_MOVEMENT_RETRIES", "0"),
            ("STOCKLEDGER_LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert!(!cfg.jwt_secret_is_default);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/stock"));
        assert_eq!(cfg.max_db_connections, 12);
        assert_eq!(cfg.movement_max_retries, 0);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("DATABASE_URL", "  "), ("JWT_SECRET", "")]).unwrap();
        assert_eq!(cfg.database_url, None);
        assert!(cfg.jwt_secret_is_default);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config(&[("STOCKLEDGER_MOVEMENT_RETRIES", "three")]).unwrap_err();
        let ConfigError::Invalid { var, value, .. } = err;
        assert_eq!(var, "STOCKLEDGER_MOVEMENT_RETRIES");
        assert_eq!(value, "three");

        assert!(config(&[("STOCKLEDGER_LOG_FORMAT", "xml")]).is_err());
        assert!(config(&[("STOCKLEDGER_BIND_ADDR", "nowhere")]).is_err());
    }
}
