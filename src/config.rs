//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET` - Token signing secret (min 16 chars)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `TOKEN_TTL_HOURS` - Token lifetime in hours (default: 24)
//! - `NATS_URL` - NATS server for domain events; publishing is off when unset

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub database_max_connections: u32,
    pub token_ttl_hours: i64,
    pub nats_url: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_max_connections", &self.database_max_connections)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("nats_url", &self.nats_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_SECRET".to_string(),
                format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
            ));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret,
            host: parse_or(get("HOST"), "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(get("PORT"), "PORT", 3000)?,
            database_max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
            token_ttl_hours: parse_or(get("TOKEN_TTL_HOURS"), "TOKEN_TTL_HOURS", 24)?,
            nats_url: get("NATS_URL"),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
