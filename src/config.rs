// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use dotenvy::dotenv;
use thiserror::Error;

/// Seven days, the lifetime of a session cookie.
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SESSION_SECRET must be set to at least one non-empty secret")]
    MissingSessionSecret,

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Signing secrets, newest first. Only the first one signs new sessions.
    pub session_secrets: Vec<String>,
    pub session_cookie_secure: bool,
    pub bind_addr: SocketAddr,
    /// Zero disables the roadmap cache.
    pub roadmap_cache_ttl: Duration,
    pub cors_origins: Vec<String>,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 iteration count.
    pub hash_iterations: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://pheedback.db?mode=rwc".to_string());

        let session_secrets = split_list(&env::var("SESSION_SECRET").unwrap_or_default());
        if session_secrets.is_empty() {
            return Err(ConfigError::MissingSessionSecret);
        }

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let cors_origins = parse_cors_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        )?;

        Ok(Self {
            database_url,
            session_secrets,
            session_cookie_secure: parse_var("SESSION_COOKIE_SECURE", true)?,
            bind_addr: parse_var("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            roadmap_cache_ttl: Duration::from_secs(parse_var("ROADMAP_CACHE_TTL_SECS", 30)?),
            cors_origins,
            hash_memory_kib: parse_var("PASSWORD_HASH_MEMORY_KIB", argon2::Params::DEFAULT_M_COST)?,
            hash_iterations: parse_var("PASSWORD_HASH_ITERATIONS", argon2::Params::DEFAULT_T_COST)?,
            rust_log,
        })
    }
}

/// Reads `var` and parses it, falling back to `default` when unset.
fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

/// Credentialed CORS needs explicit origins; a wildcard is refused at startup.
fn parse_cors_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins = split_list(raw);
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::Invalid {
            var: "CORS_ORIGINS",
            reason: "wildcard origin cannot be combined with session cookies".to_string(),
        });
    }
    Ok(origins)
}

/// Splits a comma-separated list, dropping blank entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
