use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let tapestry_api_key = require("TAPESTRY_API_KEY")?;
    let fairscale_api_key = require("FAIRSCALE_API_KEY")?;

    let env = parse_environment(&or_default("TAPRED_ENV", "development"));

    let bind_addr = parse_addr("TAPRED_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("TAPRED_LOG_LEVEL", "info");
    let tapestry_base_url = or_default(
        "TAPRED_TAPESTRY_BASE_URL",
        "https://api.usetapestry.dev/api/v1",
    );
    let fairscale_base_url = or_default("TAPRED_FAIRSCALE_BASE_URL", "https://api.fairscale.xyz");

    let http_timeout_secs = parse_u64("TAPRED_HTTP_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("TAPRED_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("TAPRED_RETRY_BACKOFF_BASE_MS", "500")?;
    let score_max_age_hours = parse_i64("TAPRED_SCORE_MAX_AGE_HOURS", "24")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        tapestry_api_key,
        fairscale_api_key,
        tapestry_base_url,
        fairscale_base_url,
        http_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        score_max_age_hours,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
