use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables, reading a
/// `.env` file first when one is present.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the variables already present in the
/// process environment. No `.env` file is read.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parse configuration through an arbitrary lookup so tests can feed a map
/// instead of mutating the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("XTRACK_ENV", "development"));
    let bind_addr = parse_var(&or_default, "XTRACK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("XTRACK_LOG_LEVEL", "info");

    let twitterapi_key = lookup("TWITTERAPI_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let search_base_url = or_default("XTRACK_SEARCH_BASE_URL", "https://api.twitterapi.io");

    let db_max_connections = parse_var(&or_default, "XTRACK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&or_default, "XTRACK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&or_default, "XTRACK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let search_request_timeout_secs =
        parse_var(&or_default, "XTRACK_SEARCH_REQUEST_TIMEOUT_SECS", "30")?;
    let search_user_agent = or_default("XTRACK_SEARCH_USER_AGENT", "xtrack/0.1 (campaign-tracker)");
    let search_inter_request_delay_ms =
        parse_var(&or_default, "XTRACK_SEARCH_INTER_REQUEST_DELAY_MS", "250")?;
    let search_max_retries = parse_var(&or_default, "XTRACK_SEARCH_MAX_RETRIES", "3")?;
    let search_retry_backoff_base_ms =
        parse_var(&or_default, "XTRACK_SEARCH_RETRY_BACKOFF_BASE_MS", "1000")?;

    let scrape_max_items: usize = parse_var(&or_default, "XTRACK_SCRAPE_MAX_ITEMS", "500")?;
    if scrape_max_items == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "XTRACK_SCRAPE_MAX_ITEMS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        twitterapi_key,
        search_base_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        search_request_timeout_secs,
        search_user_agent,
        search_inter_request_delay_ms,
        search_max_retries,
        search_retry_backoff_base_ms,
        scrape_max_items,
    })
}

fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    or_default(var, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Unrecognized values fall back to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
