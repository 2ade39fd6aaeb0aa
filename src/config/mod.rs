use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
    pub rate_limit: RateLimitConfig,
    /// `None` leaves the HTTP client's own default in place.
    pub fetch_timeout: Option<Duration>,
}

/// Admission limits for `/fetch-metadata`: at most `max_requests` per client
/// in any `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_requests: 5,
            window: Duration::from_millis(1000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = RateLimitConfig::default();

        let max_requests = parse_var("RATE_LIMIT_MAX_REQUESTS")?.unwrap_or(defaults.max_requests);
        if max_requests == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_MAX_REQUESTS"));
        }

        let window_ms: u64 = parse_var("RATE_LIMIT_WINDOW_MS")?
            .unwrap_or(defaults.window.as_millis() as u64);
        if window_ms == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_WINDOW_MS"));
        }

        let fetch_timeout = match parse_var::<u64>("FETCH_TIMEOUT_SECS")? {
            Some(0) => return Err(ConfigError::Zero("FETCH_TIMEOUT_SECS")),
            other => other.map(Duration::from_secs),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_var("SERVER_PORT")?.unwrap_or(3000),
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
            rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_millis(window_ms),
            },
            fetch_timeout,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Reads an optional numeric variable. Unset or blank is `None`; anything
/// else must parse.
fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { name, value }),
        _ => Ok(None),
    }
}
