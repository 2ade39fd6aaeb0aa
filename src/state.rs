use std::sync::Arc;

use reqwest::Client as ReqwestClient;

use crate::config::Config;
use crate::rate_limit::{FixedWindowRateLimiter, RateLimiter};

/// Shared application state passed to all handlers and middleware.
/// The HTTP client is built once so fetches share its connection pool.
#[derive(Clone)]
pub struct AppState {
    pub http_client: ReqwestClient,
    pub limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Builds the production state: a fixed-window limiter and an HTTP
    /// client with the configured fetch timeout, if any.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.fetch_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(AppState {
            http_client: builder.build()?,
            limiter: Arc::new(FixedWindowRateLimiter::new(config.rate_limit)),
        })
    }
}
