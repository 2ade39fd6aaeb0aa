//! Per-client admission control for the metadata endpoint.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tower_governor::key_extractor::{KeyExtractor, SmartIpKeyExtractor};

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Bucket shared by every request whose client address cannot be determined.
pub const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Decides whether a client may make one more request right now.
pub trait RateLimiter: Send + Sync + 'static {
    fn allow(&self, client: IpAddr) -> bool;

    /// Drops state for clients whose window has expired and returns how many
    /// clients are still tracked. No-op by default.
    fn prune(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by client IP: at most `max_requests` per client
/// from the first request of a window until `window` has elapsed.
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<IpAddr, Window>,
}

impl FixedWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        FixedWindowRateLimiter {
            max_requests: config.max_requests,
            window: config.window,
            windows: DashMap::new(),
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn allow(&self, client: IpAddr) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count < self.max_requests {
            entry.count += 1;
            true
        } else {
            false
        }
    }

    fn prune(&self) -> usize {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
        self.windows.shrink_to_fit();
        self.tracked_clients()
    }
}

/// Resolves the client identity from forwarding headers, falling back to the
/// peer address recorded by `ConnectInfo`.
pub fn client_ip(request: &Request) -> IpAddr {
    SmartIpKeyExtractor.extract(request).unwrap_or_else(|e| {
        tracing::debug!(error = ?e, "Could not determine client address");
        UNKNOWN_CLIENT
    })
}

/// Route middleware: rejects with 429 before the handler runs when the
/// client is over its quota.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_ip(&request);
    if !state.limiter.allow(client) {
        tracing::info!(%client, "Rate limit exceeded");
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}

/// Periodically prunes idle limiter state until the runtime shuts down.
pub fn spawn_pruning(limiter: Arc<dyn RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let tracked = limiter.prune();
            tracing::debug!(tracked, "Pruned expired rate limit windows");
        }
    });
}
