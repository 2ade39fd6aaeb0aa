// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Html,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use metadata_fetcher::{
    config::RateLimitConfig,
    rate_limit::{FixedWindowRateLimiter, RateLimiter},
    routes::create_app,
    state::AppState,
};

pub const FULL_PAGE: &str = r#"<html><head><title>Hi</title><meta name="description" content="D"><meta property="og:image" content="I.png"></head></html>"#;
pub const BARE_PAGE: &str = "<html><head></head><body>nothing to see</body></html>";
pub const SLOW_PAGE: &str = "<html><head><title>Slow</title></head></html>";
pub const SLOW_DELAY: Duration = Duration::from_millis(300);

// ── Limiters ─────────────────────────────────────────────────────────────────

pub struct AllowAll;

impl RateLimiter for AllowAll {
    fn allow(&self, _client: IpAddr) -> bool {
        true
    }
}

/// Rejects everything and counts how often it was asked.
#[derive(Default)]
pub struct DenyAll {
    pub calls: AtomicUsize,
}

impl RateLimiter for DenyAll {
    fn allow(&self, _client: IpAddr) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }
}

// ── App construction ─────────────────────────────────────────────────────────

/// Client that ignores proxy environment variables so fixture requests stay
/// on loopback.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build test HTTP client")
}

pub fn app_with_limiter(limiter: Arc<dyn RateLimiter>) -> Router {
    create_app(AppState {
        http_client: test_client(),
        limiter,
    })
}

/// App with no effective rate limit.
pub fn create_test_app() -> Router {
    app_with_limiter(Arc::new(AllowAll))
}

/// App guarded by the production limiter with the given limits.
pub fn create_limited_app(max_requests: u32, window: Duration) -> Router {
    app_with_limiter(Arc::new(FixedWindowRateLimiter::new(RateLimitConfig {
        max_requests,
        window,
    })))
}

// ── Fixture pages ────────────────────────────────────────────────────────────

/// Serve a handful of fixture pages on an ephemeral loopback port and return
/// the base URL, e.g. `http://127.0.0.1:41234`.
pub async fn spawn_fixture_server() -> String {
    let pages = Router::new()
        .route("/full", get(|| async { Html(FULL_PAGE) }))
        .route("/bare", get(|| async { Html(BARE_PAGE) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(SLOW_DELAY).await;
                Html(SLOW_PAGE)
            }),
        )
        .route(
            "/gone",
            get(|| async { (StatusCode::NOT_FOUND, Html(FULL_PAGE)) }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fixture server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, pages).await.unwrap();
    });
    format!("http://{addr}")
}

/// A loopback URL on a port nothing is listening on.
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, text) = post_raw(app, uri, body.to_string(), None).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

/// POST a raw body, optionally as a given client address.
pub async fn post_raw(
    app: Router,
    uri: &str,
    body: impl Into<Body>,
    client: Option<&str>,
) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(ip) = client {
        builder = builder.header("x-forwarded-for", ip);
    }
    send(app, builder.body(body.into()).unwrap()).await
}

pub async fn get_no_auth(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, text) = send(app, req).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
