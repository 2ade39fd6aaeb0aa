use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::rate_limit;
use crate::state::AppState;

/// Application routes. Only `/fetch-metadata` sits behind the rate limiter.
/// Process-wide layers (metrics, CORS, tracing) are added by the binary.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/fetch-metadata",
            post(handlers::metadata::fetch_metadata).layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit::enforce,
            )),
        )
        .with_state(state)
}
