use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use metadata_fetcher::config::Config;
use metadata_fetcher::rate_limit;
use metadata_fetcher::routes::create_app;
use metadata_fetcher::state::AppState;

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // JSON logs in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("metadata_fetcher=info,tower_http=info"));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Metadata Fetcher starting...");

    let config = Config::from_env().expect("Failed to load configuration");
    info!(
        max_requests = config.rate_limit.max_requests,
        window_ms = config.rate_limit.window.as_millis() as u64,
        fetch_timeout = ?config.fetch_timeout,
        "Configuration loaded"
    );

    // The form is served from a different origin, so dev needs permissive CORS.
    let cors = if config.is_dev {
        info!("CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        tracing::warn!("CORS: restrictive (production mode), cross-origin requests will be denied");
        CorsLayer::new()
    };

    let app_state = AppState::from_config(&config).expect("Failed to build HTTP client");
    rate_limit::spawn_pruning(app_state.limiter.clone(), LIMITER_PRUNE_INTERVAL);

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = create_app(app_state)
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.server_addr();
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Peer addresses feed the rate limiter's client identity.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server failed to start");
}
