use lms_gateway::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    upstream::{HttpUpstream, UpstreamState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, upstream client, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lms_gateway=debug,tower_http=info".into());

    // 3. Pretty logs locally, JSON in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);

    if config.verify_signature {
        tracing::info!("Session token signatures are verified before routing");
    } else {
        tracing::warn!(
            "Session token signatures are NOT verified; role claims only drive redirects"
        );
    }

    // 4. Upstream Initialization
    let upstream = HttpUpstream::new(&config.upstream_url)
        .expect("FATAL: Failed to build the upstream HTTP client.");
    tracing::info!("Forwarding allowed requests to {}", upstream.base_url());
    let upstream = Arc::new(upstream) as UpstreamState;

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, upstream));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
