//! Trivsel gateway - read-only environmental data for the Kristiansand area

use anyhow::{Context, Result};
use axum::http::Method;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trivsel_server::api;
use trivsel_server::config::Config;
use trivsel_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // RUST_LOG wins over LOG_LEVEL when both are set.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid LOG_LEVEL {:?}", config.log_level))?,
    };
    let (json_layer, text_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Starting Trivsel gateway...");

    let policy = config.retry_policy();
    tracing::info!(
        timeout_ms = policy.timeout.as_millis() as u64,
        max_retries = policy.max_retries,
        worst_case_ms = policy.worst_case().as_millis() as u64,
        "Upstream retry policy"
    );
    if !config.rate_limit_enabled {
        tracing::warn!("Rate limiting disabled");
    }

    let port = config.server_port;
    let app = api::routes(&config);
    let state = Arc::new(AppState::new(config).context("failed to build upstream client")?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let app = app
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
