use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use fleet_dispatch::api;
use fleet_dispatch::config::Config;
use fleet_dispatch::error::AppError;
use fleet_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let http_port = config.http_port;
    let routing_enabled = config.routing.enabled;
    let toll_rule = config.rules.toll_rule;

    let shared_state = Arc::new(AppState::new(config)?);
    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port, routing_enabled, %toll_rule, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
