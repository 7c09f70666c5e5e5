//! RELAY API Server Entry Point
//!
//! Bootstraps configuration, assembles the in-memory engine and registry,
//! and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig};
use relay_core::SystemClock;
use relay_store::{AgentRegistry, TransitionEngine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production()?;

    let clock = Arc::new(SystemClock);
    let engine = TransitionEngine::new(clock.clone(), api_config.command_ttl_secs);
    let registry = AgentRegistry::new(clock);

    let state = AppState::new(engine, registry, auth_config);
    let app = create_api_router(state, &api_config);

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, ttl_secs = api_config.command_ttl_secs, "Starting RELAY API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", config.bind_host, config.port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
