//! Route modules and router assembly.

pub mod agent;
pub mod command;
pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Assemble the full API router.
///
/// Everything under `/api/v1` sits behind the auth middleware; `/health`
/// does not.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let operator_routes = Router::new()
        .route(
            "/agents",
            post(agent::register_agent).get(agent::list_agents),
        )
        .route("/agents/:id", get(agent::get_agent))
        .route("/agents/:id/revoke", post(agent::revoke_agent_key))
        .route(
            "/agents/:id/commands",
            post(command::enqueue_command).get(command::list_commands),
        )
        .route("/commands/:id", get(command::get_command));

    let agent_routes = Router::new()
        .route("/agent/commands", get(agent::poll_commands))
        .route("/agent/commands/:id/output", post(agent::append_output))
        .route("/agent/commands/:id/ack", post(agent::ack_command))
        .route("/agent/heartbeat", post(agent::heartbeat))
        .route("/agent/logout", post(agent::logout));

    let api = operator_routes
        .merge(agent_routes)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let router = Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api);

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        // Dev mode: allow all
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}
