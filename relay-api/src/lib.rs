//! RELAY API - REST layer for the command dispatch service
//!
//! Exposes the operator surface (agent registration, command enqueue, get,
//! list, key revocation) and the agent surface (poll, output, ack,
//! heartbeat, logout) over Axum, on top of the in-memory transition engine
//! and agent registry from `relay-store`.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use auth::{
    authenticate, mint_operator_token, validate_operator_token, AuthConfig, Claims, JwtSecret,
    Principal,
};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AgentPrincipal, OperatorPrincipal};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
