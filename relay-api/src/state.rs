//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use relay_store::{AgentRegistry, TransitionEngine};

use crate::auth::AuthConfig;

/// Application-wide state shared across all routes.
///
/// The engine and registry clone cheaply (shared maps); cloning the state
/// never forks the underlying data.
#[derive(Clone)]
pub struct AppState {
    /// State transition engine over the command store.
    pub engine: TransitionEngine,
    /// Agent registry: credentials, heartbeat, revocation.
    pub registry: AgentRegistry,
    /// Authentication configuration.
    pub auth: Arc<AuthConfig>,
    /// Server start instant, reported by the health endpoint.
    pub start_time: Instant,
}

impl AppState {
    /// Assemble application state.
    pub fn new(engine: TransitionEngine, registry: AgentRegistry, auth: AuthConfig) -> Self {
        Self {
            engine,
            registry,
            auth: Arc::new(auth),
            start_time: Instant::now(),
        }
    }
}
