//! Shared helpers for RELAY API integration tests.
//!
//! Builds the full router over a manually-advanced clock so TTL scenarios
//! run without sleeping.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use relay_api::{create_api_router, mint_operator_token, ApiConfig, AppState, AuthConfig, JwtSecret};
use relay_core::{Clock, ManualClock, Timestamp};
use relay_store::{AgentRegistry, TransitionEngine};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Fixed test epoch: 2024-01-01 00:00:00 UTC.
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub auth: AuthConfig,
}

/// Build a full app with the default 30 second command TTL.
pub fn test_app() -> TestApp {
    test_app_with_ttl(30)
}

/// Build a full app with the given command TTL.
pub fn test_app_with_ttl(ttl_secs: i64) -> TestApp {
    let clock = ManualClock::new(t0());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());

    let mut auth = AuthConfig::default();
    auth.jwt_secret = JwtSecret::new("relay-integration-test-secret-0123456789".to_string());
    auth.clock = shared.clone();

    let config = ApiConfig {
        command_ttl_secs: ttl_secs,
        ..ApiConfig::default()
    };

    let engine = TransitionEngine::new(shared.clone(), ttl_secs);
    let registry = AgentRegistry::new(shared);
    let state = AppState::new(engine, registry, auth.clone());

    TestApp {
        router: create_api_router(state, &config),
        clock,
        auth,
    }
}

impl TestApp {
    /// Mint a fresh operator session token.
    pub fn operator_token(&self) -> String {
        mint_operator_token(&self.auth, "ops@relay.sh".to_string()).expect("mint token")
    }

    /// Drive one request through the router and decode the JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, body)
    }

    /// Register an agent over HTTP; returns `(agent_id, api_key)`.
    pub async fn register_agent(&self, name: &str) -> (String, String) {
        let token = self.operator_token();
        let (status, body) = self
            .send(operator_post(
                "/api/v1/agents",
                &token,
                serde_json::json!({"name": name, "agent_kind": "px4"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        (
            body["agent"]["id"].as_str().expect("agent id").to_string(),
            body["api_key"].as_str().expect("api key").to_string(),
        )
    }

    /// Enqueue a command for an agent; returns its id.
    pub async fn enqueue(&self, agent_id: &str, command_type: &str, payload: Value) -> String {
        let token = self.operator_token();
        let (status, body) = self
            .send(operator_post(
                &format!("/api/v1/agents/{agent_id}/commands"),
                &token,
                serde_json::json!({"type": command_type, "payload": payload}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "enqueue failed: {body}");
        body["id"].as_str().expect("command id").to_string()
    }
}

/// Operator GET request with a Bearer token.
pub fn operator_get(path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

/// Operator POST request with a Bearer token and JSON body.
pub fn operator_post(path: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Agent GET request with an API key.
pub fn agent_get(path: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-api-key", api_key)
        .body(Body::empty())
        .expect("request")
}

/// Agent POST request with an API key and JSON body.
pub fn agent_post(path: &str, api_key: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("x-api-key", api_key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Unauthenticated GET request.
pub fn anonymous_get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}
