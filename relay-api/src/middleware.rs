//! Axum middleware and extractors for authentication.
//!
//! The middleware resolves the request's credentials to a [`Principal`]
//! exactly once and injects it into request extensions. Route handlers
//! then declare which principal kind they accept by taking
//! [`OperatorPrincipal`] or [`AgentPrincipal`] as an argument; a valid
//! credential from the wrong domain fails with 401 just like a missing
//! one.

use crate::auth::{authenticate, Principal};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use relay_core::AgentId;

/// Axum middleware for authentication.
///
/// Extracts `X-API-Key` / `Authorization: Bearer` headers, resolves them
/// against the agent registry or the token config, and injects the
/// resulting [`Principal`] into request extensions. Unauthenticated
/// requests are rejected with 401 before any handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let principal = authenticate(&state.auth, &state.registry, api_key_header, auth_header)?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// Extractor accepting only operator principals.
///
/// Holds the operator's subject identifier.
#[derive(Debug, Clone)]
pub struct OperatorPrincipal(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OperatorPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Operator { subject }) => Ok(OperatorPrincipal(subject.clone())),
            Some(Principal::Agent { .. }) => Err(ApiError::unauthorized(
                "This operation requires an operator session token",
            )),
            None => Err(ApiError::internal_error(
                "Principal not found in request extensions. \
                 Ensure auth_middleware is applied to this route.",
            )),
        }
    }
}

/// Extractor accepting only agent principals.
///
/// Holds the authenticated agent's id; handlers use it as the ownership
/// check input for poll, output, and ack.
#[derive(Debug, Clone, Copy)]
pub struct AgentPrincipal(pub AgentId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AgentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Agent { agent_id }) => Ok(AgentPrincipal(*agent_id)),
            Some(Principal::Operator { .. }) => Err(ApiError::unauthorized(
                "This operation requires an agent API key",
            )),
            None => Err(ApiError::internal_error(
                "Principal not found in request extensions. \
                 Ensure auth_middleware is applied to this route.",
            )),
        }
    }
}
