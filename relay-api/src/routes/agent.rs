//! Agent lifecycle and agent-facing dispatch routes.
//!
//! Operator side: registration (which issues the API key), listing,
//! inspection, and key revocation. Agent side: the poll/output/ack cycle,
//! heartbeat, and self-revocation (the tail of the `Logout` command
//! choreography: the handler acks first, then calls logout).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use relay_core::{AgentId, CommandId};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AgentPrincipal, OperatorPrincipal},
    state::AppState,
    types::{
        AckRequest, AgentEnvelope, CommandEnvelope, HeartbeatRequest, HeartbeatResponse,
        OutputRequest, PollCommand, RegisterAgentRequest, RegisterAgentResponse,
        RevokeKeyResponse,
    },
};

// ============================================================================
// OPERATOR-FACING HANDLERS
// ============================================================================

/// POST /api/v1/agents - Register an agent and issue its API key
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "Agents",
    request_body = RegisterAgentRequest,
    responses(
        (status = 201, description = "Agent registered; plaintext key returned once", body = RegisterAgentResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Agent name already registered", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_agent(
    State(state): State<AppState>,
    OperatorPrincipal(operator): OperatorPrincipal,
    Json(req): Json<RegisterAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    if req.agent_kind.trim().is_empty() {
        return Err(ApiError::missing_field("agent_kind"));
    }

    let (agent, api_key) = state.registry.register(req.name.trim(), req.agent_kind.trim())?;
    tracing::info!(agent_id = %agent.id, operator = %operator, "agent registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterAgentResponse {
            agent: AgentEnvelope::from(agent),
            api_key,
        }),
    ))
}

/// GET /api/v1/agents - List registered agents
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "Agents in registration order", body = [AgentEnvelope]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_agents(
    State(state): State<AppState>,
    OperatorPrincipal(_operator): OperatorPrincipal,
) -> ApiResult<Json<Vec<AgentEnvelope>>> {
    let agents = state
        .registry
        .list()
        .into_iter()
        .map(AgentEnvelope::from)
        .collect();
    Ok(Json(agents))
}

/// GET /api/v1/agents/{id} - Fetch an agent by id
#[utoipa::path(
    get,
    path = "/api/v1/agents/{id}",
    tag = "Agents",
    params(
        ("id" = String, Path, description = "Agent ID")
    ),
    responses(
        (status = 200, description = "Agent details", body = AgentEnvelope),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_agent(
    State(state): State<AppState>,
    OperatorPrincipal(_operator): OperatorPrincipal,
    Path(id): Path<AgentId>,
) -> ApiResult<Json<AgentEnvelope>> {
    let agent = state.registry.get(id)?;
    Ok(Json(AgentEnvelope::from(agent)))
}

/// POST /api/v1/agents/{id}/revoke - Revoke an agent's API key
#[utoipa::path(
    post,
    path = "/api/v1/agents/{id}/revoke",
    tag = "Agents",
    params(
        ("id" = String, Path, description = "Agent ID")
    ),
    responses(
        (status = 200, description = "Key revoked", body = RevokeKeyResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_agent_key(
    State(state): State<AppState>,
    OperatorPrincipal(operator): OperatorPrincipal,
    Path(id): Path<AgentId>,
) -> ApiResult<Json<RevokeKeyResponse>> {
    state.registry.revoke_key(id)?;
    tracing::info!(agent_id = %id, operator = %operator, "operator revoked agent key");
    Ok(Json(RevokeKeyResponse { revoked: true }))
}

// ============================================================================
// AGENT-FACING HANDLERS
// ============================================================================

/// GET /api/v1/agent/commands - One-shot poll for newly-deliverable commands
#[utoipa::path(
    get,
    path = "/api/v1/agent/commands",
    tag = "Dispatch",
    responses(
        (status = 200, description = "Newly-delivered commands in creation order (possibly empty)", body = [PollCommand]),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("api_key" = []))
)]
pub async fn poll_commands(
    State(state): State<AppState>,
    AgentPrincipal(agent_id): AgentPrincipal,
) -> ApiResult<Json<Vec<PollCommand>>> {
    let delivered = state
        .engine
        .poll(agent_id)
        .into_iter()
        .map(PollCommand::from)
        .collect();
    Ok(Json(delivered))
}

/// POST /api/v1/agent/commands/{id}/output - Append output to a command
#[utoipa::path(
    post,
    path = "/api/v1/agent/commands/{id}/output",
    tag = "Dispatch",
    params(
        ("id" = String, Path, description = "Command ID")
    ),
    request_body = OutputRequest,
    responses(
        (status = 204, description = "Output appended"),
        (status = 400, description = "Empty output text", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Command not found", body = ApiError),
        (status = 409, description = "Command is not in progress", body = ApiError),
    ),
    security(("api_key" = []))
)]
pub async fn append_output(
    State(state): State<AppState>,
    AgentPrincipal(agent_id): AgentPrincipal,
    Path(id): Path<CommandId>,
    Json(req): Json<OutputRequest>,
) -> ApiResult<StatusCode> {
    state.engine.append_output(id, agent_id, &req.text)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/agent/commands/{id}/ack - Finalize a command with its result
#[utoipa::path(
    post,
    path = "/api/v1/agent/commands/{id}/ack",
    tag = "Dispatch",
    params(
        ("id" = String, Path, description = "Command ID")
    ),
    request_body = AckRequest,
    responses(
        (status = 200, description = "Command acknowledged", body = CommandEnvelope),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Command not found", body = ApiError),
        (status = 409, description = "Command is not in progress", body = ApiError),
    ),
    security(("api_key" = []))
)]
pub async fn ack_command(
    State(state): State<AppState>,
    AgentPrincipal(agent_id): AgentPrincipal,
    Path(id): Path<CommandId>,
    Json(req): Json<AckRequest>,
) -> ApiResult<Json<CommandEnvelope>> {
    let command = state.engine.ack(id, agent_id, req.success, req.message)?;
    Ok(Json(CommandEnvelope::from(command)))
}

/// POST /api/v1/agent/heartbeat - Report liveness metrics
#[utoipa::path(
    post,
    path = "/api/v1/agent/heartbeat",
    tag = "Dispatch",
    request_body = HeartbeatRequest,
    responses(
        (status = 200, description = "Heartbeat recorded", body = HeartbeatResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("api_key" = []))
)]
pub async fn heartbeat(
    State(state): State<AppState>,
    AgentPrincipal(agent_id): AgentPrincipal,
    Json(req): Json<HeartbeatRequest>,
) -> ApiResult<Json<HeartbeatResponse>> {
    let received_at = state.registry.heartbeat(agent_id, req.metrics)?;
    Ok(Json(HeartbeatResponse { received_at }))
}

/// POST /api/v1/agent/logout - Self-revoke the calling agent's API key
#[utoipa::path(
    post,
    path = "/api/v1/agent/logout",
    tag = "Dispatch",
    responses(
        (status = 200, description = "Key revoked", body = RevokeKeyResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("api_key" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    AgentPrincipal(agent_id): AgentPrincipal,
) -> ApiResult<Json<RevokeKeyResponse>> {
    state.registry.revoke_key(agent_id)?;
    tracing::info!(agent_id = %agent_id, "agent logged out and revoked its key");
    Ok(Json(RevokeKeyResponse { revoked: true }))
}
