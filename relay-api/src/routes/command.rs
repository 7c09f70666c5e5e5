//! Operator-facing command routes.
//!
//! Enqueue, fetch, and list commands. Operator tokens are scoped to every
//! agent's commands, so no ownership check applies here; the 404s below
//! are genuine unknown-id failures.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use relay_core::{AgentId, CommandId, CommandStatus, CommandType};

use crate::{
    error::{ApiError, ApiResult},
    middleware::OperatorPrincipal,
    state::AppState,
    types::{CommandEnvelope, EnqueueCommandRequest, ListCommandsQuery},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/agents/{agent_id}/commands - Enqueue a command
#[utoipa::path(
    post,
    path = "/api/v1/agents/{agent_id}/commands",
    tag = "Commands",
    params(
        ("agent_id" = String, Path, description = "Owning agent ID")
    ),
    request_body = EnqueueCommandRequest,
    responses(
        (status = 201, description = "Command enqueued", body = CommandEnvelope),
        (status = 400, description = "Unrecognized type or invalid payload", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn enqueue_command(
    State(state): State<AppState>,
    OperatorPrincipal(operator): OperatorPrincipal,
    Path(agent_id): Path<AgentId>,
    Json(req): Json<EnqueueCommandRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.registry.contains(agent_id) {
        return Err(ApiError::agent_not_found(agent_id));
    }

    if req.command_type.trim().is_empty() {
        return Err(ApiError::missing_field("type"));
    }

    let command_type: CommandType = req
        .command_type
        .parse()
        .map_err(|e: relay_core::CommandTypeParseError| ApiError::invalid_input(e.to_string()))?;

    let command = state.engine.enqueue(agent_id, command_type, req.payload)?;
    tracing::info!(
        command_id = %command.id,
        agent_id = %agent_id,
        operator = %operator,
        "operator enqueued command"
    );

    Ok((StatusCode::CREATED, Json(CommandEnvelope::from(command))))
}

/// GET /api/v1/commands/{id} - Fetch a command by id
#[utoipa::path(
    get,
    path = "/api/v1/commands/{id}",
    tag = "Commands",
    params(
        ("id" = String, Path, description = "Command ID")
    ),
    responses(
        (status = 200, description = "Command details", body = CommandEnvelope),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Command not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_command(
    State(state): State<AppState>,
    OperatorPrincipal(_operator): OperatorPrincipal,
    Path(id): Path<CommandId>,
) -> ApiResult<Json<CommandEnvelope>> {
    let command = state.engine.get(id)?;
    Ok(Json(CommandEnvelope::from(command)))
}

/// GET /api/v1/agents/{agent_id}/commands - List an agent's commands
#[utoipa::path(
    get,
    path = "/api/v1/agents/{agent_id}/commands",
    tag = "Commands",
    params(
        ("agent_id" = String, Path, description = "Owning agent ID"),
        ListCommandsQuery
    ),
    responses(
        (status = 200, description = "Commands in creation order", body = [CommandEnvelope]),
        (status = 400, description = "Invalid status filter", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_commands(
    State(state): State<AppState>,
    OperatorPrincipal(_operator): OperatorPrincipal,
    Path(agent_id): Path<AgentId>,
    Query(params): Query<ListCommandsQuery>,
) -> ApiResult<Json<Vec<CommandEnvelope>>> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            s.parse::<CommandStatus>()
                .map_err(|e| ApiError::invalid_input(e.to_string()))
        })
        .transpose()?;

    let commands = state
        .engine
        .list(agent_id, status)
        .into_iter()
        .map(CommandEnvelope::from)
        .collect();
    Ok(Json(commands))
}
