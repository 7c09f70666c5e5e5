//! OpenAPI documentation aggregate.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes;
use crate::routes::health::HealthResponse;
use crate::types::{
    AckRequest, AgentEnvelope, CommandEnvelope, EnqueueCommandRequest, HeartbeatRequest,
    HeartbeatResponse, OutputRequest, PollCommand, RegisterAgentRequest, RegisterAgentResponse,
    RevokeKeyResponse,
};
use relay_core::{CommandResult, CommandStatus, CommandType};

/// OpenAPI documentation for the RELAY API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RELAY API",
        description = "Command dispatch for remote agents: operators enqueue typed \
                       commands, agents poll, stream output, and acknowledge results.",
    ),
    paths(
        routes::health::health,
        routes::agent::register_agent,
        routes::agent::list_agents,
        routes::agent::get_agent,
        routes::agent::revoke_agent_key,
        routes::agent::poll_commands,
        routes::agent::append_output,
        routes::agent::ack_command,
        routes::agent::heartbeat,
        routes::agent::logout,
        routes::command::enqueue_command,
        routes::command::get_command,
        routes::command::list_commands,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        HealthResponse,
        RegisterAgentRequest,
        RegisterAgentResponse,
        AgentEnvelope,
        RevokeKeyResponse,
        HeartbeatRequest,
        HeartbeatResponse,
        EnqueueCommandRequest,
        CommandEnvelope,
        PollCommand,
        OutputRequest,
        AckRequest,
        CommandStatus,
        CommandType,
        CommandResult,
    )),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Agents", description = "Agent registration and key management"),
        (name = "Commands", description = "Operator command surface"),
        (name = "Dispatch", description = "Agent-facing dispatch cycle"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Registers the two credential schemes.
struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["paths"]["/api/v1/agent/commands"].is_object());
        assert!(json["components"]["schemas"]["CommandEnvelope"].is_object());
    }
}
