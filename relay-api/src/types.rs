//! Request and response types for the RELAY API.
//!
//! The command envelope is the operator-facing view of a command; agents
//! polling for work receive the reduced poll shape, which carries only
//! what a handler needs to execute.

use relay_core::{Agent, AgentId, Command, CommandId, CommandResult, CommandStatus, CommandType, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// AGENT TYPES
// ============================================================================

/// Request to register a new agent.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegisterAgentRequest {
    /// Unique agent name.
    pub name: String,
    /// Free-form device/deployment descriptor.
    pub agent_kind: String,
}

/// Operator-facing view of an agent.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AgentEnvelope {
    #[schema(value_type = String, format = "uuid")]
    pub id: AgentId,
    pub name: String,
    pub agent_kind: String,
    #[schema(value_type = String, format = "date-time")]
    pub registered_at: Timestamp,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_heartbeat: Option<Timestamp>,
    #[schema(value_type = Option<Object>)]
    pub last_metrics: Option<Value>,
    /// Whether the agent currently holds an unrevoked API key.
    pub key_active: bool,
}

impl From<Agent> for AgentEnvelope {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            key_active: agent.has_valid_key(),
            name: agent.name,
            agent_kind: agent.agent_kind,
            registered_at: agent.registered_at,
            last_heartbeat: agent.last_heartbeat,
            last_metrics: agent.last_metrics,
        }
    }
}

/// Response to a successful agent registration.
///
/// `api_key` is the only time the plaintext key is ever returned.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegisterAgentResponse {
    pub agent: AgentEnvelope,
    pub api_key: String,
}

/// Response to a key revocation (operator-initiated or agent logout).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RevokeKeyResponse {
    pub revoked: bool,
}

/// Liveness ping from an agent. Metrics are stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HeartbeatRequest {
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metrics: Option<Value>,
}

/// Acknowledgement of a heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HeartbeatResponse {
    #[schema(value_type = String, format = "date-time")]
    pub received_at: Timestamp,
}

// ============================================================================
// COMMAND TYPES
// ============================================================================

/// Operator request to enqueue a command.
///
/// The type arrives as a string and is parsed against the closed
/// enumeration, so an unrecognized type is a 400, not a deserialization
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EnqueueCommandRequest {
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

/// Operator-facing view of a command, full lifecycle fields included.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommandEnvelope {
    #[schema(value_type = String, format = "uuid")]
    pub id: CommandId,
    #[schema(value_type = String, format = "uuid")]
    pub agent_id: AgentId,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
    pub status: CommandStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Timestamp,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub delivered_at: Option<Timestamp>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub acked_at: Option<Timestamp>,
    pub output: Vec<String>,
    pub result: Option<CommandResult>,
}

impl From<Command> for CommandEnvelope {
    fn from(command: Command) -> Self {
        Self {
            id: command.id,
            agent_id: command.agent_id,
            command_type: command.command_type,
            payload: command.payload,
            status: command.status,
            created_at: command.created_at,
            delivered_at: command.delivered_at,
            acked_at: command.acked_at,
            output: command.output,
            result: command.result,
        }
    }
}

/// Agent-facing shape of a newly-delivered command.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PollCommand {
    #[schema(value_type = String, format = "uuid")]
    pub command_id: CommandId,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

impl From<Command> for PollCommand {
    fn from(command: Command) -> Self {
        Self {
            command_id: command.id,
            command_type: command.command_type,
            payload: command.payload,
        }
    }
}

/// Agent request to append one output entry.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OutputRequest {
    pub text: String,
}

/// Agent request to finalize a command.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AckRequest {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Query parameters for the operator command listing.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ListCommandsQuery {
    /// Optional status filter (`queued | in_progress | acked | expired`).
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use relay_core::new_entity_id;

    #[test]
    fn test_command_envelope_wire_shape() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let command = Command::new(
            new_entity_id(),
            CommandType::ModelDeploy,
            Some(serde_json::json!({"url": "https://example.com"})),
            30,
            created,
        );
        let envelope = CommandEnvelope::from(command.clone());
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["type"], "ModelDeploy");
        assert_eq!(json["status"], "queued");
        assert_eq!(json["id"], command.id.to_string());
        assert!(json["delivered_at"].is_null());
        assert!(json["result"].is_null());
        assert_eq!(json["output"], serde_json::json!([]));
    }

    #[test]
    fn test_poll_command_is_reduced() {
        let command = Command::new(
            new_entity_id(),
            CommandType::Status,
            None,
            30,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        let poll = PollCommand::from(command.clone());
        let json = serde_json::to_value(&poll).unwrap();

        assert_eq!(json["command_id"], command.id.to_string());
        assert_eq!(json["type"], "Status");
        assert!(json.get("status").is_none());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_ack_request_message_defaults_empty() {
        let req: AckRequest = serde_json::from_value(serde_json::json!({"success": true})).unwrap();
        assert!(req.success);
        assert_eq!(req.message, "");
    }

    #[test]
    fn test_agent_envelope_reflects_revocation() {
        let mut agent = Agent::new(
            "edge-01",
            "px4",
            relay_core::hash_api_key("rk_x"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        agent.key_hash = None;
        let envelope = AgentEnvelope::from(agent);
        assert!(!envelope.key_active);
    }
}
