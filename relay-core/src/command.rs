//! Command record and lifecycle enums.
//!
//! A command moves through a strict status lattice:
//!
//! ```text
//! Queued ──→ InProgress ──→ Acked
//!    │
//!    └─────→ Expired
//! ```
//!
//! `Acked` and `Expired` are terminal. `delivered_at` is stamped exactly
//! once, at the instant the command leaves `Queued`.

use crate::error::ValidationError;
use crate::identity::{AgentId, CommandId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// COMMAND TYPE
// ============================================================================

/// Closed enumeration of dispatchable command types.
///
/// The payload schema of each type belongs to its handler; the core only
/// enforces the presence of the keys a handler cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CommandType {
    Discover,
    Register,
    Validate,
    ModelDeploy,
    ConfigUpdate,
    CollectStart,
    CollectStop,
    Status,
    TestLongRunning,
    Logout,
}

impl CommandType {
    /// Wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Discover => "Discover",
            CommandType::Register => "Register",
            CommandType::Validate => "Validate",
            CommandType::ModelDeploy => "ModelDeploy",
            CommandType::ConfigUpdate => "ConfigUpdate",
            CommandType::CollectStart => "CollectStart",
            CommandType::CollectStop => "CollectStop",
            CommandType::Status => "Status",
            CommandType::TestLongRunning => "TestLongRunning",
            CommandType::Logout => "Logout",
        }
    }

    /// Payload key this command type cannot be enqueued without.
    pub fn required_payload_key(&self) -> Option<&'static str> {
        match self {
            CommandType::ModelDeploy => Some("url"),
            CommandType::ConfigUpdate => Some("config"),
            CommandType::CollectStart => Some("topics"),
            _ => None,
        }
    }

    /// Validate an enqueue payload against this type's requirements.
    ///
    /// The payload, when present, must be a JSON object. Types with a
    /// required key reject a missing payload, a missing key, and an
    /// explicit `null` value alike.
    pub fn validate_payload(&self, payload: Option<&Value>) -> Result<(), ValidationError> {
        if let Some(payload) = payload {
            if !payload.is_object() {
                return Err(ValidationError::InvalidValue {
                    field: "payload".to_string(),
                    reason: "must be a JSON object".to_string(),
                });
            }
        }

        if let Some(key) = self.required_payload_key() {
            let present = payload
                .and_then(|p| p.get(key))
                .map(|v| !v.is_null())
                .unwrap_or(false);
            if !present {
                return Err(ValidationError::RequiredFieldMissing {
                    field: format!("payload.{}", key),
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = CommandTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Discover" => Ok(CommandType::Discover),
            "Register" => Ok(CommandType::Register),
            "Validate" => Ok(CommandType::Validate),
            "ModelDeploy" => Ok(CommandType::ModelDeploy),
            "ConfigUpdate" => Ok(CommandType::ConfigUpdate),
            "CollectStart" => Ok(CommandType::CollectStart),
            "CollectStop" => Ok(CommandType::CollectStop),
            "Status" => Ok(CommandType::Status),
            "TestLongRunning" => Ok(CommandType::TestLongRunning),
            "Logout" => Ok(CommandType::Logout),
            _ => Err(CommandTypeParseError(s.to_string())),
        }
    }
}

/// Error when parsing an unrecognized command type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTypeParseError(pub String);

impl fmt::Display for CommandTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unrecognized command type: {}", self.0)
    }
}

impl std::error::Error for CommandTypeParseError {}

// ============================================================================
// COMMAND STATUS
// ============================================================================

/// Delivery lifecycle status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Created, not yet seen by the owning agent.
    Queued,
    /// Delivered to the agent by a poll; awaiting acknowledgement.
    InProgress,
    /// Acknowledged with a result. Terminal.
    Acked,
    /// Aged past its TTL before delivery. Terminal.
    Expired,
}

impl CommandStatus {
    /// Wire string representation (matches the serde encoding).
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Queued => "queued",
            CommandStatus::InProgress => "in_progress",
            CommandStatus::Acked => "acked",
            CommandStatus::Expired => "expired",
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Acked | CommandStatus::Expired)
    }

    /// Whether the lattice admits a transition from `self` to `next`.
    pub fn can_transition_to(&self, next: CommandStatus) -> bool {
        matches!(
            (self, next),
            (CommandStatus::Queued, CommandStatus::InProgress)
                | (CommandStatus::Queued, CommandStatus::Expired)
                | (CommandStatus::InProgress, CommandStatus::Acked)
        )
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommandStatus {
    type Err = CommandStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(CommandStatus::Queued),
            "in_progress" => Ok(CommandStatus::InProgress),
            "acked" => Ok(CommandStatus::Acked),
            "expired" => Ok(CommandStatus::Expired),
            _ => Err(CommandStatusParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatusParseError(pub String);

impl fmt::Display for CommandStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid command status: {}", self.0)
    }
}

impl std::error::Error for CommandStatusParseError {}

// ============================================================================
// COMMAND RESULT
// ============================================================================

/// Terminal result reported by the agent at acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// COMMAND RECORD
// ============================================================================

/// One operator-initiated unit of work for a single agent.
///
/// All fields except `status`, `delivered_at`, `acked_at`, `output`, and
/// `result` are immutable after creation, and those five mutate only inside
/// the transition engine's per-command critical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Command {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: CommandId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub command_type: CommandType,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub payload: Option<Value>,
    pub status: CommandStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub delivered_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub acked_at: Option<Timestamp>,
    /// Expiry window in seconds, fixed at enqueue time.
    pub ttl_secs: i64,
    /// Append-only output log, in call arrival order.
    pub output: Vec<String>,
    pub result: Option<CommandResult>,
}

impl Command {
    /// Create a freshly-queued command.
    pub fn new(
        agent_id: AgentId,
        command_type: CommandType,
        payload: Option<Value>,
        ttl_secs: i64,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: crate::identity::new_entity_id(),
            agent_id,
            command_type,
            payload,
            status: CommandStatus::Queued,
            created_at,
            delivered_at: None,
            acked_at: None,
            ttl_secs,
            output: Vec::new(),
            result: None,
        }
    }

    /// Age of the command at `now`, in whole seconds (negative if `now`
    /// precedes creation, which only a skewed caller clock can produce).
    pub fn age_secs(&self, now: Timestamp) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_command_type_roundtrip() {
        for ty in [
            CommandType::Discover,
            CommandType::Register,
            CommandType::Validate,
            CommandType::ModelDeploy,
            CommandType::ConfigUpdate,
            CommandType::CollectStart,
            CommandType::CollectStop,
            CommandType::Status,
            CommandType::TestLongRunning,
            CommandType::Logout,
        ] {
            let parsed: CommandType = ty.as_str().parse().unwrap();
            assert_eq!(ty, parsed);
        }
    }

    #[test]
    fn test_command_type_rejects_unknown() {
        let err = "SelfDestruct".parse::<CommandType>().unwrap_err();
        assert_eq!(err.0, "SelfDestruct");
    }

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(CommandStatus::Queued.as_str(), "queued");
        assert_eq!(CommandStatus::InProgress.as_str(), "in_progress");
        assert_eq!(CommandStatus::Acked.as_str(), "acked");
        assert_eq!(CommandStatus::Expired.as_str(), "expired");
        assert_eq!(
            serde_json::to_value(CommandStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
    }

    #[test]
    fn test_status_lattice() {
        use CommandStatus::*;
        assert!(Queued.can_transition_to(InProgress));
        assert!(Queued.can_transition_to(Expired));
        assert!(InProgress.can_transition_to(Acked));

        assert!(!Queued.can_transition_to(Acked));
        assert!(!InProgress.can_transition_to(Expired));
        assert!(!InProgress.can_transition_to(Queued));
        for terminal in [Acked, Expired] {
            assert!(terminal.is_terminal());
            for next in [Queued, InProgress, Acked, Expired] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_validate_payload_requires_key() {
        let err = CommandType::ModelDeploy.validate_payload(None).unwrap_err();
        assert!(matches!(err, ValidationError::RequiredFieldMissing { .. }));

        let err = CommandType::ModelDeploy
            .validate_payload(Some(&serde_json::json!({"group": "drivetrain"})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::RequiredFieldMissing { .. }));

        let err = CommandType::ModelDeploy
            .validate_payload(Some(&serde_json::json!({"url": null})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::RequiredFieldMissing { .. }));

        CommandType::ModelDeploy
            .validate_payload(Some(&serde_json::json!({"url": "https://example.com"})))
            .unwrap();
    }

    #[test]
    fn test_validate_payload_rejects_non_object() {
        let err = CommandType::Status
            .validate_payload(Some(&serde_json::json!("not-a-dict")))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_payload_allows_absent_for_plain_types() {
        CommandType::Status.validate_payload(None).unwrap();
        CommandType::Logout.validate_payload(None).unwrap();
    }

    #[test]
    fn test_new_command_starts_queued() {
        let cmd = Command::new(new_agent(), CommandType::Status, None, 30, t0());
        assert_eq!(cmd.status, CommandStatus::Queued);
        assert!(cmd.delivered_at.is_none());
        assert!(cmd.acked_at.is_none());
        assert!(cmd.output.is_empty());
        assert!(cmd.result.is_none());
        assert_eq!(cmd.ttl_secs, 30);
    }

    #[test]
    fn test_age_secs() {
        let cmd = Command::new(new_agent(), CommandType::Status, None, 30, t0());
        assert_eq!(cmd.age_secs(t0() + Duration::seconds(31)), 31);
        assert_eq!(cmd.age_secs(t0() - Duration::seconds(1)), -1);
    }

    fn new_agent() -> crate::AgentId {
        crate::identity::new_entity_id()
    }
}
