//! Error types for RELAY operations

use crate::command::CommandStatus;
use crate::identity::{AgentId, CommandId};
use thiserror::Error;

/// Store lookup errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Command not found: {id}")]
    CommandNotFound { id: CommandId },

    #[error("Agent not found: {id}")]
    AgentNotFound { id: AgentId },
}

/// State transition errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Command {command_id} is not owned by agent {agent_id}")]
    NotOwned {
        command_id: CommandId,
        agent_id: AgentId,
    },

    #[error("Operation '{operation}' is not valid while command {command_id} is {status}")]
    InvalidState {
        command_id: CommandId,
        status: CommandStatus,
        operation: &'static str,
    },
}

/// Agent registry and credential errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Agent not found: {id}")]
    AgentNotFound { id: AgentId },

    #[error("Agent name already registered: {name}")]
    DuplicateName { name: String },

    #[error("API key is unknown or revoked")]
    UnknownKey,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all RELAY operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for RELAY operations.
pub type RelayResult<T> = Result<T, RelayError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::new_entity_id;

    #[test]
    fn test_store_error_display() {
        let id = new_entity_id();
        let msg = format!("{}", StoreError::CommandNotFound { id });
        assert!(msg.contains("Command not found"));
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn test_transition_error_display_invalid_state() {
        let err = TransitionError::InvalidState {
            command_id: new_entity_id(),
            status: CommandStatus::Expired,
            operation: "ack",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("ack"));
        assert!(msg.contains("expired"));
    }

    #[test]
    fn test_registry_error_display() {
        let msg = format!(
            "{}",
            RegistryError::DuplicateName {
                name: "edge-01".to_string()
            }
        );
        assert!(msg.contains("edge-01"));
    }

    #[test]
    fn test_relay_error_from_variants() {
        let store = RelayError::from(StoreError::CommandNotFound {
            id: new_entity_id(),
        });
        assert!(matches!(store, RelayError::Store(_)));

        let transition = RelayError::from(TransitionError::NotOwned {
            command_id: new_entity_id(),
            agent_id: new_entity_id(),
        });
        assert!(matches!(transition, RelayError::Transition(_)));

        let registry = RelayError::from(RegistryError::UnknownKey);
        assert!(matches!(registry, RelayError::Registry(_)));

        let validation = RelayError::from(ValidationError::RequiredFieldMissing {
            field: "payload.url".to_string(),
        });
        assert!(matches!(validation, RelayError::Validation(_)));
    }
}
