//! Error Types for the RELAY API
//!
//! Defines the structured error response (`ApiError`), the `ErrorCode`
//! taxonomy with its HTTP status mapping, and the conversion from core
//! errors. The taxonomy is deliberately small: every failure a caller can
//! provoke maps to exactly one of 400, 401, 404, or 409.
//!
//! The status-code mapping also encodes one access-control decision:
//! an agent touching another agent's command gets the same 404 as an
//! unknown id, so probing cannot distinguish "does not exist" from
//! "not yours".

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::{RegistryError, RelayError, StoreError, TransitionError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested command does not exist
    CommandNotFound,

    /// Requested agent does not exist
    AgentNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Agent with the same name already exists
    AgentAlreadyExists,

    /// Operation conflicts with the command's current status
    StateConflict,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::InvalidInput | ErrorCode::MissingField => StatusCode::BAD_REQUEST,

            ErrorCode::CommandNotFound | ErrorCode::AgentNotFound => StatusCode::NOT_FOUND,

            ErrorCode::AgentAlreadyExists | ErrorCode::StateConflict => StatusCode::CONFLICT,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::CommandNotFound => "Command not found",
            ErrorCode::AgentNotFound => "Agent not found",
            ErrorCode::AgentAlreadyExists => "Agent already exists",
            ErrorCode::StateConflict => "Operation conflicts with current command status",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create an InvalidToken error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    /// Create a TokenExpired error.
    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create a CommandNotFound error.
    pub fn command_not_found(command_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command {} not found", command_id),
        )
    }

    /// Create an AgentNotFound error.
    pub fn agent_not_found(agent_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::AgentNotFound,
            format!("Agent {} not found", agent_id),
        )
    }

    /// Create an AgentAlreadyExists error.
    pub fn agent_already_exists(name: &str) -> Self {
        Self::new(
            ErrorCode::AgentAlreadyExists,
            format!("Agent '{}' is already registered", name),
        )
    }

    /// Create a StateConflict error.
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// CORE ERROR CONVERSION
// ============================================================================

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Store(StoreError::CommandNotFound { id }) => Self::command_not_found(id),
            RelayError::Store(StoreError::AgentNotFound { id }) => Self::agent_not_found(id),

            // Cross-agent access reports the same 404 as an unknown id.
            RelayError::Transition(TransitionError::NotOwned { command_id, .. }) => {
                Self::command_not_found(command_id)
            }
            RelayError::Transition(err @ TransitionError::InvalidState { .. }) => {
                Self::state_conflict(err.to_string())
            }

            RelayError::Registry(RegistryError::AgentNotFound { id }) => Self::agent_not_found(id),
            RelayError::Registry(RegistryError::DuplicateName { name }) => {
                Self::agent_already_exists(&name)
            }
            RelayError::Registry(RegistryError::UnknownKey) => {
                Self::unauthorized("Invalid or revoked API key")
            }

            RelayError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                Self::missing_field(&field)
            }
            RelayError::Validation(err @ ValidationError::InvalidValue { .. }) => {
                Self::invalid_input(err.to_string())
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{new_entity_id, CommandStatus};

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ErrorCode::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::InvalidInput.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::CommandNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::StateConflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_value(ErrorCode::StateConflict).unwrap();
        assert_eq!(json, serde_json::json!("STATE_CONFLICT"));
    }

    #[test]
    fn test_not_owned_is_concealed_as_not_found() {
        let command_id = new_entity_id();
        let err: ApiError = RelayError::from(TransitionError::NotOwned {
            command_id,
            agent_id: new_entity_id(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::CommandNotFound);
        assert!(err.message.contains(&command_id.to_string()));
    }

    #[test]
    fn test_invalid_state_maps_to_conflict() {
        let err: ApiError = RelayError::from(TransitionError::InvalidState {
            command_id: new_entity_id(),
            status: CommandStatus::Expired,
            operation: "ack",
        })
        .into();
        assert_eq!(err.code, ErrorCode::StateConflict);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unknown_key_maps_to_unauthorized() {
        let err: ApiError = RelayError::from(RegistryError::UnknownKey).into();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: ApiError = RelayError::from(ValidationError::RequiredFieldMissing {
            field: "payload.url".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("payload.url"));
    }
}
