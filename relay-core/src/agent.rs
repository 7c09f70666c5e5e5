//! Agent record: identity, credential slot, and advisory liveness fields.

use crate::identity::{AgentId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One registered remote agent process.
///
/// The credential slot holds only the SHA-256 digest of the current API
/// key. Revocation clears the slot; the old key value can never become
/// valid again because issuance always generates a fresh key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Agent {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: AgentId,
    /// Unique, operator-chosen name.
    pub name: String,
    /// Free-form descriptor of what kind of process this is (device class,
    /// deployment role, ...). Opaque to the dispatch core.
    pub agent_kind: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub registered_at: Timestamp,
    /// SHA-256 hex digest of the current API key; `None` once revoked.
    #[serde(skip_serializing, default)]
    pub key_hash: Option<String>,
    /// Last heartbeat instant. Advisory only; never consulted by the
    /// command state machine.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_heartbeat: Option<Timestamp>,
    /// Metrics reported with the last heartbeat, stored verbatim.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub last_metrics: Option<Value>,
}

impl Agent {
    /// Create a newly-registered agent with the given credential digest.
    pub fn new(
        name: impl Into<String>,
        agent_kind: impl Into<String>,
        key_hash: String,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            id: crate::identity::new_entity_id(),
            name: name.into(),
            agent_kind: agent_kind.into(),
            registered_at,
            key_hash: Some(key_hash),
            last_heartbeat: None,
            last_metrics: None,
        }
    }

    /// Whether the agent currently holds a valid (unrevoked) credential.
    pub fn has_valid_key(&self) -> bool {
        self.key_hash.is_some()
    }
}
