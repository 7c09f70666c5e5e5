//! Agent registry: credentials, heartbeat, and key revocation.
//!
//! API keys are issued once in plaintext and stored only as SHA-256
//! digests. Revocation removes the digest from the lookup index, so every
//! subsequent use of the old key value fails authentication. Heartbeats
//! touch only the agent record, never command state.

use dashmap::DashMap;
use relay_core::{hash_api_key, Agent, AgentId, Clock, RegistryError, RelayResult, Timestamp};
use serde_json::Value;
use std::sync::Arc;

/// Registry of agents and their credentials.
///
/// Cloning shares the underlying maps.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: Arc<DashMap<AgentId, Agent>>,
    by_name: Arc<DashMap<String, AgentId>>,
    by_key_hash: Arc<DashMap<String, AgentId>>,
    clock: Arc<dyn Clock>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            agents: Arc::new(DashMap::new()),
            by_name: Arc::new(DashMap::new()),
            by_key_hash: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Register a new agent and issue its API key.
    ///
    /// Returns the agent record and the plaintext key. The plaintext is
    /// never stored and cannot be retrieved again; losing it means
    /// revoking and re-registering.
    pub fn register(
        &self,
        name: impl Into<String>,
        agent_kind: impl Into<String>,
    ) -> RelayResult<(Agent, String)> {
        let name = name.into();

        // The name index entry doubles as the uniqueness lock: claiming it
        // atomically wins any racing registration of the same name.
        let entry = match self.by_name.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateName { name }.into());
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => vacant,
        };

        let plaintext = generate_api_key();
        let digest = hash_api_key(&plaintext);
        let agent = Agent::new(name.clone(), agent_kind, digest.clone(), self.clock.now());
        let agent_id = agent.id;

        self.agents.insert(agent_id, agent.clone());
        self.by_key_hash.insert(digest, agent_id);
        entry.insert(agent_id);

        tracing::info!(agent_id = %agent_id, name = %name, "agent registered");
        Ok((agent, plaintext))
    }

    /// Resolve a plaintext API key to its agent.
    ///
    /// Unknown and revoked keys are indistinguishable to the caller.
    pub fn resolve_key(&self, plaintext: &str) -> RelayResult<Agent> {
        let digest = hash_api_key(plaintext);
        let agent_id = self
            .by_key_hash
            .get(&digest)
            .map(|entry| *entry)
            .ok_or(RegistryError::UnknownKey)?;

        let agent = self
            .agents
            .get(&agent_id)
            .map(|entry| entry.clone())
            .ok_or(RegistryError::UnknownKey)?;

        // The index can briefly outlive a revocation; the record is
        // authoritative.
        if agent.key_hash.as_deref() != Some(digest.as_str()) {
            return Err(RegistryError::UnknownKey.into());
        }
        Ok(agent)
    }

    /// Permanently invalidate the agent's current API key.
    ///
    /// Idempotent: revoking an already-revoked agent succeeds and changes
    /// nothing. There is no un-revoke; a new key requires re-issuance.
    pub fn revoke_key(&self, agent_id: AgentId) -> RelayResult<()> {
        let mut agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(RegistryError::AgentNotFound { id: agent_id })?;

        if let Some(digest) = agent.key_hash.take() {
            self.by_key_hash.remove(&digest);
            tracing::info!(agent_id = %agent_id, "agent API key revoked");
        }
        Ok(())
    }

    /// Record a liveness ping with its metrics. Always succeeds for a
    /// registered agent; has no effect on command state.
    pub fn heartbeat(&self, agent_id: AgentId, metrics: Option<Value>) -> RelayResult<Timestamp> {
        let now = self.clock.now();
        let mut agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(RegistryError::AgentNotFound { id: agent_id })?;
        agent.last_heartbeat = Some(now);
        agent.last_metrics = metrics;
        Ok(now)
    }

    /// Fetch a single agent record.
    pub fn get(&self, agent_id: AgentId) -> RelayResult<Agent> {
        self.agents
            .get(&agent_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| RegistryError::AgentNotFound { id: agent_id }.into())
    }

    /// Whether an agent with this id exists.
    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.agents.contains_key(&agent_id)
    }

    /// All registered agents, in registration order (ids are
    /// timestamp-sortable).
    pub fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self.agents.iter().map(|entry| entry.clone()).collect();
        agents.sort_by_key(|a| a.id);
        agents
    }
}

/// Generate a secure API key.
fn generate_api_key() -> String {
    use rand::Rng;

    const PREFIX: &str = "rk_";
    const KEY_LENGTH: usize = 40;

    let mut rng = rand::rng();
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let key: String = (0..KEY_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{}{}", PREFIX, key)
}

// =============================================================================
// TESTS
// =============================================================================
