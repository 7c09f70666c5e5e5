//! Keyed in-memory command repository.
//!
//! Commands live in a concurrent map keyed by command id; a per-agent index
//! preserves insertion order for listing and delivery. The store itself
//! never mutates a command's status; all transitions go through
//! [`crate::engine::TransitionEngine`], which works on the entry guards
//! this store hands out.

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use relay_core::{AgentId, Command, CommandId, CommandStatus};
use std::sync::Arc;

/// Concurrent command repository with a per-agent insertion-order index.
///
/// Cloning shares the underlying maps, so the API layer and the transition
/// engine observe the same state.
#[derive(Clone, Default)]
pub struct CommandStore {
    commands: Arc<DashMap<CommandId, Command>>,
    by_agent: Arc<DashMap<AgentId, Vec<CommandId>>>,
}

impl CommandStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly-created command and index it under its agent.
    ///
    /// The id is appended to the agent index after the command record is
    /// visible, and the two maps are never locked at the same time.
    pub(crate) fn insert(&self, command: Command) {
        let id = command.id;
        let agent_id = command.agent_id;
        self.commands.insert(id, command);
        self.by_agent.entry(agent_id).or_default().push(id);
    }

    /// Snapshot a command by id.
    pub fn get(&self, id: CommandId) -> Option<Command> {
        self.commands.get(&id).map(|entry| entry.clone())
    }

    /// Exclusive entry guard for a command. This is the per-command
    /// critical section the transition engine runs inside.
    pub(crate) fn entry_mut(&self, id: CommandId) -> Option<RefMut<'_, CommandId, Command>> {
        self.commands.get_mut(&id)
    }

    /// All command ids ever created for an agent, in creation order.
    pub fn ids_for_agent(&self, agent_id: AgentId) -> Vec<CommandId> {
        self.by_agent
            .get(&agent_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    /// Ids of the agent's currently-queued commands, in creation order.
    ///
    /// A snapshot for delivery: the caller must still re-check status under
    /// the entry guard, since another poll may settle a command between
    /// this read and the guard acquisition.
    pub fn queued_ids_for_agent(&self, agent_id: AgentId) -> Vec<CommandId> {
        self.ids_for_agent(agent_id)
            .into_iter()
            .filter(|id| {
                self.commands
                    .get(id)
                    .map(|c| c.status == CommandStatus::Queued)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Number of commands in the store, across all agents.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the store holds no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use relay_core::{new_entity_id, CommandType, Timestamp};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let store = CommandStore::new();
        let agent_id = new_entity_id();
        let cmd = Command::new(agent_id, CommandType::Status, None, 30, t0());
        let id = cmd.id;

        store.insert(cmd);
        let fetched = store.get(id).unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.agent_id, agent_id);
        assert!(store.get(new_entity_id()).is_none());
    }

    #[test]
    fn test_agent_index_preserves_creation_order() {
        let store = CommandStore::new();
        let agent_id = new_entity_id();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let cmd = Command::new(agent_id, CommandType::Status, None, 30, t0());
            ids.push(cmd.id);
            store.insert(cmd);
        }
        assert_eq!(store.ids_for_agent(agent_id), ids);
    }

    #[test]
    fn test_queued_ids_exclude_settled() {
        let store = CommandStore::new();
        let agent_id = new_entity_id();
        let first = Command::new(agent_id, CommandType::Status, None, 30, t0());
        let second = Command::new(agent_id, CommandType::Discover, None, 30, t0());
        let first_id = first.id;
        let second_id = second.id;
        store.insert(first);
        store.insert(second);

        store.entry_mut(first_id).unwrap().status = CommandStatus::InProgress;
        assert_eq!(store.queued_ids_for_agent(agent_id), vec![second_id]);
    }

    #[test]
    fn test_agents_have_disjoint_indexes() {
        let store = CommandStore::new();
        let agent_a = new_entity_id();
        let agent_b = new_entity_id();
        store.insert(Command::new(agent_a, CommandType::Status, None, 30, t0()));

        assert_eq!(store.ids_for_agent(agent_a).len(), 1);
        assert!(store.ids_for_agent(agent_b).is_empty());
    }

    #[test]
    fn test_clone_shares_state() {
        let store = CommandStore::new();
        let clone = store.clone();
        let cmd = Command::new(new_entity_id(), CommandType::Status, None, 30, t0());
        let id = cmd.id;
        store.insert(cmd);
        assert!(clone.get(id).is_some());
    }
}
