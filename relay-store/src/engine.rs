//! State transition engine.
//!
//! The four mutating operations of the dispatch lifecycle (enqueue, poll,
//! output append, ack) plus the operator read paths, all funneled through
//! per-command critical sections. The engine is the only code that
//! materializes a delivery verdict, and it does so exactly once per
//! command: the status re-check inside the entry guard is what makes
//! concurrent polls deliver each command at most once.
//!
//! TTL expiry is evaluated lazily, at poll and read time. There is no
//! background sweep thread; an expired-but-unread command stays `queued`
//! in storage until the next path that touches it settles the transition.

use crate::store::CommandStore;
use relay_core::{
    evaluate, AgentId, Clock, Command, CommandId, CommandResult, CommandStatus, CommandType,
    DeliveryVerdict, RelayResult, StoreError, Timestamp, TransitionError, ValidationError,
};
use serde_json::Value;
use std::sync::Arc;

/// Applies and validates every command state transition.
#[derive(Clone)]
pub struct TransitionEngine {
    store: CommandStore,
    clock: Arc<dyn Clock>,
    default_ttl_secs: i64,
}

impl TransitionEngine {
    /// Create an engine over a fresh store.
    pub fn new(clock: Arc<dyn Clock>, default_ttl_secs: i64) -> Self {
        Self {
            store: CommandStore::new(),
            clock,
            default_ttl_secs,
        }
    }

    /// The underlying store (read-only surface).
    pub fn store(&self) -> &CommandStore {
        &self.store
    }

    /// Enqueue a command for an agent.
    ///
    /// Validates the payload against the command type's requirements and
    /// creates a `queued` record with the process-wide TTL. Repeated calls
    /// create distinct commands; there is no idempotency token.
    pub fn enqueue(
        &self,
        agent_id: AgentId,
        command_type: CommandType,
        payload: Option<Value>,
    ) -> RelayResult<Command> {
        command_type.validate_payload(payload.as_ref())?;

        let command = Command::new(
            agent_id,
            command_type,
            payload,
            self.default_ttl_secs,
            self.clock.now(),
        );
        tracing::info!(
            command_id = %command.id,
            agent_id = %agent_id,
            command_type = %command_type,
            "command enqueued"
        );
        let snapshot = command.clone();
        self.store.insert(command);
        Ok(snapshot)
    }

    /// One-shot drain of the agent's currently-queued commands.
    ///
    /// Every queued command is settled under its entry guard: fresh ones
    /// become `in_progress` and are returned in creation order, stale ones
    /// become `expired` and are never returned. Commands already settled by
    /// a racing poll are skipped.
    pub fn poll(&self, agent_id: AgentId) -> Vec<Command> {
        let now = self.clock.now();
        let mut delivered = Vec::new();

        for id in self.store.queued_ids_for_agent(agent_id) {
            let Some(mut entry) = self.store.entry_mut(id) else {
                continue;
            };
            // Verdict and transition must share the critical section; the
            // snapshot taken outside the guard may already be stale.
            match evaluate(&entry, now) {
                DeliveryVerdict::Deliver => {
                    entry.status = CommandStatus::InProgress;
                    entry.delivered_at = Some(now);
                    tracing::info!(
                        command_id = %entry.id,
                        agent_id = %agent_id,
                        "command delivered"
                    );
                    delivered.push(entry.clone());
                }
                DeliveryVerdict::Expire => {
                    entry.status = CommandStatus::Expired;
                    entry.delivered_at = Some(now);
                    tracing::info!(
                        command_id = %entry.id,
                        agent_id = %agent_id,
                        age_secs = entry.age_secs(now),
                        ttl_secs = entry.ttl_secs,
                        "command expired before delivery"
                    );
                }
                DeliveryVerdict::Settled => {}
            }
        }

        delivered
    }

    /// Append one output entry to an in-progress command.
    ///
    /// Precondition order: existence, ownership, non-empty text, state.
    pub fn append_output(
        &self,
        command_id: CommandId,
        requesting_agent_id: AgentId,
        text: &str,
    ) -> RelayResult<()> {
        let now = self.clock.now();
        let mut entry = self
            .store
            .entry_mut(command_id)
            .ok_or(StoreError::CommandNotFound { id: command_id })?;

        if entry.agent_id != requesting_agent_id {
            return Err(TransitionError::NotOwned {
                command_id,
                agent_id: requesting_agent_id,
            }
            .into());
        }

        if text.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "text".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        Self::settle_if_expired(&mut entry, now);
        if entry.status != CommandStatus::InProgress {
            return Err(TransitionError::InvalidState {
                command_id,
                status: entry.status,
                operation: "output",
            }
            .into());
        }

        entry.output.push(text.to_string());
        Ok(())
    }

    /// Acknowledge an in-progress command with its terminal result.
    ///
    /// Not idempotent: only the first ack wins; a second one conflicts.
    pub fn ack(
        &self,
        command_id: CommandId,
        requesting_agent_id: AgentId,
        success: bool,
        message: String,
    ) -> RelayResult<Command> {
        let now = self.clock.now();
        let mut entry = self
            .store
            .entry_mut(command_id)
            .ok_or(StoreError::CommandNotFound { id: command_id })?;

        if entry.agent_id != requesting_agent_id {
            return Err(TransitionError::NotOwned {
                command_id,
                agent_id: requesting_agent_id,
            }
            .into());
        }

        Self::settle_if_expired(&mut entry, now);
        if entry.status != CommandStatus::InProgress {
            return Err(TransitionError::InvalidState {
                command_id,
                status: entry.status,
                operation: "ack",
            }
            .into());
        }

        entry.status = CommandStatus::Acked;
        entry.acked_at = Some(now);
        entry.result = Some(CommandResult { success, message });
        tracing::info!(
            command_id = %entry.id,
            agent_id = %requesting_agent_id,
            success,
            "command acknowledged"
        );
        Ok(entry.clone())
    }

    /// Operator read of a single command.
    ///
    /// Settles pending expiry first, so a stale-but-unpolled command is
    /// reported `expired` with its `delivered_at` stamped at this read.
    pub fn get(&self, command_id: CommandId) -> RelayResult<Command> {
        let now = self.clock.now();
        let mut entry = self
            .store
            .entry_mut(command_id)
            .ok_or(StoreError::CommandNotFound { id: command_id })?;
        Self::settle_if_expired(&mut entry, now);
        Ok(entry.clone())
    }

    /// Operator listing of an agent's commands in creation order, with an
    /// optional status filter. Settles pending expiry per command first so
    /// the filter sees effective statuses.
    pub fn list(&self, agent_id: AgentId, status: Option<CommandStatus>) -> Vec<Command> {
        let now = self.clock.now();
        let mut commands = Vec::new();

        for id in self.store.ids_for_agent(agent_id) {
            let Some(mut entry) = self.store.entry_mut(id) else {
                continue;
            };
            Self::settle_if_expired(&mut entry, now);
            if status.map(|s| entry.status == s).unwrap_or(true) {
                commands.push(entry.clone());
            }
        }

        commands
    }

    /// Materialize an overdue expiry inside the caller's critical section.
    /// Idempotent: settled commands evaluate to `Settled` and are skipped.
    fn settle_if_expired(command: &mut Command, now: Timestamp) {
        if evaluate(command, now) == DeliveryVerdict::Expire {
            command.status = CommandStatus::Expired;
            command.delivered_at = Some(now);
            tracing::info!(
                command_id = %command.id,
                agent_id = %command.agent_id,
                "command expired before delivery"
            );
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
