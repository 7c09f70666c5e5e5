//! RELAY Store - Authoritative In-Memory State
//!
//! Holds the command store, the state transition engine, and the agent
//! registry. Per-command atomicity comes from the keyed map's entry guards:
//! every status check happens after acquiring the guard for that command,
//! never before, so racing polls, outputs, and acks serialize per command
//! without a global lock.
//!
//! Persistence is a collaborator concern; this crate guarantees
//! single-process correctness only.

pub mod engine;
pub mod registry;
pub mod store;

pub use engine::TransitionEngine;
pub use registry::AgentRegistry;
pub use store::CommandStore;
