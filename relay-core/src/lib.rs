//! RELAY Core - Command Dispatch Types
//!
//! Pure data structures and pure functions with no I/O. All other crates
//! depend on this. The delivery evaluator lives here because it is a pure
//! function of `(command, now)`; materializing its verdict is the job of
//! the transition engine in `relay-store`.

pub mod agent;
pub mod clock;
pub mod command;
pub mod delivery;
pub mod error;
pub mod identity;

pub use agent::Agent;
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use command::{
    Command, CommandResult, CommandStatus, CommandStatusParseError, CommandType,
    CommandTypeParseError,
};
pub use delivery::{evaluate, DeliveryVerdict};
pub use error::{
    RegistryError, RelayError, RelayResult, StoreError, TransitionError, ValidationError,
};
pub use identity::{hash_api_key, new_entity_id, AgentId, CommandId, EntityId, Timestamp};
