//! Unified error type surfaced by the runtime API.
//!
//! Engine operations degrade silently; these errors cover construction,
//! registration, and scenario loading where the caller must react.
use thiserror::Error;

use stealth_core::ActorHandle;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("aggregator requires a clock to be configured before building")]
    MissingClock,

    #[error("a perception agent is already registered for owner {0}")]
    DuplicateAgent(ActorHandle),

    #[error("actor {0} is not live")]
    UnknownActor(ActorHandle),

    #[error("scenario references unknown actor name '{0}'")]
    UnknownActorName(String),

    #[error("invalid scenario: {0}")]
    Scenario(String),
}
