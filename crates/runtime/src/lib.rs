//! Stateful services of the stealth engine.
//!
//! This crate wires the pure rules of `stealth-core` into the services a game
//! embeds: the global aggregator that fuses every signal into one score, the
//! per-AI perception agents that feed it, and an in-memory scene to run them
//! against.
//!
//! Modules are organized by responsibility:
//! - [`aggregator`] hosts [`GlobalStealthAggregator`] and its builder
//! - [`perception`] runs budgeted sight, hearing, shadow, and suspicion per agent
//! - [`registry`] routes stimuli to agents and drives their timers
//! - [`events`] provides observer lists and a topic-based event bus
//! - [`shadow`] caches the tracked subject's shadow candidate
//! - [`oracle`] and [`scenario`] provide a scene and scripted demos
//! - [`simulation`] ties them together on a fixed timestep
pub mod aggregator;
pub mod error;
pub mod events;
pub mod oracle;
pub mod perception;
pub mod registry;
pub mod scenario;
pub mod shadow;
pub mod simulation;

pub use aggregator::{
    AggregatorBuilder, GlobalStealthAggregator, RemoveResult, ResetReason, TuningSummary,
};
pub use error::{Result, RuntimeError};
pub use events::{
    Event, EventBus, PerceptionEvent, StealthEvent, SubscriptionToken, Topic,
};
pub use oracle::{Aabb, ActorSpec, OracleManager, SceneOracle};
pub use perception::{
    BlackboardSnapshot, DamageEvent, NoiseEvent, PerceptionAgent, UpdateStats,
};
pub use registry::PerceptionRegistry;
pub use scenario::{Scenario, ScenarioActor, ScenarioDirector, ScriptAction, SpawnedScenario};
pub use shadow::ShadowCandidateCache;
pub use simulation::{Simulation, SimulationBuilder, SimulationConfig, TickReport};
