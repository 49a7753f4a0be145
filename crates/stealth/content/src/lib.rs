//! Data-driven stealth content and its loaders.
//!
//! Reads the files a simulation is assembled from:
//! - scoring configuration (TOML, [`stealth_core::ScoringConfig`])
//! - guard archetypes (RON, [`GuardProfile`] per archetype name)
//! - scenarios (RON, [`stealth_runtime::Scenario`])
//!
//! Content is consumed when building a simulation and never mutated at runtime.
pub mod loaders;

pub use loaders::{
    ConfigLoader, ContentFactory, GuardProfile, GuardProfileLoader, LoadResult, ScenarioLoader,
};
