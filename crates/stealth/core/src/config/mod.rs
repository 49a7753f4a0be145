//! Tunable configuration records.
//!
//! [`ScoringConfig`] is process-wide and owned by the aggregator's config
//! stack. [`PerceptionConfig`] and [`GuardConfig`] are per agent.
mod guard;
mod perception;
mod scoring;

pub use guard::{
    DamagePolicy, GuardConfig, NoisePolicy, RelationFilter, SpottedHysteresis,
    SuspicionReporting,
};
pub use perception::{
    PerceptionConfig, PerceptionThresholds, ShadowAwareness, TargetPointSampling,
    VisibilityScaling,
};
pub use scoring::{
    AlertnessConfig, AwarenessThresholds, BlendWeights, EvidenceConfig, IngestTuning,
    LevelThresholds, SampleWeights, ScoringConfig, ShadowCacheConfig, TierHysteresis,
    TierThresholds,
};
