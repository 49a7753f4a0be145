//! Pure data model and scoring rules of the stealth engine.
//!
//! `stealth-core` defines the configuration records, the sample and report
//! types exchanged between perceiving agents and the global aggregator, the
//! pure scoring and classification functions, and the oracle traits through
//! which the engine sees the world. It performs no I/O and owns no mutable
//! global state; the stateful services live in `stealth-runtime`.
pub mod config;
pub mod env;
pub mod error;
pub mod handle;
pub mod math;
pub mod scoring;
pub mod types;

pub use config::{GuardConfig, PerceptionConfig, ScoringConfig};
pub use env::{
    ActorOracle, ClockOracle, Env, ManualClock, MonotonicClock, PcgRng, RngOracle, StealthEnv,
    TraceHit, TraceOracle, compute_seed,
};
pub use error::{ConfigError, ErrorSeverity, OracleError, StealthError};
pub use handle::{ActorHandle, StackHandle, TeamId};
pub use math::{ScoreCurve, Vec3, clamp01};
pub use types::{
    AiAwarenessState, AiSuspicionReport, IngestDecision, IngestReport, InstigatorRelation,
    LocalSense, PerceivedTargetState, PerceptionState, PlayerStealthState, ShadowCandidate,
    SourceId, StealthFlags, StealthInputKind, StealthInputSample, StealthLevel, StealthModifier,
    StealthSample, StealthScoreBreakdown, StealthTier, SuspicionReason, TargetPointVisibility,
};
