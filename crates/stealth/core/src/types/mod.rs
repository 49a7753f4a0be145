//! Value types exchanged between reporters, agents, and the aggregator.
mod breakdown;
mod evidence;
mod modifier;
mod perception;
mod report;
mod sample;
mod shadow;
mod tier;

pub use breakdown::{PlayerStealthState, StealthFlags, StealthScoreBreakdown};
pub use evidence::{EvidenceEvent, EvidenceWindow};
pub use modifier::{SourceId, StealthModifier};
pub use perception::{
    InstigatorRelation, LocalSense, PerceivedTargetState, PerceptionState, SamplePoints,
    SuspicionReason, TargetPointVisibility,
};
pub use report::AiSuspicionReport;
pub use sample::{
    IngestDecision, IngestReport, StealthInputKind, StealthInputSample, StealthSample,
};
pub use shadow::ShadowCandidate;
pub use tier::{AiAwarenessState, StealthLevel, StealthTier};
