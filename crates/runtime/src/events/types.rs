//! Event payloads for the stealth and perception topics.

use serde::{Deserialize, Serialize};

use stealth_core::{
    ActorHandle, AiAwarenessState, AiSuspicionReport, PerceptionState, StealthLevel,
    StealthScoreBreakdown, StealthTier, Vec3,
};

/// Discrete five-way level transition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelTransition {
    pub old: StealthLevel,
    pub new: StealthLevel,
    pub score: f32,
}

/// Four-way tier transition after hysteresis and dwell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierTransition {
    pub old: StealthTier,
    pub new: StealthTier,
    pub score: f32,
    pub time_seconds: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionChange {
    pub detected: bool,
    /// Reporter whose call caused the flip.
    pub source: Option<ActorHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwarenessTransition {
    pub subject: ActorHandle,
    pub old: AiAwarenessState,
    pub new: AiAwarenessState,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertnessChange {
    pub old: f32,
    pub new: f32,
}

/// Notifications published by the global aggregator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StealthEvent {
    /// Level-triggered: every recompute.
    ScoreUpdated(StealthScoreBreakdown),
    /// Level-triggered: every accepted AI report.
    SuspicionReported(AiSuspicionReport),
    LevelChanged(LevelTransition),
    TierChanged(TierTransition),
    DetectionChanged(DetectionChange),
    AwarenessChanged(AwarenessTransition),
    AlertnessChanged(AlertnessChange),
}

/// Notifications published by one perception agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PerceptionEvent {
    StateChanged {
        owner: ActorHandle,
        old: PerceptionState,
        new: PerceptionState,
    },
    TargetPerceptionChanged {
        owner: ActorHandle,
        target: ActorHandle,
        old: PerceptionState,
        new: PerceptionState,
        awareness: f32,
    },
    Spotted {
        owner: ActorHandle,
        suspicion01: f32,
    },
    Lost {
        owner: ActorHandle,
        suspicion01: f32,
    },
    /// Suspicion reached its maximum.
    FullyAlerted { owner: ActorHandle },
    /// Suspicion fell below the calm threshold.
    LostSight { owner: ActorHandle },
    /// Level-triggered and throttled.
    SuspicionChanged {
        owner: ActorHandle,
        suspicion01: f32,
        location: Option<Vec3>,
    },
}

impl PerceptionEvent {
    pub fn owner(&self) -> ActorHandle {
        match self {
            Self::StateChanged { owner, .. }
            | Self::TargetPerceptionChanged { owner, .. }
            | Self::Spotted { owner, .. }
            | Self::Lost { owner, .. }
            | Self::FullyAlerted { owner }
            | Self::LostSight { owner }
            | Self::SuspicionChanged { owner, .. } => *owner,
        }
    }

    /// Whether this is a level-triggered notification.
    pub fn is_level_triggered(&self) -> bool {
        matches!(self, Self::SuspicionChanged { .. })
    }
}
