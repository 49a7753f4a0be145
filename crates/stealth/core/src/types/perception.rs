//! Per-agent perception records.

use arrayvec::ArrayVec;

use crate::config::TargetPointSampling;
use crate::handle::{ActorHandle, TeamId};
use crate::math::Vec3;

/// Ordered perception classification of one target (and of the agent overall).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PerceptionState {
    #[default]
    Unaware,
    SoftSuspicious,
    HardSuspicious,
    Alerted,
}

/// Outcome of one line-of-sight evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetPointVisibility {
    pub tested: u8,
    pub visible: u8,
    pub fraction: f32,
    pub any_core_visible: bool,
    /// The trace budget ran out before every point was tested.
    pub hit_trace_cap: bool,
}

impl TargetPointVisibility {
    pub fn has_line_of_sight(&self) -> bool {
        self.visible > 0
    }

    pub fn finish(&mut self) {
        self.fraction = if self.tested == 0 {
            0.0
        } else {
            f32::from(self.visible) / f32::from(self.tested)
        };
    }
}

/// Resolved sample points of a target, core points first.
pub type SamplePoints = ArrayVec<Vec3, { TargetPointSampling::MAX_POINTS }>;

/// What one agent knows about one target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerceivedTargetState {
    pub target: ActorHandle,
    /// 1 while the target is in sight this update, else 0.
    pub sight_score: f32,
    /// Set by noise reports; decays linearly.
    pub hearing_score: f32,
    pub awareness: f32,
    pub state: PerceptionState,
    pub last_known_location: Option<Vec3>,
    pub time_since_last_seen: f32,
    pub last_visibility: TargetPointVisibility,
}

impl PerceivedTargetState {
    pub fn new(target: ActorHandle) -> Self {
        Self {
            target,
            sight_score: 0.0,
            hearing_score: 0.0,
            awareness: 0.0,
            state: PerceptionState::Unaware,
            last_known_location: None,
            time_since_last_seen: 0.0,
            last_visibility: TargetPointVisibility::default(),
        }
    }
}

/// Sense that currently drives an agent's suspicion.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum LocalSense {
    #[default]
    None,
    Sight,
    Hearing,
    Shadow,
    Damage,
}

/// Why an AI reported suspicion.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SuspicionReason {
    #[default]
    Generic,
    Sight,
    Hearing,
    Shadow,
    Damage,
    Scripted,
}

impl From<LocalSense> for SuspicionReason {
    fn from(sense: LocalSense) -> Self {
        match sense {
            LocalSense::None => Self::Generic,
            LocalSense::Sight => Self::Sight,
            LocalSense::Hearing => Self::Hearing,
            LocalSense::Shadow => Self::Shadow,
            LocalSense::Damage => Self::Damage,
        }
    }
}

/// Relation of a stimulus instigator to the perceiving agent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum InstigatorRelation {
    SelfActor,
    Friendly,
    Neutral,
    Hostile,
    Unknown,
}

impl InstigatorRelation {
    pub fn classify(
        owner: ActorHandle,
        owner_team: Option<TeamId>,
        instigator: Option<ActorHandle>,
        instigator_team: Option<TeamId>,
    ) -> Self {
        let Some(instigator) = instigator else {
            return Self::Unknown;
        };
        if instigator == owner {
            return Self::SelfActor;
        }
        match (owner_team, instigator_team) {
            (Some(a), Some(b)) if a.is_neutral() || b.is_neutral() => Self::Neutral,
            (Some(a), Some(b)) if a == b => Self::Friendly,
            (Some(_), Some(_)) => Self::Hostile,
            _ => Self::Unknown,
        }
    }
}
