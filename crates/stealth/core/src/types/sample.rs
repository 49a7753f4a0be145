//! Units of input accepted by the aggregator.

use crate::handle::ActorHandle;

/// One raw environmental observation of the tracked subject.
///
/// Values outside `[0, 1]` are clamped on ingest, never rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StealthSample {
    pub time_seconds: f64,
    pub light_exposure: f32,
    pub distance_to_nearest_enemy: f32,
    pub in_enemy_line_of_sight: bool,
    pub noise_level: f32,
    pub in_cover: bool,
}

impl StealthSample {
    /// Far enough that the proximity term contributes nothing.
    pub const DEFAULT_DISTANCE: f32 = 100_000.0;

    pub fn new(time_seconds: f64) -> Self {
        Self {
            time_seconds,
            light_exposure: 0.0,
            distance_to_nearest_enemy: Self::DEFAULT_DISTANCE,
            in_enemy_line_of_sight: false,
            noise_level: 0.0,
            in_cover: false,
        }
    }

    pub fn with_light(mut self, light_exposure: f32) -> Self {
        self.light_exposure = light_exposure;
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance_to_nearest_enemy = distance;
        self
    }

    pub fn with_line_of_sight(mut self, in_sight: bool) -> Self {
        self.in_enemy_line_of_sight = in_sight;
        self
    }

    pub fn with_noise(mut self, noise_level: f32) -> Self {
        self.noise_level = noise_level;
        self
    }

    pub fn with_cover(mut self, in_cover: bool) -> Self {
        self.in_cover = in_cover;
        self
    }
}

impl Default for StealthSample {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Channel a typed input sample feeds.
#[derive(
    Clone,
    Copy,
    Debug,
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
pub enum StealthInputKind {
    Visibility,
    Light,
    Perception,
    Noise,
    Weather,
    Custom,
}

impl StealthInputKind {
    pub const COUNT: usize = 6;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Visibility,
        Self::Light,
        Self::Perception,
        Self::Noise,
        Self::Weather,
        Self::Custom,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One typed channel sample with a confidence weight.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StealthInputSample {
    pub kind: StealthInputKind,
    pub strength01: f32,
    pub confidence01: f32,
    pub time_seconds: f64,
    pub source: Option<ActorHandle>,
}

impl StealthInputSample {
    pub fn new(kind: StealthInputKind, strength01: f32, time_seconds: f64) -> Self {
        Self {
            kind,
            strength01,
            confidence01: 1.0,
            time_seconds,
            source: None,
        }
    }

    pub fn with_confidence(mut self, confidence01: f32) -> Self {
        self.confidence01 = confidence01;
        self
    }

    pub fn with_source(mut self, source: ActorHandle) -> Self {
        self.source = Some(source);
        self
    }
}

/// Outcome of offering a typed sample to the aggregator.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum IngestDecision {
    Accepted,
    /// Arrived sooner than the per-kind minimum interval.
    Throttled,
    /// Confidence below the configured minimum.
    LowConfidence,
    /// The aggregator has been shut down.
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngestReport {
    pub kind: StealthInputKind,
    pub decision: IngestDecision,
    /// `None` when no sample of this kind was accepted before.
    pub seconds_since_last_accepted: Option<f64>,
}

impl IngestReport {
    pub fn accepted(&self) -> bool {
        self.decision == IngestDecision::Accepted
    }
}
