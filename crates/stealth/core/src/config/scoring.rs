//! Global scoring configuration consumed by the stealth aggregator.
//!
//! Every group deserializes with defaults so partial TOML files load. Use
//! [`ScoringConfig::sanitized`] before consuming a config from an untrusted
//! source; it repairs rather than rejects.

use crate::error::ConfigError;
use crate::math::clamp01;
use crate::types::{AiAwarenessState, StealthInputKind};

/// Weights of the per-sample local visibility blend.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SampleWeights {
    pub light: f32,
    pub line_of_sight: f32,
    pub distance: f32,
    pub noise: f32,
    /// Distance at which the proximity term reaches zero. Never below 1.
    pub distance_clamp: f32,
    /// Applied to the local score when the sample reports cover.
    pub cover_multiplier: f32,
}

impl SampleWeights {
    pub const DEFAULT_LIGHT: f32 = 0.5;
    pub const DEFAULT_LINE_OF_SIGHT: f32 = 0.3;
    pub const DEFAULT_DISTANCE: f32 = 0.1;
    pub const DEFAULT_NOISE: f32 = 0.1;
    pub const DEFAULT_DISTANCE_CLAMP: f32 = 3000.0;
    pub const DEFAULT_COVER_MULTIPLIER: f32 = 0.6;
}

impl Default for SampleWeights {
    fn default() -> Self {
        Self {
            light: Self::DEFAULT_LIGHT,
            line_of_sight: Self::DEFAULT_LINE_OF_SIGHT,
            distance: Self::DEFAULT_DISTANCE,
            noise: Self::DEFAULT_NOISE,
            distance_clamp: Self::DEFAULT_DISTANCE_CLAMP,
            cover_multiplier: Self::DEFAULT_COVER_MULTIPLIER,
        }
    }
}

/// Weights of the global `local visibility` / `AI suspicion` blend.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlendWeights {
    pub local_visibility: f32,
    pub ai_suspicion: f32,
    /// Fraction of local visibility removed at full weather intensity.
    pub weather_damping: f32,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            local_visibility: 0.5,
            ai_suspicion: 0.5,
            weather_damping: 0.25,
        }
    }
}

/// Upper bounds (inclusive) of the five discrete stealth levels.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LevelThresholds {
    pub undetected_max: f32,
    pub low_risk_max: f32,
    pub medium_risk_max: f32,
    pub high_risk_max: f32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            undetected_max: 0.10,
            low_risk_max: 0.35,
            medium_risk_max: 0.65,
            high_risk_max: 0.99,
        }
    }
}

/// Lower bounds (inclusive) of the four stealth tiers above `Hidden`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TierThresholds {
    pub cautious_min: f32,
    pub danger_min: f32,
    pub compromised_min: f32,
}

impl TierThresholds {
    pub fn new(cautious_min: f32, danger_min: f32, compromised_min: f32) -> Self {
        Self {
            cautious_min,
            danger_min,
            compromised_min,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self::new(0.2, 0.5, 0.8)
    }
}

/// Debouncing applied to the published tier.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TierHysteresis {
    pub enabled: bool,
    /// A tier is not left downward until the score drops below its threshold
    /// minus this padding.
    pub padding: f32,
    /// Changes closer together than this are deferred. 0 disables.
    pub min_seconds_between_tier_changes: f32,
    /// Half-life of the exponential smoothing of the published score. 0 disables.
    pub smoothing_half_life_seconds: f32,
}

impl Default for TierHysteresis {
    fn default() -> Self {
        Self {
            enabled: false,
            padding: 0.05,
            min_seconds_between_tier_changes: 0.0,
            smoothing_half_life_seconds: 0.0,
        }
    }
}

/// Tuning of the rate-limited shadow candidate cache.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShadowCacheConfig {
    pub enabled: bool,
    pub update_interval_seconds: f32,
    pub cast_distance: f32,
    pub min_illumination: f32,
    pub trace_origin_height: f32,
}

impl ShadowCacheConfig {
    pub const MIN_UPDATE_INTERVAL: f32 = 0.01;
}

impl Default for ShadowCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_interval_seconds: 0.25,
            cast_distance: 600.0,
            min_illumination: 0.65,
            trace_origin_height: 50.0,
        }
    }
}

/// Throttling and confidence gate of typed input samples.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IngestTuning {
    pub visibility_min_interval: f32,
    pub light_min_interval: f32,
    pub perception_min_interval: f32,
    pub noise_min_interval: f32,
    pub weather_min_interval: f32,
    pub custom_min_interval: f32,
    pub min_confidence: f32,
}

impl IngestTuning {
    pub fn min_interval(&self, kind: StealthInputKind) -> f32 {
        match kind {
            StealthInputKind::Visibility => self.visibility_min_interval,
            StealthInputKind::Light => self.light_min_interval,
            StealthInputKind::Perception => self.perception_min_interval,
            StealthInputKind::Noise => self.noise_min_interval,
            StealthInputKind::Weather => self.weather_min_interval,
            StealthInputKind::Custom => self.custom_min_interval,
        }
    }
}

impl Default for IngestTuning {
    fn default() -> Self {
        Self {
            visibility_min_interval: 0.0,
            light_min_interval: 0.05,
            perception_min_interval: 0.0,
            noise_min_interval: 0.0,
            weather_min_interval: 0.5,
            custom_min_interval: 0.0,
            min_confidence: 0.0,
        }
    }
}

/// Bounded history of suspicion reports per AI.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvidenceConfig {
    pub enabled: bool,
    pub window_seconds: f32,
    /// Capped at [`crate::types::EvidenceWindow::CAPACITY`].
    pub max_events: usize,
    /// Reports below this suspicion are not counted as evidence.
    pub min_event_suspicion: f32,
    pub points_per_event: f32,
    pub max_bonus: f32,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_seconds: 8.0,
            max_events: 16,
            min_event_suspicion: 0.1,
            points_per_event: 0.05,
            max_bonus: 0.25,
        }
    }
}

/// Suspicion cutoffs of the per-AI awareness classification.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AwarenessThresholds {
    pub suspicious_min: f32,
    pub investigating_min: f32,
    pub alerted_min: f32,
}

impl Default for AwarenessThresholds {
    fn default() -> Self {
        Self {
            suspicious_min: 0.25,
            investigating_min: 0.6,
            alerted_min: 0.9,
        }
    }
}

/// Global alertness: a slowly decaying summary of recent AI awareness.
///
/// Each accepted report raises alertness to at least the weight of the
/// reporter's awareness state. It decays once no raise happened for
/// `decay_delay_seconds`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlertnessConfig {
    pub enabled: bool,
    pub decay_per_second: f32,
    pub decay_delay_seconds: f32,
    pub calm_weight: f32,
    pub suspicious_weight: f32,
    pub investigating_weight: f32,
    pub alerted_weight: f32,
    pub change_epsilon: f32,
}

impl Default for AlertnessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            decay_per_second: 0.05,
            decay_delay_seconds: 3.0,
            calm_weight: 0.0,
            suspicious_weight: 0.5,
            investigating_weight: 0.75,
            alerted_weight: 1.0,
            change_epsilon: 0.001,
        }
    }
}

impl AlertnessConfig {
    pub fn weight_for(&self, state: AiAwarenessState) -> f32 {
        let weight = match state {
            AiAwarenessState::Calm => self.calm_weight,
            AiAwarenessState::Suspicious => self.suspicious_weight,
            AiAwarenessState::Investigating => self.investigating_weight,
            AiAwarenessState::Alerted => self.alerted_weight,
        };
        clamp01(weight)
    }
}

/// Complete tuning record of the stealth aggregator.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScoringConfig {
    pub weights: SampleWeights,
    pub blend: BlendWeights,
    pub levels: LevelThresholds,
    pub tiers: TierThresholds,
    pub hysteresis: TierHysteresis,
    pub shadow: ShadowCacheConfig,
    pub ingest: IngestTuning,
    pub evidence: EvidenceConfig,
    pub awareness: AwarenessThresholds,
    pub alertness: AlertnessConfig,
}

impl ScoringConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiers(mut self, tiers: TierThresholds) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_blend(mut self, local_visibility: f32, ai_suspicion: f32) -> Self {
        self.blend.local_visibility = local_visibility;
        self.blend.ai_suspicion = ai_suspicion;
        self
    }

    pub fn with_hysteresis(mut self, hysteresis: TierHysteresis) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    /// Reports the first violated invariant, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending field or group.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weights.light", self.weights.light),
            ("weights.line_of_sight", self.weights.line_of_sight),
            ("weights.distance", self.weights.distance),
            ("weights.noise", self.weights.noise),
            ("blend.local_visibility", self.blend.local_visibility),
            ("blend.ai_suspicion", self.blend.ai_suspicion),
        ];
        for (field, value) in weights {
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeWeight { field, value });
            }
        }

        let tiers = &self.tiers;
        if !(tiers.cautious_min < tiers.danger_min && tiers.danger_min < tiers.compromised_min) {
            return Err(ConfigError::NonMonotonicThresholds { group: "tiers" });
        }

        let levels = &self.levels;
        if !(levels.undetected_max <= levels.low_risk_max
            && levels.low_risk_max <= levels.medium_risk_max
            && levels.medium_risk_max <= levels.high_risk_max)
        {
            return Err(ConfigError::NonMonotonicThresholds { group: "levels" });
        }

        let awareness = &self.awareness;
        if !(awareness.suspicious_min <= awareness.investigating_min
            && awareness.investigating_min <= awareness.alerted_min)
        {
            return Err(ConfigError::NonMonotonicThresholds { group: "awareness" });
        }

        if !(self.weights.distance_clamp >= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "weights.distance_clamp",
                value: self.weights.distance_clamp,
            });
        }

        Ok(())
    }

    /// Returns a copy that is safe to consume even when [`validate`] fails.
    ///
    /// Weights are floored at zero and thresholds clamped to `[0, 1]` and forced
    /// non-decreasing. Intervals are floored at their minimums.
    ///
    /// [`validate`]: Self::validate
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();

        let w = &mut out.weights;
        w.light = non_negative(w.light);
        w.line_of_sight = non_negative(w.line_of_sight);
        w.distance = non_negative(w.distance);
        w.noise = non_negative(w.noise);
        w.distance_clamp = if w.distance_clamp.is_finite() {
            w.distance_clamp.max(1.0)
        } else {
            SampleWeights::DEFAULT_DISTANCE_CLAMP
        };
        w.cover_multiplier = non_negative(w.cover_multiplier);

        let b = &mut out.blend;
        b.local_visibility = non_negative(b.local_visibility);
        b.ai_suspicion = non_negative(b.ai_suspicion);
        b.weather_damping = clamp01(b.weather_damping);

        let [cautious, danger, compromised] = monotonic([
            out.tiers.cautious_min,
            out.tiers.danger_min,
            out.tiers.compromised_min,
        ]);
        out.tiers = TierThresholds::new(cautious, danger, compromised);

        let [undetected, low, medium, high] = monotonic([
            out.levels.undetected_max,
            out.levels.low_risk_max,
            out.levels.medium_risk_max,
            out.levels.high_risk_max,
        ]);
        out.levels = LevelThresholds {
            undetected_max: undetected,
            low_risk_max: low,
            medium_risk_max: medium,
            high_risk_max: high,
        };

        let [suspicious, investigating, alerted] = monotonic([
            out.awareness.suspicious_min,
            out.awareness.investigating_min,
            out.awareness.alerted_min,
        ]);
        out.awareness = AwarenessThresholds {
            suspicious_min: suspicious,
            investigating_min: investigating,
            alerted_min: alerted,
        };

        let h = &mut out.hysteresis;
        h.padding = clamp01(h.padding);
        h.min_seconds_between_tier_changes = non_negative(h.min_seconds_between_tier_changes);
        h.smoothing_half_life_seconds = non_negative(h.smoothing_half_life_seconds);

        let s = &mut out.shadow;
        s.update_interval_seconds = s
            .update_interval_seconds
            .max(ShadowCacheConfig::MIN_UPDATE_INTERVAL);
        s.cast_distance = non_negative(s.cast_distance);
        s.min_illumination = clamp01(s.min_illumination);

        out.ingest.min_confidence = clamp01(out.ingest.min_confidence);

        let e = &mut out.evidence;
        e.window_seconds = non_negative(e.window_seconds);
        e.points_per_event = non_negative(e.points_per_event);
        e.max_bonus = clamp01(e.max_bonus);
        e.min_event_suspicion = clamp01(e.min_event_suspicion);

        let a = &mut out.alertness;
        a.decay_per_second = non_negative(a.decay_per_second);
        a.decay_delay_seconds = non_negative(a.decay_delay_seconds);
        a.change_epsilon = non_negative(a.change_epsilon);

        out
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

fn monotonic<const N: usize>(mut values: [f32; N]) -> [f32; N] {
    let mut floor = 0.0_f32;
    for value in &mut values {
        *value = clamp01(*value).max(floor);
        floor = *value;
    }
    values
}
