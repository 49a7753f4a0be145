//! Per-agent perception tuning: sight, budgets, visibility scaling, shadow checks.

use crate::math::ScoreCurve;
use crate::types::PerceptionState;

/// Awareness cutoffs of the four perception states.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PerceptionThresholds {
    pub soft_suspicious: f32,
    pub hard_suspicious: f32,
    pub alerted: f32,
}

impl PerceptionThresholds {
    pub fn state_for(&self, awareness: f32) -> PerceptionState {
        if awareness >= self.alerted {
            PerceptionState::Alerted
        } else if awareness >= self.hard_suspicious {
            PerceptionState::HardSuspicious
        } else if awareness >= self.soft_suspicious {
            PerceptionState::SoftSuspicious
        } else {
            PerceptionState::Unaware
        }
    }
}

impl Default for PerceptionThresholds {
    fn default() -> Self {
        Self {
            soft_suspicious: 0.25,
            hard_suspicious: 0.6,
            alerted: 0.9,
        }
    }
}

/// Which points on a target are traced in multi-point mode.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetPointSampling {
    /// Off selects the single-point legacy trace.
    pub enabled: bool,
    /// Socket names in priority order; the first [`Self::CORE_POINTS`] are core.
    pub socket_names: Vec<String>,
    pub max_points: usize,
    pub early_out_on_core_visible: bool,
    /// Trace a single chest-height point when no socket resolves.
    pub use_fallback_point: bool,
}

impl TargetPointSampling {
    pub const CORE_POINTS: usize = 3;
    /// Hard cap on traced points per target.
    pub const MAX_POINTS: usize = 8;
}

impl Default for TargetPointSampling {
    fn default() -> Self {
        Self {
            enabled: false,
            socket_names: vec!["head".into(), "spine_03".into(), "pelvis".into()],
            max_points: 3,
            early_out_on_core_visible: true,
            use_fallback_point: true,
        }
    }
}

/// Maps a visible-point fraction to a suspicion gain multiplier.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VisibilityScaling {
    pub enabled: bool,
    pub min_visible_fraction: f32,
    pub min_multiplier: f32,
    pub max_multiplier: f32,
    /// A visible core point jumps straight to `max_multiplier`.
    pub core_shortcut: bool,
    /// Floor applied when a core point is visible but the shortcut is off.
    pub core_multiplier: f32,
}

impl Default for VisibilityScaling {
    fn default() -> Self {
        Self {
            enabled: true,
            min_visible_fraction: 0.10,
            min_multiplier: 0.35,
            max_multiplier: 1.0,
            core_shortcut: true,
            core_multiplier: 1.0,
        }
    }
}

/// Rate-limited checks of the cached shadow candidate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShadowAwareness {
    pub enabled: bool,
    pub min_illumination: f32,
    pub max_distance: f32,
    pub check_interval_seconds: f32,
    pub max_traces_per_second: u32,
    /// Landing this close to the shadow point still counts as visible.
    pub visible_tolerance: f32,
}

impl ShadowAwareness {
    pub const MIN_INTERVAL: f32 = 0.05;
    pub const JITTER_FRACTION: f32 = 0.25;
}

impl Default for ShadowAwareness {
    fn default() -> Self {
        Self {
            enabled: false,
            min_illumination: 0.65,
            max_distance: 1200.0,
            check_interval_seconds: 0.40,
            max_traces_per_second: 2,
            visible_tolerance: 25.0,
        }
    }
}

/// Complete perception tuning of one agent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PerceptionConfig {
    pub max_sight_distance: f32,
    pub peripheral_sight_distance: f32,
    pub core_fov_degrees: f32,
    pub peripheral_fov_degrees: f32,
    pub core_detection_speed: f32,
    pub peripheral_detection_speed: f32,
    pub detection_decay_per_second: f32,
    pub suspicion_decay_per_second: f32,
    pub thresholds: PerceptionThresholds,

    pub hearing_radius_quiet: f32,
    pub hearing_radius_loud: f32,

    pub target_points: TargetPointSampling,
    pub visibility: VisibilityScaling,
    pub shadow: ShadowAwareness,

    /// 0 evaluates every target each update.
    pub max_targets_per_update: usize,
    /// 0 means unlimited.
    pub max_traces_per_update: u32,

    /// Scales detection speed by the global stealth score. Absent means 1.0.
    pub stealth_score_curve: Option<ScoreCurve>,

    pub eye_height: f32,
    pub legacy_point_height: f32,
    pub fallback_point_height: f32,

    pub update_interval_seconds: f32,
    pub telemetry_interval_seconds: f32,
}

impl PerceptionConfig {
    pub const DEFAULT_MAX_SIGHT_DISTANCE: f32 = 2500.0;
    pub const DEFAULT_UPDATE_INTERVAL: f32 = 0.2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_targets_per_update(mut self, max: usize) -> Self {
        self.max_targets_per_update = max;
        self
    }

    pub fn with_max_traces_per_update(mut self, max: u32) -> Self {
        self.max_traces_per_update = max;
        self
    }

    pub fn with_multi_point(mut self, enabled: bool) -> Self {
        self.target_points.enabled = enabled;
        self
    }

    pub fn with_shadow_awareness(mut self, shadow: ShadowAwareness) -> Self {
        self.shadow = shadow;
        self
    }

    /// Detection speed multiplier for the given global stealth score.
    pub fn stealth_multiplier(&self, stealth_score01: f32) -> f32 {
        self.stealth_score_curve
            .as_ref()
            .map_or(1.0, |curve| curve.evaluate(stealth_score01).max(0.0))
    }

    /// Hearing radius for a normalized loudness.
    pub fn hearing_radius(&self, loudness01: f32) -> f32 {
        crate::math::lerp(
            self.hearing_radius_quiet,
            self.hearing_radius_loud,
            crate::math::clamp01(loudness01),
        )
    }
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            max_sight_distance: Self::DEFAULT_MAX_SIGHT_DISTANCE,
            peripheral_sight_distance: 2000.0,
            core_fov_degrees: 70.0,
            peripheral_fov_degrees: 110.0,
            core_detection_speed: 1.0,
            peripheral_detection_speed: 0.5,
            detection_decay_per_second: 0.75,
            suspicion_decay_per_second: 0.1,
            thresholds: PerceptionThresholds::default(),
            hearing_radius_quiet: 600.0,
            hearing_radius_loud: 1600.0,
            target_points: TargetPointSampling::default(),
            visibility: VisibilityScaling::default(),
            shadow: ShadowAwareness::default(),
            max_targets_per_update: 2,
            max_traces_per_update: 8,
            stealth_score_curve: None,
            eye_height: 80.0,
            legacy_point_height: 80.0,
            fallback_point_height: 60.0,
            update_interval_seconds: Self::DEFAULT_UPDATE_INTERVAL,
            telemetry_interval_seconds: 1.5,
        }
    }
}
