//! Pure scoring functions shared by the aggregator and perception agents.

use crate::config::{BlendWeights, SampleWeights, VisibilityScaling};
use crate::math::{EPSILON, clamp01, lerp};
use crate::types::{StealthModifier, StealthSample, TargetPointVisibility};

/// Local visibility of one raw sample.
///
/// Light, line of sight, proximity, and noise each add their weighted term.
/// Cover then scales the sum. Every input is clamped first.
pub fn sample_visibility(sample: &StealthSample, weights: &SampleWeights) -> f32 {
    let light = clamp01(sample.light_exposure);
    let noise = clamp01(sample.noise_level);
    let distance = if sample.distance_to_nearest_enemy.is_nan() {
        SampleWeights::DEFAULT_DISTANCE_CLAMP
    } else {
        sample.distance_to_nearest_enemy.max(0.0)
    };
    let proximity = 1.0 - clamp01(distance / weights.distance_clamp.max(1.0));

    let mut score = light * weights.light
        + if sample.in_enemy_line_of_sight {
            weights.line_of_sight
        } else {
            0.0
        }
        + proximity * weights.distance
        + noise * weights.noise;

    if sample.in_cover {
        score *= weights.cover_multiplier;
    }
    clamp01(score)
}

/// Weighted blend of local visibility and AI suspicion, clamped to `[0, 1]`.
pub fn blend_combined(local_visibility01: f32, ai_suspicion01: f32, blend: &BlendWeights) -> f32 {
    clamp01(
        blend.local_visibility * clamp01(local_visibility01)
            + blend.ai_suspicion * clamp01(ai_suspicion01),
    )
}

/// Aggregate of every live modifier.
///
/// Multipliers combine as a product and offsets as a sum, so the result does
/// not depend on insertion order.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierTotals {
    pub light_multiplier: f32,
    pub visibility_multiplier: f32,
    pub light_offset01: f32,
    pub score_offset01: f32,
}

impl ModifierTotals {
    pub const IDENTITY: Self = Self {
        light_multiplier: 1.0,
        visibility_multiplier: 1.0,
        light_offset01: 0.0,
        score_offset01: 0.0,
    };

    pub fn from_modifiers<'a>(modifiers: impl IntoIterator<Item = &'a StealthModifier>) -> Self {
        modifiers
            .into_iter()
            .fold(Self::IDENTITY, |mut totals, modifier| {
                totals.light_multiplier *= finite_or(modifier.light_multiplier, 1.0).max(0.0);
                totals.visibility_multiplier *=
                    finite_or(modifier.visibility_multiplier, 1.0).max(0.0);
                totals.light_offset01 += finite_or(modifier.light_offset01, 0.0);
                totals.score_offset01 += finite_or(modifier.global_score_offset01, 0.0);
                totals
            })
    }

    pub fn apply_light(&self, light01: f32) -> f32 {
        clamp01(clamp01(light01) * self.light_multiplier + self.light_offset01)
    }

    pub fn apply_visibility(&self, visibility01: f32) -> f32 {
        clamp01(clamp01(visibility01) * self.visibility_multiplier)
    }

    pub fn apply_score(&self, combined01: f32) -> f32 {
        clamp01(clamp01(combined01) * self.visibility_multiplier + self.score_offset01)
    }
}

impl Default for ModifierTotals {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// `effective / combined`, defined as 1 when nothing was combined.
pub fn modifier_multiplier(combined01: f32, effective01: f32) -> f32 {
    if combined01 <= EPSILON {
        1.0
    } else {
        effective01 / combined01
    }
}

/// Suspicion gain multiplier for a multi-point visibility result.
pub fn visibility_suspicion_multiplier(
    visibility: &TargetPointVisibility,
    scaling: &VisibilityScaling,
) -> f32 {
    if !scaling.enabled {
        return 1.0;
    }
    if visibility.tested == 0 || visibility.visible == 0 {
        return 0.0;
    }
    let fraction = clamp01(visibility.fraction);
    let min_fraction = clamp01(scaling.min_visible_fraction);
    if fraction < min_fraction {
        return 0.0;
    }
    if scaling.core_shortcut && visibility.any_core_visible {
        return scaling.max_multiplier.max(0.0);
    }

    let span = 1.0 - min_fraction;
    let t = if span <= EPSILON {
        1.0
    } else {
        clamp01((fraction - min_fraction) / span)
    };
    let mut multiplier = lerp(scaling.min_multiplier, scaling.max_multiplier, t);
    if !scaling.core_shortcut && visibility.any_core_visible {
        multiplier = multiplier.max(scaling.core_multiplier);
    }
    multiplier.max(0.0)
}

/// Blend factor of exponential smoothing for a step of `dt` seconds.
///
/// A non-positive half-life disables smoothing (factor 1). No elapsed time
/// means no movement (factor 0).
pub fn smoothing_alpha(dt_seconds: f64, half_life_seconds: f32) -> f32 {
    if half_life_seconds <= 0.0 {
        return 1.0;
    }
    if dt_seconds <= 0.0 {
        return 0.0;
    }
    let exponent = dt_seconds / f64::from(half_life_seconds);
    clamp01((1.0 - 0.5_f64.powf(exponent)) as f32)
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
