//! Suspicion model and stimulus policies of a guard.

use std::collections::BTreeMap;

use crate::types::{InstigatorRelation, PerceptionState};

/// Which instigator relations a stimulus policy ignores.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RelationFilter {
    pub ignore_self: bool,
    pub ignore_friendly: bool,
    pub ignore_neutral: bool,
    pub ignore_unknown: bool,
}

impl RelationFilter {
    pub fn allows(&self, relation: InstigatorRelation) -> bool {
        match relation {
            InstigatorRelation::SelfActor => !self.ignore_self,
            InstigatorRelation::Friendly => !self.ignore_friendly,
            InstigatorRelation::Neutral => !self.ignore_neutral,
            InstigatorRelation::Unknown => !self.ignore_unknown,
            InstigatorRelation::Hostile => true,
        }
    }
}

impl Default for RelationFilter {
    fn default() -> Self {
        Self {
            ignore_self: true,
            ignore_friendly: true,
            ignore_neutral: false,
            ignore_unknown: false,
        }
    }
}

/// How one kind of noise moves suspicion.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NoisePolicy {
    pub suspicion_delta01: f32,
    pub loudness_scale: f32,
    /// 0 disables the range gate.
    pub max_range: f32,
    pub cooldown_seconds: f32,
}

impl Default for NoisePolicy {
    fn default() -> Self {
        Self {
            suspicion_delta01: GuardConfig::DEFAULT_HEARING_PER_EVENT,
            loudness_scale: 1.0,
            max_range: 0.0,
            cooldown_seconds: 0.0,
        }
    }
}

/// How one kind of damage moves suspicion.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamagePolicy {
    pub suspicion_impulse01: f32,
    pub scale_by_damage: bool,
    /// Damage amount that yields a scale of 1.
    pub damage_reference: f32,
    pub max_scale: f32,
    /// 0 disables the range gate.
    pub max_range: f32,
    pub cooldown_seconds: f32,
    pub always_report: bool,
    pub force_minimum_state: Option<PerceptionState>,
}

impl DamagePolicy {
    /// Multiplier applied to the impulse for a damage amount.
    pub fn severity_scale(&self, amount: f32) -> f32 {
        if !self.scale_by_damage {
            return 1.0;
        }
        if self.damage_reference <= 0.0 || !amount.is_finite() {
            return 1.0;
        }
        (amount / self.damage_reference).clamp(0.0, self.max_scale.max(0.0))
    }
}

impl Default for DamagePolicy {
    fn default() -> Self {
        Self {
            suspicion_impulse01: 0.35,
            scale_by_damage: true,
            damage_reference: 25.0,
            max_scale: 2.0,
            max_range: 0.0,
            cooldown_seconds: 0.25,
            always_report: true,
            force_minimum_state: None,
        }
    }
}

/// Spotted/lost hysteresis of the suspicion model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpottedHysteresis {
    pub enabled: bool,
    pub spotted_threshold01: f32,
    /// Only used when enabled; otherwise lost mirrors spotted.
    pub lost_threshold01: f32,
    pub min_seconds_in_spotted: f32,
    pub min_seconds_between_flips: f32,
}

impl SpottedHysteresis {
    pub fn effective_lost_threshold(&self) -> f32 {
        if self.enabled {
            self.lost_threshold01.min(self.spotted_threshold01)
        } else {
            self.spotted_threshold01
        }
    }
}

impl Default for SpottedHysteresis {
    fn default() -> Self {
        Self {
            enabled: true,
            spotted_threshold01: 0.9,
            lost_threshold01: 0.85,
            min_seconds_in_spotted: 0.0,
            min_seconds_between_flips: 0.0,
        }
    }
}

/// Throttle of reports pushed to the global aggregator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SuspicionReporting {
    pub enabled: bool,
    pub min_interval_seconds: f32,
    pub min_delta01: f32,
}

impl Default for SuspicionReporting {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_seconds: 0.15,
            min_delta01: 0.01,
        }
    }
}

/// Complete suspicion tuning of one guard.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GuardConfig {
    pub sight_suspicion_per_second: f32,
    pub hearing_ramp_per_second: f32,
    pub shadow_ramp_per_second: f32,
    pub damage_ramp_per_second: f32,
    pub suspicion_decay_per_second: f32,
    pub max_suspicion: f32,
    /// Decay only starts this long after the last stimulus.
    pub stimulus_forget_delay_seconds: f32,

    pub spotted: SpottedHysteresis,
    pub change_epsilon01: f32,
    pub change_event_min_interval_seconds: f32,
    pub reporting: SuspicionReporting,

    pub default_noise: NoisePolicy,
    pub noise_by_tag: BTreeMap<String, NoisePolicy>,
    pub noise_relations: RelationFilter,

    pub default_damage: DamagePolicy,
    pub damage_by_tag: BTreeMap<String, DamagePolicy>,
    pub damage_relations: RelationFilter,
}

impl GuardConfig {
    pub const DEFAULT_HEARING_PER_EVENT: f32 = 0.15;
    /// Below this fraction of the maximum, suspicion counts as calm.
    pub const CALM_FRACTION: f32 = 0.2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn noise_policy(&self, tag: Option<&str>) -> &NoisePolicy {
        tag.and_then(|tag| self.noise_by_tag.get(tag))
            .unwrap_or(&self.default_noise)
    }

    pub fn damage_policy(&self, tag: Option<&str>) -> &DamagePolicy {
        tag.and_then(|tag| self.damage_by_tag.get(tag))
            .unwrap_or(&self.default_damage)
    }

    pub fn calm_threshold(&self) -> f32 {
        self.max_suspicion.max(0.0) * Self::CALM_FRACTION
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            sight_suspicion_per_second: 0.25,
            hearing_ramp_per_second: 0.75,
            shadow_ramp_per_second: 0.12,
            damage_ramp_per_second: 0.0,
            suspicion_decay_per_second: 0.1,
            max_suspicion: 1.0,
            stimulus_forget_delay_seconds: 0.0,
            spotted: SpottedHysteresis::default(),
            change_epsilon01: 0.01,
            change_event_min_interval_seconds: 0.10,
            reporting: SuspicionReporting::default(),
            default_noise: NoisePolicy::default(),
            noise_by_tag: BTreeMap::new(),
            noise_relations: RelationFilter::default(),
            default_damage: DamagePolicy::default(),
            damage_by_tag: BTreeMap::new(),
            damage_relations: RelationFilter::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_policy_falls_back_to_default() {
        let mut config = GuardConfig::default();
        config.noise_by_tag.insert(
            "gunshot".into(),
            NoisePolicy {
                suspicion_delta01: 0.6,
                ..NoisePolicy::default()
            },
        );

        assert_eq!(config.noise_policy(Some("gunshot")).suspicion_delta01, 0.6);
        assert_eq!(config.noise_policy(Some("footstep")).suspicion_delta01, 0.15);
        assert_eq!(config.noise_policy(None).suspicion_delta01, 0.15);
    }

    #[test]
    fn damage_scale_is_clamped() {
        let policy = DamagePolicy::default();
        assert_eq!(policy.severity_scale(12.5), 0.5);
        assert_eq!(policy.severity_scale(500.0), 2.0);
        assert_eq!(policy.severity_scale(-5.0), 0.0);

        let flat = DamagePolicy {
            scale_by_damage: false,
            ..DamagePolicy::default()
        };
        assert_eq!(flat.severity_scale(500.0), 1.0);
    }

    #[test]
    fn relation_filter_defaults() {
        let filter = RelationFilter::default();
        assert!(!filter.allows(InstigatorRelation::SelfActor));
        assert!(!filter.allows(InstigatorRelation::Friendly));
        assert!(filter.allows(InstigatorRelation::Hostile));
        assert!(filter.allows(InstigatorRelation::Unknown));
    }
}
