//! Discrete classifications of the global score and of per-AI suspicion.
//!
//! The four-way [`StealthTier`] and the five-way [`StealthLevel`] are
//! independent classifications over the same score. They use separate
//! thresholds and serve different consumers.

use crate::config::{AwarenessThresholds, LevelThresholds, TierThresholds};

/// Four-way tier consumed by gameplay gating and FX.
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
pub enum StealthTier {
    #[default]
    Hidden,
    Cautious,
    Danger,
    Compromised,
}

impl StealthTier {
    pub const ALL: [Self; 4] = [Self::Hidden, Self::Cautious, Self::Danger, Self::Compromised];

    /// Plain threshold mapping, no hysteresis.
    pub fn from_score(score: f32, thresholds: &TierThresholds) -> Self {
        if score < thresholds.cautious_min {
            Self::Hidden
        } else if score < thresholds.danger_min {
            Self::Cautious
        } else if score < thresholds.compromised_min {
            Self::Danger
        } else {
            Self::Compromised
        }
    }

    /// Mapping that only leaves `current` downward once `score` has fallen
    /// `padding` below each threshold on the way down. Rising is immediate.
    pub fn with_hysteresis(
        current: Self,
        score: f32,
        thresholds: &TierThresholds,
        padding: f32,
    ) -> Self {
        let raw = Self::from_score(score, thresholds);
        if raw >= current {
            return raw;
        }

        let mut tier = current;
        while tier > raw && score < tier.min_score(thresholds) - padding {
            tier = tier.lower();
        }
        tier
    }

    /// Lowest score that maps to this tier.
    pub fn min_score(self, thresholds: &TierThresholds) -> f32 {
        match self {
            Self::Hidden => 0.0,
            Self::Cautious => thresholds.cautious_min,
            Self::Danger => thresholds.danger_min,
            Self::Compromised => thresholds.compromised_min,
        }
    }

    pub fn lower(self) -> Self {
        match self {
            Self::Hidden | Self::Cautious => Self::Hidden,
            Self::Danger => Self::Cautious,
            Self::Compromised => Self::Danger,
        }
    }
}

/// Five-way level consumed by UI and detection feedback.
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
pub enum StealthLevel {
    #[default]
    Undetected,
    LowRisk,
    MediumRisk,
    HighRisk,
    FullyDetected,
}

impl StealthLevel {
    pub fn from_score(score: f32, thresholds: &LevelThresholds) -> Self {
        if score <= thresholds.undetected_max {
            Self::Undetected
        } else if score <= thresholds.low_risk_max {
            Self::LowRisk
        } else if score <= thresholds.medium_risk_max {
            Self::MediumRisk
        } else if score <= thresholds.high_risk_max {
            Self::HighRisk
        } else {
            Self::FullyDetected
        }
    }
}

/// Awareness of one AI, derived from its reported suspicion.
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
pub enum AiAwarenessState {
    #[default]
    Calm,
    Suspicious,
    Investigating,
    Alerted,
}

impl AiAwarenessState {
    pub fn from_suspicion(suspicion01: f32, thresholds: &AwarenessThresholds) -> Self {
        if suspicion01 >= thresholds.alerted_min {
            Self::Alerted
        } else if suspicion01 >= thresholds.investigating_min {
            Self::Investigating
        } else if suspicion01 >= thresholds.suspicious_min {
            Self::Suspicious
        } else {
            Self::Calm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn tier_boundaries_are_lower_inclusive() {
        let t = TierThresholds::default();
        assert_eq!(StealthTier::from_score(0.19, &t), StealthTier::Hidden);
        assert_eq!(StealthTier::from_score(0.2, &t), StealthTier::Cautious);
        assert_eq!(StealthTier::from_score(0.3, &t), StealthTier::Cautious);
        assert_eq!(StealthTier::from_score(0.5, &t), StealthTier::Danger);
        assert_eq!(StealthTier::from_score(0.8, &t), StealthTier::Compromised);
    }

    #[test]
    fn tier_is_monotonic_in_score() {
        let t = TierThresholds::default();
        let mut previous = StealthTier::Hidden;
        for step in 0..=1000 {
            let tier = StealthTier::from_score(step as f32 / 1000.0, &t);
            assert!(tier >= previous);
            previous = tier;
        }
    }

    #[test]
    fn hysteresis_holds_until_padding_is_crossed() {
        let t = TierThresholds::default();
        let held = StealthTier::with_hysteresis(StealthTier::Danger, 0.47, &t, 0.05);
        assert_eq!(held, StealthTier::Danger);

        let dropped = StealthTier::with_hysteresis(StealthTier::Danger, 0.44, &t, 0.05);
        assert_eq!(dropped, StealthTier::Cautious);

        // A large drop walks past several tiers at once.
        let fell = StealthTier::with_hysteresis(StealthTier::Compromised, 0.0, &t, 0.05);
        assert_eq!(fell, StealthTier::Hidden);

        let rose = StealthTier::with_hysteresis(StealthTier::Hidden, 0.85, &t, 0.05);
        assert_eq!(rose, StealthTier::Compromised);
    }

    #[test]
    fn level_boundaries_are_upper_inclusive() {
        let l = LevelThresholds::default();
        assert_eq!(StealthLevel::from_score(0.10, &l), StealthLevel::Undetected);
        assert_eq!(StealthLevel::from_score(0.11, &l), StealthLevel::LowRisk);
        assert_eq!(StealthLevel::from_score(0.65, &l), StealthLevel::MediumRisk);
        assert_eq!(StealthLevel::from_score(0.99, &l), StealthLevel::HighRisk);
        assert_eq!(StealthLevel::from_score(1.0, &l), StealthLevel::FullyDetected);
    }

    #[test]
    fn names_round_trip_through_strum() {
        assert_eq!(StealthTier::Compromised.as_ref(), "compromised");
        assert_eq!(
            StealthLevel::from_str("HIGH_RISK").ok(),
            Some(StealthLevel::HighRisk)
        );
        assert_eq!(AiAwarenessState::Investigating.to_string(), "investigating");
    }
}
