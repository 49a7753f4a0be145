//! Smoothing, hysteresis, and dwell applied on the way from score to tier.

use stealth_core::config::{TierHysteresis, TierThresholds};
use stealth_core::scoring::smoothing_alpha;
use stealth_core::{StealthTier, clamp01};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TierTracker {
    tier: StealthTier,
    last_change_at: Option<f64>,
    smoothed: Option<f32>,
    smoothed_at: f64,
    /// A change was held back by the dwell time.
    deferred: bool,
}

impl TierTracker {
    pub fn tier(&self) -> StealthTier {
        self.tier
    }

    pub fn has_deferred_change(&self) -> bool {
        self.deferred
    }

    /// Moves the smoothed score toward `raw` by the elapsed half-lives.
    pub fn smooth(&mut self, raw: f32, now: f64, hysteresis: &TierHysteresis) -> f32 {
        let raw = clamp01(raw);
        if hysteresis.smoothing_half_life_seconds <= 0.0 {
            self.smoothed = None;
            return raw;
        }
        let next = match self.smoothed {
            None => raw,
            Some(prev) => {
                let alpha = smoothing_alpha(now - self.smoothed_at, hysteresis.smoothing_half_life_seconds);
                clamp01(prev + (raw - prev) * alpha)
            }
        };
        self.smoothed = Some(next);
        self.smoothed_at = self.smoothed_at.max(now);
        next
    }

    /// Returns `(old, new)` when the tier actually changed.
    pub fn evaluate(
        &mut self,
        score: f32,
        now: f64,
        thresholds: &TierThresholds,
        hysteresis: &TierHysteresis,
    ) -> Option<(StealthTier, StealthTier)> {
        let candidate = if hysteresis.enabled {
            StealthTier::with_hysteresis(self.tier, score, thresholds, hysteresis.padding)
        } else {
            StealthTier::from_score(score, thresholds)
        };
        if candidate == self.tier {
            self.deferred = false;
            return None;
        }

        let dwell = f64::from(hysteresis.min_seconds_between_tier_changes);
        if dwell > 0.0
            && let Some(last) = self.last_change_at
            && now - last < dwell
        {
            if !self.deferred {
                tracing::trace!(
                    "Tier change {} -> {} deferred by dwell time",
                    self.tier,
                    candidate
                );
            }
            self.deferred = true;
            return None;
        }

        let old = self.tier;
        self.tier = candidate;
        self.last_change_at = Some(now);
        self.deferred = false;
        Some((old, candidate))
    }

    /// Forgets smoothing and dwell history but keeps the current tier, so the
    /// next evaluation reports the change from it.
    pub fn clear_history(&mut self) {
        self.last_change_at = None;
        self.smoothed = None;
        self.deferred = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dwell_defers_then_applies() {
        let thresholds = TierThresholds::default();
        let hysteresis = TierHysteresis {
            min_seconds_between_tier_changes: 1.0,
            ..TierHysteresis::default()
        };
        let mut tracker = TierTracker::default();

        assert_eq!(
            tracker.evaluate(0.6, 0.0, &thresholds, &hysteresis),
            Some((StealthTier::Hidden, StealthTier::Danger))
        );
        assert_eq!(tracker.evaluate(0.1, 0.5, &thresholds, &hysteresis), None);
        assert!(tracker.has_deferred_change());
        assert_eq!(
            tracker.evaluate(0.1, 1.2, &thresholds, &hysteresis),
            Some((StealthTier::Danger, StealthTier::Hidden))
        );
    }

    #[test]
    fn padding_holds_tier_near_threshold() {
        let thresholds = TierThresholds::default();
        let hysteresis = TierHysteresis {
            enabled: true,
            padding: 0.05,
            ..TierHysteresis::default()
        };
        let mut tracker = TierTracker::default();
        tracker.evaluate(0.55, 0.0, &thresholds, &hysteresis);
        assert_eq!(tracker.tier(), StealthTier::Danger);

        assert_eq!(tracker.evaluate(0.47, 1.0, &thresholds, &hysteresis), None);
        assert_eq!(
            tracker.evaluate(0.44, 2.0, &thresholds, &hysteresis),
            Some((StealthTier::Danger, StealthTier::Cautious))
        );
    }

    #[test]
    fn smoothing_converges_over_half_lives() {
        let hysteresis = TierHysteresis {
            smoothing_half_life_seconds: 1.0,
            ..TierHysteresis::default()
        };
        let mut tracker = TierTracker::default();
        assert_eq!(tracker.smooth(0.0, 0.0, &hysteresis), 0.0);
        let half = tracker.smooth(1.0, 1.0, &hysteresis);
        assert!((half - 0.5).abs() < 1e-5);
        let three_quarters = tracker.smooth(1.0, 2.0, &hysteresis);
        assert!((three_quarters - 0.75).abs() < 1e-5);
    }
}
