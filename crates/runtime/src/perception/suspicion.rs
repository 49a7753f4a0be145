//! Guard suspicion: ramp by the dominant sense, delayed decay, spotted/lost
//! hysteresis, and throttled change and report gating.

use arrayvec::ArrayVec;

use stealth_core::config::GuardConfig;
use stealth_core::math::EPSILON;
use stealth_core::{LocalSense, clamp01};

/// Stimulus strengths observed during one update, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stimuli {
    pub sight: f32,
    pub hearing: f32,
    pub shadow: f32,
    pub damage: f32,
}

impl Stimuli {
    /// Sense with the largest suspicion gain, and that gain per second.
    fn dominant(&self, config: &GuardConfig) -> (LocalSense, f32) {
        let candidates = [
            (LocalSense::Sight, clamp01(self.sight) * config.sight_suspicion_per_second),
            (LocalSense::Hearing, clamp01(self.hearing) * config.hearing_ramp_per_second),
            (LocalSense::Shadow, clamp01(self.shadow) * config.shadow_ramp_per_second),
            (LocalSense::Damage, clamp01(self.damage) * config.damage_ramp_per_second),
        ];
        candidates
            .into_iter()
            .filter(|(_, gain)| *gain > 0.0)
            .fold((LocalSense::None, 0.0), |best, candidate| {
                if candidate.1 > best.1 { candidate } else { best }
            })
    }
}

/// Edge signals produced by one suspicion step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuspicionSignal {
    Spotted,
    Lost,
    FullyAlerted,
    LostSight,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SuspicionStep {
    pub signals: ArrayVec<SuspicionSignal, 4>,
    /// The level-triggered change notification is due.
    pub changed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SuspicionModel {
    value: f32,
    sense: LocalSense,
    spotted: bool,
    spotted_since: f64,
    last_flip_at: Option<f64>,
    last_stimulus_at: Option<f64>,
    fully_alerted: bool,
    above_calm: bool,
    last_change_event_at: Option<f64>,
    last_change_value: f32,
    last_report_at: Option<f64>,
    last_reported: f32,
}

impl Default for SuspicionModel {
    fn default() -> Self {
        Self {
            value: 0.0,
            sense: LocalSense::None,
            spotted: false,
            spotted_since: 0.0,
            last_flip_at: None,
            last_stimulus_at: None,
            fully_alerted: false,
            above_calm: false,
            last_change_event_at: None,
            last_change_value: 0.0,
            last_report_at: None,
            last_reported: 0.0,
        }
    }
}

impl SuspicionModel {
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Suspicion as a fraction of the configured maximum.
    pub fn normalized(&self, config: &GuardConfig) -> f32 {
        if config.max_suspicion <= EPSILON {
            0.0
        } else {
            clamp01(self.value / config.max_suspicion)
        }
    }

    pub fn sense(&self) -> LocalSense {
        self.sense
    }

    pub fn is_spotted(&self) -> bool {
        self.spotted
    }

    /// Integrates one update of `dt` seconds.
    pub fn step(&mut self, stimuli: Stimuli, dt: f32, now: f64, config: &GuardConfig) -> SuspicionStep {
        let (sense, gain) = stimuli.dominant(config);
        if gain > 0.0 {
            self.value += gain * dt;
            self.sense = sense;
            self.last_stimulus_at = Some(now);
        } else {
            let forget = f64::from(config.stimulus_forget_delay_seconds);
            let forgotten = self.last_stimulus_at.is_none_or(|t| now - t >= forget);
            if forgotten {
                self.value -= config.suspicion_decay_per_second * dt;
            }
        }
        self.clamp(config);
        if self.value <= 0.0 {
            self.sense = LocalSense::None;
        }
        self.evaluate_edges(now, config)
    }

    /// Adds `delta01` of the maximum immediately, as a stimulus.
    pub fn apply_impulse(
        &mut self,
        delta01: f32,
        sense: LocalSense,
        now: f64,
        config: &GuardConfig,
    ) -> SuspicionStep {
        if delta01 > 0.0 {
            self.value += delta01 * config.max_suspicion;
            self.sense = sense;
            self.last_stimulus_at = Some(now);
        }
        self.clamp(config);
        self.evaluate_edges(now, config)
    }

    /// Pins suspicion at the maximum.
    pub fn saturate(&mut self, sense: LocalSense, now: f64, config: &GuardConfig) -> SuspicionStep {
        self.value = config.max_suspicion.max(0.0);
        self.sense = sense;
        self.last_stimulus_at = Some(now);
        self.evaluate_edges(now, config)
    }

    fn clamp(&mut self, config: &GuardConfig) {
        self.value = self.value.clamp(0.0, config.max_suspicion.max(0.0));
    }

    fn evaluate_edges(&mut self, now: f64, config: &GuardConfig) -> SuspicionStep {
        let mut step = SuspicionStep::default();
        let normalized = self.normalized(config);

        let flip_allowed = self
            .last_flip_at
            .is_none_or(|t| now - t >= f64::from(config.spotted.min_seconds_between_flips));
        let hysteresis = &config.spotted;
        let (enter, leave) = if hysteresis.enabled {
            let held = now - self.spotted_since >= f64::from(hysteresis.min_seconds_in_spotted);
            (
                !self.spotted && normalized >= hysteresis.spotted_threshold01 && flip_allowed,
                self.spotted
                    && normalized <= hysteresis.effective_lost_threshold()
                    && held
                    && flip_allowed,
            )
        } else {
            let spotted = normalized >= hysteresis.spotted_threshold01;
            (spotted && !self.spotted, !spotted && self.spotted)
        };
        if enter {
            self.spotted = true;
            self.spotted_since = now;
            self.last_flip_at = Some(now);
            step.signals.push(SuspicionSignal::Spotted);
        } else if leave {
            self.spotted = false;
            self.last_flip_at = Some(now);
            step.signals.push(SuspicionSignal::Lost);
        }

        let max = config.max_suspicion.max(0.0);
        let at_max = max > 0.0 && self.value >= max - EPSILON;
        if at_max && !self.fully_alerted {
            step.signals.push(SuspicionSignal::FullyAlerted);
        }
        self.fully_alerted = at_max;

        let above_calm = self.value >= config.calm_threshold();
        if self.above_calm && !above_calm {
            step.signals.push(SuspicionSignal::LostSight);
        }
        self.above_calm = above_calm;

        let min_interval = f64::from(config.change_event_min_interval_seconds);
        if (self.value - self.last_change_value).abs() >= config.change_epsilon01
            && self.last_change_event_at.is_none_or(|t| now - t >= min_interval)
        {
            self.last_change_event_at = Some(now);
            self.last_change_value = self.value;
            step.changed = true;
        }
        step
    }

    /// Whether a report to the aggregator is due. Marks it sent when true.
    pub fn take_report(&mut self, now: f64, force: bool, config: &GuardConfig) -> bool {
        let reporting = &config.reporting;
        if !reporting.enabled {
            return false;
        }
        let normalized = self.normalized(config);
        let due = force
            || (self
                .last_report_at
                .is_none_or(|t| now - t >= f64::from(reporting.min_interval_seconds))
                && (normalized - self.last_reported).abs() >= reporting.min_delta01);
        if due {
            self.last_report_at = Some(now);
            self.last_reported = normalized;
        }
        due
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sight() -> Stimuli {
        Stimuli {
            sight: 1.0,
            ..Stimuli::default()
        }
    }

    #[test]
    fn sight_ramps_and_spots_once() {
        let config = GuardConfig::default();
        let mut model = SuspicionModel::default();
        let mut spotted = 0;
        let mut now = 0.0;
        for _ in 0..50 {
            now += 0.2;
            let step = model.step(sight(), 0.2, now, &config);
            spotted += step
                .signals
                .iter()
                .filter(|s| **s == SuspicionSignal::Spotted)
                .count();
        }
        assert_eq!(model.value(), config.max_suspicion);
        assert_eq!(model.sense(), LocalSense::Sight);
        assert!(model.is_spotted());
        assert_eq!(spotted, 1);
    }

    #[test]
    fn lost_needs_to_fall_below_lost_threshold() {
        let config = GuardConfig::default();
        let mut model = SuspicionModel::default();
        model.saturate(LocalSense::Sight, 0.0, &config);
        assert!(model.is_spotted());

        // 1.0 -> 0.88 stays spotted (lost threshold 0.85).
        let step = model.step(Stimuli::default(), 1.2, 1.0, &config);
        assert!(step.signals.is_empty());
        assert!(model.is_spotted());

        let step = model.step(Stimuli::default(), 0.5, 2.0, &config);
        assert!(step.signals.contains(&SuspicionSignal::Lost));
    }

    #[test]
    fn forget_delay_holds_value() {
        let config = GuardConfig {
            stimulus_forget_delay_seconds: 2.0,
            ..GuardConfig::default()
        };
        let mut model = SuspicionModel::default();
        model.apply_impulse(0.5, LocalSense::Hearing, 0.0, &config);
        model.step(Stimuli::default(), 1.0, 1.0, &config);
        assert_eq!(model.value(), 0.5);
        model.step(Stimuli::default(), 1.0, 2.5, &config);
        assert!(model.value() < 0.5);
    }

    #[test]
    fn decay_below_calm_signals_lost_sight() {
        let config = GuardConfig::default();
        let mut model = SuspicionModel::default();
        model.apply_impulse(0.25, LocalSense::Hearing, 0.0, &config);
        let step = model.step(Stimuli::default(), 1.0, 1.0, &config);
        assert!(step.signals.contains(&SuspicionSignal::LostSight));
    }

    #[test]
    fn reports_are_throttled_unless_forced() {
        let config = GuardConfig::default();
        let mut model = SuspicionModel::default();
        model.apply_impulse(0.5, LocalSense::Hearing, 0.0, &config);
        assert!(model.take_report(0.0, false, &config));
        model.apply_impulse(0.1, LocalSense::Hearing, 0.05, &config);
        assert!(!model.take_report(0.05, false, &config));
        assert!(model.take_report(0.05, true, &config));
    }
}
