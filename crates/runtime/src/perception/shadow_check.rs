//! Rate-limited, jittered visibility checks of the subject's cast shadow.

use stealth_core::config::ShadowAwareness;
use stealth_core::{ActorHandle, RngOracle, ShadowCandidate, TraceOracle, Vec3, compute_seed};

use super::budget::TraceBudget;

/// Seed context separating shadow jitter from other per-agent draws.
const JITTER_CONTEXT: u32 = 0x5AD0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShadowSchedule {
    next_check_at: f64,
    window_start: f64,
    traces_in_window: u32,
    checks: u64,
}

pub struct ShadowCheck<'a> {
    pub now: f64,
    pub owner: ActorHandle,
    pub eye: Vec3,
    pub subject: ActorHandle,
    pub candidate: ShadowCandidate,
    pub traces: &'a dyn TraceOracle,
    pub rng: Option<&'a dyn RngOracle>,
    pub session_seed: u64,
}

impl ShadowSchedule {
    pub fn next_check_at(&self) -> f64 {
        self.next_check_at
    }

    pub fn checks(&self) -> u64 {
        self.checks
    }

    fn roll_window(&mut self, now: f64) {
        if now - self.window_start >= 1.0 {
            self.window_start = now;
            self.traces_in_window = 0;
        }
    }

    pub fn is_eligible(&mut self, now: f64, config: &ShadowAwareness) -> bool {
        if !config.enabled || config.check_interval_seconds <= 0.0 || now < self.next_check_at {
            return false;
        }
        self.roll_window(now);
        self.traces_in_window < config.max_traces_per_second
    }

    /// Runs one check when eligible. Returns whether the shadow point was seen.
    pub fn run(
        &mut self,
        check: &ShadowCheck<'_>,
        config: &ShadowAwareness,
        budget: &mut TraceBudget,
    ) -> bool {
        if !self.is_eligible(check.now, config) {
            return false;
        }

        let interval = config.check_interval_seconds.max(ShadowAwareness::MIN_INTERVAL);
        let jitter = check.rng.map_or(0.0, |rng| {
            let seed = compute_seed(check.session_seed, self.checks, check.owner.index, JITTER_CONTEXT);
            rng.range_f32(seed, 0.0, interval * ShadowAwareness::JITTER_FRACTION)
        });
        self.next_check_at = check.now + f64::from(interval + jitter);
        self.checks += 1;

        let candidate = &check.candidate;
        if !candidate.valid || candidate.illumination01 < config.min_illumination {
            return false;
        }
        if check.eye.distance(candidate.shadow_point) > config.max_distance {
            return false;
        }
        if !budget.can_spend_traces(1) {
            return false;
        }
        budget.spend_trace();
        self.traces_in_window += 1;

        match check
            .traces
            .line_trace(check.eye, candidate.shadow_point, &[check.owner, check.subject])
        {
            None => true,
            Some(hit) => hit.point.distance(candidate.shadow_point) <= config.visible_tolerance,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stealth_core::{PcgRng, TraceHit};

    struct Open;

    impl TraceOracle for Open {
        fn line_trace(&self, _start: Vec3, _end: Vec3, _ignore: &[ActorHandle]) -> Option<TraceHit> {
            None
        }
    }

    fn config() -> ShadowAwareness {
        ShadowAwareness {
            enabled: true,
            ..ShadowAwareness::default()
        }
    }

    fn check(now: f64, rng: &PcgRng) -> ShadowCheck<'_> {
        ShadowCheck {
            now,
            owner: ActorHandle::new(1, 0),
            eye: Vec3::new(0.0, 0.0, 80.0),
            subject: ActorHandle::new(2, 0),
            candidate: ShadowCandidate {
                valid: true,
                shadow_point: Vec3::new(300.0, 0.0, 0.0),
                illumination01: 0.9,
                ..ShadowCandidate::default()
            },
            traces: &Open,
            rng: Some(rng),
            session_seed: 42,
        }
    }

    #[test]
    fn visible_shadow_is_seen_and_rescheduled_with_jitter() {
        let rng = PcgRng;
        let config = config();
        let mut schedule = ShadowSchedule::default();
        let mut budget = TraceBudget::new(8);

        assert!(schedule.run(&check(0.0, &rng), &config, &mut budget));
        let next = schedule.next_check_at();
        assert!((0.4..=0.5).contains(&next));
        assert!(!schedule.run(&check(0.1, &rng), &config, &mut budget));
        assert_eq!(budget.used(), 1);
    }

    #[test]
    fn per_second_cap_is_enforced() {
        let rng = PcgRng;
        let config = ShadowAwareness {
            check_interval_seconds: 0.05,
            max_traces_per_second: 2,
            ..config()
        };
        let mut schedule = ShadowSchedule::default();
        let mut budget = TraceBudget::new(0);
        let mut now = 0.0;
        let mut seen = 0;
        while now < 0.9 {
            if schedule.run(&check(now, &rng), &config, &mut budget) {
                seen += 1;
            }
            now += 0.1;
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn disabled_never_traces() {
        let rng = PcgRng;
        let mut schedule = ShadowSchedule::default();
        let mut budget = TraceBudget::new(8);
        assert!(!schedule.run(&check(0.0, &rng), &ShadowAwareness::default(), &mut budget));
        assert_eq!(budget.used(), 0);
    }
}
