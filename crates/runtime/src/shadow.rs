//! Rate-limited cache of the subject's cast-shadow point.
//!
//! The cache traces from just above the tracked subject toward the dominant
//! light. Whatever the ray hits is the occluder casting the subject's shadow
//! and becomes the candidate point guards may check for visibility.

use stealth_core::config::ShadowCacheConfig;
use stealth_core::{ActorHandle, ActorOracle, ShadowCandidate, TraceOracle, Vec3, clamp01};

#[derive(Clone, Copy, Debug, Default)]
pub struct ShadowCandidateCache {
    candidate: ShadowCandidate,
    last_refresh_at: Option<f64>,
}

/// Inputs for one refresh attempt.
pub struct ShadowQuery<'a> {
    pub now: f64,
    pub illumination01: f32,
    pub light_direction: Option<Vec3>,
    pub subject: Option<ActorHandle>,
    pub actors: Option<&'a dyn ActorOracle>,
    pub traces: Option<&'a dyn TraceOracle>,
}

impl ShadowCandidateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate(&self) -> ShadowCandidate {
        self.candidate
    }

    /// Returns whether a refresh ran (as opposed to being rate-limited).
    pub fn refresh(&mut self, query: &ShadowQuery<'_>, config: &ShadowCacheConfig) -> bool {
        if !config.enabled {
            return false;
        }
        let interval = f64::from(
            config
                .update_interval_seconds
                .max(ShadowCacheConfig::MIN_UPDATE_INTERVAL),
        );
        if let Some(last) = self.last_refresh_at
            && query.now - last < interval
        {
            return false;
        }
        self.last_refresh_at = Some(query.now);
        self.candidate = Self::compute(query, config);
        tracing::trace!(
            "Shadow candidate refreshed: valid={} illumination={:.2}",
            self.candidate.valid,
            self.candidate.illumination01
        );
        true
    }

    fn compute(query: &ShadowQuery<'_>, config: &ShadowCacheConfig) -> ShadowCandidate {
        let illumination = clamp01(query.illumination01);
        let invalid = ShadowCandidate::invalid(illumination, query.now);
        if illumination < config.min_illumination {
            return invalid;
        }

        let Some(direction) = query
            .light_direction
            .map(Vec3::normalized_or_zero)
            .filter(|d| !d.is_nearly_zero())
        else {
            return invalid;
        };
        let (Some(subject), Some(actors), Some(traces)) = (query.subject, query.actors, query.traces)
        else {
            tracing::trace!("Shadow candidate skipped: missing subject or oracles");
            return invalid;
        };
        let Some(location) = actors.location(subject) else {
            return invalid;
        };

        let start = location.raised(config.trace_origin_height);
        let end = start + direction * config.cast_distance;
        match traces.line_trace(start, end, &[subject]) {
            Some(hit) => ShadowCandidate {
                valid: true,
                shadow_point: hit.point,
                dominant_light_dir: direction,
                illumination01: illumination,
                strength01: illumination,
                last_update_seconds: query.now,
            },
            None => ShadowCandidate {
                dominant_light_dir: direction,
                ..invalid
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stealth_core::TraceHit;

    struct Wall;

    impl TraceOracle for Wall {
        fn line_trace(&self, start: Vec3, end: Vec3, _ignore: &[ActorHandle]) -> Option<TraceHit> {
            (end.x > 100.0).then(|| TraceHit {
                actor: None,
                point: Vec3::new(100.0, start.y, start.z),
                distance: 100.0 - start.x,
            })
        }
    }

    struct OneActor;

    impl ActorOracle for OneActor {
        fn is_live(&self, _actor: ActorHandle) -> bool {
            true
        }
        fn location(&self, _actor: ActorHandle) -> Option<Vec3> {
            Some(Vec3::ZERO)
        }
        fn forward(&self, _actor: ActorHandle) -> Option<Vec3> {
            Some(Vec3::FORWARD)
        }
        fn actors_of_kind(&self, _kind: &str) -> Vec<ActorHandle> {
            Vec::new()
        }
    }

    fn query<'a>(now: f64, illumination: f32, actors: &'a OneActor, wall: &'a Wall) -> ShadowQuery<'a> {
        ShadowQuery {
            now,
            illumination01: illumination,
            light_direction: Some(Vec3::FORWARD),
            subject: Some(ActorHandle::new(0, 0)),
            actors: Some(actors),
            traces: Some(wall),
        }
    }

    #[test]
    fn bright_subject_near_occluder_gets_candidate() {
        let config = ShadowCacheConfig::default();
        let mut cache = ShadowCandidateCache::new();
        assert!(cache.refresh(&query(0.0, 0.9, &OneActor, &Wall), &config));

        let candidate = cache.candidate();
        assert!(candidate.valid);
        assert!(candidate.shadow_point.approx_eq(Vec3::new(100.0, 0.0, 50.0), 1e-3));
    }

    #[test]
    fn dim_light_and_rate_limit() {
        let config = ShadowCacheConfig::default();
        let mut cache = ShadowCandidateCache::new();
        assert!(cache.refresh(&query(0.0, 0.3, &OneActor, &Wall), &config));
        assert!(!cache.candidate().valid);
        assert!((cache.candidate().illumination01 - 0.3).abs() < 1e-6);

        assert!(!cache.refresh(&query(0.1, 0.9, &OneActor, &Wall), &config));
        assert!(cache.refresh(&query(0.3, 0.9, &OneActor, &Wall), &config));
        assert!(cache.candidate().valid);
    }
}
