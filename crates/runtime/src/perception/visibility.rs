//! Line-of-sight evaluation against one target.
//!
//! Legacy mode traces a single point at a fixed height above the target.
//! Multi-point mode traces named sockets in order (the first few are core
//! points) and may stop early once a core point is visible.

use stealth_core::config::{PerceptionConfig, TargetPointSampling};
use stealth_core::types::SamplePoints;
use stealth_core::{ActorHandle, ActorOracle, TargetPointVisibility, TraceOracle, Vec3};

use super::budget::TraceBudget;

/// Resolves the target's sample points, core points first.
pub fn resolve_sample_points(
    actors: &dyn ActorOracle,
    target: ActorHandle,
    target_location: Vec3,
    sampling: &TargetPointSampling,
    fallback_height: f32,
) -> SamplePoints {
    let mut points = SamplePoints::new();
    let limit = sampling.max_points.min(TargetPointSampling::MAX_POINTS);
    for socket in sampling.socket_names.iter().take(limit) {
        if let Some(point) = actors.socket_location(target, socket) {
            points.push(point);
        }
    }
    if points.is_empty() && sampling.use_fallback_point {
        points.push(target_location.raised(fallback_height));
    }
    points
}

/// A point is visible when nothing blocks it or the blocker is the target.
fn point_visible(
    traces: &dyn TraceOracle,
    eye: Vec3,
    point: Vec3,
    owner: ActorHandle,
    target: ActorHandle,
) -> bool {
    match traces.line_trace(eye, point, &[owner]) {
        None => true,
        Some(hit) => hit.actor == Some(target),
    }
}

pub struct SightQuery<'a> {
    pub traces: &'a dyn TraceOracle,
    pub actors: &'a dyn ActorOracle,
    pub owner: ActorHandle,
    pub target: ActorHandle,
    pub eye: Vec3,
    pub target_location: Vec3,
}

pub fn evaluate_line_of_sight(
    query: &SightQuery<'_>,
    config: &PerceptionConfig,
    budget: &mut TraceBudget,
) -> TargetPointVisibility {
    if config.target_points.enabled {
        evaluate_multi_point(query, config, budget)
    } else {
        evaluate_single_point(query, config, budget)
    }
}

fn evaluate_single_point(
    query: &SightQuery<'_>,
    config: &PerceptionConfig,
    budget: &mut TraceBudget,
) -> TargetPointVisibility {
    let mut result = TargetPointVisibility::default();
    if !budget.can_spend_traces(1) {
        result.hit_trace_cap = true;
        return result;
    }
    budget.spend_trace();

    let point = query.target_location.raised(config.legacy_point_height);
    let visible = point_visible(query.traces, query.eye, point, query.owner, query.target);
    result.tested = 1;
    result.visible = u8::from(visible);
    result.any_core_visible = visible;
    result.finish();
    result
}

fn evaluate_multi_point(
    query: &SightQuery<'_>,
    config: &PerceptionConfig,
    budget: &mut TraceBudget,
) -> TargetPointVisibility {
    let sampling = &config.target_points;
    let points = resolve_sample_points(
        query.actors,
        query.target,
        query.target_location,
        sampling,
        config.fallback_point_height,
    );

    let mut result = TargetPointVisibility::default();
    for (index, point) in points.iter().enumerate() {
        if !budget.can_spend_traces(1) {
            result.hit_trace_cap = true;
            break;
        }
        budget.spend_trace();
        result.tested += 1;

        if point_visible(query.traces, query.eye, *point, query.owner, query.target) {
            result.visible += 1;
            if index < TargetPointSampling::CORE_POINTS {
                result.any_core_visible = true;
                if sampling.early_out_on_core_visible {
                    break;
                }
            }
        }
    }
    result.finish();
    result
}
