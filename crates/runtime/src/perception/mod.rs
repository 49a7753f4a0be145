//! Per-agent perception: budgeted sight checks, hearing, shadow awareness,
//! and the guard suspicion model that reports into the aggregator.
//!
//! Each agent runs on its own fixed interval through [`PerceptionAgent::tick`].
//! Targets are visited round-robin, a bounded number per update, under a
//! per-update trace budget.
mod budget;
mod shadow_check;
mod stimulus;
mod suspicion;
mod visibility;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stealth_core::config::{GuardConfig, PerceptionConfig, PerceptionThresholds};
use stealth_core::math::view_angle_degrees;
use stealth_core::scoring::visibility_suspicion_multiplier;
use stealth_core::{
    ActorHandle, ActorOracle, AiSuspicionReport, InstigatorRelation, LocalSense,
    PerceivedTargetState, PerceptionState, StealthEnv, SuspicionReason, TargetPointVisibility,
    TraceOracle, Vec3, clamp01,
};

use crate::aggregator::GlobalStealthAggregator;
use crate::events::{Event, EventBus, ObserverList, PerceptionEvent, SubscriptionToken, TokenSource};

pub use budget::{TraceBudget, next_target_start_index};
pub use shadow_check::{ShadowCheck, ShadowSchedule};
pub use stimulus::StimulusMemory;
pub use suspicion::{Stimuli, SuspicionModel, SuspicionSignal, SuspicionStep};
pub use visibility::{SightQuery, evaluate_line_of_sight, resolve_sample_points};

/// Work done by one update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub targets_total: usize,
    pub targets_processed: usize,
    pub traces_used: u32,
    pub hit_trace_cap: bool,
    /// Fewer targets were visited than are watched.
    pub hit_target_cap: bool,
    pub suppressed: bool,
    pub shadow_seen: bool,
}

/// A noise reported to the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseEvent {
    pub location: Vec3,
    pub loudness01: f32,
    pub instigator: Option<ActorHandle>,
    pub tag: Option<String>,
}

impl NoiseEvent {
    pub fn new(location: Vec3, loudness01: f32) -> Self {
        Self {
            location,
            loudness01,
            instigator: None,
            tag: None,
        }
    }

    pub fn with_instigator(mut self, instigator: ActorHandle) -> Self {
        self.instigator = Some(instigator);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Damage taken by the agent's owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub instigator: Option<ActorHandle>,
    pub amount: f32,
    pub tag: Option<String>,
    pub location: Option<Vec3>,
}

impl DamageEvent {
    pub fn new(amount: f32) -> Self {
        Self {
            instigator: None,
            amount,
            tag: None,
            location: None,
        }
    }

    pub fn with_instigator(mut self, instigator: ActorHandle) -> Self {
        self.instigator = Some(instigator);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_location(mut self, location: Vec3) -> Self {
        self.location = Some(location);
        self
    }
}

/// Values mirrored to an AI blackboard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlackboardSnapshot {
    pub state: PerceptionState,
    pub suspicion01: f32,
    pub sense: LocalSense,
    pub primary_target: Option<ActorHandle>,
    pub has_line_of_sight: bool,
    pub last_known_location: Option<Vec3>,
}

/// One perceiving AI.
pub struct PerceptionAgent {
    owner: ActorHandle,
    perception: Option<Arc<PerceptionConfig>>,
    guard: Option<Arc<GuardConfig>>,
    watched_kinds: Vec<String>,
    primary_target: Option<ActorHandle>,

    targets: Vec<PerceivedTargetState>,
    state: PerceptionState,
    round_robin_index: usize,
    budget: TraceBudget,
    suppressed_until: f64,
    next_update_at: Option<f64>,

    suspicion: SuspicionModel,
    shadow: ShadowSchedule,
    stimuli: StimulusMemory,
    telemetry_next_at: f64,
    session_seed: u64,

    tokens: TokenSource,
    perception_observers: ObserverList<PerceptionEvent>,
    suspicion_observers: ObserverList<PerceptionEvent>,
    bus: Option<EventBus>,
}

impl PerceptionAgent {
    pub fn new(owner: ActorHandle) -> Self {
        Self {
            owner,
            perception: None,
            guard: None,
            watched_kinds: Vec::new(),
            primary_target: None,
            targets: Vec::new(),
            state: PerceptionState::Unaware,
            round_robin_index: 0,
            budget: TraceBudget::default(),
            suppressed_until: f64::NEG_INFINITY,
            next_update_at: None,
            suspicion: SuspicionModel::default(),
            shadow: ShadowSchedule::default(),
            stimuli: StimulusMemory::default(),
            telemetry_next_at: 0.0,
            session_seed: 0,
            tokens: TokenSource::new(),
            perception_observers: ObserverList::new(),
            suspicion_observers: ObserverList::new(),
            bus: None,
        }
    }

    pub fn with_perception_config(mut self, config: Arc<PerceptionConfig>) -> Self {
        self.perception = Some(config);
        self
    }

    pub fn with_guard_config(mut self, config: Arc<GuardConfig>) -> Self {
        self.guard = Some(config);
        self
    }

    /// Watch every live actor of this kind.
    pub fn with_watched_kind(mut self, kind: impl Into<String>) -> Self {
        self.watched_kinds.push(kind.into());
        self
    }

    pub fn with_primary_target(mut self, target: ActorHandle) -> Self {
        self.primary_target = Some(target);
        self
    }

    /// Seed of the deterministic schedule jitter.
    pub fn with_session_seed(mut self, seed: u64) -> Self {
        self.session_seed = seed;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn owner(&self) -> ActorHandle {
        self.owner
    }

    pub fn perception_config(&self) -> Option<&PerceptionConfig> {
        self.perception.as_deref()
    }

    pub fn guard_config(&self) -> Option<&GuardConfig> {
        self.guard.as_deref()
    }

    pub fn set_perception_config(&mut self, config: Option<Arc<PerceptionConfig>>) {
        self.perception = config;
    }

    pub fn set_guard_config(&mut self, config: Option<Arc<GuardConfig>>) {
        self.guard = config;
    }

    pub fn set_primary_target(&mut self, target: Option<ActorHandle>) {
        self.primary_target = target;
    }

    // ------------------------------------------------------------------
    // Update loop
    // ------------------------------------------------------------------

    /// Runs an update when the agent's own timer is due.
    pub fn tick(
        &mut self,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> Option<UpdateStats> {
        let interval = self.perception.as_ref()?.update_interval_seconds.max(0.0);
        let now = env.now().ok()?;
        if self.next_update_at.is_some_and(|due| now < due) {
            return None;
        }
        self.next_update_at = Some(now + f64::from(interval));
        Some(self.update_perception(env, stealth))
    }

    pub fn update_perception(
        &mut self,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let Some(config) = self.perception.clone() else {
            tracing::trace!("Agent {} has no perception config", self.owner);
            return stats;
        };
        let (Ok(now), Ok(actors)) = (env.now(), env.actors()) else {
            tracing::trace!("Agent {} skipped update: missing clock or actors", self.owner);
            return stats;
        };
        if !actors.is_live(self.owner) {
            return stats;
        }
        let dt = config.update_interval_seconds.max(0.0);
        self.budget.reset(config.max_traces_per_update);

        if now < self.suppressed_until {
            for index in 0..self.targets.len() {
                self.decay_target(index, dt, &config);
            }
            self.apply_highest_state(stealth);
            stats.suppressed = true;
            stats.targets_total = self.targets.len();
            return stats;
        }

        self.refresh_targets(actors);
        let count = self.targets.len();
        stats.targets_total = count;

        if count > 0 {
            let start = next_target_start_index(self.round_robin_index, count);
            let cap = match config.max_targets_per_update {
                0 => count,
                max => max.min(count),
            };
            let traces = env.traces().ok();
            for offset in 0..cap {
                if self.budget.is_limited() && !self.budget.can_spend_traces(1) {
                    break;
                }
                let index = (start + offset) % count;
                let target = self.targets[index].target;
                let multiplier = config.stealth_multiplier(stealth.stealth_score_for(Some(target)));
                self.update_single_target(index, dt, multiplier, &config, actors, traces);
                stats.targets_processed += 1;
            }
            self.round_robin_index = (start + stats.targets_processed) % count;
            stats.hit_target_cap = stats.targets_processed < count;
        }

        if let Some(guard) = self.guard.clone() {
            let sight = self.primary_sight_strength(&config);
            stats.shadow_seen = self.run_shadow_check(now, &config, env, stealth);
            let (hearing, damage) = self.stimuli.take_pending();
            let stimuli = Stimuli {
                sight,
                hearing,
                shadow: if stats.shadow_seen { 1.0 } else { 0.0 },
                damage,
            };
            let step = self.suspicion.step(stimuli, dt, now, &guard);
            self.dispatch_suspicion(step, now, &guard, stealth, false, None);
        }
        self.apply_highest_state(stealth);

        stats.traces_used = self.budget.used();
        stats.hit_trace_cap = self.budget.hit_cap();
        self.emit_telemetry(now, &config);
        stats
    }

    /// Sight, LOS, and awareness integration for one target.
    fn update_single_target(
        &mut self,
        index: usize,
        dt: f32,
        multiplier: f32,
        config: &PerceptionConfig,
        actors: &dyn ActorOracle,
        traces: Option<&dyn TraceOracle>,
    ) {
        let owner = self.owner;
        let target = self.targets[index].target;
        self.targets[index].last_visibility = TargetPointVisibility::default();

        let mut seen = None;
        if let (Some(owner_location), Some(target_location)) =
            (actors.location(owner), actors.location(target))
        {
            let distance = owner_location.distance(target_location);
            let speed = if distance > config.max_sight_distance {
                None
            } else {
                let forward = actors.forward(owner).unwrap_or(Vec3::FORWARD);
                match view_angle_degrees(owner_location, forward, target_location) {
                    None => Some(config.core_detection_speed),
                    Some(angle) if angle <= config.core_fov_degrees * 0.5 => {
                        Some(config.core_detection_speed)
                    }
                    Some(angle)
                        if angle <= config.peripheral_fov_degrees * 0.5
                            && distance <= config.peripheral_sight_distance =>
                    {
                        Some(config.peripheral_detection_speed)
                    }
                    Some(_) => None,
                }
            };

            if let (Some(speed), Some(traces)) = (speed, traces) {
                let query = SightQuery {
                    traces,
                    actors,
                    owner,
                    target,
                    eye: owner_location.raised(config.eye_height),
                    target_location,
                };
                let visibility = evaluate_line_of_sight(&query, config, &mut self.budget);
                let state = &mut self.targets[index];
                state.last_visibility = visibility;
                if visibility.has_line_of_sight() {
                    state.last_known_location = Some(target_location);
                    seen = Some(speed);
                }
            }
        }

        self.integrate_target(index, seen, multiplier, dt, config);
    }

    /// Applies one step of awareness gain or decay plus hearing, then
    /// re-thresholds the target.
    fn integrate_target(
        &mut self,
        index: usize,
        seen_speed: Option<f32>,
        multiplier: f32,
        dt: f32,
        config: &PerceptionConfig,
    ) {
        let state = &mut self.targets[index];
        match seen_speed {
            Some(speed) => {
                state.sight_score = 1.0;
                state.awareness += speed * multiplier.max(0.0) * dt;
                state.time_since_last_seen = 0.0;
            }
            None => {
                state.sight_score = 0.0;
                state.awareness -= config.detection_decay_per_second * dt;
                state.time_since_last_seen += dt;
            }
        }
        state.awareness += state.hearing_score * dt;
        state.hearing_score = (state.hearing_score - dt).max(0.0);
        state.awareness = clamp01(state.awareness);
        self.rethreshold_target(index, config);
    }

    /// Suppressed step: awareness only decays. Pending hearing is left as is.
    fn decay_target(&mut self, index: usize, dt: f32, config: &PerceptionConfig) {
        let state = &mut self.targets[index];
        state.sight_score = 0.0;
        state.awareness = (state.awareness - config.detection_decay_per_second * dt).max(0.0);
        state.time_since_last_seen += dt;
        self.rethreshold_target(index, config);
    }

    fn rethreshold_target(&mut self, index: usize, config: &PerceptionConfig) {
        let state = &mut self.targets[index];
        let old = state.state;
        let new = config.thresholds.state_for(state.awareness);
        state.state = new;
        if old != new {
            let event = PerceptionEvent::TargetPerceptionChanged {
                owner: self.owner,
                target: state.target,
                old,
                new,
                awareness: state.awareness,
            };
            self.emit_perception(event);
        }
    }

    /// Rebuilds the watch list: primary target first, then watched kinds in
    /// oracle order. Known states are kept, new ones start unaware.
    fn refresh_targets(&mut self, actors: &dyn ActorOracle) {
        let owner = self.owner;
        let mut watch: Vec<ActorHandle> = Vec::new();
        if let Some(primary) = self.primary_target
            && primary != owner
            && actors.is_live(primary)
        {
            watch.push(primary);
        }
        for kind in &self.watched_kinds {
            for actor in actors.actors_of_kind(kind) {
                if actor != owner && !watch.contains(&actor) && actors.is_live(actor) {
                    watch.push(actor);
                }
            }
        }

        let mut previous = std::mem::take(&mut self.targets);
        self.targets = watch
            .into_iter()
            .map(|actor| {
                previous
                    .iter()
                    .position(|state| state.target == actor)
                    .map(|i| previous.swap_remove(i))
                    .unwrap_or_else(|| PerceivedTargetState::new(actor))
            })
            .collect();
    }

    fn primary_index(&self) -> Option<usize> {
        self.targets
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, state)| match best {
                Some((_, awareness)) if awareness >= state.awareness => best,
                _ => Some((i, state.awareness)),
            })
            .map(|(i, _)| i)
    }

    fn primary_sight_strength(&self, config: &PerceptionConfig) -> f32 {
        let Some(primary) = self.primary_index().map(|i| &self.targets[i]) else {
            return 0.0;
        };
        if primary.sight_score <= 0.0 {
            0.0
        } else if config.target_points.enabled {
            visibility_suspicion_multiplier(&primary.last_visibility, &config.visibility)
        } else {
            1.0
        }
    }

    fn run_shadow_check(
        &mut self,
        now: f64,
        config: &PerceptionConfig,
        env: &StealthEnv<'_>,
        stealth: &GlobalStealthAggregator,
    ) -> bool {
        if !self.shadow.is_eligible(now, &config.shadow) {
            return false;
        }
        let (Ok(traces), Ok(actors)) = (env.traces(), env.actors()) else {
            return false;
        };
        let Some(subject) = stealth.tracked_subject().filter(|s| actors.is_live(*s)) else {
            return false;
        };
        let Some(owner_location) = actors.location(self.owner) else {
            return false;
        };
        let check = ShadowCheck {
            now,
            owner: self.owner,
            eye: owner_location.raised(config.eye_height),
            subject,
            candidate: stealth.shadow_candidate(),
            traces,
            rng: env.rng().ok(),
            session_seed: self.session_seed,
        };
        let seen = self.shadow.run(&check, &config.shadow, &mut self.budget);
        if seen {
            tracing::trace!("Agent {} saw the subject's shadow", self.owner);
        }
        seen
    }

    /// Emits suspicion edges and the change event, then reports to the
    /// aggregator when due.
    fn dispatch_suspicion(
        &mut self,
        step: SuspicionStep,
        now: f64,
        guard: &GuardConfig,
        stealth: &mut GlobalStealthAggregator,
        force_report: bool,
        reason: Option<SuspicionReason>,
    ) {
        let owner = self.owner;
        let suspicion01 = self.suspicion.normalized(guard);
        for signal in step.signals {
            let event = match signal {
                SuspicionSignal::Spotted => PerceptionEvent::Spotted { owner, suspicion01 },
                SuspicionSignal::Lost => PerceptionEvent::Lost { owner, suspicion01 },
                SuspicionSignal::FullyAlerted => PerceptionEvent::FullyAlerted { owner },
                SuspicionSignal::LostSight => PerceptionEvent::LostSight { owner },
            };
            tracing::debug!("Agent {} suspicion signal {:?} at {:.2}", owner, signal, suspicion01);
            self.emit_perception(event);
        }

        let location = self.focus_location();
        if step.changed {
            self.emit_suspicion(PerceptionEvent::SuspicionChanged {
                owner,
                suspicion01,
                location,
            });
        }

        if self.suspicion.take_report(now, force_report, guard) {
            let reason = reason.unwrap_or_else(|| self.suspicion.sense().into());
            let mut report = AiSuspicionReport::new(owner, suspicion01, now).with_reason(reason);
            if let Some(location) = location {
                report = report.with_location(location);
            }
            if let Some(target) = self.primary_index().map(|i| self.targets[i].target) {
                report = report.with_instigator(target);
            }
            stealth.report_ai_suspicion_ex(report);
        }
    }

    fn apply_highest_state(&mut self, stealth: &mut GlobalStealthAggregator) {
        let highest = self
            .targets
            .iter()
            .map(|state| state.state)
            .max()
            .unwrap_or(PerceptionState::Unaware);
        self.set_perception_state(highest, stealth);
    }

    /// Changes the agent state, flagging detection on the Alerted edges.
    pub fn set_perception_state(
        &mut self,
        new: PerceptionState,
        stealth: &mut GlobalStealthAggregator,
    ) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        tracing::debug!("Agent {} perception {} -> {}", self.owner, old, new);

        if new == PerceptionState::Alerted {
            stealth.report_enemy_detection_event(Some(self.owner), true);
        } else if old == PerceptionState::Alerted {
            stealth.report_enemy_detection_event(Some(self.owner), false);
        }
        self.emit_perception(PerceptionEvent::StateChanged {
            owner: self.owner,
            old,
            new,
        });
    }

    fn focus_location(&self) -> Option<Vec3> {
        self.primary_index()
            .and_then(|i| self.targets[i].last_known_location)
            .or_else(|| self.stimuli.last_location())
    }

    fn emit_telemetry(&mut self, now: f64, config: &PerceptionConfig) {
        let interval = config.telemetry_interval_seconds;
        if interval <= 0.0 || now < self.telemetry_next_at {
            return;
        }
        self.telemetry_next_at = now + f64::from(interval);
        tracing::debug!(
            "Perception {}: state={} targets={} suspicion={:.2} sense={} shadow_checks={}",
            self.owner,
            self.state,
            self.targets.len(),
            self.suspicion.value(),
            self.suspicion.sense(),
            self.shadow.checks()
        );
    }

    // ------------------------------------------------------------------
    // Stimuli
    // ------------------------------------------------------------------

    /// Routes a reported noise. Returns whether the agent accepted it.
    pub fn handle_reported_noise(
        &mut self,
        noise: &NoiseEvent,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> bool {
        let Some(config) = self.perception.clone() else {
            return false;
        };
        let (Ok(now), Ok(actors)) = (env.now(), env.actors()) else {
            return false;
        };
        let Some(owner_location) = actors.location(self.owner) else {
            return false;
        };
        let fallback = GuardConfig::default();
        let guard = self.guard.clone();
        let guard_config = guard.as_deref().unwrap_or(&fallback);
        let policy = guard_config.noise_policy(noise.tag.as_deref());

        let relation = self.relation_to(actors, noise.instigator);
        if !guard_config.noise_relations.allows(relation) {
            tracing::trace!("Agent {} ignored {} noise", self.owner, relation);
            return false;
        }
        let distance = owner_location.distance(noise.location);
        let loudness = clamp01(noise.loudness01 * policy.loudness_scale);
        if distance > config.hearing_radius(loudness) {
            return false;
        }
        if policy.max_range > 0.0 && distance > policy.max_range {
            return false;
        }
        if !self
            .stimuli
            .try_start_noise_cooldown(noise.tag.as_deref(), now, policy.cooldown_seconds)
        {
            return false;
        }

        if let Some(index) = self.stimulus_target_index(noise.instigator) {
            let state = &mut self.targets[index];
            state.hearing_score = state.hearing_score.max(loudness);
            state.last_known_location = Some(noise.location);
        }
        self.stimuli.push_hearing(loudness, noise.location);

        if let Some(guard) = guard.as_deref() {
            let delta = policy.suspicion_delta01 * loudness;
            let step = self.suspicion.apply_impulse(delta, LocalSense::Hearing, now, guard);
            self.dispatch_suspicion(step, now, guard, stealth, true, None);
        }
        true
    }

    /// Routes damage taken by the owner. Returns whether it was accepted.
    pub fn apply_damage_stimulus(
        &mut self,
        damage: &DamageEvent,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> bool {
        let Some(config) = self.perception.clone() else {
            return false;
        };
        let (Ok(now), Ok(actors)) = (env.now(), env.actors()) else {
            return false;
        };
        let Some(owner_location) = actors.location(self.owner) else {
            return false;
        };
        let fallback = GuardConfig::default();
        let guard = self.guard.clone();
        let guard_config = guard.as_deref().unwrap_or(&fallback);
        let policy = guard_config.damage_policy(damage.tag.as_deref());

        let relation = self.relation_to(actors, damage.instigator);
        if !guard_config.damage_relations.allows(relation) {
            tracing::trace!("Agent {} ignored {} damage", self.owner, relation);
            return false;
        }
        let location = damage
            .location
            .or_else(|| damage.instigator.and_then(|i| actors.location(i)));
        if policy.max_range > 0.0
            && let Some(location) = location
            && owner_location.distance(location) > policy.max_range
        {
            return false;
        }
        if !self
            .stimuli
            .try_start_damage_cooldown(damage.tag.as_deref(), now, policy.cooldown_seconds)
        {
            return false;
        }

        let scale = policy.severity_scale(damage.amount);
        self.stimuli.push_damage(clamp01(scale), location, now);
        let target_index = self.stimulus_target_index(damage.instigator);
        if let Some(index) = target_index
            && let Some(location) = location
        {
            self.targets[index].last_known_location = Some(location);
        }

        if let Some(minimum) = policy.force_minimum_state {
            if let Some(index) = target_index {
                let state = &mut self.targets[index];
                state.awareness = state
                    .awareness
                    .max(awareness_floor(&config.thresholds, minimum));
                state.state = state.state.max(minimum);
            }
            let raised = self.state.max(minimum);
            self.set_perception_state(raised, stealth);
        }

        if let Some(guard) = guard.as_deref() {
            let impulse = policy.suspicion_impulse01 * scale;
            let step = self.suspicion.apply_impulse(impulse, LocalSense::Damage, now, guard);
            self.dispatch_suspicion(step, now, guard, stealth, policy.always_report, None);
        }
        true
    }

    fn relation_to(&self, actors: &dyn ActorOracle, instigator: Option<ActorHandle>) -> InstigatorRelation {
        InstigatorRelation::classify(
            self.owner,
            actors.team(self.owner),
            instigator,
            instigator.and_then(|i| actors.team(i)),
        )
    }

    /// The instigator's state when watched, else the primary target.
    fn stimulus_target_index(&self, instigator: Option<ActorHandle>) -> Option<usize> {
        instigator
            .and_then(|actor| self.targets.iter().position(|s| s.target == actor))
            .or_else(|| self.primary_index())
    }

    // ------------------------------------------------------------------
    // Scripted control
    // ------------------------------------------------------------------

    /// Jumps straight to Alerted with suspicion at the maximum.
    pub fn force_alert_to_location(
        &mut self,
        location: Vec3,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) {
        let Ok(now) = env.now() else {
            return;
        };
        if let Some(index) = self.primary_index() {
            let state = &mut self.targets[index];
            state.awareness = 1.0;
            state.state = PerceptionState::Alerted;
            state.last_known_location = Some(location);
        }
        self.stimuli.push_hearing(0.0, location);
        if let Some(guard) = self.guard.clone() {
            let step = self.suspicion.saturate(LocalSense::None, now, &guard);
            self.dispatch_suspicion(step, now, &guard, stealth, true, Some(SuspicionReason::Scripted));
        }
        self.set_perception_state(PerceptionState::Alerted, stealth);
    }

    /// Drops what the agent knows about `target`. Returns whether it was known.
    pub fn force_forget_target(&mut self, target: ActorHandle) -> bool {
        let before = self.targets.len();
        self.targets.retain(|state| state.target != target);
        before != self.targets.len()
    }

    /// Suppresses sight for `seconds` from `now`. Non-positive clears.
    pub fn suppress_perception_for_duration(&mut self, seconds: f32, now: f64) {
        self.suppressed_until = if seconds <= 0.0 {
            f64::NEG_INFINITY
        } else {
            now + f64::from(seconds)
        };
    }

    pub fn is_suppressed(&self, now: f64) -> bool {
        now < self.suppressed_until
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn awareness_of(&self, target: ActorHandle) -> f32 {
        self.target_state(target).map_or(0.0, |s| s.awareness)
    }

    pub fn has_line_of_sight(&self, target: ActorHandle) -> bool {
        self.target_state(target)
            .is_some_and(|s| s.last_visibility.has_line_of_sight())
    }

    pub fn last_known_location(&self, target: ActorHandle) -> Option<Vec3> {
        self.target_state(target).and_then(|s| s.last_known_location)
    }

    pub fn current_state(&self) -> PerceptionState {
        self.state
    }

    pub fn current_suspicion01(&self) -> f32 {
        self.guard
            .as_deref()
            .map_or(0.0, |guard| self.suspicion.normalized(guard))
    }

    pub fn is_detected(&self) -> bool {
        self.state == PerceptionState::Alerted
    }

    pub fn target_state(&self, target: ActorHandle) -> Option<&PerceivedTargetState> {
        self.targets.iter().find(|s| s.target == target)
    }

    pub fn targets(&self) -> &[PerceivedTargetState] {
        &self.targets
    }

    pub fn round_robin_index(&self) -> usize {
        self.round_robin_index
    }

    pub fn blackboard_snapshot(&self) -> BlackboardSnapshot {
        let primary = self.primary_index().map(|i| &self.targets[i]);
        BlackboardSnapshot {
            state: self.state,
            suspicion01: self.current_suspicion01(),
            sense: self.suspicion.sense(),
            primary_target: primary.map(|s| s.target),
            has_line_of_sight: primary.is_some_and(|s| s.last_visibility.has_line_of_sight()),
            last_known_location: self.focus_location(),
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Edge-triggered perception notifications.
    pub fn on_perception_event(
        &mut self,
        callback: impl FnMut(&PerceptionEvent) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.perception_observers.push(token, Box::new(callback));
        token
    }

    /// Level-triggered, throttled suspicion notifications.
    pub fn on_suspicion_changed(
        &mut self,
        callback: impl FnMut(&PerceptionEvent) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.suspicion_observers.push(token, Box::new(callback));
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.perception_observers.remove(token) || self.suspicion_observers.remove(token)
    }

    fn emit_perception(&mut self, event: PerceptionEvent) {
        self.perception_observers.notify(&event);
        if let Some(bus) = &self.bus {
            bus.publish(Event::Perception(event));
        }
    }

    fn emit_suspicion(&mut self, event: PerceptionEvent) {
        self.suspicion_observers.notify(&event);
        if let Some(bus) = &self.bus {
            bus.publish(Event::Perception(event));
        }
    }
}

/// Lowest awareness that classifies as `state`.
fn awareness_floor(thresholds: &PerceptionThresholds, state: PerceptionState) -> f32 {
    match state {
        PerceptionState::Unaware => 0.0,
        PerceptionState::SoftSuspicious => thresholds.soft_suspicious,
        PerceptionState::HardSuspicious => thresholds.hard_suspicious,
        PerceptionState::Alerted => thresholds.alerted,
    }
}
