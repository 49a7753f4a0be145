//! Global stealth aggregator.
//!
//! Owns the config stack, the modifier stack, the ingested channels of the
//! tracked subject, and per-AI suspicion records. Every ingest recomputes the
//! breakdown synchronously and notifies observers before returning.
mod records;
mod stack;
mod tier;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use stealth_core::config::ScoringConfig;
use stealth_core::scoring::{ModifierTotals, blend_combined, modifier_multiplier, sample_visibility};
use stealth_core::{
    ActorHandle, ActorOracle, AiAwarenessState, AiSuspicionReport, ClockOracle, IngestDecision,
    IngestReport, PlayerStealthState, ShadowCandidate, SourceId, StackHandle, StealthInputKind,
    StealthInputSample, StealthLevel, StealthModifier, StealthSample, StealthScoreBreakdown,
    StealthTier, TraceOracle, Vec3, clamp01,
};

use crate::error::{Result, RuntimeError};
use crate::events::{
    AlertnessChange, AwarenessTransition, DetectionChange, Event, EventBus, LevelTransition,
    ObserverList, StealthEvent, SubscriptionToken, TierTransition, TokenSource,
};
use crate::shadow::{ShadowCandidateCache, ShadowQuery};

pub use records::{AiRecord, Alertness};
pub use stack::{PriorityStack, StackEntry};
pub use tier::TierTracker;

/// Outcome of removing a stack entry by handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RemoveResult {
    Removed,
    NotFound,
}

/// Why the per-run stealth state was cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ResetReason {
    Respawn,
    LevelLoad,
    Checkpoint,
    Scripted,
}

/// A modifier together with the actor whose lifetime bounds it.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifierEntry {
    pub modifier: StealthModifier,
    pub owner: Option<ActorHandle>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfigEntrySummary {
    pub handle: StackHandle,
    pub priority: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ModifierSummary {
    pub handle: StackHandle,
    pub priority: i32,
    pub source_id: String,
    pub owner: Option<ActorHandle>,
}

/// Serializable view of the active tuning and both stacks.
#[derive(Clone, Debug, Serialize)]
pub struct TuningSummary {
    pub active_config: ScoringConfig,
    pub config_stack: Vec<ConfigEntrySummary>,
    pub modifiers: Vec<ModifierSummary>,
    pub totals: ModifierTotals,
}

#[derive(Default)]
struct Observers {
    level_changed: ObserverList<LevelTransition>,
    tier_changed: ObserverList<TierTransition>,
    detection_changed: ObserverList<DetectionChange>,
    awareness_changed: ObserverList<AwarenessTransition>,
    score_updated: ObserverList<StealthScoreBreakdown>,
    suspicion_reported: ObserverList<AiSuspicionReport>,
    alertness_changed: ObserverList<AlertnessChange>,
}

impl Observers {
    fn remove(&mut self, token: SubscriptionToken) -> bool {
        self.level_changed.remove(token)
            || self.tier_changed.remove(token)
            || self.detection_changed.remove(token)
            || self.awareness_changed.remove(token)
            || self.score_updated.remove(token)
            || self.suspicion_reported.remove(token)
            || self.alertness_changed.remove(token)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Builder for [`GlobalStealthAggregator`].
pub struct AggregatorBuilder {
    clock: Option<Arc<dyn ClockOracle>>,
    actors: Option<Arc<dyn ActorOracle>>,
    traces: Option<Arc<dyn TraceOracle>>,
    bus: Option<EventBus>,
    config: ScoringConfig,
    tracked_subject: Option<ActorHandle>,
}

impl AggregatorBuilder {
    fn new() -> Self {
        Self {
            clock: None,
            actors: None,
            traces: None,
            bus: None,
            config: ScoringConfig::default(),
            tracked_subject: None,
        }
    }

    /// Set the required time source
    pub fn clock(mut self, clock: Arc<dyn ClockOracle>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Liveness of reporters and modifier owners, and the shadow subject's location
    pub fn actors(mut self, actors: Arc<dyn ActorOracle>) -> Self {
        self.actors = Some(actors);
        self
    }

    /// Trace provider for the shadow candidate cache
    pub fn traces(mut self, traces: Arc<dyn TraceOracle>) -> Self {
        self.traces = Some(traces);
        self
    }

    /// Mirror every notification onto [`crate::events::Topic::Stealth`]
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Base config used when the override stack is empty
    pub fn config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tracked_subject(mut self, subject: ActorHandle) -> Self {
        self.tracked_subject = Some(subject);
        self
    }

    pub fn build(self) -> Result<GlobalStealthAggregator> {
        let clock = self.clock.ok_or(RuntimeError::MissingClock)?;
        if let Err(err) = self.config.validate() {
            tracing::warn!("Base stealth config is invalid ({}); using sanitized copy", err);
        }
        let base = self.config.sanitized();

        let mut aggregator = GlobalStealthAggregator {
            clock,
            actors: self.actors,
            traces: self.traces,
            bus: self.bus,
            active_config: base.clone(),
            base_config: base,
            config_stack: PriorityStack::new(),
            modifiers: PriorityStack::new(),
            next_stack_id: 1,
            player: PlayerStealthState::default(),
            perception_channel01: 0.0,
            custom_channel01: 0.0,
            guards: BTreeMap::new(),
            detection_sources: BTreeSet::new(),
            detected: false,
            breakdown: StealthScoreBreakdown::default(),
            tier: TierTracker::default(),
            level: StealthLevel::Undetected,
            alertness: Alertness::default(),
            last_accepted: [None; StealthInputKind::COUNT],
            shadow: ShadowCandidateCache::new(),
            light_direction: None,
            tracked_subject: self.tracked_subject,
            active: true,
            tokens: TokenSource::new(),
            observers: Observers::default(),
        };
        let now = aggregator.now();
        aggregator.alertness.decay(now, &aggregator.active_config.alertness);
        aggregator.recompute(now);
        Ok(aggregator)
    }
}

/// Process-wide stealth score service.
pub struct GlobalStealthAggregator {
    clock: Arc<dyn ClockOracle>,
    actors: Option<Arc<dyn ActorOracle>>,
    traces: Option<Arc<dyn TraceOracle>>,
    bus: Option<EventBus>,

    base_config: ScoringConfig,
    config_stack: PriorityStack<ScoringConfig>,
    active_config: ScoringConfig,
    modifiers: PriorityStack<ModifierEntry>,
    next_stack_id: u64,

    player: PlayerStealthState,
    perception_channel01: f32,
    custom_channel01: f32,
    guards: BTreeMap<ActorHandle, AiRecord>,
    /// `None` is an anonymous (scripted) reporter.
    detection_sources: BTreeSet<Option<ActorHandle>>,
    detected: bool,

    breakdown: StealthScoreBreakdown,
    tier: TierTracker,
    level: StealthLevel,
    alertness: Alertness,
    last_accepted: [Option<f64>; StealthInputKind::COUNT],

    shadow: ShadowCandidateCache,
    light_direction: Option<Vec3>,
    tracked_subject: Option<ActorHandle>,

    active: bool,
    tokens: TokenSource,
    observers: Observers,
}

impl GlobalStealthAggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::new()
    }

    fn now(&self) -> f64 {
        self.clock.now_seconds()
    }

    // ------------------------------------------------------------------
    // Ingest
    // ------------------------------------------------------------------

    /// Folds one raw sample into the subject's channels.
    pub fn report_stealth_sample(&mut self, sample: &StealthSample) {
        if !self.active {
            return;
        }
        let light = clamp01(sample.light_exposure);
        self.player.local_visibility01 = sample_visibility(sample, &self.active_config.weights);
        self.player.light_level01 = light;
        self.player.shadow_level01 = 1.0 - light;
        self.player.movement_noise01 = clamp01(sample.noise_level);
        self.player.cover_exposure01 = if sample.in_cover { 0.0 } else { 1.0 };

        let now = self.now();
        self.refresh_shadow(now);
        self.recompute(now);
    }

    /// Typed ingest with confidence gating and per-kind throttling.
    pub fn ingest_sample(&mut self, sample: StealthInputSample) -> IngestReport {
        let index = sample.kind.index();
        let since = self.last_accepted[index].map(|t| sample.time_seconds - t);
        let report = |decision| IngestReport {
            kind: sample.kind,
            decision,
            seconds_since_last_accepted: since,
        };

        if !self.active {
            return report(IngestDecision::Inactive);
        }
        let tuning = &self.active_config.ingest;
        if !(sample.confidence01 >= tuning.min_confidence) {
            tracing::debug!(
                "Dropped {} sample: confidence {:.2} below {:.2}",
                sample.kind,
                sample.confidence01,
                tuning.min_confidence
            );
            return report(IngestDecision::LowConfidence);
        }
        let min_interval = f64::from(tuning.min_interval(sample.kind));
        if min_interval > 0.0
            && let Some(dt) = since
            && dt < min_interval
        {
            tracing::trace!("Throttled {} sample ({:.3}s since last)", sample.kind, dt);
            return report(IngestDecision::Throttled);
        }

        self.last_accepted[index] = Some(sample.time_seconds);
        let strength = clamp01(sample.strength01);
        let confidence = clamp01(sample.confidence01);
        let blend = |value: &mut f32| *value += (strength - *value) * confidence;

        match sample.kind {
            StealthInputKind::Visibility => blend(&mut self.player.local_visibility01),
            StealthInputKind::Light => {
                blend(&mut self.player.light_level01);
                self.player.shadow_level01 = 1.0 - self.player.light_level01;
            }
            StealthInputKind::Perception => blend(&mut self.perception_channel01),
            StealthInputKind::Noise => blend(&mut self.player.movement_noise01),
            StealthInputKind::Weather => blend(&mut self.player.weather_level01),
            StealthInputKind::Custom => {
                blend(&mut self.custom_channel01);
                return report(IngestDecision::Accepted);
            }
        }

        let now = self.now();
        self.refresh_shadow(now);
        self.recompute(now);
        report(IngestDecision::Accepted)
    }

    /// Bulk channel update from an external player-state source. AI suspicion
    /// and the derived fields are kept.
    pub fn update_from_player(&mut self, state: &PlayerStealthState) {
        if !self.active {
            return;
        }
        self.player.light_level01 = clamp01(state.light_level01);
        self.player.shadow_level01 = clamp01(state.shadow_level01);
        self.player.local_visibility01 = clamp01(state.local_visibility01);
        self.player.movement_noise01 = clamp01(state.movement_noise01);
        self.player.cover_exposure01 = clamp01(state.cover_exposure01);
        self.player.weather_level01 = clamp01(state.weather_level01);

        let now = self.now();
        self.refresh_shadow(now);
        self.recompute(now);
    }

    pub fn report_ai_suspicion(&mut self, guard: ActorHandle, suspicion01: f32) {
        let now = self.now();
        self.report_ai_suspicion_ex(AiSuspicionReport::new(guard, suspicion01, now));
    }

    /// Stores one AI's suspicion and recomputes.
    ///
    /// The global AI channel is the max over live reporters, each raised by
    /// its evidence bonus.
    pub fn report_ai_suspicion_ex(&mut self, mut report: AiSuspicionReport) {
        if !self.active {
            return;
        }
        let now = self.now();
        self.prune_dead_reporters();
        if let Some(actors) = &self.actors
            && !actors.is_live(report.subject)
        {
            tracing::trace!("Ignoring suspicion report from dead actor {}", report.subject);
            return;
        }

        report.suspicion01 = clamp01(report.suspicion01);
        let config = &self.active_config;
        let record = self
            .guards
            .entry(report.subject)
            .or_insert_with(|| AiRecord::new(report));
        let (old, new) = record.apply(report, &config.evidence, &config.awareness);
        self.alertness
            .raise(config.alertness.weight_for(new), now, &config.alertness);

        if old != new {
            tracing::debug!("AI {} awareness {} -> {}", report.subject, old, new);
            let transition = AwarenessTransition {
                subject: report.subject,
                old,
                new,
            };
            self.observers.awareness_changed.notify(&transition);
            self.publish(StealthEvent::AwarenessChanged(transition));
        }
        self.observers.suspicion_reported.notify(&report);
        self.publish(StealthEvent::SuspicionReported(report));
        self.emit_alertness_change();

        self.recompute(now);
    }

    /// Edge-triggered detection flag. A `None` source clearing detection
    /// clears every source.
    pub fn report_enemy_detection_event(&mut self, source: Option<ActorHandle>, detected: bool) {
        if !self.active {
            return;
        }
        match (source, detected) {
            (source, true) => {
                self.detection_sources.insert(source);
            }
            (None, false) => self.detection_sources.clear(),
            (Some(actor), false) => {
                self.detection_sources.remove(&Some(actor));
            }
        }
        let now = self.now();
        self.prune_dead_reporters();
        if self.sync_detection(source) {
            self.recompute(now);
        }
    }

    /// Re-evaluates time-based state: alertness decay, deferred tier changes,
    /// smoothing, orphaned modifiers, and the shadow candidate.
    pub fn refresh(&mut self) {
        if !self.active {
            return;
        }
        let now = self.now();
        self.prune_dead_reporters();
        self.prune_orphans();
        self.alertness.decay(now, &self.active_config.alertness);
        self.emit_alertness_change();
        self.refresh_shadow(now);
        self.recompute(now);
    }

    // ------------------------------------------------------------------
    // Modifiers
    // ------------------------------------------------------------------

    pub fn add_stealth_modifier(&mut self, modifier: StealthModifier) -> StackHandle {
        self.add_stealth_modifier_with(modifier, 0, None)
    }

    /// Adds or replaces (same non-empty source id) a modifier.
    pub fn add_stealth_modifier_with(
        &mut self,
        modifier: StealthModifier,
        priority: i32,
        owner: Option<ActorHandle>,
    ) -> StackHandle {
        let existing = if modifier.source_id.is_empty() {
            None
        } else {
            self.modifiers
                .position(|entry| entry.modifier.source_id == modifier.source_id)
        };
        let handle = match existing.and_then(|index| self.modifiers.remove_at(index)) {
            Some(previous) => {
                tracing::debug!("Replacing stealth modifier '{}'", modifier.source_id);
                previous.handle
            }
            None => self.issue_handle(),
        };
        self.modifiers
            .push(handle, priority, ModifierEntry { modifier, owner });
        self.recompute_now();
        handle
    }

    /// Removes every modifier with this source id. Empty ids match nothing.
    pub fn remove_stealth_modifier_by_source(&mut self, source_id: &SourceId) -> usize {
        if source_id.is_empty() {
            return 0;
        }
        let removed = self
            .modifiers
            .remove_where(|entry| entry.modifier.source_id == *source_id);
        if removed > 0 {
            self.recompute_now();
        }
        removed
    }

    pub fn remove_stealth_modifier_by_handle(&mut self, handle: StackHandle) -> RemoveResult {
        match self.modifiers.remove(handle) {
            Some(_) => {
                self.recompute_now();
                RemoveResult::Removed
            }
            None => RemoveResult::NotFound,
        }
    }

    /// Drops modifiers whose owner is no longer live.
    pub fn prune_orphaned_modifiers(&mut self) -> usize {
        let removed = self.prune_orphans();
        if removed > 0 {
            self.recompute_now();
        }
        removed
    }

    fn prune_orphans(&mut self) -> usize {
        let Some(actors) = &self.actors else {
            return 0;
        };
        let removed = self
            .modifiers
            .remove_where(|entry| entry.owner.is_some_and(|owner| !actors.is_live(owner)));
        if removed > 0 {
            tracing::debug!("Pruned {} orphaned stealth modifier(s)", removed);
        }
        removed
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    pub fn modifier_totals(&self) -> ModifierTotals {
        ModifierTotals::from_modifiers(self.modifiers.values().map(|entry| &entry.modifier))
    }

    // ------------------------------------------------------------------
    // Config stack
    // ------------------------------------------------------------------

    pub fn push_stealth_config(&mut self, config: ScoringConfig) -> StackHandle {
        self.push_stealth_config_with(config, 0)
    }

    pub fn push_stealth_config_with(&mut self, config: ScoringConfig, priority: i32) -> StackHandle {
        if let Err(err) = config.validate() {
            tracing::warn!("Pushed stealth config is invalid ({}); using sanitized copy", err);
        }
        let handle = self.issue_handle();
        self.config_stack.push(handle, priority, config.sanitized());
        tracing::info!(
            "Pushed stealth config {} (priority {}, depth {})",
            handle,
            priority,
            self.config_stack.len()
        );
        self.apply_active_config();
        handle
    }

    /// Removes the most recently pushed config.
    pub fn pop_stealth_config(&mut self) -> Option<StackHandle> {
        let Some(entry) = self.config_stack.pop_latest() else {
            tracing::warn!("pop_stealth_config called on an empty config stack");
            return None;
        };
        tracing::info!("Popped stealth config {}", entry.handle);
        self.apply_active_config();
        Some(entry.handle)
    }

    pub fn pop_stealth_config_by_handle(&mut self, handle: StackHandle) -> RemoveResult {
        match self.config_stack.remove(handle) {
            Some(_) => {
                tracing::info!("Removed stealth config {}", handle);
                self.apply_active_config();
                RemoveResult::Removed
            }
            None => RemoveResult::NotFound,
        }
    }

    pub fn set_base_config(&mut self, config: ScoringConfig) {
        if let Err(err) = config.validate() {
            tracing::warn!("Base stealth config is invalid ({}); using sanitized copy", err);
        }
        self.base_config = config.sanitized();
        tracing::info!("Replaced base stealth config");
        self.apply_active_config();
    }

    pub fn active_config(&self) -> &ScoringConfig {
        &self.active_config
    }

    pub fn config_stack_depth(&self) -> usize {
        self.config_stack.len()
    }

    fn apply_active_config(&mut self) {
        self.active_config = self
            .config_stack
            .top()
            .cloned()
            .unwrap_or_else(|| self.base_config.clone());
        self.recompute_now();
    }

    fn issue_handle(&mut self) -> StackHandle {
        let handle = StackHandle(self.next_stack_id);
        self.next_stack_id += 1;
        handle
    }

    // ------------------------------------------------------------------
    // Shadow
    // ------------------------------------------------------------------

    pub fn set_dominant_light_direction(&mut self, direction: Option<Vec3>) {
        self.light_direction = direction;
    }

    pub fn set_tracked_subject(&mut self, subject: Option<ActorHandle>) {
        if self.tracked_subject != subject {
            self.tracked_subject = subject;
            self.shadow.reset();
        }
    }

    pub fn tracked_subject(&self) -> Option<ActorHandle> {
        self.tracked_subject
    }

    pub fn shadow_candidate(&self) -> ShadowCandidate {
        self.shadow.candidate()
    }

    fn refresh_shadow(&mut self, now: f64) {
        let illumination = self.modifier_totals().apply_light(self.player.light_level01);
        let query = ShadowQuery {
            now,
            illumination01: illumination,
            light_direction: self.light_direction,
            subject: self.tracked_subject,
            actors: self.actors.as_deref(),
            traces: self.traces.as_deref(),
        };
        self.shadow.refresh(&query, &self.active_config.shadow);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Clears per-run state. Modifiers, configs, and observers survive.
    pub fn reset_stealth_state(&mut self, reason: ResetReason) {
        if !self.active {
            return;
        }
        tracing::info!("Resetting stealth state ({})", reason);
        self.player = PlayerStealthState::default();
        self.perception_channel01 = 0.0;
        self.custom_channel01 = 0.0;
        self.guards.clear();
        self.detection_sources.clear();
        self.alertness.reset();
        self.tier.clear_history();
        self.last_accepted = [None; StealthInputKind::COUNT];
        self.shadow.reset();

        let now = self.now();
        self.sync_detection(None);
        self.emit_alertness_change();
        self.recompute(now);
    }

    /// Drops every registration and turns all ingest into no-ops.
    pub fn shutdown(&mut self) {
        self.observers.clear();
        self.guards.clear();
        self.detection_sources.clear();
        self.detected = false;
        self.modifiers.clear();
        self.config_stack.clear();
        self.active_config = self.base_config.clone();
        self.active = false;
        tracing::info!("Stealth aggregator shut down");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn effective_tuning_summary(&self) -> TuningSummary {
        TuningSummary {
            active_config: self.active_config.clone(),
            config_stack: self
                .config_stack
                .entries()
                .iter()
                .map(|e| ConfigEntrySummary {
                    handle: e.handle,
                    priority: e.priority,
                })
                .collect(),
            modifiers: self
                .modifiers
                .entries()
                .iter()
                .map(|e| ModifierSummary {
                    handle: e.handle,
                    priority: e.priority,
                    source_id: e.value.modifier.source_id.to_string(),
                    owner: e.value.owner,
                })
                .collect(),
            totals: self.modifier_totals(),
        }
    }

    pub fn dump_stacks_to_log(&self) {
        match serde_json::to_string_pretty(&self.effective_tuning_summary()) {
            Ok(json) => tracing::info!("Stealth tuning:\n{}", json),
            Err(err) => tracing::warn!("Failed to serialize stealth tuning: {}", err),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn current_score(&self) -> f32 {
        self.breakdown.effective_score01
    }

    pub fn current_tier(&self) -> StealthTier {
        self.tier.tier()
    }

    pub fn current_level(&self) -> StealthLevel {
        self.level
    }

    pub fn breakdown(&self) -> &StealthScoreBreakdown {
        &self.breakdown
    }

    pub fn player_state(&self) -> &PlayerStealthState {
        &self.player
    }

    /// Last blended value of custom inputs. Diagnostic only.
    pub fn custom_channel01(&self) -> f32 {
        self.custom_channel01
    }

    /// External perception suspicion fed through typed ingest.
    pub fn perception_channel01(&self) -> f32 {
        self.perception_channel01
    }

    pub fn is_player_detected(&self) -> bool {
        self.detected
    }

    pub fn global_alertness(&self) -> f32 {
        self.alertness.value()
    }

    pub fn ai_record(&self, guard: ActorHandle) -> Option<&AiRecord> {
        self.guards.get(&guard)
    }

    pub fn last_ai_report(&self, guard: ActorHandle) -> Option<&AiSuspicionReport> {
        self.guards.get(&guard).map(|record| &record.last_report)
    }

    pub fn awareness_state_for(&self, guard: ActorHandle) -> AiAwarenessState {
        self.guards
            .get(&guard)
            .map_or(AiAwarenessState::Calm, |record| record.awareness)
    }

    pub fn reporting_guards(&self) -> impl Iterator<Item = ActorHandle> + '_ {
        self.guards.keys().copied()
    }

    /// Score consumed by perceiving agents.
    ///
    /// Only the tracked subject has a stealth score. Any other actor, a
    /// missing actor, or a dead one is treated as fully exposed. With no
    /// tracked subject every live actor shares the global score.
    pub fn stealth_score_for(&self, actor: Option<ActorHandle>) -> f32 {
        let Some(actor) = actor else {
            return 1.0;
        };
        if self.tracked_subject.is_some_and(|subject| subject != actor) {
            return 1.0;
        }
        if let Some(actors) = &self.actors
            && !actors.is_live(actor)
        {
            return 1.0;
        }
        self.current_score()
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn on_level_changed(
        &mut self,
        callback: impl FnMut(&LevelTransition) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.level_changed.push(token, Box::new(callback));
        token
    }

    pub fn on_tier_changed(
        &mut self,
        callback: impl FnMut(&TierTransition) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.tier_changed.push(token, Box::new(callback));
        token
    }

    pub fn on_detection_changed(
        &mut self,
        callback: impl FnMut(&DetectionChange) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.detection_changed.push(token, Box::new(callback));
        token
    }

    pub fn on_awareness_changed(
        &mut self,
        callback: impl FnMut(&AwarenessTransition) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.awareness_changed.push(token, Box::new(callback));
        token
    }

    pub fn on_score_updated(
        &mut self,
        callback: impl FnMut(&StealthScoreBreakdown) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.score_updated.push(token, Box::new(callback));
        token
    }

    pub fn on_ai_suspicion_reported(
        &mut self,
        callback: impl FnMut(&AiSuspicionReport) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.suspicion_reported.push(token, Box::new(callback));
        token
    }

    pub fn on_alertness_changed(
        &mut self,
        callback: impl FnMut(&AlertnessChange) + Send + 'static,
    ) -> SubscriptionToken {
        let token = self.tokens.issue();
        self.observers.alertness_changed.push(token, Box::new(callback));
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.observers.remove(token)
    }

    // ------------------------------------------------------------------
    // Recompute
    // ------------------------------------------------------------------

    fn recompute_now(&mut self) {
        let now = self.now();
        self.recompute(now);
    }

    fn recompute(&mut self, now: f64) {
        if !self.active {
            return;
        }
        let config = &self.active_config;

        let weather = clamp01(self.player.weather_level01) * config.blend.weather_damping;
        let local = clamp01(self.player.local_visibility01 * (1.0 - weather));

        let mut ai = clamp01(self.perception_channel01);
        for record in self.guards.values_mut() {
            record.evidence.prune(now, &config.evidence);
            ai = ai.max(record.effective_suspicion(&config.evidence));
        }

        let totals =
            ModifierTotals::from_modifiers(self.modifiers.values().map(|entry| &entry.modifier));
        let combined = blend_combined(local, ai, &config.blend);
        let effective = totals.apply_score(combined);
        let smoothed = self.tier.smooth(effective, now, &config.hysteresis);
        let published = if self.detected { 1.0 } else { smoothed };

        let tier_change = self
            .tier
            .evaluate(published, now, &config.tiers, &config.hysteresis);
        let level = if self.detected {
            StealthLevel::FullyDetected
        } else {
            StealthLevel::from_score(published, &config.levels)
        };
        let old_level = std::mem::replace(&mut self.level, level);

        let light = totals.apply_light(self.player.light_level01);
        self.breakdown = StealthScoreBreakdown {
            light01: light,
            shadow01: 1.0 - light,
            visibility01: totals.apply_visibility(local),
            ai_suspicion01: ai,
            combined_score01: combined,
            effective_score01: published,
            tier: self.tier.tier(),
            level,
            modifier_multiplier: modifier_multiplier(combined, effective),
        };

        self.player.ai_suspicion01 = ai;
        self.player.stealth_score01 = published;
        self.player.tier = self.tier.tier();
        self.player.level = level;
        self.player.refresh_flags(self.detected);

        tracing::trace!(
            "Stealth recompute: local={:.3} ai={:.3} combined={:.3} published={:.3}",
            local,
            ai,
            combined,
            published
        );

        if old_level != level {
            tracing::debug!("Stealth level {} -> {} at {:.3}", old_level, level, published);
            let transition = LevelTransition {
                old: old_level,
                new: level,
                score: published,
            };
            self.observers.level_changed.notify(&transition);
            self.publish(StealthEvent::LevelChanged(transition));
        }
        if let Some((old, new)) = tier_change {
            tracing::debug!("Stealth tier {} -> {} at {:.3}", old, new, published);
            let transition = TierTransition {
                old,
                new,
                score: published,
                time_seconds: now,
            };
            self.observers.tier_changed.notify(&transition);
            self.publish(StealthEvent::TierChanged(transition));
        }

        let breakdown = self.breakdown;
        self.observers.score_updated.notify(&breakdown);
        self.publish(StealthEvent::ScoreUpdated(breakdown));
    }

    fn prune_dead_reporters(&mut self) {
        let Some(actors) = &self.actors else {
            return;
        };
        let before = self.guards.len();
        self.guards.retain(|guard, _| actors.is_live(*guard));
        if self.guards.len() != before {
            tracing::trace!("Pruned {} dead AI record(s)", before - self.guards.len());
        }
        self.detection_sources
            .retain(|source| source.is_none_or(|actor| actors.is_live(actor)));
    }

    /// Returns whether the aggregate detection flag flipped.
    fn sync_detection(&mut self, source: Option<ActorHandle>) -> bool {
        let detected = !self.detection_sources.is_empty();
        if detected == self.detected {
            return false;
        }
        self.detected = detected;
        tracing::debug!("Player detection changed: {}", detected);
        let change = DetectionChange { detected, source };
        self.observers.detection_changed.notify(&change);
        self.publish(StealthEvent::DetectionChanged(change));
        true
    }

    fn emit_alertness_change(&mut self) {
        if let Some((old, new)) = self.alertness.take_change(&self.active_config.alertness) {
            let change = AlertnessChange { old, new };
            self.observers.alertness_changed.notify(&change);
            self.publish(StealthEvent::AlertnessChanged(change));
        }
    }

    fn publish(&self, event: StealthEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(Event::Stealth(event));
        }
    }
}
