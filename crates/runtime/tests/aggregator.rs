use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stealth_core::config::{ScoringConfig, TierHysteresis};
use stealth_core::{
    AiAwarenessState, ActorHandle, IngestDecision, ManualClock, PlayerStealthState,
    StealthInputKind, StealthInputSample, StealthLevel, StealthModifier, StealthSample,
    StealthTier,
};
use stealth_runtime::events::{LevelTransition, TierTransition};
use stealth_runtime::{GlobalStealthAggregator, RemoveResult, ResetReason};

fn aggregator(config: ScoringConfig) -> (Arc<ManualClock>, GlobalStealthAggregator) {
    let clock = Arc::new(ManualClock::new(0.0));
    let stealth = GlobalStealthAggregator::builder()
        .clock(clock.clone())
        .config(config)
        .build()
        .expect("clock is configured");
    (clock, stealth)
}

/// Light 0.6 in line of sight: 0.6 * 0.5 + 0.3 = 0.6 local visibility.
fn exposed_sample() -> StealthSample {
    StealthSample::new(0.0)
        .with_light(0.6)
        .with_line_of_sight(true)
}

fn visibility(value: f32) -> PlayerStealthState {
    PlayerStealthState {
        local_visibility01: value,
        ..PlayerStealthState::default()
    }
}

#[test]
fn local_visibility_of_point_six_is_cautious() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default());
    stealth.report_stealth_sample(&exposed_sample());

    let breakdown = stealth.breakdown();
    assert!((stealth.player_state().local_visibility01 - 0.6).abs() < 1e-5);
    assert_eq!(breakdown.ai_suspicion01, 0.0);
    assert!((breakdown.combined_score01 - 0.3).abs() < 1e-5);
    assert_eq!(stealth.current_tier(), StealthTier::Cautious);
}

#[test]
fn cloak_zeroes_the_score_and_removal_restores_it() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default().with_blend(1.0, 0.0));
    stealth.report_stealth_sample(&exposed_sample());
    assert!((stealth.current_score() - 0.6).abs() < 1e-5);

    stealth.add_stealth_modifier(StealthModifier::new("Cloak").with_visibility_multiplier(0.0));
    assert_eq!(stealth.current_score(), 0.0);
    assert_eq!(stealth.breakdown().modifier_multiplier, 0.0);
    assert!((stealth.breakdown().combined_score01 - 0.6).abs() < 1e-5);

    assert_eq!(stealth.remove_stealth_modifier_by_source(&"Cloak".into()), 1);
    assert!((stealth.current_score() - 0.6).abs() < 1e-5);
    assert_eq!(stealth.breakdown().modifier_multiplier, 1.0);
}

#[test]
fn scores_stay_clamped_for_wild_inputs() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default());
    stealth.add_stealth_modifier(
        StealthModifier::new("boost")
            .with_visibility_multiplier(1000.0)
            .with_score_offset(10.0),
    );
    stealth.add_stealth_modifier(StealthModifier::new("nonsense").with_light_multiplier(-4.0));

    let samples = [
        StealthSample::new(0.0).with_light(5.0).with_noise(99.0).with_distance(-10.0),
        StealthSample::new(0.0).with_light(-3.0).with_distance(f32::NAN),
        StealthSample::new(0.0).with_light(f32::INFINITY).with_line_of_sight(true),
    ];
    for sample in &samples {
        stealth.report_stealth_sample(sample);
        stealth.report_ai_suspicion(ActorHandle::new(9, 0), 7.5);
        let breakdown = stealth.breakdown();
        for value in [
            breakdown.combined_score01,
            breakdown.effective_score01,
            breakdown.light01,
            breakdown.visibility01,
        ] {
            assert!((0.0..=1.0).contains(&value), "{value} out of range");
        }
    }
}

#[test]
fn tier_never_drops_while_the_score_rises() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default().with_blend(1.0, 0.0));
    let mut previous = StealthTier::Hidden;
    for step in 0..=40 {
        stealth.update_from_player(&visibility(step as f32 / 40.0));
        let tier = stealth.current_tier();
        assert!(tier >= previous, "{tier} < {previous} at step {step}");
        previous = tier;
    }
    assert_eq!(previous, StealthTier::Compromised);
}

#[test]
fn detection_edge_fires_once() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default());
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    stealth.on_detection_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let guard = ActorHandle::new(3, 0);
    stealth.report_enemy_detection_event(Some(guard), true);
    stealth.report_enemy_detection_event(Some(guard), true);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(stealth.is_player_detected());
    assert_eq!(stealth.current_score(), 1.0);
    assert_eq!(stealth.current_level(), StealthLevel::FullyDetected);

    stealth.report_enemy_detection_event(None, false);
    assert_eq!(fired.load(Ordering::SeqCst), 2);
    assert!(!stealth.is_player_detected());
    assert_eq!(stealth.current_score(), 0.0);
}

#[test]
fn detection_holds_until_every_source_clears() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default());
    let (a, b) = (ActorHandle::new(1, 0), ActorHandle::new(2, 0));
    stealth.report_enemy_detection_event(Some(a), true);
    stealth.report_enemy_detection_event(Some(b), true);
    stealth.report_enemy_detection_event(Some(a), false);
    assert!(stealth.is_player_detected());
    stealth.report_enemy_detection_event(Some(b), false);
    assert!(!stealth.is_player_detected());
}

#[test]
fn removing_one_modifier_matches_never_adding_it() {
    let a = StealthModifier::new("a").with_visibility_multiplier(0.5);
    let b = StealthModifier::new("b").with_score_offset(0.1);

    let (_clock, mut both) = aggregator(ScoringConfig::default());
    both.update_from_player(&visibility(0.8));
    both.add_stealth_modifier(a);
    both.add_stealth_modifier(b.clone());
    both.remove_stealth_modifier_by_source(&"a".into());

    let (_clock, mut only_b) = aggregator(ScoringConfig::default());
    only_b.update_from_player(&visibility(0.8));
    only_b.add_stealth_modifier(b);

    assert_eq!(both.current_score(), only_b.current_score());
    assert_eq!(both.breakdown(), only_b.breakdown());
}

#[test]
fn duplicate_source_is_an_upsert() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default().with_blend(1.0, 0.0));
    stealth.update_from_player(&visibility(0.8));
    let first = stealth.add_stealth_modifier(StealthModifier::new("smoke").with_visibility_multiplier(0.5));
    let second = stealth.add_stealth_modifier(StealthModifier::new("smoke").with_visibility_multiplier(0.25));

    assert_eq!(first, second);
    assert_eq!(stealth.modifier_count(), 1);
    assert!((stealth.current_score() - 0.2).abs() < 1e-5);
    assert_eq!(stealth.remove_stealth_modifier_by_handle(first), RemoveResult::Removed);
    assert_eq!(stealth.remove_stealth_modifier_by_handle(first), RemoveResult::NotFound);
}

#[test]
fn config_stack_overrides_and_restores() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default().with_blend(1.0, 0.0));
    stealth.update_from_player(&visibility(0.4));
    assert_eq!(stealth.current_tier(), StealthTier::Cautious);

    let strict = ScoringConfig::default()
        .with_blend(1.0, 0.0)
        .with_tiers(stealth_core::config::TierThresholds::new(0.1, 0.3, 0.6));
    let handle = stealth.push_stealth_config(strict);
    assert_eq!(stealth.config_stack_depth(), 1);
    assert_eq!(stealth.current_tier(), StealthTier::Danger);

    assert_eq!(stealth.pop_stealth_config(), Some(handle));
    assert_eq!(stealth.current_tier(), StealthTier::Cautious);
    assert_eq!(stealth.pop_stealth_config(), None);
}

#[test]
fn typed_ingest_is_gated() {
    let mut config = ScoringConfig::default();
    config.ingest.min_confidence = 0.5;
    let (_clock, mut stealth) = aggregator(config);

    let light = |t| StealthInputSample::new(StealthInputKind::Light, 0.9, t);
    assert_eq!(stealth.ingest_sample(light(0.0)).decision, IngestDecision::Accepted);
    let throttled = stealth.ingest_sample(light(0.01));
    assert_eq!(throttled.decision, IngestDecision::Throttled);
    assert_eq!(throttled.seconds_since_last_accepted, Some(0.01));
    assert_eq!(stealth.ingest_sample(light(0.2)).decision, IngestDecision::Accepted);

    let doubtful = StealthInputSample::new(StealthInputKind::Visibility, 1.0, 0.3).with_confidence(0.2);
    assert_eq!(stealth.ingest_sample(doubtful).decision, IngestDecision::LowConfidence);

    let half = StealthInputSample::new(StealthInputKind::Visibility, 1.0, 0.4).with_confidence(0.5);
    assert!(stealth.ingest_sample(half).accepted());
    assert!((stealth.player_state().local_visibility01 - 0.5).abs() < 1e-6);
}

#[test]
fn repeated_reports_earn_an_evidence_bonus() {
    let (clock, mut stealth) = aggregator(ScoringConfig::default());
    let guard = ActorHandle::new(4, 0);
    for _ in 0..3 {
        stealth.report_ai_suspicion(guard, 0.5);
        clock.advance(0.5);
    }
    let ai = stealth.breakdown().ai_suspicion01;
    assert!(ai > 0.5 && ai <= 0.75, "ai suspicion {ai}");

    // The window forgets old evidence.
    clock.advance(20.0);
    stealth.refresh();
    assert!((stealth.breakdown().ai_suspicion01 - 0.5).abs() < 1e-6);
}

#[test]
fn alertness_decays_after_the_delay() {
    let (clock, mut stealth) = aggregator(ScoringConfig::default());
    stealth.report_ai_suspicion(ActorHandle::new(5, 0), 0.95);
    assert_eq!(stealth.global_alertness(), 1.0);

    clock.set(2.0);
    stealth.refresh();
    assert_eq!(stealth.global_alertness(), 1.0);

    clock.set(5.0);
    stealth.refresh();
    assert!((stealth.global_alertness() - 0.9).abs() < 1e-4);
}

#[test]
fn reset_clears_channels_but_keeps_modifiers() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default());
    stealth.update_from_player(&visibility(0.9));
    stealth.add_stealth_modifier(StealthModifier::new("cloak").with_visibility_multiplier(0.5));
    stealth.report_enemy_detection_event(Some(ActorHandle::new(1, 0)), true);

    stealth.reset_stealth_state(ResetReason::Respawn);
    assert!(!stealth.is_player_detected());
    assert_eq!(stealth.current_score(), 0.0);
    assert_eq!(stealth.current_tier(), StealthTier::Hidden);
    assert_eq!(stealth.modifier_count(), 1);
}

/// Records every tier and level transition the aggregator announces.
fn record_transitions(
    stealth: &mut GlobalStealthAggregator,
) -> (Arc<Mutex<Vec<TierTransition>>>, Arc<Mutex<Vec<LevelTransition>>>) {
    let tiers = Arc::new(Mutex::new(Vec::new()));
    let levels = Arc::new(Mutex::new(Vec::new()));
    let sink = tiers.clone();
    stealth.on_tier_changed(move |t| sink.lock().unwrap().push(*t));
    let sink = levels.clone();
    stealth.on_level_changed(move |t| sink.lock().unwrap().push(*t));
    (tiers, levels)
}

#[test]
fn tier_and_level_events_fire_only_on_transitions() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default().with_blend(1.0, 0.0));
    let (tiers, levels) = record_transitions(&mut stealth);
    let updates = Arc::new(AtomicUsize::new(0));
    let counter = updates.clone();
    stealth.on_score_updated(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    stealth.update_from_player(&visibility(0.3));
    {
        let tiers = tiers.lock().unwrap();
        assert_eq!(tiers.len(), 1);
        assert_eq!((tiers[0].old, tiers[0].new), (StealthTier::Hidden, StealthTier::Cautious));
        assert!((tiers[0].score - 0.3).abs() < 1e-5);
        let levels = levels.lock().unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!((levels[0].old, levels[0].new), (StealthLevel::Undetected, StealthLevel::LowRisk));
    }

    // Same tier and level: the score keeps updating, the edges stay quiet.
    let before = updates.load(Ordering::SeqCst);
    stealth.update_from_player(&visibility(0.32));
    stealth.update_from_player(&visibility(0.34));
    stealth.refresh();
    assert!(updates.load(Ordering::SeqCst) >= before + 3);
    assert_eq!(tiers.lock().unwrap().len(), 1);
    assert_eq!(levels.lock().unwrap().len(), 1);

    stealth.update_from_player(&visibility(0.6));
    let tiers = tiers.lock().unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!((tiers[1].old, tiers[1].new), (StealthTier::Cautious, StealthTier::Danger));
    assert!((tiers[1].score - 0.6).abs() < 1e-5);
    let levels = levels.lock().unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!((levels[1].old, levels[1].new), (StealthLevel::LowRisk, StealthLevel::MediumRisk));
    assert!((levels[1].score - 0.6).abs() < 1e-5);
}

#[test]
fn dwell_holds_the_tier_until_refresh() {
    let config = ScoringConfig::default()
        .with_blend(1.0, 0.0)
        .with_hysteresis(TierHysteresis {
            min_seconds_between_tier_changes: 1.0,
            ..TierHysteresis::default()
        });
    let (clock, mut stealth) = aggregator(config);
    let (tiers, _levels) = record_transitions(&mut stealth);

    stealth.update_from_player(&visibility(0.3));
    assert_eq!(stealth.current_tier(), StealthTier::Cautious);

    clock.set(0.2);
    stealth.update_from_player(&visibility(0.6));
    assert_eq!(stealth.current_tier(), StealthTier::Cautious);
    stealth.refresh();
    assert_eq!(stealth.current_tier(), StealthTier::Cautious);
    assert_eq!(tiers.lock().unwrap().len(), 1);

    clock.set(1.5);
    stealth.refresh();
    assert_eq!(stealth.current_tier(), StealthTier::Danger);
    let tiers = tiers.lock().unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!((tiers[1].old, tiers[1].new), (StealthTier::Cautious, StealthTier::Danger));
    assert_eq!(tiers[1].time_seconds, 1.5);
}

#[test]
fn awareness_and_alertness_edges_fire_once() {
    let (_clock, mut stealth) = aggregator(ScoringConfig::default());
    let awareness = Arc::new(Mutex::new(Vec::new()));
    let sink = awareness.clone();
    stealth.on_awareness_changed(move |t| sink.lock().unwrap().push(*t));
    let alertness = Arc::new(AtomicUsize::new(0));
    let counter = alertness.clone();
    stealth.on_alertness_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let guard = ActorHandle::new(6, 0);
    stealth.report_ai_suspicion(guard, 0.95);
    stealth.report_ai_suspicion(guard, 0.95);

    let awareness = awareness.lock().unwrap();
    assert_eq!(awareness.len(), 1);
    assert_eq!(awareness[0].subject, guard);
    assert_eq!(awareness[0].new, AiAwarenessState::Alerted);
    assert_eq!(alertness.load(Ordering::SeqCst), 1);
}
