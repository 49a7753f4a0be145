use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use stealth_core::config::{DamagePolicy, GuardConfig, PerceptionConfig};
use stealth_core::{
    ActorHandle, Env, ManualClock, PcgRng, PerceptionState, StealthEnv, TeamId, TraceHit,
    TraceOracle, Vec3,
};
use stealth_runtime::{
    Aabb, ActorSpec, DamageEvent, GlobalStealthAggregator, NoiseEvent, PerceptionAgent,
    PerceptionEvent, PerceptionRegistry, RuntimeError, SceneOracle,
};

const GUARDS: TeamId = TeamId(1);
const INTRUDERS: TeamId = TeamId(2);

/// Scene traces with a call counter.
struct CountingTraces {
    scene: Arc<SceneOracle>,
    calls: AtomicU32,
}

impl TraceOracle for CountingTraces {
    fn line_trace(&self, start: Vec3, end: Vec3, ignore: &[ActorHandle]) -> Option<TraceHit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scene.line_trace(start, end, ignore)
    }
}

struct World {
    scene: Arc<SceneOracle>,
    clock: Arc<ManualClock>,
    traces: CountingTraces,
    rng: PcgRng,
}

impl World {
    fn new() -> Self {
        let scene = Arc::new(SceneOracle::new());
        Self {
            traces: CountingTraces {
                scene: scene.clone(),
                calls: AtomicU32::new(0),
            },
            scene,
            clock: Arc::new(ManualClock::new(0.0)),
            rng: PcgRng,
        }
    }

    fn env(&self) -> StealthEnv<'_> {
        Env::with_all(&self.traces, self.scene.as_ref(), self.clock.as_ref(), &self.rng)
            .into_stealth_env()
    }

    fn stealth(&self) -> GlobalStealthAggregator {
        GlobalStealthAggregator::builder()
            .clock(self.clock.clone())
            .actors(self.scene.clone())
            .traces(self.scene.clone())
            .build()
            .expect("clock is configured")
    }

    fn take_trace_calls(&self) -> u32 {
        self.traces.calls.swap(0, Ordering::SeqCst)
    }

    fn guard_at_origin(&self) -> ActorHandle {
        self.scene
            .spawn(ActorSpec::new("guard", "guard", Vec3::ZERO).with_team(GUARDS))
    }

    fn intruder_at(&self, name: &str, location: Vec3) -> ActorHandle {
        self.scene
            .spawn(ActorSpec::new(name, "intruder", location).with_team(INTRUDERS))
    }

    /// Full-height wall across the x axis at `x`.
    fn wall_at(&self, x: f32) {
        self.scene.add_occluder(Aabb::new(
            Vec3::new(x - 10.0, -500.0, 0.0),
            Vec3::new(x + 10.0, 500.0, 400.0),
        ));
    }
}

fn watching(owner: ActorHandle, target: ActorHandle, config: PerceptionConfig) -> PerceptionAgent {
    PerceptionAgent::new(owner)
        .with_perception_config(Arc::new(config))
        .with_primary_target(target)
}

#[test]
fn out_of_range_target_is_not_traced_and_decays() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(500.0, 0.0, 0.0));
    let mut stealth = world.stealth();
    let mut agent = watching(guard, player, PerceptionConfig::default());

    agent.update_perception(&world.env(), &mut stealth);
    let seen = agent.awareness_of(player);
    assert!((seen - 0.2).abs() < 1e-5);

    world.scene.set_location(player, Vec3::new(3000.0, 0.0, 0.0));
    world.take_trace_calls();
    let stats = agent.update_perception(&world.env(), &mut stealth);

    assert_eq!(world.take_trace_calls(), 0);
    assert_eq!(stats.traces_used, 0);
    assert_eq!(stats.targets_processed, 1);
    assert!(agent.awareness_of(player) < seen);
    assert!(!agent.has_line_of_sight(player));
}

#[test]
fn awareness_grows_in_sight_and_decays_behind_cover() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(500.0, 0.0, 0.0));
    let mut stealth = world.stealth();
    let mut agent = watching(guard, player, PerceptionConfig::default());

    let mut previous = agent.awareness_of(player);
    for _ in 0..20 {
        agent.update_perception(&world.env(), &mut stealth);
        let awareness = agent.awareness_of(player);
        assert!((0.0..=1.0).contains(&awareness));
        if previous < 1.0 {
            assert!(awareness > previous, "{awareness} <= {previous}");
        }
        previous = awareness;
    }
    assert_eq!(previous, 1.0);
    assert_eq!(agent.current_state(), PerceptionState::Alerted);
    assert!(stealth.is_player_detected());
    assert_eq!(agent.last_known_location(player), Some(Vec3::new(500.0, 0.0, 0.0)));

    world.wall_at(250.0);
    for _ in 0..20 {
        agent.update_perception(&world.env(), &mut stealth);
        let awareness = agent.awareness_of(player);
        assert!((0.0..=1.0).contains(&awareness));
        if previous > 0.0 {
            assert!(awareness < previous, "{awareness} >= {previous}");
        }
        previous = awareness;
    }
    assert_eq!(previous, 0.0);
    assert_eq!(agent.current_state(), PerceptionState::Unaware);
    assert!(!stealth.is_player_detected());
}

#[test]
fn round_robin_reaches_every_target() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let targets: Vec<ActorHandle> = (0..5)
        .map(|i| world.intruder_at(&format!("t{i}"), Vec3::new(500.0, (i as f32 - 2.0) * 100.0, 0.0)))
        .collect();
    let mut stealth = world.stealth();
    let config = PerceptionConfig::default().with_max_targets_per_update(2);
    let mut agent = PerceptionAgent::new(guard)
        .with_perception_config(Arc::new(config))
        .with_watched_kind("intruder");

    let stats = agent.update_perception(&world.env(), &mut stealth);
    assert_eq!(stats.targets_total, 5);
    assert_eq!(stats.targets_processed, 2);
    assert!(stats.hit_target_cap);

    // ceil(5 / 2) updates in total.
    agent.update_perception(&world.env(), &mut stealth);
    agent.update_perception(&world.env(), &mut stealth);
    for target in targets {
        assert!(agent.awareness_of(target) > 0.0, "{target} never evaluated");
    }
}

#[test]
fn trace_budget_caps_each_update() {
    let world = World::new();
    let guard = world.guard_at_origin();
    for i in 0..4 {
        world.intruder_at(&format!("t{i}"), Vec3::new(600.0, i as f32 * 120.0, 0.0));
    }
    let mut stealth = world.stealth();
    let mut config = PerceptionConfig::default()
        .with_multi_point(true)
        .with_max_targets_per_update(0)
        .with_max_traces_per_update(3);
    config.target_points.early_out_on_core_visible = false;
    let mut agent = PerceptionAgent::new(guard)
        .with_perception_config(Arc::new(config))
        .with_watched_kind("intruder");

    for _ in 0..4 {
        world.take_trace_calls();
        let stats = agent.update_perception(&world.env(), &mut stealth);
        let calls = world.take_trace_calls();
        assert!(calls <= 3, "{calls} traces issued");
        assert_eq!(calls, stats.traces_used);
        assert!(stats.hit_trace_cap);
        assert!(stats.targets_processed < stats.targets_total);
    }
}

#[test]
fn multi_point_sees_over_a_low_wall() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(500.0, 0.0, 0.0));
    world.scene.add_occluder(Aabb::new(
        Vec3::new(300.0, -200.0, 0.0),
        Vec3::new(320.0, 200.0, 100.0),
    ));
    let mut stealth = world.stealth();

    let mut legacy = watching(guard, player, PerceptionConfig::default());
    legacy.update_perception(&world.env(), &mut stealth);
    assert!(!legacy.has_line_of_sight(player));

    let mut multi = watching(guard, player, PerceptionConfig::default().with_multi_point(true));
    multi.update_perception(&world.env(), &mut stealth);
    assert!(multi.has_line_of_sight(player));
    assert!(multi.target_state(player).is_some_and(|s| s.last_visibility.any_core_visible));
}

#[test]
fn noise_is_filtered_by_relation_and_range() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(-400.0, 0.0, 0.0));
    let friend = world
        .scene
        .spawn(ActorSpec::new("friend", "guard", Vec3::new(-300.0, 0.0, 0.0)).with_team(GUARDS));
    let mut stealth = world.stealth();
    let mut registry = PerceptionRegistry::new();
    registry
        .register(
            watching(guard, player, PerceptionConfig::default())
                .with_guard_config(Arc::new(GuardConfig::default())),
        )
        .expect("first registration");

    let env = world.env();
    let friendly = NoiseEvent::new(Vec3::new(-300.0, 0.0, 0.0), 0.5).with_instigator(friend);
    assert!(!registry.try_report_noise(&friendly, &env, &mut stealth));

    let distant = NoiseEvent::new(Vec3::new(-3000.0, 0.0, 0.0), 0.5).with_instigator(player);
    assert!(!registry.try_report_noise(&distant, &env, &mut stealth));
    assert!(stealth.ai_record(guard).is_none());

    let footstep = NoiseEvent::new(Vec3::new(-400.0, 0.0, 0.0), 0.5).with_instigator(player);
    assert!(registry.try_report_noise(&footstep, &env, &mut stealth));

    let agent = registry.get(guard).expect("registered");
    assert!((agent.current_suspicion01() - 0.075).abs() < 1e-5);
    assert_eq!(agent.blackboard_snapshot().sense, stealth_core::LocalSense::Hearing);
    let record = stealth.ai_record(guard).expect("forced report");
    assert!((record.suspicion01 - 0.075).abs() < 1e-5);
    assert_eq!(
        stealth.last_ai_report(guard).map(|r| r.reason),
        Some(stealth_core::SuspicionReason::Hearing)
    );
}

#[test]
fn damage_can_force_a_minimum_state() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(-200.0, 0.0, 0.0));
    let mut stealth = world.stealth();

    let mut guard_config = GuardConfig::default();
    guard_config.damage_by_tag.insert(
        "arrow".into(),
        DamagePolicy {
            force_minimum_state: Some(PerceptionState::HardSuspicious),
            ..DamagePolicy::default()
        },
    );
    let mut registry = PerceptionRegistry::new();
    registry
        .register(
            watching(guard, player, PerceptionConfig::default())
                .with_guard_config(Arc::new(guard_config)),
        )
        .expect("registered");

    let env = world.env();
    let arrow = DamageEvent::new(50.0).with_instigator(player).with_tag("arrow");
    assert!(!registry.try_report_damage_stimulus(player, &arrow, &env, &mut stealth));
    assert!(registry.try_report_damage_stimulus(guard, &arrow, &env, &mut stealth));

    let agent = registry.get(guard).expect("registered");
    assert_eq!(agent.current_state(), PerceptionState::HardSuspicious);
    // 0.35 impulse scaled by 50 / 25 = 2.
    assert!((agent.current_suspicion01() - 0.7).abs() < 1e-5);
    assert!(stealth.ai_record(guard).is_some());

    // Inside the cooldown.
    assert!(!registry.try_report_damage_stimulus(guard, &arrow, &env, &mut stealth));
}

#[test]
fn suppression_skips_sight() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(500.0, 0.0, 0.0));
    let mut stealth = world.stealth();
    let mut agent = watching(guard, player, PerceptionConfig::default());
    agent.update_perception(&world.env(), &mut stealth);
    let before = agent.awareness_of(player);

    agent.suppress_perception_for_duration(1.0, 0.0);
    world.take_trace_calls();
    let stats = agent.update_perception(&world.env(), &mut stealth);
    assert!(stats.suppressed);
    assert_eq!(world.take_trace_calls(), 0);
    assert!(agent.awareness_of(player) < before);

    world.clock.advance(1.5);
    let stats = agent.update_perception(&world.env(), &mut stealth);
    assert!(!stats.suppressed);
    assert!(stats.traces_used > 0);
}

#[test]
fn suppressed_update_ignores_pending_hearing() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(500.0, 0.0, 0.0));
    world.wall_at(250.0);
    let mut stealth = world.stealth();
    let mut agent = watching(guard, player, PerceptionConfig::default());
    let changes = Arc::new(AtomicU32::new(0));
    let counter = changes.clone();
    agent.on_perception_event(move |event| {
        if matches!(event, PerceptionEvent::TargetPerceptionChanged { .. }) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    agent.update_perception(&world.env(), &mut stealth);
    assert_eq!(agent.awareness_of(player), 0.0);

    let shout = NoiseEvent::new(Vec3::new(500.0, 0.0, 0.0), 1.0).with_instigator(player);
    assert!(agent.handle_reported_noise(&shout, &world.env(), &mut stealth));

    agent.suppress_perception_for_duration(5.0, 0.0);
    let stats = agent.update_perception(&world.env(), &mut stealth);
    assert!(stats.suppressed);
    assert_eq!(agent.awareness_of(player), 0.0);
    assert_eq!(agent.current_state(), PerceptionState::Unaware);
    assert_eq!(changes.load(Ordering::SeqCst), 0);

    // The heard noise is still pending once suppression ends.
    world.clock.advance(6.0);
    agent.update_perception(&world.env(), &mut stealth);
    assert!(agent.awareness_of(player) > 0.0);
}

#[test]
fn forced_alert_saturates_and_detects() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(-800.0, 0.0, 0.0));
    let mut stealth = world.stealth();
    let mut agent = watching(guard, player, PerceptionConfig::default())
        .with_guard_config(Arc::new(GuardConfig::default()));

    agent.force_alert_to_location(Vec3::new(-800.0, 0.0, 0.0), &world.env(), &mut stealth);
    assert!(agent.is_detected());
    assert_eq!(agent.current_suspicion01(), 1.0);
    assert!(stealth.is_player_detected());
    assert_eq!(
        stealth.last_ai_report(guard).map(|r| r.reason),
        Some(stealth_core::SuspicionReason::Scripted)
    );
}

#[test]
fn registry_rejects_duplicates_and_drops_dead_owners() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(-100.0, 0.0, 0.0));
    let mut stealth = world.stealth();
    let mut registry = PerceptionRegistry::new();
    registry
        .register(watching(guard, player, PerceptionConfig::default()))
        .expect("first registration");
    let duplicate = registry.register(PerceptionAgent::new(guard));
    assert!(matches!(duplicate, Err(RuntimeError::DuplicateAgent(owner)) if owner == guard));

    registry
        .get_mut(guard)
        .expect("registered")
        .force_alert_to_location(Vec3::ZERO, &world.env(), &mut stealth);
    assert!(registry.is_anyone_alerted());
    assert!(stealth.is_player_detected());

    world.scene.despawn(guard);
    let updated = registry.tick(&world.env(), &mut stealth);
    assert!(updated.is_empty());
    assert!(registry.is_empty());
    assert!(!stealth.is_player_detected());
}

#[test]
fn tick_respects_the_update_interval() {
    let world = World::new();
    let guard = world.guard_at_origin();
    let player = world.intruder_at("player", Vec3::new(500.0, 0.0, 0.0));
    let mut stealth = world.stealth();
    let mut agent = watching(guard, player, PerceptionConfig::default());

    assert!(agent.tick(&world.env(), &mut stealth).is_some());
    world.clock.advance(0.1);
    assert!(agent.tick(&world.env(), &mut stealth).is_none());
    world.clock.advance(0.15);
    assert!(agent.tick(&world.env(), &mut stealth).is_some());
}
