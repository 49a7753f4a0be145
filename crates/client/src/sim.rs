//! Assembles a simulation from content and runs it to completion.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};

use stealth_content::{ContentFactory, GuardProfile};
use stealth_core::{ActorHandle, GuardConfig, PerceptionConfig, StealthTier};
use stealth_runtime::{
    Event, PerceptionAgent, PerceptionEvent, Simulation, SpawnedScenario, StealthEvent, TickReport,
    Topic,
};

use crate::config::SimConfig;

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub ticks: u64,
    pub time_seconds: f64,
    pub agents: usize,
    pub final_score: f32,
    pub final_tier: StealthTier,
    pub peak_score: f32,
    pub tier_changes: usize,
    pub detections: usize,
    pub traces_used: u64,
}

/// Loads the configured scenario and registers an agent per guard actor.
pub fn build_simulation(config: &SimConfig, factory: &ContentFactory) -> Result<Simulation> {
    let scoring = factory.load_scoring()?;
    let profiles = factory.load_guard_profiles()?;
    let scenario = factory.load_scenario(&config.scenario)?;
    tracing::info!(
        "Loaded scenario '{}' from {}",
        scenario.name,
        factory.data_dir().display()
    );

    let mut sim = Simulation::builder()
        .config(config.simulation_config())
        .scoring(scoring)
        .scenario(scenario)
        .build()?;
    let agents = register_guards(&mut sim, &profiles)?;
    tracing::info!("Registered {} perception agents", agents);
    Ok(sim)
}

type SharedProfile = (Arc<PerceptionConfig>, Option<Arc<GuardConfig>>);

fn register_guards(sim: &mut Simulation, profiles: &BTreeMap<String, GuardProfile>) -> Result<usize> {
    let spawned = sim.spawned().cloned().context("Scenario was not spawned")?;
    let subject = spawned.subject();
    let mut shared: BTreeMap<&str, SharedProfile> = BTreeMap::new();
    let mut registered = 0;

    for (owner, actor) in spawned.guards() {
        let Some(archetype) = actor.archetype.as_deref() else {
            continue;
        };
        let (perception, guard) = match shared.get(archetype) {
            Some(profile) => profile.clone(),
            None => {
                let profile = profiles.get(archetype).with_context(|| {
                    format!("Actor '{}' uses unknown archetype '{}'", actor.name, archetype)
                })?;
                let (name, profile) = (archetype, profile.shared());
                shared.insert(name, profile.clone());
                profile
            }
        };

        let mut agent = PerceptionAgent::new(owner).with_perception_config(perception);
        if let Some(guard) = guard {
            agent = agent.with_guard_config(guard);
        }
        for kind in &actor.watch {
            agent = agent.with_watched_kind(kind.clone());
        }
        if let Some(subject) = subject {
            agent = agent.with_primary_target(subject);
        }
        sim.register_agent(agent)?;
        tracing::debug!("Agent for '{}' ({}) as {}", actor.name, owner, archetype);
        registered += 1;
    }
    Ok(registered)
}

/// Logs bus events with actor names.
struct Narrator {
    stealth: broadcast::Receiver<Event>,
    perception: broadcast::Receiver<Event>,
    names: SpawnedScenario,
    tier_changes: usize,
    detections: usize,
}

impl Narrator {
    fn new(sim: &Simulation) -> Self {
        Self {
            stealth: sim.subscribe(Topic::Stealth),
            perception: sim.subscribe(Topic::Perception),
            names: sim.spawned().cloned().unwrap_or_default(),
            tier_changes: 0,
            detections: 0,
        }
    }

    fn name(&self, actor: ActorHandle) -> String {
        self.names
            .name_of(actor)
            .map_or_else(|| actor.to_string(), str::to_owned)
    }

    fn drain(&mut self) {
        while let Some(event) = next_event(&mut self.stealth) {
            self.narrate(event);
        }
        while let Some(event) = next_event(&mut self.perception) {
            self.narrate(event);
        }
    }

    fn narrate(&mut self, event: Event) {
        match event {
            Event::Stealth(StealthEvent::TierChanged(t)) => {
                self.tier_changes += 1;
                tracing::info!(
                    "[{:6.2}s] Tier {} -> {} (score {:.2})",
                    t.time_seconds,
                    t.old,
                    t.new,
                    t.score
                );
            }
            Event::Stealth(StealthEvent::LevelChanged(l)) => {
                tracing::debug!("Level {} -> {} (score {:.2})", l.old, l.new, l.score);
            }
            Event::Stealth(StealthEvent::DetectionChanged(d)) => {
                if d.detected {
                    self.detections += 1;
                }
                let source = d.source.map_or_else(|| "nobody".to_owned(), |s| self.name(s));
                tracing::info!("Detected: {} (by {})", d.detected, source);
            }
            Event::Stealth(StealthEvent::AwarenessChanged(a)) => {
                tracing::info!("{} is now {}", self.name(a.subject), a.new);
            }
            Event::Stealth(StealthEvent::AlertnessChanged(a)) => {
                tracing::debug!("Global alertness {:.2} -> {:.2}", a.old, a.new);
            }
            Event::Stealth(StealthEvent::ScoreUpdated(_) | StealthEvent::SuspicionReported(_)) => {}
            Event::Perception(PerceptionEvent::StateChanged { owner, old, new }) => {
                tracing::info!("{} perception {} -> {}", self.name(owner), old, new);
            }
            Event::Perception(PerceptionEvent::Spotted { owner, suspicion01 }) => {
                tracing::info!("{} spotted something ({:.2})", self.name(owner), suspicion01);
            }
            Event::Perception(PerceptionEvent::Lost { owner, .. }) => {
                tracing::info!("{} lost the trail", self.name(owner));
            }
            Event::Perception(PerceptionEvent::FullyAlerted { owner }) => {
                tracing::info!("{} is fully alerted", self.name(owner));
            }
            Event::Perception(event) => {
                tracing::trace!("{:?}", event);
            }
        }
    }
}

fn next_event(rx: &mut broadcast::Receiver<Event>) -> Option<Event> {
    loop {
        match rx.try_recv() {
            Ok(event) => return Some(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Event log lagged; skipped {} events", skipped);
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
        }
    }
}

/// Runs the configured number of ticks. `on_tick` sees every report.
pub fn run(
    config: &SimConfig,
    factory: &ContentFactory,
    mut on_tick: impl FnMut(&TickReport) -> Result<()>,
) -> Result<RunSummary> {
    let mut sim = build_simulation(config, factory)?;
    let mut narrator = Narrator::new(&sim);
    let agents = sim.registry().len();

    let mut last = None;
    let mut peak_score = 0.0_f32;
    let mut traces_used = 0_u64;
    for _ in 0..config.ticks {
        let report = sim.step();
        narrator.drain();
        peak_score = peak_score.max(report.score);
        traces_used += u64::from(report.traces_used);
        on_tick(&report)?;
        last = Some(report);
    }

    let summary = RunSummary {
        scenario: config.scenario.clone(),
        ticks: sim.tick_count(),
        time_seconds: sim.now(),
        agents,
        final_score: last.map_or(sim.stealth().current_score(), |r| r.score),
        final_tier: sim.stealth().current_tier(),
        peak_score,
        tier_changes: narrator.tier_changes,
        detections: narrator.detections,
        traces_used,
    };
    tracing::info!(
        "Finished '{}' after {} ticks: tier {}, peak score {:.2}, {} detections",
        summary.scenario,
        summary.ticks,
        summary.final_tier,
        summary.peak_score,
        summary.detections
    );
    sim.shutdown();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled(ticks: u64) -> SimConfig {
        SimConfig {
            ticks,
            ..SimConfig::default()
        }
    }

    #[test]
    fn bundled_courtyard_runs() {
        let config = bundled(500);
        let mut seen = 0;
        let summary = run(&config, &ContentFactory::bundled(), |_| {
            seen += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, 500);
        assert_eq!(summary.ticks, 500);
        assert_eq!(summary.agents, 3);
        assert!(summary.traces_used > 0);
        assert!((0.0..=1.0).contains(&summary.peak_score));
        // The script force-alerts the camera.
        assert!(summary.detections >= 1);
    }

    #[test]
    fn unknown_scenario_fails_to_build() {
        let config = SimConfig {
            scenario: "nowhere".into(),
            ..SimConfig::default()
        };
        assert!(build_simulation(&config, &ContentFactory::bundled()).is_err());
    }

    #[test]
    fn tick_callback_errors_stop_the_run() {
        let result = run(&bundled(10), &ContentFactory::bundled(), |report| {
            anyhow::ensure!(report.tick < 3, "stop");
            Ok(())
        });
        assert!(result.is_err());
    }
}
