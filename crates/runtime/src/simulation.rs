//! Fixed-timestep orchestrator.
//!
//! The simulation owns the oracles, the aggregator, the perception registry,
//! and an optional scenario director, and exposes a builder-based API for
//! clients to drive them tick by tick.
use std::path::Path;

use serde::Serialize;
use tokio::sync::broadcast;

use stealth_core::{ScoringConfig, StealthLevel, StealthTier};

use crate::aggregator::GlobalStealthAggregator;
use crate::error::Result;
use crate::events::{Event, EventBus, Topic};
use crate::oracle::OracleManager;
use crate::perception::PerceptionAgent;
use crate::registry::PerceptionRegistry;
use crate::scenario::{Scenario, ScenarioDirector, SpawnedScenario};

/// Simulation configuration.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub tick_seconds: f64,
    pub event_buffer_size: usize,
    /// Seed of every agent's schedule jitter.
    pub session_seed: u64,
}

impl SimulationConfig {
    pub const DEFAULT_TICK_SECONDS: f64 = 0.05;
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_seconds: Self::DEFAULT_TICK_SECONDS,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
            session_seed: 0,
        }
    }
}

/// Summary of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub time_seconds: f64,
    pub score: f32,
    pub tier: StealthTier,
    pub level: StealthLevel,
    pub agents_updated: usize,
    pub alerted_agents: usize,
    pub traces_used: u32,
    pub scenario_actions: usize,
}

pub struct Simulation {
    config: SimulationConfig,
    oracles: OracleManager,
    bus: EventBus,
    stealth: GlobalStealthAggregator,
    registry: PerceptionRegistry,
    director: Option<ScenarioDirector>,
    tick: u64,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Advances the clock by one tick and runs everything that is due.
    pub fn step(&mut self) -> TickReport {
        let now = self.oracles.clock().advance(self.config.tick_seconds);
        self.tick += 1;

        let scenario_actions = match &mut self.director {
            Some(director) => director.advance(&self.oracles, &mut self.stealth, &mut self.registry),
            None => 0,
        };

        self.stealth.refresh();
        let env = self.oracles.as_stealth_env();
        let updates = self.registry.tick(&env, &mut self.stealth);

        let report = TickReport {
            tick: self.tick,
            time_seconds: now,
            score: self.stealth.current_score(),
            tier: self.stealth.current_tier(),
            level: self.stealth.current_level(),
            agents_updated: updates.len(),
            alerted_agents: self.registry.alerted_agents().count(),
            traces_used: updates.iter().map(|(_, stats)| stats.traces_used).sum(),
            scenario_actions,
        };
        tracing::trace!("Tick {}: {:?}", self.tick, report);
        report
    }

    /// Runs `ticks` steps and returns the last report.
    pub fn run(&mut self, ticks: u64) -> Option<TickReport> {
        (0..ticks).map(|_| self.step()).last()
    }

    /// # Errors
    ///
    /// Returns [`crate::RuntimeError::DuplicateAgent`] for an owner already registered.
    pub fn register_agent(&mut self, agent: PerceptionAgent) -> Result<()> {
        let agent = agent
            .with_event_bus(self.bus.clone())
            .with_session_seed(self.config.session_seed);
        self.registry.register(agent)
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }

    pub fn spawned(&self) -> Option<&SpawnedScenario> {
        self.director.as_ref().map(ScenarioDirector::spawned)
    }

    pub fn scenario_finished(&self) -> bool {
        self.director.as_ref().is_none_or(ScenarioDirector::is_finished)
    }

    pub fn now(&self) -> f64 {
        self.oracles.now()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn oracles(&self) -> &OracleManager {
        &self.oracles
    }

    pub fn stealth(&self) -> &GlobalStealthAggregator {
        &self.stealth
    }

    pub fn stealth_mut(&mut self) -> &mut GlobalStealthAggregator {
        &mut self.stealth
    }

    pub fn registry(&self) -> &PerceptionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PerceptionRegistry {
        &mut self.registry
    }

    /// Stops the aggregator and drops every agent.
    pub fn shutdown(mut self) {
        self.stealth.shutdown();
        tracing::info!("Simulation stopped after {} ticks", self.tick);
    }
}

/// Builder for [`Simulation`].
pub struct SimulationBuilder {
    config: SimulationConfig,
    oracles: Option<OracleManager>,
    scoring: ScoringConfig,
    scenario: Option<Scenario>,
}

impl SimulationBuilder {
    fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
            oracles: None,
            scoring: ScoringConfig::default(),
            scenario: None,
        }
    }

    /// Override simulation configuration
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the oracle manager (defaults to an empty scene)
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Set the base scoring config
    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Spawn and script a scenario
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// # Errors
    ///
    /// Returns [`crate::RuntimeError::Scenario`] when the scenario file is unusable.
    pub fn scenario_file(self, path: &Path) -> Result<Self> {
        Ok(self.scenario(Scenario::load_from_file(path)?))
    }

    pub fn build(self) -> Result<Simulation> {
        let oracles = self.oracles.unwrap_or_else(OracleManager::fresh);
        let bus = EventBus::with_capacity(self.config.event_buffer_size);

        let spawned = self
            .scenario
            .as_ref()
            .map(|scenario| scenario.build_scene(oracles.scene()))
            .transpose()?;

        let mut stealth = GlobalStealthAggregator::builder()
            .clock(oracles.shared_clock())
            .actors(oracles.shared_actors())
            .traces(oracles.shared_traces())
            .event_bus(bus.clone())
            .config(self.scoring);
        if let Some(subject) = spawned.as_ref().and_then(SpawnedScenario::subject) {
            stealth = stealth.tracked_subject(subject);
        }
        let mut stealth = stealth.build()?;

        let director = match (self.scenario, spawned) {
            (Some(scenario), Some(spawned)) => {
                stealth.set_dominant_light_direction(scenario.light_direction);
                Some(ScenarioDirector::new(&scenario, spawned))
            }
            _ => None,
        };

        Ok(Simulation {
            config: self.config,
            oracles,
            bus,
            stealth,
            registry: PerceptionRegistry::new(),
            director,
            tick: 0,
        })
    }
}
