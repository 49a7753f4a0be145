//! Replays a scenario script against the simulation clock.
use stealth_core::{ActorHandle, ActorOracle, StealthModifier, StealthSample};

use super::{Scenario, ScriptAction, ScriptEvent, SpawnedScenario};
use crate::aggregator::GlobalStealthAggregator;
use crate::error::{Result, RuntimeError};
use crate::oracle::OracleManager;
use crate::perception::{DamageEvent, NoiseEvent};
use crate::registry::PerceptionRegistry;

pub struct ScenarioDirector {
    script: Vec<ScriptEvent>,
    cursor: usize,
    spawned: SpawnedScenario,
}

impl ScenarioDirector {
    pub fn new(scenario: &Scenario, spawned: SpawnedScenario) -> Self {
        let mut script = scenario.script.clone();
        script.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
        Self {
            script,
            cursor: 0,
            spawned,
        }
    }

    pub fn spawned(&self) -> &SpawnedScenario {
        &self.spawned
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.script.len()
    }

    /// Applies every event due at the current time. Returns how many ran.
    ///
    /// A failing event is logged and skipped.
    pub fn advance(
        &mut self,
        oracles: &OracleManager,
        stealth: &mut GlobalStealthAggregator,
        registry: &mut PerceptionRegistry,
    ) -> usize {
        let now = oracles.now();
        let mut applied = 0;
        while let Some(event) = self.script.get(self.cursor) {
            if event.at_seconds > now {
                break;
            }
            let action = event.action.clone();
            self.cursor += 1;
            match self.apply(&action, oracles, stealth, registry) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!("Scenario step at {:.2}s failed: {}", now, e),
            }
        }
        applied
    }

    fn actor(&self, name: &str) -> Result<ActorHandle> {
        self.spawned.require(name)
    }

    fn optional_actor(&self, name: Option<&String>) -> Result<Option<ActorHandle>> {
        name.map(|n| self.actor(n)).transpose()
    }

    fn apply(
        &self,
        action: &ScriptAction,
        oracles: &OracleManager,
        stealth: &mut GlobalStealthAggregator,
        registry: &mut PerceptionRegistry,
    ) -> Result<()> {
        let env = oracles.as_stealth_env();
        let scene = oracles.scene();
        tracing::debug!("Scenario action {:?}", action);

        match action {
            ScriptAction::MoveActor { actor, to } => {
                let handle = self.actor(actor)?;
                if !scene.set_location(handle, *to) {
                    return Err(RuntimeError::UnknownActor(handle));
                }
            }
            ScriptAction::FaceActor { actor, forward } => {
                let handle = self.actor(actor)?;
                if !scene.set_forward(handle, *forward) {
                    return Err(RuntimeError::UnknownActor(handle));
                }
            }
            ScriptAction::Noise {
                at,
                loudness,
                instigator,
                tag,
            } => {
                let mut noise = NoiseEvent::new(*at, *loudness);
                if let Some(instigator) = self.optional_actor(instigator.as_ref())? {
                    noise = noise.with_instigator(instigator);
                }
                if let Some(tag) = tag {
                    noise = noise.with_tag(tag.clone());
                }
                let heard = registry.try_report_noise(&noise, &env, stealth);
                tracing::debug!("Noise at {:?} heard: {}", at, heard);
            }
            ScriptAction::Damage {
                victim,
                amount,
                instigator,
                tag,
            } => {
                let victim = self.actor(victim)?;
                let mut damage = DamageEvent::new(*amount);
                if let Some(instigator) = self.optional_actor(instigator.as_ref())? {
                    damage = damage.with_instigator(instigator);
                }
                if let Some(tag) = tag {
                    damage = damage.with_tag(tag.clone());
                }
                registry.try_report_damage_stimulus(victim, &damage, &env, stealth);
            }
            ScriptAction::PushModifier {
                source,
                light_multiplier,
                visibility_multiplier,
                light_offset,
                score_offset,
                priority,
            } => {
                let modifier = StealthModifier::new(source.as_str())
                    .with_light_multiplier(*light_multiplier)
                    .with_visibility_multiplier(*visibility_multiplier)
                    .with_light_offset(*light_offset)
                    .with_score_offset(*score_offset);
                stealth.add_stealth_modifier_with(modifier, *priority, None);
            }
            ScriptAction::RemoveModifier { source } => {
                stealth.remove_stealth_modifier_by_source(&source.as_str().into());
            }
            ScriptAction::Sample {
                light,
                noise,
                in_cover,
            } => {
                let sample = self.environment_sample(oracles, registry, *light, *noise, *in_cover);
                stealth.report_stealth_sample(&sample);
            }
            ScriptAction::SetLight { direction } => {
                stealth.set_dominant_light_direction(*direction);
            }
            ScriptAction::Suppress { actor, seconds } => {
                let handle = self.actor(actor)?;
                if let Some(agent) = registry.get_mut(handle) {
                    agent.suppress_perception_for_duration(*seconds, oracles.now());
                }
            }
            ScriptAction::ForceAlert { actor, at } => {
                let handle = self.actor(actor)?;
                if let Some(agent) = registry.get_mut(handle) {
                    agent.force_alert_to_location(*at, &env, stealth);
                }
            }
            ScriptAction::Despawn { actor } => {
                let handle = self.actor(actor)?;
                scene.despawn(handle);
                registry.unregister(handle, stealth);
            }
        }
        Ok(())
    }

    /// Sample of the subject with distance to the nearest agent and line of
    /// sight as last seen by any agent.
    fn environment_sample(
        &self,
        oracles: &OracleManager,
        registry: &PerceptionRegistry,
        light: f32,
        noise: f32,
        in_cover: bool,
    ) -> StealthSample {
        let scene = oracles.scene();
        let mut sample = StealthSample::new(oracles.now())
            .with_light(light)
            .with_noise(noise)
            .with_cover(in_cover);
        let Some(subject) = self.spawned.subject() else {
            return sample;
        };
        let Some(location) = scene.location(subject) else {
            return sample;
        };

        let nearest = registry
            .agents()
            .filter_map(|agent| scene.location(agent.owner()))
            .map(|guard| guard.distance(location))
            .min_by(f32::total_cmp);
        if let Some(distance) = nearest {
            sample = sample.with_distance(distance);
        }
        let seen = registry.agents().any(|agent| agent.has_line_of_sight(subject));
        sample.with_line_of_sight(seen)
    }
}
