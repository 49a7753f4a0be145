//! Owner-keyed collection of perception agents.
//!
//! Routes world stimuli to every agent and drives their timers. Agents whose
//! owner is gone are dropped on the next tick.
use std::collections::BTreeMap;

use stealth_core::{ActorHandle, StealthEnv};

use crate::aggregator::GlobalStealthAggregator;
use crate::error::{Result, RuntimeError};
use crate::perception::{DamageEvent, NoiseEvent, PerceptionAgent, UpdateStats};

#[derive(Default)]
pub struct PerceptionRegistry {
    agents: BTreeMap<ActorHandle, PerceptionAgent>,
}

impl PerceptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`RuntimeError::DuplicateAgent`] when the owner already has one.
    pub fn register(&mut self, agent: PerceptionAgent) -> Result<()> {
        let owner = agent.owner();
        if self.agents.contains_key(&owner) {
            return Err(RuntimeError::DuplicateAgent(owner));
        }
        tracing::debug!("Registered perception agent {}", owner);
        self.agents.insert(owner, agent);
        Ok(())
    }

    /// Removes the agent, withdrawing its detection flag if it was alerted.
    pub fn unregister(
        &mut self,
        owner: ActorHandle,
        stealth: &mut GlobalStealthAggregator,
    ) -> Option<PerceptionAgent> {
        let agent = self.agents.remove(&owner)?;
        if agent.is_detected() {
            stealth.report_enemy_detection_event(Some(owner), false);
        }
        tracing::debug!("Unregistered perception agent {}", owner);
        Some(agent)
    }

    /// Ticks every agent whose timer is due.
    pub fn tick(
        &mut self,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> Vec<(ActorHandle, UpdateStats)> {
        if let Ok(actors) = env.actors() {
            let dead: Vec<ActorHandle> = self
                .agents
                .keys()
                .copied()
                .filter(|owner| !actors.is_live(*owner))
                .collect();
            for owner in dead {
                self.unregister(owner, stealth);
            }
        }

        self.agents
            .iter_mut()
            .filter_map(|(owner, agent)| agent.tick(env, stealth).map(|stats| (*owner, stats)))
            .collect()
    }

    /// Offers a noise to every agent. Returns whether any accepted it.
    pub fn try_report_noise(
        &mut self,
        noise: &NoiseEvent,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> bool {
        self.agents.values_mut().fold(false, |accepted, agent| {
            agent.handle_reported_noise(noise, env, stealth) || accepted
        })
    }

    /// Routes damage to the victim's agent.
    pub fn try_report_damage_stimulus(
        &mut self,
        victim: ActorHandle,
        damage: &DamageEvent,
        env: &StealthEnv<'_>,
        stealth: &mut GlobalStealthAggregator,
    ) -> bool {
        self.agents
            .get_mut(&victim)
            .is_some_and(|agent| agent.apply_damage_stimulus(damage, env, stealth))
    }

    pub fn alerted_agents(&self) -> impl Iterator<Item = ActorHandle> + '_ {
        self.agents
            .iter()
            .filter(|(_, agent)| agent.is_detected())
            .map(|(owner, _)| *owner)
    }

    pub fn is_anyone_alerted(&self) -> bool {
        self.alerted_agents().next().is_some()
    }

    pub fn get(&self, owner: ActorHandle) -> Option<&PerceptionAgent> {
        self.agents.get(&owner)
    }

    pub fn get_mut(&mut self, owner: ActorHandle) -> Option<&mut PerceptionAgent> {
        self.agents.get_mut(&owner)
    }

    pub fn agents(&self) -> impl Iterator<Item = &PerceptionAgent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
