//! Scenario system for actor placement and scripted demos.
//!
//! A scenario names every actor it spawns so scripts and agent setup can refer
//! to them without knowing handles. [`Scenario::build_scene`] spawns it into a
//! [`SceneOracle`]; [`ScenarioDirector`] replays the script against the clock.
mod director;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use stealth_core::{ActorHandle, TeamId, Vec3};

use crate::error::{Result, RuntimeError};
use crate::oracle::{Aabb, ActorSpec, SceneOracle};

pub use director::ScenarioDirector;

/// One actor placed by a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioActor {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub team: u8,
    pub location: Vec3,
    #[serde(default = "default_forward")]
    pub forward: Vec3,
    /// Guard archetype; actors with one get a perception agent.
    #[serde(default)]
    pub archetype: Option<String>,
    /// Actor kinds the agent watches.
    #[serde(default)]
    pub watch: Vec<String>,
}

fn default_forward() -> Vec3 {
    Vec3::FORWARD
}

impl ScenarioActor {
    pub fn spec(&self) -> ActorSpec {
        ActorSpec::new(self.name.clone(), self.kind.clone(), self.location)
            .with_team(TeamId(self.team))
            .facing(self.forward)
    }
}

/// Scripted step, keyed by actor names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScriptAction {
    MoveActor {
        actor: String,
        to: Vec3,
    },
    FaceActor {
        actor: String,
        forward: Vec3,
    },
    Noise {
        at: Vec3,
        loudness: f32,
        #[serde(default)]
        instigator: Option<String>,
        #[serde(default)]
        tag: Option<String>,
    },
    Damage {
        victim: String,
        amount: f32,
        #[serde(default)]
        instigator: Option<String>,
        #[serde(default)]
        tag: Option<String>,
    },
    PushModifier {
        source: String,
        #[serde(default = "one")]
        light_multiplier: f32,
        #[serde(default = "one")]
        visibility_multiplier: f32,
        #[serde(default)]
        light_offset: f32,
        #[serde(default)]
        score_offset: f32,
        #[serde(default)]
        priority: i32,
    },
    RemoveModifier {
        source: String,
    },
    /// Environmental sample of the subject; distance and line of sight are
    /// derived from the scene.
    Sample {
        light: f32,
        #[serde(default)]
        noise: f32,
        #[serde(default)]
        in_cover: bool,
    },
    SetLight {
        direction: Option<Vec3>,
    },
    Suppress {
        actor: String,
        seconds: f32,
    },
    ForceAlert {
        actor: String,
        at: Vec3,
    },
    Despawn {
        actor: String,
    },
}

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub at_seconds: f64,
    pub action: ScriptAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Name of the tracked subject.
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub light_direction: Option<Vec3>,
    pub actors: Vec<ScenarioActor>,
    #[serde(default)]
    pub occluders: Vec<Aabb>,
    #[serde(default)]
    pub script: Vec<ScriptEvent>,
}

impl Scenario {
    /// Parses a scenario from RON text and validates its names.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Scenario`] for malformed RON or dangling names.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let scenario: Scenario = ron::from_str(text)
            .map_err(|e| RuntimeError::Scenario(format!("failed to parse scenario RON: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// # Errors
    ///
    /// Returns [`RuntimeError::Scenario`] when the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Scenario(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_ron_str(&content)
    }

    /// Every referenced name must be placed, and placed once.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Scenario`] or [`RuntimeError::UnknownActorName`].
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeMap::new();
        for actor in &self.actors {
            if seen.insert(actor.name.as_str(), ()).is_some() {
                return Err(RuntimeError::Scenario(format!(
                    "actor name '{}' is placed twice",
                    actor.name
                )));
            }
        }
        let known = |name: &str| -> Result<()> {
            if seen.contains_key(name) {
                Ok(())
            } else {
                Err(RuntimeError::UnknownActorName(name.to_owned()))
            }
        };

        if let Some(subject) = &self.subject {
            known(subject)?;
        }
        for event in &self.script {
            match &event.action {
                ScriptAction::MoveActor { actor, .. }
                | ScriptAction::FaceActor { actor, .. }
                | ScriptAction::Suppress { actor, .. }
                | ScriptAction::ForceAlert { actor, .. }
                | ScriptAction::Despawn { actor } => known(actor)?,
                ScriptAction::Noise { instigator, .. } => {
                    if let Some(name) = instigator {
                        known(name)?;
                    }
                }
                ScriptAction::Damage {
                    victim, instigator, ..
                } => {
                    known(victim)?;
                    if let Some(name) = instigator {
                        known(name)?;
                    }
                }
                ScriptAction::PushModifier { .. }
                | ScriptAction::RemoveModifier { .. }
                | ScriptAction::Sample { .. }
                | ScriptAction::SetLight { .. } => {}
            }
        }
        Ok(())
    }

    /// Spawns every actor and occluder into `scene`.
    ///
    /// # Errors
    ///
    /// Fails validation errors the same way as [`Scenario::validate`].
    pub fn build_scene(&self, scene: &SceneOracle) -> Result<SpawnedScenario> {
        self.validate()?;
        tracing::info!(
            "Building scenario '{}' with {} actors and {} occluders",
            self.name,
            self.actors.len(),
            self.occluders.len()
        );

        for occluder in &self.occluders {
            scene.add_occluder(*occluder);
        }
        let mut names = BTreeMap::new();
        let mut guards = Vec::new();
        for actor in &self.actors {
            let handle = scene.spawn(actor.spec());
            names.insert(actor.name.clone(), handle);
            if actor.archetype.is_some() {
                guards.push((handle, actor.clone()));
            }
        }
        let subject = self
            .subject
            .as_ref()
            .and_then(|name| names.get(name).copied());

        Ok(SpawnedScenario {
            names,
            subject,
            guards,
        })
    }
}

/// Handles issued while building a scenario.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnedScenario {
    names: BTreeMap<String, ActorHandle>,
    subject: Option<ActorHandle>,
    guards: Vec<(ActorHandle, ScenarioActor)>,
}

impl SpawnedScenario {
    pub fn handle(&self, name: &str) -> Option<ActorHandle> {
        self.names.get(name).copied()
    }

    /// # Errors
    ///
    /// Returns [`RuntimeError::UnknownActorName`] for a name never spawned.
    pub fn require(&self, name: &str) -> Result<ActorHandle> {
        self.handle(name)
            .ok_or_else(|| RuntimeError::UnknownActorName(name.to_owned()))
    }

    pub fn subject(&self) -> Option<ActorHandle> {
        self.subject
    }

    /// Actors that carry a guard archetype.
    pub fn guards(&self) -> impl Iterator<Item = (ActorHandle, &ScenarioActor)> {
        self.guards.iter().map(|(handle, actor)| (*handle, actor))
    }

    pub fn name_of(&self, handle: ActorHandle) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(name, _)| name.as_str())
    }
}
