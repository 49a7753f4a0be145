//! In-memory world served through [`ActorOracle`] and [`TraceOracle`].
//!
//! Actors live in a generational arena and collide as upright boxes; static
//! occluders are axis-aligned boxes. Good enough for simulation and tests.
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use stealth_core::{ActorHandle, ActorOracle, TeamId, TraceHit, TraceOracle, Vec3};

/// Horizontal half-size of an actor's collision box.
pub const ACTOR_HALF_EXTENT: f32 = 35.0;
pub const ACTOR_HEIGHT: f32 = 180.0;

/// Named sample sockets and their height above the actor's feet.
const SOCKETS: [(&str, f32); 3] = [("head", 165.0), ("spine_03", 120.0), ("pelvis", 90.0)];

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: Vec3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Vec3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Box of an actor standing at `feet`.
    pub fn actor_at(feet: Vec3) -> Self {
        Self::new(
            Vec3::new(feet.x - ACTOR_HALF_EXTENT, feet.y - ACTOR_HALF_EXTENT, feet.z),
            Vec3::new(
                feet.x + ACTOR_HALF_EXTENT,
                feet.y + ACTOR_HALF_EXTENT,
                feet.z + ACTOR_HEIGHT,
            ),
        )
    }

    /// Entry fraction along `start -> end` (slab test), if the segment hits.
    pub fn segment_entry(&self, start: Vec3, end: Vec3) -> Option<f32> {
        let delta = end - start;
        let axes = [
            (start.x, delta.x, self.min.x, self.max.x),
            (start.y, delta.y, self.min.y, self.max.y),
            (start.z, delta.z, self.min.z, self.max.z),
        ];
        let (mut t_min, mut t_max) = (0.0_f32, 1.0_f32);
        for (origin, dir, lo, hi) in axes {
            if dir.abs() <= f32::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let (a, b) = ((lo - origin) * inv, (hi - origin) * inv);
            t_min = t_min.max(a.min(b));
            t_max = t_max.min(a.max(b));
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Placement of a new actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub team: TeamId,
    pub location: Vec3,
    #[serde(default = "default_forward")]
    pub forward: Vec3,
}

fn default_forward() -> Vec3 {
    Vec3::FORWARD
}

impl ActorSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, location: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            team: TeamId::NEUTRAL,
            location,
            forward: Vec3::FORWARD,
        }
    }

    pub fn with_team(mut self, team: TeamId) -> Self {
        self.team = team;
        self
    }

    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }
}

#[derive(Default)]
struct Slot {
    generation: u32,
    actor: Option<ActorSpec>,
}

#[derive(Default)]
struct SceneState {
    slots: Vec<Slot>,
    occluders: Vec<Aabb>,
}

impl SceneState {
    fn actor(&self, handle: ActorHandle) -> Option<&ActorSpec> {
        let slot = self.slots.get(usize::try_from(handle.index).ok()?)?;
        (slot.generation == handle.generation)
            .then_some(slot.actor.as_ref())
            .flatten()
    }

    fn actor_mut(&mut self, handle: ActorHandle) -> Option<&mut ActorSpec> {
        let slot = self.slots.get_mut(usize::try_from(handle.index).ok()?)?;
        if slot.generation == handle.generation {
            slot.actor.as_mut()
        } else {
            None
        }
    }

    fn live(&self) -> impl Iterator<Item = (ActorHandle, &ActorSpec)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let actor = slot.actor.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((ActorHandle::new(index, slot.generation), actor))
        })
    }
}

/// Mutable scene shared between the simulation and the engine.
#[derive(Default)]
pub struct SceneOracle {
    state: RwLock<SceneState>,
}

impl SceneOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SceneState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SceneState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns an actor, reusing a free slot with a bumped generation.
    pub fn spawn(&self, spec: ActorSpec) -> ActorHandle {
        let mut state = self.write();
        if let Some(index) = state.slots.iter().position(|slot| slot.actor.is_none()) {
            let slot = &mut state.slots[index];
            slot.generation = slot.generation.wrapping_add(1);
            slot.actor = Some(spec);
            return ActorHandle::new(index as u32, slot.generation);
        }
        state.slots.push(Slot {
            generation: 0,
            actor: Some(spec),
        });
        ActorHandle::new((state.slots.len() - 1) as u32, 0)
    }

    /// Returns whether the actor was live.
    pub fn despawn(&self, handle: ActorHandle) -> bool {
        let mut state = self.write();
        let Some(slot) = usize::try_from(handle.index)
            .ok()
            .and_then(|index| state.slots.get_mut(index))
        else {
            return false;
        };
        if slot.generation != handle.generation {
            return false;
        }
        slot.actor.take().is_some()
    }

    pub fn set_location(&self, handle: ActorHandle, location: Vec3) -> bool {
        self.write()
            .actor_mut(handle)
            .map(|actor| actor.location = location)
            .is_some()
    }

    pub fn set_forward(&self, handle: ActorHandle, forward: Vec3) -> bool {
        self.write()
            .actor_mut(handle)
            .map(|actor| actor.forward = forward)
            .is_some()
    }

    pub fn add_occluder(&self, occluder: Aabb) {
        self.write().occluders.push(occluder);
    }

    pub fn find_by_name(&self, name: &str) -> Option<ActorHandle> {
        self.read()
            .live()
            .find(|(_, actor)| actor.name == name)
            .map(|(handle, _)| handle)
    }

    pub fn name_of(&self, handle: ActorHandle) -> Option<String> {
        self.read().actor(handle).map(|actor| actor.name.clone())
    }

    pub fn actor_count(&self) -> usize {
        self.read().live().count()
    }
}

impl ActorOracle for SceneOracle {
    fn is_live(&self, actor: ActorHandle) -> bool {
        self.read().actor(actor).is_some()
    }

    fn location(&self, actor: ActorHandle) -> Option<Vec3> {
        self.read().actor(actor).map(|a| a.location)
    }

    fn forward(&self, actor: ActorHandle) -> Option<Vec3> {
        self.read().actor(actor).map(|a| a.forward)
    }

    fn actors_of_kind(&self, kind: &str) -> Vec<ActorHandle> {
        self.read()
            .live()
            .filter(|(_, actor)| actor.kind == kind)
            .map(|(handle, _)| handle)
            .collect()
    }

    fn socket_location(&self, actor: ActorHandle, socket: &str) -> Option<Vec3> {
        let location = self.location(actor)?;
        SOCKETS
            .iter()
            .find(|(name, _)| *name == socket)
            .map(|(_, height)| location.raised(*height))
    }

    fn team(&self, actor: ActorHandle) -> Option<TeamId> {
        self.read().actor(actor).map(|a| a.team)
    }
}

impl TraceOracle for SceneOracle {
    fn line_trace(&self, start: Vec3, end: Vec3, ignore: &[ActorHandle]) -> Option<TraceHit> {
        let state = self.read();
        let walls = state
            .occluders
            .iter()
            .filter_map(|wall| wall.segment_entry(start, end).map(|t| (t, None)));
        let bodies = state
            .live()
            .filter(|(handle, _)| !ignore.contains(handle))
            .filter_map(|(handle, actor)| {
                Aabb::actor_at(actor.location)
                    .segment_entry(start, end)
                    .map(|t| (t, Some(handle)))
            });

        let (t, actor) = walls
            .chain(bodies)
            .min_by(|a, b| a.0.total_cmp(&b.0))?;
        let length = start.distance(end);
        Some(TraceHit {
            actor,
            point: start + (end - start) * t,
            distance: length * t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_is_not_live() {
        let scene = SceneOracle::new();
        let first = scene.spawn(ActorSpec::new("a", "guard", Vec3::ZERO));
        assert!(scene.despawn(first));
        let second = scene.spawn(ActorSpec::new("b", "guard", Vec3::ZERO));
        assert_eq!(first.index, second.index);
        assert!(!scene.is_live(first));
        assert!(scene.is_live(second));
        assert!(!scene.set_location(first, Vec3::UP));
    }

    #[test]
    fn trace_hits_nearest_blocker() {
        let scene = SceneOracle::new();
        scene.add_occluder(Aabb::new(Vec3::new(400.0, -100.0, 0.0), Vec3::new(420.0, 100.0, 300.0)));
        let player = scene.spawn(ActorSpec::new("player", "player", Vec3::new(200.0, 0.0, 0.0)));

        let hit = scene
            .line_trace(Vec3::new(0.0, 0.0, 100.0), Vec3::new(600.0, 0.0, 100.0), &[])
            .expect("hit");
        assert_eq!(hit.actor, Some(player));
        assert!((hit.point.x - 165.0).abs() < 1e-3);

        let hit = scene
            .line_trace(Vec3::new(0.0, 0.0, 100.0), Vec3::new(600.0, 0.0, 100.0), &[player])
            .expect("hit");
        assert_eq!(hit.actor, None);
        assert!((hit.distance - 400.0).abs() < 1e-3);
    }

    #[test]
    fn trace_over_a_low_wall_is_clear() {
        let scene = SceneOracle::new();
        scene.add_occluder(Aabb::new(Vec3::new(400.0, -100.0, 0.0), Vec3::new(420.0, 100.0, 100.0)));
        assert!(
            scene
                .line_trace(Vec3::new(0.0, 0.0, 165.0), Vec3::new(600.0, 0.0, 165.0), &[])
                .is_none()
        );
    }

    #[test]
    fn sockets_follow_the_actor() {
        let scene = SceneOracle::new();
        let actor = scene.spawn(ActorSpec::new("p", "player", Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(
            scene.socket_location(actor, "head"),
            Some(Vec3::new(10.0, 0.0, 165.0))
        );
        assert_eq!(scene.socket_location(actor, "tail"), None);
        assert_eq!(scene.actors_of_kind("player"), vec![actor]);
    }
}
