//! Runtime implementations of the engine's oracles.
//!
//! [`SceneOracle`] answers actor and trace queries for an in-memory world.
//! [`OracleManager`] bundles it with a clock and rng so callers can build
//! [`StealthEnv`] snapshots on demand.
mod scene;

use std::sync::Arc;

use stealth_core::{ActorOracle, ClockOracle, Env, ManualClock, PcgRng, StealthEnv, TraceOracle};

pub use scene::{ACTOR_HALF_EXTENT, ACTOR_HEIGHT, Aabb, ActorSpec, SceneOracle};

/// Shares the scene and clock between the aggregator and perception agents.
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) scene: Arc<SceneOracle>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) rng: PcgRng,
}

impl OracleManager {
    pub fn new(scene: Arc<SceneOracle>, clock: Arc<ManualClock>) -> Self {
        Self {
            scene,
            clock,
            rng: PcgRng,
        }
    }

    /// Empty scene with the clock at zero.
    pub fn fresh() -> Self {
        Self::new(Arc::new(SceneOracle::new()), Arc::new(ManualClock::new(0.0)))
    }

    pub fn as_stealth_env(&self) -> StealthEnv<'_> {
        Env::with_all(
            self.scene.as_ref(),
            self.scene.as_ref(),
            self.clock.as_ref(),
            &self.rng,
        )
        .into_stealth_env()
    }

    pub fn scene(&self) -> &Arc<SceneOracle> {
        &self.scene
    }

    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now_seconds()
    }

    /// Oracle handles for [`crate::AggregatorBuilder`].
    pub fn shared_clock(&self) -> Arc<dyn ClockOracle> {
        self.clock.clone()
    }

    pub fn shared_actors(&self) -> Arc<dyn ActorOracle> {
        self.scene.clone()
    }

    pub fn shared_traces(&self) -> Arc<dyn TraceOracle> {
        self.scene.clone()
    }
}
