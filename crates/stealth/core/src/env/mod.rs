//! Traits describing the collaborators the engine consumes.
//!
//! Oracles expose actor placement, line traces, time, and deterministic
//! randomness. The [`Env`] aggregate bundles them so perception code can reach
//! everything it needs without hard coupling to a concrete world.
mod clock;
mod rng;
mod world;

pub use clock::{ClockOracle, ManualClock, MonotonicClock};
pub use rng::{PcgRng, RngOracle, compute_seed};
pub use world::{ActorOracle, TraceHit, TraceOracle};

use crate::error::OracleError;

/// Aggregates the oracles used by a perception update.
pub struct Env<'a, T, A, C, R>
where
    T: TraceOracle + ?Sized,
    A: ActorOracle + ?Sized,
    C: ClockOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    traces: Option<&'a T>,
    actors: Option<&'a A>,
    clock: Option<&'a C>,
    rng: Option<&'a R>,
}

pub type StealthEnv<'a> =
    Env<'a, dyn TraceOracle + 'a, dyn ActorOracle + 'a, dyn ClockOracle + 'a, dyn RngOracle + 'a>;

impl<'a, T, A, C, R> Env<'a, T, A, C, R>
where
    T: TraceOracle + ?Sized,
    A: ActorOracle + ?Sized,
    C: ClockOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    pub fn new(
        traces: Option<&'a T>,
        actors: Option<&'a A>,
        clock: Option<&'a C>,
        rng: Option<&'a R>,
    ) -> Self {
        Self {
            traces,
            actors,
            clock,
            rng,
        }
    }

    pub fn with_all(traces: &'a T, actors: &'a A, clock: &'a C, rng: &'a R) -> Self {
        Self::new(Some(traces), Some(actors), Some(clock), Some(rng))
    }

    pub fn empty() -> Self {
        Self {
            traces: None,
            actors: None,
            clock: None,
            rng: None,
        }
    }

    /// # Errors
    ///
    /// Returns `OracleError::TracesNotAvailable` if no trace oracle was provided.
    pub fn traces(&self) -> Result<&'a T, OracleError> {
        self.traces.ok_or(OracleError::TracesNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::ActorsNotAvailable` if no actor oracle was provided.
    pub fn actors(&self) -> Result<&'a A, OracleError> {
        self.actors.ok_or(OracleError::ActorsNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::ClockNotAvailable` if no clock was provided.
    pub fn clock(&self) -> Result<&'a C, OracleError> {
        self.clock.ok_or(OracleError::ClockNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::RngNotAvailable` if no rng oracle was provided.
    pub fn rng(&self) -> Result<&'a R, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }

    /// Current time from the clock oracle.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ClockNotAvailable` if no clock was provided.
    pub fn now(&self) -> Result<f64, OracleError> {
        Ok(self.clock()?.now_seconds())
    }
}

impl<T, A, C, R> Clone for Env<'_, T, A, C, R>
where
    T: TraceOracle + ?Sized,
    A: ActorOracle + ?Sized,
    C: ClockOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A, C, R> Copy for Env<'_, T, A, C, R>
where
    T: TraceOracle + ?Sized,
    A: ActorOracle + ?Sized,
    C: ClockOracle + ?Sized,
    R: RngOracle + ?Sized,
{
}

impl<'a, T, A, C, R> Env<'a, T, A, C, R>
where
    T: TraceOracle + 'a,
    A: ActorOracle + 'a,
    C: ClockOracle + 'a,
    R: RngOracle + 'a,
{
    /// Converts this environment into a trait-object based [`StealthEnv`].
    pub fn into_stealth_env(self) -> StealthEnv<'a> {
        let traces: Option<&'a dyn TraceOracle> = self.traces.map(|t| t as _);
        let actors: Option<&'a dyn ActorOracle> = self.actors.map(|a| a as _);
        let clock: Option<&'a dyn ClockOracle> = self.clock.map(|c| c as _);
        let rng: Option<&'a dyn RngOracle> = self.rng.map(|r| r as _);
        Env::new(traces, actors, clock, rng)
    }
}
