use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of monotonically non-decreasing time in seconds.
pub trait ClockOracle: Send + Sync {
    fn now_seconds(&self) -> f64;
}

/// Clock advanced explicitly by the caller. Used for fixed-timestep
/// simulation and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start_seconds: f64) -> Self {
        Self {
            bits: AtomicU64::new(start_seconds.to_bits()),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }

    /// Advances by `dt` and returns the new time. Negative steps are ignored.
    pub fn advance(&self, dt_seconds: f64) -> f64 {
        let next = self.now_seconds() + dt_seconds.max(0.0);
        self.set(next);
        next
    }
}

impl ClockOracle for ManualClock {
    fn now_seconds(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockOracle for MonotonicClock {
    fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
