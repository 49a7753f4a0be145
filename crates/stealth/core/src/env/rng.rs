//! Deterministic random numbers for schedule jitter.
//!
//! Jitter spreads agents' periodic checks so they do not all fire on the same
//! tick. Seeds are derived from stable inputs so a replayed session schedules
//! identically.

/// RNG oracle. Implementations must return the same value for the same seed.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Uniform value in `[0, 1)`.
    fn unit_f32(&self, seed: u64) -> f32 {
        // 24 bits fit exactly in an f32 mantissa.
        (self.next_u32(seed) >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform value in `[min, max)`. Returns `min` for an empty range.
    fn range_f32(&self, seed: u64, min: f32, max: f32) -> f32 {
        if !(max > min) {
            return min;
        }
        min + (max - min) * self.unit_f32(seed)
    }
}

/// PCG-XSH-RR: 64-bit state, 32-bit output.
///
/// See <https://www.pcg-random.org/>.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Mixes a session seed, a per-agent counter, the agent, and a purpose tag.
///
/// `context` separates independent draws made by the same agent on the same
/// counter value (e.g. `0` for shadow-check jitter).
pub fn compute_seed(session_seed: u64, counter: u64, actor_index: u32, context: u32) -> u64 {
    let mut hash = session_seed;
    hash ^= counter.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(actor_index).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
