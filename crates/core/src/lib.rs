#![warn(missing_docs)]
//! Core primitives shared across the workspace.

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Scheduler tick counter (one tick per generation interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

/// Mix an integer world position into a 64-bit hash.
///
/// Stable across platforms and runs; used to key per-chunk and per-structure RNG streams.
pub fn position_seed(x: i32, y: i32, z: i32) -> u64 {
    (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (z as u64).wrapping_mul(0x1656_67B1_9E37_79F9)
}

/// Helper to derive a reproducible RNG seeded by world seed + position hash + salt.
pub fn scoped_rng(world_seed: u64, position_hash: u64, salt: u64) -> StdRng {
    let seed = world_seed ^ position_hash ^ salt;
    StdRng::seed_from_u64(seed)
}
