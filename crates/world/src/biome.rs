//! Biome system for terrain generation.
//!
//! Assigns one biome per world column from fixed geometric regions, with a
//! large-scale noise field splitting the remaining land into forest and plains.

use crate::noise::noise_2d;
use serde::{Deserialize, Serialize};

/// Columns closer than this to the world origin are lake.
pub const LAKE_RADIUS: f64 = 30.0;

/// Both coordinates must exceed this for the mountain quadrant.
pub const MOUNTAIN_THRESHOLD: f64 = 50.0;

/// Both coordinates must fall below this for the desert quadrant.
pub const DESERT_THRESHOLD: f64 = -50.0;

/// Scale of the forest/plains split field.
const FOREST_NOISE_SCALE: f64 = 300.0;

/// Biome identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BiomeId {
    Forest,
    Plains,
    Mountains,
    Desert,
    Lake,
}

impl BiomeId {
    /// Get all biome IDs (for iteration).
    pub fn all() -> &'static [BiomeId] {
        &[
            BiomeId::Forest,
            BiomeId::Plains,
            BiomeId::Mountains,
            BiomeId::Desert,
            BiomeId::Lake,
        ]
    }

    /// Lowercase name used in logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            BiomeId::Forest => "forest",
            BiomeId::Plains => "plains",
            BiomeId::Mountains => "mountains",
            BiomeId::Desert => "desert",
            BiomeId::Lake => "lake",
        }
    }
}

/// Biome at world column (x, z). First matching rule wins.
pub fn biome_at(x: f64, z: f64) -> BiomeId {
    if (x * x + z * z).sqrt() < LAKE_RADIUS {
        BiomeId::Lake
    } else if x > MOUNTAIN_THRESHOLD && z > MOUNTAIN_THRESHOLD {
        BiomeId::Mountains
    } else if x < DESERT_THRESHOLD && z < DESERT_THRESHOLD {
        BiomeId::Desert
    } else if noise_2d(x, z, FOREST_NOISE_SCALE, 1.0) > 0.0 {
        BiomeId::Forest
    } else {
        BiomeId::Plains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_lake() {
        assert_eq!(biome_at(0.0, 0.0), BiomeId::Lake);
    }

    #[test]
    fn quadrants_are_fixed() {
        assert_eq!(biome_at(60.0, 60.0), BiomeId::Mountains);
        assert_eq!(biome_at(-60.0, -60.0), BiomeId::Desert);
    }

    #[test]
    fn test_lake_boundary() {
        assert_eq!(biome_at(29.999, 0.0), BiomeId::Lake);
        assert_ne!(biome_at(30.0, 0.0), BiomeId::Lake);
    }

    #[test]
    fn quadrant_thresholds_are_exclusive() {
        assert_ne!(biome_at(50.0, 60.0), BiomeId::Mountains);
        assert_ne!(biome_at(-60.0, -50.0), BiomeId::Desert);
    }

    #[test]
    fn open_land_splits_on_noise_sign() {
        // sin(100/300) > 0 and cos(0) = 1: forest
        assert_eq!(biome_at(100.0, 0.0), BiomeId::Forest);
        // negative x flips the sign: plains
        assert_eq!(biome_at(-100.0, 0.0), BiomeId::Plains);
    }

    #[test]
    fn test_biome_assigner_determinism() {
        for x in (-200..200).step_by(13) {
            for z in (-200..200).step_by(17) {
                let (x, z) = (x as f64, z as f64);
                assert_eq!(biome_at(x, z), biome_at(x, z));
            }
        }
    }

    #[test]
    fn test_biome_all_ids() {
        let all = BiomeId::all();
        assert_eq!(all.len(), 5);
        assert!(all.contains(&BiomeId::Lake));
        assert_eq!(BiomeId::Mountains.name(), "mountains");
    }
}
