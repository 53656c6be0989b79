//! Heightmap generation for terrain.
//!
//! Converts the base height noise into a surface elevation per column, shaped by
//! the column's biome. Chunk generation and structure placement both sample it.

use crate::biome::{biome_at, BiomeId};
use crate::noise::{combined_height_noise, noise_2d, ridged_2d};

/// Lake beds sit this far below zero before detail noise.
pub const LAKE_BED_DEPTH: f64 = -5.0;

/// Surface elevation at (x, z) for a biome already computed for that column.
pub fn height_for_biome(x: f64, z: f64, biome: BiomeId) -> f64 {
    let base = combined_height_noise(x, z);
    match biome {
        BiomeId::Mountains => base + ridged_2d(x, z, 80.0, 25.0),
        BiomeId::Plains => base * 0.5,
        BiomeId::Forest => base + noise_2d(x, z, 20.0, 2.0),
        BiomeId::Desert => base * 0.7 + ridged_2d(x, z, 120.0, 5.0),
        BiomeId::Lake => LAKE_BED_DEPTH + noise_2d(x, z, 10.0, 1.0),
    }
}

/// Surface elevation at (x, z).
pub fn height_at(x: f64, z: f64) -> f64 {
    height_for_biome(x, z, biome_at(x, z))
}

/// Biome and height of one world column, computed once and reused for every voxel in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSample {
    pub biome: BiomeId,
    pub height: f64,
}

impl ColumnSample {
    /// Sample the column at (x, z).
    pub fn at(x: f64, z: f64) -> Self {
        let biome = biome_at(x, z);
        Self {
            biome,
            height: height_for_biome(x, z, biome),
        }
    }

    /// Integer surface level (`floor(height)`), used to anchor structures and flora.
    pub fn surface_y(&self) -> i32 {
        self.height.floor() as i32
    }
}
