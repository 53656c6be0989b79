//! Terrain generation integrating heightmap and biome systems.
//!
//! Fills chunk buffers voxel by voxel from the column's biome and height, with
//! seeded ore and flora ornamentation and a thin cloud layer.

use crate::biome::BiomeId;
use crate::chunk::{blocks, BlockId, ChunkBuffer, WorldPos};
use crate::heightmap::ColumnSample;
use crate::noise::noise_3d;
use rand::Rng;
use tracing::{debug, instrument};
use voxstream_core::{position_seed, scoped_rng};

/// Salt mixed into the per-chunk ornamentation RNG.
pub const TERRAIN_SEED_SALT: u64 = 0x7E44_A1D5_0C3B_19F2;

/// Chance that a dirt voxel becomes shiny dirt.
pub const ORE_CHANCE: f64 = 0.05;

/// Mountain surfaces above this are bare stone.
pub const MOUNTAIN_SNOWLINE: f64 = 20.0;

/// Mountain flora only grows below this.
pub const MOUNTAIN_FLORA_LIMIT: f64 = 15.0;

/// Cloud layer: chunks whose origin y lies strictly between these bounds get clouds.
pub const CLOUD_BAND: (i32, i32) = (30, 40);

/// 3D noise threshold above which a column gets a cloud voxel.
pub const CLOUD_THRESHOLD: f64 = 0.7;

/// Flora chance per biome at the voxel just above the surface.
fn flora_for(biome: BiomeId, y: f64) -> Option<(BlockId, f64)> {
    match biome {
        BiomeId::Forest => Some((blocks::GRASS_DECO, 0.3)),
        BiomeId::Plains => Some((blocks::GRASS_DECO, 0.1)),
        BiomeId::Mountains if y < MOUNTAIN_FLORA_LIMIT => Some((blocks::GRASS_DECO, 0.05)),
        BiomeId::Desert => Some((blocks::POLE, 0.02)),
        _ => None,
    }
}

/// Surface block for a biome at height y.
fn surface_block(biome: BiomeId, y: f64) -> BlockId {
    match biome {
        BiomeId::Forest | BiomeId::Plains => blocks::GRASS,
        BiomeId::Mountains if y > MOUNTAIN_SNOWLINE => blocks::STONE,
        BiomeId::Mountains => blocks::GRASS,
        BiomeId::Desert => blocks::SHINY_DIRT,
        BiomeId::Lake => blocks::DIRT,
    }
}

/// Classify one voxel from its column's height and biome.
///
/// Layering, evaluated in order: stone deep below the surface, dirt (or shiny
/// dirt) just under it, the biome's surface block, water at or below sea level,
/// flora one block above the surface, air everywhere else. `rng` is only drawn
/// from in the ornamented layers.
pub fn classify_voxel<R: Rng + ?Sized>(
    y: i32,
    height: f64,
    biome: BiomeId,
    rng: &mut R,
) -> BlockId {
    let yf = y as f64;
    if yf < height - 5.0 {
        blocks::STONE
    } else if yf < height - 1.0 {
        if rng.gen::<f64>() < ORE_CHANCE {
            blocks::SHINY_DIRT
        } else {
            blocks::DIRT
        }
    } else if yf < height {
        surface_block(biome, yf)
    } else if y <= 0 {
        blocks::WATER
    } else if yf == height.floor() + 1.0 {
        match flora_for(biome, yf) {
            Some((block, chance)) if rng.gen::<f64>() < chance => block,
            _ => blocks::AIR,
        }
    } else {
        blocks::AIR
    }
}

/// Local cloud row for a chunk whose origin y lies inside the cloud band.
pub fn cloud_row(origin_y: i32, chunk_size: usize) -> Option<usize> {
    let (low, high) = CLOUD_BAND;
    if origin_y <= low || origin_y >= high {
        return None;
    }
    let row = ((origin_y - low) / 2) as usize;
    (row < chunk_size).then_some(row)
}

/// Terrain generator that fills chunk buffers with blocks.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    world_seed: u64,
}

impl TerrainGenerator {
    /// Create a new terrain generator from world seed.
    pub fn new(world_seed: u64) -> Self {
        Self { world_seed }
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Generate terrain into `buffer`, whose minimum corner sits at `origin`.
    ///
    /// Every voxel is overwritten. Output depends only on the origin, the buffer
    /// size and the world seed.
    #[instrument(skip(self, buffer), fields(origin = %origin, world_seed = self.world_seed))]
    pub fn generate_chunk(&self, origin: WorldPos, buffer: &mut ChunkBuffer) {
        debug!("Starting terrain generation");
        let size = buffer.size();
        let mut rng = scoped_rng(
            self.world_seed,
            position_seed(origin.x, origin.y, origin.z),
            TERRAIN_SEED_SALT,
        );
        let cloud_row = cloud_row(origin.y, size);

        for i in 0..size {
            for k in 0..size {
                let x = origin.x + i as i32;
                let z = origin.z + k as i32;
                let column = ColumnSample::at(x as f64, z as f64);

                for j in 0..size {
                    let y = origin.y + j as i32;
                    let block = classify_voxel(y, column.height, column.biome, &mut rng);
                    buffer.set(i, j, k, block);
                }

                if let Some(row) = cloud_row {
                    let density = noise_3d(x as f64, origin.y as f64, z as f64, 30.0, 1.0);
                    if density > CLOUD_THRESHOLD {
                        buffer.set(i, row, k, blocks::CLOUD);
                    }
                }
            }
        }

        debug!("Terrain generation complete");
    }

    /// Terrain block at one world position, ignoring ornamentation.
    ///
    /// Matches [`generate_chunk`](Self::generate_chunk) wherever the result does
    /// not depend on the RNG: ore layers report plain dirt and flora reports air.
    pub fn base_block_at(&self, pos: WorldPos) -> BlockId {
        let column = ColumnSample::at(pos.x as f64, pos.z as f64);
        classify_voxel(pos.y, column.height, column.biome, &mut NoOrnament)
    }
}

/// RNG stand-in that always rolls the maximum, so no ornament is ever chosen.
struct NoOrnament;

impl rand::RngCore for NoOrnament {
    fn next_u32(&mut self) -> u32 {
        u32::MAX
    }

    fn next_u64(&mut self) -> u64 {
        u64::MAX
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(u8::MAX);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
