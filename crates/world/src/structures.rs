//! One-shot structure placement over streamed terrain.
//!
//! Structures are planned from the world seed and expressed as ordered batches of
//! voxel edits. Hosts apply each batch through their own block-edit path, which
//! may pull in chunks that are not resident yet.

use crate::biome::{biome_at, BiomeId};
use crate::chunk::{blocks, BlockId, WorldPos};
use crate::heightmap::ColumnSample;
use crate::trees::Tree;
use crate::village::Village;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const TREE_SEED_SALT: u64 = 0x54_52_45_45_u64; // "TREE"
const BOULDER_SEED_SALT: u64 = 0x42_4F_55_4C_44_45_52_u64; // "BOULDER"
const PYRAMID_SEED_SALT: u64 = 0x50_59_52_41_4D_49_44_u64; // "PYRAMID"

/// Candidate counts sampled per structure family.
pub const TREE_CANDIDATES: usize = 100;
pub const BOULDER_CANDIDATES: usize = 20;
pub const PYRAMID_CANDIDATES: usize = 5;

/// Levels in a desert pyramid; also its base half-width.
pub const PYRAMID_LEVELS: i32 = 5;

/// Kind of structure a batch builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Tree,
    Boulder,
    Pyramid,
    House,
    Well,
    Path,
}

/// Single voxel mutation in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEdit {
    pub pos: WorldPos,
    pub block: BlockId,
}

/// Ordered edits for one structure. Later edits win over earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureBatch {
    kind: StructureKind,
    anchor: WorldPos,
    edits: Vec<BlockEdit>,
}

impl StructureBatch {
    pub fn new(kind: StructureKind, anchor: WorldPos) -> Self {
        Self {
            kind,
            anchor,
            edits: Vec::new(),
        }
    }

    /// Append an edit.
    pub fn place(&mut self, pos: WorldPos, block: BlockId) {
        self.edits.push(BlockEdit { pos, block });
    }

    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Position the structure was built around.
    pub fn anchor(&self) -> WorldPos {
        self.anchor
    }

    pub fn edits(&self) -> &[BlockEdit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Roughly spherical stone boulder.
pub fn boulder(center: WorldPos, size: i32) -> StructureBatch {
    let mut batch = StructureBatch::new(StructureKind::Boulder, center);
    let radius = size as f64;
    for bx in -size..=size {
        for by in -size..=size {
            for bz in -size..=size {
                let dist = ((bx * bx + by * by + bz * bz) as f64).sqrt();
                if dist <= radius {
                    batch.place(center.offset(bx, by, bz), blocks::STONE);
                }
            }
        }
    }
    batch
}

/// Stepped shiny-dirt pyramid with a translucent cap and two windows.
pub fn pyramid(base: WorldPos) -> StructureBatch {
    let mut batch = StructureBatch::new(StructureKind::Pyramid, base);
    let size = PYRAMID_LEVELS;
    for level in 0..size {
        let half = size - level;
        for px in -half..=half {
            for pz in -half..=half {
                batch.place(base.offset(px, level, pz), blocks::SHINY_DIRT);
            }
        }
    }

    batch.place(base.offset(0, size, 0), blocks::STONE_TRANS);
    batch.place(base.offset(1, 1, 0), blocks::WINDOW);
    batch.place(base.offset(-1, 1, 0), blocks::WINDOW);
    batch
}

/// Counts of placed structures, for logs and metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub trees: usize,
    pub boulders: usize,
    pub pyramids: usize,
    pub houses: usize,
    pub wells: usize,
    pub paths: usize,
    /// Total voxel edits across all batches.
    pub edits: usize,
}

impl PlacementSummary {
    pub fn from_batches(batches: &[StructureBatch]) -> Self {
        let mut summary = Self::default();
        for batch in batches {
            match batch.kind() {
                StructureKind::Tree => summary.trees += 1,
                StructureKind::Boulder => summary.boulders += 1,
                StructureKind::Pyramid => summary.pyramids += 1,
                StructureKind::House => summary.houses += 1,
                StructureKind::Well => summary.wells += 1,
                StructureKind::Path => summary.paths += 1,
            }
            summary.edits += batch.len();
        }
        summary
    }
}

/// Plans every structure for a world seed.
#[derive(Debug, Clone, Copy)]
pub struct StructurePlanner {
    world_seed: u64,
}

impl StructurePlanner {
    pub const fn new(world_seed: u64) -> Self {
        Self { world_seed }
    }

    fn rng(&self, salt: u64) -> StdRng {
        StdRng::seed_from_u64(self.world_seed ^ salt)
    }

    /// Forest trees from candidates in [-50, 50)^2 whose surface is above sea level.
    pub fn trees(&self) -> Vec<StructureBatch> {
        let mut rng = self.rng(TREE_SEED_SALT);
        let mut batches = Vec::new();
        for _ in 0..TREE_CANDIDATES {
            let x = rng.gen_range(-50..50);
            let z = rng.gen_range(-50..50);
            let column = ColumnSample::at(x as f64, z as f64);
            if column.biome != BiomeId::Forest {
                continue;
            }
            let y = column.surface_y();
            if y > 0 {
                batches.push(Tree::random(WorldPos::new(x, y, z), &mut rng).build());
            }
        }
        batches
    }

    /// Mountain boulders from candidates in [50, 100)^2.
    pub fn boulders(&self) -> Vec<StructureBatch> {
        let mut rng = self.rng(BOULDER_SEED_SALT);
        let mut batches = Vec::new();
        for _ in 0..BOULDER_CANDIDATES {
            let x = rng.gen_range(50..100);
            let z = rng.gen_range(50..100);
            let column = ColumnSample::at(x as f64, z as f64);
            if column.biome == BiomeId::Mountains {
                let size = rng.gen_range(2..=4);
                batches.push(boulder(WorldPos::new(x, column.surface_y(), z), size));
            }
        }
        batches
    }

    /// Desert pyramids from candidates in (-100, -50]^2.
    pub fn pyramids(&self) -> Vec<StructureBatch> {
        let mut rng = self.rng(PYRAMID_SEED_SALT);
        let mut batches = Vec::new();
        for _ in 0..PYRAMID_CANDIDATES {
            let x = -50 - rng.gen_range(0..50);
            let z = -50 - rng.gen_range(0..50);
            if biome_at(x as f64, z as f64) == BiomeId::Desert {
                let column = ColumnSample::at(x as f64, z as f64);
                batches.push(pyramid(WorldPos::new(x, column.surface_y(), z)));
            }
        }
        batches
    }

    /// Every structure batch in placement order: trees, boulders, pyramids, village.
    pub fn plan(&self) -> Vec<StructureBatch> {
        let mut batches = self.trees();
        batches.extend(self.boulders());
        batches.extend(self.pyramids());
        batches.extend(Village::spawn().build());

        let summary = PlacementSummary::from_batches(&batches);
        debug!(
            world_seed = self.world_seed,
            batches = batches.len(),
            edits = summary.edits,
            "planned structures"
        );
        batches
    }
}

/// Log a placement summary at info level.
pub(crate) fn log_summary(summary: &PlacementSummary) {
    info!(
        trees = summary.trees,
        boulders = summary.boulders,
        pyramids = summary.pyramids,
        houses = summary.houses,
        wells = summary.wells,
        paths = summary.paths,
        edits = summary.edits,
        "placed structures"
    );
}
