//! Tree generation for forest decoration.
//!
//! Trees are pole trunks topped by three layers of grass-deco leaves. They are
//! emitted as voxel edits rather than written into chunk buffers, so a tree may
//! straddle any number of chunks.

use crate::chunk::{blocks, WorldPos};
use crate::structures::{StructureBatch, StructureKind};
use rand::Rng;

/// Shortest trunk a tree can have.
pub const MIN_TRUNK_HEIGHT: i32 = 4;

/// Tallest trunk a tree can have.
pub const MAX_TRUNK_HEIGHT: i32 = 6;

const LEAF_RADIUS: i32 = 2;
const LEAF_LAYERS: i32 = 3;

/// Tree structure with position and trunk height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tree {
    /// World position of the lowest trunk block
    pub base: WorldPos,
    /// Number of pole blocks in the trunk
    pub trunk_height: i32,
}

impl Tree {
    pub fn new(base: WorldPos, trunk_height: i32) -> Self {
        Self { base, trunk_height }
    }

    /// Tree at `base` with a random trunk height.
    pub fn random<R: Rng + ?Sized>(base: WorldPos, rng: &mut R) -> Self {
        Self::new(base, rng.gen_range(MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT))
    }

    /// Leaf radius of a canopy layer (0 = lowest).
    fn layer_radius(layer: i32) -> i32 {
        if layer == LEAF_LAYERS - 1 {
            1
        } else {
            LEAF_RADIUS
        }
    }

    /// Build the tree's edit batch: trunk first, then leaf layers bottom-up.
    pub fn build(&self) -> StructureBatch {
        let mut batch = StructureBatch::new(StructureKind::Tree, self.base);

        for dy in 0..self.trunk_height {
            batch.place(self.base.offset(0, dy, 0), blocks::POLE);
        }

        // Canopy starts two below the trunk top so the leaves wrap it
        let leaf_start = self.trunk_height - 2;
        for layer in 0..LEAF_LAYERS {
            let r = Self::layer_radius(layer);
            for lx in -r..=r {
                for lz in -r..=r {
                    // Skip corners for a rounded shape
                    if lx.abs() == r && lz.abs() == r {
                        continue;
                    }
                    batch.place(
                        self.base.offset(lx, leaf_start + layer, lz),
                        blocks::GRASS_DECO,
                    );
                }
            }
        }

        batch
    }
}
