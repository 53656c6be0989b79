use std::fmt;

use serde::{Deserialize, Serialize};

/// Default chunk side length in voxels (chunks are cubes).
pub const DEFAULT_CHUNK_SIZE: usize = 32;

/// Block identifier referencing the host's block registry.
pub type BlockId = u16;

/// Reserved ID for air.
pub const BLOCK_AIR: BlockId = 0;

/// Block IDs used by terrain classification and structure placement.
pub mod blocks {
    use super::BlockId;

    pub const AIR: BlockId = super::BLOCK_AIR;
    pub const DIRT: BlockId = 1;
    pub const GRASS: BlockId = 2;
    pub const STONE: BlockId = 3;
    /// Ore-bearing dirt; doubles as sand in deserts and as roofing material.
    pub const SHINY_DIRT: BlockId = 4;
    pub const CLOUD: BlockId = 5;
    pub const WATER: BlockId = 6;
    /// Decorative grass tuft, also used for tree leaves.
    pub const GRASS_DECO: BlockId = 7;
    /// Wooden pole: tree trunks, house walls, cacti.
    pub const POLE: BlockId = 8;
    pub const WINDOW: BlockId = 9;
    /// Translucent stone.
    pub const STONE_TRANS: BlockId = 10;

    /// Registry name for a block ID, used in logs and debug dumps.
    pub fn name(id: BlockId) -> &'static str {
        match id {
            AIR => "air",
            DIRT => "dirt",
            GRASS => "grass",
            STONE => "stone",
            SHINY_DIRT => "shinyDirt",
            CLOUD => "cloud",
            WATER => "water",
            GRASS_DECO => "grassDeco",
            POLE => "pole",
            WINDOW => "window",
            STONE_TRANS => "stoneTrans",
            _ => "unknown",
        }
    }
}

/// Integer world-space voxel coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset by the given deltas.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk coordinate (X, Y, Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then y, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing the given world voxel.
    pub fn containing(pos: WorldPos, chunk_size: usize) -> Self {
        let size = chunk_size as i32;
        Self::new(
            pos.x.div_euclid(size),
            pos.y.div_euclid(size),
            pos.z.div_euclid(size),
        )
    }

    /// World-space origin (minimum corner) of this chunk.
    pub fn origin(self, chunk_size: usize) -> WorldPos {
        let size = chunk_size as i32;
        WorldPos::new(self.x * size, self.y * size, self.z * size)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Opaque chunk identifier handed out by the host.
///
/// Stable while a chunk occupies one world cell; the key into the compression store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier in the host's `x|y|z|world` convention.
    pub fn for_chunk(pos: ChunkPos, world_name: &str) -> Self {
        Self(format!("{}|{}|{}|{}", pos.x, pos.y, pos.z, world_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChunkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Chunk-local voxel index (i, j, k) along (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl LocalPos {
    /// Convert to a linear index within a buffer of side `size`.
    pub fn index(self, size: usize) -> usize {
        debug_assert!(self.i < size);
        debug_assert!(self.j < size);
        debug_assert!(self.k < size);
        (self.j * size + self.k) * size + self.i
    }
}

/// Cubic voxel buffer of side `size`, one block ID per voxel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBuffer {
    size: usize,
    voxels: Vec<BlockId>,
}

impl ChunkBuffer {
    /// Allocate a fresh buffer filled with air.
    pub fn new(size: usize) -> Self {
        Self::filled(size, BLOCK_AIR)
    }

    /// Allocate a buffer with every voxel set to `block`.
    pub fn filled(size: usize, block: BlockId) -> Self {
        Self {
            size,
            voxels: vec![block; size * size * size],
        }
    }

    /// Side length in voxels.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total voxel count.
    #[inline]
    pub fn volume(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> BlockId {
        self.voxels[LocalPos { i, j, k }.index(self.size)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, block: BlockId) {
        let idx = LocalPos { i, j, k }.index(self.size);
        self.voxels[idx] = block;
    }

    /// Overwrite every voxel with `block`.
    pub fn fill(&mut self, block: BlockId) {
        self.voxels.fill(block);
    }

    /// True when every voxel equals `block`.
    pub fn is_uniform(&self, block: BlockId) -> bool {
        self.voxels.iter().all(|&v| v == block)
    }

    /// Number of voxels equal to `block`.
    pub fn count(&self, block: BlockId) -> usize {
        self.voxels.iter().filter(|&&v| v == block).count()
    }

    /// Raw voxel storage in (j, k, i) order.
    pub fn voxels(&self) -> &[BlockId] {
        &self.voxels
    }

    /// Replace the voxel contents wholesale. The caller guarantees the length matches.
    pub(crate) fn copy_from(&mut self, voxels: &[BlockId]) {
        debug_assert_eq!(voxels.len(), self.voxels.len());
        self.voxels.copy_from_slice(voxels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_voxel() {
        let mut buffer = ChunkBuffer::new(8);
        buffer.set(1, 2, 3, blocks::STONE);
        assert_eq!(buffer.get(1, 2, 3), blocks::STONE);
        assert_eq!(buffer.get(3, 2, 1), BLOCK_AIR);
        assert_eq!(buffer.count(blocks::STONE), 1);
    }

    #[test]
    fn test_local_pos_index() {
        let size = 16;
        assert_eq!(LocalPos { i: 0, j: 0, k: 0 }.index(size), 0);
        assert_eq!(LocalPos { i: 15, j: 0, k: 0 }.index(size), 15);
        assert_eq!(LocalPos { i: 0, j: 0, k: 1 }.index(size), size);
        // j is the slowest axis
        assert_eq!(LocalPos { i: 0, j: 1, k: 0 }.index(size), size * size);
    }

    #[test]
    fn test_chunk_pos_display() {
        let pos = ChunkPos::new(5, -1, -3);
        assert_eq!(format!("{}", pos), "(5, -1, -3)");
    }

    #[test]
    fn chunk_pos_containing_handles_negatives() {
        assert_eq!(
            ChunkPos::containing(WorldPos::new(-1, 0, 31), 32),
            ChunkPos::new(-1, 0, 0)
        );
        assert_eq!(
            ChunkPos::containing(WorldPos::new(-32, -33, 32), 32),
            ChunkPos::new(-1, -2, 1)
        );
        assert_eq!(ChunkPos::new(-1, 2, 0).origin(32), WorldPos::new(-32, 64, 0));
    }

    #[test]
    fn chunk_id_follows_host_convention() {
        let id = ChunkId::for_chunk(ChunkPos::new(1, -2, 3), "enhanced_world");
        assert_eq!(id.as_str(), "1|-2|3|enhanced_world");
        assert_eq!(ChunkId::from("1|-2|3|enhanced_world"), id);
    }

    #[test]
    fn test_buffer_new_is_air() {
        let buffer = ChunkBuffer::new(4);
        assert_eq!(buffer.volume(), 64);
        assert!(buffer.is_uniform(BLOCK_AIR));
    }

    #[test]
    fn fill_overwrites_everything() {
        let mut buffer = ChunkBuffer::new(4);
        buffer.set(0, 0, 0, blocks::WATER);
        buffer.fill(blocks::STONE);
        assert!(buffer.is_uniform(blocks::STONE));
    }

    #[test]
    fn test_chunk_pos_ordering() {
        let a = ChunkPos::new(0, 0, 0);
        let b = ChunkPos::new(1, 0, 0);
        let c = ChunkPos::new(0, 1, 0);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn test_chunk_pos_serialization() {
        let pos = ChunkPos::new(-5, 2, 10);
        let serialized = serde_json::to_string(&pos).unwrap();
        let deserialized: ChunkPos = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, pos);
    }

    #[test]
    fn block_names_cover_registry() {
        assert_eq!(blocks::name(blocks::SHINY_DIRT), "shinyDirt");
        assert_eq!(blocks::name(blocks::AIR), "air");
        assert_eq!(blocks::name(999), "unknown");
    }
}
