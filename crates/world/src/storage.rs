use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::{trace, warn};

use crate::chunk::{BlockId, ChunkBuffer, ChunkId, ChunkPos, WorldPos};
use crate::generator::ChunkHost;
use crate::structures::BlockEdit;

/// Chunk handed out for generation: identifier, fresh buffer and world origin.
#[derive(Debug)]
pub struct ChunkRequest {
    pub id: ChunkId,
    pub pos: ChunkPos,
    pub origin: WorldPos,
    pub buffer: ChunkBuffer,
}

/// Chunk pushed out of the resident window; its contents should be stored.
#[derive(Debug)]
pub struct EvictedChunk {
    pub id: ChunkId,
    pub pos: ChunkPos,
    pub buffer: ChunkBuffer,
}

/// Resident chunk window with an LRU eviction policy.
/// Uses BTreeMap for deterministic iteration order.
///
/// Edits aimed at chunks that are not resident are parked until the chunk
/// arrives; the chunk is reported as wanted so the caller can request it.
pub struct ChunkStorage {
    chunk_size: usize,
    world_name: String,
    chunks: BTreeMap<ChunkPos, ChunkBuffer>,
    lru: LruCache<ChunkPos, ()>,
    capacity: usize,
    in_flight: BTreeMap<ChunkId, ChunkPos>,
    neutral: BTreeMap<ChunkPos, BlockId>,
    parked: BTreeMap<ChunkPos, Vec<BlockEdit>>,
    wanted: BTreeSet<ChunkPos>,
    evicted: Vec<EvictedChunk>,
    edits_applied: usize,
}

impl ChunkStorage {
    /// Create a storage with the desired maximum resident chunk count.
    pub fn new(chunk_size: usize, capacity: usize, world_name: impl Into<String>) -> Self {
        let capacity = capacity.max(1);
        Self {
            chunk_size,
            world_name: world_name.into(),
            chunks: BTreeMap::new(),
            lru: LruCache::new(NonZeroUsize::MIN.saturating_add(capacity - 1)),
            capacity,
            in_flight: BTreeMap::new(),
            neutral: BTreeMap::new(),
            parked: BTreeMap::new(),
            wanted: BTreeSet::new(),
            evicted: Vec::new(),
            edits_applied: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn world_name(&self) -> &str {
        &self.world_name
    }

    /// Identifier this host uses for the chunk at `pos`.
    pub fn id_for(&self, pos: ChunkPos) -> ChunkId {
        ChunkId::for_chunk(pos, &self.world_name)
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunks are currently resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_resident(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Number of chunks requested but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Begin loading the chunk at `pos`.
    ///
    /// Returns `None` when it is already resident or already in flight.
    pub fn request(&mut self, pos: ChunkPos) -> Option<ChunkRequest> {
        if self.chunks.contains_key(&pos) {
            return None;
        }
        let id = self.id_for(pos);
        if self.in_flight.contains_key(&id) {
            return None;
        }
        self.in_flight.insert(id.clone(), pos);
        self.wanted.remove(&pos);
        Some(ChunkRequest {
            id,
            pos,
            origin: pos.origin(self.chunk_size),
            buffer: ChunkBuffer::new(self.chunk_size),
        })
    }

    /// Attempt to fetch a resident chunk immutably.
    pub fn get(&self, pos: ChunkPos) -> Option<&ChunkBuffer> {
        self.chunks.get(&pos)
    }

    /// Block at a world position, if its chunk is resident.
    pub fn block_at(&self, pos: WorldPos) -> Option<BlockId> {
        let chunk_pos = ChunkPos::containing(pos, self.chunk_size);
        let (i, j, k) = self.local(chunk_pos, pos);
        self.chunks.get(&chunk_pos).map(|chunk| chunk.get(i, j, k))
    }

    /// Neutral voxel the generator reported for a uniformly filled chunk.
    pub fn neutral_override(&self, pos: ChunkPos) -> Option<BlockId> {
        self.neutral.get(&pos).copied()
    }

    /// Iterate over currently resident chunk positions.
    pub fn iter_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Remove a resident chunk, queuing it for storage.
    pub fn unload(&mut self, pos: ChunkPos) -> bool {
        let Some(buffer) = self.chunks.remove(&pos) else {
            return false;
        };
        self.lru.pop(&pos);
        self.neutral.remove(&pos);
        self.evicted.push(EvictedChunk {
            id: self.id_for(pos),
            pos,
            buffer,
        });
        true
    }

    /// Unload every resident chunk farther than `radius` chunks from `center`.
    pub fn unload_outside(&mut self, center: ChunkPos, radius: i32) -> usize {
        let far: Vec<ChunkPos> = self
            .chunks
            .keys()
            .copied()
            .filter(|pos| {
                (pos.x - center.x).abs() > radius
                    || (pos.y - center.y).abs() > radius
                    || (pos.z - center.z).abs() > radius
            })
            .collect();
        for pos in &far {
            self.unload(*pos);
        }
        far.len()
    }

    /// Drain chunks that left the window since the last call.
    pub fn take_evicted(&mut self) -> Vec<EvictedChunk> {
        std::mem::take(&mut self.evicted)
    }

    /// Drain chunks that parked edits are waiting on.
    pub fn take_wanted(&mut self) -> Vec<ChunkPos> {
        std::mem::take(&mut self.wanted).into_iter().collect()
    }

    /// Total edits waiting on non-resident chunks.
    pub fn parked_edits(&self) -> usize {
        self.parked.values().map(Vec::len).sum()
    }

    /// Edits written into resident chunks so far.
    pub fn edits_applied(&self) -> usize {
        self.edits_applied
    }

    fn local(&self, chunk_pos: ChunkPos, pos: WorldPos) -> (usize, usize, usize) {
        let origin = chunk_pos.origin(self.chunk_size);
        (
            (pos.x - origin.x) as usize,
            (pos.y - origin.y) as usize,
            (pos.z - origin.z) as usize,
        )
    }

    fn write(&mut self, chunk_pos: ChunkPos, pos: WorldPos, block: BlockId) {
        let (i, j, k) = self.local(chunk_pos, pos);
        if let Some(chunk) = self.chunks.get_mut(&chunk_pos) {
            chunk.set(i, j, k, block);
            self.lru.put(chunk_pos, ());
            // An edited chunk is no longer uniform
            self.neutral.remove(&chunk_pos);
            self.edits_applied += 1;
        }
    }

    fn evict_if_needed(&mut self) {
        while self.chunks.len() >= self.capacity {
            if let Some((oldest, _)) = self.lru.pop_lru() {
                trace!(chunk = %oldest, "evicting least recently used chunk");
                self.unload(oldest);
            } else {
                break;
            }
        }
    }
}

impl ChunkHost for ChunkStorage {
    fn complete_chunk(&mut self, id: ChunkId, buffer: ChunkBuffer, neutral: Option<BlockId>) {
        let Some(pos) = self.in_flight.remove(&id) else {
            warn!(chunk = %id, "completed chunk was never requested; dropping it");
            return;
        };
        if buffer.size() != self.chunk_size {
            warn!(chunk = %id, size = buffer.size(), "completed chunk has the wrong size; dropping it");
            return;
        }

        self.evict_if_needed();
        self.chunks.insert(pos, buffer);
        self.lru.put(pos, ());
        if let Some(block) = neutral {
            self.neutral.insert(pos, block);
        }

        if let Some(edits) = self.parked.remove(&pos) {
            trace!(chunk = %id, edits = edits.len(), "applying parked edits");
            for edit in edits {
                self.write(pos, edit.pos, edit.block);
            }
        }
    }

    fn set_block(&mut self, block: BlockId, pos: WorldPos) {
        let chunk_pos = ChunkPos::containing(pos, self.chunk_size);
        if self.chunks.contains_key(&chunk_pos) {
            self.write(chunk_pos, pos, block);
            return;
        }

        self.parked
            .entry(chunk_pos)
            .or_default()
            .push(BlockEdit { pos, block });
        if !self.in_flight.contains_key(&self.id_for(chunk_pos)) {
            self.wanted.insert(chunk_pos);
        }
    }
}
