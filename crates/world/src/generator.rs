//! Scheduler that turns chunk requests into filled buffers.
//!
//! [`WorldGenerator`] owns the request queue and the compression store. The host
//! reports chunks it needs and chunks it drops; each [`tick`](WorldGenerator::tick)
//! drains a bounded batch, restoring stored chunks and generating the rest.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use voxstream_core::SimTick;

use crate::chunk::{blocks, BlockId, ChunkBuffer, ChunkId, ChunkPos, WorldPos};
use crate::config::WorldgenConfig;
use crate::error::StoreResult;
use crate::persist::ChunkStore;
use crate::queue::{GenerationQueue, GenerationRequest};
use crate::storage::ChunkStorage;
use crate::structures::{log_summary, BlockEdit, PlacementSummary, StructurePlanner};
use crate::terrain::TerrainGenerator;

/// Callbacks the generator uses to talk back to the host.
pub trait ChunkHost {
    /// Hand a filled buffer back. `neutral` is set when the whole chunk is one block.
    fn complete_chunk(&mut self, id: ChunkId, buffer: ChunkBuffer, neutral: Option<BlockId>);

    /// Write one voxel through the host's own edit path.
    fn set_block(&mut self, block: BlockId, pos: WorldPos);

    /// Apply an ordered batch of edits.
    fn apply_edits(&mut self, edits: &[BlockEdit]) {
        for edit in edits {
            self.set_block(edit.block, edit.pos);
        }
    }
}

/// How one request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOutcome {
    /// Decoded from the compression store.
    Restored,
    /// Outside the habitable band; filled with a single block.
    Uniform(BlockId),
    /// Classified voxel by voxel.
    Generated,
}

/// Work done by one scheduler tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub restored: usize,
    pub uniform: usize,
    pub generated: usize,
    /// Stored entries that failed to restore and were regenerated.
    pub restore_failures: usize,
    /// Requests still queued after the tick.
    pub remaining: usize,
}

impl TickReport {
    /// Requests handed back this tick.
    pub fn completed(&self) -> usize {
        self.restored + self.uniform + self.generated
    }
}

/// Running totals across the generator's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorStats {
    pub enqueued: usize,
    pub restored: usize,
    pub uniform: usize,
    pub generated: usize,
    pub restore_failures: usize,
    pub stored: usize,
    pub max_pending: usize,
}

/// Generation context: configuration, terrain, request queue and store.
pub struct WorldGenerator {
    config: WorldgenConfig,
    terrain: TerrainGenerator,
    queue: GenerationQueue,
    store: ChunkStore,
    tick: SimTick,
    placement: Option<PlacementSummary>,
    stats: GeneratorStats,
}

impl WorldGenerator {
    pub fn new(config: WorldgenConfig) -> Self {
        let config = config.sanitized();
        Self {
            terrain: TerrainGenerator::new(config.world_seed),
            queue: GenerationQueue::new(),
            store: ChunkStore::new(config.compression_level),
            tick: SimTick::ZERO,
            placement: None,
            stats: GeneratorStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &WorldgenConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChunkStore {
        &mut self.store
    }

    pub fn stats(&self) -> GeneratorStats {
        self.stats
    }

    pub fn current_tick(&self) -> SimTick {
        self.tick
    }

    /// Requests waiting for a tick.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Identifiers of waiting requests, oldest first.
    pub fn pending_ids(&self) -> Vec<ChunkId> {
        self.queue.pending_ids().cloned().collect()
    }

    /// Host signal: a chunk at `origin` needs contents.
    pub fn on_chunk_needed(
        &mut self,
        id: ChunkId,
        buffer: ChunkBuffer,
        origin: WorldPos,
        world_name: &str,
    ) {
        self.queue.enqueue(GenerationRequest {
            id,
            buffer,
            origin,
            world_name: world_name.to_string(),
        });
        self.stats.enqueued += 1;
        self.stats.max_pending = self.stats.max_pending.max(self.queue.len());
    }

    /// Host signal: a chunk is being dropped; keep a compressed snapshot.
    pub fn on_chunk_removed(&mut self, id: &ChunkId, buffer: &ChunkBuffer) -> StoreResult<usize> {
        let bytes = self.store.store(id, buffer)?;
        self.stats.stored += 1;
        Ok(bytes)
    }

    /// Drain up to `batch_size` requests and hand every one back to `host`.
    #[instrument(skip(self, host), fields(tick = self.tick.0, pending = self.queue.len(), batch_size = self.config.batch_size))]
    pub fn tick<H: ChunkHost + ?Sized>(&mut self, host: &mut H) -> TickReport {
        let mut report = TickReport {
            tick: self.tick.0,
            ..TickReport::default()
        };

        for request in self.queue.dequeue_batch(self.config.batch_size) {
            let GenerationRequest {
                id,
                mut buffer,
                origin,
                world_name,
            } = request;

            let (outcome, failed) = self.fill(&id, &mut buffer, origin);
            if failed {
                report.restore_failures += 1;
            }
            let neutral = match outcome {
                RequestOutcome::Restored => {
                    report.restored += 1;
                    None
                }
                RequestOutcome::Uniform(block) => {
                    report.uniform += 1;
                    Some(block)
                }
                RequestOutcome::Generated => {
                    report.generated += 1;
                    None
                }
            };
            debug!(chunk = %id, origin = %origin, world = %world_name, ?outcome, "request complete");
            host.complete_chunk(id, buffer, neutral);
        }

        report.remaining = self.queue.len();
        self.stats.restored += report.restored;
        self.stats.uniform += report.uniform;
        self.stats.generated += report.generated;
        self.stats.restore_failures += report.restore_failures;
        self.tick = self.tick.advance(1);
        report
    }

    /// Fill one buffer. The flag reports a failed restore that fell through.
    fn fill(&mut self, id: &ChunkId, buffer: &mut ChunkBuffer, origin: WorldPos) -> (RequestOutcome, bool) {
        let mut failed = false;
        if self.store.has(id) {
            match self.store.restore(id, buffer) {
                Ok(()) => return (RequestOutcome::Restored, false),
                Err(err) => {
                    warn!(chunk = %id, error = %err, "restore failed; regenerating chunk");
                    self.store.evict(id);
                    failed = true;
                }
            }
        }

        if let Some(block) = self.uniform_fill(origin.y) {
            buffer.fill(block);
            return (RequestOutcome::Uniform(block), failed);
        }

        self.terrain.generate_chunk(origin, buffer);
        (RequestOutcome::Generated, failed)
    }

    /// Block filling a whole chunk whose origin lies outside the habitable band.
    pub fn uniform_fill(&self, origin_y: i32) -> Option<BlockId> {
        if origin_y < self.config.habitable_min_y {
            Some(blocks::STONE)
        } else if origin_y > self.config.habitable_max_y {
            Some(blocks::AIR)
        } else {
            None
        }
    }

    /// True once the start-up delay has passed and structures have not been placed.
    pub fn structures_due(&self) -> bool {
        self.placement.is_none() && self.tick.0 >= self.config.structure_delay_ticks
    }

    pub fn structures_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// Summary of the structure placement, once it has run.
    pub fn placement(&self) -> Option<PlacementSummary> {
        self.placement
    }

    /// Plan every structure and push its edits through `host`. Runs at most once.
    pub fn place_structures<H: ChunkHost + ?Sized>(&mut self, host: &mut H) -> Option<PlacementSummary> {
        if self.placement.is_some() {
            return None;
        }

        let batches = StructurePlanner::new(self.config.world_seed).plan();
        for batch in &batches {
            host.apply_edits(batch.edits());
        }
        let summary = PlacementSummary::from_batches(&batches);
        log_summary(&summary);
        self.placement = Some(summary);
        Some(summary)
    }
}

/// Generator and resident window driven together, the way a host loop would.
pub struct StreamingSession {
    generator: WorldGenerator,
    storage: ChunkStorage,
}

impl StreamingSession {
    pub fn new(config: WorldgenConfig) -> Self {
        let generator = WorldGenerator::new(config);
        let cfg = generator.config();
        let storage = ChunkStorage::new(cfg.chunk_size, cfg.resident_capacity, cfg.world_name.clone());
        Self { generator, storage }
    }

    pub fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut WorldGenerator {
        &mut self.generator
    }

    pub fn storage(&self) -> &ChunkStorage {
        &self.storage
    }

    /// Request a single chunk. Returns false if it is resident or already queued.
    pub fn request(&mut self, pos: ChunkPos) -> bool {
        let Some(req) = self.storage.request(pos) else {
            return false;
        };
        let world_name = self.storage.world_name().to_string();
        self.generator
            .on_chunk_needed(req.id, req.buffer, req.origin, &world_name);
        true
    }

    /// Keep a cube of chunks around `center` loaded: unload chunks outside
    /// `radius` and request missing ones, nearest first.
    pub fn request_around(&mut self, center: WorldPos, radius: i32) -> usize {
        let center = ChunkPos::containing(center, self.storage.chunk_size());
        self.storage.unload_outside(center, radius);
        self.recycle_evictions();

        let mut wanted = Vec::new();
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                for dz in -radius..=radius {
                    wanted.push(ChunkPos::new(center.x + dx, center.y + dy, center.z + dz));
                }
            }
        }
        wanted.sort_by_key(|pos| {
            let d = (
                pos.x - center.x,
                pos.y - center.y,
                pos.z - center.z,
            );
            (d.0 * d.0 + d.1 * d.1 + d.2 * d.2, *pos)
        });

        wanted.into_iter().filter(|pos| self.request(*pos)).count()
    }

    /// One scheduler tick: store evicted chunks, drain a batch, place structures
    /// once they are due, and request chunks that parked edits wait on.
    pub fn tick(&mut self) -> TickReport {
        self.recycle_evictions();
        let report = self.generator.tick(&mut self.storage);
        self.recycle_evictions();

        if self.generator.structures_due() {
            self.place_structures();
        }
        self.request_wanted();
        report
    }

    /// Run structure placement now, if it has not run yet.
    pub fn place_structures(&mut self) -> Option<PlacementSummary> {
        let summary = self.generator.place_structures(&mut self.storage);
        self.request_wanted();
        summary
    }

    /// Tick until the queue is empty or `max_ticks` ticks have run.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while reports.len() < max_ticks {
            let report = self.tick();
            let idle = report.remaining == 0 && self.generator.pending() == 0;
            reports.push(report);
            if idle {
                break;
            }
        }
        reports
    }

    fn recycle_evictions(&mut self) {
        for evicted in self.storage.take_evicted() {
            if let Err(err) = self.generator.on_chunk_removed(&evicted.id, &evicted.buffer) {
                warn!(chunk = %evicted.id, error = %err, "failed to store evicted chunk");
            }
        }
    }

    fn request_wanted(&mut self) {
        for pos in self.storage.take_wanted() {
            self.request(pos);
        }
    }
}
