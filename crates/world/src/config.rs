use serde::{Deserialize, Serialize};

use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::persist::DEFAULT_COMPRESSION_LEVEL;

/// Tunables for generation, streaming and storage.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldgenConfig {
    /// Cache namespace tag; not an input to terrain.
    pub world_name: String,
    pub world_seed: u64,
    /// Chunk side length in voxels.
    pub chunk_size: usize,
    /// Requests drained per scheduler tick.
    pub batch_size: usize,
    /// Chunks whose origin y is below this are filled with stone.
    pub habitable_min_y: i32,
    /// Chunks whose origin y is above this are filled with air.
    pub habitable_max_y: i32,
    /// zstd level for stored snapshots.
    pub compression_level: i32,
    /// Number of chunks the host keeps resident before evicting.
    pub resident_capacity: usize,
    /// Wall-clock spacing of scheduler ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Ticks after start-up before structures are placed.
    pub structure_delay_ticks: u64,
}

impl Default for WorldgenConfig {
    fn default() -> Self {
        Self {
            world_name: "enhanced_world".to_string(),
            world_seed: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: 10,
            habitable_min_y: -50,
            habitable_max_y: 50,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            resident_capacity: 512,
            tick_interval_ms: 10,
            // 500 ms at the default tick interval
            structure_delay_ticks: 50,
        }
    }
}

impl WorldgenConfig {
    /// Clamp values that would stall or break the scheduler.
    pub fn sanitized(mut self) -> Self {
        self.chunk_size = self.chunk_size.max(1);
        self.batch_size = self.batch_size.max(1);
        self.resident_capacity = self.resident_capacity.max(1);
        if self.habitable_min_y > self.habitable_max_y {
            std::mem::swap(&mut self.habitable_min_y, &mut self.habitable_max_y);
        }
        self
    }
}
