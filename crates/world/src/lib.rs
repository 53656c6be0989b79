//! Chunked voxel world generation and streaming storage.

pub mod biome;
pub mod chunk;
pub mod config;
pub mod error;
pub mod generator;
pub mod heightmap;
pub mod noise;
pub mod persist;
pub mod queue;
pub mod storage;
pub mod structures;
pub mod terrain;
pub mod trees;
pub mod village;

pub use biome::{biome_at, BiomeId};
pub use chunk::*;
pub use config::WorldgenConfig;
pub use error::{StoreError, StoreResult};
pub use generator::{
    ChunkHost, GeneratorStats, RequestOutcome, StreamingSession, TickReport, WorldGenerator,
};
pub use heightmap::{height_at, ColumnSample};
pub use persist::ChunkStore;
pub use queue::{GenerationQueue, GenerationRequest};
pub use storage::{ChunkRequest, ChunkStorage, EvictedChunk};
pub use structures::{BlockEdit, PlacementSummary, StructureBatch, StructureKind, StructurePlanner};
pub use terrain::{classify_voxel, TerrainGenerator};
