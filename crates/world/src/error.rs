use thiserror::Error;

use crate::chunk::ChunkId;

/// Errors raised by the chunk compression store.
///
/// Every variant leaves the caller's target buffer untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No snapshot is stored under this identifier.
    #[error("no stored chunk for {0}")]
    Missing(ChunkId),
    /// Stored snapshot and target buffer disagree on shape.
    #[error("stored chunk {id} is {stored_size}^3 ({stored_voxels} voxels) but target buffer is {expected_size}^3 ({expected_voxels} voxels)")]
    ShapeMismatch {
        /// Chunk being restored.
        id: ChunkId,
        /// Side length of the target buffer.
        expected_size: usize,
        /// Voxel count of the target buffer.
        expected_voxels: usize,
        /// Side length recorded with the snapshot.
        stored_size: usize,
        /// Voxel count decoded from the snapshot.
        stored_voxels: usize,
    },
    /// Payload checksum does not match the recorded CRC32.
    #[error("stored chunk {id} is corrupt: expected crc {expected:08X}, got {actual:08X}")]
    Corrupt {
        /// Chunk being restored.
        id: ChunkId,
        /// CRC32 recorded at store time.
        expected: u32,
        /// CRC32 of the bytes actually held.
        actual: u32,
    },
    /// Payload failed to decompress or decode.
    #[error("failed to decode stored chunk {id}: {reason}")]
    Codec {
        /// Chunk being restored.
        id: ChunkId,
        /// Underlying zstd or bincode failure.
        reason: String,
    },
    /// Buffer failed to serialize or compress on store.
    #[error("failed to encode chunk {id}: {reason}")]
    Encode {
        /// Chunk being stored.
        id: ChunkId,
        /// Underlying zstd or bincode failure.
        reason: String,
    },
}

impl StoreError {
    /// Identifier of the chunk the failure concerns.
    pub fn chunk_id(&self) -> &ChunkId {
        match self {
            StoreError::Missing(id) => id,
            StoreError::ShapeMismatch { id, .. }
            | StoreError::Corrupt { id, .. }
            | StoreError::Codec { id, .. }
            | StoreError::Encode { id, .. } => id,
        }
    }
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
