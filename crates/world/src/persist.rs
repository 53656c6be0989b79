//! Chunk compression store with zstd compression.
//!
//! Holds one compressed blob per chunk identifier for chunks that left the
//! resident window. Each blob carries a small header with the chunk side length
//! and a CRC32 of the zstd payload.

use crate::chunk::{BlockId, ChunkBuffer, ChunkId};
use crate::error::{StoreError, StoreResult};
use crc32fast::Hasher;
use std::collections::HashMap;
use tracing::trace;

/// Magic number for blob identification ("VXCK" = voxstream chunk).
const BLOB_MAGIC: u32 = 0x5658_434B;

/// Current blob format version.
const BLOB_VERSION: u16 = 1;

/// Encoded header length in bytes.
const HEADER_LEN: usize = 18;

/// Default zstd level (balanced speed/compression).
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Blob header structure.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlobHeader {
    magic: u32,
    version: u16,
    chunk_size: u32,
    crc32: u32,
    payload_len: u32,
}

impl BlobHeader {
    fn new(chunk_size: u32, crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: BLOB_MAGIC,
            version: BLOB_VERSION,
            chunk_size,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(&self.magic.to_le_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.chunk_size.to_le_bytes());
        bytes.extend_from_slice(&self.crc32.to_le_bytes());
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(id: &ChunkId, bytes: &[u8]) -> StoreResult<Self> {
        let codec = |reason: String| StoreError::Codec {
            id: id.clone(),
            reason,
        };
        if bytes.len() < HEADER_LEN {
            return Err(codec(format!("blob header too short ({} bytes)", bytes.len())));
        }

        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let magic = word(0);
        if magic != BLOB_MAGIC {
            return Err(codec(format!(
                "invalid blob magic: expected 0x{:08X}, got 0x{:08X}",
                BLOB_MAGIC, magic
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != BLOB_VERSION {
            return Err(codec(format!("unsupported blob version {}", version)));
        }

        Ok(Self {
            magic,
            version,
            chunk_size: word(6),
            crc32: word(10),
            payload_len: word(14),
        })
    }
}

/// Serialize voxel contents into a compressed blob.
fn encode_blob(id: &ChunkId, buffer: &ChunkBuffer, level: i32) -> StoreResult<Vec<u8>> {
    let encode = |reason: String| StoreError::Encode {
        id: id.clone(),
        reason,
    };

    let serialized = bincode::serialize(buffer.voxels()).map_err(|e| encode(e.to_string()))?;
    let compressed =
        zstd::encode_all(&serialized[..], level).map_err(|e| encode(e.to_string()))?;

    let mut hasher = Hasher::new();
    hasher.update(&compressed);
    let header = BlobHeader::new(buffer.size() as u32, hasher.finalize(), compressed.len() as u32);

    let mut blob = header.to_bytes();
    blob.extend_from_slice(&compressed);
    Ok(blob)
}

/// Validate and decode a blob into (side length, voxels).
fn decode_blob(id: &ChunkId, blob: &[u8]) -> StoreResult<(usize, Vec<BlockId>)> {
    let header = BlobHeader::from_bytes(id, blob)?;
    let payload = &blob[HEADER_LEN..];
    if payload.len() != header.payload_len as usize {
        return Err(StoreError::Codec {
            id: id.clone(),
            reason: format!(
                "payload length mismatch: header says {}, blob holds {}",
                header.payload_len,
                payload.len()
            ),
        });
    }

    let mut hasher = Hasher::new();
    hasher.update(payload);
    let actual = hasher.finalize();
    if actual != header.crc32 {
        return Err(StoreError::Corrupt {
            id: id.clone(),
            expected: header.crc32,
            actual,
        });
    }

    let codec = |reason: String| StoreError::Codec {
        id: id.clone(),
        reason,
    };
    let decompressed = zstd::decode_all(payload).map_err(|e| codec(e.to_string()))?;
    let voxels: Vec<BlockId> =
        bincode::deserialize(&decompressed).map_err(|e| codec(e.to_string()))?;

    Ok((header.chunk_size as usize, voxels))
}

/// In-memory compression store keyed by chunk identifier.
///
/// Entries live until explicitly evicted or overwritten.
#[derive(Debug)]
pub struct ChunkStore {
    entries: HashMap<ChunkId, Vec<u8>>,
    level: i32,
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl ChunkStore {
    /// Create an empty store compressing at the given zstd level.
    pub fn new(level: i32) -> Self {
        Self {
            entries: HashMap::new(),
            level,
        }
    }

    pub fn compression_level(&self) -> i32 {
        self.level
    }

    /// Check if a snapshot exists for `id`.
    pub fn has(&self, id: &ChunkId) -> bool {
        self.entries.contains_key(id)
    }

    /// Compress and store a snapshot of `buffer`, replacing any previous one.
    ///
    /// Returns the stored blob size in bytes.
    pub fn store(&mut self, id: &ChunkId, buffer: &ChunkBuffer) -> StoreResult<usize> {
        let blob = encode_blob(id, buffer, self.level)?;
        let len = blob.len();
        trace!(chunk = %id, bytes = len, voxels = buffer.volume(), "stored chunk snapshot");
        self.entries.insert(id.clone(), blob);
        Ok(len)
    }

    /// Decode the snapshot for `id` into `buffer`.
    ///
    /// `buffer` is written only after the blob passes every check; on error it is
    /// left exactly as it was.
    pub fn restore(&self, id: &ChunkId, buffer: &mut ChunkBuffer) -> StoreResult<()> {
        let blob = self
            .entries
            .get(id)
            .ok_or_else(|| StoreError::Missing(id.clone()))?;

        let (stored_size, voxels) = decode_blob(id, blob)?;
        if stored_size != buffer.size() || voxels.len() != buffer.volume() {
            return Err(StoreError::ShapeMismatch {
                id: id.clone(),
                expected_size: buffer.size(),
                expected_voxels: buffer.volume(),
                stored_size,
                stored_voxels: voxels.len(),
            });
        }

        buffer.copy_from(&voxels);
        Ok(())
    }

    /// Drop the snapshot for `id`. Returns whether one existed.
    pub fn evict(&mut self, id: &ChunkId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Raw blob for `id`, for hosts that persist snapshots elsewhere.
    pub fn blob(&self, id: &ChunkId) -> Option<&[u8]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    /// Insert a blob previously obtained from [`blob`](Self::blob).
    ///
    /// The blob is not validated until it is restored.
    pub fn insert_blob(&mut self, id: ChunkId, blob: Vec<u8>) {
        self.entries.insert(id, blob);
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes held across all blobs.
    pub fn compressed_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
