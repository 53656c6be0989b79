//! FIFO staging area for chunk generation requests.

use std::collections::VecDeque;

use crate::chunk::{ChunkBuffer, ChunkId, WorldPos};

/// One pending "chunk needed" event.
///
/// The request owns its buffer from enqueue until the buffer is handed back.
#[derive(Debug)]
pub struct GenerationRequest {
    pub id: ChunkId,
    pub buffer: ChunkBuffer,
    /// World-space origin (minimum corner) of the chunk.
    pub origin: WorldPos,
    /// Namespace tag supplied by the host.
    pub world_name: String,
}

/// Unbounded FIFO of generation requests. No reordering, no priority.
#[derive(Debug, Default)]
pub struct GenerationQueue {
    pending: VecDeque<GenerationRequest>,
}

impl GenerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request at the back.
    pub fn enqueue(&mut self, request: GenerationRequest) {
        self.pending.push_back(request);
    }

    /// Remove up to `max` requests from the front, oldest first.
    pub fn dequeue_batch(&mut self, max: usize) -> Vec<GenerationRequest> {
        let take = max.min(self.pending.len());
        self.pending.drain(..take).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Identifiers of pending requests in queue order.
    pub fn pending_ids(&self) -> impl Iterator<Item = &ChunkId> + '_ {
        self.pending.iter().map(|req| &req.id)
    }
}
