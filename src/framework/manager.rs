//! Buffer and token pools consumed by output ports.
//!
//! # Main Types
//!
//! - [`BufferManager`] - Pool contract: peek the front chunk, consume bytes, return chunks
//! - [`GenericBufferManager`] - FIFO of preallocated byte buffers
//! - [`TokenManager`] - FIFO of indivisible tokens for flow control
//! - [`PoolHandle`] - Shared slot through which a port and its scheduler reach a pool
//!
//! How a pool decides to allocate is its own business; a port only ever asks
//! whether it is empty, looks at the front, and pops.

use std::collections::VecDeque;
use std::sync::Arc;

use super::buffer::BufferChunk;
use crate::sync::SpinLock;
use crate::types::DType;

/// A source of buffers (or tokens) for an output port.
///
/// Every call is made with the owning port's spin lock held, so
/// implementations need no locking of their own.
#[cfg_attr(test, mockall::automock)]
pub trait BufferManager: Send {
    /// Whether the pool has nothing to hand out
    fn empty(&self) -> bool;

    /// The chunk that will be handed out next, or a null chunk when empty
    fn front(&self) -> BufferChunk;

    /// Consume `num_bytes` from the front of the pool
    fn pop(&mut self, num_bytes: usize);

    /// Return a chunk to the pool
    fn push(&mut self, chunk: BufferChunk);
}

/// Shared, lockable slot holding an optional pool.
pub type PoolHandle = Arc<SpinLock<Option<Box<dyn BufferManager>>>>;

/// Create an empty pool slot.
pub fn empty_pool() -> PoolHandle {
    Arc::new(SpinLock::new(None))
}

/// Create a pool slot already holding `manager`.
pub fn pool_with(manager: impl BufferManager + 'static) -> PoolHandle {
    Arc::new(SpinLock::new(Some(Box::new(manager))))
}

/// A FIFO of byte buffers.
///
/// `pop(n)` consumes `n` bytes from the front buffer and removes it once it
/// is exhausted. Bytes beyond the front buffer's length carry over to the
/// next one.
#[derive(Debug, Default)]
pub struct GenericBufferManager {
    queue: VecDeque<BufferChunk>,
}

impl GenericBufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocate `count` zeroed buffers of `bytes` bytes each.
    pub fn with_buffers(count: usize, bytes: usize) -> Self {
        let queue = (0..count)
            .map(|_| BufferChunk::alloc(DType::U8, bytes))
            .collect();
        tracing::debug!("Allocated {} pool buffers of {} bytes", count, bytes);
        Self { queue }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl BufferManager for GenericBufferManager {
    fn empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn front(&self) -> BufferChunk {
        self.queue.front().cloned().unwrap_or_default()
    }

    fn pop(&mut self, num_bytes: usize) {
        let mut remaining = num_bytes;
        while remaining > 0 {
            let Some(front) = self.queue.front_mut() else {
                tracing::warn!("Pool exhausted with {} bytes left to pop", remaining);
                return;
            };
            remaining -= front.advance(remaining);
            if front.length() == 0 {
                self.queue.pop_front();
            }
        }
    }

    fn push(&mut self, chunk: BufferChunk) {
        if chunk.is_null() {
            return;
        }
        self.queue.push_back(chunk);
    }
}

/// A FIFO of indivisible tokens.
///
/// Tokens are one-element `u64` chunks carrying their sequence number, so a
/// consumer can tell them apart. `pop` always removes exactly one token,
/// whatever byte count it is given.
#[derive(Debug, Default)]
pub struct TokenManager {
    tokens: VecDeque<BufferChunk>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `count` tokens numbered from zero.
    pub fn with_tokens(count: usize) -> Self {
        let tokens = (0..count as u64).map(Self::token).collect();
        Self { tokens }
    }

    /// Build the token numbered `id`.
    pub fn token(id: u64) -> BufferChunk {
        BufferChunk::from_bytes(DType::U64, id.to_le_bytes().to_vec())
    }

    /// Read back the number of a token chunk.
    pub fn token_id(chunk: &BufferChunk) -> Option<u64> {
        let bytes: [u8; 8] = chunk.as_bytes().try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl BufferManager for TokenManager {
    fn empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn front(&self) -> BufferChunk {
        self.tokens.front().cloned().unwrap_or_default()
    }

    fn pop(&mut self, _num_bytes: usize) {
        if self.tokens.pop_front().is_none() {
            tracing::warn!("Token pool popped while empty");
        }
    }

    fn push(&mut self, chunk: BufferChunk) {
        if chunk.is_null() {
            return;
        }
        self.tokens.push_back(chunk);
    }
}
