//! Reference-counted views over pooled memory.
//!
//! A [`BufferChunk`] is a cheap handle: cloning it shares the underlying
//! allocation, and `slice`/`advance` only move the view's window. The
//! pipeline never copies the bytes it moves around.

use std::fmt;
use std::sync::Arc;

use crate::types::DType;

/// A window onto a shared byte allocation, tagged with an element type.
#[derive(Clone, Default)]
pub struct BufferChunk {
    memory: Option<Arc<Vec<u8>>>,
    offset: usize,
    length: usize,
    /// Element type of the data in this view
    pub dtype: DType,
}

impl BufferChunk {
    /// An empty view with no backing memory.
    pub fn null() -> Self {
        Self::default()
    }

    /// Allocate zeroed memory for `elements` items of `dtype`.
    pub fn alloc(dtype: DType, elements: usize) -> Self {
        Self::from_bytes(dtype, vec![0u8; elements * dtype.stride()])
    }

    /// Take ownership of `bytes` as a new allocation.
    pub fn from_bytes(dtype: DType, bytes: Vec<u8>) -> Self {
        let length = bytes.len();
        Self {
            memory: Some(Arc::new(bytes)),
            offset: 0,
            length,
            dtype,
        }
    }

    pub fn is_null(&self) -> bool {
        self.memory.is_none()
    }

    /// Length of the view in bytes
    pub fn length(&self) -> usize {
        self.length
    }

    /// Offset of the view into its allocation, in bytes
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of whole elements in the view
    pub fn elements(&self) -> usize {
        self.length / self.dtype.stride()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.memory {
            Some(memory) => &memory[self.offset..self.offset + self.length],
            None => &[],
        }
    }

    /// Mutable access to the viewed bytes, only while no other view shares
    /// the allocation.
    pub fn as_mut_bytes(&mut self) -> Option<&mut [u8]> {
        let (offset, length) = (self.offset, self.length);
        self.memory
            .as_mut()
            .and_then(Arc::get_mut)
            .map(|memory| &mut memory[offset..offset + length])
    }

    /// A sub-view starting `offset` bytes in, at most `len` bytes long.
    ///
    /// Both bounds are clamped to this view.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let offset = offset.min(self.length);
        let length = len.min(self.length - offset);
        Self {
            memory: self.memory.clone(),
            offset: self.offset + offset,
            length,
            dtype: self.dtype,
        }
    }

    /// Drop `bytes` from the front of the view. Returns how many were
    /// actually consumed.
    pub fn advance(&mut self, bytes: usize) -> usize {
        let consumed = bytes.min(self.length);
        self.offset += consumed;
        self.length -= consumed;
        consumed
    }

    /// Whether both views share the same allocation.
    pub fn same_memory(&self, other: &BufferChunk) -> bool {
        match (&self.memory, &other.memory) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for BufferChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "BufferChunk(null)");
        }
        f.debug_struct("BufferChunk")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("dtype", &self.dtype)
            .finish()
    }
}
