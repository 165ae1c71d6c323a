//! The per-port production pipeline.
//!
//! An [`OutputPort`] collects what a block produces during one invocation of
//! its work: buffers, labels and messages. It also gives the block access to
//! the port's buffer and token pools. All production calls take `&mut self`;
//! only the thread currently running the block can reach them, so the queues
//! carry no lock. The pools are shared with the scheduler through
//! [`PoolHandle`]s and every pool call goes through their spin locks.
//!
//! The [`ActivityCounter`] moves on every change another thread might care
//! about, which is how the scheduler learns to look at the port again.

use std::any::Any;
use std::sync::Arc;

use super::activity::ActivityCounter;
use super::buffer::BufferChunk;
use super::input_port::InputPort;
use super::label::Label;
use super::manager::{empty_pool, BufferManager, PoolHandle};
use super::message::MessageSink;
use super::queue::PostQueue;
use crate::config::PortConfig;
use crate::types::DType;
use crate::value::TypedValue;

/// One output of a running block.
pub struct OutputPort {
    index: usize,
    name: String,
    dtype: DType,
    domain: String,
    is_signal: bool,

    buffer: BufferChunk,
    elements: usize,
    pending_elements: usize,
    reserve_elements: usize,

    posted_buffers: PostQueue<BufferChunk>,
    posted_labels: PostQueue<Label>,
    posted_messages: PostQueue<TypedValue>,

    buffer_pool: PoolHandle,
    token_pool: PoolHandle,
    sink: Option<Box<dyn MessageSink>>,
    read_before_write: Option<Arc<InputPort>>,

    total_elements: u64,
    total_buffers: u64,
    total_labels: u64,
    total_messages: u64,
    activity: Arc<ActivityCounter>,
}

impl OutputPort {
    pub fn new(index: usize, name: impl Into<String>, dtype: DType) -> Self {
        Self::with_config(index, name, dtype, &PortConfig::default())
    }

    /// A message-only port with no buffer stream.
    pub fn signal(index: usize, name: impl Into<String>) -> Self {
        let mut port = Self::new(index, name, DType::Unspecified);
        port.is_signal = true;
        port
    }

    pub fn with_config(
        index: usize,
        name: impl Into<String>,
        dtype: DType,
        config: &PortConfig,
    ) -> Self {
        let name = name.into();
        tracing::debug!("Creating output port {} '{}' ({})", index, name, dtype);
        Self {
            index,
            name,
            dtype,
            domain: config.domain.clone(),
            is_signal: false,
            buffer: BufferChunk::null(),
            elements: 0,
            pending_elements: 0,
            reserve_elements: config.default_reserve,
            posted_buffers: PostQueue::with_capacity(config.initial_buffer_queue_capacity),
            posted_labels: PostQueue::with_capacity(config.initial_label_queue_capacity),
            posted_messages: PostQueue::default(),
            buffer_pool: empty_pool(),
            token_pool: empty_pool(),
            sink: None,
            read_before_write: None,
            total_elements: 0,
            total_buffers: 0,
            total_labels: 0,
            total_messages: 0,
            activity: Arc::new(ActivityCounter::new()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_signal(&self) -> bool {
        self.is_signal
    }

    /// The buffer the block should write into next.
    pub fn buffer(&self) -> &BufferChunk {
        &self.buffer
    }

    /// Number of elements available in [`buffer`](Self::buffer).
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Elements produced but not yet flushed.
    pub fn pending_elements(&self) -> usize {
        self.pending_elements
    }

    pub fn reserve_elements(&self) -> usize {
        self.reserve_elements
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_buffers(&self) -> u64 {
        self.total_buffers
    }

    pub fn total_labels(&self) -> u64 {
        self.total_labels
    }

    pub fn total_messages(&self) -> u64 {
        self.total_messages
    }

    pub fn activity(&self) -> u64 {
        self.activity.get()
    }

    /// Shared handle a scheduler can poll from another thread.
    pub fn activity_handle(&self) -> Arc<ActivityCounter> {
        Arc::clone(&self.activity)
    }

    // Production

    /// Record `n` elements written into the current buffer.
    pub fn produce(&mut self, n: usize) {
        self.pending_elements = self.pending_elements.saturating_add(n);
    }

    /// Append a buffer to the posted queue.
    ///
    /// A chunk with no element type takes the port's.
    pub fn post_buffer(&mut self, mut chunk: BufferChunk) {
        if !chunk.dtype.is_set() {
            chunk.dtype = self.dtype;
        }
        let elements = chunk.elements();
        self.total_elements += elements as u64;
        self.total_buffers += 1;
        tracing::trace!("Port '{}' posted buffer of {} elements", self.name, elements);
        self.posted_buffers.push(chunk);
        self.activity.bump();
    }

    /// Append a label, converting byte positions to element positions.
    pub fn post_label(&mut self, mut label: Label) {
        label.to_elements(self.dtype.stride());
        tracing::trace!("Port '{}' posted label '{}' at {}", self.name, label.id, label.index);
        self.posted_labels.push(label);
        self.total_labels += 1;
        self.activity.bump();
    }

    /// Post a message, wrapping it unless it is already a [`TypedValue`].
    pub fn post_message<T: Any + Send + Sync>(&mut self, message: T) {
        self.dispatch_message(TypedValue::from_any(message));
    }

    pub fn post_value(&mut self, value: TypedValue) {
        self.dispatch_message(value);
    }

    /// Build a `T` from `args` in place and post it.
    pub fn emplace_message<T, A>(&mut self, args: A)
    where
        T: From<A> + Any + Send + Sync,
    {
        self.dispatch_message(TypedValue::emplace::<T, A>(args));
    }

    fn dispatch_message(&mut self, value: TypedValue) {
        tracing::trace!("Port '{}' posted message {}", self.name, value.type_string());
        match &self.sink {
            Some(sink) => sink.post_message(value),
            None => self.posted_messages.push(value),
        }
        self.total_messages += 1;
        self.activity.bump();
    }

    /// Set the number of elements the block needs before it can run again.
    pub fn set_reserve(&mut self, n: usize) {
        let grew = n > self.reserve_elements;
        self.reserve_elements = n;
        if grew {
            self.activity.bump();
        }
    }

    // Buffer pool

    pub fn buffer_manager_empty(&self) -> bool {
        self.buffer_pool.lock().as_ref().map_or(true, |pool| pool.empty())
    }

    pub fn buffer_manager_front(&self) -> BufferChunk {
        self.buffer_pool
            .lock()
            .as_ref()
            .map(|pool| pool.front())
            .unwrap_or_default()
    }

    pub fn buffer_manager_pop(&self, num_bytes: usize) {
        match self.buffer_pool.lock().as_mut() {
            Some(pool) => pool.pop(num_bytes),
            None => tracing::trace!("Port '{}' has no buffer pool to pop", self.name),
        }
    }

    /// Consume `n` elements from the buffer pool.
    pub fn pop_elements(&mut self, n: usize) {
        self.buffer_manager_pop(n.saturating_mul(self.dtype.stride()));
        self.activity.bump();
    }

    /// A buffer of `n` elements of the port's type.
    pub fn get_buffer(&self, n: usize) -> BufferChunk {
        self.get_buffer_with(self.dtype, n)
    }

    /// A buffer of `n` elements of `dtype`.
    ///
    /// Carved from the front of the buffer pool when it has room, in which
    /// case those bytes are popped from the pool. Freshly allocated otherwise.
    pub fn get_buffer_with(&self, dtype: DType, n: usize) -> BufferChunk {
        let num_bytes = n.saturating_mul(dtype.stride());
        let pooled = {
            let mut guard = self.buffer_pool.lock();
            match guard.as_mut() {
                Some(pool) => {
                    let front = pool.front();
                    if !front.is_null() && front.length() >= num_bytes {
                        pool.pop(num_bytes);
                        Some(front.slice(0, num_bytes))
                    } else {
                        None
                    }
                }
                None => None,
            }
        };

        let mut chunk = pooled.unwrap_or_else(|| {
            tracing::trace!(
                "Port '{}' allocating {} bytes outside the pool",
                self.name,
                num_bytes
            );
            BufferChunk::alloc(dtype, n)
        });
        chunk.dtype = dtype;
        chunk
    }

    // Token pool

    pub fn token_manager_empty(&self) -> bool {
        self.token_pool.lock().as_ref().map_or(true, |pool| pool.empty())
    }

    /// Take the front token, or a null chunk when there is none.
    pub fn token_manager_pop(&self) -> BufferChunk {
        let mut guard = self.token_pool.lock();
        match guard.as_mut() {
            Some(pool) if !pool.empty() => {
                let token = pool.front();
                pool.pop(0);
                token
            }
            _ => BufferChunk::null(),
        }
    }

    pub fn token_manager_pop_bytes(&self, num_bytes: usize) {
        match self.token_pool.lock().as_mut() {
            Some(pool) => pool.pop(num_bytes),
            None => tracing::trace!("Port '{}' has no token pool to pop", self.name),
        }
    }

    // Flush and refresh

    /// Point the current buffer at the pool's front chunk.
    ///
    /// Returns the number of elements now available.
    pub fn refresh_buffer(&mut self) -> usize {
        let mut front = self.buffer_manager_front();
        if !front.is_null() {
            front.dtype = self.dtype;
        }
        self.elements = front.elements();
        self.buffer = front;
        self.elements
    }

    /// Post the produced part of the current buffer and consume it from the
    /// pool. Returns the number of elements flushed.
    pub fn flush_pending(&mut self) -> usize {
        if self.pending_elements == 0 {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending_elements);
        if self.buffer.is_null() {
            tracing::warn!(
                "Port '{}' produced {} elements without a buffer",
                self.name,
                pending
            );
            return 0;
        }

        let mut chunk = self.buffer.slice(0, pending.saturating_mul(self.dtype.stride()));
        chunk.dtype = self.dtype;
        let flushed = chunk.elements();
        if flushed < pending {
            tracing::warn!(
                "Port '{}' produced {} elements into a buffer of {}, dropping {}",
                self.name,
                pending,
                flushed,
                pending - flushed
            );
        }
        self.buffer_manager_pop(chunk.length());
        self.post_buffer(chunk);

        self.buffer = BufferChunk::null();
        self.elements = 0;
        flushed
    }

    // Downstream

    pub fn posted_buffers(&self) -> impl Iterator<Item = &BufferChunk> + '_ {
        self.posted_buffers.iter()
    }

    pub fn posted_labels(&self) -> impl Iterator<Item = &Label> + '_ {
        self.posted_labels.iter()
    }

    pub fn posted_message_count(&self) -> usize {
        self.posted_messages.len()
    }

    pub fn drain_buffers(&mut self) -> Vec<BufferChunk> {
        self.posted_buffers.drain()
    }

    pub fn drain_labels(&mut self) -> Vec<Label> {
        self.posted_labels.drain()
    }

    pub fn drain_messages(&mut self) -> Vec<TypedValue> {
        self.posted_messages.drain()
    }

    // Wiring

    /// Install a buffer pool, returning the one it replaces.
    pub fn set_buffer_manager(
        &self,
        manager: Option<Box<dyn BufferManager>>,
    ) -> Option<Box<dyn BufferManager>> {
        tracing::debug!(
            "Port '{}' buffer pool {}",
            self.name,
            if manager.is_some() { "installed" } else { "cleared" }
        );
        std::mem::replace(&mut *self.buffer_pool.lock(), manager)
    }

    /// Install a token pool, returning the one it replaces.
    pub fn set_token_manager(
        &self,
        manager: Option<Box<dyn BufferManager>>,
    ) -> Option<Box<dyn BufferManager>> {
        tracing::debug!(
            "Port '{}' token pool {}",
            self.name,
            if manager.is_some() { "installed" } else { "cleared" }
        );
        std::mem::replace(&mut *self.token_pool.lock(), manager)
    }

    pub fn buffer_pool(&self) -> PoolHandle {
        Arc::clone(&self.buffer_pool)
    }

    pub fn token_pool(&self) -> PoolHandle {
        Arc::clone(&self.token_pool)
    }

    pub fn set_message_sink(&mut self, sink: Option<Box<dyn MessageSink>>) {
        self.sink = sink;
    }

    pub fn has_message_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn set_read_before_write(&mut self, input: Option<Arc<InputPort>>) {
        self.read_before_write = input;
    }

    pub fn read_before_write(&self) -> Option<&Arc<InputPort>> {
        self.read_before_write.as_ref()
    }
}

impl std::fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPort")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("dtype", &self.dtype)
            .field("domain", &self.domain)
            .field("pending_elements", &self.pending_elements)
            .field("reserve_elements", &self.reserve_elements)
            .field("total_elements", &self.total_elements)
            .field("total_buffers", &self.total_buffers)
            .field("activity", &self.activity.get())
            .finish_non_exhaustive()
    }
}
