//! Port pipeline of a running block.
//!
//! A block's work function writes into buffers taken from a pool, then posts
//! the filled ranges, stream labels and messages on its output ports. A
//! scheduler on another thread watches each port's activity counter and
//! pools to decide when the block may run again and what goes downstream.
//!
//! # Architecture
//!
//! ```text
//!   block thread                         scheduler thread
//!   ────────────                         ────────────────
//!   OutputPort ──post_buffer──► PostQueue ──drain──► downstream
//!       │      ──post_label───► PostQueue
//!       │      ──post_message─► MessageSink | PostQueue
//!       │
//!       ├── PoolHandle (SpinLock) ◄──────── push / inspect
//!       └── ActivityCounter (Arc) ◄──────── poll
//! ```
//!
//! # Main Types
//!
//! - [`OutputPort`] - Production state, posted queues and pool access of one output
//! - [`BufferChunk`] - Shared view over pooled memory
//! - [`BufferManager`] - Pool contract, with [`GenericBufferManager`] and [`TokenManager`]
//! - [`Label`] - Stream tag at an element position
//! - [`MessageSink`] - Synchronous receiver of posted messages
//! - [`BlockDescriptor`] - Read-only view of a block for tooling

pub mod activity;
pub mod buffer;
pub mod descriptor;
pub mod input_port;
pub mod label;
pub mod manager;
pub mod message;
pub mod output_port;
pub mod queue;

pub use activity::ActivityCounter;
pub use buffer::BufferChunk;
pub use descriptor::{BlockDescriptor, BlockInfo, PropertyDescriptor};
pub use input_port::InputPort;
pub use label::{Label, LabelUnit};
pub use manager::{
    empty_pool, pool_with, BufferManager, GenericBufferManager, PoolHandle, TokenManager,
};
pub use message::MessageSink;
pub use output_port::OutputPort;
pub use queue::PostQueue;
