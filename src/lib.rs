//! # portflow: dataflow port runtime
//!
//! The runtime substrate of a dataflow engine: a type-erased value container
//! for passing properties and messages between blocks, and the per-port
//! pipeline through which a running block publishes buffers, stream labels
//! and messages to the rest of the graph.
//!
//! ## Architecture
//!
//! - **Value**: [`TypedValue`], a shared, type-erased value with a runtime
//!   registry for comparison, hashing, display and conversion
//! - **Framework**: [`OutputPort`] and its collaborators (buffer chunks, pools,
//!   labels, message sinks)
//! - **Sync**: spin locks guarding the pools a port shares with its scheduler
//! - **Communication**: crossbeam channels between the block, scheduler and
//!   downstream threads
//!
//! ## Example
//!
//! ```ignore
//! use portflow::{BufferChunk, DType, GenericBufferManager, Label, OutputPort, TypedValue};
//!
//! let mut port = OutputPort::new(0, "out", DType::F32);
//! port.set_buffer_manager(Some(Box::new(GenericBufferManager::with_buffers(4, 4096))));
//!
//! let available = port.refresh_buffer();
//! port.produce(available.min(256));
//! port.post_label(Label::new("burst", TypedValue::new(1u32), 0));
//! port.flush_pending();
//!
//! for chunk in port.drain_buffers() {
//!     println!("{} elements", chunk.elements());
//! }
//! ```

pub mod config;
pub mod error;
pub mod framework;
pub mod sync;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use config::{PoolConfig, PortConfig, RuntimeConfig};
pub use error::{FlowError, Result, ResultExt};
pub use framework::{
    ActivityCounter, BlockDescriptor, BlockInfo, BufferChunk, BufferManager, GenericBufferManager,
    InputPort, Label, LabelUnit, MessageSink, OutputPort, PoolHandle, PropertyDescriptor,
    TokenManager,
};
pub use sync::SpinLock;
pub use types::DType;
pub use value::{NullValue, TypedValue};
