//! Per-port and per-pool settings
//!
//! # Main Types
//!
//! - [`PortConfig`] - Initial queue capacities, default reserve and memory domain of a port
//! - [`PoolConfig`] - Shape of the built-in buffer and token pools

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::framework::{GenericBufferManager, TokenManager};

/// Default initial capacity of the posted-buffer and posted-label queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Default size of one pooled buffer in bytes
pub const DEFAULT_BUFFER_BYTES: usize = 4096;

/// Settings applied when an output port is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Initial capacity of the posted-buffer queue
    pub initial_buffer_queue_capacity: usize,

    /// Initial capacity of the posted-label queue
    pub initial_label_queue_capacity: usize,

    /// Reserve threshold the port starts with, in elements
    pub default_reserve: usize,

    /// Memory domain advertised by the port
    pub domain: String,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            initial_buffer_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            initial_label_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            default_reserve: 0,
            domain: String::new(),
        }
    }
}

impl PortConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_buffer_queue_capacity == 0 {
            return Err(FlowError::Config(
                "initial_buffer_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.initial_label_queue_capacity == 0 {
            return Err(FlowError::Config(
                "initial_label_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shape of the built-in pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of preallocated buffers
    pub buffer_count: usize,

    /// Size of each buffer in bytes
    pub buffer_bytes: usize,

    /// Number of flow-control tokens
    pub token_count: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            buffer_count: 4,
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            token_count: 2,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_bytes == 0 {
            return Err(FlowError::Config("buffer_bytes must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Build the buffer pool described by this config
    pub fn buffer_manager(&self) -> GenericBufferManager {
        GenericBufferManager::with_buffers(self.buffer_count, self.buffer_bytes)
    }

    /// Build the token pool described by this config
    pub fn token_manager(&self) -> TokenManager {
        TokenManager::with_tokens(self.token_count)
    }
}
