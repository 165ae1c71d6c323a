//! Test data builders for creating test objects

use portflow::{DType, GenericBufferManager, OutputPort, PortConfig, TokenManager};

/// Builder for creating test OutputPorts
pub struct PortBuilder {
    index: usize,
    name: String,
    dtype: DType,
    config: PortConfig,
    buffers: Option<(usize, usize)>,
    tokens: Option<usize>,
}

impl PortBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            index: 0,
            name: name.to_string(),
            dtype: DType::F32,
            config: PortConfig::default(),
            buffers: None,
            tokens: None,
        }
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_buffer_queue_capacity = capacity;
        self.config.initial_label_queue_capacity = capacity;
        self
    }

    pub fn buffers(mut self, count: usize, bytes: usize) -> Self {
        self.buffers = Some((count, bytes));
        self
    }

    pub fn tokens(mut self, count: usize) -> Self {
        self.tokens = Some(count);
        self
    }

    pub fn build(self) -> OutputPort {
        let port = OutputPort::with_config(self.index, self.name, self.dtype, &self.config);
        if let Some((count, bytes)) = self.buffers {
            port.set_buffer_manager(Some(Box::new(GenericBufferManager::with_buffers(
                count, bytes,
            ))));
        }
        if let Some(count) = self.tokens {
            port.set_token_manager(Some(Box::new(TokenManager::with_tokens(count))));
        }
        port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_builder() {
        let port = PortBuilder::new("out")
            .index(2)
            .dtype(DType::I16)
            .buffers(1, 32)
            .tokens(1)
            .build();

        assert_eq!(port.index(), 2);
        assert_eq!(port.name(), "out");
        assert_eq!(port.dtype(), DType::I16);
        assert!(!port.buffer_manager_empty());
        assert!(!port.token_manager_empty());
    }
}
