//! Identity of an input port, as referenced by output ports.

use crate::types::DType;

/// Minimal description of an input port.
///
/// Output ports hold these only to express a read-before-write ordering;
/// the input side of the pipeline lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPort {
    index: usize,
    name: String,
    dtype: DType,
    domain: String,
}

impl InputPort {
    pub fn new(index: usize, name: impl Into<String>, dtype: DType) -> Self {
        Self {
            index,
            name: name.into(),
            dtype,
            domain: String::new(),
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
}
