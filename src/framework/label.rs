//! Stream tags attached to positions in an output stream.

use serde::{Deserialize, Serialize};

use crate::value::TypedValue;

/// Unit of a label's `index` and `width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LabelUnit {
    /// Positions count stream elements
    #[default]
    Elements,
    /// Positions count bytes
    Bytes,
}

/// A tag associating an id and a value with a stream position.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: String,
    pub data: TypedValue,
    pub index: u64,
    /// Number of positions the label spans (at least one)
    pub width: usize,
    pub unit: LabelUnit,
}

impl Label {
    /// A one-wide label at element `index`.
    pub fn new(id: impl Into<String>, data: TypedValue, index: u64) -> Self {
        Self {
            id: id.into(),
            data,
            index,
            width: 1,
            unit: LabelUnit::Elements,
        }
    }

    /// A one-wide label at byte offset `index`.
    pub fn at_byte(id: impl Into<String>, data: TypedValue, index: u64) -> Self {
        Self {
            unit: LabelUnit::Bytes,
            ..Self::new(id, data, index)
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Rescale position and width by `mult / div`.
    ///
    /// Width never drops below one. A zero divisor is treated as one.
    /// Results that do not fit saturate at the type's maximum.
    pub fn adjust(&mut self, mult: usize, div: usize) -> &mut Self {
        let scale = |v: u128| v * mult as u128 / div.max(1) as u128;
        self.index = u64::try_from(scale(self.index as u128)).unwrap_or(u64::MAX);
        self.width = usize::try_from(scale(self.width as u128))
            .unwrap_or(usize::MAX)
            .max(1);
        self
    }

    /// Express the label in elements of `elem_size` bytes.
    pub fn to_elements(&mut self, elem_size: usize) {
        if self.unit == LabelUnit::Bytes {
            self.adjust(1, elem_size);
            self.unit = LabelUnit::Elements;
        }
    }
}
