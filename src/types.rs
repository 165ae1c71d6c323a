//! Core data types shared by the value container and the port pipeline
//!
//! # Main Types
//!
//! - [`DType`] - Element data-type of a stream (u8, i16, f32, complex, raw, ...)
//!
//! # Element Types
//!
//! Every buffer flowing through an output port is a sequence of fixed-size
//! elements. The port fixes one `DType`; buffers that do not describe
//! themselves inherit it when posted.
//!
//! - Unsigned integers: u8, u16, u32, u64
//! - Signed integers: i8, i16, i32, i64
//! - Floating point: f32, f64
//! - Complex floating point: complex_f32, complex_f64 (interleaved re/im)
//! - Boolean values (one byte)
//! - Raw fixed-size elements (for opaque records)
//! - Unspecified (message-only ports, self-describing buffers)

use serde::{Deserialize, Serialize};

/// Element data-type of a buffer or port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DType {
    /// No element type; buffers are treated as plain bytes
    #[default]
    Unspecified,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Complex value made of two 32-bit floats
    Complex32,
    /// Complex value made of two 64-bit floats
    Complex64,
    /// Boolean value (one byte)
    Bool,
    /// Opaque element of the given size in bytes
    Raw(usize),
}

impl DType {
    /// Returns the size in bytes of one element (0 when unspecified)
    pub fn size(&self) -> usize {
        match self {
            DType::Unspecified => 0,
            DType::U8 | DType::I8 | DType::Bool => 1,
            DType::U16 | DType::I16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::U64 | DType::I64 | DType::F64 | DType::Complex32 => 8,
            DType::Complex64 => 16,
            DType::Raw(size) => *size,
        }
    }

    /// Whether an element type has been declared
    pub fn is_set(&self) -> bool {
        !matches!(self, DType::Unspecified)
    }

    /// Size used for byte/element arithmetic; unspecified counts as one byte.
    pub fn stride(&self) -> usize {
        self.size().max(1)
    }

    /// Canonical lowercase name
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DType::Unspecified => write!(f, "unspecified"),
            DType::U8 => write!(f, "u8"),
            DType::U16 => write!(f, "u16"),
            DType::U32 => write!(f, "u32"),
            DType::U64 => write!(f, "u64"),
            DType::I8 => write!(f, "i8"),
            DType::I16 => write!(f, "i16"),
            DType::I32 => write!(f, "i32"),
            DType::I64 => write!(f, "i64"),
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
            DType::Complex32 => write!(f, "complex_f32"),
            DType::Complex64 => write!(f, "complex_f64"),
            DType::Bool => write!(f, "bool"),
            DType::Raw(size) => write!(f, "{} bytes", size),
        }
    }
}
