//! Data type system for batchdict arrays
//!
//! This module provides the `DType` enum representing all supported element
//! types, along with the `Element` trait connecting them to Rust types.

mod element;

pub use element::Element;

use std::fmt;

/// Data types supported by batchdict arrays
///
/// This enum represents the element type of an array at runtime. Using an
/// enum (rather than generics) lets heterogeneous fields live in one
/// container and lets dtype be selected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Boolean (stored as one byte per element, 0 or 1)
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(&self) -> usize {
        match self {
            DType::Bool => 1,
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
        }
    }

    /// Whether this is a floating point dtype
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// Whether this is a signed integer dtype
    #[inline]
    pub const fn is_int(&self) -> bool {
        matches!(self, DType::I32 | DType::I64)
    }

    /// Returns the dtype name as a string
    pub const fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Macro for runtime dtype dispatch to typed operations.
///
/// Takes a `DType` value and executes a code block with `T` bound to the
/// corresponding Rust numeric type. `Bool` is not a numeric type and yields
/// an `UnsupportedDType` error carrying the operation name.
#[macro_export]
macro_rules! dispatch_numeric {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::Bool => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: $dtype,
                    op: $error_op,
                })
            }
        }
    };
}

/// Macro for runtime dtype dispatch restricted to floating point types.
#[macro_export]
macro_rules! dispatch_float {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            _ => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: $dtype,
                    op: $error_op,
                })
            }
        }
    };
}
