//! Error types for batchdict

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using batchdict's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in batchdict operations
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: i64,
        /// Size of the dimension
        size: usize,
    },

    /// Index has more dimensions than the batch shape supports, or the
    /// components of a fancy index disagree
    #[error("The shape {shape:?} is incompatible with the index: {reason}")]
    DimensionMismatch {
        /// Shape being indexed
        shape: Vec<usize>,
        /// What went wrong
        reason: String,
    },

    /// More than one ellipsis in a single index expression
    #[error("An index can only have one ellipsis at most")]
    MultipleEllipsis,

    /// An index element whose type is not recognized in this position
    #[error("Batch dimension cannot be computed for index element of kind '{kind}'")]
    UnsupportedIndex {
        /// Kind of the offending index element
        kind: &'static str,
    },

    /// Integer batch index on a ragged read or write
    #[error(
        "Indexing a ragged batch with the integer {index} is prohibited, as this \
         would produce a ragged batch without a batch dimension. To select a single \
         element, index with the length-1 array [{index}] instead"
    )]
    RaggedIntegerIndex {
        /// The rejected integer
        index: i64,
    },

    /// A ragged write whose replacement key set differs from the target's
    #[error("Mismatch between target keys {expected:?} and replacement keys {got:?}")]
    KeySetMismatch {
        /// Keys of the target ragged batch
        expected: Vec<String>,
        /// Keys of the replacement
        got: Vec<String>,
    },

    /// Container key lookup failed
    #[error("Key \"{key}\" not found in the batch dictionary")]
    KeyNotFound {
        /// The missing key
        key: String,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(shape: &[usize], reason: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
