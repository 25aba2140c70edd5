//! # batchdict
//!
//! **A batched tensor-dictionary: heterogeneous named fields behaving like
//! one array under indexing and assignment.**
//!
//! batchdict provides the [`BatchDict`](dict::BatchDict) container and the
//! shape/index algebra underneath it: given a Python-style index expression
//! (integers, slices, ellipses, integer/boolean array masks, new-axis
//! markers) and a declared batch shape, it computes the resulting batch
//! shape without touching data, and applies the same expression
//! consistently to every field, whether the field is a dense array or a
//! variable-length ragged batch sharing the batch dimension.
//!
//! ## What's inside
//!
//! - **Shape inference**: [`index::infer_shape`] resolves an index
//!   expression against a base shape, purely on metadata
//! - **Ellipsis normalization**: [`index::expand_ellipsis`] rewrites `...`
//!   into explicit full slices
//! - **Dense engine**: [`array::DenseArray`], a contiguous CPU array with
//!   the gather/scatter, compare, masked-fill, expand and cumulative-sum
//!   operations the container needs
//! - **Ragged batches**: [`ragged::RaggedBatch`] (feature `"ragged"`), flat
//!   value/weight buffers with per-key per-row lengths and offsets, indexed
//!   and assigned along the shared batch dimension
//! - **Field dispatch**: [`field::Field`] and [`field::FieldOps`], one
//!   capability surface over every storage kind
//! - **Parameter splitting**: [`nn::NormalParamSplit`] and the positive
//!   scale mappings, plus the [`nn::Delta`] distribution
//!
//! ## Quick Start
//!
//! ```rust
//! use batchdict::prelude::*;
//!
//! let mut td = BatchDict::new([4]);
//! td.set("obs", DenseArray::from_slice(&[0.0f32; 12], &[4, 3]))?;
//!
//! let sub = td.get_item(&[Index::array(vec![1, 3])])?;
//! assert_eq!(sub.batch_shape().as_slice(), &[2]);
//! # Ok::<(), batchdict::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `ragged` (default): ragged batched fields; without it the container
//!   is dense-only
//! - `rayon` (default): multi-threaded elementwise kernels

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod dict;
pub mod dtype;
pub mod error;
pub mod field;
pub mod index;
pub mod nn;
#[cfg(feature = "ragged")]
pub mod ragged;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::array::{DenseArray, Shape};
    pub use crate::dict::BatchDict;
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::field::{Field, FieldOps};
    pub use crate::index::{Index, IntArrayIndex, SliceSpec};

    #[cfg(feature = "ragged")]
    pub use crate::ragged::RaggedBatch;
}
