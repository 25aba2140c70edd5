//! Field-kind dispatch: one operation surface over dense and ragged storage
//!
//! Every value held by a batch dictionary exposes the same capability set
//! (shape, dtype, rank, get/set item, sharing/meta status, gradient
//! tracking). [`FieldOps`] is that surface; [`Field`] is the tagged variant
//! routing each capability to the right implementation. Adding a storage
//! kind means one new variant and one `FieldOps` impl, with no call sites
//! touched.

use crate::array::{DenseArray, Shape};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::index::Index;

#[cfg(feature = "ragged")]
use crate::ragged::RaggedBatch;

/// Capability surface shared by every field kind
pub trait FieldOps: Sized {
    /// Shape of the field (for ragged fields, the batch size alone)
    fn shape(&self) -> Shape;

    /// Declared rank (always 1 for ragged fields)
    fn ndim(&self) -> usize;

    /// Element type (the values-buffer dtype for ragged fields)
    fn dtype(&self) -> DType;

    /// Whether the storage is shared across processes
    fn is_shared(&self) -> bool;

    /// Whether this is a meta field without real storage
    fn is_meta(&self) -> bool;

    /// Whether gradients are tracked
    fn requires_grad(&self) -> bool;

    /// Select according to a normalized index expression
    fn get(&self, items: &[Index]) -> Result<Self>;

    /// Overwrite the selection with `value`, in place
    fn set(&mut self, items: &[Index], value: &Self) -> Result<()>;
}

impl FieldOps for DenseArray {
    fn shape(&self) -> Shape {
        DenseArray::shape(self).clone()
    }

    fn ndim(&self) -> usize {
        DenseArray::ndim(self)
    }

    fn dtype(&self) -> DType {
        DenseArray::dtype(self)
    }

    fn is_shared(&self) -> bool {
        DenseArray::is_shared(self)
    }

    fn is_meta(&self) -> bool {
        DenseArray::is_meta(self)
    }

    fn requires_grad(&self) -> bool {
        DenseArray::requires_grad(self)
    }

    fn get(&self, items: &[Index]) -> Result<Self> {
        self.get_index(items)
    }

    fn set(&mut self, items: &[Index], value: &Self) -> Result<()> {
        self.set_index(items, value)
    }
}

#[cfg(feature = "ragged")]
impl FieldOps for RaggedBatch {
    fn shape(&self) -> Shape {
        Shape::from([self.batch_size()])
    }

    fn ndim(&self) -> usize {
        1
    }

    fn dtype(&self) -> DType {
        RaggedBatch::dtype(self)
    }

    fn is_shared(&self) -> bool {
        false
    }

    fn is_meta(&self) -> bool {
        false
    }

    fn requires_grad(&self) -> bool {
        RaggedBatch::requires_grad(self)
    }

    fn get(&self, items: &[Index]) -> Result<Self> {
        match items {
            [] => self.get_batch(&Index::full_slice()),
            [index] => self.get_batch(index),
            _ => Err(Error::dimension_mismatch(
                &[self.batch_size()],
                format!("a ragged batch has one batch dimension, got index {items:?}"),
            )),
        }
    }

    fn set(&mut self, items: &[Index], value: &Self) -> Result<()> {
        match items {
            [] => self.set_batch(&Index::full_slice(), value),
            [index] => self.set_batch(index, value),
            _ => Err(Error::dimension_mismatch(
                &[self.batch_size()],
                format!("a ragged batch has one batch dimension, got index {items:?}"),
            )),
        }
    }
}

/// A value bound to a key of a batch dictionary
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A uniform multidimensional array
    Dense(DenseArray),
    /// A batched ragged array
    #[cfg(feature = "ragged")]
    Ragged(RaggedBatch),
}

impl Field {
    /// The dense array, if this is a dense field
    pub fn as_dense(&self) -> Option<&DenseArray> {
        match self {
            Field::Dense(a) => Some(a),
            #[cfg(feature = "ragged")]
            _ => None,
        }
    }

    /// The ragged batch, if this is a ragged field
    #[cfg(feature = "ragged")]
    pub fn as_ragged(&self) -> Option<&RaggedBatch> {
        match self {
            Field::Ragged(r) => Some(r),
            _ => None,
        }
    }

    /// Short name of the field kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Field::Dense(_) => "dense",
            #[cfg(feature = "ragged")]
            Field::Ragged(_) => "ragged",
        }
    }
}

impl FieldOps for Field {
    fn shape(&self) -> Shape {
        match self {
            Field::Dense(a) => FieldOps::shape(a),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => FieldOps::shape(r),
        }
    }

    fn ndim(&self) -> usize {
        match self {
            Field::Dense(a) => FieldOps::ndim(a),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => FieldOps::ndim(r),
        }
    }

    fn dtype(&self) -> DType {
        match self {
            Field::Dense(a) => FieldOps::dtype(a),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => FieldOps::dtype(r),
        }
    }

    fn is_shared(&self) -> bool {
        match self {
            Field::Dense(a) => FieldOps::is_shared(a),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => FieldOps::is_shared(r),
        }
    }

    fn is_meta(&self) -> bool {
        match self {
            Field::Dense(a) => FieldOps::is_meta(a),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => FieldOps::is_meta(r),
        }
    }

    fn requires_grad(&self) -> bool {
        match self {
            Field::Dense(a) => FieldOps::requires_grad(a),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => FieldOps::requires_grad(r),
        }
    }

    fn get(&self, items: &[Index]) -> Result<Self> {
        match self {
            Field::Dense(a) => a.get(items).map(Field::Dense),
            #[cfg(feature = "ragged")]
            Field::Ragged(r) => r.get(items).map(Field::Ragged),
        }
    }

    fn set(&mut self, items: &[Index], value: &Self) -> Result<()> {
        match (self, value) {
            (Field::Dense(a), Field::Dense(v)) => a.set(items, v),
            #[cfg(feature = "ragged")]
            (Field::Ragged(r), Field::Ragged(v)) => r.set(items, v),
            #[cfg(feature = "ragged")]
            (target, value) => Err(Error::invalid_argument(
                "value",
                format!(
                    "cannot assign a {} field into a {} field",
                    value.kind(),
                    target.kind()
                ),
            )),
        }
    }
}

impl From<DenseArray> for Field {
    fn from(value: DenseArray) -> Self {
        Field::Dense(value)
    }
}

#[cfg(feature = "ragged")]
impl From<RaggedBatch> for Field {
    fn from(value: RaggedBatch) -> Self {
        Field::Ragged(value)
    }
}
