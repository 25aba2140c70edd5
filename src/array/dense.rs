//! Core dense array type: contiguous row-major storage with runtime dtype

use super::Shape;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::fmt;

/// N-dimensional dense array with contiguous row-major storage
///
/// `DenseArray` is the array-engine collaborator of the batch dictionary:
/// a dtype-erased byte buffer plus a shape. All views produced by indexing
/// are owned copies; there is no stride/offset aliasing.
///
/// The `requires_grad`, `shared` and `meta` flags are carried as plain
/// metadata so the field dispatch layer can report them uniformly; this
/// engine performs no differentiation or sharing itself.
#[derive(Clone)]
pub struct DenseArray {
    data: Vec<u8>,
    dtype: DType,
    shape: Shape,
    requires_grad: bool,
    shared: bool,
    meta: bool,
}

impl DenseArray {
    /// Create an array from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape`
    /// dimensions. For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("DenseArray::from_slice failed")
    }

    /// Create an array from a slice of data (fallible version)
    ///
    /// Returns an error if `data.len()` does not equal the product of the
    /// `shape` dimensions.
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            data: bytemuck::cast_slice(data).to_vec(),
            dtype: T::DTYPE,
            shape: Shape::from(shape),
            requires_grad: false,
            shared: false,
            meta: false,
        })
    }

    /// Create a boolean array from a slice of `bool`
    pub fn from_bool_slice(data: &[bool], shape: &[usize]) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            data: data.iter().map(|&b| b as u8).collect(),
            dtype: DType::Bool,
            shape: Shape::from(shape),
            requires_grad: false,
            shared: false,
            meta: false,
        })
    }

    /// Create an array filled with zeros
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: vec![0u8; len * dtype.size_in_bytes()],
            dtype,
            shape: Shape::from(shape),
            requires_grad: false,
            shared: false,
            meta: false,
        }
    }

    /// Create an array with unspecified contents
    ///
    /// The contents are not meaningful until written; reading them is safe
    /// but yields zeros.
    pub fn empty(shape: &[usize], dtype: DType) -> Self {
        Self::zeros(shape, dtype)
    }

    /// Create a 1-D `I64` array holding `0..end`
    pub fn arange(end: i64) -> Self {
        let data: Vec<i64> = (0..end).collect();
        Self::from_slice(&data, &[end.max(0) as usize])
    }

    /// Shape of the array
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Element type of the array
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Size of one element in bytes
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    /// Raw storage bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy the contents out as a typed `Vec`
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the array's dtype.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        assert_eq!(
            T::DTYPE,
            self.dtype,
            "to_vec dtype mismatch: requested {:?}, array holds {:?}",
            T::DTYPE,
            self.dtype
        );
        if self.data.is_empty() {
            return Vec::new();
        }
        bytemuck::cast_slice(&self.data).to_vec()
    }

    /// Copy a boolean array's contents out as `Vec<bool>`
    ///
    /// # Panics
    ///
    /// Panics if the array is not of dtype `Bool`.
    pub fn to_bool_vec(&self) -> Vec<bool> {
        assert_eq!(self.dtype, DType::Bool, "to_bool_vec on non-bool array");
        self.data.iter().map(|&b| b != 0).collect()
    }

    /// Typed view of the storage
    pub(crate) fn as_slice<T: Element>(&self) -> &[T] {
        bytemuck::cast_slice(&self.data)
    }

    pub(crate) fn as_mut_slice<T: Element>(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Whether gradients are tracked for this array
    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Set gradient tracking
    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
    }

    /// Whether the storage is shared across processes
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Mark the storage as shared
    pub fn set_shared(&mut self, shared: bool) {
        self.shared = shared;
    }

    /// Whether this is a meta array (shape/dtype only, no real storage)
    #[inline]
    pub fn is_meta(&self) -> bool {
        self.meta
    }

    /// Mark this as a meta array
    pub fn set_meta(&mut self, meta: bool) {
        self.meta = meta;
    }

    /// Reinterpret the array with a new shape holding the same elements
    ///
    /// The target shape may contain one `-1` dimension to be inferred.
    pub fn reshape(&self, shape: &[i64]) -> Result<Self> {
        let resolved = super::shape::infer_resize(shape, self.numel())?;
        let mut out = self.clone();
        out.shape = Shape::from(resolved);
        Ok(out)
    }

    /// Assemble an array from raw storage bytes
    pub(crate) fn from_raw_parts(data: Vec<u8>, dtype: DType, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.numel() * dtype.size_in_bytes());
        Self {
            data,
            dtype,
            shape,
            requires_grad: false,
            shared: false,
            meta: false,
        }
    }

    #[inline]
    pub(crate) fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    /// Replace the contents wholesale, preserving flags
    ///
    /// Used by in-place write paths that rebuild storage before swapping.
    pub(crate) fn swap_contents(&mut self, other: DenseArray) {
        self.data = other.data;
        self.dtype = other.dtype;
        self.shape = other.shape;
    }

    /// Check that `self` and `other` have identical dtype
    pub(crate) fn check_same_dtype(&self, other: &DenseArray) -> Result<()> {
        if self.dtype != other.dtype {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype,
                rhs: other.dtype,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for DenseArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DenseArray {{ shape: {:?}, dtype: {} }}",
            self.shape.as_slice(),
            self.dtype
        )
    }
}

impl PartialEq for DenseArray {
    /// Bitwise equality of dtype, shape and contents (flags excluded)
    fn eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype && self.shape == other.shape && self.data == other.data
    }
}
