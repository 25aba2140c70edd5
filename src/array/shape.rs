//! Shape type: dimensions of an array or batch

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::{Deref, DerefMut};

/// Stack allocation threshold for dimensions
/// Most batch shapes have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of an array or batch
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create an empty (scalar) shape.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create an empty shape with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(SmallVec::with_capacity(capacity))
    }

    /// Push a dimension.
    pub fn push(&mut self, dim: usize) {
        self.0.push(dim);
    }

    /// Remove dimension at index.
    pub fn remove(&mut self, index: usize) -> usize {
        self.0.remove(index)
    }

    /// Insert a dimension at index.
    pub fn insert(&mut self, index: usize, value: usize) {
        self.0.insert(index, value);
    }

    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Whether this shape has zero dimensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is a prefix of this shape.
    pub fn starts_with(&self, prefix: &[usize]) -> bool {
        self.0.len() >= prefix.len() && &self.0[..prefix.len()] == prefix
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for Shape {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Row-major (C-order) strides for a contiguous shape, in elements.
pub(crate) fn contiguous_strides(shape: &[usize]) -> SmallVec<[usize; STACK_DIMS]> {
    let mut strides: SmallVec<[usize; STACK_DIMS]> = SmallVec::with_capacity(shape.len());
    let mut stride = 1usize;
    for &dim in shape.iter().rev() {
        strides.push(stride);
        stride *= dim;
    }
    strides.reverse();
    strides
}

/// Resolve a target shape that may contain one `-1` placeholder.
///
/// Given a requested shape and the number of elements it must describe,
/// returns the concrete shape with the `-1` dimension inferred. At most one
/// dimension may be `-1`; any other negative entry is invalid, and the
/// resolved shape must account for exactly `numel` elements.
pub fn infer_resize(shape: &[i64], numel: usize) -> Result<Vec<usize>> {
    let mut newsize: usize = 1;
    let mut infer_dim: Option<usize> = None;
    for (dim, &s) in shape.iter().enumerate() {
        if s == -1 {
            if infer_dim.is_some() {
                return Err(Error::invalid_argument(
                    "shape",
                    "only one dimension can be inferred",
                ));
            }
            infer_dim = Some(dim);
        } else if s >= 0 {
            newsize *= s as usize;
        } else {
            return Err(Error::invalid_argument(
                "shape",
                format!("invalid shape dimension {s}"),
            ));
        }
    }
    let valid = numel == newsize
        || (infer_dim.is_some() && newsize > 0 && numel % newsize == 0);
    if !valid {
        return Err(Error::invalid_argument(
            "shape",
            format!("shape {shape:?} is invalid for {numel} elements"),
        ));
    }
    let mut out: Vec<usize> = shape.iter().map(|&s| s.max(0) as usize).collect();
    if let Some(dim) = infer_dim {
        out[dim] = numel / newsize;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_basics() {
        let mut s = Shape::from([2, 3, 4]);
        assert_eq!(s.ndim(), 3);
        assert_eq!(s.numel(), 24);
        assert!(s.starts_with(&[2, 3]));
        assert!(!s.starts_with(&[3]));
        s.push(5);
        assert_eq!(s.as_slice(), &[2, 3, 4, 5]);
        assert_eq!(s.remove(0), 2);
        s.insert(0, 7);
        assert_eq!(s.as_slice(), &[7, 3, 4, 5]);
    }

    #[test]
    fn test_contiguous_strides() {
        assert_eq!(contiguous_strides(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
        assert!(contiguous_strides(&[]).is_empty());
    }

    #[test]
    fn test_infer_resize() {
        assert_eq!(infer_resize(&[2, -1], 6).unwrap(), vec![2, 3]);
        assert_eq!(infer_resize(&[6], 6).unwrap(), vec![6]);
        assert_eq!(infer_resize(&[-1], 0).unwrap(), vec![0]);
        assert!(infer_resize(&[-1, -1], 4).is_err());
        assert!(infer_resize(&[4, -2], 4).is_err());
        assert!(infer_resize(&[4], 6).is_err());
    }
}
