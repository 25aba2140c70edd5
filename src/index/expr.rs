//! Index expression model: the elements an index tuple may contain

use crate::array::Shape;
use crate::error::{Error, Result};

/// A Python-style slice with optional bounds and step
///
/// Semantics follow `slice.indices`: negative bounds wrap around the
/// dimension, out-of-range bounds clamp, and a missing bound defaults to
/// the full extent in the direction of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSpec {
    /// Inclusive start, possibly negative
    pub start: Option<i64>,
    /// Exclusive stop, possibly negative
    pub stop: Option<i64>,
    /// Step, defaults to 1, must be nonzero
    pub step: Option<i64>,
}

impl SliceSpec {
    /// `start:stop:step` with every bound explicit
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// The full slice `:`
    pub fn full() -> Self {
        Self::default()
    }

    /// The slice `start:stop`
    pub fn range(start: i64, stop: i64) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    /// Resolve to concrete `(start, stop, step)` against a dimension of
    /// size `dim`, clamping like Python's `slice.indices`
    pub fn indices(&self, dim: usize) -> Result<(i64, i64, i64)> {
        let dim = dim as i64;
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(Error::invalid_argument("step", "slice step cannot be zero"));
        }
        let (lower, upper) = if step > 0 { (0, dim) } else { (-1, dim - 1) };

        let start = match self.start {
            None => {
                if step > 0 {
                    lower
                } else {
                    upper
                }
            }
            Some(s) if s < 0 => (s + dim).max(lower),
            Some(s) => s.min(upper),
        };
        let stop = match self.stop {
            None => {
                if step > 0 {
                    upper
                } else {
                    lower
                }
            }
            Some(s) if s < 0 => (s + dim).max(lower),
            Some(s) => s.min(upper),
        };
        Ok((start, stop, step))
    }

    /// Number of positions selected from a dimension of size `dim`
    pub fn len(&self, dim: usize) -> Result<usize> {
        let (start, stop, step) = self.indices(dim)?;
        let len = if step > 0 && stop > start {
            (stop - start - 1) / step + 1
        } else if step < 0 && stop < start {
            (start - stop - 1) / (-step) + 1
        } else {
            0
        };
        Ok(len as usize)
    }

    /// Concrete positions selected from a dimension of size `dim`
    pub fn positions(&self, dim: usize) -> Result<Vec<usize>> {
        let (start, stop, step) = self.indices(dim)?;
        let mut out = Vec::new();
        let mut i = start;
        if step > 0 {
            while i < stop {
                out.push(i as usize);
                i += step;
            }
        } else {
            while i > stop {
                out.push(i as usize);
                i += step;
            }
        }
        Ok(out)
    }
}

/// An integer array index, possibly multidimensional
///
/// Rank-0 and rank-1 arrays behave like position lists in the general walk;
/// arrays of any rank participate in the all-arrays fancy form, where every
/// component must share one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntArrayIndex {
    shape: Shape,
    values: Vec<i64>,
}

impl IntArrayIndex {
    /// Create an array index with an explicit shape
    pub fn new(values: Vec<i64>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![values.len()],
            });
        }
        Ok(Self {
            shape: Shape::from(shape),
            values,
        })
    }

    /// Create a 1-D array index
    pub fn from_vec(values: Vec<i64>) -> Self {
        let shape = Shape::from([values.len()]);
        Self { shape, values }
    }

    /// Shape of the index array
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Rank of the index array
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Leading-dimension length (total length for rank ≤ 1)
    pub fn len(&self) -> usize {
        match self.shape.first() {
            Some(&d) => d,
            None => 1,
        }
    }

    /// Whether the index selects nothing
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row-major values
    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

/// One element of an index expression
///
/// A full expression is a `&[Index]`; a bare element is a one-element
/// expression. `List` is a plain position sequence and never participates
/// in the fancy all-arrays form; `IntArray` does.
#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    /// `None`: insert a new size-1 dimension
    NewAxis,
    /// `...`: as many full slices as needed (at most one per expression)
    Ellipsis,
    /// A single position; drops the dimension it consumes
    Int(i64),
    /// A range of positions
    Slice(SliceSpec),
    /// A plain sequence of positions
    List(Vec<i64>),
    /// An integer array of positions
    IntArray(IntArrayIndex),
    /// A 1-D boolean mask; selects positions where set
    BoolMask(Vec<bool>),
}

impl Index {
    /// The full slice `:`
    pub fn full_slice() -> Self {
        Index::Slice(SliceSpec::full())
    }

    /// A 1-D integer array index
    pub fn array(values: Vec<i64>) -> Self {
        Index::IntArray(IntArrayIndex::from_vec(values))
    }

    /// Short name of this element kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Index::NewAxis => "new-axis",
            Index::Ellipsis => "ellipsis",
            Index::Int(_) => "int",
            Index::Slice(_) => "slice",
            Index::List(_) => "list",
            Index::IntArray(_) => "int-array",
            Index::BoolMask(_) => "bool-mask",
        }
    }
}

impl From<i64> for Index {
    fn from(value: i64) -> Self {
        Index::Int(value)
    }
}

impl From<SliceSpec> for Index {
    fn from(value: SliceSpec) -> Self {
        Index::Slice(value)
    }
}

impl From<Vec<i64>> for Index {
    fn from(value: Vec<i64>) -> Self {
        Index::List(value)
    }
}

impl From<Vec<bool>> for Index {
    fn from(value: Vec<bool>) -> Self {
        Index::BoolMask(value)
    }
}

impl From<IntArrayIndex> for Index {
    fn from(value: IntArrayIndex) -> Self {
        Index::IntArray(value)
    }
}
