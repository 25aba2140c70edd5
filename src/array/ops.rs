//! Elementwise, reduction and layout operations on dense arrays
//!
//! This is the operation surface the batch dictionary core consumes from its
//! array engine: comparison/absolute-value, masked fill, expand/unsqueeze,
//! cumulative sum, boolean reductions, and gather/scatter along the leading
//! dimension.

use super::dense::DenseArray;
use super::Shape;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::{dispatch_float, dispatch_numeric};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Minimum element count before elementwise kernels go parallel
#[cfg(feature = "rayon")]
const PARALLEL_MIN_LEN: usize = 4096;

impl DenseArray {
    /// Apply a scalar function elementwise (float dtypes only)
    pub(crate) fn map_float<F>(&self, f: F, op: &'static str) -> Result<DenseArray>
    where
        F: Fn(f64) -> f64 + Send + Sync,
    {
        dispatch_float!(self.dtype(), T => {
            let src: &[T] = self.as_slice();
            #[cfg(feature = "rayon")]
            if src.len() >= PARALLEL_MIN_LEN {
                let out: Vec<T> = src
                    .par_iter()
                    .map(|&x| T::from_f64(f(x.to_f64())))
                    .collect();
                return Ok(DenseArray::from_slice(&out, self.shape()));
            }
            let out: Vec<T> = src.iter().map(|&x| T::from_f64(f(x.to_f64()))).collect();
            Ok(DenseArray::from_slice(&out, self.shape()))
        }, op)
    }

    /// Elementwise absolute value
    pub fn abs(&self) -> Result<DenseArray> {
        dispatch_numeric!(self.dtype(), T => {
            let out: Vec<T> = self
                .as_slice::<T>()
                .iter()
                .map(|&x| T::from_f64(x.to_f64().abs()))
                .collect();
            Ok(DenseArray::from_slice(&out, self.shape()))
        }, "abs")
    }

    /// Elementwise clamp to a lower bound
    pub fn clamp_min(&self, min: f64) -> Result<DenseArray> {
        self.map_float(move |x| x.max(min), "clamp_min")
    }

    /// Elementwise closeness test: `|self - other| < atol + rtol * |other|`
    ///
    /// Both operands must share shape and a float dtype. Returns a boolean
    /// array of the same shape.
    pub fn is_close(&self, other: &DenseArray, atol: f64, rtol: f64) -> Result<DenseArray> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        self.check_same_dtype(other)?;
        dispatch_float!(self.dtype(), T => {
            let a: &[T] = self.as_slice();
            let b: &[T] = other.as_slice();
            let out: Vec<bool> = a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| {
                    let (x, y) = (x.to_f64(), y.to_f64());
                    (x - y).abs() < atol + rtol * y.abs()
                })
                .collect();
            DenseArray::from_bool_slice(&out, self.shape())
        }, "is_close")
    }

    /// Fill positions where `mask` is set with `value`, in place
    ///
    /// The mask must be a boolean array of the same shape as `self`.
    pub fn masked_fill(&mut self, mask: &DenseArray, value: f64) -> Result<()> {
        if mask.dtype() != DType::Bool {
            return Err(Error::unsupported_dtype(mask.dtype(), "masked_fill mask"));
        }
        if self.shape() != mask.shape() {
            return Err(Error::shape_mismatch(self.shape(), mask.shape()));
        }
        let mask_bytes: Vec<u8> = mask.as_bytes().to_vec();
        dispatch_numeric!(self.dtype(), T => {
            let fill = T::from_f64(value);
            let data: &mut [T] = self.as_mut_slice();
            for (x, &m) in data.iter_mut().zip(mask_bytes.iter()) {
                if m != 0 {
                    *x = fill;
                }
            }
            Ok(())
        }, "masked_fill")
    }

    /// Elementwise negation of a boolean array
    pub fn logical_not(&self) -> Result<DenseArray> {
        if self.dtype() != DType::Bool {
            return Err(Error::unsupported_dtype(self.dtype(), "logical_not"));
        }
        let out: Vec<bool> = self.as_bytes().iter().map(|&b| b == 0).collect();
        DenseArray::from_bool_slice(&out, self.shape())
    }

    /// Whether every element of a boolean array is set
    pub fn all(&self) -> Result<bool> {
        if self.dtype() != DType::Bool {
            return Err(Error::unsupported_dtype(self.dtype(), "all"));
        }
        Ok(self.as_bytes().iter().all(|&b| b != 0))
    }

    /// Whether any element of a boolean array is set
    pub fn any(&self) -> Result<bool> {
        if self.dtype() != DType::Bool {
            return Err(Error::unsupported_dtype(self.dtype(), "any"));
        }
        Ok(self.as_bytes().iter().any(|&b| b != 0))
    }

    /// AND-reduce a boolean array over its trailing `n` dimensions
    pub fn all_over_trailing(&self, n: usize) -> Result<DenseArray> {
        if self.dtype() != DType::Bool {
            return Err(Error::unsupported_dtype(self.dtype(), "all_over_trailing"));
        }
        if n > self.ndim() {
            return Err(Error::dimension_mismatch(
                self.shape(),
                format!("cannot reduce over {n} trailing dimensions"),
            ));
        }
        let keep = self.ndim() - n;
        let out_shape: Shape = self.shape()[..keep].into();
        let group: usize = self.shape()[keep..].iter().product();
        let bytes = self.as_bytes();
        let out: Vec<bool> = (0..out_shape.numel())
            .map(|i| bytes[i * group..(i + 1) * group].iter().all(|&b| b != 0))
            .collect();
        DenseArray::from_bool_slice(&out, &out_shape)
    }

    /// Cumulative sum of a 1-D numeric array
    pub fn cumsum(&self) -> Result<DenseArray> {
        if self.ndim() != 1 {
            return Err(Error::dimension_mismatch(
                self.shape(),
                "cumsum expects a 1-D array",
            ));
        }
        dispatch_numeric!(self.dtype(), T => {
            let mut acc = 0.0f64;
            let out: Vec<T> = self
                .as_slice::<T>()
                .iter()
                .map(|&x| {
                    acc += x.to_f64();
                    T::from_f64(acc)
                })
                .collect();
            Ok(DenseArray::from_slice(&out, self.shape()))
        }, "cumsum")
    }

    /// Split the trailing dimension into two equal halves
    ///
    /// Errors if the array is 0-dimensional or the trailing dimension is odd.
    pub fn chunk2_last(&self) -> Result<(DenseArray, DenseArray)> {
        let last = match self.shape().last() {
            Some(&last) => last,
            None => {
                return Err(Error::dimension_mismatch(
                    self.shape(),
                    "cannot split the trailing dimension of a 0-d array",
                ))
            }
        };
        if last % 2 != 0 {
            return Err(Error::dimension_mismatch(
                self.shape(),
                format!("trailing dimension {last} cannot be split in two equal chunks"),
            ));
        }
        let half = last / 2;
        let mut out_shape: Shape = self.shape().as_slice().into();
        *out_shape.last_mut().unwrap() = half;

        let esz = self.elem_size();
        let rows = if last == 0 { 0 } else { self.numel() / last };
        let row_bytes = last * esz;
        let half_bytes = half * esz;
        let mut lo = Vec::with_capacity(rows * half_bytes);
        let mut hi = Vec::with_capacity(rows * half_bytes);
        let bytes = self.as_bytes();
        for r in 0..rows {
            let base = r * row_bytes;
            lo.extend_from_slice(&bytes[base..base + half_bytes]);
            hi.extend_from_slice(&bytes[base + half_bytes..base + row_bytes]);
        }
        let lo = DenseArray::from_raw_parts(lo, self.dtype(), out_shape.clone());
        let hi = DenseArray::from_raw_parts(hi, self.dtype(), out_shape);
        Ok((lo, hi))
    }

    /// Append a size-1 dimension
    pub fn unsqueeze_last(&self) -> DenseArray {
        let mut out = self.clone();
        let ndim = out.ndim();
        out.shape_mut().insert(ndim, 1);
        out
    }

    /// Expand on the right to a desired shape, materializing the copies
    ///
    /// The array's shape must be a prefix of `target`; every element is
    /// repeated across the appended trailing dimensions.
    pub fn expand_right(&self, target: &[usize]) -> Result<DenseArray> {
        if target.len() < self.ndim() {
            return Err(Error::dimension_mismatch(
                self.shape(),
                format!("cannot expand {:?} right to {target:?}", self.shape()),
            ));
        }
        if &target[..self.ndim()] != self.shape().as_slice() {
            return Err(Error::shape_mismatch(target, self.shape()));
        }
        let tail: usize = target[self.ndim()..].iter().product();
        let esz = self.elem_size();
        let bytes = self.as_bytes();
        let mut out = Vec::with_capacity(bytes.len() * tail);
        for i in 0..self.numel() {
            let chunk = &bytes[i * esz..(i + 1) * esz];
            for _ in 0..tail {
                out.extend_from_slice(chunk);
            }
        }
        Ok(DenseArray::from_raw_parts(out, self.dtype(), target.into()))
    }

    /// Expand on the right to match another array's shape
    pub fn expand_as_right(&self, dest: &DenseArray) -> Result<DenseArray> {
        if dest.ndim() < self.ndim() {
            return Err(Error::dimension_mismatch(
                self.shape(),
                format!(
                    "expand_as_right requires the destination to have at least as many \
                     dimensions, got {} and {}",
                    self.ndim(),
                    dest.ndim()
                ),
            ));
        }
        self.expand_right(dest.shape())
    }

    /// Expand on the left to a desired shape, materializing the copies
    ///
    /// Dimensions are aligned on the right: each existing dimension must
    /// equal the target or be 1 (broadcast), and new leading dimensions
    /// repeat the whole block.
    pub fn expand_left(&self, target: &[usize]) -> Result<DenseArray> {
        if target.len() < self.ndim() {
            return Err(Error::dimension_mismatch(
                self.shape(),
                format!("cannot expand {:?} left to {target:?}", self.shape()),
            ));
        }
        let lead = target.len() - self.ndim();
        for (d, (&s, &t)) in self.shape().iter().zip(target[lead..].iter()).enumerate() {
            if s != t && s != 1 {
                return Err(Error::dimension_mismatch(
                    self.shape(),
                    format!("dimension {d} of size {s} cannot expand to {t}"),
                ));
            }
        }
        let esz = self.elem_size();
        let src_strides = super::shape::contiguous_strides(self.shape());
        let out_numel: usize = target.iter().product();
        let mut out = Vec::with_capacity(out_numel * esz);
        let bytes = self.as_bytes();
        let out_strides = super::shape::contiguous_strides(target);
        for flat in 0..out_numel {
            // map the output coordinate to a source flat index, broadcasting
            // size-1 and leading dimensions with stride 0
            let mut rem = flat;
            let mut src = 0usize;
            for (d, &stride) in out_strides.iter().enumerate() {
                let coord = rem / stride;
                rem %= stride;
                if d >= lead {
                    let sd = d - lead;
                    if self.shape()[sd] != 1 {
                        src += coord * src_strides[sd];
                    }
                }
            }
            out.extend_from_slice(&bytes[src * esz..(src + 1) * esz]);
        }
        Ok(DenseArray::from_raw_parts(out, self.dtype(), target.into()))
    }

    /// Gather rows along the leading dimension
    ///
    /// Negative positions wrap; out-of-range positions are an error.
    pub fn index_select0(&self, positions: &[i64]) -> Result<DenseArray> {
        if self.ndim() == 0 {
            return Err(Error::dimension_mismatch(
                self.shape(),
                "cannot select rows of a 0-d array",
            ));
        }
        let n = self.shape()[0];
        let row_bytes = self.shape()[1..].iter().product::<usize>() * self.elem_size();
        let mut out_shape: Shape = self.shape().as_slice().into();
        out_shape[0] = positions.len();
        let mut out = Vec::with_capacity(positions.len() * row_bytes);
        let bytes = self.as_bytes();
        for &p in positions {
            let i = normalize_position(p, n)?;
            out.extend_from_slice(&bytes[i * row_bytes..(i + 1) * row_bytes]);
        }
        Ok(DenseArray::from_raw_parts(out, self.dtype(), out_shape))
    }

    /// Scatter rows along the leading dimension, in place
    ///
    /// `src` must have shape `[positions.len(), self.shape()[1..]]` and the
    /// same dtype as `self`.
    pub fn index_put0(&mut self, positions: &[i64], src: &DenseArray) -> Result<()> {
        if self.ndim() == 0 {
            return Err(Error::dimension_mismatch(
                self.shape(),
                "cannot scatter rows of a 0-d array",
            ));
        }
        self.check_same_dtype(src)?;
        let n = self.shape()[0];
        let tail = &self.shape()[1..];
        if src.ndim() == 0 || src.shape()[0] != positions.len() || &src.shape()[1..] != tail {
            let mut expected = vec![positions.len()];
            expected.extend_from_slice(tail);
            return Err(Error::shape_mismatch(&expected, src.shape()));
        }
        let row_bytes = tail.iter().product::<usize>() * self.elem_size();
        let src_bytes: Vec<u8> = src.as_bytes().to_vec();
        let dst = self.bytes_mut();
        for (k, &p) in positions.iter().enumerate() {
            let i = normalize_position(p, n)?;
            dst[i * row_bytes..(i + 1) * row_bytes]
                .copy_from_slice(&src_bytes[k * row_bytes..(k + 1) * row_bytes]);
        }
        Ok(())
    }
}

/// Wrap a possibly-negative position into `[0, n)`
pub(crate) fn normalize_position(p: i64, n: usize) -> Result<usize> {
    let i = if p < 0 { p + n as i64 } else { p };
    if i < 0 || i as usize >= n {
        return Err(Error::IndexOutOfBounds { index: p, size: n });
    }
    Ok(i as usize)
}
