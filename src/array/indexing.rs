//! Applying index expressions to dense arrays
//!
//! `get_index`/`set_index` materialize the selection whose shape
//! [`infer_shape`](crate::index::infer_shape) predicts: each expression
//! element consumes one leading dimension (or inserts a new axis), an
//! all-arrays expression gathers pointwise over the consumed dimensions,
//! and unconsumed trailing dimensions are carried over as contiguous
//! blocks.

use super::dense::DenseArray;
use super::ops::normalize_position;
use super::shape::contiguous_strides;
use super::Shape;
use crate::error::{Error, Result};
use crate::index::{expand_ellipsis, has_ellipsis, Index, IntArrayIndex};

/// Per-dimension selector resolved against a concrete shape
enum Sel {
    /// Keep the dimension, selecting these positions
    Rows(Vec<usize>),
    /// Drop the dimension, selecting one position
    At(usize),
    /// Insert a new size-1 dimension (consumes nothing)
    New,
}

impl DenseArray {
    /// Select a sub-array according to an index expression
    ///
    /// An ellipsis in the expression is expanded against this array's shape
    /// first. The result is an owned copy.
    pub fn get_index(&self, items: &[Index]) -> Result<DenseArray> {
        let expanded;
        let items = if has_ellipsis(items) {
            expanded = expand_ellipsis(items, self.shape())?;
            &expanded[..]
        } else {
            items
        };

        if let Some(arrays) = fancy_form(self.shape(), items) {
            return self.fancy_get(&arrays);
        }

        let (sels, consumed) = build_selectors(self.shape(), items)?;
        let out_shape = selection_shape(&sels, &self.shape()[consumed..]);
        let esz = self.elem_size();
        let block = self.shape()[consumed..].iter().product::<usize>() * esz;
        let strides = contiguous_strides(self.shape());

        let lists = selector_positions(&sels);
        let combo_strides = combo_strides(&lists);
        let total: usize = lists.iter().map(|l| l.len()).product();

        let mut out = Vec::with_capacity(total * block);
        let bytes = self.as_bytes();
        for combo in 0..total {
            let mut rem = combo;
            let mut offset = 0usize;
            for (k, list) in lists.iter().enumerate() {
                let j = rem / combo_strides[k];
                rem %= combo_strides[k];
                offset += list[j] * strides[k];
            }
            out.extend_from_slice(&bytes[offset * esz..offset * esz + block]);
        }
        Ok(DenseArray::from_raw_parts(out, self.dtype(), out_shape))
    }

    /// Write a sub-array according to an index expression, in place
    ///
    /// `value` must have exactly the shape the selection would produce and
    /// the same dtype as `self`.
    pub fn set_index(&mut self, items: &[Index], value: &DenseArray) -> Result<()> {
        let expanded;
        let items = if has_ellipsis(items) {
            expanded = expand_ellipsis(items, self.shape())?;
            &expanded[..]
        } else {
            items
        };
        self.check_same_dtype(value)?;

        if let Some(arrays) = fancy_form(self.shape(), items) {
            return self.fancy_set(&arrays, value);
        }

        let (sels, consumed) = build_selectors(self.shape(), items)?;
        let out_shape = selection_shape(&sels, &self.shape()[consumed..]);
        if value.shape() != &out_shape {
            return Err(Error::shape_mismatch(&out_shape, value.shape()));
        }
        let esz = self.elem_size();
        let block = self.shape()[consumed..].iter().product::<usize>() * esz;
        let strides = contiguous_strides(self.shape());

        let lists = selector_positions(&sels);
        let combo_strides = combo_strides(&lists);
        let total: usize = lists.iter().map(|l| l.len()).product();

        let src = value.as_bytes().to_vec();
        let dst = self.bytes_mut();
        for combo in 0..total {
            let mut rem = combo;
            let mut offset = 0usize;
            for (k, list) in lists.iter().enumerate() {
                let j = rem / combo_strides[k];
                rem %= combo_strides[k];
                offset += list[j] * strides[k];
            }
            dst[offset * esz..offset * esz + block]
                .copy_from_slice(&src[combo * block..(combo + 1) * block]);
        }
        Ok(())
    }

    /// Apply a sequence of index expressions successively
    ///
    /// `a.index_chain(&[e1, e2])` is equivalent to `a.get_index(e1)?.get_index(e2)`.
    pub fn index_chain(&self, exprs: &[&[Index]]) -> Result<DenseArray> {
        let mut cur = self.clone();
        for items in exprs {
            cur = cur.get_index(items)?;
        }
        Ok(cur)
    }

    /// Pointwise gather for the all-arrays form: components pair up over
    /// the consumed dimensions, trailing dimensions carry over as blocks
    fn fancy_get(&self, arrays: &[&IntArrayIndex]) -> Result<DenseArray> {
        let idx_shape = check_fancy_shapes(self.shape(), arrays)?;
        let consumed = arrays.len();
        let strides = contiguous_strides(self.shape());
        let esz = self.elem_size();
        let block = self.shape()[consumed..].iter().product::<usize>() * esz;
        let count = idx_shape.numel();

        let mut out_shape = idx_shape;
        for &d in &self.shape()[consumed..] {
            out_shape.push(d);
        }
        let mut out = Vec::with_capacity(count * block);
        let bytes = self.as_bytes();
        for p in 0..count {
            let offset = self.fancy_offset(arrays, &strides, p)?;
            out.extend_from_slice(&bytes[offset * esz..offset * esz + block]);
        }
        Ok(DenseArray::from_raw_parts(out, self.dtype(), out_shape))
    }

    /// Pointwise scatter for the all-arrays form
    fn fancy_set(&mut self, arrays: &[&IntArrayIndex], value: &DenseArray) -> Result<()> {
        let idx_shape = check_fancy_shapes(self.shape(), arrays)?;
        let consumed = arrays.len();
        let count = idx_shape.numel();
        let mut out_shape = idx_shape;
        for &d in &self.shape()[consumed..] {
            out_shape.push(d);
        }
        if value.shape() != &out_shape {
            return Err(Error::shape_mismatch(&out_shape, value.shape()));
        }
        let strides = contiguous_strides(self.shape());
        let esz = self.elem_size();
        let block = self.shape()[consumed..].iter().product::<usize>() * esz;
        let offsets: Result<Vec<usize>> = (0..count)
            .map(|p| self.fancy_offset(arrays, &strides, p))
            .collect();
        let offsets = offsets?;
        let src = value.as_bytes().to_vec();
        let dst = self.bytes_mut();
        for (p, offset) in offsets.into_iter().enumerate() {
            dst[offset * esz..offset * esz + block]
                .copy_from_slice(&src[p * block..(p + 1) * block]);
        }
        Ok(())
    }

    fn fancy_offset(
        &self,
        arrays: &[&IntArrayIndex],
        strides: &[usize],
        p: usize,
    ) -> Result<usize> {
        let mut offset = 0usize;
        for (k, a) in arrays.iter().enumerate() {
            let i = normalize_position(a.values()[p], self.shape()[k])?;
            offset += i * strides[k];
        }
        Ok(offset)
    }
}

/// Detect the all-arrays fancy form (every element an integer array, at
/// most one per dimension)
fn fancy_form<'a>(shape: &[usize], items: &'a [Index]) -> Option<Vec<&'a IntArrayIndex>> {
    if items.is_empty() || items.len() > shape.len() {
        return None;
    }
    let mut arrays = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Index::IntArray(a) => arrays.push(a),
            _ => return None,
        }
    }
    Some(arrays)
}

/// All components of a fancy index must share one shape
fn check_fancy_shapes(base: &[usize], arrays: &[&IntArrayIndex]) -> Result<Shape> {
    let shape0 = arrays[0].shape();
    for a in &arrays[1..] {
        if a.shape() != shape0 {
            return Err(Error::dimension_mismatch(
                base,
                format!(
                    "all tensor indices must have the same shape, got {:?} and {:?}",
                    a.shape(),
                    shape0
                ),
            ));
        }
    }
    Ok(shape0.clone())
}

/// Resolve expression elements to per-dimension selectors
fn build_selectors(shape: &[usize], items: &[Index]) -> Result<(Vec<Sel>, usize)> {
    let mut sels = Vec::with_capacity(items.len());
    let mut d = 0usize;
    for item in items {
        if !matches!(item, Index::NewAxis) && d >= shape.len() {
            return Err(Error::dimension_mismatch(
                shape,
                format!("the index {items:?} consumes more dimensions"),
            ));
        }
        match item {
            Index::Slice(s) => {
                sels.push(Sel::Rows(s.positions(shape[d])?));
                d += 1;
            }
            Index::Int(i) => {
                sels.push(Sel::At(normalize_position(*i, shape[d])?));
                d += 1;
            }
            Index::List(v) => {
                sels.push(Sel::Rows(normalize_all(v, shape[d])?));
                d += 1;
            }
            Index::IntArray(a) => {
                if a.ndim() > 1 {
                    return Err(Error::UnsupportedIndex { kind: item.kind() });
                }
                sels.push(Sel::Rows(normalize_all(a.values(), shape[d])?));
                d += 1;
            }
            Index::BoolMask(mask) => {
                if mask.len() != shape[d] {
                    return Err(Error::dimension_mismatch(
                        shape,
                        format!(
                            "boolean mask of length {} does not match dimension {} of size {}",
                            mask.len(),
                            d,
                            shape[d]
                        ),
                    ));
                }
                sels.push(Sel::Rows(
                    mask.iter()
                        .enumerate()
                        .filter(|(_, &b)| b)
                        .map(|(i, _)| i)
                        .collect(),
                ));
                d += 1;
            }
            Index::NewAxis => sels.push(Sel::New),
            Index::Ellipsis => return Err(Error::UnsupportedIndex { kind: item.kind() }),
        }
    }
    Ok((sels, d))
}

fn normalize_all(positions: &[i64], dim: usize) -> Result<Vec<usize>> {
    positions.iter().map(|&p| normalize_position(p, dim)).collect()
}

/// Shape of the selection: kept dimensions, new axes, then the tail
fn selection_shape(sels: &[Sel], tail: &[usize]) -> Shape {
    let mut out = Shape::with_capacity(sels.len() + tail.len());
    for sel in sels {
        match sel {
            Sel::Rows(rows) => out.push(rows.len()),
            Sel::At(_) => {}
            Sel::New => out.push(1),
        }
    }
    for &d in tail {
        out.push(d);
    }
    out
}

/// Position lists for the consumed dimensions, in order
fn selector_positions(sels: &[Sel]) -> Vec<Vec<usize>> {
    sels.iter()
        .filter_map(|sel| match sel {
            Sel::Rows(rows) => Some(rows.clone()),
            Sel::At(i) => Some(vec![*i]),
            Sel::New => None,
        })
        .collect()
}

/// Row-major strides over the combination space of the position lists
fn combo_strides(lists: &[Vec<usize>]) -> Vec<usize> {
    let mut strides = vec![1usize; lists.len()];
    for k in (0..lists.len().saturating_sub(1)).rev() {
        strides[k] = strides[k + 1] * lists[k + 1].len();
    }
    strides
}
