//! Ragged batched fields: variable-length rows sharing one batch dimension
//!
//! A [`RaggedBatch`] stores, for `K` named sub-columns over a batch of `N`
//! elements, a flat `values` buffer and a flat `weights` buffer of the same
//! length, described by a flattened row-major `(K, N)` `lengths` array and
//! the derived `offsets` (cumulative sums of the lengths prefixed by 0).
//! Row `i` of key `k` occupies `values[offsets[k*N+i]..offsets[k*N+i+1]]`.

mod indexing;

pub use indexing::resolve_batch_index;

use crate::array::DenseArray;
use crate::dtype::DType;
use crate::error::{Error, Result};

/// Batched ragged array with named sub-columns
///
/// The declared batch rank is fixed at one dimension; indexing it with a
/// bare integer is rejected because the result would have no batch
/// dimension left.
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedBatch {
    keys: Vec<String>,
    values: DenseArray,
    weights: DenseArray,
    lengths: DenseArray,
    offsets: DenseArray,
}

impl RaggedBatch {
    /// Create a ragged batch from per-row lengths
    ///
    /// # Arguments
    ///
    /// * `keys` - Names of the sub-columns (must be non-empty)
    /// * `values` - Flat 1-D values buffer
    /// * `weights` - Flat 1-D weights buffer, same length and dtype as `values`
    /// * `lengths` - Row lengths, flattened row-major `(K, N)`
    ///
    /// # Errors
    ///
    /// Returns an error if `keys` is empty, `lengths` is not divisible into
    /// `K` equal columns, a length is negative, or the lengths do not sum to
    /// the buffer length.
    pub fn from_lengths(
        keys: Vec<String>,
        values: DenseArray,
        weights: DenseArray,
        lengths: &[i64],
    ) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::invalid_argument(
                "keys",
                "a ragged batch needs at least one key",
            ));
        }
        if values.ndim() != 1 || weights.ndim() != 1 {
            return Err(Error::invalid_argument(
                "values",
                format!(
                    "expected 1-D buffers, got values: {}-d, weights: {}-d",
                    values.ndim(),
                    weights.ndim()
                ),
            ));
        }
        if values.numel() != weights.numel() {
            return Err(Error::shape_mismatch(values.shape(), weights.shape()));
        }
        values.check_same_dtype(&weights)?;
        if lengths.len() % keys.len() != 0 {
            return Err(Error::invalid_argument(
                "lengths",
                format!(
                    "{} lengths cannot be split across {} keys",
                    lengths.len(),
                    keys.len()
                ),
            ));
        }
        if let Some(&bad) = lengths.iter().find(|&&l| l < 0) {
            return Err(Error::invalid_argument(
                "lengths",
                format!("negative row length {bad}"),
            ));
        }
        let total: i64 = lengths.iter().sum();
        if total as usize != values.numel() {
            return Err(Error::invalid_argument(
                "lengths",
                format!(
                    "lengths sum to {total} but the buffers hold {} elements",
                    values.numel()
                ),
            ));
        }
        let lengths = DenseArray::from_slice(lengths, &[lengths.len()]);
        let offsets = offsets_from_lengths(&lengths)?;
        Ok(Self {
            keys,
            values,
            weights,
            lengths,
            offsets,
        })
    }

    /// Create a ragged batch from offsets (length `K*N + 1`, starting at 0)
    pub fn from_offsets(
        keys: Vec<String>,
        values: DenseArray,
        weights: DenseArray,
        offsets: &[i64],
    ) -> Result<Self> {
        if offsets.is_empty() || offsets[0] != 0 {
            return Err(Error::invalid_argument(
                "offsets",
                format!("offsets must start at 0, got {offsets:?}"),
            ));
        }
        let lengths: Vec<i64> = offsets.windows(2).map(|w| w[1] - w[0]).collect();
        Self::from_lengths(keys, values, weights, &lengths)
    }

    /// Names of the sub-columns
    #[inline]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of sub-columns
    #[inline]
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    /// Shared batch size `N`
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.lengths.numel() / self.keys.len()
    }

    /// Flat values buffer
    #[inline]
    pub fn values(&self) -> &DenseArray {
        &self.values
    }

    /// Flat weights buffer
    #[inline]
    pub fn weights(&self) -> &DenseArray {
        &self.weights
    }

    /// Flattened `(K, N)` row lengths
    #[inline]
    pub fn lengths(&self) -> &DenseArray {
        &self.lengths
    }

    /// Cumulative offsets, length `K*N + 1`
    #[inline]
    pub fn offsets(&self) -> &DenseArray {
        &self.offsets
    }

    /// Element type of the values buffer
    #[inline]
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    /// Whether gradients are tracked, delegating to the values buffer
    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.values.requires_grad()
    }

    /// Set gradient tracking on the values buffer
    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.values.set_requires_grad(requires_grad);
    }

    /// The value rows of one sub-column, one array per batch element
    pub fn rows(&self, key: &str) -> Result<Vec<DenseArray>> {
        let k = self
            .keys
            .iter()
            .position(|name| name == key)
            .ok_or_else(|| Error::KeyNotFound {
                key: key.to_string(),
            })?;
        let n = self.batch_size();
        let offsets = self.offsets.to_vec::<i64>();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let start = offsets[k * n + i];
            let stop = offsets[k * n + i + 1];
            let positions: Vec<i64> = (start..stop).collect();
            out.push(self.values.index_select0(&positions)?);
        }
        Ok(out)
    }

    /// Read-index along the batch dimension
    ///
    /// See [`indexing`] for the accepted index kinds; a bare integer is
    /// rejected with [`Error::RaggedIntegerIndex`].
    pub fn get_batch(&self, index: &crate::index::Index) -> Result<RaggedBatch> {
        indexing::index_ragged(self, index)
    }

    /// Write-index along the batch dimension, in place
    ///
    /// Rebuilds every buffer first, then swaps them in so the update is
    /// observed atomically once the call returns. Existing references to
    /// this field stay valid; only the contents change.
    pub fn set_batch(
        &mut self,
        index: &crate::index::Index,
        other: &RaggedBatch,
    ) -> Result<()> {
        indexing::setitem_ragged(self, index, other)
    }

    /// Replace every buffer in one assignment, keeping flags
    pub(crate) fn swap_in(&mut self, other: RaggedBatch) {
        self.values.swap_contents(other.values);
        self.weights.swap_contents(other.weights);
        self.lengths.swap_contents(other.lengths);
        self.offsets.swap_contents(other.offsets);
    }
}

/// Offsets are the cumulative sums of the lengths, prefixed by 0
pub(crate) fn offsets_from_lengths(lengths: &DenseArray) -> Result<DenseArray> {
    let cumulative = lengths.cumsum()?;
    let mut offsets = Vec::with_capacity(lengths.numel() + 1);
    offsets.push(0i64);
    offsets.extend(cumulative.to_vec::<i64>());
    Ok(DenseArray::from_slice(&offsets, &[offsets.len()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RaggedBatch {
        // keys: a, b; batch size 3
        // a: [1 2] [] [3]        lengths 2 0 1
        // b: [4] [5 6] [7 8 9]   lengths 1 2 3
        let values = DenseArray::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], &[9]);
        let weights = DenseArray::from_slice(&[1.0f32; 9], &[9]);
        RaggedBatch::from_lengths(
            vec!["a".into(), "b".into()],
            values,
            weights,
            &[2, 0, 1, 1, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_construction() {
        let r = sample();
        assert_eq!(r.num_keys(), 2);
        assert_eq!(r.batch_size(), 3);
        assert_eq!(r.dtype(), DType::F32);
        assert_eq!(
            r.offsets().to_vec::<i64>(),
            vec![0, 2, 2, 3, 4, 6, 9]
        );
    }

    #[test]
    fn test_from_offsets() {
        let r = sample();
        let again = RaggedBatch::from_offsets(
            r.keys().to_vec(),
            r.values().clone(),
            r.weights().clone(),
            &r.offsets().to_vec::<i64>(),
        )
        .unwrap();
        assert_eq!(again.lengths().to_vec::<i64>(), vec![2, 0, 1, 1, 2, 3]);
    }

    #[test]
    fn test_rows() {
        let r = sample();
        let rows = r.rows("a").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].to_vec::<f32>(), vec![1.0, 2.0]);
        assert!(rows[1].to_vec::<f32>().is_empty());
        assert_eq!(rows[2].to_vec::<f32>(), vec![3.0]);
        let rows = r.rows("b").unwrap();
        assert_eq!(rows[2].to_vec::<f32>(), vec![7.0, 8.0, 9.0]);
        assert!(r.rows("missing").is_err());
    }

    #[test]
    fn test_invalid_construction() {
        let values = DenseArray::from_slice(&[1.0f32, 2.0], &[2]);
        let weights = DenseArray::from_slice(&[1.0f32, 1.0], &[2]);
        // lengths don't sum to the buffer length
        assert!(RaggedBatch::from_lengths(
            vec!["a".into()],
            values.clone(),
            weights.clone(),
            &[3]
        )
        .is_err());
        // no keys
        assert!(RaggedBatch::from_lengths(vec![], values.clone(), weights.clone(), &[2]).is_err());
        // negative length
        assert!(
            RaggedBatch::from_lengths(vec!["a".into()], values, weights, &[3, -1]).is_err()
        );
    }
}
