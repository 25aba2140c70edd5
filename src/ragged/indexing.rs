//! Read and write indexing of ragged batches along the batch dimension

use super::{offsets_from_lengths, RaggedBatch};
use crate::array::{normalize_position, DenseArray};
use crate::error::{Error, Result};
use crate::index::Index;
use std::collections::HashMap;

/// Resolve a batch index to explicit row positions in `[0, n)`
///
/// Accepted kinds: slice, plain list, 1-D integer array, boolean mask of
/// length `n`. A bare integer is rejected with
/// [`Error::RaggedIntegerIndex`] because the result would have no batch
/// dimension; wrap it in a length-1 array instead.
pub fn resolve_batch_index(index: &Index, n: usize) -> Result<Vec<i64>> {
    match index {
        Index::Int(i) => Err(Error::RaggedIntegerIndex { index: *i }),
        Index::Slice(s) => Ok(s.positions(n)?.into_iter().map(|p| p as i64).collect()),
        Index::List(v) => normalize_rows(v, n),
        Index::IntArray(a) if a.ndim() <= 1 => normalize_rows(a.values(), n),
        Index::BoolMask(mask) => {
            if mask.len() != n {
                return Err(Error::dimension_mismatch(
                    &[n],
                    format!("boolean mask of length {} over a batch of {n}", mask.len()),
                ));
            }
            Ok(mask
                .iter()
                .enumerate()
                .filter(|(_, &b)| b)
                .map(|(i, _)| i as i64)
                .collect())
        }
        other => Err(Error::UnsupportedIndex { kind: other.kind() }),
    }
}

fn normalize_rows(positions: &[i64], n: usize) -> Result<Vec<i64>> {
    positions
        .iter()
        .map(|&p| normalize_position(p, n).map(|i| i as i64))
        .collect()
}

/// Select batch rows of a ragged batch, producing a new one
///
/// Values and weights are gathered key-major in selection order, so the
/// assembled buffers agree with the selected lengths for any row order,
/// including unsorted and repeated selections.
pub(super) fn index_ragged(batch: &RaggedBatch, index: &Index) -> Result<RaggedBatch> {
    let k = batch.num_keys();
    let n = batch.batch_size();
    let rows = resolve_batch_index(index, n)?;

    let lengths = batch.lengths().to_vec::<i64>();
    let offsets = batch.offsets().to_vec::<i64>();

    let mut new_lengths = Vec::with_capacity(k * rows.len());
    let mut positions = Vec::new();
    for key in 0..k {
        for &row in &rows {
            let flat = key * n + row as usize;
            new_lengths.push(lengths[flat]);
            positions.extend(offsets[flat]..offsets[flat + 1]);
        }
    }

    let values = batch.values().index_select0(&positions)?;
    let weights = batch.weights().index_select0(&positions)?;
    RaggedBatch::from_lengths(batch.keys().to_vec(), values, weights, &new_lengths)
}

/// Overwrite batch rows of a ragged batch with a replacement, in place
///
/// The replacement must carry the same key sequence and exactly as many
/// batch rows as the index selects. All four buffers are rebuilt and then
/// swapped in together.
pub(super) fn setitem_ragged(
    batch: &mut RaggedBatch,
    index: &Index,
    other: &RaggedBatch,
) -> Result<()> {
    if batch.keys() != other.keys() {
        return Err(Error::KeySetMismatch {
            expected: batch.keys().to_vec(),
            got: other.keys().to_vec(),
        });
    }
    batch.values().check_same_dtype(other.values())?;

    let k = batch.num_keys();
    let n = batch.batch_size();
    let rows = resolve_batch_index(index, n)?;
    let m = other.batch_size();
    if m != rows.len() {
        return Err(Error::shape_mismatch(&[rows.len()], &[m]));
    }

    // column each written row takes its data from; later writes win
    let mut source_col: HashMap<i64, usize> = HashMap::with_capacity(rows.len());
    for (col, &row) in rows.iter().enumerate() {
        source_col.insert(row, col);
    }

    let old_lengths = batch.lengths().to_vec::<i64>();
    let old_offsets = batch.offsets().to_vec::<i64>();
    let other_lengths = other.lengths().to_vec::<i64>();
    let other_offsets = other.offsets().to_vec::<i64>();

    let mut new_lengths = old_lengths;
    for key in 0..k {
        for (&row, &col) in source_col.iter() {
            new_lengths[key * n + row as usize] = other_lengths[key * m + col];
        }
    }

    // gather source positions for every flat slot, kept rows from the
    // original buffers and written rows from the replacement's
    let esz = batch.values().elem_size();
    let total: i64 = new_lengths.iter().sum();
    let mut values = Vec::with_capacity(total as usize * esz);
    let mut weights = Vec::with_capacity(total as usize * esz);
    let old_values = batch.values().as_bytes();
    let old_weights = batch.weights().as_bytes();
    let new_values_src = other.values().as_bytes();
    let new_weights_src = other.weights().as_bytes();
    for key in 0..k {
        for row in 0..n {
            match source_col.get(&(row as i64)) {
                Some(&col) => {
                    let flat = key * m + col;
                    let span =
                        other_offsets[flat] as usize * esz..other_offsets[flat + 1] as usize * esz;
                    values.extend_from_slice(&new_values_src[span.clone()]);
                    weights.extend_from_slice(&new_weights_src[span]);
                }
                None => {
                    let flat = key * n + row;
                    let span =
                        old_offsets[flat] as usize * esz..old_offsets[flat + 1] as usize * esz;
                    values.extend_from_slice(&old_values[span.clone()]);
                    weights.extend_from_slice(&old_weights[span]);
                }
            }
        }
    }

    let dtype = batch.dtype();
    let wdtype = batch.weights().dtype();
    let value_count = values.len() / esz;
    let rebuilt = RaggedBatch::from_lengths(
        batch.keys().to_vec(),
        DenseArray::from_raw_parts(values, dtype, [value_count].into()),
        DenseArray::from_raw_parts(weights, wdtype, [value_count].into()),
        &new_lengths,
    )?;
    batch.swap_in(rebuilt);
    Ok(())
}
