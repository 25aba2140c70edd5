//! Shape inference: the batch shape resulting from an index, without data
//!
//! `infer_shape` is the metadata twin of actually indexing an array: given a
//! base shape and a normalized index expression, it computes the shape the
//! selection would have. It is what lets the batch dictionary answer "what
//! is my batch size after `td[idx]`" before touching any field.

use super::expr::Index;
use crate::array::Shape;
use crate::error::{Error, Result};

/// Compute the shape resulting from indexing `base` with `items`
///
/// Pure: no data is touched. Ellipses must have been expanded beforehand
/// (see [`expand_ellipsis`](super::ellipsis::expand_ellipsis)); an ellipsis
/// reaching this function is an [`Error::UnsupportedIndex`].
pub fn infer_shape(base: &[usize], items: &[Index]) -> Result<Shape> {
    // single-element fast paths
    if items.len() == 1 {
        match &items[0] {
            Index::Int(_) => {
                if base.is_empty() {
                    return Err(incompatible(base, items));
                }
                return Ok(base[1..].into());
            }
            Index::BoolMask(mask) => {
                let pop = mask.iter().filter(|&&b| b).count();
                let rest = base.get(1..).unwrap_or(&[]);
                return Ok(std::iter::once(pop).chain(rest.iter().copied()).collect());
            }
            Index::List(v) => return Ok(leading_or_dropped(base, v.len(), items)?),
            Index::IntArray(a) if a.ndim() <= 1 => {
                return Ok(leading_or_dropped(base, a.values().len(), items)?)
            }
            _ => {}
        }
    }

    // fancy form: an all-arrays tuple pairs its components pointwise, so
    // the consumed dimensions collapse to the shared index shape; at full
    // rank the result is that shape alone
    if !items.is_empty()
        && items.len() <= base.len()
        && items.iter().all(|i| matches!(i, Index::IntArray(_)))
    {
        let mut shape0: Option<&Shape> = None;
        for item in items {
            if let Index::IntArray(a) = item {
                match shape0 {
                    None => shape0 = Some(a.shape()),
                    Some(s0) if s0 != a.shape() => {
                        return Err(Error::dimension_mismatch(
                            base,
                            format!(
                                "all tensor indices must have the same shape, got {:?} and {:?}",
                                a.shape(),
                                s0
                            ),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        let shared = shape0.expect("non-empty fancy index");
        return Ok(shared
            .iter()
            .chain(base[items.len()..].iter())
            .copied()
            .collect());
    }

    // general walk over base dimensions, left to right
    let mut bs = Shape::with_capacity(base.len());
    let mut dims = base.iter();
    for item in items {
        match item {
            Index::Slice(s) => {
                let &dim = dims.next().ok_or_else(|| incompatible(base, items))?;
                bs.push(s.len(dim)?);
            }
            Index::List(v) => {
                dims.next().ok_or_else(|| incompatible(base, items))?;
                bs.push(v.len());
            }
            Index::IntArray(a) => {
                dims.next().ok_or_else(|| incompatible(base, items))?;
                bs.push(a.len());
            }
            Index::BoolMask(mask) => {
                dims.next().ok_or_else(|| incompatible(base, items))?;
                bs.push(mask.iter().filter(|&&b| b).count());
            }
            Index::NewAxis => bs.push(1),
            Index::Int(_) => {
                dims.next().ok_or_else(|| incompatible(base, items))?;
            }
            Index::Ellipsis => return Err(Error::UnsupportedIndex { kind: item.kind() }),
        }
    }
    for &dim in dims {
        bs.push(dim);
    }
    Ok(bs)
}

/// Single list/array fast path: leading dimension becomes the index length,
/// or is dropped entirely when the index is empty
fn leading_or_dropped(base: &[usize], len: usize, items: &[Index]) -> Result<Shape> {
    if base.is_empty() {
        return Err(incompatible(base, items));
    }
    if len > 0 {
        Ok(std::iter::once(len)
            .chain(base[1..].iter().copied())
            .collect())
    } else {
        Ok(base[1..].into())
    }
}

fn incompatible(base: &[usize], items: &[Index]) -> Error {
    Error::dimension_mismatch(base, format!("the index {items:?} consumes more dimensions"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::expr::{IntArrayIndex, SliceSpec};

    fn infer(base: &[usize], items: &[Index]) -> Vec<usize> {
        infer_shape(base, items).unwrap().to_vec()
    }

    #[test]
    fn test_single_int() {
        assert_eq!(infer(&[4, 5, 6], &[Index::Int(0)]), vec![5, 6]);
        assert!(infer_shape(&[], &[Index::Int(0)]).is_err());
    }

    #[test]
    fn test_single_list() {
        assert_eq!(infer(&[4, 5, 6], &[Index::List(vec![0, 2])]), vec![2, 5, 6]);
        // an empty list drops the leading dimension
        assert_eq!(infer(&[4, 5, 6], &[Index::List(vec![])]), vec![5, 6]);
        assert_eq!(infer(&[4, 5, 6], &[Index::array(vec![3])]), vec![1, 5, 6]);
    }

    #[test]
    fn test_single_mask() {
        let mask = Index::BoolMask(vec![true, false, true, true]);
        assert_eq!(infer(&[4, 5, 6], &[mask]), vec![3, 5, 6]);
    }

    #[test]
    fn test_slice_and_newaxis() {
        assert_eq!(
            infer(
                &[4, 5, 6],
                &[Index::Slice(SliceSpec::range(1, 3)), Index::NewAxis]
            ),
            vec![2, 1, 6]
        );
    }

    #[test]
    fn test_walk_mixed() {
        assert_eq!(
            infer(
                &[4, 5, 6],
                &[
                    Index::Int(0),
                    Index::List(vec![1, 2, 3]),
                    Index::Slice(SliceSpec::new(None, None, Some(2))),
                ]
            ),
            vec![3, 3]
        );
    }

    #[test]
    fn test_fancy_same_shape() {
        let items = vec![
            Index::array(vec![0, 1]),
            Index::array(vec![2, 3]),
            Index::array(vec![1, 1]),
        ];
        assert_eq!(infer(&[4, 5, 6], &items), vec![2]);
    }

    #[test]
    fn test_fancy_shape_mismatch() {
        let items = vec![
            Index::array(vec![0, 1]),
            Index::array(vec![2, 3, 4]),
            Index::array(vec![1, 1]),
        ];
        let err = infer_shape(&[4, 5, 6], &items).unwrap_err();
        assert!(err.to_string().contains("same shape"));
    }

    #[test]
    fn test_fancy_partial_rank_appends_remaining() {
        let items = vec![Index::array(vec![0, 1]), Index::array(vec![2, 3])];
        assert_eq!(infer(&[4, 5, 6], &items), vec![2, 6]);
        let items = vec![Index::IntArray(
            IntArrayIndex::new(vec![0, 1, 2, 3], &[2, 2]).unwrap(),
        )];
        assert_eq!(infer(&[4, 5, 6], &items), vec![2, 2, 5, 6]);
    }

    #[test]
    fn test_lists_do_not_collapse() {
        // plain sequences take the general walk, one dimension each
        let items = vec![Index::List(vec![0, 1]), Index::List(vec![2, 3])];
        assert_eq!(infer(&[4, 5], &items), vec![2, 2]);
    }

    #[test]
    fn test_exhausted_dimensions() {
        let items = vec![Index::Int(0), Index::Int(0), Index::Int(0), Index::Int(0)];
        assert!(infer_shape(&[4, 5, 6], &items).is_err());
    }
}
