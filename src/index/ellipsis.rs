//! Ellipsis normalization: rewriting `...` into explicit full slices

use super::expr::Index;
use crate::error::{Error, Result};

/// Whether an index expression contains an ellipsis marker
pub fn has_ellipsis(items: &[Index]) -> bool {
    items.iter().any(|i| matches!(i, Index::Ellipsis))
}

/// Expand the ellipsis in an index expression into explicit full slices
///
/// The ellipsis stands for as many full slices as needed so that the
/// expression addresses every dimension of `batch`. An expression without
/// an ellipsis is treated as carrying an implicit trailing one. The output
/// always contains exactly `batch.len()` dimension-addressing elements
/// (plus any new-axis markers the input carried).
///
/// # Errors
///
/// - [`Error::MultipleEllipsis`] if more than one ellipsis is present.
/// - [`Error::DimensionMismatch`] if the expression has more explicit
///   elements than `batch` has dimensions.
pub fn expand_ellipsis(items: &[Index], batch: &[usize]) -> Result<Vec<Index>> {
    let num_dims = batch.len();
    let num_ellipsis = items
        .iter()
        .filter(|i| matches!(i, Index::Ellipsis))
        .count();
    if num_ellipsis > 1 {
        return Err(Error::MultipleEllipsis);
    }
    let explicit = items.len() - num_ellipsis;
    if num_dims < explicit {
        return Err(Error::dimension_mismatch(
            batch,
            format!("not enough dimensions for the index {items:?}"),
        ));
    }

    let pos = items.iter().position(|i| matches!(i, Index::Ellipsis));
    let (before, after) = match pos {
        Some(p) => (p, items.len() - p - 1),
        None => (items.len(), 0),
    };
    let ellipsis_len = num_dims - before - after;

    let mut out = Vec::with_capacity(num_dims);
    out.extend_from_slice(&items[..before]);
    out.extend(std::iter::repeat(Index::full_slice()).take(ellipsis_len));
    if let Some(p) = pos {
        out.extend_from_slice(&items[p + 1..]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::expr::SliceSpec;

    #[test]
    fn test_expand_middle() {
        // (..., 0) over (1, 2, 3) -> (:, :, 0)
        let items = vec![Index::Ellipsis, Index::Int(0)];
        let out = expand_ellipsis(&items, &[1, 2, 3]).unwrap();
        assert_eq!(
            out,
            vec![Index::full_slice(), Index::full_slice(), Index::Int(0)]
        );
    }

    #[test]
    fn test_expand_bare() {
        let out = expand_ellipsis(&[Index::Ellipsis], &[4, 5]).unwrap();
        assert_eq!(out, vec![Index::full_slice(), Index::full_slice()]);
    }

    #[test]
    fn test_expand_between() {
        let items = vec![
            Index::Int(1),
            Index::Ellipsis,
            Index::Slice(SliceSpec::range(0, 2)),
        ];
        let out = expand_ellipsis(&items, &[4, 5, 6, 7]).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], Index::Int(1));
        assert_eq!(out[1], Index::full_slice());
        assert_eq!(out[2], Index::full_slice());
        assert_eq!(out[3], Index::Slice(SliceSpec::range(0, 2)));
    }

    #[test]
    fn test_implicit_trailing() {
        let out = expand_ellipsis(&[Index::Int(0)], &[4, 5, 6]).unwrap();
        assert_eq!(
            out,
            vec![Index::Int(0), Index::full_slice(), Index::full_slice()]
        );
    }

    #[test]
    fn test_two_ellipses_rejected() {
        let items = vec![Index::Ellipsis, Index::Int(0), Index::Ellipsis];
        assert!(matches!(
            expand_ellipsis(&items, &[1, 2, 3]),
            Err(Error::MultipleEllipsis)
        ));
    }

    #[test]
    fn test_too_many_elements() {
        let items = vec![Index::Int(0), Index::Int(1), Index::Ellipsis];
        assert!(expand_ellipsis(&items, &[4]).is_err());
    }

    #[test]
    fn test_has_ellipsis() {
        assert!(has_ellipsis(&[Index::Ellipsis]));
        assert!(!has_ellipsis(&[Index::Int(0), Index::full_slice()]));
    }
}
