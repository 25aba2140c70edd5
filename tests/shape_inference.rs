//! Integration tests for shape inference and ellipsis normalization
//!
//! The central property: `infer_shape(S, idx)` must equal the shape of
//! actually indexing a probe array of shape `S` with `idx`, for every
//! index expression both sides accept.

mod common;

use batchdict::error::Error;
use batchdict::index::{expand_ellipsis, infer_shape, Index, SliceSpec};
use common::probe;

const BASE: [usize; 3] = [4, 5, 6];

// ============================================================================
// Literal examples
// ============================================================================

#[test]
fn test_single_int_drops_leading_dim() {
    let s = infer_shape(&BASE, &[Index::Int(0)]).unwrap();
    assert_eq!(s.as_slice(), &[5, 6]);
}

#[test]
fn test_single_list_leading_dim_is_length() {
    let s = infer_shape(&BASE, &[Index::List(vec![0, 2])]).unwrap();
    assert_eq!(s.as_slice(), &[2, 5, 6]);
}

#[test]
fn test_slice_and_newaxis() {
    let s = infer_shape(
        &BASE,
        &[Index::Slice(SliceSpec::range(1, 3)), Index::NewAxis],
    )
    .unwrap();
    assert_eq!(s.as_slice(), &[2, 1, 6]);
}

#[test]
fn test_empty_list_falls_back_to_dropped_dim() {
    // the documented single-empty-sequence rule: behaves like an integer
    let s = infer_shape(&BASE, &[Index::List(vec![])]).unwrap();
    assert_eq!(s.as_slice(), &[5, 6]);
}

#[test]
fn test_bool_mask_counts_population() {
    let s = infer_shape(&BASE, &[Index::BoolMask(vec![true, false, true, true])]).unwrap();
    assert_eq!(s.as_slice(), &[3, 5, 6]);
}

#[test]
fn test_fancy_full_rank_collapses_to_index_shape() {
    let items = vec![
        Index::array(vec![0, 1, 2]),
        Index::array(vec![0, 0, 1]),
        Index::array(vec![5, 4, 3]),
    ];
    let s = infer_shape(&BASE, &items).unwrap();
    assert_eq!(s.as_slice(), &[3]);
}

#[test]
fn test_fancy_mismatched_shapes_error() {
    let items = vec![
        Index::array(vec![0, 1]),
        Index::array(vec![0]),
        Index::array(vec![5, 4]),
    ];
    let err = infer_shape(&BASE, &items).unwrap_err();
    assert!(err.to_string().contains("same shape"), "{err}");
}

#[test]
fn test_too_many_integers_error() {
    let items = vec![
        Index::Int(0),
        Index::Int(0),
        Index::Int(0),
        Index::Int(0),
    ];
    assert!(matches!(
        infer_shape(&BASE, &items),
        Err(Error::DimensionMismatch { .. })
    ));
}

// ============================================================================
// Ellipsis normalization
// ============================================================================

#[test]
fn test_two_ellipses_rejected() {
    let items = vec![Index::Ellipsis, Index::Int(0), Index::Ellipsis];
    assert!(matches!(
        expand_ellipsis(&items, &BASE),
        Err(Error::MultipleEllipsis)
    ));
}

#[test]
fn test_expansion_length_equals_rank() {
    let menu: Vec<Vec<Index>> = vec![
        vec![Index::Ellipsis],
        vec![Index::Int(0), Index::Ellipsis],
        vec![Index::Ellipsis, Index::Int(0)],
        vec![Index::Int(1), Index::Ellipsis, Index::Int(2)],
        vec![
            Index::Slice(SliceSpec::range(0, 2)),
            Index::Ellipsis,
            Index::List(vec![1, 4]),
        ],
    ];
    for items in menu {
        let out = expand_ellipsis(&items, &BASE).unwrap();
        assert_eq!(out.len(), BASE.len(), "expanding {items:?}");
        assert!(!out.iter().any(|i| matches!(i, Index::Ellipsis)));
    }
}

#[test]
fn test_expansion_equivalent_to_direct_indexing() {
    let a = common::counting_probe(&BASE);
    let menu: Vec<Vec<Index>> = vec![
        vec![Index::Ellipsis, Index::Int(3)],
        vec![Index::Int(2), Index::Ellipsis],
        vec![Index::Int(0), Index::Ellipsis, Index::Slice(SliceSpec::range(1, 4))],
        vec![Index::Ellipsis],
    ];
    for items in menu {
        let expanded = expand_ellipsis(&items, &BASE).unwrap();
        let direct = a.get_index(&items).unwrap();
        let explicit = a.get_index(&expanded).unwrap();
        assert_eq!(direct, explicit, "expanding {items:?}");
    }
}

// ============================================================================
// Exhaustive small-shape fuzz: inference vs a real probe array
// ============================================================================

/// Index elements valid for consuming a dimension of size `dim`
fn menu(dim: usize) -> Vec<Index> {
    let mut mask = vec![false; dim];
    for (i, slot) in mask.iter_mut().enumerate() {
        *slot = i % 2 == 0;
    }
    vec![
        Index::Int(0),
        Index::Int(-1),
        Index::full_slice(),
        Index::Slice(SliceSpec::range(1, 3)),
        Index::Slice(SliceSpec::new(None, None, Some(2))),
        Index::Slice(SliceSpec::new(None, None, Some(-1))),
        Index::List(vec![0, 2]),
        Index::List(vec![-1]),
        Index::array(vec![1, 3]),
        Index::BoolMask(mask),
    ]
}

fn check_against_probe(items: &[Index]) {
    let a = probe(&BASE);
    match (infer_shape(&BASE, items), a.get_index(items)) {
        (Ok(expected), Ok(got)) => {
            assert_eq!(
                got.shape(),
                &expected,
                "shape inference disagrees with indexing for {items:?}"
            );
        }
        (Err(_), Err(_)) => {}
        (infer, apply) => panic!(
            "inference and indexing disagree on acceptance for {items:?}: \
             infer={infer:?}, apply ok={}",
            apply.is_ok()
        ),
    }
}

#[test]
fn test_fuzz_one_element() {
    for item in menu(BASE[0]) {
        check_against_probe(&[item.clone()]);
        check_against_probe(&[Index::NewAxis, item]);
    }
}

#[test]
fn test_fuzz_two_elements() {
    for first in menu(BASE[0]) {
        for second in menu(BASE[1]) {
            check_against_probe(&[first.clone(), second.clone()]);
        }
    }
}

#[test]
fn test_fuzz_three_elements() {
    for first in menu(BASE[0]) {
        for second in menu(BASE[1]) {
            for third in menu(BASE[2]) {
                check_against_probe(&[first.clone(), second.clone(), third.clone()]);
            }
        }
    }
}

#[test]
fn test_fuzz_with_newaxis_interleaved() {
    for first in menu(BASE[0]) {
        for second in menu(BASE[1]) {
            check_against_probe(&[first.clone(), Index::NewAxis, second.clone()]);
            check_against_probe(&[Index::NewAxis, first.clone(), second.clone()]);
            check_against_probe(&[first.clone(), second.clone(), Index::NewAxis]);
        }
    }
}
