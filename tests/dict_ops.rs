//! Integration tests for the batch dictionary container

mod common;

use batchdict::error::Error;
use batchdict::field::FieldOps;
use batchdict::prelude::*;

fn sample() -> BatchDict {
    let mut td = BatchDict::new([4, 3]);
    let obs: Vec<f32> = (0..24).map(|i| i as f32).collect();
    td.set("obs", DenseArray::from_slice(&obs, &[4, 3, 2]))
        .unwrap();
    td.set("reward", DenseArray::zeros(&[4, 3], DType::F64))
        .unwrap();
    td
}

#[test]
fn test_batch_prefix_enforced() {
    let mut td = BatchDict::new([4, 3]);
    assert!(td.set("ok", DenseArray::zeros(&[4, 3], DType::F32)).is_ok());
    assert!(td
        .set("deeper", DenseArray::zeros(&[4, 3, 7, 7], DType::F32))
        .is_ok());
    assert!(matches!(
        td.set("bad", DenseArray::zeros(&[4, 2], DType::F32)),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_get_item_applies_to_every_field() {
    let td = sample();
    let sub = td.get_item(&[Index::Int(1), Index::List(vec![0, 2])]).unwrap();
    assert_eq!(sub.batch_shape().as_slice(), &[2]);

    let obs = sub.get("obs").unwrap().as_dense().unwrap();
    assert_eq!(obs.shape().as_slice(), &[2, 2]);
    assert_eq!(obs.to_vec::<f32>(), vec![6.0, 7.0, 10.0, 11.0]);

    let reward = sub.get("reward").unwrap().as_dense().unwrap();
    assert_eq!(reward.shape().as_slice(), &[2]);
}

#[test]
fn test_get_item_with_ellipsis() {
    let td = sample();
    let sub = td.get_item(&[Index::Ellipsis, Index::Int(0)]).unwrap();
    assert_eq!(sub.batch_shape().as_slice(), &[4]);
    let obs = sub.get("obs").unwrap().as_dense().unwrap();
    assert_eq!(obs.shape().as_slice(), &[4, 2]);
    assert_eq!(
        obs.to_vec::<f32>(),
        vec![0.0, 1.0, 6.0, 7.0, 12.0, 13.0, 18.0, 19.0]
    );
}

#[test]
fn test_get_item_two_ellipses_rejected() {
    let td = sample();
    assert!(matches!(
        td.get_item(&[Index::Ellipsis, Index::Ellipsis]),
        Err(Error::MultipleEllipsis)
    ));
}

#[test]
fn test_inferred_shape_never_touches_fields() {
    // an empty dictionary still infers shapes for any expression
    let td = BatchDict::new([4, 5, 6]);
    let s = td
        .inferred_batch_shape(&[Index::Ellipsis, Index::Int(0)])
        .unwrap();
    assert_eq!(s.as_slice(), &[4, 5]);
    let s = td
        .inferred_batch_shape(&[Index::List(vec![0, 2])])
        .unwrap();
    assert_eq!(s.as_slice(), &[2, 5, 6]);
}

#[test]
fn test_set_item_overwrites_selection() {
    let mut td = sample();
    let items = vec![Index::Slice(SliceSpec::range(0, 2))];

    let mut patch = BatchDict::new([2, 3]);
    let obs: Vec<f32> = (0..12).map(|_| -1.0).collect();
    patch
        .set("obs", DenseArray::from_slice(&obs, &[2, 3, 2]))
        .unwrap();
    td.set_item(&items, &patch).unwrap();

    let obs = td.get("obs").unwrap().as_dense().unwrap();
    let read = obs.to_vec::<f32>();
    assert!(read[..12].iter().all(|&v| v == -1.0));
    assert!(read[12..].iter().zip(12..).all(|(&v, i)| v == i as f32));
    // untouched field stays intact
    let reward = td.get("reward").unwrap().as_dense().unwrap();
    assert!(reward.to_vec::<f64>().iter().all(|&v| v == 0.0));
}

#[test]
fn test_set_item_shape_mismatch_rejected() {
    let mut td = sample();
    let patch = BatchDict::new([3, 3]);
    assert!(matches!(
        td.set_item(&[Index::Slice(SliceSpec::range(0, 2))], &patch),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_field_capabilities_are_uniform() {
    let td = sample();
    for (_, field) in td.iter() {
        assert!(FieldOps::shape(field).starts_with(td.batch_shape()));
        assert!(!field.is_shared());
        assert!(!field.is_meta());
        assert!(!field.requires_grad());
    }
}

#[test]
fn test_fancy_index_collapses_batch() {
    let td = sample();
    let items = vec![
        Index::IntArray(IntArrayIndex::from_vec(vec![0, 3])),
        Index::IntArray(IntArrayIndex::from_vec(vec![2, 1])),
    ];
    let sub = td.get_item(&items).unwrap();
    assert_eq!(sub.batch_shape().as_slice(), &[2]);
    let obs = sub.get("obs").unwrap().as_dense().unwrap();
    assert_eq!(obs.shape().as_slice(), &[2, 2]);
    assert_eq!(obs.to_vec::<f32>(), vec![4.0, 5.0, 20.0, 21.0]);
}
