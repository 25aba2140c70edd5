//! Common test utilities
#![allow(dead_code)]

use batchdict::prelude::*;

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// A probe array of the given shape, filled with zeros
pub fn probe(shape: &[usize]) -> DenseArray {
    DenseArray::zeros(shape, DType::F32)
}

/// A probe array of the given shape holding `0..numel` as i64
pub fn counting_probe(shape: &[usize]) -> DenseArray {
    let numel: usize = shape.iter().product();
    let data: Vec<i64> = (0..numel as i64).collect();
    DenseArray::from_slice(&data, shape)
}
