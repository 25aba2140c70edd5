//! Delta distribution: all probability mass on one parameter value

use crate::array::{DenseArray, Shape};
use crate::error::{Error, Result};

/// Degenerate distribution concentrated on `param`
///
/// A value matches the distribution when it is elementwise within
/// `atol + rtol * |param|` of the parameter over every event dimension.
/// `log_prob` is `+inf` on matching values and `-inf` elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    param: DenseArray,
    atol: f64,
    rtol: f64,
    batch_shape: Shape,
    event_shape: Shape,
}

impl Delta {
    /// Default absolute tolerance
    pub const DEFAULT_ATOL: f64 = 1e-6;
    /// Default relative tolerance
    pub const DEFAULT_RTOL: f64 = 1e-6;

    /// Create a delta distribution over the trailing dimension of `param`
    ///
    /// The batch shape is everything but the last dimension, the event
    /// shape the last dimension alone.
    pub fn new(param: DenseArray) -> Self {
        Self::with_tolerances(param, Self::DEFAULT_ATOL, Self::DEFAULT_RTOL)
    }

    /// Create a delta distribution with explicit tolerances
    pub fn with_tolerances(param: DenseArray, atol: f64, rtol: f64) -> Self {
        let ndim = param.ndim();
        let split = ndim.saturating_sub(1);
        let batch_shape: Shape = param.shape()[..split].into();
        let event_shape: Shape = param.shape()[split..].into();
        Self {
            param,
            atol,
            rtol,
            batch_shape,
            event_shape,
        }
    }

    /// Create a delta distribution with explicit batch and event shapes
    ///
    /// Their concatenation must equal the parameter's shape.
    pub fn with_shapes(
        param: DenseArray,
        batch_shape: impl Into<Shape>,
        event_shape: impl Into<Shape>,
    ) -> Result<Self> {
        let batch_shape = batch_shape.into();
        let event_shape = event_shape.into();
        let combined: Shape = batch_shape
            .iter()
            .chain(event_shape.iter())
            .copied()
            .collect();
        if &combined != param.shape() {
            return Err(Error::shape_mismatch(&combined, param.shape()));
        }
        Ok(Self {
            param,
            atol: Self::DEFAULT_ATOL,
            rtol: Self::DEFAULT_RTOL,
            batch_shape,
            event_shape,
        })
    }

    /// Batch dimensions of the distribution
    #[inline]
    pub fn batch_shape(&self) -> &Shape {
        &self.batch_shape
    }

    /// Event dimensions of the distribution
    #[inline]
    pub fn event_shape(&self) -> &Shape {
        &self.event_shape
    }

    /// Replace the parameter, keeping shapes and tolerances
    pub fn update(&mut self, param: DenseArray) -> Result<()> {
        if param.shape() != self.param.shape() {
            return Err(Error::shape_mismatch(self.param.shape(), param.shape()));
        }
        self.param = param;
        Ok(())
    }

    /// Whether `value` matches the parameter over every event dimension
    ///
    /// `value` may carry extra leading sample dimensions; the parameter is
    /// expanded to match. Returns a boolean array of the batch (plus
    /// sample) shape.
    pub fn is_equal(&self, value: &DenseArray) -> Result<DenseArray> {
        let param = self.param.expand_left(value.shape())?;
        let close = value.is_close(&param, self.atol, self.rtol)?;
        close.all_over_trailing(self.event_shape.ndim())
    }

    /// Log-probability: `+inf` where `value` matches the parameter, `-inf`
    /// elsewhere
    pub fn log_prob(&self, value: &DenseArray) -> Result<DenseArray> {
        let is_equal = self.is_equal(value)?;
        let mut out = DenseArray::zeros(is_equal.shape(), value.dtype());
        out.masked_fill(&is_equal, f64::INFINITY)?;
        out.masked_fill(&is_equal.logical_not()?, f64::NEG_INFINITY)?;
        Ok(out)
    }

    /// Draw a sample: the parameter expanded to the requested sample shape
    pub fn sample(&self, sample_shape: &[usize]) -> Result<DenseArray> {
        let mut target = sample_shape.to_vec();
        target.extend_from_slice(self.param.shape());
        self.param.expand_left(&target)
    }

    /// The most likely value
    #[inline]
    pub fn mode(&self) -> &DenseArray {
        &self.param
    }

    /// The mean value
    #[inline]
    pub fn mean(&self) -> &DenseArray {
        &self.param
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let param = DenseArray::zeros(&[3, 4], crate::dtype::DType::F64);
        let d = Delta::new(param);
        assert_eq!(d.batch_shape().as_slice(), &[3]);
        assert_eq!(d.event_shape().as_slice(), &[4]);
    }

    #[test]
    fn test_log_prob_on_and_off_param() {
        let param = DenseArray::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
        let d = Delta::new(param.clone());

        let lp = d.log_prob(&param).unwrap();
        assert_eq!(lp.shape().as_slice(), &[2]);
        assert_eq!(lp.to_vec::<f64>(), vec![f64::INFINITY, f64::INFINITY]);

        let off = DenseArray::from_slice(&[1.0f64, 2.0, 3.0, 5.0], &[2, 2]);
        let lp = d.log_prob(&off).unwrap();
        assert_eq!(lp.to_vec::<f64>(), vec![f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_log_prob_with_sample_dim() {
        let param = DenseArray::from_slice(&[1.0f64, 2.0], &[2]);
        let d = Delta::new(param.clone());
        let stacked = DenseArray::from_slice(&[1.0f64, 2.0, 0.0, 2.0], &[2, 2]);
        let lp = d.log_prob(&stacked).unwrap();
        assert_eq!(lp.to_vec::<f64>(), vec![f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_sample_expands() {
        let param = DenseArray::from_slice(&[1.0f64, 2.0], &[2]);
        let d = Delta::new(param);
        let s = d.sample(&[3]).unwrap();
        assert_eq!(s.shape().as_slice(), &[3, 2]);
        assert_eq!(s.to_vec::<f64>(), vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert_eq!(d.sample(&[]).unwrap().shape().as_slice(), &[2]);
    }

    #[test]
    fn test_with_shapes_validates() {
        let param = DenseArray::zeros(&[2, 3], crate::dtype::DType::F32);
        assert!(Delta::with_shapes(param.clone(), [2], [3]).is_ok());
        assert!(Delta::with_shapes(param, [3], [3]).is_err());
    }

    #[test]
    fn test_update() {
        let param = DenseArray::from_slice(&[1.0f64, 2.0], &[2]);
        let mut d = Delta::new(param);
        assert!(d
            .update(DenseArray::from_slice(&[3.0f64, 4.0], &[2]))
            .is_ok());
        assert_eq!(d.mode().to_vec::<f64>(), vec![3.0, 4.0]);
        assert!(d.update(DenseArray::zeros(&[3], crate::dtype::DType::F64)).is_err());
    }
}
