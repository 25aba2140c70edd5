//! Positive scale mappings and the location/scale parameter splitter

use crate::array::DenseArray;
use crate::error::{Error, Result};
use std::str::FromStr;

/// Stable softplus: `ln(1 + e^x)`
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// Inverse of softplus, defined for positive arguments
fn softplus_inv(y: f64) -> f64 {
    y.exp_m1().ln()
}

/// A positive mapping applied to the scale half of a parameter split
///
/// Registered by name: `"softplus"`, `"exp"`, `"relu"`,
/// `"biased_softplus"` (bias 1.0) or `"biased_softplus_<bias>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMapping {
    /// `softplus(x)`
    Softplus,
    /// `e^x`
    Exp,
    /// `max(x, 0)`
    Relu,
    /// `softplus(x + shift)` with the shift chosen so the map sends 0 to
    /// the bias
    BiasedSoftplus(f64),
}

impl ScaleMapping {
    /// Apply the mapping elementwise to a float array
    pub fn apply(&self, array: &DenseArray) -> Result<DenseArray> {
        match *self {
            ScaleMapping::Softplus => array.map_float(softplus, "softplus"),
            ScaleMapping::Exp => array.map_float(f64::exp, "exp"),
            ScaleMapping::Relu => array.map_float(|x| x.max(0.0), "relu"),
            ScaleMapping::BiasedSoftplus(bias) => {
                let shift = softplus_inv(bias);
                array.map_float(move |x| softplus(x + shift), "biased_softplus")
            }
        }
    }
}

impl FromStr for ScaleMapping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "softplus" => Ok(ScaleMapping::Softplus),
            "exp" => Ok(ScaleMapping::Exp),
            "relu" => Ok(ScaleMapping::Relu),
            "biased_softplus" => Ok(ScaleMapping::BiasedSoftplus(1.0)),
            other => {
                if let Some(suffix) = other.strip_prefix("biased_softplus_") {
                    let bias: f64 = suffix.parse().map_err(|_| {
                        Error::invalid_argument(
                            "mapping",
                            format!("cannot parse bias from \"{other}\""),
                        )
                    })?;
                    if bias <= 0.0 {
                        return Err(Error::invalid_argument(
                            "mapping",
                            format!("biased_softplus bias must be positive, got {bias}"),
                        ));
                    }
                    Ok(ScaleMapping::BiasedSoftplus(bias))
                } else {
                    Err(Error::invalid_argument(
                        "mapping",
                        format!("unknown scale mapping \"{other}\""),
                    ))
                }
            }
        }
    }
}

/// Splits a trailing output dimension into location and scale parameters
///
/// The trailing dimension must have even size `2d`; the first half becomes
/// the location, the second half goes through the scale mapping and is
/// clamped to `scale_lb` from below.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalParamSplit {
    /// Positive mapping applied to the scale half
    pub mapping: ScaleMapping,
    /// Lower bound the mapped scale is clamped to
    pub scale_lb: f64,
}

impl Default for NormalParamSplit {
    fn default() -> Self {
        Self {
            mapping: ScaleMapping::BiasedSoftplus(1.0),
            scale_lb: 1e-4,
        }
    }
}

impl NormalParamSplit {
    /// Create a splitter with an explicit mapping and lower bound
    pub fn new(mapping: ScaleMapping, scale_lb: f64) -> Self {
        Self { mapping, scale_lb }
    }

    /// Split `output` into `(location, scale)`
    pub fn split(&self, output: &DenseArray) -> Result<(DenseArray, DenseArray)> {
        let (loc, raw_scale) = output.chunk2_last()?;
        let scale = self.mapping.apply(&raw_scale)?.clamp_min(self.scale_lb)?;
        Ok((loc, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_from_str() {
        assert_eq!(
            "softplus".parse::<ScaleMapping>().unwrap(),
            ScaleMapping::Softplus
        );
        assert_eq!("exp".parse::<ScaleMapping>().unwrap(), ScaleMapping::Exp);
        assert_eq!("relu".parse::<ScaleMapping>().unwrap(), ScaleMapping::Relu);
        assert_eq!(
            "biased_softplus".parse::<ScaleMapping>().unwrap(),
            ScaleMapping::BiasedSoftplus(1.0)
        );
        assert_eq!(
            "biased_softplus_2.5".parse::<ScaleMapping>().unwrap(),
            ScaleMapping::BiasedSoftplus(2.5)
        );
        assert!("biased_softplus_x".parse::<ScaleMapping>().is_err());
        assert!("biased_softplus_-1".parse::<ScaleMapping>().is_err());
        assert!("sigmoid".parse::<ScaleMapping>().is_err());
    }

    #[test]
    fn test_biased_softplus_sends_zero_to_bias() {
        for bias in [0.5, 1.0, 2.0] {
            let zero = DenseArray::from_slice(&[0.0f64], &[1]);
            let out = ScaleMapping::BiasedSoftplus(bias).apply(&zero).unwrap();
            let v = out.to_vec::<f64>()[0];
            assert!((v - bias).abs() < 1e-12, "bias {bias} mapped to {v}");
        }
    }

    #[test]
    fn test_softplus_matches_reference() {
        let x = DenseArray::from_slice(&[-50.0f64, -1.0, 0.0, 1.0, 50.0], &[5]);
        let out = ScaleMapping::Softplus.apply(&x).unwrap().to_vec::<f64>();
        assert!(out[0] > 0.0 && out[0] < 1e-20);
        assert!((out[2] - 2.0f64.ln()).abs() < 1e-12);
        assert!((out[4] - 50.0).abs() < 1e-12);
        for v in out {
            assert!(v > 0.0);
        }
    }

    #[test]
    fn test_split_shapes_and_positivity() {
        let split = NormalParamSplit::default();
        let data: Vec<f64> = (0..24).map(|i| (i as f64) - 12.0).collect();
        let out = DenseArray::from_slice(&data, &[3, 8]);
        let (loc, scale) = split.split(&out).unwrap();
        assert_eq!(loc.shape().as_slice(), &[3, 4]);
        assert_eq!(scale.shape().as_slice(), &[3, 4]);
        for v in scale.to_vec::<f64>() {
            assert!(v >= split.scale_lb);
        }
    }

    #[test]
    fn test_split_odd_trailing_dim() {
        let split = NormalParamSplit::default();
        let out = DenseArray::zeros(&[3, 5], crate::dtype::DType::F64);
        assert!(split.split(&out).is_err());
    }

    #[test]
    fn test_split_every_mapping_respects_floor() {
        let data: Vec<f64> = (0..16).map(|i| (i as f64) * 3.0 - 24.0).collect();
        let out = DenseArray::from_slice(&data, &[2, 8]);
        for name in ["softplus", "exp", "relu", "biased_softplus_1.0"] {
            let split = NormalParamSplit::new(name.parse().unwrap(), 1e-4);
            let (_, scale) = split.split(&out).unwrap();
            for v in scale.to_vec::<f64>() {
                assert!(v >= 1e-4, "mapping {name} produced {v}");
            }
        }
    }
}
