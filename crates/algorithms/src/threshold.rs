//! Intensity thresholding
//!
//! Replaces voxels above, below or outside a threshold with a constant,
//! leaving the rest untouched. With `negate` the roles swap.

use crate::maybe_rayon::*;
use tracing::debug;
use volalg_core::{Algorithm, Error, Result, Volume, VoxelElement};

/// Threshold used when none is given
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Which voxels get replaced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMode {
    /// Voxels with value > threshold
    Above(f64),
    /// Voxels with value < threshold
    Below(f64),
    /// Voxels with value outside `[lower, upper]`
    Outside { lower: f64, upper: f64 },
}

impl ThresholdMode {
    fn validate(&self) -> Result<()> {
        match *self {
            ThresholdMode::Above(t) | ThresholdMode::Below(t) if t.is_nan() => {
                Err(Error::InvalidParameter {
                    name: "threshold",
                    value: t.to_string(),
                    reason: "must be a number".into(),
                })
            }
            ThresholdMode::Outside { lower, upper }
                if lower.is_nan() || upper.is_nan() || lower > upper =>
            {
                Err(Error::InvalidParameter {
                    name: "lower",
                    value: format!("{}..{}", lower, upper),
                    reason: "lower must not exceed upper".into(),
                })
            }
            _ => Ok(()),
        }
    }

    fn replaces(&self, v: f64) -> bool {
        match *self {
            ThresholdMode::Above(t) => v > t,
            ThresholdMode::Below(t) => v < t,
            ThresholdMode::Outside { lower, upper } => v < lower || v > upper,
        }
    }
}

/// Parameters for thresholding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    pub mode: ThresholdMode,
    /// Value written into replaced voxels
    pub outside_value: f64,
    /// Replace the voxels that would otherwise be kept
    pub negate: bool,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            mode: ThresholdMode::Above(DEFAULT_THRESHOLD),
            outside_value: 0.0,
            negate: false,
        }
    }
}

/// Thresholding algorithm
#[derive(Debug, Clone, Default)]
pub struct Threshold;

impl Algorithm for Threshold {
    type Input = Volume<f64>;
    type Output = Volume<f64>;
    type Params = ThresholdParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Threshold"
    }

    fn description(&self) -> &'static str {
        "Replace voxels above, below or outside a threshold with a constant"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        threshold(&input, &params)
    }
}

/// Threshold a volume, keeping its element type.
///
/// NaN voxels never compare as above, below or outside, so they are kept
/// (or replaced, with `negate`).
///
/// # Errors
/// * `InvalidParameter` for a NaN threshold or `lower > upper`
/// * `UnsupportedDataType` when `outside_value` does not fit in `T`
pub fn threshold<T: VoxelElement>(volume: &Volume<T>, params: &ThresholdParams) -> Result<Volume<T>> {
    params.mode.validate()?;

    let outside = T::from_f64(params.outside_value).ok_or_else(|| {
        Error::UnsupportedDataType(format!(
            "outside value {} is not representable as {}",
            params.outside_value,
            T::DATA_TYPE
        ))
    })?;

    debug!(mode = ?params.mode, negate = params.negate, shape = ?volume.shape(), "threshold started");

    let mode = params.mode;
    let negate = params.negate;
    let dense = volume.data().as_standard_layout();
    let samples = dense
        .as_slice()
        .ok_or_else(|| Error::Other("volume data is not contiguous".into()))?;

    let data: Vec<T> = (0..samples.len())
        .into_par_iter()
        .map(|i| {
            let v = samples[i];
            if mode.replaces(v.as_f64()) != negate {
                outside
            } else {
                v
            }
        })
        .collect();

    let mut output = Volume::from_vec(data, volume.shape())?;
    output.set_geometry(*volume.geometry());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Volume<f64> {
        Volume::from_vec((0..6).map(|v| v as f64).collect(), &[1, 2, 3]).unwrap()
    }

    fn values<T: VoxelElement>(v: &Volume<T>) -> Vec<T> {
        v.data().iter().copied().collect()
    }

    #[test]
    fn test_threshold_above() {
        let params = ThresholdParams {
            mode: ThresholdMode::Above(2.5),
            outside_value: -1.0,
            negate: false,
        };
        let out = threshold(&ramp(), &params).unwrap();
        assert_eq!(values(&out), vec![0.0, 1.0, 2.0, -1.0, -1.0, -1.0]);
        assert_eq!(out.shape(), &[1, 2, 3]);
    }

    #[test]
    fn test_threshold_below() {
        let params = ThresholdParams {
            mode: ThresholdMode::Below(2.0),
            ..Default::default()
        };
        let out = threshold(&ramp(), &params).unwrap();
        assert_eq!(values(&out), vec![0.0, 0.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_threshold_outside() {
        let params = ThresholdParams {
            mode: ThresholdMode::Outside {
                lower: 1.0,
                upper: 3.0,
            },
            outside_value: 9.0,
            negate: false,
        };
        let out = threshold(&ramp(), &params).unwrap();
        assert_eq!(values(&out), vec![9.0, 1.0, 2.0, 3.0, 9.0, 9.0]);
    }

    #[test]
    fn test_threshold_negate() {
        let params = ThresholdParams {
            mode: ThresholdMode::Above(2.5),
            outside_value: 7.0,
            negate: true,
        };
        let out = threshold(&ramp(), &params).unwrap();
        assert_eq!(values(&out), vec![7.0, 7.0, 7.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_threshold_keeps_integer_type() {
        let volume = Volume::from_vec(vec![0u8, 1, 200, 255], &[4]).unwrap();
        let params = ThresholdParams {
            mode: ThresholdMode::Above(100.0),
            outside_value: 100.0,
            negate: false,
        };
        let out: Volume<u8> = threshold(&volume, &params).unwrap();
        assert_eq!(values(&out), vec![0, 1, 100, 100]);
    }

    #[test]
    fn test_default_params() {
        let out = Threshold.execute_default(ramp()).unwrap();
        // Above 0.5 replaced with 0
        assert_eq!(values(&out), vec![0.0; 6]);
    }

    #[test]
    fn test_invalid_params() {
        let reversed = ThresholdParams {
            mode: ThresholdMode::Outside {
                lower: 5.0,
                upper: 1.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            threshold(&ramp(), &reversed),
            Err(Error::InvalidParameter { .. })
        ));

        let unrepresentable = ThresholdParams {
            outside_value: -1.0,
            ..Default::default()
        };
        let volume = Volume::<u16>::new(&[2]);
        assert!(matches!(
            threshold(&volume, &unrepresentable),
            Err(Error::UnsupportedDataType(_))
        ));
    }
}
