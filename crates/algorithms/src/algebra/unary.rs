//! Single-operand voxelwise arithmetic

use volalg_core::{Error, Result, Volume, VoxelElement};

use super::{check_domain, map_voxels};

/// What `exp` does with results too large for f64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep IEEE behavior: overflowing voxels become +inf
    #[default]
    Propagate,
    /// Clamp overflowing voxels to `f64::MAX`
    Saturate,
}

/// Parameters for the exponential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpParams {
    pub overflow: OverflowPolicy,
}

/// Voxelwise power `a ^ exponent`.
///
/// Integral exponents that fit an `i32` use repeated multiplication, so
/// `power(a, 1.0)` reproduces `a` exactly; larger ones fall back to `powf`,
/// which still handles negative bases. A negative voxel with a non-integral
/// exponent, or a zero voxel with a negative exponent, is a domain error.
pub fn power<T: VoxelElement>(a: &Volume<T>, exponent: f64) -> Result<Volume<f64>> {
    if exponent.is_nan() {
        return Err(Error::InvalidParameter {
            name: "exponent",
            value: exponent.to_string(),
            reason: "must be a number".into(),
        });
    }

    let integral = exponent.fract() == 0.0;

    check_domain("power", a, |v| {
        if v < 0.0 && !integral {
            Some("negative base with non-integer exponent")
        } else if v == 0.0 && exponent < 0.0 {
            Some("zero base with negative exponent")
        } else {
            None
        }
    })?;

    if integral && exponent.abs() <= i32::MAX as f64 {
        let n = exponent as i32;
        map_voxels("power", a, move |v| v.powi(n))
    } else {
        map_voxels("power", a, move |v| v.powf(exponent))
    }
}

/// Voxelwise exponential `e ^ a`.
pub fn exp<T: VoxelElement>(a: &Volume<T>, params: ExpParams) -> Result<Volume<f64>> {
    match params.overflow {
        OverflowPolicy::Propagate => map_voxels("exp", a, f64::exp),
        OverflowPolicy::Saturate => map_voxels("exp", a, |v| {
            let e = v.exp();
            if e.is_infinite() {
                f64::MAX
            } else {
                e
            }
        }),
    }
}

/// Voxelwise natural logarithm `ln(a)`.
///
/// Any voxel `<= 0` is a domain error; NaN voxels pass through as NaN.
pub fn log<T: VoxelElement>(a: &Volume<T>) -> Result<Volume<f64>> {
    check_domain("log", a, |v| (v <= 0.0).then_some("logarithm of a non-positive value"))?;
    map_voxels("log", a, f64::ln)
}
