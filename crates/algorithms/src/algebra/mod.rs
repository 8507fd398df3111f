//! Elementwise volume algebra
//!
//! Arithmetic between one or two volumes, voxel by voxel:
//! - Binary: add, scaled multiply, epsilon-guarded divide
//! - Unary: power, exponential, natural logarithm
//!
//! Every operator checks operand shapes and input domain before
//! allocating its output, and returns a new `Volume<f64>` carrying the
//! geometry of its first operand.

mod binary;
mod operator;
mod unary;

pub use binary::{add, divide, multiply, MultiplyParams, DIVISION_EPSILON};
pub use operator::{Algebra, VolumeOp};
pub use unary::{exp, log, power, ExpParams, OverflowPolicy};

use crate::maybe_rayon::*;
use tracing::debug;
use volalg_core::{Error, Result, Volume, VoxelElement};

/// Apply `f` to every voxel of `a`.
pub(crate) fn map_voxels<T, F>(operation: &'static str, a: &Volume<T>, f: F) -> Result<Volume<f64>>
where
    T: VoxelElement,
    F: Fn(f64) -> f64 + Sync + Send,
{
    debug!(operation, shape = ?a.shape(), workers = worker_count(), "voxel kernel started");

    let a_std = a.data().as_standard_layout();
    let a_s = contiguous(a_std.as_slice())?;

    let data: Vec<f64> = (0..a_s.len())
        .into_par_iter()
        .map(|i| f(a_s[i].as_f64()))
        .collect();

    finish(operation, a, data)
}

/// Apply `f` to every pair of matching voxels of `a` and `b`.
///
/// Fails with `ShapeMismatch` before touching any voxel.
pub(crate) fn zip_voxels<A, B, F>(
    operation: &'static str,
    a: &Volume<A>,
    b: &Volume<B>,
    f: F,
) -> Result<Volume<f64>>
where
    A: VoxelElement,
    B: VoxelElement,
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    a.ensure_same_shape(b)?;
    debug!(operation, shape = ?a.shape(), workers = worker_count(), "voxel kernel started");

    let a_std = a.data().as_standard_layout();
    let b_std = b.data().as_standard_layout();
    let a_s = contiguous(a_std.as_slice())?;
    let b_s = contiguous(b_std.as_slice())?;

    let data: Vec<f64> = (0..a_s.len())
        .into_par_iter()
        .map(|i| f(a_s[i].as_f64(), b_s[i].as_f64()))
        .collect();

    finish(operation, a, data)
}

/// Sequential pre-pass reporting the first voxel, in row-major order, for
/// which `undefined` returns a reason.
pub(crate) fn check_domain<T, P>(operation: &'static str, volume: &Volume<T>, undefined: P) -> Result<()>
where
    T: VoxelElement,
    P: Fn(f64) -> Option<&'static str>,
{
    for (flat, &v) in volume.data().iter().enumerate() {
        let value = v.as_f64();
        if let Some(reason) = undefined(value) {
            debug!(operation, value, reason, "domain check failed");
            return Err(Error::Domain {
                operation,
                index: volume.unravel_index(flat),
                value,
                reason,
            });
        }
    }
    Ok(())
}

fn contiguous<T>(slice: Option<&[T]>) -> Result<&[T]> {
    slice.ok_or_else(|| Error::Other("volume data is not contiguous".into()))
}

fn finish<T: VoxelElement>(
    operation: &'static str,
    template: &Volume<T>,
    data: Vec<f64>,
) -> Result<Volume<f64>> {
    let mut output = Volume::from_vec(data, template.shape())?;
    output.set_geometry(*template.geometry());
    debug!(operation, voxels = output.len(), "voxel kernel completed");
    Ok(output)
}
