//! Two-operand voxelwise arithmetic

use volalg_core::{Result, Volume, VoxelElement};

use super::{check_domain, zip_voxels};

/// Offset added to every divisor voxel so that zero-valued voxels
/// (background) do not divide by zero.
pub const DIVISION_EPSILON: f64 = 0.1;

/// Parameters for scaled multiplication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplyParams {
    /// Factor applied to the first operand
    pub scale_a: f64,
    /// Factor applied to the second operand
    pub scale_b: f64,
}

impl Default for MultiplyParams {
    fn default() -> Self {
        Self {
            scale_a: 1.0,
            scale_b: 1.0,
        }
    }
}

/// Voxelwise sum `a + b`.
pub fn add<A, B>(a: &Volume<A>, b: &Volume<B>) -> Result<Volume<f64>>
where
    A: VoxelElement,
    B: VoxelElement,
{
    zip_voxels("add", a, b, |va, vb| va + vb)
}

/// Voxelwise scaled product `(scale_a * a) * (scale_b * b)`.
///
/// # Example
/// ```
/// use volalg_algorithms::algebra::{multiply, MultiplyParams};
/// use volalg_core::Volume;
///
/// let a = Volume::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let b = Volume::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();
/// let params = MultiplyParams { scale_a: 2.0, scale_b: 1.0 };
/// let product = multiply(&a, &b, params).unwrap();
/// assert_eq!(product.data().as_slice().unwrap(), &[8.0, 20.0, 36.0]);
/// ```
pub fn multiply<A, B>(a: &Volume<A>, b: &Volume<B>, params: MultiplyParams) -> Result<Volume<f64>>
where
    A: VoxelElement,
    B: VoxelElement,
{
    let MultiplyParams { scale_a, scale_b } = params;
    zip_voxels("multiply", a, b, move |va, vb| scale_a * va * (scale_b * vb))
}

/// Voxelwise quotient `a / (b + DIVISION_EPSILON)`.
///
/// A divisor voxel equal to `-DIVISION_EPSILON` still yields a zero
/// denominator and is reported as a domain error.
pub fn divide<A, B>(a: &Volume<A>, b: &Volume<B>) -> Result<Volume<f64>>
where
    A: VoxelElement,
    B: VoxelElement,
{
    a.ensure_same_shape(b)?;
    check_domain("divide", b, |vb| {
        (vb + DIVISION_EPSILON == 0.0).then_some("denominator is zero after epsilon offset")
    })?;
    zip_voxels("divide", a, b, |va, vb| va / (vb + DIVISION_EPSILON))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use volalg_core::{Error, VolumeGeometry};

    fn vol(values: &[f64]) -> Volume<f64> {
        Volume::from_vec(values.to_vec(), &[values.len()]).unwrap()
    }

    #[test]
    fn test_add_example() {
        let sum = add(&vol(&[1.0, 2.0, 3.0]), &vol(&[4.0, 5.0, 6.0])).unwrap();
        assert_eq!(sum.data().as_slice().unwrap(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_add_mixed_types() {
        let a = Volume::from_vec(vec![250u8, 10], &[2]).unwrap();
        let b = Volume::from_vec(vec![10i16, -20], &[2]).unwrap();
        let sum = add(&a, &b).unwrap();
        // Widened, so u8 overflow does not wrap
        assert_eq!(sum.data().as_slice().unwrap(), &[260.0, -10.0]);
    }

    #[test]
    fn test_multiply_unit_scales() {
        let product = multiply(
            &vol(&[1.0, 2.0, 3.0]),
            &vol(&[4.0, 5.0, 6.0]),
            MultiplyParams::default(),
        )
        .unwrap();
        assert_eq!(product.data().as_slice().unwrap(), &[4.0, 10.0, 18.0]);
    }

    #[test]
    fn test_multiply_scales() {
        let params = MultiplyParams {
            scale_a: 2.0,
            scale_b: -0.5,
        };
        let product = multiply(&vol(&[3.0]), &vol(&[4.0]), params).unwrap();
        assert_relative_eq!(product.get(&[0]).unwrap(), -12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_divide_example() {
        let q = divide(&vol(&[1.0, 2.0, 3.0]), &vol(&[4.0, 5.0, 6.0])).unwrap();
        let expected = [1.0 / 4.1, 2.0 / 5.1, 3.0 / 6.1];
        for (got, want) in q.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_divide_by_zero_volume() {
        let a = vol(&[1.0, -2.0, 0.0, 5.0]);
        let zeros = Volume::<u16>::new(&[4]);
        let q = divide(&a, &zeros).unwrap();
        for (got, va) in q.data().iter().zip(a.data().iter()) {
            assert_relative_eq!(*got, va / 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_divide_zero_denominator() {
        let a = vol(&[1.0, 1.0, 1.0]);
        let b = vol(&[1.0, -DIVISION_EPSILON, 2.0]);
        let err = divide(&a, &b).unwrap_err();
        match err {
            Error::Domain { operation, index, .. } => {
                assert_eq!(operation, "divide");
                assert_eq!(index, vec![1]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Volume::<f64>::new(&[2, 2]);
        let b = Volume::<f64>::new(&[3, 3]);
        assert!(add(&a, &b).unwrap_err().is_shape_mismatch());
        assert!(multiply(&a, &b, MultiplyParams::default())
            .unwrap_err()
            .is_shape_mismatch());
        assert!(divide(&a, &b).unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn test_result_takes_first_operand_geometry() {
        let mut a = Volume::<f32>::filled(&[2, 2, 2], 1.0);
        a.set_geometry(VolumeGeometry::new([5.0, 5.0, 5.0], [0.5, 0.5, 3.0]));
        let b = Volume::<f32>::filled(&[2, 2, 2], 2.0);
        let sum = add(&a, &b).unwrap();
        assert_eq!(sum.geometry(), a.geometry());
        assert_eq!(sum.shape(), &[2, 2, 2]);
    }
}
