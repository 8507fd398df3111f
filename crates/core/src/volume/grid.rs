//! Main Volume type

use crate::error::{Error, Result};
use crate::volume::{DataType, VolumeGeometry, VoxelElement};
use ndarray::{Array, ArrayD, ArrayViewD, ArrayViewMutD, Dimension, IxDyn};
use num_traits::NumCast;

/// An N-dimensional scalar image volume.
///
/// `Volume<T>` stores samples of type `T` in a row-major array together
/// with the physical geometry of its voxel grid. 3D volumes are indexed
/// `[slice, row, col]`.
///
/// # Type Parameters
///
/// - `T`: The voxel value type, must implement [`VoxelElement`]
///
/// # Example
///
/// ```
/// use volalg_core::Volume;
///
/// // A 4x64x64 volume filled with zeros
/// let mut volume: Volume<f32> = Volume::new(&[4, 64, 64]);
///
/// volume.set(&[1, 10, 20], 42.0).unwrap();
/// assert_eq!(volume.get(&[1, 10, 20]).unwrap(), 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T: VoxelElement> {
    /// Voxel data in row-major order
    data: ArrayD<T>,
    /// Physical placement of the grid
    geometry: VolumeGeometry,
}

impl<T: VoxelElement> Volume<T> {
    /// Create a new volume filled with zeros
    pub fn new(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
            geometry: VolumeGeometry::default(),
        }
    }

    /// Create a new volume filled with a specific value
    pub fn filled(shape: &[usize], value: T) -> Self {
        Self {
            data: ArrayD::from_elem(IxDyn(shape), value),
            geometry: VolumeGeometry::default(),
        }
    }

    /// Create a volume from row-major samples
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::InvalidDimensions {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }

        let array = ArrayD::from_shape_vec(IxDyn(shape), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            geometry: VolumeGeometry::default(),
        })
    }

    /// Create a volume from an ndarray of any dimensionality
    pub fn from_array<D: Dimension>(data: Array<T, D>) -> Self {
        Self {
            data: data.into_dyn(),
            geometry: VolumeGeometry::default(),
        }
    }

    /// Create a volume with the same shape and geometry, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: ArrayD::from_elem(self.data.raw_dim(), fill_value),
            geometry: self.geometry,
        }
    }

    // Dimensions

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Extent along each axis
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the volume holds no voxels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the volume carries image data (at least one axis and one voxel)
    pub fn has_data(&self) -> bool {
        self.ndim() > 0 && !self.is_empty()
    }

    /// Runtime tag of the element type
    pub fn dtype(&self) -> DataType {
        T::DATA_TYPE
    }

    /// Fail with [`Error::ShapeMismatch`] unless `other` has the same shape
    pub fn ensure_same_shape<U: VoxelElement>(&self, other: &Volume<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                actual: other.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// N-dimensional index of the voxel at row-major position `flat`
    pub fn unravel_index(&self, flat: usize) -> Vec<usize> {
        let shape = self.shape();
        let mut index = vec![0; shape.len()];
        let mut rem = flat;
        for axis in (0..shape.len()).rev() {
            let extent = shape[axis].max(1);
            index[axis] = rem % extent;
            rem /= extent;
        }
        index
    }

    // Data access

    /// Get value at an N-dimensional index
    pub fn get(&self, index: &[usize]) -> Result<T> {
        self.data
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_bounds(index))
    }

    /// Set value at an N-dimensional index
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        if let Some(v) = self.data.get_mut(index) {
            *v = value;
            return Ok(());
        }
        Err(self.out_of_bounds(index))
    }

    fn out_of_bounds(&self, index: &[usize]) -> Error {
        Error::IndexOutOfBounds {
            index: index.to_vec(),
            shape: self.shape().to_vec(),
        }
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayViewD<'_, T> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMutD<'_, T> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut ArrayD<T> {
        &mut self.data
    }

    /// Samples in row-major order, widened to f64
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.iter().map(|&v| v.as_f64()).collect()
    }

    // Metadata

    /// Get the geometry
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Set the geometry
    pub fn set_geometry(&mut self, geometry: VolumeGeometry) {
        self.geometry = geometry;
    }

    // Conversion

    /// Convert every voxel to another element type.
    ///
    /// Samples convert directly, without a detour through f64, so 64-bit
    /// integers survive a same-width cast exactly. Fails with
    /// [`Error::UnsupportedDataType`] at the first voxel (in row-major
    /// order) whose value is not representable in `U`. Fractional values
    /// are truncated toward zero for integer targets.
    pub fn cast<U: VoxelElement>(&self) -> Result<Volume<U>> {
        let mut out = Vec::with_capacity(self.len());
        for (flat, &v) in self.data.iter().enumerate() {
            match <U as NumCast>::from(v) {
                Some(u) => out.push(u),
                None => {
                    return Err(Error::UnsupportedDataType(format!(
                        "value {:?} at {:?} is outside the {} range [{:?}, {:?}]",
                        v,
                        self.unravel_index(flat),
                        U::DATA_TYPE,
                        U::min_value(),
                        U::max_value()
                    )))
                }
            }
        }

        let mut volume = Volume::from_vec(out, self.shape())?;
        volume.set_geometry(self.geometry);
        Ok(volume)
    }

    // Statistics

    /// Calculate basic statistics (min, max, mean, count of non-NaN voxels)
    pub fn statistics(&self) -> VolumeStatistics {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            let v = value.as_f64();
            if v.is_nan() {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }

        let (min, max, mean) = if count > 0 {
            (Some(min), Some(max), Some(sum / count as f64))
        } else {
            (None, None, None)
        };

        VolumeStatistics {
            min,
            max,
            mean,
            valid_count: count,
            nan_count: self.len() - count,
        }
    }
}

/// Basic statistics for a volume
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VolumeStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nan_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_creation() {
        let volume: Volume<f32> = Volume::new(&[3, 10, 20]);
        assert_eq!(volume.ndim(), 3);
        assert_eq!(volume.shape(), &[3, 10, 20]);
        assert_eq!(volume.len(), 600);
        assert_eq!(volume.dtype(), DataType::F32);
        assert!(volume.has_data());
    }

    #[test]
    fn test_empty_volume_has_no_data() {
        let volume: Volume<u8> = Volume::new(&[0, 4, 4]);
        assert!(volume.is_empty());
        assert!(!volume.has_data());
    }

    #[test]
    fn test_volume_access() {
        let mut volume: Volume<i16> = Volume::new(&[2, 5, 5]);
        volume.set(&[1, 4, 3], -7).unwrap();
        assert_eq!(volume.get(&[1, 4, 3]).unwrap(), -7);
        assert!(matches!(
            volume.get(&[2, 0, 0]),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert!(volume.set(&[0, 0], 1).is_err());
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let result = Volume::from_vec(vec![1.0f64; 5], &[2, 3]);
        assert!(matches!(result, Err(Error::InvalidDimensions { len: 5, .. })));
    }

    #[test]
    fn test_unravel_index() {
        let volume: Volume<u8> = Volume::new(&[2, 3, 4]);
        assert_eq!(volume.unravel_index(0), vec![0, 0, 0]);
        assert_eq!(volume.unravel_index(5), vec![0, 1, 1]);
        assert_eq!(volume.unravel_index(23), vec![1, 2, 3]);
    }

    #[test]
    fn test_shape_check() {
        let a: Volume<f64> = Volume::new(&[2, 2]);
        let b: Volume<u8> = Volume::new(&[3, 3]);
        let err = a.ensure_same_shape(&b).unwrap_err();
        assert!(err.is_shape_mismatch());
        assert!(a.ensure_same_shape(&a.clone()).is_ok());
    }

    #[test]
    fn test_cast_keeps_geometry() {
        let mut volume = Volume::from_vec(vec![1.5f64, 2.0, 250.0], &[3]).unwrap();
        volume.set_geometry(VolumeGeometry::with_origin([1.0, 2.0, 3.0]));

        let cast: Volume<u8> = volume.cast().unwrap();
        assert_eq!(cast.data().as_slice().unwrap(), &[1, 2, 250]);
        assert_eq!(cast.geometry(), volume.geometry());
    }

    #[test]
    fn test_cast_out_of_range() {
        let volume = Volume::from_vec(vec![1.0f64, 300.0], &[2]).unwrap();
        let err = volume.cast::<u8>().unwrap_err();
        match err {
            Error::UnsupportedDataType(msg) => {
                assert!(msg.contains("[1]"), "{msg}");
                assert!(msg.contains("[0, 255]"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cast_keeps_wide_integers_exact() {
        let big = (1u64 << 53) + 1;
        let volume = Volume::from_vec(vec![big, 7], &[2]).unwrap();

        let same: Volume<u64> = volume.cast().unwrap();
        assert_eq!(same, volume);

        let signed: Volume<i64> = volume.cast().unwrap();
        assert_eq!(signed.get(&[0]).unwrap(), big as i64);

        assert!(Volume::from_vec(vec![u64::MAX], &[1])
            .unwrap()
            .cast::<i64>()
            .is_err());
    }

    #[test]
    fn test_volume_statistics() {
        let mut volume: Volume<f64> = Volume::new(&[2, 5, 10]);
        for (i, v) in volume.data_mut().iter_mut().enumerate() {
            *v = i as f64;
        }
        volume.set(&[0, 0, 0], f64::NAN).unwrap();

        let stats = volume.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nan_count, 1);
    }
}
