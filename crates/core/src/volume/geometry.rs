//! Physical placement of a volume's voxel grid

use serde::{Deserialize, Serialize};

/// Axis-aligned mapping between voxel indices and physical coordinates.
///
/// Components are ordered `(x, y, z)`, where `x` runs along the last
/// (fastest varying) array axis and `z` along the first axis of a 3D
/// volume:
/// ```text
/// x = origin[0] + i * spacing[0]
/// y = origin[1] + j * spacing[1]
/// z = origin[2] + k * spacing[2]
/// ```
/// for a voxel at array index `[k, j, i]`. 2D volumes ignore `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeGeometry {
    /// Physical coordinate of the voxel at index zero
    pub origin: [f64; 3],
    /// Distance between voxel centers along each axis
    pub spacing: [f64; 3],
}

impl VolumeGeometry {
    pub fn new(origin: [f64; 3], spacing: [f64; 3]) -> Self {
        Self { origin, spacing }
    }

    /// Geometry with unit spacing and the given origin
    pub fn with_origin(origin: [f64; 3]) -> Self {
        Self::new(origin, [1.0; 3])
    }

    /// Convert an array-order voxel index to physical coordinates.
    ///
    /// Only the trailing three axes of `index` are used.
    pub fn index_to_physical(&self, index: &[usize]) -> [f64; 3] {
        let mut point = self.origin;
        for (axis, &i) in index.iter().rev().take(3).enumerate() {
            point[axis] += i as f64 * self.spacing[axis];
        }
        point
    }

    /// Convert physical coordinates to a continuous `(x, y, z)` index.
    ///
    /// Axes with zero spacing yield NaN.
    pub fn physical_to_index(&self, point: [f64; 3]) -> [f64; 3] {
        let mut index = [0.0; 3];
        for axis in 0..3 {
            index[axis] = if self.spacing[axis].abs() < 1e-12 {
                f64::NAN
            } else {
                (point[axis] - self.origin[axis]) / self.spacing[axis]
            };
        }
        index
    }

    /// Physical volume of one voxel
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().map(|s| s.abs()).product()
    }

    /// Whether every spacing component is finite and positive
    pub fn is_valid(&self) -> bool {
        self.spacing.iter().all(|s| s.is_finite() && *s > 0.0)
            && self.origin.iter().all(|o| o.is_finite())
    }
}

impl Default for VolumeGeometry {
    fn default() -> Self {
        Self::new([0.0; 3], [1.0; 3])
    }
}
