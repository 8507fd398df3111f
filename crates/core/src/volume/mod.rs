//! Volume data structures

mod element;
mod geometry;
mod grid;

pub use element::{DataType, VoxelElement};
pub use geometry::VolumeGeometry;
pub use grid::{Volume, VolumeStatistics};
