//! # volalg Core
//!
//! Core types and traits for the volalg volume arithmetic library.
//!
//! This crate provides:
//! - `Volume<T>`: Generic N-dimensional scalar volume
//! - `VolumeGeometry`: Origin and spacing of the voxel grid
//! - `VoxelElement` / `DataType`: Supported sample types
//! - The `Algorithm` trait for a consistent operator API

pub mod error;
pub mod volume;

pub use error::{Error, Result};
pub use volume::{DataType, Volume, VolumeGeometry, VolumeStatistics, VoxelElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::volume::{DataType, Volume, VolumeGeometry, VoxelElement};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in volalg.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
