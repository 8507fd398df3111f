//! # volalg Algorithms
//!
//! Voxelwise operators over scalar volumes.
//!
//! ## Available Algorithm Categories
//!
//! - **algebra**: Add, multiply, divide, power, exponential, natural log
//! - **threshold**: Replace voxels above, below or outside a threshold

mod maybe_rayon;

pub mod algebra;
pub mod threshold;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::algebra::{
        add, divide, exp, log, multiply, power, Algebra, ExpParams, MultiplyParams,
        OverflowPolicy, VolumeOp, DIVISION_EPSILON,
    };
    pub use crate::threshold::{threshold, Threshold, ThresholdMode, ThresholdParams};
    pub use volalg_core::prelude::*;
}
