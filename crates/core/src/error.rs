//! Error types for volalg

use thiserror::Error;

/// Main error type for volalg operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid volume dimensions: shape {shape:?} cannot hold {len} voxels")]
    InvalidDimensions { shape: Vec<usize>, len: usize },

    #[error("Index out of bounds: {index:?} in volume of shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[error("Volume shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Domain error in {operation}: value {value} at {index:?} ({reason})")]
    Domain {
        operation: &'static str,
        index: Vec<usize>,
        value: f64,
        reason: &'static str,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error came from mathematically undefined input
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain { .. })
    }

    /// Whether this error came from operands of different shapes
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Error::ShapeMismatch { .. })
    }
}

/// Result type alias for volalg operations
pub type Result<T> = std::result::Result<T, Error>;
