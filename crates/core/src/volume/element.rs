//! Voxel element trait for generic sample values

use num_traits::{NumCast, Zero};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

use crate::error::Error;

/// Runtime name of a voxel sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl DataType {
    /// All supported types, narrowest first
    pub const ALL: [DataType; 10] = [
        DataType::U8,
        DataType::I8,
        DataType::U16,
        DataType::I16,
        DataType::U32,
        DataType::I32,
        DataType::U64,
        DataType::I64,
        DataType::F32,
        DataType::F64,
    ];

    /// Lowercase name, as used on the command line
    pub fn name(self) -> &'static str {
        match self {
            DataType::U8 => "u8",
            DataType::I8 => "i8",
            DataType::U16 => "u16",
            DataType::I16 => "i16",
            DataType::U32 => "u32",
            DataType::I32 => "i32",
            DataType::U64 => "u64",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }

    /// Whether this is a floating point type
    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Size of one sample in bytes
    pub fn size_of(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        DataType::ALL
            .iter()
            .copied()
            .find(|dt| dt.name() == lower)
            .ok_or_else(|| Error::UnsupportedDataType(s.to_string()))
    }
}

/// Trait for types that can be stored in a volume voxel.
///
/// This trait bounds the types that can be used as voxel values,
/// ensuring they support the numeric conversions the operators need.
pub trait VoxelElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Runtime tag for this type
    const DATA_TYPE: DataType;

    /// Minimum value representable by this type
    fn min_value() -> Self;

    /// Maximum value representable by this type
    fn max_value() -> Self;

    /// Widen to f64 (lossy only for 64-bit integers beyond 2^53)
    fn as_f64(self) -> f64;

    /// Whether this type is a floating point type
    fn is_float() -> bool {
        Self::DATA_TYPE.is_float()
    }

    /// Checked conversion from f64.
    ///
    /// Returns `None` when the value is outside the range of `Self`,
    /// or is NaN and `Self` is an integer type. Fractional parts are
    /// truncated toward zero for integer targets.
    fn from_f64(value: f64) -> Option<Self> {
        NumCast::from(value)
    }
}

macro_rules! impl_voxel_element {
    ($t:ty, $dt:expr) => {
        impl VoxelElement for $t {
            const DATA_TYPE: DataType = $dt;

            fn min_value() -> Self {
                <$t>::MIN
            }

            fn max_value() -> Self {
                <$t>::MAX
            }

            fn as_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_voxel_element!(u8, DataType::U8);
impl_voxel_element!(i8, DataType::I8);
impl_voxel_element!(u16, DataType::U16);
impl_voxel_element!(i16, DataType::I16);
impl_voxel_element!(u32, DataType::U32);
impl_voxel_element!(i32, DataType::I32);
impl_voxel_element!(u64, DataType::U64);
impl_voxel_element!(i64, DataType::I64);
impl_voxel_element!(f32, DataType::F32);
impl_voxel_element!(f64, DataType::F64);
