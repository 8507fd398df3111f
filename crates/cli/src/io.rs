//! Volume files as multi-page TIFF stacks
//!
//! One grayscale page per slice, first page first. A single page reads
//! back as a 2D volume. Geometry lives in the first page's
//! ModelPixelScale and ModelTiepoint tags. Samples stay in their stored
//! type from decode to encode.

use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use volalg_core::{
    DataType, Error, Result, Volume, VolumeGeometry, VolumeStatistics, VoxelElement,
};

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;

/// Evaluate `$body` with `$v` bound to the `Volume<T>` inside a [`TypedVolume`]
macro_rules! with_volume {
    ($typed:expr, $v:ident => $body:expr) => {
        match $typed {
            $crate::io::TypedVolume::U8($v) => $body,
            $crate::io::TypedVolume::I8($v) => $body,
            $crate::io::TypedVolume::U16($v) => $body,
            $crate::io::TypedVolume::I16($v) => $body,
            $crate::io::TypedVolume::U32($v) => $body,
            $crate::io::TypedVolume::I32($v) => $body,
            $crate::io::TypedVolume::U64($v) => $body,
            $crate::io::TypedVolume::I64($v) => $body,
            $crate::io::TypedVolume::F32($v) => $body,
            $crate::io::TypedVolume::F64($v) => $body,
        }
    };
}

pub(crate) use with_volume;

/// A volume in the sample type it was stored with
#[derive(Debug, Clone, PartialEq)]
pub enum TypedVolume {
    U8(Volume<u8>),
    I8(Volume<i8>),
    U16(Volume<u16>),
    I16(Volume<i16>),
    U32(Volume<u32>),
    I32(Volume<i32>),
    U64(Volume<u64>),
    I64(Volume<i64>),
    F32(Volume<f32>),
    F64(Volume<f64>),
}

macro_rules! impl_from_volume {
    ($($variant:ident($t:ty)),* $(,)?) => {
        $(
            impl From<Volume<$t>> for TypedVolume {
                fn from(volume: Volume<$t>) -> Self {
                    TypedVolume::$variant(volume)
                }
            }
        )*
    };
}

impl_from_volume!(
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
);

impl TypedVolume {
    pub fn dtype(&self) -> DataType {
        with_volume!(self, v => v.dtype())
    }

    pub fn shape(&self) -> &[usize] {
        with_volume!(self, v => v.shape())
    }

    pub fn len(&self) -> usize {
        with_volume!(self, v => v.len())
    }

    pub fn has_data(&self) -> bool {
        with_volume!(self, v => v.has_data())
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        with_volume!(self, v => v.geometry())
    }

    pub fn set_geometry(&mut self, geometry: VolumeGeometry) {
        with_volume!(self, v => v.set_geometry(geometry))
    }

    pub fn statistics(&self) -> VolumeStatistics {
        with_volume!(self, v => v.statistics())
    }

    /// Convert to another element type, failing on unrepresentable voxels
    pub fn cast<U: VoxelElement>(&self) -> Result<Volume<U>> {
        with_volume!(self, v => v.cast::<U>())
    }
}

/// Read a TIFF stack from a file
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<TypedVolume> {
    let file = fs::File::open(path.as_ref())?;
    decode_volume(std::io::BufReader::new(file))
}

/// Write a volume to a TIFF stack, converting samples to `dtype`.
///
/// The file is only created once every voxel has been converted.
pub fn write_volume<P: AsRef<Path>>(volume: &TypedVolume, dtype: DataType, path: P) -> Result<()> {
    let mut buf = Cursor::new(Vec::new());
    encode_volume(volume, dtype, &mut buf)?;
    fs::write(path.as_ref(), buf.into_inner())?;
    Ok(())
}

fn tiff_err(context: &'static str) -> impl Fn(tiff::TiffError) -> Error {
    move |e| Error::Other(format!("{}: {}", context, e))
}

/// Decode a TIFF stack from any `Read + Seek` source
pub fn decode_volume<R: Read + Seek>(reader: R) -> Result<TypedVolume> {
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let geometry = read_geometry(&mut decoder).ok();
    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;

    let mut stack: Option<DecodingResult> = None;
    let mut pages = 0usize;

    loop {
        let (w, h) = decoder
            .dimensions()
            .map_err(tiff_err("Cannot read dimensions"))?;
        if (w, h) != (width, height) {
            return Err(Error::ShapeMismatch {
                expected: vec![height as usize, width as usize],
                actual: vec![h as usize, w as usize],
            });
        }

        let image = decoder
            .read_image()
            .map_err(tiff_err("Cannot read image data"))?;
        let page_type = sample_type(&image)?;

        if sample_count(&image) != w as usize * h as usize {
            return Err(Error::UnsupportedDataType(
                "only single-channel grayscale pages are supported".into(),
            ));
        }

        match stack {
            None => stack = Some(image),
            Some(ref mut samples) => {
                if !append_page(samples, image) {
                    return Err(Error::UnsupportedDataType(format!(
                        "page {} holds {} samples, earlier pages hold {}",
                        pages,
                        page_type,
                        sample_type(samples)?
                    )));
                }
            }
        }
        pages += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(tiff_err("Cannot read next page"))?;
    }

    let (rows, cols) = (height as usize, width as usize);
    let shape = if pages == 1 {
        vec![rows, cols]
    } else {
        vec![pages, rows, cols]
    };

    let stack = stack.ok_or_else(|| Error::Other("TIFF file has no pages".into()))?;
    let mut volume = stack_volume(stack, &shape)?;
    if let Some(geometry) = geometry {
        volume.set_geometry(geometry);
    }
    Ok(volume)
}

fn unsupported_samples() -> Error {
    Error::UnsupportedDataType("Unsupported TIFF sample format".to_string())
}

fn sample_type(image: &DecodingResult) -> Result<DataType> {
    let dtype = match image {
        DecodingResult::U8(_) => DataType::U8,
        DecodingResult::U16(_) => DataType::U16,
        DecodingResult::U32(_) => DataType::U32,
        DecodingResult::U64(_) => DataType::U64,
        DecodingResult::I8(_) => DataType::I8,
        DecodingResult::I16(_) => DataType::I16,
        DecodingResult::I32(_) => DataType::I32,
        DecodingResult::I64(_) => DataType::I64,
        DecodingResult::F32(_) => DataType::F32,
        DecodingResult::F64(_) => DataType::F64,
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported_samples()),
    };
    Ok(dtype)
}

fn sample_count(image: &DecodingResult) -> usize {
    match image {
        DecodingResult::U8(buf) => buf.len(),
        DecodingResult::U16(buf) => buf.len(),
        DecodingResult::U32(buf) => buf.len(),
        DecodingResult::U64(buf) => buf.len(),
        DecodingResult::I8(buf) => buf.len(),
        DecodingResult::I16(buf) => buf.len(),
        DecodingResult::I32(buf) => buf.len(),
        DecodingResult::I64(buf) => buf.len(),
        DecodingResult::F32(buf) => buf.len(),
        DecodingResult::F64(buf) => buf.len(),
        #[allow(unreachable_patterns)]
        _ => 0,
    }
}

/// Append a page to the stack; false when the sample types differ
fn append_page(stack: &mut DecodingResult, page: DecodingResult) -> bool {
    macro_rules! append {
        ($($variant:ident),*) => {
            match (stack, page) {
                $(
                    (DecodingResult::$variant(s), DecodingResult::$variant(p)) => {
                        s.extend(p);
                        true
                    }
                )*
                _ => false,
            }
        };
    }
    append!(U8, U16, U32, U64, I8, I16, I32, I64, F32, F64)
}

fn stack_volume(stack: DecodingResult, shape: &[usize]) -> Result<TypedVolume> {
    let volume = match stack {
        DecodingResult::U8(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::U16(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::U32(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::U64(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::I8(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::I16(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::I32(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::I64(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::F32(buf) => Volume::from_vec(buf, shape)?.into(),
        DecodingResult::F64(buf) => Volume::from_vec(buf, shape)?.into(),
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported_samples()),
    };
    Ok(volume)
}

/// Read origin and spacing from the current page's tags
fn read_geometry<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<VolumeGeometry> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG))
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG))
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    // tiepoint: [I, J, K, X, Y, Z], written with I = J = K = 0
    if scale.len() >= 3 && tiepoint.len() >= 6 {
        return Ok(VolumeGeometry::new(
            [tiepoint[3], tiepoint[4], tiepoint[5]],
            [scale[0], scale[1], scale[2]],
        ));
    }

    Err(Error::Other("Cannot determine volume geometry".into()))
}

/// Write pages of `$t`, casting only when the stored type differs
macro_rules! write_as {
    ($encoder:expr, $volume:expr, $dims:expr, $variant:ident, $color:ty, $t:ty) => {
        match $volume {
            TypedVolume::$variant(v) => write_pages::<$color, $t, _>($encoder, v, $dims),
            other => write_pages::<$color, $t, _>($encoder, &other.cast::<$t>()?, $dims),
        }
    };
}

/// Encode a volume as a TIFF stack into any `Write + Seek` sink
pub fn encode_volume<W: Write + Seek>(volume: &TypedVolume, dtype: DataType, writer: W) -> Result<()> {
    let invalid = || Error::InvalidDimensions {
        shape: volume.shape().to_vec(),
        len: volume.len(),
    };

    if !volume.has_data() {
        return Err(invalid());
    }

    let dims = match *volume.shape() {
        [rows, cols] => (1, rows, cols),
        [pages, rows, cols] => (pages, rows, cols),
        _ => return Err(invalid()),
    };

    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;
    let encoder = &mut encoder;

    match dtype {
        DataType::U8 => write_as!(encoder, volume, dims, U8, colortype::Gray8, u8),
        DataType::U16 => write_as!(encoder, volume, dims, U16, colortype::Gray16, u16),
        DataType::U32 => write_as!(encoder, volume, dims, U32, colortype::Gray32, u32),
        DataType::U64 => write_as!(encoder, volume, dims, U64, colortype::Gray64, u64),
        DataType::I8 => write_as!(encoder, volume, dims, I8, colortype::GrayI8, i8),
        DataType::I16 => write_as!(encoder, volume, dims, I16, colortype::GrayI16, i16),
        DataType::I32 => write_as!(encoder, volume, dims, I32, colortype::GrayI32, i32),
        DataType::I64 => write_as!(encoder, volume, dims, I64, colortype::GrayI64, i64),
        DataType::F32 => write_as!(encoder, volume, dims, F32, colortype::Gray32Float, f32),
        DataType::F64 => write_as!(encoder, volume, dims, F64, colortype::Gray64Float, f64),
    }
}

fn write_pages<C, T, W>(
    encoder: &mut TiffEncoder<W>,
    volume: &Volume<T>,
    (pages, rows, cols): (usize, usize, usize),
) -> Result<()>
where
    C: colortype::ColorType<Inner = T>,
    [T]: TiffValue,
    T: VoxelElement,
    W: Write + Seek,
{
    let width = u32::try_from(cols).map_err(|_| Error::InvalidDimensions {
        shape: volume.shape().to_vec(),
        len: volume.len(),
    })?;
    let height = u32::try_from(rows).map_err(|_| Error::InvalidDimensions {
        shape: volume.shape().to_vec(),
        len: volume.len(),
    })?;

    let dense = volume.data().as_standard_layout();
    let samples = dense
        .as_slice()
        .ok_or_else(|| Error::Other("volume data is not contiguous".into()))?;
    let geometry = volume.geometry();

    for (page, slice) in samples.chunks(rows * cols).take(pages).enumerate() {
        let mut image = encoder
            .new_image::<C>(width, height)
            .map_err(tiff_err("Cannot create TIFF page"))?;

        if page == 0 {
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG), &geometry.spacing[..])
                .map_err(tiff_err("Cannot write scale tag"))?;

            let tiepoint = [
                0.0,
                0.0,
                0.0,
                geometry.origin[0],
                geometry.origin[1],
                geometry.origin[2],
            ];
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG), &tiepoint[..])
                .map_err(tiff_err("Cannot write tiepoint tag"))?;
        }

        image
            .write_data(slice)
            .map_err(tiff_err("Cannot write page data"))?;
    }

    Ok(())
}
