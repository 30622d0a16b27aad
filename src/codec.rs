//! Block-level pixel codec.
//!
//! The codec converts between stored block bytes and wide [`Sample`]s:
//!
//! - [`BlockSampler`] decodes one block into its texels
//! - [`TexelWriter`] encodes one texel of an uncompressed format
//! - [`decompress`] expands a whole block-compressed surface in bulk
//!
//! Dispatch happens once per sampler/writer: the format is resolved into
//! an [`Encoding`] descriptor at construction and every call matches on
//! that descriptor.

use core::fmt;

use half::f16;
use rgb::Rgba;

use crate::bc::{self, BcKind};
use crate::format::{Format, FormatInfo};
use crate::params::Extent;

/// Wide per-texel value.
///
/// Normalized and float formats decode to reals, integer formats to exact
/// integer values, and sRGB formats to linear light. Channels a format
/// doesn't store read as `0`, except alpha which reads as `1`.
pub type Sample = Rgba<f64>;

/// Largest texels-per-block of any supported format.
pub const MAX_BLOCK_TEXEL_COUNT: usize = 16;

/// Opaque black.
pub const DEFAULT_CLEAR_COLOR: Sample = Rgba {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

// ---------------------------------------------------------------------------
// CodecError
// ---------------------------------------------------------------------------

/// Errors from block decode, texel encode and decompression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// The format is [`Format::Undefined`].
    InvalidFormat,
    /// Depth and stencil formats have no color decoder.
    DepthStencilUnsupported,
    /// The format has no per-texel encoder.
    FormatNotWriteable,
    /// The format has no bulk decompressor.
    FormatNotDecompressible,
    /// The destination format is not a decompression target of the source.
    UnsupportedDecompressionTarget,
    /// Source bytes end before the requested block(s).
    SourceTooSmall,
    /// Destination bytes or sample buffer are too short.
    DestinationTooSmall,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "format is undefined"),
            Self::DepthStencilUnsupported => write!(f, "depth/stencil formats cannot be decoded"),
            Self::FormatNotWriteable => write!(f, "format has no texel encoder"),
            Self::FormatNotDecompressible => write!(f, "format is not decompressible"),
            Self::UnsupportedDecompressionTarget => {
                write!(f, "destination is not a decompression target of the source format")
            }
            Self::SourceTooSmall => write!(f, "source data is too small"),
            Self::DestinationTooSmall => write!(f, "destination is too small"),
        }
    }
}

impl core::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Encoding descriptors
// ---------------------------------------------------------------------------

/// Numeric interpretation of a stored channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Unorm,
    Snorm,
    Uint,
    Sint,
    Float,
    /// 8-bit unorm with the sRGB curve on color channels.
    Srgb,
}

const R: &[usize] = &[0];
const RG: &[usize] = &[0, 1];
const RGBA: &[usize] = &[0, 1, 2, 3];
const BGRA: &[usize] = &[2, 1, 0, 3];

/// How a format's bytes map to samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    Undefined,
    /// One `width`-byte channel per entry of `order`, which names the
    /// sample component (`0..4` = r, g, b, a) each stored channel feeds.
    Plain {
        channel: Channel,
        width: usize,
        order: &'static [usize],
    },
    R4G4,
    R5G6B5,
    DepthStencil,
    Block(BcKind),
}

const fn plain(channel: Channel, width: usize, order: &'static [usize]) -> Encoding {
    Encoding::Plain {
        channel,
        width,
        order,
    }
}

const fn encoding(format: Format) -> Encoding {
    use Channel::*;
    match format {
        Format::Undefined => Encoding::Undefined,
        Format::R4G4UnormPack8 => Encoding::R4G4,
        Format::R5G6B5UnormPack16 => Encoding::R5G6B5,
        Format::R8Unorm => plain(Unorm, 1, R),
        Format::R8Snorm => plain(Snorm, 1, R),
        Format::R8Uint => plain(Uint, 1, R),
        Format::R8Sint => plain(Sint, 1, R),
        Format::Rg8Unorm => plain(Unorm, 1, RG),
        Format::Rgba8Unorm => plain(Unorm, 1, RGBA),
        Format::Rgba8Snorm => plain(Snorm, 1, RGBA),
        Format::Rgba8Uint => plain(Uint, 1, RGBA),
        Format::Rgba8Sint => plain(Sint, 1, RGBA),
        Format::Rgba8Srgb => plain(Srgb, 1, RGBA),
        Format::Bgra8Unorm => plain(Unorm, 1, BGRA),
        Format::Bgra8Srgb => plain(Srgb, 1, BGRA),
        Format::R16Unorm => plain(Unorm, 2, R),
        Format::R16Uint => plain(Uint, 2, R),
        Format::R16Sint => plain(Sint, 2, R),
        Format::R16Float => plain(Float, 2, R),
        Format::Rg16Float => plain(Float, 2, RG),
        Format::Rgba16Unorm => plain(Unorm, 2, RGBA),
        Format::Rgba16Float => plain(Float, 2, RGBA),
        Format::R32Uint => plain(Uint, 4, R),
        Format::R32Sint => plain(Sint, 4, R),
        Format::R32Float => plain(Float, 4, R),
        Format::Rg32Float => plain(Float, 4, RG),
        Format::Rgba32Uint => plain(Uint, 4, RGBA),
        Format::Rgba32Float => plain(Float, 4, RGBA),
        Format::D16Unorm | Format::D32Float | Format::D24UnormS8Uint | Format::S8Uint => {
            Encoding::DepthStencil
        }
        Format::Bc1RgbaUnorm | Format::Bc1RgbaSrgb => Encoding::Block(BcKind::Bc1),
        Format::Bc2Unorm => Encoding::Block(BcKind::Bc2),
        Format::Bc3Unorm | Format::Bc3Srgb => Encoding::Block(BcKind::Bc3),
        Format::Bc4Unorm => Encoding::Block(BcKind::Bc4),
        Format::Bc5Unorm => Encoding::Block(BcKind::Bc5),
    }
}

// ---------------------------------------------------------------------------
// BlockSampler
// ---------------------------------------------------------------------------

/// Decodes blocks of one format into [`Sample`]s.
#[derive(Clone, Copy, Debug)]
pub struct BlockSampler {
    format: Format,
    info: FormatInfo,
    encoding: Encoding,
}

impl BlockSampler {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            info: format.info(),
            encoding: encoding(format),
        }
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Texels covered by one block.
    #[inline]
    pub fn block_extent(&self) -> Extent {
        self.info.block_extent
    }

    #[inline]
    pub fn block_byte_size(&self) -> usize {
        self.info.block_byte_size as usize
    }

    #[inline]
    pub fn block_texel_count(&self) -> usize {
        self.info.block_texel_count()
    }

    /// Decode the block starting at `block[0]` into `out`, row-major.
    ///
    /// # Errors
    ///
    /// - [`CodecError::InvalidFormat`] for an undefined format
    /// - [`CodecError::DepthStencilUnsupported`] for depth/stencil formats
    /// - [`CodecError::DestinationTooSmall`] if `out` holds fewer than
    ///   [`block_texel_count`](Self::block_texel_count) samples
    /// - [`CodecError::SourceTooSmall`] if `block` is shorter than a block
    pub fn decode_block(&self, block: &[u8], out: &mut [Sample]) -> Result<(), CodecError> {
        match self.encoding {
            Encoding::Undefined => return Err(CodecError::InvalidFormat),
            Encoding::DepthStencil => return Err(CodecError::DepthStencilUnsupported),
            _ => {}
        }
        if out.len() < self.block_texel_count() {
            return Err(CodecError::DestinationTooSmall);
        }
        let block = block
            .get(..self.block_byte_size())
            .ok_or(CodecError::SourceTooSmall)?;

        match self.encoding {
            Encoding::Plain {
                channel,
                width,
                order,
            } => {
                out[0] = decode_plain(channel, width, order, block);
            }
            Encoding::R4G4 => {
                let v = block[0];
                out[0] = rgba((v >> 4) as f64 / 15.0, (v & 0xf) as f64 / 15.0, 0.0, 1.0);
            }
            Encoding::R5G6B5 => {
                let v = u16::from_le_bytes([block[0], block[1]]);
                out[0] = rgba(
                    (v >> 11) as f64 / 31.0,
                    ((v >> 5) & 0x3f) as f64 / 63.0,
                    (v & 0x1f) as f64 / 31.0,
                    1.0,
                );
            }
            Encoding::Block(kind) => {
                let texels = bc::decode_block(kind, block).ok_or(CodecError::SourceTooSmall)?;
                for (sample, texel) in out.iter_mut().zip(texels) {
                    let unorm = |v: u8| v as f64 / 255.0;
                    let color = |v: u8| {
                        if self.info.srgb {
                            srgb_to_linear(unorm(v))
                        } else {
                            unorm(v)
                        }
                    };
                    *sample = rgba(color(texel[0]), color(texel[1]), color(texel[2]), unorm(texel[3]));
                }
            }
            Encoding::Undefined | Encoding::DepthStencil => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TexelWriter
// ---------------------------------------------------------------------------

/// Encodes single texels of an uncompressed format.
#[derive(Clone, Copy, Debug)]
pub struct TexelWriter {
    format: Format,
    info: FormatInfo,
    encoding: Encoding,
}

impl TexelWriter {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            info: format.info(),
            encoding: encoding(format),
        }
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Whether [`write`](Self::write) can succeed for this format.
    #[inline]
    pub fn is_writeable(&self) -> bool {
        self.info.writeable
    }

    /// Bytes written per texel.
    #[inline]
    pub fn texel_byte_size(&self) -> usize {
        self.info.block_byte_size as usize
    }

    /// Encode `sample` into the first [`texel_byte_size`](Self::texel_byte_size)
    /// bytes of `dest`. Values outside the format's range are clamped.
    ///
    /// # Errors
    ///
    /// [`CodecError::FormatNotWriteable`] for compressed, depth/stencil and
    /// undefined formats; [`CodecError::DestinationTooSmall`] if `dest` is
    /// shorter than one texel.
    pub fn write(&self, sample: Sample, dest: &mut [u8]) -> Result<(), CodecError> {
        if !self.info.writeable {
            return Err(CodecError::FormatNotWriteable);
        }
        let dest = dest
            .get_mut(..self.texel_byte_size())
            .ok_or(CodecError::DestinationTooSmall)?;

        match self.encoding {
            Encoding::Plain {
                channel,
                width,
                order,
            } => {
                for (i, &component) in order.iter().enumerate() {
                    let bits = encode_channel(channel, width, get(&sample, component), component == 3);
                    dest[i * width..(i + 1) * width].copy_from_slice(&bits.to_le_bytes()[..width]);
                }
            }
            Encoding::R4G4 => {
                let r = unorm_bits(sample.r, 15.0) as u8;
                let g = unorm_bits(sample.g, 15.0) as u8;
                dest[0] = (r << 4) | g;
            }
            Encoding::R5G6B5 => {
                let r = unorm_bits(sample.r, 31.0) as u16;
                let g = unorm_bits(sample.g, 63.0) as u16;
                let b = unorm_bits(sample.b, 31.0) as u16;
                dest.copy_from_slice(&((r << 11) | (g << 5) | b).to_le_bytes());
            }
            Encoding::Undefined | Encoding::DepthStencil | Encoding::Block(_) => {
                return Err(CodecError::FormatNotWriteable);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bulk decompression
// ---------------------------------------------------------------------------

/// Decompress a whole block-compressed surface of `extent` texels.
///
/// `blocks` holds the surface's blocks row-major, slice by slice. `dest`
/// receives tightly packed texels of `dest_format`, which must be one of
/// the source format's decompression targets. Texels of partial edge
/// blocks that fall outside `extent` are dropped.
///
/// # Errors
///
/// [`CodecError::FormatNotDecompressible`],
/// [`CodecError::UnsupportedDecompressionTarget`],
/// [`CodecError::SourceTooSmall`] or [`CodecError::DestinationTooSmall`].
pub fn decompress(
    format: Format,
    blocks: &[u8],
    extent: Extent,
    dest_format: Format,
    dest: &mut [u8],
) -> Result<(), CodecError> {
    let info = format.info();
    let Encoding::Block(kind) = encoding(format) else {
        return Err(CodecError::FormatNotDecompressible);
    };
    if !info.decompresses_to(dest_format) {
        return Err(CodecError::UnsupportedDecompressionTarget);
    }

    let block_bytes = kind.block_bytes();
    let texel_bytes = dest_format.info().block_byte_size as usize;
    let channels = kind.channels().min(texel_bytes);
    let swap_red_blue = matches!(dest_format, Format::Bgra8Unorm | Format::Bgra8Srgb);

    let grid = extent.div_ceil(info.block_extent);
    if (blocks.len() as u64) < grid.volume() * block_bytes as u64 {
        return Err(CodecError::SourceTooSmall);
    }
    if (dest.len() as u64) < extent.volume() * texel_bytes as u64 {
        return Err(CodecError::DestinationTooSmall);
    }

    let (width, height) = (extent.x as usize, extent.y as usize);
    let mut block_index = 0usize;
    for z in 0..extent.z as usize {
        for by in 0..grid.y as usize {
            for bx in 0..grid.x as usize {
                let start = block_index * block_bytes;
                block_index += 1;
                let texels = bc::decode_block(kind, &blocks[start..])
                    .ok_or(CodecError::SourceTooSmall)?;
                for (i, texel) in texels.iter().enumerate() {
                    let x = bx * 4 + i % 4;
                    let y = by * 4 + i / 4;
                    if x >= width || y >= height {
                        continue;
                    }
                    let offset = ((z * height + y) * width + x) * texel_bytes;
                    let out = &mut dest[offset..offset + channels];
                    out.copy_from_slice(&texel[..channels]);
                    if swap_red_blue {
                        out.swap(0, 2);
                    }
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[inline]
const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Sample {
    Rgba { r, g, b, a }
}

#[inline]
fn get(sample: &Sample, component: usize) -> f64 {
    match component {
        0 => sample.r,
        1 => sample.g,
        2 => sample.b,
        _ => sample.a,
    }
}

#[inline]
fn set(sample: &mut Sample, component: usize, value: f64) {
    match component {
        0 => sample.r = value,
        1 => sample.g = value,
        2 => sample.b = value,
        _ => sample.a = value,
    }
}

fn decode_plain(channel: Channel, width: usize, order: &[usize], bytes: &[u8]) -> Sample {
    let mut sample = DEFAULT_CLEAR_COLOR;
    for (i, &component) in order.iter().enumerate() {
        let bits = read_le(&bytes[i * width..(i + 1) * width]);
        set(&mut sample, component, decode_channel(channel, width, bits, component == 3));
    }
    sample
}

fn read_le(bytes: &[u8]) -> u32 {
    bytes.iter().rev().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Largest unsigned value of a `width`-byte channel.
fn unsigned_max(width: usize) -> f64 {
    ((1u64 << (8 * width)) - 1) as f64
}

/// Largest signed value of a `width`-byte channel.
fn signed_max(width: usize) -> f64 {
    ((1u64 << (8 * width - 1)) - 1) as f64
}

fn sign_extend(bits: u32, width: usize) -> i32 {
    let shift = 32 - 8 * width as u32;
    ((bits << shift) as i32) >> shift
}

fn decode_channel(channel: Channel, width: usize, bits: u32, alpha: bool) -> f64 {
    match channel {
        Channel::Unorm => bits as f64 / unsigned_max(width),
        Channel::Snorm => (sign_extend(bits, width) as f64 / signed_max(width)).max(-1.0),
        Channel::Uint => bits as f64,
        Channel::Sint => sign_extend(bits, width) as f64,
        Channel::Float => match width {
            2 => f16::from_bits(bits as u16).to_f64(),
            _ => f32::from_bits(bits) as f64,
        },
        Channel::Srgb => {
            let v = bits as f64 / 255.0;
            if alpha { v } else { srgb_to_linear(v) }
        }
    }
}

fn encode_channel(channel: Channel, width: usize, value: f64, alpha: bool) -> u32 {
    let mask = if width >= 4 {
        u32::MAX
    } else {
        (1u32 << (8 * width)) - 1
    };
    match channel {
        Channel::Unorm => unorm_bits(value, unsigned_max(width)),
        Channel::Snorm => {
            let max = signed_max(width);
            ((value.clamp(-1.0, 1.0) * max).round() as i32 as u32) & mask
        }
        Channel::Uint => value.round().clamp(0.0, unsigned_max(width)) as u32,
        Channel::Sint => {
            let max = signed_max(width);
            (value.round().clamp(-max - 1.0, max) as i32 as u32) & mask
        }
        Channel::Float => match width {
            2 => f16::from_f64(value).to_bits() as u32,
            _ => (value as f32).to_bits(),
        },
        Channel::Srgb => {
            let v = if alpha { value } else { linear_to_srgb(value) };
            unorm_bits(v, 255.0)
        }
    }
}

fn unorm_bits(value: f64, max: f64) -> u32 {
    (value.clamp(0.0, 1.0) * max).round() as u32
}

fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
