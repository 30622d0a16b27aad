//! Format-to-format conversion.
//!
//! A [`Converter`] pairs a [`BlockSampler`] for the source format with a
//! [`TexelWriter`] for the destination format. Conversion decodes each
//! source block into wide samples and re-encodes them texel by texel.
//! Block-compressed sources that decompress directly into the destination
//! format take the bulk decompression path instead.

use core::fmt;

use crate::codec::{BlockSampler, CodecError, MAX_BLOCK_TEXEL_COUNT, Sample, TexelWriter};
use crate::format::Format;
use crate::ops;
use crate::params::TextureParams;
use crate::surface::{SurfaceSpan, SurfaceView};
use crate::unique::UniqueTexture;
use crate::view::{TextureSpan, TextureView};

// ---------------------------------------------------------------------------
// ConvertError
// ---------------------------------------------------------------------------

/// Why a conversion failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConvertError {
    /// The source is not in the converter's source format.
    SourceFormatsMismatch,
    /// The destination is not in the converter's destination format.
    DestinationFormatsMismatch,
    /// The destination format cannot be written texel by texel.
    FormatNotWriteable,
    /// Source and destination dimensions differ.
    SourceAndDestinationNotEquivalent,
    /// The source bytes end before its last block.
    SourceTooSmall,
    /// The destination bytes end before its last texel.
    DestinationTooSmall,
    /// Depth and stencil sources cannot be decoded.
    DepthStencilUnsupported,
    /// The source format is undefined or has no decoder.
    InvalidFormat,
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceFormatsMismatch => write!(f, "source is not in the converter's source format"),
            Self::DestinationFormatsMismatch => {
                write!(f, "destination is not in the converter's destination format")
            }
            Self::FormatNotWriteable => write!(f, "destination format is not writeable"),
            Self::SourceAndDestinationNotEquivalent => {
                write!(f, "source and destination dimensions differ")
            }
            Self::SourceTooSmall => write!(f, "source data too small"),
            Self::DestinationTooSmall => write!(f, "destination data too small"),
            Self::DepthStencilUnsupported => write!(f, "depth/stencil formats cannot be converted"),
            Self::InvalidFormat => write!(f, "invalid format"),
        }
    }
}

impl core::error::Error for ConvertError {}

impl From<CodecError> for ConvertError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidFormat | CodecError::FormatNotDecompressible => Self::InvalidFormat,
            CodecError::DepthStencilUnsupported => Self::DepthStencilUnsupported,
            CodecError::FormatNotWriteable => Self::FormatNotWriteable,
            CodecError::UnsupportedDecompressionTarget => Self::DestinationFormatsMismatch,
            CodecError::SourceTooSmall => Self::SourceTooSmall,
            CodecError::DestinationTooSmall => Self::DestinationTooSmall,
        }
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Converts surfaces and textures from one fixed format to another.
///
/// ```
/// use cputex::{Converter, Extent, Format, TextureDimension, TextureParams, UniqueTexture};
///
/// let params = TextureParams::new(Format::Rgba8Unorm, TextureDimension::Texture2D, Extent::new_2d(1, 1));
/// let source = UniqueTexture::with_data(params, &[10, 20, 30, 40]);
///
/// let converter = Converter::new(Format::Rgba8Unorm, Format::Bgra8Unorm);
/// let converted = converter.convert(source.view()).unwrap();
/// assert_eq!(&converted.surface_data(0, 0, 0)[..4], &[30, 20, 10, 40]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Converter {
    sampler: BlockSampler,
    writer: TexelWriter,
}

impl Converter {
    pub fn new(source: Format, dest: Format) -> Self {
        Self {
            sampler: BlockSampler::new(source),
            writer: TexelWriter::new(dest),
        }
    }

    #[inline]
    pub fn source_format(&self) -> Format {
        self.sampler.format()
    }

    #[inline]
    pub fn dest_format(&self) -> Format {
        self.writer.format()
    }

    /// Convert one surface into a fresh single-surface texture of the
    /// destination format.
    ///
    /// # Errors
    ///
    /// See [`convert_surface_to`](Self::convert_surface_to).
    pub fn convert_surface<'a>(&self, source: impl Into<SurfaceView<'a>>) -> Result<UniqueTexture, ConvertError> {
        let source = source.into();
        if source.format() != self.source_format() {
            return Err(ConvertError::SourceFormatsMismatch);
        }
        if source.is_empty() {
            return Err(ConvertError::SourceTooSmall);
        }
        let params = TextureParams::new(self.dest_format(), source.dimension(), source.extent());
        let mut dest = UniqueTexture::new(params);
        if !dest.is_valid() {
            return Err(ConvertError::InvalidFormat);
        }
        self.convert_surface_to(source, dest.surface_mut(0, 0, 0))?;
        Ok(dest)
    }

    /// Convert a whole texture into a fresh texture of the destination
    /// format with identical geometry.
    ///
    /// # Errors
    ///
    /// See [`convert_to`](Self::convert_to).
    pub fn convert(&self, source: TextureView<'_>) -> Result<UniqueTexture, ConvertError> {
        if source.format() != self.source_format() {
            return Err(ConvertError::SourceFormatsMismatch);
        }
        let params = source.params().ok_or(ConvertError::InvalidFormat)?;
        let mut dest = UniqueTexture::new(TextureParams {
            format: self.dest_format(),
            ..params
        });
        if !dest.is_valid() {
            return Err(ConvertError::InvalidFormat);
        }
        self.convert_to(source, dest.span())?;
        Ok(dest)
    }

    /// Convert `source` into the existing surface `dest`.
    ///
    /// Destination texels are tightly packed row-major, slice by slice.
    /// Texels of partial edge blocks that fall outside the source extent
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConvertError`] hit; `dest` may be partially
    /// written.
    pub fn convert_surface_to<'a, 'b>(
        &self,
        source: impl Into<SurfaceView<'a>>,
        dest: impl Into<SurfaceSpan<'b>>,
    ) -> Result<(), ConvertError> {
        let (source, mut dest) = (source.into(), dest.into());
        if source.format() != self.source_format() {
            return Err(ConvertError::SourceFormatsMismatch);
        }
        if dest.format() != self.dest_format() {
            return Err(ConvertError::DestinationFormatsMismatch);
        }

        if self.source_format().info().decompresses_to(dest.format())
            && ops::decompress_surface_to(source, dest.reborrow())
        {
            return Ok(());
        }

        if !self.writer.is_writeable() {
            return Err(ConvertError::FormatNotWriteable);
        }
        if !dest.equivalent_dimensions(source) {
            return Err(ConvertError::SourceAndDestinationNotEquivalent);
        }

        let block = self.sampler.block_extent();
        let block_bytes = self.sampler.block_byte_size();
        let texel_bytes = self.writer.texel_byte_size();
        let extent = source.extent();
        let grid = extent.div_ceil(block);
        let (width, height) = (extent.x as usize, extent.y as usize);
        let src = source.data();
        let dst = dest.data_mut();

        let mut samples = [Sample::default(); MAX_BLOCK_TEXEL_COUNT];
        let mut block_index = 0usize;
        for bz in 0..grid.z {
            for by in 0..grid.y {
                for bx in 0..grid.x {
                    let start = block_index * block_bytes;
                    block_index += 1;
                    let bytes = src.get(start..).ok_or(ConvertError::SourceTooSmall)?;
                    self.sampler.decode_block(bytes, &mut samples)?;

                    for (i, sample) in samples[..self.sampler.block_texel_count()].iter().enumerate() {
                        let i = i as u32;
                        let x = bx * block.x + i % block.x;
                        let y = by * block.y + (i / block.x) % block.y;
                        let z = bz * block.z + i / (block.x * block.y);
                        if x >= extent.x || y >= extent.y || z >= extent.z {
                            continue;
                        }
                        let offset = ((z as usize * height + y as usize) * width + x as usize) * texel_bytes;
                        let out = dst.get_mut(offset..).ok_or(ConvertError::DestinationTooSmall)?;
                        self.writer.write(*sample, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Convert every surface of `source` into the matching surface of
    /// `dest`, which must have equivalent dimensions.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first surface's error.
    pub fn convert_to(&self, source: TextureView<'_>, mut dest: TextureSpan<'_>) -> Result<(), ConvertError> {
        if source.format() != self.source_format() {
            return Err(ConvertError::SourceFormatsMismatch);
        }
        if dest.format() != self.dest_format() {
            return Err(ConvertError::DestinationFormatsMismatch);
        }
        if !self.writer.is_writeable() && !self.source_format().info().decompresses_to(self.dest_format()) {
            return Err(ConvertError::FormatNotWriteable);
        }
        if source.is_empty() || !source.equivalent_dimensions(dest.as_view()) {
            return Err(ConvertError::SourceAndDestinationNotEquivalent);
        }
        for array_slice in 0..source.array_size() {
            for face in 0..source.faces() {
                for mip in 0..source.mips() {
                    self.convert_surface_to(
                        source.surface(array_slice, face, mip),
                        dest.surface_mut(array_slice, face, mip),
                    )
                    .inspect_err(|err| {
                        tracing::debug!(
                            source = %self.source_format(),
                            dest = %self.dest_format(),
                            array_slice,
                            face,
                            mip,
                            %err,
                            "surface conversion failed"
                        );
                    })?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
