//! Pixel formats and their block geometry.
//!
//! [`Format`] is the closed set of formats the crate can lay out, and
//! [`FormatInfo`] answers the geometry questions the layout engine and
//! the algorithms ask: block extent, block byte size, and which codec
//! paths (write, decompress) exist for the format.

use core::fmt;

use crate::params::Extent;

/// Supported pixel formats.
///
/// Names follow the usual `CHANNELS_TYPE` convention, with `Pack` formats
/// storing all channels in one little-endian word and `Bc*` formats
/// storing 4x4 texel blocks.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    #[default]
    Undefined,
    R4G4UnormPack8,
    R5G6B5UnormPack16,
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    Rgba8Srgb,
    Bgra8Unorm,
    Bgra8Srgb,
    R16Unorm,
    R16Uint,
    R16Sint,
    R16Float,
    Rg16Float,
    Rgba16Unorm,
    Rgba16Float,
    R32Uint,
    R32Sint,
    R32Float,
    Rg32Float,
    Rgba32Uint,
    Rgba32Float,
    D16Unorm,
    D32Float,
    D24UnormS8Uint,
    S8Uint,
    Bc1RgbaUnorm,
    Bc1RgbaSrgb,
    Bc2Unorm,
    Bc3Unorm,
    Bc3Srgb,
    Bc4Unorm,
    Bc5Unorm,
}

impl Format {
    /// Every defined format, in declaration order.
    pub const ALL: &'static [Format] = &[
        Format::R4G4UnormPack8,
        Format::R5G6B5UnormPack16,
        Format::R8Unorm,
        Format::R8Snorm,
        Format::R8Uint,
        Format::R8Sint,
        Format::Rg8Unorm,
        Format::Rgba8Unorm,
        Format::Rgba8Snorm,
        Format::Rgba8Uint,
        Format::Rgba8Sint,
        Format::Rgba8Srgb,
        Format::Bgra8Unorm,
        Format::Bgra8Srgb,
        Format::R16Unorm,
        Format::R16Uint,
        Format::R16Sint,
        Format::R16Float,
        Format::Rg16Float,
        Format::Rgba16Unorm,
        Format::Rgba16Float,
        Format::R32Uint,
        Format::R32Sint,
        Format::R32Float,
        Format::Rg32Float,
        Format::Rgba32Uint,
        Format::Rgba32Float,
        Format::D16Unorm,
        Format::D32Float,
        Format::D24UnormS8Uint,
        Format::S8Uint,
        Format::Bc1RgbaUnorm,
        Format::Bc1RgbaSrgb,
        Format::Bc2Unorm,
        Format::Bc3Unorm,
        Format::Bc3Srgb,
        Format::Bc4Unorm,
        Format::Bc5Unorm,
    ];

    /// Canonical upper-case name, e.g. `"R8G8B8A8_UNORM"`.
    pub const fn name(self) -> &'static str {
        match self {
            Format::Undefined => "UNDEFINED",
            Format::R4G4UnormPack8 => "R4G4_UNORM_PACK8",
            Format::R5G6B5UnormPack16 => "R5G6B5_UNORM_PACK16",
            Format::R8Unorm => "R8_UNORM",
            Format::R8Snorm => "R8_SNORM",
            Format::R8Uint => "R8_UINT",
            Format::R8Sint => "R8_SINT",
            Format::Rg8Unorm => "R8G8_UNORM",
            Format::Rgba8Unorm => "R8G8B8A8_UNORM",
            Format::Rgba8Snorm => "R8G8B8A8_SNORM",
            Format::Rgba8Uint => "R8G8B8A8_UINT",
            Format::Rgba8Sint => "R8G8B8A8_SINT",
            Format::Rgba8Srgb => "R8G8B8A8_SRGB",
            Format::Bgra8Unorm => "B8G8R8A8_UNORM",
            Format::Bgra8Srgb => "B8G8R8A8_SRGB",
            Format::R16Unorm => "R16_UNORM",
            Format::R16Uint => "R16_UINT",
            Format::R16Sint => "R16_SINT",
            Format::R16Float => "R16_SFLOAT",
            Format::Rg16Float => "R16G16_SFLOAT",
            Format::Rgba16Unorm => "R16G16B16A16_UNORM",
            Format::Rgba16Float => "R16G16B16A16_SFLOAT",
            Format::R32Uint => "R32_UINT",
            Format::R32Sint => "R32_SINT",
            Format::R32Float => "R32_SFLOAT",
            Format::Rg32Float => "R32G32_SFLOAT",
            Format::Rgba32Uint => "R32G32B32A32_UINT",
            Format::Rgba32Float => "R32G32B32A32_SFLOAT",
            Format::D16Unorm => "D16_UNORM",
            Format::D32Float => "D32_SFLOAT",
            Format::D24UnormS8Uint => "D24_UNORM_S8_UINT",
            Format::S8Uint => "S8_UINT",
            Format::Bc1RgbaUnorm => "BC1_RGBA_UNORM_BLOCK",
            Format::Bc1RgbaSrgb => "BC1_RGBA_SRGB_BLOCK",
            Format::Bc2Unorm => "BC2_UNORM_BLOCK",
            Format::Bc3Unorm => "BC3_UNORM_BLOCK",
            Format::Bc3Srgb => "BC3_SRGB_BLOCK",
            Format::Bc4Unorm => "BC4_UNORM_BLOCK",
            Format::Bc5Unorm => "BC5_UNORM_BLOCK",
        }
    }

    /// Look up a format by its canonical name (case-insensitive).
    ///
    /// Returns `None` for unknown names and for `"UNDEFINED"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.name().eq_ignore_ascii_case(name))
    }

    /// Block geometry and codec capabilities.
    pub const fn info(self) -> FormatInfo {
        match self {
            Format::Undefined => FormatInfo::UNDEFINED,
            Format::R4G4UnormPack8
            | Format::R8Unorm
            | Format::R8Snorm
            | Format::R8Uint
            | Format::R8Sint => FormatInfo::plain(1),
            Format::R5G6B5UnormPack16
            | Format::Rg8Unorm
            | Format::R16Unorm
            | Format::R16Uint
            | Format::R16Sint
            | Format::R16Float => FormatInfo::plain(2),
            Format::Rgba8Unorm
            | Format::Rgba8Snorm
            | Format::Rgba8Uint
            | Format::Rgba8Sint
            | Format::Bgra8Unorm
            | Format::Rg16Float
            | Format::R32Uint
            | Format::R32Sint
            | Format::R32Float => FormatInfo::plain(4),
            Format::Rgba8Srgb | Format::Bgra8Srgb => FormatInfo::plain(4).srgb(),
            Format::Rgba16Unorm | Format::Rgba16Float | Format::Rg32Float => FormatInfo::plain(8),
            Format::Rgba32Uint | Format::Rgba32Float => FormatInfo::plain(16),
            Format::D16Unorm => FormatInfo::depth_stencil(2, true, false),
            Format::D32Float => FormatInfo::depth_stencil(4, true, false),
            Format::D24UnormS8Uint => FormatInfo::depth_stencil(4, true, true),
            Format::S8Uint => FormatInfo::depth_stencil(1, false, true),
            Format::Bc1RgbaUnorm => FormatInfo::bc(8, Format::Rgba8Unorm, Format::Bgra8Unorm),
            Format::Bc1RgbaSrgb => FormatInfo::bc(8, Format::Rgba8Srgb, Format::Bgra8Srgb).srgb(),
            Format::Bc2Unorm | Format::Bc3Unorm => {
                FormatInfo::bc(16, Format::Rgba8Unorm, Format::Bgra8Unorm)
            }
            Format::Bc3Srgb => FormatInfo::bc(16, Format::Rgba8Srgb, Format::Bgra8Srgb).srgb(),
            Format::Bc4Unorm => FormatInfo::bc(8, Format::R8Unorm, Format::Undefined),
            Format::Bc5Unorm => FormatInfo::bc(16, Format::Rg8Unorm, Format::Undefined),
        }
    }

    /// Shorthand for `self.info().compressed`.
    #[inline]
    pub const fn is_compressed(self) -> bool {
        self.info().compressed
    }

    /// Whether the format stores depth or stencil.
    #[inline]
    pub const fn is_depth_stencil(self) -> bool {
        let info = self.info();
        info.depth || info.stencil
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// FormatInfo
// ---------------------------------------------------------------------------

/// Block geometry and codec capabilities of a [`Format`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct FormatInfo {
    /// Texels covered by one block. `1x1x1` for uncompressed formats.
    pub block_extent: Extent,
    /// Bytes per block.
    pub block_byte_size: u32,
    /// Block-compressed.
    pub compressed: bool,
    /// A per-texel encoder exists.
    pub writeable: bool,
    /// A bulk decompressor exists.
    pub decompressible: bool,
    /// Stores depth.
    pub depth: bool,
    /// Stores stencil.
    pub stencil: bool,
    /// Color channels use the sRGB transfer curve.
    pub srgb: bool,
    /// Primary decompression target, or [`Format::Undefined`].
    pub decompressed_format: Format,
    /// Alternate decompression target, or [`Format::Undefined`].
    pub decompressed_format_alt: Format,
}

impl FormatInfo {
    const UNDEFINED: Self = Self {
        block_extent: Extent::ONE,
        block_byte_size: 0,
        compressed: false,
        writeable: false,
        decompressible: false,
        depth: false,
        stencil: false,
        srgb: false,
        decompressed_format: Format::Undefined,
        decompressed_format_alt: Format::Undefined,
    };

    const fn plain(block_byte_size: u32) -> Self {
        Self {
            block_byte_size,
            writeable: true,
            ..Self::UNDEFINED
        }
    }

    const fn depth_stencil(block_byte_size: u32, depth: bool, stencil: bool) -> Self {
        Self {
            block_byte_size,
            depth,
            stencil,
            ..Self::UNDEFINED
        }
    }

    const fn bc(block_byte_size: u32, decompressed: Format, alt: Format) -> Self {
        Self {
            block_extent: Extent::new(4, 4, 1),
            block_byte_size,
            compressed: true,
            decompressible: true,
            decompressed_format: decompressed,
            decompressed_format_alt: alt,
            ..Self::UNDEFINED
        }
    }

    const fn srgb(self) -> Self {
        Self { srgb: true, ..self }
    }

    /// Texels per block.
    #[inline]
    pub const fn block_texel_count(&self) -> usize {
        (self.block_extent.x * self.block_extent.y * self.block_extent.z) as usize
    }

    /// Whether `format` is one of the allowed decompression targets.
    pub fn decompresses_to(&self, format: Format) -> bool {
        self.decompressible
            && format != Format::Undefined
            && (format == self.decompressed_format || format == self.decompressed_format_alt)
    }

    /// Whether every block is a single texel.
    #[inline]
    pub const fn is_single_texel_block(&self) -> bool {
        self.block_extent.x == 1 && self.block_extent.y == 1 && self.block_extent.z == 1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
