//! Texture creation parameters.
//!
//! [`TextureParams`] describes everything needed to lay out a texture:
//! format, [`TextureDimension`], base [`Extent`], array size, faces,
//! mips and the per-surface byte alignment. Build one with
//! [`TextureParams::new`] and adjust it with the `with_*` methods.

use core::fmt;

use crate::format::Format;

/// Largest extent component a texture is expected to have on any axis.
pub const MAX_EXTENT_COMPONENT: u32 = 16384;

/// Longest mip chain the layout engine reserves for (`log2(16384) + 1`).
pub const MAX_MIP_COUNT: u32 = 15;

/// Default byte alignment of every surface inside the packed allocation.
pub const DEFAULT_SURFACE_BYTE_ALIGNMENT: u32 = 4;

// ---------------------------------------------------------------------------
// Extent
// ---------------------------------------------------------------------------

/// Three-axis size (or coordinate) in texels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Extent {
    /// All axes zero. Neutral value returned by queries on empty textures.
    pub const ZERO: Self = Self::new(0, 0, 0);
    /// All axes one.
    pub const ONE: Self = Self::new(1, 1, 1);

    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// 2D extent with `z = 1`.
    #[inline]
    pub const fn new_2d(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Number of texels (`x * y * z`).
    #[inline]
    pub const fn volume(self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    /// Per-axis ceiling division, used to count blocks covering an extent.
    #[inline]
    pub const fn div_ceil(self, block: Extent) -> Self {
        Self {
            x: self.x.div_ceil(block.x),
            y: self.y.div_ceil(block.y),
            z: self.z.div_ceil(block.z),
        }
    }

    /// Whether every axis is a multiple of the matching `block` axis.
    #[inline]
    pub const fn is_multiple_of(self, block: Extent) -> bool {
        self.x % block.x == 0 && self.y % block.y == 0 && self.z % block.z == 0
    }

    /// Per-axis `max`.
    #[inline]
    pub fn max(self, other: Extent) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Whether `self + size` stays within `bounds` on every axis.
    pub(crate) fn fits_within(self, size: Extent, bounds: Extent) -> bool {
        let fits = |offset: u32, len: u32, bound: u32| {
            offset.checked_add(len).is_some_and(|end| end <= bound)
        };
        fits(self.x, size.x, bounds.x) && fits(self.y, size.y, bounds.y) && fits(self.z, size.z, bounds.z)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// TextureDimension
// ---------------------------------------------------------------------------

/// Dimensionality of a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TextureDimension {
    /// One axis; `y` and `z` are always 1.
    #[default]
    Texture1D = 0,
    /// Two axes; `z` is always 1.
    Texture2D = 1,
    /// Three axes, halved together along the mip chain.
    Texture3D = 2,
    /// Six 2D faces per array slice.
    TextureCube = 3,
}

impl TextureDimension {
    /// Whether the `y` axis participates in sizing and mip halving.
    #[inline]
    pub const fn has_y(self) -> bool {
        !matches!(self, Self::Texture1D)
    }

    /// Whether the `z` axis participates in sizing and mip halving.
    #[inline]
    pub const fn has_z(self) -> bool {
        matches!(self, Self::Texture3D)
    }

    /// Short name: `"1D"`, `"2D"`, `"3D"` or `"Cube"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Texture1D => "1D",
            Self::Texture2D => "2D",
            Self::Texture3D => "3D",
            Self::TextureCube => "Cube",
        }
    }

    /// Force axes this dimension doesn't use to 1.
    pub(crate) fn normalize_extent(self, extent: Extent) -> Extent {
        Extent {
            x: extent.x,
            y: if self.has_y() { extent.y } else { 1 },
            z: if self.has_z() { extent.z } else { 1 },
        }
    }

    /// Halve the active axes, flooring each at 1.
    pub(crate) fn next_mip_extent(self, extent: Extent) -> Extent {
        let halve = |v: u32, active: bool| if active { (v / 2).max(1) } else { v.max(1) };
        Extent {
            x: halve(extent.x, true),
            y: halve(extent.y, self.has_y()),
            z: halve(extent.z, self.has_z()),
        }
    }
}

impl fmt::Display for TextureDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TextureParams
// ---------------------------------------------------------------------------

/// Creation parameters for a texture.
///
/// Fields are public so callers can inspect or tweak them directly, but
/// the builder methods cover the common cases:
///
/// ```
/// use cputex::{Extent, Format, TextureDimension, TextureParams};
///
/// let params = TextureParams::new(Format::Rgba8Unorm, TextureDimension::Texture2D, Extent::new_2d(256, 128))
///     .with_array_size(4)
///     .with_full_mip_chain();
/// assert_eq!(params.mips, 9);
/// ```
///
/// Validation happens when a texture is built from the params, not here.
/// Invalid params yield an empty texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureParams {
    /// Pixel format of every surface.
    pub format: Format,
    /// Texture dimensionality.
    pub dimension: TextureDimension,
    /// Extent of mip 0.
    pub extent: Extent,
    /// Number of array slices.
    pub array_size: u32,
    /// Number of faces per slice (6 for cube textures).
    pub faces: u32,
    /// Requested mip count. The effective count may be smaller.
    pub mips: u32,
    /// Byte alignment of every surface. `0` is treated as `1`.
    pub surface_byte_alignment: u32,
}

impl TextureParams {
    /// Single-slice, single-mip params. Cube textures get six faces.
    pub fn new(format: Format, dimension: TextureDimension, extent: Extent) -> Self {
        Self {
            format,
            dimension,
            extent,
            array_size: 1,
            faces: if dimension == TextureDimension::TextureCube { 6 } else { 1 },
            mips: 1,
            surface_byte_alignment: DEFAULT_SURFACE_BYTE_ALIGNMENT,
        }
    }

    /// Set the number of array slices.
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    /// Set the number of faces per slice.
    pub fn with_faces(mut self, faces: u32) -> Self {
        self.faces = faces;
        self
    }

    /// Set the requested mip count.
    pub fn with_mips(mut self, mips: u32) -> Self {
        self.mips = mips;
        self
    }

    /// Request a complete mip chain down to 1x1x1.
    pub fn with_full_mip_chain(mut self) -> Self {
        self.mips = max_mips(self.dimension.normalize_extent(self.extent));
        self
    }

    /// Set the surface byte alignment.
    pub fn with_surface_byte_alignment(mut self, alignment: u32) -> Self {
        self.surface_byte_alignment = alignment;
        self
    }

    /// Replace the base extent.
    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = extent;
        self
    }
}

/// Number of mips in a full chain for `extent`: `floor(log2(max axis)) + 1`.
///
/// Returns 0 for an all-zero extent.
pub fn max_mips(extent: Extent) -> u32 {
    let largest = extent.x.max(extent.y).max(extent.z);
    if largest == 0 { 0 } else { largest.ilog2() + 1 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
