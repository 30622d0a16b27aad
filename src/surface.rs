//! Minimal surface descriptors.
//!
//! [`SurfaceView`] and [`SurfaceSpan`] carry only a format, a packed
//! extent and the surface bytes. An extent axis of `0` means the axis is
//! absent, which is how the descriptor remembers whether it is 1D, 2D or
//! 3D. Format-agnostic algorithms ([`ops`](crate::ops),
//! [`Converter`](crate::Converter)) take these descriptors, and every
//! texture surface accessor converts into one.

use core::fmt;

use crate::format::Format;
use crate::params::{Extent, TextureDimension};
use crate::storage::volume_slice_byte_size;
use crate::view::{TextureSurfaceSpan, TextureSurfaceView};

/// Pack `extent` so axes `dimension` doesn't use read as zero.
fn pack_extent(dimension: TextureDimension, extent: Extent) -> Extent {
    match dimension {
        TextureDimension::Texture1D => Extent::new(extent.x, 0, 0),
        TextureDimension::Texture2D | TextureDimension::TextureCube => Extent::new(extent.x, extent.y, 0),
        TextureDimension::Texture3D => extent,
    }
}

fn packed_dimension(packed: Extent) -> TextureDimension {
    if packed.z != 0 {
        TextureDimension::Texture3D
    } else if packed.y != 0 {
        TextureDimension::Texture2D
    } else {
        TextureDimension::Texture1D
    }
}

fn unpack_extent(packed: Extent) -> Extent {
    Extent::new(packed.x, packed.y.max(1), packed.z.max(1))
}

/// Unpadded bytes of a whole surface.
fn surface_byte_size(format: Format, extent: Extent) -> usize {
    if format == Format::Undefined || extent.x == 0 {
        return 0;
    }
    let info = format.info();
    let blocks = extent.div_ceil(info.block_extent).volume();
    usize::try_from(blocks * info.block_byte_size as u64).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// SurfaceView
// ---------------------------------------------------------------------------

/// Read-only surface descriptor: format, packed extent and bytes.
#[derive(Clone, Copy, Default)]
pub struct SurfaceView<'a> {
    format: Format,
    packed: Extent,
    data: &'a [u8],
}

impl<'a> SurfaceView<'a> {
    /// Describe `data` as one surface. Cube surfaces are described as 2D.
    pub fn new(format: Format, dimension: TextureDimension, extent: Extent, data: &'a [u8]) -> Self {
        Self {
            format,
            packed: pack_extent(dimension, extent),
            data,
        }
    }

    /// No format, no extent or no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.format == Format::Undefined || self.packed.x == 0 || self.data.is_empty()
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Extent with absent axes reported as 1.
    #[inline]
    pub fn extent(&self) -> Extent {
        unpack_extent(self.packed)
    }

    /// Extent with absent axes reported as 0.
    #[inline]
    pub fn packed_extent(&self) -> Extent {
        self.packed
    }

    /// Dimension recovered from the absent axes.
    #[inline]
    pub fn dimension(&self) -> TextureDimension {
        packed_dimension(self.packed)
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes the surface's blocks occupy, without padding.
    pub fn size_in_bytes(&self) -> usize {
        surface_byte_size(self.format, self.extent())
    }

    /// Bytes of one depth slice.
    pub fn volume_slice_byte_size(&self) -> usize {
        if self.format == Format::Undefined {
            return 0;
        }
        volume_slice_byte_size(self.format, self.extent())
    }

    /// Depth slice `volume_slice` as a 2D descriptor. Non-3D surfaces only
    /// have slice 0, which is the surface itself. Empty out of range.
    pub fn volume_slice(&self, volume_slice: u32) -> SurfaceView<'a> {
        match volume_slice_range(self.format, self.packed, volume_slice, self.data.len()) {
            Some((packed, range)) => SurfaceView {
                format: self.format,
                packed,
                data: &self.data[range],
            },
            None => SurfaceView::default(),
        }
    }

    /// Same format and [`equivalent_dimensions`](Self::equivalent_dimensions).
    pub fn equivalent_layout(&self, other: SurfaceView<'_>) -> bool {
        self.format == other.format && self.equivalent_dimensions(other)
    }

    /// Same packed extent, which also means the same dimension.
    pub fn equivalent_dimensions(&self, other: SurfaceView<'_>) -> bool {
        self.packed == other.packed
    }
}

impl fmt::Debug for SurfaceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SurfaceView({} {} {}, {} bytes)",
            self.dimension(),
            self.format,
            self.extent(),
            self.data.len()
        )
    }
}

// ---------------------------------------------------------------------------
// SurfaceSpan
// ---------------------------------------------------------------------------

/// Mutable surface descriptor: format, packed extent and bytes.
#[derive(Default)]
pub struct SurfaceSpan<'a> {
    format: Format,
    packed: Extent,
    data: &'a mut [u8],
}

impl<'a> SurfaceSpan<'a> {
    /// Describe `data` as one mutable surface. Cube surfaces are described as 2D.
    pub fn new(format: Format, dimension: TextureDimension, extent: Extent, data: &'a mut [u8]) -> Self {
        Self {
            format,
            packed: pack_extent(dimension, extent),
            data,
        }
    }

    /// Read-only descriptor for the duration of the borrow.
    #[inline]
    pub fn as_view(&self) -> SurfaceView<'_> {
        SurfaceView {
            format: self.format,
            packed: self.packed,
            data: &*self.data,
        }
    }

    /// Shorter-lived span over the same bytes.
    #[inline]
    pub fn reborrow(&mut self) -> SurfaceSpan<'_> {
        SurfaceSpan {
            format: self.format,
            packed: self.packed,
            data: &mut *self.data,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_view().is_empty()
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        unpack_extent(self.packed)
    }

    #[inline]
    pub fn packed_extent(&self) -> Extent {
        self.packed
    }

    #[inline]
    pub fn dimension(&self) -> TextureDimension {
        packed_dimension(self.packed)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.as_view().size_in_bytes()
    }

    pub fn volume_slice_byte_size(&self) -> usize {
        self.as_view().volume_slice_byte_size()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &*self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Surface bytes for the full lifetime of the span.
    #[inline]
    pub fn into_data(self) -> &'a mut [u8] {
        self.data
    }

    /// Depth slice `volume_slice` as a mutable 2D descriptor; empty out of range.
    pub fn volume_slice_mut(&mut self, volume_slice: u32) -> SurfaceSpan<'_> {
        self.reborrow().into_volume_slice(volume_slice)
    }

    /// Like [`volume_slice_mut`](Self::volume_slice_mut), consuming the span.
    pub fn into_volume_slice(self, volume_slice: u32) -> SurfaceSpan<'a> {
        match volume_slice_range(self.format, self.packed, volume_slice, self.data.len()) {
            Some((packed, range)) => SurfaceSpan {
                format: self.format,
                packed,
                data: &mut self.data[range],
            },
            None => SurfaceSpan::default(),
        }
    }

    pub fn equivalent_layout(&self, other: SurfaceView<'_>) -> bool {
        self.as_view().equivalent_layout(other)
    }

    pub fn equivalent_dimensions(&self, other: SurfaceView<'_>) -> bool {
        self.as_view().equivalent_dimensions(other)
    }
}

impl fmt::Debug for SurfaceSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

/// Packed extent and byte range of one depth slice.
fn volume_slice_range(
    format: Format,
    packed: Extent,
    volume_slice: u32,
    len: usize,
) -> Option<(Extent, core::ops::Range<usize>)> {
    if format == Format::Undefined || packed.x == 0 {
        return None;
    }
    if packed.z == 0 {
        return (volume_slice == 0).then_some((packed, 0..len));
    }
    if volume_slice >= packed.z {
        return None;
    }
    let size = volume_slice_byte_size(format, unpack_extent(packed));
    let start = size * (volume_slice / format.info().block_extent.z) as usize;
    let end = start + size;
    (end <= len).then_some((Extent::new(packed.x, packed.y, 0), start..end))
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl<'a> From<TextureSurfaceView<'a>> for SurfaceView<'a> {
    fn from(surface: TextureSurfaceView<'a>) -> Self {
        if surface.is_empty() {
            return Self::default();
        }
        Self::new(surface.format(), surface.dimension(), surface.extent(), surface.data())
    }
}

impl<'a> From<TextureSurfaceSpan<'a>> for SurfaceSpan<'a> {
    fn from(surface: TextureSurfaceSpan<'a>) -> Self {
        if surface.is_empty() {
            return Self::default();
        }
        let (format, dimension, extent) = (surface.format(), surface.dimension(), surface.extent());
        Self::new(format, dimension, extent, surface.into_data())
    }
}

impl<'a> From<TextureSurfaceSpan<'a>> for SurfaceView<'a> {
    fn from(surface: TextureSurfaceSpan<'a>) -> Self {
        SurfaceView::from(TextureSurfaceView::from(surface))
    }
}

impl<'a> From<SurfaceSpan<'a>> for SurfaceView<'a> {
    fn from(span: SurfaceSpan<'a>) -> Self {
        SurfaceView {
            format: span.format,
            packed: span.packed,
            data: span.data,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
