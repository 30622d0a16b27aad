//! Borrowed views into a texture allocation.
//!
//! Four accessors cover {whole texture, one surface} x {read, write}:
//!
//! | | read-only | mutable |
//! |---|---|---|
//! | whole texture | [`TextureView`] | [`TextureSpan`] |
//! | one surface | [`TextureSurfaceView`] | [`TextureSurfaceSpan`] |
//!
//! Each holds an optional borrow of the layout plus, for surfaces, the
//! (array slice, face, mip) coordinates. The default value of every
//! accessor is empty; queries on an empty accessor return neutral values
//! (zero counts, [`Extent::ZERO`], [`Format::Undefined`], empty slices).

use core::fmt;

use bytemuck::Pod;

use crate::format::Format;
use crate::params::{Extent, TextureDimension, TextureParams};
use crate::storage::Layout;
use crate::surface::SurfaceView;

// ---------------------------------------------------------------------------
// Delegation macros
// ---------------------------------------------------------------------------

/// Read-only texture queries, delegated to `self.$view()`.
macro_rules! texture_queries {
    ($view:ident) => {
        /// Whether there is no texture behind this handle.
        #[inline]
        pub fn is_empty(&self) -> bool {
            self.$view().is_empty()
        }

        /// Normalized creation params, with the effective mip count.
        #[inline]
        pub fn params(&self) -> Option<$crate::TextureParams> {
            self.$view().params()
        }

        /// Extent of `mip`, or [`Extent::ZERO`](crate::Extent::ZERO) if out of range.
        #[inline]
        pub fn extent(&self, mip: u32) -> $crate::Extent {
            self.$view().extent(mip)
        }

        #[inline]
        pub fn array_size(&self) -> u32 {
            self.$view().array_size()
        }

        #[inline]
        pub fn faces(&self) -> u32 {
            self.$view().faces()
        }

        /// Effective mip count.
        #[inline]
        pub fn mips(&self) -> u32 {
            self.$view().mips()
        }

        #[inline]
        pub fn dimension(&self) -> $crate::TextureDimension {
            self.$view().dimension()
        }

        #[inline]
        pub fn format(&self) -> $crate::Format {
            self.$view().format()
        }

        #[inline]
        pub fn surface_byte_alignment(&self) -> u32 {
            self.$view().surface_byte_alignment()
        }

        /// Total bytes of every surface, padding included.
        #[inline]
        pub fn size_in_bytes(&self) -> usize {
            self.$view().size_in_bytes()
        }

        /// Padded bytes of one surface at `mip`.
        #[inline]
        pub fn mip_size_in_bytes(&self, mip: u32) -> usize {
            self.$view().mip_size_in_bytes(mip)
        }

        #[inline]
        pub fn surface_count(&self) -> usize {
            self.$view().surface_count()
        }

        /// Table index of a surface, or `None` if any coordinate is out of range.
        #[inline]
        pub fn surface_index(&self, array_slice: u32, face: u32, mip: u32) -> Option<usize> {
            self.$view().surface_index(array_slice, face, mip)
        }

        /// All pixel bytes.
        #[inline]
        pub fn data(&self) -> &[u8] {
            self.$view().data()
        }

        /// Bytes of one surface, or an empty slice out of range.
        #[inline]
        pub fn surface_data(&self, array_slice: u32, face: u32, mip: u32) -> &[u8] {
            self.$view().surface_data(array_slice, face, mip)
        }

        /// Bytes of one depth slice of a surface, or an empty slice out of range.
        #[inline]
        pub fn volume_slice_data(
            &self,
            array_slice: u32,
            face: u32,
            mip: u32,
            volume_slice: u32,
        ) -> &[u8] {
            self.$view()
                .volume_slice_data(array_slice, face, mip, volume_slice)
        }

        /// Surface bytes as `T`s; empty if out of range or misaligned for `T`.
        #[inline]
        pub fn surface_data_as<T: bytemuck::Pod>(&self, array_slice: u32, face: u32, mip: u32) -> &[T] {
            self.$view().surface_data_as(array_slice, face, mip)
        }

        /// View of one surface; empty if out of range.
        #[inline]
        pub fn surface(&self, array_slice: u32, face: u32, mip: u32) -> $crate::TextureSurfaceView<'_> {
            self.$view().surface(array_slice, face, mip)
        }
    };
}

/// Mutable texture accessors, delegated to `self.$span()`.
macro_rules! texture_mut_accessors {
    ($span:ident) => {
        /// All pixel bytes, mutable.
        #[inline]
        pub fn data_mut(&mut self) -> &mut [u8] {
            self.$span().into_data()
        }

        /// Mutable bytes of one surface, or an empty slice out of range.
        #[inline]
        pub fn surface_data_mut(&mut self, array_slice: u32, face: u32, mip: u32) -> &mut [u8] {
            self.$span().into_surface(array_slice, face, mip).into_data()
        }

        /// Mutable bytes of one depth slice, or an empty slice out of range.
        #[inline]
        pub fn volume_slice_data_mut(
            &mut self,
            array_slice: u32,
            face: u32,
            mip: u32,
            volume_slice: u32,
        ) -> &mut [u8] {
            self.$span()
                .into_surface(array_slice, face, mip)
                .into_volume_slice_data(volume_slice)
        }

        /// Mutable surface bytes as `T`s; empty if out of range or misaligned.
        #[inline]
        pub fn surface_data_as_mut<T: bytemuck::Pod>(
            &mut self,
            array_slice: u32,
            face: u32,
            mip: u32,
        ) -> &mut [T] {
            bytemuck::try_cast_slice_mut(self.surface_data_mut(array_slice, face, mip))
                .unwrap_or_default()
        }

        /// Mutable view of one surface; empty if out of range.
        #[inline]
        pub fn surface_mut(
            &mut self,
            array_slice: u32,
            face: u32,
            mip: u32,
        ) -> $crate::TextureSurfaceSpan<'_> {
            self.$span().into_surface(array_slice, face, mip)
        }
    };
}

pub(crate) use {texture_mut_accessors, texture_queries};

// ---------------------------------------------------------------------------
// TextureView
// ---------------------------------------------------------------------------

/// Read-only view of a whole texture.
#[derive(Clone, Copy, Default)]
pub struct TextureView<'a> {
    layout: Option<&'a Layout>,
}

impl<'a> TextureView<'a> {
    #[inline]
    pub(crate) fn from_layout(layout: Option<&'a Layout>) -> Self {
        Self { layout }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    /// Normalized creation params, with the effective mip count.
    pub fn params(&self) -> Option<TextureParams> {
        self.layout.map(|l| *l.params())
    }

    /// Extent of `mip`, or [`Extent::ZERO`] if out of range.
    pub fn extent(&self, mip: u32) -> Extent {
        self.layout
            .and_then(|l| l.mip_extent(mip))
            .unwrap_or(Extent::ZERO)
    }

    pub fn array_size(&self) -> u32 {
        self.layout.map_or(0, |l| l.params().array_size)
    }

    pub fn faces(&self) -> u32 {
        self.layout.map_or(0, |l| l.params().faces)
    }

    pub fn mips(&self) -> u32 {
        self.layout.map_or(0, |l| l.params().mips)
    }

    pub fn dimension(&self) -> TextureDimension {
        self.layout.map(|l| l.params().dimension).unwrap_or_default()
    }

    pub fn format(&self) -> Format {
        self.layout.map(|l| l.params().format).unwrap_or_default()
    }

    pub fn surface_byte_alignment(&self) -> u32 {
        self.layout.map_or(0, |l| l.params().surface_byte_alignment)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.layout.map_or(0, Layout::size_in_bytes)
    }

    /// Padded bytes of one surface at `mip`. Every slice and face shares it.
    pub fn mip_size_in_bytes(&self, mip: u32) -> usize {
        self.layout
            .and_then(|l| l.surface_range(0, 0, mip))
            .map_or(0, |range| range.len())
    }

    pub fn surface_count(&self) -> usize {
        self.layout.map_or(0, Layout::surface_count)
    }

    pub fn surface_index(&self, array_slice: u32, face: u32, mip: u32) -> Option<usize> {
        self.layout?.surface_index(array_slice, face, mip)
    }

    pub fn data(&self) -> &'a [u8] {
        self.layout.map(Layout::bytes).unwrap_or_default()
    }

    pub fn surface_data(&self, array_slice: u32, face: u32, mip: u32) -> &'a [u8] {
        self.layout
            .and_then(|l| Some(&l.bytes()[l.surface_range(array_slice, face, mip)?]))
            .unwrap_or_default()
    }

    pub fn volume_slice_data(
        &self,
        array_slice: u32,
        face: u32,
        mip: u32,
        volume_slice: u32,
    ) -> &'a [u8] {
        self.layout
            .and_then(|l| {
                let range = l.volume_slice_range(array_slice, face, mip, volume_slice)?;
                Some(&l.bytes()[range])
            })
            .unwrap_or_default()
    }

    /// Surface bytes as `T`s; empty if out of range or misaligned for `T`.
    pub fn surface_data_as<T: Pod>(&self, array_slice: u32, face: u32, mip: u32) -> &'a [T] {
        bytemuck::try_cast_slice(self.surface_data(array_slice, face, mip)).unwrap_or_default()
    }

    /// Depth-slice bytes as `T`s; empty if out of range or misaligned for `T`.
    pub fn volume_slice_data_as<T: Pod>(
        &self,
        array_slice: u32,
        face: u32,
        mip: u32,
        volume_slice: u32,
    ) -> &'a [T] {
        bytemuck::try_cast_slice(self.volume_slice_data(array_slice, face, mip, volume_slice))
            .unwrap_or_default()
    }

    /// View of one surface; empty if out of range.
    pub fn surface(&self, array_slice: u32, face: u32, mip: u32) -> TextureSurfaceView<'a> {
        match self.surface_index(array_slice, face, mip) {
            Some(_) => TextureSurfaceView {
                layout: self.layout,
                coords: SurfaceCoords::new(array_slice, face, mip),
            },
            None => TextureSurfaceView::default(),
        }
    }

    /// Every surface in table order: slice, then face, then mip.
    pub fn surfaces(self) -> impl Iterator<Item = TextureSurfaceView<'a>> {
        (0..self.array_size()).flat_map(move |slice| {
            (0..self.faces()).flat_map(move |face| {
                (0..self.mips()).map(move |mip| self.surface(slice, face, mip))
            })
        })
    }

    /// Same format and [`equivalent_dimensions`](Self::equivalent_dimensions).
    pub fn equivalent_layout(&self, other: TextureView<'_>) -> bool {
        self.format() == other.format() && self.equivalent_dimensions(other)
    }

    /// Same dimension, array size, faces, mips and base extent. Format is ignored.
    pub fn equivalent_dimensions(&self, other: TextureView<'_>) -> bool {
        self.dimension() == other.dimension()
            && self.array_size() == other.array_size()
            && self.faces() == other.faces()
            && self.mips() == other.mips()
            && self.extent(0) == other.extent(0)
    }
}

impl fmt::Debug for TextureView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "TextureView(empty)");
        }
        write!(
            f,
            "TextureView({} {} {}, {} slices, {} faces, {} mips)",
            self.dimension(),
            self.format(),
            self.extent(0),
            self.array_size(),
            self.faces(),
            self.mips()
        )
    }
}

// ---------------------------------------------------------------------------
// TextureSpan
// ---------------------------------------------------------------------------

/// Mutable view of a whole texture.
#[derive(Default)]
pub struct TextureSpan<'a> {
    layout: Option<&'a mut Layout>,
}

impl<'a> TextureSpan<'a> {
    #[inline]
    pub(crate) fn from_layout(layout: Option<&'a mut Layout>) -> Self {
        Self { layout }
    }

    /// Read-only view for the duration of the borrow.
    #[inline]
    pub fn as_view(&self) -> TextureView<'_> {
        TextureView::from_layout(self.layout.as_deref())
    }

    /// Shorter-lived span over the same texture.
    #[inline]
    pub fn reborrow(&mut self) -> TextureSpan<'_> {
        TextureSpan {
            layout: self.layout.as_deref_mut(),
        }
    }

    /// All pixel bytes for the full lifetime of the span.
    pub fn into_data(self) -> &'a mut [u8] {
        match self.layout {
            Some(layout) => layout.bytes_mut(),
            None => &mut [],
        }
    }

    /// Mutable view of one surface for the full lifetime of the span.
    pub fn into_surface(self, array_slice: u32, face: u32, mip: u32) -> TextureSurfaceSpan<'a> {
        match self.layout {
            Some(layout) if layout.surface_index(array_slice, face, mip).is_some() => {
                TextureSurfaceSpan {
                    layout: Some(layout),
                    coords: SurfaceCoords::new(array_slice, face, mip),
                }
            }
            _ => TextureSurfaceSpan::default(),
        }
    }

    texture_queries!(as_view);
    texture_mut_accessors!(reborrow);
}

impl<'a> From<TextureSpan<'a>> for TextureView<'a> {
    fn from(span: TextureSpan<'a>) -> Self {
        TextureView::from_layout(span.layout.map(|l| &*l))
    }
}

impl fmt::Debug for TextureSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

// ---------------------------------------------------------------------------
// Surface accessors
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SurfaceCoords {
    array_slice: u32,
    face: u32,
    mip: u32,
}

impl SurfaceCoords {
    const fn new(array_slice: u32, face: u32, mip: u32) -> Self {
        Self {
            array_slice,
            face,
            mip,
        }
    }
}

/// Read-only view of one (array slice, face, mip) surface.
#[derive(Clone, Copy, Default)]
pub struct TextureSurfaceView<'a> {
    layout: Option<&'a Layout>,
    coords: SurfaceCoords,
}

impl<'a> TextureSurfaceView<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    #[inline]
    pub fn array_slice(&self) -> u32 {
        self.coords.array_slice
    }

    #[inline]
    pub fn face(&self) -> u32 {
        self.coords.face
    }

    #[inline]
    pub fn mip(&self) -> u32 {
        self.coords.mip
    }

    /// The texture this surface belongs to.
    #[inline]
    pub fn texture(&self) -> TextureView<'a> {
        TextureView::from_layout(self.layout)
    }

    /// Extent of this surface's mip.
    pub fn extent(&self) -> Extent {
        self.texture().extent(self.coords.mip)
    }

    pub fn dimension(&self) -> TextureDimension {
        self.texture().dimension()
    }

    pub fn format(&self) -> Format {
        self.texture().format()
    }

    pub fn surface_byte_alignment(&self) -> u32 {
        self.texture().surface_byte_alignment()
    }

    /// Bytes the surface's blocks occupy, without padding. Matches
    /// [`SurfaceView::size_in_bytes`].
    pub fn size_in_bytes(&self) -> usize {
        SurfaceView::from(*self).size_in_bytes()
    }

    /// Bytes reserved for this surface, alignment padding included.
    pub fn padded_size_in_bytes(&self) -> usize {
        self.data().len()
    }

    pub fn data(&self) -> &'a [u8] {
        let SurfaceCoords {
            array_slice,
            face,
            mip,
        } = self.coords;
        self.texture().surface_data(array_slice, face, mip)
    }

    /// Bytes of depth slice `volume_slice`, or an empty slice out of range.
    pub fn volume_slice_data(&self, volume_slice: u32) -> &'a [u8] {
        let SurfaceCoords {
            array_slice,
            face,
            mip,
        } = self.coords;
        self.texture()
            .volume_slice_data(array_slice, face, mip, volume_slice)
    }

    /// Depth slice as a 2D surface descriptor.
    pub fn volume_slice(&self, volume_slice: u32) -> SurfaceView<'a> {
        SurfaceView::from(*self).volume_slice(volume_slice)
    }

    /// Same format and [`equivalent_dimensions`](Self::equivalent_dimensions).
    pub fn equivalent_layout(&self, other: TextureSurfaceView<'_>) -> bool {
        self.format() == other.format() && self.equivalent_dimensions(other)
    }

    /// Same dimension and extent.
    pub fn equivalent_dimensions(&self, other: TextureSurfaceView<'_>) -> bool {
        self.dimension() == other.dimension() && self.extent() == other.extent()
    }
}

impl fmt::Debug for TextureSurfaceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "TextureSurfaceView(empty)");
        }
        write!(
            f,
            "TextureSurfaceView(slice {} face {} mip {}: {} {})",
            self.coords.array_slice,
            self.coords.face,
            self.coords.mip,
            self.format(),
            self.extent()
        )
    }
}

/// Mutable view of one (array slice, face, mip) surface.
#[derive(Default)]
pub struct TextureSurfaceSpan<'a> {
    layout: Option<&'a mut Layout>,
    coords: SurfaceCoords,
}

impl<'a> TextureSurfaceSpan<'a> {
    /// Read-only view for the duration of the borrow.
    #[inline]
    pub fn as_view(&self) -> TextureSurfaceView<'_> {
        TextureSurfaceView {
            layout: self.layout.as_deref(),
            coords: self.coords,
        }
    }

    /// Shorter-lived span over the same surface.
    #[inline]
    pub fn reborrow(&mut self) -> TextureSurfaceSpan<'_> {
        TextureSurfaceSpan {
            layout: self.layout.as_deref_mut(),
            coords: self.coords,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    #[inline]
    pub fn array_slice(&self) -> u32 {
        self.coords.array_slice
    }

    #[inline]
    pub fn face(&self) -> u32 {
        self.coords.face
    }

    #[inline]
    pub fn mip(&self) -> u32 {
        self.coords.mip
    }

    pub fn extent(&self) -> Extent {
        self.as_view().extent()
    }

    pub fn dimension(&self) -> TextureDimension {
        self.as_view().dimension()
    }

    pub fn format(&self) -> Format {
        self.as_view().format()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.as_view().size_in_bytes()
    }

    pub fn padded_size_in_bytes(&self) -> usize {
        self.as_view().padded_size_in_bytes()
    }

    pub fn data(&self) -> &[u8] {
        self.as_view().data()
    }

    pub fn volume_slice_data(&self, volume_slice: u32) -> &[u8] {
        self.as_view().volume_slice_data(volume_slice)
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.reborrow().into_data()
    }

    pub fn volume_slice_data_mut(&mut self, volume_slice: u32) -> &mut [u8] {
        self.reborrow().into_volume_slice_data(volume_slice)
    }

    /// Surface bytes for the full lifetime of the span.
    pub fn into_data(self) -> &'a mut [u8] {
        let SurfaceCoords {
            array_slice,
            face,
            mip,
        } = self.coords;
        match self.layout {
            Some(layout) => match layout.surface_range(array_slice, face, mip) {
                Some(range) => &mut layout.bytes_mut()[range],
                None => &mut [],
            },
            None => &mut [],
        }
    }

    /// Depth-slice bytes for the full lifetime of the span.
    pub fn into_volume_slice_data(self, volume_slice: u32) -> &'a mut [u8] {
        let SurfaceCoords {
            array_slice,
            face,
            mip,
        } = self.coords;
        match self.layout {
            Some(layout) => match layout.volume_slice_range(array_slice, face, mip, volume_slice) {
                Some(range) => &mut layout.bytes_mut()[range],
                None => &mut [],
            },
            None => &mut [],
        }
    }
}

impl<'a> From<TextureSurfaceSpan<'a>> for TextureSurfaceView<'a> {
    fn from(span: TextureSurfaceSpan<'a>) -> Self {
        TextureSurfaceView {
            layout: span.layout.map(|l| &*l),
            coords: span.coords,
        }
    }
}

impl fmt::Debug for TextureSurfaceSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
