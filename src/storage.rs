//! Packed texture allocation.
//!
//! A [`TextureStorage`] owns one heap object holding the normalized
//! [`TextureParams`], the mip-extent table, the surface table and the pixel
//! bytes of every (array slice, face, mip) surface laid out back to back.
//!
//! Surfaces are enumerated slice-major, then face, then mip:
//!
//! ```text
//! index = faces * mips * slice + mips * face + mip
//! ```
//!
//! Construction never exposes a partially built texture. Invalid params
//! produce an empty storage; [`TextureStorage::try_new`] reports why.

use core::fmt;
use core::ops::Range;
use core::sync::atomic::{self, AtomicU32, Ordering};

use bytemuck::{Pod, Zeroable};

use crate::format::Format;
use crate::params::{Extent, MAX_MIP_COUNT, TextureDimension, TextureParams};
use crate::view::{TextureSpan, TextureView, texture_mut_accessors, texture_queries};

// ---------------------------------------------------------------------------
// LayoutError
// ---------------------------------------------------------------------------

/// Why a set of [`TextureParams`] could not be laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayoutError {
    /// Format is [`Format::Undefined`].
    UndefinedFormat,
    /// Requested mip count is zero.
    ZeroMips,
    /// Array size is zero.
    ZeroArraySize,
    /// An axis the dimension uses is zero.
    ZeroExtent { extent: Extent },
    /// Cube textures need exactly six faces.
    CubeFaceCount { faces: u32 },
    /// The layout computed to zero bytes.
    EmptyAllocation,
    /// The total size does not fit in memory.
    SizeOverflow,
    /// The allocator could not provide the surface table or pixel bytes.
    AllocationFailed,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedFormat => write!(f, "format is undefined"),
            Self::ZeroMips => write!(f, "mip count is zero"),
            Self::ZeroArraySize => write!(f, "array size is zero"),
            Self::ZeroExtent { extent } => write!(f, "extent {extent} has a zero axis"),
            Self::CubeFaceCount { faces } => {
                write!(f, "cube textures need 6 faces, got {faces}")
            }
            Self::EmptyAllocation => write!(f, "texture would be zero bytes"),
            Self::SizeOverflow => write!(f, "texture size overflows"),
            Self::AllocationFailed => write!(f, "texture allocation failed"),
        }
    }
}

impl core::error::Error for LayoutError {}

// ---------------------------------------------------------------------------
// RefCount
// ---------------------------------------------------------------------------

/// Atomic strong counter for a shared allocation.
///
/// Starts with one strong reference. [`dec_ref`](Self::dec_ref) reports the
/// transition to zero so the caller can release the allocation exactly once.
/// Weak handles need no count of their own: they only ever try to
/// [`try_upgrade`](Self::try_upgrade).
#[derive(Debug)]
pub struct RefCount {
    strong: AtomicU32,
}

impl RefCount {
    /// One strong reference.
    pub const fn new() -> Self {
        Self {
            strong: AtomicU32::new(1),
        }
    }

    /// Add a strong reference.
    #[inline]
    pub fn add_ref(&self) {
        self.strong.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop a strong reference. Returns `true` when this was the last one.
    #[inline]
    pub fn dec_ref(&self) -> bool {
        if self.strong.fetch_sub(1, Ordering::Release) != 1 {
            return false;
        }
        atomic::fence(Ordering::Acquire);
        true
    }

    /// Add a strong reference unless the count already reached zero.
    pub fn try_upgrade(&self) -> bool {
        let mut current = self.strong.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return false;
            }
            match self.strong.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    #[inline]
    pub fn strong_count(&self) -> u32 {
        self.strong.load(Ordering::Acquire)
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Offset and padded size of one surface inside the pixel bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SurfaceInfo {
    pub offset: usize,
    pub size: usize,
}

/// Storage unit of the pixel bytes; keeps the buffer 16-byte aligned so
/// surfaces can be reinterpreted as wider types.
#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C, align(16))]
struct Chunk([u8; 16]);

/// Header, tables and pixel bytes of one texture.
#[derive(Clone)]
pub(crate) struct Layout {
    params: TextureParams,
    size_in_bytes: usize,
    mip_extents: Box<[Extent]>,
    surfaces: Box<[SurfaceInfo]>,
    data: Box<[Chunk]>,
}

impl Layout {
    fn build(params: TextureParams, initial: &[u8]) -> Result<Self, LayoutError> {
        let params = normalize(params)?;
        let mip_extents = mip_chain(params.dimension, params.extent, params.mips);
        let params = TextureParams {
            mips: mip_extents.len() as u32,
            ..params
        };

        let info = params.format.info();
        let surface_count = (params.array_size as usize)
            .checked_mul(params.faces as usize)
            .and_then(|n| n.checked_mul(mip_extents.len()))
            .ok_or(LayoutError::SizeOverflow)?;
        let mut surfaces = Vec::new();
        surfaces
            .try_reserve_exact(surface_count)
            .map_err(|_| LayoutError::AllocationFailed)?;
        let mut total: u64 = 0;
        for _slice in 0..params.array_size {
            for _face in 0..params.faces {
                for extent in mip_extents.iter() {
                    let blocks = extent.div_ceil(info.block_extent);
                    let size = u64::from(blocks.x)
                        .checked_mul(u64::from(blocks.y))
                        .and_then(|n| n.checked_mul(u64::from(blocks.z)))
                        .and_then(|n| n.checked_mul(info.block_byte_size as u64))
                        .ok_or(LayoutError::SizeOverflow)?
                        .max(info.block_byte_size as u64);
                    let size = align_up(size, params.surface_byte_alignment as u64)
                        .ok_or(LayoutError::SizeOverflow)?;
                    let offset = usize::try_from(total).map_err(|_| LayoutError::SizeOverflow)?;
                    let size_usize = usize::try_from(size).map_err(|_| LayoutError::SizeOverflow)?;
                    surfaces.push(SurfaceInfo {
                        offset,
                        size: size_usize,
                    });
                    total = total.checked_add(size).ok_or(LayoutError::SizeOverflow)?;
                }
            }
        }
        if total == 0 {
            return Err(LayoutError::EmptyAllocation);
        }
        let size_in_bytes = usize::try_from(total).map_err(|_| LayoutError::SizeOverflow)?;

        let chunks = size_in_bytes.div_ceil(core::mem::size_of::<Chunk>());
        let mut data = Vec::new();
        data.try_reserve_exact(chunks)
            .map_err(|_| LayoutError::AllocationFailed)?;
        data.resize(chunks, Chunk::zeroed());
        let mut layout = Self {
            params,
            size_in_bytes,
            mip_extents,
            surfaces: surfaces.into_boxed_slice(),
            data: data.into_boxed_slice(),
        };
        let copied = initial.len().min(size_in_bytes);
        layout.bytes_mut()[..copied].copy_from_slice(&initial[..copied]);

        tracing::trace!(
            format = %params.format,
            size_in_bytes,
            surfaces = layout.surfaces.len(),
            "texture allocated"
        );
        Ok(layout)
    }

    #[inline]
    pub(crate) fn params(&self) -> &TextureParams {
        &self.params
    }

    #[inline]
    pub(crate) fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    #[inline]
    pub(crate) fn mip_extent(&self, mip: u32) -> Option<Extent> {
        self.mip_extents.get(mip as usize).copied()
    }

    #[inline]
    pub(crate) fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub(crate) fn surface_index(&self, array_slice: u32, face: u32, mip: u32) -> Option<usize> {
        let p = &self.params;
        if array_slice >= p.array_size || face >= p.faces || mip >= p.mips {
            return None;
        }
        let (faces, mips) = (p.faces as usize, p.mips as usize);
        Some(faces * mips * array_slice as usize + mips * face as usize + mip as usize)
    }

    pub(crate) fn surface_info(&self, index: usize) -> Option<SurfaceInfo> {
        self.surfaces.get(index).copied()
    }

    pub(crate) fn surface_range(&self, array_slice: u32, face: u32, mip: u32) -> Option<Range<usize>> {
        let info = self.surface_info(self.surface_index(array_slice, face, mip)?)?;
        Some(info.offset..info.offset + info.size)
    }

    /// Byte range of one depth slice of a mip surface.
    pub(crate) fn volume_slice_range(
        &self,
        array_slice: u32,
        face: u32,
        mip: u32,
        volume_slice: u32,
    ) -> Option<Range<usize>> {
        let surface = self.surface_range(array_slice, face, mip)?;
        let extent = self.mip_extent(mip)?;
        if volume_slice >= extent.z {
            return None;
        }
        let info = self.params.format.info();
        let slice_size = volume_slice_byte_size(self.params.format, extent);
        let start = surface.start + slice_size * (volume_slice / info.block_extent.z) as usize;
        let end = start + slice_size;
        (end <= surface.end).then_some(start..end)
    }

    /// Copy of the header and tables without pixel bytes.
    fn geometry(&self) -> Self {
        Self {
            params: self.params,
            size_in_bytes: self.size_in_bytes,
            mip_extents: self.mip_extents.clone(),
            surfaces: self.surfaces.clone(),
            data: Box::default(),
        }
    }

    /// Pixel bytes; empty for a [`geometry`](Self::geometry) copy.
    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
            .get(..self.size_in_bytes)
            .unwrap_or_default()
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size_in_bytes;
        bytemuck::cast_slice_mut(&mut self.data)
            .get_mut(..size)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// TextureStorage
// ---------------------------------------------------------------------------

/// Owning handle to a packed texture allocation, or empty.
///
/// Most callers use [`UniqueTexture`](crate::UniqueTexture) or
/// [`SharedTexture`](crate::SharedTexture) instead; this is the engine both
/// are built on.
#[derive(Default)]
pub struct TextureStorage {
    layout: Option<Box<Layout>>,
}

impl TextureStorage {
    /// Lay out a zero-filled texture. Returns an empty storage if `params`
    /// are invalid.
    pub fn new(params: TextureParams) -> Self {
        Self::with_data(params, &[])
    }

    /// Lay out a texture and copy `initial` into its bytes, truncating or
    /// zero-padding to the texture size. Returns an empty storage if
    /// `params` are invalid.
    pub fn with_data(params: TextureParams, initial: &[u8]) -> Self {
        match Self::try_new(params, initial) {
            Ok(storage) => storage,
            Err(err) => {
                tracing::debug!(?params, %err, "texture layout rejected");
                Self::default()
            }
        }
    }

    /// Like [`with_data`](Self::with_data), but reports why `params` were rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] naming the first violated rule.
    pub fn try_new(params: TextureParams, initial: &[u8]) -> Result<Self, LayoutError> {
        Ok(Self {
            layout: Some(Box::new(Layout::build(params, initial)?)),
        })
    }

    /// Whether this storage holds an allocation.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.layout.is_some()
    }

    /// Release the allocation, leaving an empty storage.
    pub fn destroy(&mut self) {
        self.layout = None;
    }

    /// Read-only view of the whole texture.
    #[inline]
    pub fn view(&self) -> TextureView<'_> {
        TextureView::from_layout(self.layout.as_deref())
    }

    /// Mutable view of the whole texture.
    #[inline]
    pub fn span(&mut self) -> TextureSpan<'_> {
        TextureSpan::from_layout(self.layout.as_deref_mut())
    }

    /// Same params and tables, no pixel bytes. Answers every geometry
    /// query of the original; byte accessors return empty slices.
    pub(crate) fn geometry(&self) -> Self {
        Self {
            layout: self.layout.as_deref().map(|l| Box::new(l.geometry())),
        }
    }

    /// Deep copy: identical params, bit-copied bytes.
    pub(crate) fn deep_copy(&self) -> Self {
        Self {
            layout: self.layout.clone(),
        }
    }

    texture_queries!(view);
    texture_mut_accessors!(span);
}

impl fmt::Debug for TextureStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn normalize(params: TextureParams) -> Result<TextureParams, LayoutError> {
    if params.format == Format::Undefined {
        return Err(LayoutError::UndefinedFormat);
    }
    if params.mips == 0 {
        return Err(LayoutError::ZeroMips);
    }
    if params.array_size == 0 {
        return Err(LayoutError::ZeroArraySize);
    }
    let extent = params.dimension.normalize_extent(params.extent);
    if extent.x == 0 || extent.y == 0 || extent.z == 0 {
        return Err(LayoutError::ZeroExtent {
            extent: params.extent,
        });
    }
    if params.dimension == TextureDimension::TextureCube && params.faces != 6 {
        return Err(LayoutError::CubeFaceCount {
            faces: params.faces,
        });
    }
    Ok(TextureParams {
        extent,
        faces: params.faces.max(1),
        surface_byte_alignment: params.surface_byte_alignment.max(1),
        ..params
    })
}

/// Mip extents from `base`, halving active axes until `mips` entries or 1x1x1.
fn mip_chain(dimension: TextureDimension, base: Extent, mips: u32) -> Box<[Extent]> {
    let capacity = mips.min(MAX_MIP_COUNT) as usize;
    let mut chain = Vec::with_capacity(capacity);
    let mut extent = base;
    while chain.len() < capacity && extent != Extent::ONE {
        chain.push(extent);
        extent = dimension.next_mip_extent(extent);
    }
    if chain.len() < mips as usize && extent == Extent::ONE {
        chain.push(Extent::ONE);
    }
    chain.into_boxed_slice()
}

/// Unpadded byte size of one depth slice of a surface of `extent`.
pub(crate) fn volume_slice_byte_size(format: Format, extent: Extent) -> usize {
    let info = format.info();
    let blocks = extent.div_ceil(info.block_extent);
    blocks.x as usize * blocks.y as usize * info.block_byte_size as usize
}

/// Round `val` up to the next multiple of `align` (any non-zero value).
const fn align_up(val: u64, align: u64) -> Option<u64> {
    val.div_ceil(align).checked_mul(align)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params_2d(format: Format, x: u32, y: u32) -> TextureParams {
        TextureParams::new(format, TextureDimension::Texture2D, Extent::new_2d(x, y))
    }

    // --- validation ---

    #[test]
    fn rejects_invalid_params() {
        let ok = params_2d(Format::Rgba8Unorm, 4, 4);
        let cases = [
            (TextureParams { format: Format::Undefined, ..ok }, LayoutError::UndefinedFormat),
            (ok.with_mips(0), LayoutError::ZeroMips),
            (ok.with_array_size(0), LayoutError::ZeroArraySize),
            (
                ok.with_extent(Extent::new(4, 0, 1)),
                LayoutError::ZeroExtent { extent: Extent::new(4, 0, 1) },
            ),
            (
                TextureParams::new(Format::R8Unorm, TextureDimension::TextureCube, Extent::new_2d(4, 4)).with_faces(4),
                LayoutError::CubeFaceCount { faces: 4 },
            ),
        ];
        for (params, expected) in cases {
            assert_eq!(TextureStorage::try_new(params, &[]).err(), Some(expected));
            let storage = TextureStorage::new(params);
            assert!(!storage.is_valid());
            assert_eq!(storage.size_in_bytes(), 0);
            assert_eq!(storage.mips(), 0);
            assert_eq!(storage.format(), Format::Undefined);
        }
    }

    #[test]
    fn unaddressable_size_is_rejected() {
        let p = TextureParams::new(
            Format::R8Unorm,
            TextureDimension::Texture3D,
            Extent::new(u32::MAX, u32::MAX, u32::MAX),
        );
        assert_eq!(TextureStorage::try_new(p, &[]).err(), Some(LayoutError::SizeOverflow));
        assert!(!TextureStorage::new(p).is_valid());
    }

    #[test]
    fn failed_allocation_gives_empty_storage() {
        // 2^63 bytes: fits the u64 total but no allocator will hand it out.
        let p = TextureParams::new(
            Format::Rgba32Float,
            TextureDimension::Texture3D,
            Extent::new(1 << 20, 1 << 20, 1 << 19),
        );
        let err = TextureStorage::try_new(p, &[]).err();
        assert!(
            matches!(err, Some(LayoutError::AllocationFailed | LayoutError::SizeOverflow)),
            "{err:?}"
        );
        let storage = TextureStorage::new(p);
        assert!(!storage.is_valid());
        assert_eq!(storage.size_in_bytes(), 0);
    }

    #[test]
    fn inactive_axes_may_be_zero() {
        let p = TextureParams::new(Format::R8Unorm, TextureDimension::Texture1D, Extent::new(8, 0, 0));
        let storage = TextureStorage::new(p);
        assert!(storage.is_valid());
        assert_eq!(storage.extent(0), Extent::new(8, 1, 1));
    }

    #[test]
    fn zero_faces_become_one_and_zero_alignment_becomes_one() {
        let p = params_2d(Format::R8Unorm, 3, 3)
            .with_faces(0)
            .with_surface_byte_alignment(0);
        let storage = TextureStorage::new(p);
        assert_eq!(storage.faces(), 1);
        assert_eq!(storage.surface_byte_alignment(), 1);
        assert_eq!(storage.size_in_bytes(), 9);
    }

    // --- mip chain ---

    #[test]
    fn mip_chain_stops_at_one() {
        let chain = mip_chain(TextureDimension::Texture2D, Extent::new(4, 4, 1), 15);
        assert_eq!(
            &*chain,
            &[Extent::new(4, 4, 1), Extent::new(2, 2, 1), Extent::new(1, 1, 1)]
        );
    }

    #[test]
    fn mip_chain_respects_requested_count() {
        let chain = mip_chain(TextureDimension::Texture3D, Extent::new(16, 8, 4), 2);
        assert_eq!(&*chain, &[Extent::new(16, 8, 4), Extent::new(8, 4, 2)]);
    }

    #[test]
    fn mip_chain_of_single_texel_has_one_entry() {
        let chain = mip_chain(TextureDimension::Texture2D, Extent::ONE, 4);
        assert_eq!(&*chain, &[Extent::ONE]);
    }

    #[test]
    fn mip_chain_1d_keeps_other_axes() {
        let chain = mip_chain(TextureDimension::Texture1D, Extent::new(4, 1, 1), 8);
        assert_eq!(chain.len(), 3);
        assert!(chain.iter().all(|e| e.y == 1 && e.z == 1));
    }

    #[test]
    fn effective_mips_replace_requested() {
        let storage = TextureStorage::new(params_2d(Format::R4G4UnormPack8, 4, 4).with_mips(15));
        assert_eq!(storage.mips(), 3);
        assert_eq!(storage.extent(2), Extent::ONE);
        assert_eq!(storage.extent(3), Extent::ZERO);
    }

    // --- sizing ---

    #[test]
    fn surface_sizes_are_padded_to_alignment() {
        // 3x3 R8 = 9 bytes -> 12 with 4-byte alignment; 1x1 = 1 -> 4.
        let storage = TextureStorage::new(params_2d(Format::R8Unorm, 3, 3).with_mips(2));
        assert_eq!(storage.mip_size_in_bytes(0), 12);
        assert_eq!(storage.mip_size_in_bytes(1), 4);
        assert_eq!(storage.size_in_bytes(), 16);
    }

    #[test]
    fn compressed_surfaces_round_up_to_whole_blocks() {
        let storage = TextureStorage::new(params_2d(Format::Bc1RgbaUnorm, 6, 6).with_mips(3));
        assert_eq!(storage.mip_size_in_bytes(0), 4 * 8);
        assert_eq!(storage.mip_size_in_bytes(1), 8);
        assert_eq!(storage.mip_size_in_bytes(2), 8);
    }

    #[test]
    fn cube_array_surface_count_and_total() {
        let p = TextureParams::new(Format::Rgba8Unorm, TextureDimension::TextureCube, Extent::new_2d(2, 2))
            .with_array_size(2)
            .with_mips(2);
        let storage = TextureStorage::new(p);
        assert_eq!(storage.surface_count(), 2 * 6 * 2);
        assert_eq!(storage.size_in_bytes(), 12 * (16 + 4));
    }

    #[test]
    fn initial_data_is_truncated_or_zero_padded() {
        let p = params_2d(Format::R8Unorm, 4, 1);
        let long = TextureStorage::with_data(p, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(long.data(), &[1, 2, 3, 4]);
        let short = TextureStorage::with_data(p, &[9]);
        assert_eq!(short.data(), &[9, 0, 0, 0]);
    }

    // --- addressing ---

    #[test]
    fn surface_index_follows_slice_face_mip_order() {
        let p = TextureParams::new(Format::R8Unorm, TextureDimension::TextureCube, Extent::new_2d(4, 4))
            .with_array_size(2)
            .with_mips(3);
        let storage = TextureStorage::new(p);
        let mut expected = 0;
        for slice in 0..2 {
            for face in 0..6 {
                for mip in 0..3 {
                    assert_eq!(storage.surface_index(slice, face, mip), Some(expected));
                    expected += 1;
                }
            }
        }
        assert_eq!(storage.surface_index(2, 0, 0), None);
        assert_eq!(storage.surface_index(0, 6, 0), None);
        assert_eq!(storage.surface_index(0, 0, 3), None);
    }

    #[test]
    fn volume_slices_partition_a_3d_surface() {
        let p = TextureParams::new(Format::R8Unorm, TextureDimension::Texture3D, Extent::new(4, 4, 4));
        let mut storage = TextureStorage::new(p);
        storage.volume_slice_data_mut(0, 0, 0, 2).fill(7);
        let surface = storage.surface_data(0, 0, 0);
        assert_eq!(surface.len(), 64);
        assert!(surface[32..48].iter().all(|&b| b == 7));
        assert!(surface[..32].iter().all(|&b| b == 0));
        assert!(storage.volume_slice_data(0, 0, 0, 4).is_empty());
    }

    #[test]
    fn out_of_range_accessors_are_empty() {
        let mut storage = TextureStorage::new(params_2d(Format::R8Unorm, 4, 4));
        assert!(storage.surface_data(1, 0, 0).is_empty());
        assert!(storage.surface_data_mut(0, 1, 0).is_empty());
        assert!(storage.volume_slice_data(0, 0, 1, 0).is_empty());
    }

    #[test]
    fn typed_access_needs_alignment() {
        let p = params_2d(Format::R32Float, 2, 1).with_surface_byte_alignment(16);
        let mut storage = TextureStorage::new(p);
        storage
            .surface_data_mut(0, 0, 0)
            .copy_from_slice(&[0u8; 16]);
        let floats: &[f32] = storage.surface_data_as(0, 0, 0);
        assert_eq!(floats.len(), 4);
    }

    #[test]
    fn destroy_leaves_empty_storage() {
        let mut storage = TextureStorage::new(params_2d(Format::R8Unorm, 4, 4));
        storage.destroy();
        assert!(!storage.is_valid());
        assert!(storage.data().is_empty());
    }

    // --- RefCount ---

    #[test]
    fn ref_count_reports_last_release() {
        let refs = RefCount::new();
        refs.add_ref();
        assert_eq!(refs.strong_count(), 2);
        assert!(!refs.dec_ref());
        assert!(refs.dec_ref());
        assert!(!refs.try_upgrade());
    }

    #[test]
    fn ref_count_survives_concurrent_traffic() {
        use rayon::prelude::*;
        let refs = RefCount::new();
        (0..10_000).into_par_iter().for_each(|_| refs.add_ref());
        let releases = (0..10_000)
            .into_par_iter()
            .filter(|_| refs.dec_ref())
            .count();
        assert_eq!(releases, 0);
        assert_eq!(refs.strong_count(), 1);
        assert!(refs.dec_ref());
    }


    // --- properties ---

    fn any_dimension() -> impl Strategy<Value = TextureDimension> {
        prop_oneof![
            Just(TextureDimension::Texture1D),
            Just(TextureDimension::Texture2D),
            Just(TextureDimension::Texture3D),
            Just(TextureDimension::TextureCube),
        ]
    }

    proptest! {
        #[test]
        fn mip_chain_shrinks_monotonically(
            dimension in any_dimension(),
            x in 1u32..=512,
            y in 1u32..=512,
            z in 1u32..=64,
            mips in 1u32..=20,
        ) {
            let base = dimension.normalize_extent(Extent::new(x, y, z));
            let chain = mip_chain(dimension, base, mips);
            prop_assert!(!chain.is_empty());
            prop_assert!(chain.len() <= mips as usize);
            prop_assert_eq!(chain[0], base);
            for pair in chain.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(b.x >= 1 && b.y >= 1 && b.z >= 1);
                prop_assert!(b.x <= a.x && b.y <= a.y && b.z <= a.z);
                prop_assert!(b != a);
                if a.x > 1 { prop_assert!(b.x < a.x); }
                if dimension.has_y() && a.y > 1 { prop_assert!(b.y < a.y); }
                if dimension.has_z() && a.z > 1 { prop_assert!(b.z < a.z); }
            }
        }

        #[test]
        fn surface_table_is_contiguous_and_indexed(
            array_size in 1u32..4,
            cube in any::<bool>(),
            x in 1u32..40,
            y in 1u32..40,
            mips in 1u32..8,
            alignment in 1u32..32,
        ) {
            let dimension = if cube { TextureDimension::TextureCube } else { TextureDimension::Texture2D };
            let p = TextureParams::new(Format::Rgba8Unorm, dimension, Extent::new_2d(x, y))
                .with_array_size(array_size)
                .with_mips(mips)
                .with_surface_byte_alignment(alignment);
            let storage = TextureStorage::new(p);
            let layout = storage.layout.as_deref().unwrap();
            prop_assert_eq!(
                storage.surface_count(),
                (storage.array_size() * storage.faces() * storage.mips()) as usize
            );
            let mut next_offset = 0;
            let mut seen = vec![false; storage.surface_count()];
            for slice in 0..storage.array_size() {
                for face in 0..storage.faces() {
                    for mip in 0..storage.mips() {
                        let index = storage.surface_index(slice, face, mip).unwrap();
                        prop_assert!(!seen[index]);
                        seen[index] = true;
                        let info = layout.surface_info(index).unwrap();
                        prop_assert_eq!(info.offset, next_offset);
                        prop_assert_eq!(info.size % alignment as usize, 0);
                        next_offset += info.size;
                    }
                }
            }
            prop_assert_eq!(next_offset, storage.size_in_bytes());
        }
    }
}
