//! Format-agnostic texture operations.
//!
//! Surface-level operations take anything convertible into a
//! [`SurfaceView`] / [`SurfaceSpan`]; texture-level forms apply them to
//! every (array slice, face, mip) surface in table order. Every operation
//! reports a rejected precondition by returning `false` with the
//! destination bytes untouched.

use crate::codec::{self, Sample, TexelWriter};
use crate::params::Extent;
use crate::surface::{SurfaceSpan, SurfaceView};
use crate::view::{TextureSpan, TextureView};

/// Every (array slice, face, mip) triple in surface-table order.
fn surface_coords(view: TextureView<'_>) -> impl Iterator<Item = (u32, u32, u32)> + use<> {
    let (array_size, faces, mips) = (view.array_size(), view.faces(), view.mips());
    (0..array_size).flat_map(move |slice| {
        (0..faces).flat_map(move |face| (0..mips).map(move |mip| (slice, face, mip)))
    })
}

/// Unpadded bytes of the surface, or `None` if the data is short.
fn surface_bytes<'s>(data: &'s mut [u8], size: usize) -> Option<&'s mut [u8]> {
    data.get_mut(..size)
}

// ---------------------------------------------------------------------------
// Clear
// ---------------------------------------------------------------------------

/// Fill every texel of `surface` with `color`.
///
/// Returns `false` without touching the bytes for compressed,
/// depth/stencil or otherwise unwriteable formats.
pub fn clear_surface<'a>(surface: impl Into<SurfaceSpan<'a>>, color: Sample) -> bool {
    let mut surface = surface.into();
    let writer = TexelWriter::new(surface.format());
    if surface.is_empty() || !writer.is_writeable() {
        tracing::debug!(format = %surface.format(), "clear rejected");
        return false;
    }
    let texel_bytes = writer.texel_byte_size();
    let mut texel = [0u8; 16];
    if writer.write(color, &mut texel).is_err() {
        return false;
    }
    let size = surface.size_in_bytes();
    let Some(bytes) = surface_bytes(surface.data_mut(), size) else {
        return false;
    };
    for chunk in bytes.chunks_exact_mut(texel_bytes) {
        chunk.copy_from_slice(&texel[..texel_bytes]);
    }
    true
}

/// Clear every surface of `texture`. See [`clear_surface`].
pub fn clear(mut texture: TextureSpan<'_>, color: Sample) -> bool {
    if texture.is_empty() || !TexelWriter::new(texture.format()).is_writeable() {
        tracing::debug!(format = %texture.format(), "clear rejected");
        return false;
    }
    surface_coords(texture.as_view())
        .all(|(slice, face, mip)| clear_surface(texture.surface_mut(slice, face, mip), color))
}

// ---------------------------------------------------------------------------
// Flips
// ---------------------------------------------------------------------------

/// Texel size if `surface` can be flipped texel by texel.
fn flip_texel_bytes(surface: SurfaceView<'_>, op: &str) -> Option<usize> {
    let info = surface.format().info();
    if surface.is_empty() || info.compressed || !info.is_single_texel_block() {
        tracing::debug!(format = %surface.format(), op, "flip rejected");
        return None;
    }
    Some(info.block_byte_size as usize)
}

/// Row length in bytes, rows per slice and slice count of `surface`.
fn flip_shape(extent: Extent, texel_bytes: usize) -> (usize, usize, usize) {
    (extent.x as usize * texel_bytes, extent.y as usize, extent.z as usize)
}

fn mirror_row(row: &mut [u8], texel_bytes: usize) {
    let texels = row.len() / texel_bytes;
    for i in 0..texels / 2 {
        let (head, tail) = row.split_at_mut((texels - 1 - i) * texel_bytes);
        head[i * texel_bytes..(i + 1) * texel_bytes].swap_with_slice(&mut tail[..texel_bytes]);
    }
}

/// Swap the rows of every depth slice, top to bottom.
pub fn flip_vertical<'a>(surface: impl Into<SurfaceSpan<'a>>) -> bool {
    let mut surface = surface.into();
    let Some(texel_bytes) = flip_texel_bytes(surface.as_view(), "flip_vertical") else {
        return false;
    };
    let (row_bytes, rows, slices) = flip_shape(surface.extent(), texel_bytes);
    let Some(bytes) = surface_bytes(surface.data_mut(), row_bytes * rows * slices) else {
        return false;
    };
    for slice in bytes.chunks_exact_mut(row_bytes * rows) {
        for y in 0..rows / 2 {
            let (top, bottom) = slice.split_at_mut((rows - 1 - y) * row_bytes);
            top[y * row_bytes..(y + 1) * row_bytes].swap_with_slice(&mut bottom[..row_bytes]);
        }
    }
    true
}

/// Mirror every row end to end.
pub fn flip_horizontal<'a>(surface: impl Into<SurfaceSpan<'a>>) -> bool {
    let mut surface = surface.into();
    let Some(texel_bytes) = flip_texel_bytes(surface.as_view(), "flip_horizontal") else {
        return false;
    };
    let (row_bytes, rows, slices) = flip_shape(surface.extent(), texel_bytes);
    let Some(bytes) = surface_bytes(surface.data_mut(), row_bytes * rows * slices) else {
        return false;
    };
    for row in bytes.chunks_exact_mut(row_bytes) {
        mirror_row(row, texel_bytes);
    }
    true
}

/// Write `src` flipped vertically into `dst`. Both must have an
/// equivalent layout.
pub fn flip_vertical_to<'a, 'b>(src: impl Into<SurfaceView<'a>>, dst: impl Into<SurfaceSpan<'b>>) -> bool {
    let (src, mut dst) = (src.into(), dst.into());
    let Some(texel_bytes) = flip_pair(src, &dst, "flip_vertical_to") else {
        return false;
    };
    let (row_bytes, rows, slices) = flip_shape(src.extent(), texel_bytes);
    let len = row_bytes * rows * slices;
    let (Some(from), Some(to)) = (src.data().get(..len), surface_bytes(dst.data_mut(), len)) else {
        return false;
    };
    let slice_bytes = row_bytes * rows;
    for (from, to) in from.chunks_exact(slice_bytes).zip(to.chunks_exact_mut(slice_bytes)) {
        for (src_row, dst_row) in from.chunks_exact(row_bytes).rev().zip(to.chunks_exact_mut(row_bytes)) {
            dst_row.copy_from_slice(src_row);
        }
    }
    true
}

/// Write `src` mirrored horizontally into `dst`. Both must have an
/// equivalent layout.
pub fn flip_horizontal_to<'a, 'b>(src: impl Into<SurfaceView<'a>>, dst: impl Into<SurfaceSpan<'b>>) -> bool {
    let (src, mut dst) = (src.into(), dst.into());
    let Some(texel_bytes) = flip_pair(src, &dst, "flip_horizontal_to") else {
        return false;
    };
    let (row_bytes, rows, slices) = flip_shape(src.extent(), texel_bytes);
    let len = row_bytes * rows * slices;
    let (Some(from), Some(to)) = (src.data().get(..len), surface_bytes(dst.data_mut(), len)) else {
        return false;
    };
    for (src_row, dst_row) in from.chunks_exact(row_bytes).zip(to.chunks_exact_mut(row_bytes)) {
        for (src_texel, dst_texel) in src_row
            .chunks_exact(texel_bytes)
            .rev()
            .zip(dst_row.chunks_exact_mut(texel_bytes))
        {
            dst_texel.copy_from_slice(src_texel);
        }
    }
    true
}

fn flip_pair(src: SurfaceView<'_>, dst: &SurfaceSpan<'_>, op: &str) -> Option<usize> {
    if !dst.equivalent_layout(src) {
        tracing::debug!(op, src = ?src, dst = ?dst, "flip rejected: layouts differ");
        return None;
    }
    flip_texel_bytes(src, op)
}

fn texture_flip(
    mut texture: TextureSpan<'_>,
    flip: impl Fn(SurfaceSpan<'_>) -> bool,
) -> bool {
    if texture.is_empty() {
        return false;
    }
    surface_coords(texture.as_view()).all(|(slice, face, mip)| flip(texture.surface_mut(slice, face, mip).into()))
}

fn texture_flip_to(
    src: TextureView<'_>,
    mut dst: TextureSpan<'_>,
    op: &str,
    flip: impl Fn(SurfaceView<'_>, SurfaceSpan<'_>) -> bool,
) -> bool {
    if src.is_empty() || !src.equivalent_layout(dst.as_view()) {
        tracing::debug!(op, "flip rejected: texture layouts differ");
        return false;
    }
    surface_coords(src).all(|(slice, face, mip)| {
        flip(src.surface(slice, face, mip).into(), dst.surface_mut(slice, face, mip).into())
    })
}

/// [`flip_vertical`] on every surface.
pub fn flip_vertical_texture(texture: TextureSpan<'_>) -> bool {
    texture_flip(texture, |surface| flip_vertical(surface))
}

/// [`flip_horizontal`] on every surface.
pub fn flip_horizontal_texture(texture: TextureSpan<'_>) -> bool {
    texture_flip(texture, |surface| flip_horizontal(surface))
}

/// [`flip_vertical_to`] on every surface pair.
pub fn flip_vertical_texture_to(src: TextureView<'_>, dst: TextureSpan<'_>) -> bool {
    texture_flip_to(src, dst, "flip_vertical_texture_to", |s, d| flip_vertical_to(s, d))
}

/// [`flip_horizontal_to`] on every surface pair.
pub fn flip_horizontal_texture_to(src: TextureView<'_>, dst: TextureSpan<'_>) -> bool {
    texture_flip_to(src, dst, "flip_horizontal_texture_to", |s, d| flip_horizontal_to(s, d))
}

// ---------------------------------------------------------------------------
// Region copy
// ---------------------------------------------------------------------------

/// Copy a `copy_extent` region from `src` at `src_offset` to `dst` at
/// `dst_offset`.
///
/// Both surfaces must share a format. Offsets and extent must be multiples
/// of the format's block extent, and the region must lie inside both
/// surfaces.
pub fn copy_surface_region_to<'a, 'b>(
    src: impl Into<SurfaceView<'a>>,
    src_offset: Extent,
    dst: impl Into<SurfaceSpan<'b>>,
    dst_offset: Extent,
    copy_extent: Extent,
) -> bool {
    let (src, mut dst) = (src.into(), dst.into());
    if src.is_empty() || dst.is_empty() || src.format() != dst.format() {
        tracing::debug!(src = ?src, dst = ?dst, "region copy rejected: formats differ");
        return false;
    }
    let info = src.format().info();
    let block = info.block_extent;
    let aligned = src_offset.is_multiple_of(block)
        && dst_offset.is_multiple_of(block)
        && copy_extent.is_multiple_of(block);
    if !aligned
        || !src_offset.fits_within(copy_extent, src.extent())
        || !dst_offset.fits_within(copy_extent, dst.extent())
    {
        tracing::debug!(%src_offset, %dst_offset, %copy_extent, "region copy rejected: out of bounds");
        return false;
    }

    let block_bytes = info.block_byte_size as usize;
    let src_grid = src.extent().div_ceil(block);
    let dst_grid = dst.extent().div_ceil(block);
    let (src_at, dst_at, region) = (src_offset.div_ceil(block), dst_offset.div_ceil(block), copy_extent.div_ceil(block));
    let row_len = region.x as usize * block_bytes;
    let offset = |grid: Extent, at: Extent, z: u32, y: u32| {
        let row = (at.z + z) as usize * grid.y as usize + (at.y + y) as usize;
        (row * grid.x as usize + at.x as usize) * block_bytes
    };

    let src_bytes = src.data();
    let dst_bytes = dst.data_mut();
    let src_needed = src_grid.volume() as usize * block_bytes;
    let dst_needed = dst_grid.volume() as usize * block_bytes;
    if src_bytes.len() < src_needed || dst_bytes.len() < dst_needed {
        return false;
    }
    for z in 0..region.z {
        for y in 0..region.y {
            let from = offset(src_grid, src_at, z, y);
            let to = offset(dst_grid, dst_at, z, y);
            dst_bytes[to..to + row_len].copy_from_slice(&src_bytes[from..from + row_len]);
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Decompression
// ---------------------------------------------------------------------------

/// Expand block-compressed `src` into `dst`, whose format must be one of
/// the source's decompression targets and whose dimensions must match.
pub fn decompress_surface_to<'a, 'b>(src: impl Into<SurfaceView<'a>>, dst: impl Into<SurfaceSpan<'b>>) -> bool {
    let (src, mut dst) = (src.into(), dst.into());
    let info = src.format().info();
    if src.is_empty() || !info.decompresses_to(dst.format()) || !dst.equivalent_dimensions(src) {
        tracing::debug!(src = ?src, dst = ?dst, "decompression rejected");
        return false;
    }
    let dest_format = dst.format();
    match codec::decompress(src.format(), src.data(), src.extent(), dest_format, dst.data_mut()) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(%err, "decompression failed");
            false
        }
    }
}

/// [`decompress_surface_to`] on every surface pair. Stops at the first
/// failing surface.
pub fn decompress_texture_to(src: TextureView<'_>, mut dst: TextureSpan<'_>) -> bool {
    if src.is_empty() || !src.equivalent_dimensions(dst.as_view()) {
        tracing::debug!("texture decompression rejected: dimensions differ");
        return false;
    }
    surface_coords(src).all(|(slice, face, mip)| {
        decompress_surface_to(src.surface(slice, face, mip), dst.surface_mut(slice, face, mip))
    })
}

// ---------------------------------------------------------------------------
// Per-block transforms
// ---------------------------------------------------------------------------

/// Call `f` with the bytes of every block of `surface`, in storage order.
pub fn transform_surface<'a>(surface: impl Into<SurfaceSpan<'a>>, mut f: impl FnMut(&mut [u8])) -> bool {
    let mut surface = surface.into();
    if surface.is_empty() {
        return false;
    }
    let block_bytes = surface.format().info().block_byte_size as usize;
    let size = surface.size_in_bytes();
    let Some(bytes) = surface_bytes(surface.data_mut(), size) else {
        return false;
    };
    bytes.chunks_exact_mut(block_bytes).for_each(&mut f);
    true
}

/// [`transform_surface`] on every surface.
pub fn transform_texture(mut texture: TextureSpan<'_>, mut f: impl FnMut(&mut [u8])) -> bool {
    if texture.is_empty() {
        return false;
    }
    surface_coords(texture.as_view())
        .all(|(slice, face, mip)| transform_surface(texture.surface_mut(slice, face, mip), &mut f))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DEFAULT_CLEAR_COLOR;
    use crate::format::Format;
    use crate::params::{TextureDimension, TextureParams};
    use crate::unique::UniqueTexture;
    use proptest::prelude::*;
    use rgb::Rgba;

    fn texture_2d(format: Format, x: u32, y: u32) -> UniqueTexture {
        UniqueTexture::new(TextureParams::new(format, TextureDimension::Texture2D, Extent::new_2d(x, y)))
    }

    fn numbered(texture: &mut UniqueTexture) {
        for (i, b) in texture.data_mut().iter_mut().enumerate() {
            *b = i as u8;
        }
    }

    // --- clear ---

    #[test]
    fn clear_replicates_encoded_color() {
        let mut texture = texture_2d(Format::Rgba8Unorm, 3, 2);
        assert!(clear_surface(texture.surface_mut(0, 0, 0), Rgba::new(1.0, 0.0, 0.5, 1.0)));
        for texel in texture.surface_data(0, 0, 0).chunks_exact(4) {
            assert_eq!(texel, &[255, 0, 128, 255]);
        }
    }

    #[test]
    fn clear_default_color_is_opaque_black() {
        let mut texture = UniqueTexture::new(
            TextureParams::new(Format::Bgra8Unorm, TextureDimension::TextureCube, Extent::new_2d(2, 2)).with_mips(2),
        );
        assert!(clear(texture.span(), DEFAULT_CLEAR_COLOR));
        for texel in texture.surface_data(0, 5, 1).chunks_exact(4) {
            assert_eq!(texel, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn clear_is_noop_for_compressed_and_depth() {
        let mut bc = texture_2d(Format::Bc1RgbaUnorm, 4, 4);
        numbered(&mut bc);
        let before = bc.data().to_vec();
        assert!(!clear(bc.span(), DEFAULT_CLEAR_COLOR));
        assert_eq!(bc.data(), &before[..]);

        let mut depth = texture_2d(Format::D32Float, 2, 2);
        assert!(!clear_surface(depth.surface_mut(0, 0, 0), DEFAULT_CLEAR_COLOR));
    }

    // --- flips ---

    #[test]
    fn flip_vertical_swaps_rows() {
        let mut texture = texture_2d(Format::R8Unorm, 2, 3);
        texture.surface_data_mut(0, 0, 0)[..6].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert!(flip_vertical(texture.surface_mut(0, 0, 0)));
        assert_eq!(&texture.surface_data(0, 0, 0)[..6], &[5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn flip_horizontal_mirrors_rows() {
        let mut texture = texture_2d(Format::Rg8Unorm, 3, 1);
        texture.surface_data_mut(0, 0, 0)[..6].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert!(flip_horizontal(texture.surface_mut(0, 0, 0)));
        assert_eq!(&texture.surface_data(0, 0, 0)[..6], &[5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn flip_vertical_works_per_volume_slice() {
        let params = TextureParams::new(Format::R8Uint, TextureDimension::Texture3D, Extent::new(1, 2, 2));
        let mut texture = UniqueTexture::with_data(params, &[1, 2, 3, 4]);
        assert!(flip_vertical(texture.surface_mut(0, 0, 0)));
        assert_eq!(texture.surface_data(0, 0, 0), &[2, 1, 4, 3]);
    }

    #[test]
    fn flips_reject_compressed_surfaces() {
        let mut texture = texture_2d(Format::Bc3Unorm, 8, 8);
        numbered(&mut texture);
        let before = texture.data().to_vec();
        assert!(!flip_vertical(texture.surface_mut(0, 0, 0)));
        assert!(!flip_horizontal(texture.surface_mut(0, 0, 0)));
        assert!(!flip_vertical_texture(texture.span()));
        assert_eq!(texture.data(), &before[..]);
    }

    #[test]
    fn flip_to_requires_equivalent_layout() {
        let mut src = texture_2d(Format::Rgba8Unorm, 2, 2);
        numbered(&mut src);
        let mut wrong_size = texture_2d(Format::Rgba8Unorm, 2, 4);
        let mut wrong_format = texture_2d(Format::Rgba8Uint, 2, 2);
        assert!(!flip_vertical_to(src.surface(0, 0, 0), wrong_size.surface_mut(0, 0, 0)));
        assert!(!flip_horizontal_to(src.surface(0, 0, 0), wrong_format.surface_mut(0, 0, 0)));

        let mut dst = texture_2d(Format::Rgba8Unorm, 2, 2);
        assert!(flip_horizontal_to(src.surface(0, 0, 0), dst.surface_mut(0, 0, 0)));
        assert_eq!(&dst.surface_data(0, 0, 0)[..8], &[4, 5, 6, 7, 0, 1, 2, 3]);
        assert!(flip_vertical_to(src.surface(0, 0, 0), dst.surface_mut(0, 0, 0)));
        assert_eq!(&dst.surface_data(0, 0, 0)[..8], &[8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn texture_flip_to_covers_every_surface() {
        let params = TextureParams::new(Format::R8Unorm, TextureDimension::Texture2D, Extent::new_2d(2, 2))
            .with_array_size(2)
            .with_mips(2);
        let mut src = UniqueTexture::new(params);
        numbered(&mut src);
        let mut dst = UniqueTexture::new(params);
        assert!(flip_vertical_texture_to(src.view(), dst.span()));
        assert_eq!(&dst.surface_data(1, 0, 0)[..4], &[10, 11, 8, 9]);
        assert_eq!(dst.surface_data(1, 0, 1)[0], src.surface_data(1, 0, 1)[0]);

        let other = UniqueTexture::new(params.with_array_size(1));
        let mut other_dst = UniqueTexture::new(params.with_array_size(1));
        assert!(!flip_horizontal_texture_to(src.view(), other_dst.span()));
        assert!(flip_horizontal_texture_to(other.view(), other_dst.span()));
    }

    // --- region copy ---

    #[test]
    fn copy_region_between_surfaces() {
        let mut src = texture_2d(Format::R8Unorm, 4, 4);
        numbered(&mut src);
        let mut dst = texture_2d(Format::R8Unorm, 4, 4);
        assert!(copy_surface_region_to(
            src.surface(0, 0, 0),
            Extent::new(1, 1, 0),
            dst.surface_mut(0, 0, 0),
            Extent::new(0, 2, 0),
            Extent::new(2, 2, 1),
        ));
        let out = dst.surface_data(0, 0, 0);
        assert_eq!(&out[8..12], &[5, 6, 0, 0]);
        assert_eq!(&out[12..16], &[9, 10, 0, 0]);
        assert!(out[..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn copy_region_allows_touching_the_far_edge() {
        let src = texture_2d(Format::R8Unorm, 4, 4);
        let mut dst = texture_2d(Format::R8Unorm, 4, 4);
        assert!(copy_surface_region_to(
            src.surface(0, 0, 0),
            Extent::new(2, 2, 0),
            dst.surface_mut(0, 0, 0),
            Extent::new(2, 2, 0),
            Extent::new(2, 2, 1),
        ));
        assert!(!copy_surface_region_to(
            src.surface(0, 0, 0),
            Extent::new(3, 0, 0),
            dst.surface_mut(0, 0, 0),
            Extent::ZERO,
            Extent::new(2, 1, 1),
        ));
    }

    #[test]
    fn copy_region_needs_block_alignment_and_same_format() {
        let mut src = texture_2d(Format::Bc1RgbaUnorm, 8, 8);
        numbered(&mut src);
        let mut dst = texture_2d(Format::Bc1RgbaUnorm, 8, 8);
        assert!(!copy_surface_region_to(
            src.surface(0, 0, 0),
            Extent::new(2, 0, 0),
            dst.surface_mut(0, 0, 0),
            Extent::ZERO,
            Extent::new(4, 4, 1),
        ));
        assert!(copy_surface_region_to(
            src.surface(0, 0, 0),
            Extent::new(4, 4, 0),
            dst.surface_mut(0, 0, 0),
            Extent::ZERO,
            Extent::new(4, 4, 1),
        ));
        // Block (1, 1) of the source is its fourth 8-byte block.
        assert_eq!(&dst.surface_data(0, 0, 0)[..8], &src.surface_data(0, 0, 0)[24..32]);

        let mut r8 = texture_2d(Format::R8Unorm, 8, 8);
        assert!(!copy_surface_region_to(
            src.surface(0, 0, 0),
            Extent::ZERO,
            r8.surface_mut(0, 0, 0),
            Extent::ZERO,
            Extent::new(4, 4, 1),
        ));
    }

    // --- decompression ---

    fn solid_bc1(texture: &mut UniqueTexture) {
        // color0 = pure red (565), all indices 0.
        let block = [0x00, 0xf8, 0x00, 0x00, 0, 0, 0, 0];
        for chunk in texture.data_mut().chunks_exact_mut(8) {
            chunk.copy_from_slice(&block);
        }
    }

    #[test]
    fn decompress_surface_to_allowed_targets() {
        let mut src = texture_2d(Format::Bc1RgbaUnorm, 4, 4);
        solid_bc1(&mut src);

        let mut rgba = texture_2d(Format::Rgba8Unorm, 4, 4);
        assert!(decompress_surface_to(src.surface(0, 0, 0), rgba.surface_mut(0, 0, 0)));
        assert_eq!(&rgba.surface_data(0, 0, 0)[..4], &[255, 0, 0, 255]);

        let mut bgra = texture_2d(Format::Bgra8Unorm, 4, 4);
        assert!(decompress_surface_to(src.surface(0, 0, 0), bgra.surface_mut(0, 0, 0)));
        assert_eq!(&bgra.surface_data(0, 0, 0)[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn decompress_surface_rejects_bad_targets() {
        let mut src = texture_2d(Format::Bc1RgbaUnorm, 4, 4);
        solid_bc1(&mut src);
        let mut r8 = texture_2d(Format::R8Unorm, 4, 4);
        assert!(!decompress_surface_to(src.surface(0, 0, 0), r8.surface_mut(0, 0, 0)));
        let mut small = texture_2d(Format::Rgba8Unorm, 2, 2);
        assert!(!decompress_surface_to(src.surface(0, 0, 0), small.surface_mut(0, 0, 0)));
        let plain = texture_2d(Format::Rgba8Unorm, 4, 4);
        let mut dst = texture_2d(Format::Rgba8Unorm, 4, 4);
        assert!(!decompress_surface_to(plain.surface(0, 0, 0), dst.surface_mut(0, 0, 0)));
    }

    #[test]
    fn decompress_texture_covers_mips() {
        let params = TextureParams::new(Format::Bc1RgbaUnorm, TextureDimension::Texture2D, Extent::new_2d(8, 8))
            .with_full_mip_chain();
        let mut src = UniqueTexture::new(params);
        solid_bc1(&mut src);
        let mut dst = UniqueTexture::new(TextureParams { format: Format::Rgba8Unorm, ..params });
        assert!(decompress_texture_to(src.view(), dst.span()));
        for mip in 0..dst.mips() {
            assert_eq!(&dst.surface_data(0, 0, mip)[..4], &[255, 0, 0, 255]);
        }
    }

    // --- transforms ---

    #[test]
    fn transform_visits_every_block() {
        let params = TextureParams::new(Format::Rgba8Unorm, TextureDimension::Texture2D, Extent::new_2d(4, 4))
            .with_mips(3);
        let mut texture = UniqueTexture::new(params);
        let mut visited = 0;
        assert!(transform_texture(texture.span(), |block| {
            block[3] = 200;
            visited += 1;
        }));
        assert_eq!(visited, 16 + 4 + 1);
        assert_eq!(texture.surface_data(0, 0, 2)[3], 200);

        assert!(transform_surface(texture.surface_mut(0, 0, 0), |block| block.swap(0, 3)));
        assert_eq!(&texture.surface_data(0, 0, 0)[..4], &[200, 0, 0, 0]);
        assert!(!transform_texture(TextureSpan::default(), |_| {}));
    }

    // --- properties ---

    fn flippable_format() -> impl Strategy<Value = Format> {
        prop_oneof![
            Just(Format::R8Unorm),
            Just(Format::Rg8Unorm),
            Just(Format::Rgba8Unorm),
            Just(Format::R16Float),
            Just(Format::Rgba32Float),
            Just(Format::R5G6B5UnormPack16),
        ]
    }

    proptest! {
        #[test]
        fn flips_are_involutions(
            format in flippable_format(),
            x in 1u32..9,
            y in 1u32..9,
            z in 1u32..4,
            seed in any::<u8>(),
        ) {
            let params = TextureParams::new(format, TextureDimension::Texture3D, Extent::new(x, y, z));
            let mut texture = UniqueTexture::new(params);
            for (i, b) in texture.data_mut().iter_mut().enumerate() {
                *b = (i as u8).wrapping_mul(31).wrapping_add(seed);
            }
            let before = texture.data().to_vec();

            prop_assert!(flip_vertical(texture.surface_mut(0, 0, 0)));
            prop_assert!(flip_vertical(texture.surface_mut(0, 0, 0)));
            prop_assert_eq!(texture.data(), &before[..]);

            prop_assert!(flip_horizontal(texture.surface_mut(0, 0, 0)));
            prop_assert!(flip_horizontal(texture.surface_mut(0, 0, 0)));
            prop_assert_eq!(texture.data(), &before[..]);
        }
    }
}
