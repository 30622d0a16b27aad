//! Point sampling of texture texels.

use crate::codec::{BlockSampler, MAX_BLOCK_TEXEL_COUNT, Sample};
use crate::params::Extent;
use crate::view::TextureView;

/// Reads individual texels of one texture as [`Sample`]s.
///
/// Each lookup decodes the whole block containing the texel. Lookups that
/// fall outside the texture, or hit an undecodable format, return `None`.
///
/// ```
/// use cputex::{Extent, Format, Sampler, TextureDimension, TextureParams, UniqueTexture};
///
/// let params = TextureParams::new(Format::R8Uint, TextureDimension::Texture2D, Extent::new_2d(2, 2));
/// let texture = UniqueTexture::with_data(params, &[1, 2, 3, 4]);
/// let sampler = Sampler::new(texture.view());
///
/// assert_eq!(sampler.load([1, 1, 0], 0, 0, 0).map(|s| s.r), Some(4.0));
/// assert_eq!(sampler.sample([1.0, 1.0, 1.0], 0, 0, 0).map(|s| s.r), Some(1.0));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Sampler<'a> {
    texture: TextureView<'a>,
    block: BlockSampler,
}

impl<'a> Sampler<'a> {
    pub fn new(texture: impl Into<TextureView<'a>>) -> Self {
        let texture = texture.into();
        Self {
            texture,
            block: BlockSampler::new(texture.format()),
        }
    }

    #[inline]
    pub fn texture(&self) -> TextureView<'a> {
        self.texture
    }

    #[inline]
    pub fn block_extent(&self) -> Extent {
        self.block.block_extent()
    }

    #[inline]
    pub fn block_texel_count(&self) -> usize {
        self.block.block_texel_count()
    }

    /// Nearest texel at normalized coordinates `uv`.
    ///
    /// Coordinates outside `[0, 1)` wrap by their fractional part, so `1.0`
    /// lands on texel 0.
    pub fn sample(&self, uv: [f32; 3], array_slice: u32, face: u32, mip: u32) -> Option<Sample> {
        let mut scratch = [Sample::default(); MAX_BLOCK_TEXEL_COUNT];
        self.sample_with(uv, array_slice, face, mip, &mut scratch)
    }

    /// [`sample`](Self::sample) decoding into a caller-supplied block buffer.
    pub fn sample_with(
        &self,
        uv: [f32; 3],
        array_slice: u32,
        face: u32,
        mip: u32,
        scratch: &mut [Sample],
    ) -> Option<Sample> {
        if self.texture.is_empty() {
            return None;
        }
        let extent = self.texture.extent(mip);
        let axis = |c: f32, size: u32| -> u32 {
            let c = if (0.0..1.0).contains(&c) { c } else { c - c.floor() };
            (size.saturating_sub(1) as f32 * c + 0.5).floor() as u32
        };
        let texel = [
            axis(uv[0], extent.x),
            axis(uv[1], extent.y),
            axis(uv[2], extent.z),
        ];
        self.load_with(texel, array_slice, face, mip, scratch)
    }

    /// Texel at integer coordinates `texel`.
    pub fn load(&self, texel: [u32; 3], array_slice: u32, face: u32, mip: u32) -> Option<Sample> {
        let mut scratch = [Sample::default(); MAX_BLOCK_TEXEL_COUNT];
        self.load_with(texel, array_slice, face, mip, &mut scratch)
    }

    /// [`load`](Self::load) decoding into a caller-supplied block buffer,
    /// which must hold at least [`block_texel_count`](Self::block_texel_count)
    /// samples.
    pub fn load_with(
        &self,
        texel: [u32; 3],
        array_slice: u32,
        face: u32,
        mip: u32,
        scratch: &mut [Sample],
    ) -> Option<Sample> {
        if self.texture.is_empty() || scratch.len() < self.block_texel_count() {
            return None;
        }
        let extent = self.texture.extent(mip);
        let [x, y, z] = texel;
        if x >= extent.x || y >= extent.y || z >= extent.z {
            return None;
        }

        let slice = self.texture.volume_slice_data(array_slice, face, mip, z);
        let block = self.block_extent();
        let blocks_per_row = extent.x.div_ceil(block.x) as usize;
        let block_index = (y / block.y) as usize * blocks_per_row + (x / block.x) as usize;
        let bytes = slice.get(block_index * self.block.block_byte_size()..)?;
        self.block.decode_block(bytes, scratch).ok()?;

        let in_block = (z % block.z) * block.x * block.y + (y % block.y) * block.x + x % block.x;
        scratch.get(in_block as usize).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::params::{TextureDimension, TextureParams};
    use crate::unique::UniqueTexture;

    /// 4x4 R4G4 texture with a full mip request, seeded with the bytes of
    /// the `u32` sequence 0..32.
    fn r4g4_texture() -> UniqueTexture {
        let params = TextureParams::new(Format::R4G4UnormPack8, TextureDimension::Texture2D, Extent::new(4, 4, 0))
            .with_mips(15);
        let seed: Vec<u8> = (0u32..32).flat_map(u32::to_le_bytes).collect();
        UniqueTexture::with_data(params, &seed)
    }

    #[test]
    fn load_at_origin_matches_codec() {
        let texture = r4g4_texture();
        assert_eq!(texture.mips(), 3);
        let sampler = Sampler::new(texture.view());
        let origin = sampler.load([0, 0, 0], 0, 0, 0).unwrap();
        let mut expected = [Sample::default(); 1];
        BlockSampler::new(Format::R4G4UnormPack8)
            .decode_block(texture.surface_data(0, 0, 0), &mut expected)
            .unwrap();
        assert_eq!(origin, expected[0]);
    }

    #[test]
    fn sample_rounds_to_nearest_texel() {
        let texture = r4g4_texture();
        let sampler = Sampler::new(texture.view());
        // (0.0, 0.5) on a 4x4 surface rounds to texel (0, 2): byte 8, which
        // is the low byte of the seed's third u32.
        let sample = sampler.sample([0.0, 0.5, 0.0], 0, 0, 0).unwrap();
        assert_eq!(sample.r, 0.0);
        assert_eq!(sample.g, 2.0 / 15.0);
        assert_eq!(sample.a, 1.0);
    }

    #[test]
    fn sample_wraps_one_and_negative_coordinates() {
        let params = TextureParams::new(Format::R8Uint, TextureDimension::Texture2D, Extent::new_2d(2, 2));
        let texture = UniqueTexture::with_data(params, &[10, 20, 30, 40]);
        let sampler = Sampler::new(texture.view());
        let r = |uv| sampler.sample(uv, 0, 0, 0).map(|s| s.r);
        assert_eq!(r([1.0, 1.0, 1.0]), Some(10.0));
        assert_eq!(r([0.99, 0.99, 0.0]), Some(40.0));
        assert_eq!(r([-0.25, 0.0, 0.0]), Some(20.0));
        assert_eq!(r([2.75, 1.5, 0.0]), Some(40.0));
    }

    #[test]
    fn load_reads_mips_and_volume_slices() {
        let params = TextureParams::new(Format::R8Uint, TextureDimension::Texture3D, Extent::new(2, 2, 2))
            .with_mips(2)
            .with_surface_byte_alignment(1);
        let texture = UniqueTexture::with_data(params, &[0, 1, 2, 3, 4, 5, 6, 7, 99]);
        let sampler = Sampler::new(texture.view());
        assert_eq!(sampler.load([1, 0, 1], 0, 0, 0).map(|s| s.r), Some(5.0));
        assert_eq!(sampler.load([0, 0, 0], 0, 0, 1).map(|s| s.r), Some(99.0));
        assert_eq!(sampler.load([1, 0, 0], 0, 0, 1), None);
    }

    #[test]
    fn load_decodes_compressed_blocks() {
        // Two BC4 blocks side by side: constant 0 and constant 255.
        let mut blocks = [0u8; 16];
        blocks[8] = 255;
        blocks[9] = 255;
        let params = TextureParams::new(Format::Bc4Unorm, TextureDimension::Texture2D, Extent::new_2d(8, 4));
        let texture = UniqueTexture::with_data(params, &blocks);
        let sampler = Sampler::new(texture.view());
        assert_eq!(sampler.load([3, 3, 0], 0, 0, 0).map(|s| s.r), Some(0.0));
        assert_eq!(sampler.load([5, 2, 0], 0, 0, 0).map(|s| s.r), Some(1.0));
    }

    #[test]
    fn neutral_results() {
        let empty = Sampler::new(TextureView::default());
        assert_eq!(empty.load([0, 0, 0], 0, 0, 0), None);
        assert_eq!(empty.sample([0.0; 3], 0, 0, 0), None);

        let texture = r4g4_texture();
        let sampler = Sampler::new(texture.view());
        assert_eq!(sampler.load([4, 0, 0], 0, 0, 0), None);
        assert_eq!(sampler.load([0, 0, 0], 1, 0, 0), None);
        assert_eq!(sampler.load_with([0, 0, 0], 0, 0, 0, &mut []), None);

        let depth = UniqueTexture::new(TextureParams::new(
            Format::D32Float,
            TextureDimension::Texture2D,
            Extent::new_2d(2, 2),
        ));
        assert_eq!(Sampler::new(depth.view()).load([0, 0, 0], 0, 0, 0), None);
    }
}
