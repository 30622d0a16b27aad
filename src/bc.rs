//! BC1-BC5 block decoders.
//!
//! Every decoder turns one 4x4 block into sixteen RGBA8 texels in
//! row-major order. Single- and dual-channel formats (BC4, BC5) fill the
//! unused channels with `0` and alpha with `255`.

/// Decoded texels of one block, row-major.
pub(crate) type Texels = [[u8; 4]; 16];

/// BC family member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BcKind {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
}

impl BcKind {
    pub(crate) const fn block_bytes(self) -> usize {
        match self {
            Self::Bc1 | Self::Bc4 => 8,
            Self::Bc2 | Self::Bc3 | Self::Bc5 => 16,
        }
    }

    /// Channels a decompressed texel carries.
    pub(crate) const fn channels(self) -> usize {
        match self {
            Self::Bc4 => 1,
            Self::Bc5 => 2,
            Self::Bc1 | Self::Bc2 | Self::Bc3 => 4,
        }
    }
}

/// Decode one block. Returns `None` if `block` is shorter than the block size.
pub(crate) fn decode_block(kind: BcKind, block: &[u8]) -> Option<Texels> {
    let block = block.get(..kind.block_bytes())?;
    let texels = match kind {
        BcKind::Bc1 => decode_bc1(block),
        BcKind::Bc2 => decode_bc2(block),
        BcKind::Bc3 => decode_bc3(block),
        BcKind::Bc4 => {
            let red = decode_alpha_block(block);
            core::array::from_fn(|i| [red[i], 0, 0, 255])
        }
        BcKind::Bc5 => {
            let red = decode_alpha_block(&block[..8]);
            let green = decode_alpha_block(&block[8..]);
            core::array::from_fn(|i| [red[i], green[i], 0, 255])
        }
    };
    Some(texels)
}

// ---------------------------------------------------------------------------
// Color endpoints
// ---------------------------------------------------------------------------

fn rgb565_to_rgb888(c: u16) -> [u8; 3] {
    let r5 = ((c >> 11) & 0x1f) as u8;
    let g6 = ((c >> 5) & 0x3f) as u8;
    let b5 = (c & 0x1f) as u8;
    // Replicate high bits into the low bits.
    [(r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2)]
}

fn lerp_u8(a: u8, b: u8, num: u32, den: u32) -> u8 {
    ((a as u32 * (den - num) + b as u32 * num) / den) as u8
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], num: u32, den: u32, alpha: u8) -> [u8; 4] {
    [
        lerp_u8(a[0], b[0], num, den),
        lerp_u8(a[1], b[1], num, den),
        lerp_u8(a[2], b[2], num, den),
        alpha,
    ]
}

/// Four-entry palette of a color block. `punch_through` enables BC1's
/// three-color mode when `color0 <= color1`.
fn color_palette(color0: u16, color1: u16, punch_through: bool) -> [[u8; 4]; 4] {
    let c0 = rgb565_to_rgb888(color0);
    let c1 = rgb565_to_rgb888(color1);
    let e0 = [c0[0], c0[1], c0[2], 255];
    let e1 = [c1[0], c1[1], c1[2], 255];
    if color0 > color1 || !punch_through {
        [e0, e1, lerp_rgb(c0, c1, 1, 3, 255), lerp_rgb(c0, c1, 2, 3, 255)]
    } else {
        [e0, e1, lerp_rgb(c0, c1, 1, 2, 255), [0, 0, 0, 0]]
    }
}

/// Decode the 8-byte color half shared by BC1, BC2 and BC3.
fn decode_color_block(block: &[u8], punch_through: bool) -> Texels {
    let color0 = u16::from_le_bytes([block[0], block[1]]);
    let color1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let palette = color_palette(color0, color1, punch_through);
    core::array::from_fn(|i| palette[((indices >> (2 * i)) & 0b11) as usize])
}

// ---------------------------------------------------------------------------
// Alpha / single-channel blocks
// ---------------------------------------------------------------------------

fn alpha_palette(alpha0: u8, alpha1: u8) -> [u8; 8] {
    let mut a = [alpha0, alpha1, 0, 0, 0, 0, 0, 0];
    if alpha0 > alpha1 {
        for (i, slot) in a[2..].iter_mut().enumerate() {
            *slot = lerp_u8(alpha0, alpha1, i as u32 + 1, 7);
        }
    } else {
        for (i, slot) in a[2..6].iter_mut().enumerate() {
            *slot = lerp_u8(alpha0, alpha1, i as u32 + 1, 5);
        }
        a[7] = 255;
    }
    a
}

/// Decode an 8-byte interpolated channel block (BC3 alpha, BC4, BC5 halves).
fn decode_alpha_block(block: &[u8]) -> [u8; 16] {
    let palette = alpha_palette(block[0], block[1]);
    // 48 bits of 3-bit indices, little-endian.
    let indices = block[2..8]
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (8 * i));
    core::array::from_fn(|i| palette[((indices >> (3 * i)) & 0b111) as usize])
}

// ---------------------------------------------------------------------------
// Block formats
// ---------------------------------------------------------------------------

fn decode_bc1(block: &[u8]) -> Texels {
    decode_color_block(block, true)
}

fn decode_bc2(block: &[u8]) -> Texels {
    let alpha_bits = block[..8]
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (b as u64) << (8 * i));
    let mut texels = decode_color_block(&block[8..], false);
    for (i, texel) in texels.iter_mut().enumerate() {
        texel[3] = ((alpha_bits >> (4 * i)) & 0xf) as u8 * 17;
    }
    texels
}

fn decode_bc3(block: &[u8]) -> Texels {
    let alpha = decode_alpha_block(&block[..8]);
    let mut texels = decode_color_block(&block[8..], false);
    for (texel, a) in texels.iter_mut().zip(alpha) {
        texel[3] = a;
    }
    texels
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
