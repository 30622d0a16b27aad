//! CPU-side texture storage, views and conversion.
//!
//! A texture is one packed allocation holding every (array slice, face,
//! mip) surface of a 1D, 2D, 3D or cube texture, in any of the supported
//! GPU [`Format`]s including block-compressed ones.
//!
//! - [`TextureParams`] / [`Extent`] / [`TextureDimension`]: creation config
//! - [`TextureStorage`]: the packed allocation and its surface table
//! - [`UniqueTexture`] / [`SharedTexture`]: exclusive and reference-counted owners
//! - [`TextureView`] / [`TextureSpan`] and their per-surface forms: borrowed accessors
//! - [`SurfaceView`] / [`SurfaceSpan`]: minimal (format, extent, bytes) descriptors
//! - [`BlockSampler`] / [`TexelWriter`]: the per-format codec
//! - [`Converter`], [`Sampler`] and the [`ops`] functions: algorithms over views
//!
//! Invalid creation params never panic: they produce an empty texture whose
//! queries return neutral values. Use the `try_new` constructors to learn
//! why params were rejected.

#![forbid(unsafe_code)]

mod bc;
mod codec;
mod convert;
mod format;
pub mod ops;
mod params;
mod sampler;
mod shared;
mod storage;
mod surface;
mod unique;
mod view;

pub use codec::{
    BlockSampler, CodecError, DEFAULT_CLEAR_COLOR, MAX_BLOCK_TEXEL_COUNT, Sample, TexelWriter, decompress,
};
pub use convert::{ConvertError, Converter};
pub use format::{Format, FormatInfo};
pub use params::{
    DEFAULT_SURFACE_BYTE_ALIGNMENT, Extent, MAX_EXTENT_COMPONENT, MAX_MIP_COUNT, TextureDimension, TextureParams,
    max_mips,
};
pub use sampler::Sampler;
pub use shared::{SharedTexture, SharedTextureLock, SharedTextureRead, WeakTexture};
pub use storage::{LayoutError, RefCount, TextureStorage};
pub use surface::{SurfaceSpan, SurfaceView};
pub use unique::UniqueTexture;
pub use view::{TextureSpan, TextureSurfaceSpan, TextureSurfaceView, TextureView};

// Re-exports for callers building samples and images.
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb;
pub use rgb::Rgba;
