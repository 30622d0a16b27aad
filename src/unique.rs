//! Exclusively owned textures.

use core::fmt;

use imgref::ImgRef;
use rgb::alt::BGRA;
use rgb::{Gray, Rgba};

use crate::format::Format;
use crate::params::{Extent, TextureDimension, TextureParams};
use crate::shared::SharedTexture;
use crate::storage::{LayoutError, TextureStorage};
use crate::view::{TextureSpan, TextureView, texture_mut_accessors, texture_queries};

/// Sole owner of a texture allocation.
///
/// Not implicitly copyable; [`Clone`] makes a deep copy with a fresh
/// allocation. Dropping it releases the pixel bytes.
///
/// ```
/// use cputex::{Extent, Format, TextureDimension, TextureParams, UniqueTexture};
///
/// let params = TextureParams::new(Format::Rgba8Unorm, TextureDimension::Texture2D, Extent::new_2d(4, 4));
/// let mut texture = UniqueTexture::new(params);
/// texture.surface_data_mut(0, 0, 0)[0] = 255;
///
/// let copy = texture.clone();
/// texture.surface_data_mut(0, 0, 0)[0] = 0;
/// assert_eq!(copy.surface_data(0, 0, 0)[0], 255);
/// ```
#[derive(Default)]
pub struct UniqueTexture {
    storage: TextureStorage,
}

impl UniqueTexture {
    /// Zero-filled texture, or an empty one if `params` are invalid.
    pub fn new(params: TextureParams) -> Self {
        Self {
            storage: TextureStorage::new(params),
        }
    }

    /// Texture initialized from `initial`, truncated or zero-padded to its size.
    /// Empty if `params` are invalid.
    pub fn with_data(params: TextureParams, initial: &[u8]) -> Self {
        Self {
            storage: TextureStorage::with_data(params, initial),
        }
    }

    /// # Errors
    ///
    /// Returns the [`LayoutError`] that made `params` invalid.
    pub fn try_new(params: TextureParams, initial: &[u8]) -> Result<Self, LayoutError> {
        Ok(Self {
            storage: TextureStorage::try_new(params, initial)?,
        })
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.storage.is_valid()
    }

    #[inline]
    pub fn view(&self) -> TextureView<'_> {
        self.storage.view()
    }

    #[inline]
    pub fn span(&mut self) -> TextureSpan<'_> {
        self.storage.span()
    }

    /// Hand the allocation over to a reference-counted owner.
    pub fn into_shared(self) -> SharedTexture {
        SharedTexture::from_storage(self.storage)
    }

    texture_queries!(view);
    texture_mut_accessors!(span);
}

impl Clone for UniqueTexture {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.deep_copy(),
        }
    }
}

impl fmt::Debug for UniqueTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniqueTexture({:?})", self.view())
    }
}

impl From<TextureStorage> for UniqueTexture {
    fn from(storage: TextureStorage) -> Self {
        Self { storage }
    }
}

impl<'a> From<&'a UniqueTexture> for TextureView<'a> {
    fn from(texture: &'a UniqueTexture) -> Self {
        texture.view()
    }
}

impl<'a> From<&'a mut UniqueTexture> for TextureSpan<'a> {
    fn from(texture: &'a mut UniqueTexture) -> Self {
        texture.span()
    }
}

// ---------------------------------------------------------------------------
// ImgRef -> UniqueTexture (copying From impls)
// ---------------------------------------------------------------------------

macro_rules! impl_from_imgref {
    ($pixel:ty, $format:expr) => {
        impl<'a> From<ImgRef<'a, $pixel>> for UniqueTexture {
            /// Single-surface 2D texture holding a tightly packed copy of `img`.
            fn from(img: ImgRef<'a, $pixel>) -> Self {
                use rgb::ComponentBytes;
                let row_bytes = img.width() * core::mem::size_of::<$pixel>();
                let mut bytes = Vec::with_capacity(row_bytes * img.height());
                for row in img.rows() {
                    bytes.extend_from_slice(row.as_bytes());
                }
                let extent = Extent::new_2d(img.width() as u32, img.height() as u32);
                let params = TextureParams::new($format, TextureDimension::Texture2D, extent)
                    .with_surface_byte_alignment(1);
                Self::with_data(params, &bytes)
            }
        }
    };
}

impl_from_imgref!(Rgba<u8>, Format::Rgba8Unorm);
impl_from_imgref!(BGRA<u8>, Format::Bgra8Unorm);
impl_from_imgref!(Gray<u8>, Format::R8Unorm);
impl_from_imgref!(Rgba<u16>, Format::Rgba16Unorm);
impl_from_imgref!(Rgba<f32>, Format::Rgba32Float);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
