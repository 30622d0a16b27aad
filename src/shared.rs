//! Reference-counted textures.
//!
//! Every [`SharedTexture`] copy points at one [`SharedAllocation`] that
//! carries the strong [`RefCount`], a byte-less copy of the layout and a
//! reader-writer lock around the [`TextureStorage`]. All copies serialize
//! on that one lock for the bytes. Geometry never changes after
//! construction, so queries read the copy and never lock. The pixel bytes
//! are released under the write lock when the last strong handle drops;
//! [`WeakTexture`] observes the release.

use core::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::format::Format;
use crate::params::{Extent, TextureDimension, TextureParams};
use crate::storage::{LayoutError, RefCount, TextureStorage};
use crate::view::{TextureSpan, TextureView, texture_mut_accessors, texture_queries};

struct SharedAllocation {
    refs: RefCount,
    geometry: TextureStorage,
    storage: RwLock<TextureStorage>,
}

// ---------------------------------------------------------------------------
// SharedTexture
// ---------------------------------------------------------------------------

/// Reference-counted owner of a texture allocation.
///
/// `Clone` shares the allocation. Geometry queries are lock-free and may be
/// called while a guard is held; use [`read`](Self::read) or
/// [`lock`](Self::lock) to reach the bytes.
///
/// ```
/// use cputex::{Extent, Format, SharedTexture, TextureDimension, TextureParams};
///
/// let params = TextureParams::new(Format::R8Unorm, TextureDimension::Texture2D, Extent::new_2d(4, 4));
/// let texture = SharedTexture::new(params);
/// let other = texture.clone();
///
/// other.lock().surface_data_mut(0, 0, 0)[0] = 7;
/// assert_eq!(texture.read().surface_data(0, 0, 0)[0], 7);
/// assert_eq!(texture.strong_count(), 2);
/// ```
#[derive(Default)]
pub struct SharedTexture {
    alloc: Option<Arc<SharedAllocation>>,
}

impl SharedTexture {
    /// Zero-filled texture, or an empty handle if `params` are invalid.
    pub fn new(params: TextureParams) -> Self {
        Self::from_storage(TextureStorage::new(params))
    }

    /// Texture initialized from `initial`. Empty if `params` are invalid.
    pub fn with_data(params: TextureParams, initial: &[u8]) -> Self {
        Self::from_storage(TextureStorage::with_data(params, initial))
    }

    /// # Errors
    ///
    /// Returns the [`LayoutError`] that made `params` invalid.
    pub fn try_new(params: TextureParams, initial: &[u8]) -> Result<Self, LayoutError> {
        Ok(Self::from_storage(TextureStorage::try_new(params, initial)?))
    }

    pub(crate) fn from_storage(storage: TextureStorage) -> Self {
        if !storage.is_valid() {
            return Self::default();
        }
        Self {
            alloc: Some(Arc::new(SharedAllocation {
                refs: RefCount::new(),
                geometry: storage.geometry(),
                storage: RwLock::new(storage),
            })),
        }
    }

    /// Exclusive access for the guard's lifetime, shared with every copy.
    pub fn lock(&self) -> SharedTextureLock<'_> {
        SharedTextureLock {
            guard: self.alloc.as_deref().map(|a| a.storage.write()),
        }
    }

    /// Shared read access for the guard's lifetime.
    pub fn read(&self) -> SharedTextureRead<'_> {
        SharedTextureRead {
            guard: self.alloc.as_deref().map(|a| a.storage.read()),
        }
    }

    /// Fresh, independent allocation with identical params and bytes.
    ///
    /// Takes the read lock. While this thread holds [`lock`](Self::lock),
    /// use [`SharedTextureLock::deep_clone`] instead.
    pub fn deep_clone(&self) -> SharedTexture {
        match self.alloc.as_deref() {
            Some(alloc) => Self::from_storage(alloc.storage.read().deep_copy()),
            None => Self::default(),
        }
    }

    /// Handle that observes the allocation without keeping it alive.
    pub fn downgrade(&self) -> WeakTexture {
        WeakTexture {
            alloc: self.alloc.clone(),
        }
    }

    /// Live strong handles to this allocation; `0` for an empty handle.
    pub fn strong_count(&self) -> u32 {
        self.alloc.as_deref().map_or(0, |a| a.refs.strong_count())
    }

    /// Whether both handles share one allocation.
    pub fn ptr_eq(&self, other: &SharedTexture) -> bool {
        match (&self.alloc, &other.alloc) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.alloc.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    fn with_view<R>(&self, f: impl FnOnce(TextureView<'_>) -> R) -> R {
        f(self
            .alloc
            .as_deref()
            .map(|a| a.geometry.view())
            .unwrap_or_default())
    }

    pub fn params(&self) -> Option<TextureParams> {
        self.with_view(|v| v.params())
    }

    pub fn extent(&self, mip: u32) -> Extent {
        self.with_view(|v| v.extent(mip))
    }

    pub fn array_size(&self) -> u32 {
        self.with_view(|v| v.array_size())
    }

    pub fn faces(&self) -> u32 {
        self.with_view(|v| v.faces())
    }

    pub fn mips(&self) -> u32 {
        self.with_view(|v| v.mips())
    }

    pub fn dimension(&self) -> TextureDimension {
        self.with_view(|v| v.dimension())
    }

    pub fn format(&self) -> Format {
        self.with_view(|v| v.format())
    }

    pub fn surface_byte_alignment(&self) -> u32 {
        self.with_view(|v| v.surface_byte_alignment())
    }

    pub fn size_in_bytes(&self) -> usize {
        self.with_view(|v| v.size_in_bytes())
    }

    pub fn mip_size_in_bytes(&self, mip: u32) -> usize {
        self.with_view(|v| v.mip_size_in_bytes(mip))
    }

    pub fn surface_count(&self) -> usize {
        self.with_view(|v| v.surface_count())
    }

    pub fn surface_index(&self, array_slice: u32, face: u32, mip: u32) -> Option<usize> {
        self.with_view(|v| v.surface_index(array_slice, face, mip))
    }
}

impl Clone for SharedTexture {
    fn clone(&self) -> Self {
        if let Some(alloc) = &self.alloc {
            alloc.refs.add_ref();
        }
        Self {
            alloc: self.alloc.clone(),
        }
    }
}

impl Drop for SharedTexture {
    fn drop(&mut self) {
        let Some(alloc) = self.alloc.take() else {
            return;
        };
        if alloc.refs.dec_ref() {
            let mut storage = alloc.storage.write();
            let size_in_bytes = storage.size_in_bytes();
            storage.destroy();
            tracing::trace!(size_in_bytes, "shared texture released");
        }
    }
}

impl fmt::Debug for SharedTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_view(|view| write!(f, "SharedTexture({view:?}, {} strong)", self.strong_count()))
    }
}

impl From<crate::UniqueTexture> for SharedTexture {
    fn from(texture: crate::UniqueTexture) -> Self {
        texture.into_shared()
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Exclusive write access to a [`SharedTexture`]; released on drop.
pub struct SharedTextureLock<'a> {
    guard: Option<RwLockWriteGuard<'a, TextureStorage>>,
}

impl SharedTextureLock<'_> {
    pub fn view(&self) -> TextureView<'_> {
        self.guard
            .as_deref()
            .map(TextureStorage::view)
            .unwrap_or_default()
    }

    pub fn span(&mut self) -> TextureSpan<'_> {
        match self.guard.as_deref_mut() {
            Some(storage) => storage.span(),
            None => TextureSpan::default(),
        }
    }

    /// Fresh, independent allocation with the bytes as this guard sees them.
    pub fn deep_clone(&self) -> SharedTexture {
        self.guard
            .as_deref()
            .map_or_else(SharedTexture::default, |s| SharedTexture::from_storage(s.deep_copy()))
    }

    texture_queries!(view);
    texture_mut_accessors!(span);
}

/// Shared read access to a [`SharedTexture`]; released on drop.
pub struct SharedTextureRead<'a> {
    guard: Option<RwLockReadGuard<'a, TextureStorage>>,
}

impl SharedTextureRead<'_> {
    pub fn view(&self) -> TextureView<'_> {
        self.guard
            .as_deref()
            .map(TextureStorage::view)
            .unwrap_or_default()
    }

    /// Fresh, independent allocation with the bytes as this guard sees them.
    pub fn deep_clone(&self) -> SharedTexture {
        self.guard
            .as_deref()
            .map_or_else(SharedTexture::default, |s| SharedTexture::from_storage(s.deep_copy()))
    }

    texture_queries!(view);
}

// ---------------------------------------------------------------------------
// WeakTexture
// ---------------------------------------------------------------------------

/// Non-owning handle to a shared allocation.
///
/// Keeps only the allocation's shell alive; the pixel bytes go away with
/// the last [`SharedTexture`].
#[derive(Clone, Default)]
pub struct WeakTexture {
    alloc: Option<Arc<SharedAllocation>>,
}

impl WeakTexture {
    /// Whether a strong handle still keeps the allocation alive.
    pub fn is_alive(&self) -> bool {
        self.alloc
            .as_deref()
            .is_some_and(|a| a.refs.strong_count() > 0)
    }

    /// A new strong handle, unless the allocation was already released.
    pub fn upgrade(&self) -> Option<SharedTexture> {
        let alloc = self.alloc.as_ref()?;
        alloc.refs.try_upgrade().then(|| SharedTexture {
            alloc: Some(Arc::clone(alloc)),
        })
    }
}

impl fmt::Debug for WeakTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakTexture(alive: {})", self.is_alive())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rayon::prelude::*;

    fn params() -> TextureParams {
        TextureParams::new(Format::Rgba8Unorm, TextureDimension::Texture2D, Extent::new_2d(4, 4))
            .with_full_mip_chain()
    }

    #[test]
    fn invalid_params_give_empty_handle() {
        let texture = SharedTexture::new(params().with_array_size(0));
        assert!(texture.is_empty());
        assert_eq!(texture.strong_count(), 0);
        assert_eq!(texture.mips(), 0);
        assert!(texture.lock().data_mut().is_empty());
        assert!(!texture.downgrade().is_alive());
        assert!(SharedTexture::try_new(params().with_array_size(0), &[]).is_err());
    }

    #[test]
    fn queries_read_cached_geometry() {
        let texture = SharedTexture::new(params());
        assert_eq!(texture.mips(), 3);
        assert_eq!(texture.extent(1), Extent::new(2, 2, 1));
        assert_eq!(texture.format(), Format::Rgba8Unorm);
        assert_eq!(texture.surface_count(), 3);
        assert_eq!(texture.mip_size_in_bytes(0), 64);
    }

    #[test]
    fn queries_answer_while_locked() {
        use std::sync::mpsc;
        use std::time::Duration;

        let texture = SharedTexture::new(params());
        let (done, finished) = mpsc::channel();
        let worker = std::thread::spawn(move || {
            let mut guard = texture.lock();
            for mip in 0..texture.mips() {
                let extent = texture.extent(mip);
                let size = texture.mip_size_in_bytes(mip);
                guard.surface_data_mut(0, 0, mip).fill(mip as u8 + 1);
                assert_eq!(size, extent.volume() as usize * 4);
            }
            let described = format!("{texture:?}");
            let copy = guard.deep_clone();
            drop(guard);
            done.send((described, copy)).unwrap();
        });
        let (described, copy) = finished
            .recv_timeout(Duration::from_secs(5))
            .expect("queries blocked on the held guard");
        worker.join().unwrap();
        assert!(described.starts_with("SharedTexture(TextureView(2D"));
        assert_eq!(copy.read().surface_data(0, 0, 2), &[3, 3, 3, 3]);
        assert_eq!(copy.strong_count(), 1);
    }

    #[test]
    fn read_guard_deep_clone_copies_bytes() {
        let texture = SharedTexture::with_data(params(), &[5; 84]);
        let reader = texture.read();
        let copy = reader.deep_clone();
        assert!(!copy.ptr_eq(&texture));
        assert_eq!(copy.read().data(), reader.data());
        assert!(SharedTexture::default().read().deep_clone().is_empty());
    }

    #[test]
    fn clones_share_one_allocation() {
        let a = SharedTexture::new(params());
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.strong_count(), 2);
        {
            let mut guard = b.lock();
            guard.surface_data_mut(0, 0, 2).fill(3);
        }
        assert_eq!(a.read().surface_data(0, 0, 2), &[3, 3, 3, 3]);
        drop(b);
        assert_eq!(a.strong_count(), 1);
    }

    #[test]
    fn deep_clone_is_independent() {
        let a = SharedTexture::with_data(params(), &[1; 84]);
        let b = a.deep_clone();
        assert!(!a.ptr_eq(&b));
        assert_eq!(b.strong_count(), 1);
        b.lock().data_mut().fill(0);
        assert!(a.read().data().iter().all(|&x| x == 1));
        drop(a);
        assert!(b.is_valid());
        assert_eq!(b.size_in_bytes(), 84);
    }

    #[test]
    fn last_drop_releases_allocation() {
        let a = SharedTexture::new(params());
        let weak = a.downgrade();
        let b = a.clone();
        drop(a);
        assert!(weak.is_alive());
        let upgraded = weak.upgrade().unwrap();
        assert_eq!(upgraded.strong_count(), 2);
        drop(upgraded);
        drop(b);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
        // The shell outlives the pixel bytes; the storage itself was destroyed.
        let alloc = weak.alloc.as_deref().unwrap();
        assert!(!alloc.storage.read().is_valid());
    }

    #[test]
    fn weak_clones_do_not_keep_bytes_alive() {
        let texture = SharedTexture::new(params());
        let weak = texture.downgrade();
        let copies: Vec<_> = (0..4).map(|_| weak.clone()).collect();
        drop(weak);
        assert!(copies.iter().all(WeakTexture::is_alive));
        assert_eq!(texture.strong_count(), 1);
        drop(texture);
        assert!(copies.iter().all(|w| !w.is_alive() && w.upgrade().is_none()));
    }

    #[test]
    fn concurrent_clone_and_drop() {
        let texture = SharedTexture::new(params());
        let weak = texture.downgrade();
        (0..2_000).into_par_iter().for_each(|_| {
            let copy = texture.clone();
            let nested = copy.clone();
            drop(copy);
            drop(nested);
        });
        assert_eq!(texture.strong_count(), 1);
        drop(texture);
        assert!(!weak.is_alive());
    }

    #[test]
    fn concurrent_writers_serialize_on_one_lock() {
        let texture = SharedTexture::new(
            TextureParams::new(Format::R32Uint, TextureDimension::Texture1D, Extent::new(1, 0, 0)),
        );
        let copies: Vec<_> = (0..8).map(|_| texture.clone()).collect();
        copies.par_iter().for_each(|copy| {
            for _ in 0..250 {
                let mut guard = copy.lock();
                guard.surface_data_as_mut::<u32>(0, 0, 0)[0] += 1;
            }
        });
        assert_eq!(texture.read().surface_data_as::<u32>(0, 0, 0), &[2_000]);
    }

    fn drop_orders() -> impl Strategy<Value = Vec<usize>> {
        (1usize..12).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    }

    proptest! {
        #[test]
        fn copies_dropped_in_any_order(order in drop_orders()) {
            let original = SharedTexture::new(params());
            let weak = original.downgrade();
            let mut copies: Vec<Option<SharedTexture>> =
                order.iter().map(|_| Some(original.clone())).collect();
            drop(original);
            for (dropped, &index) in order.iter().enumerate() {
                prop_assert!(weak.is_alive());
                copies[index] = None;
                let remaining = order.len() - dropped - 1;
                if let Some(alive) = weak.upgrade() {
                    prop_assert_eq!(alive.strong_count() as usize, remaining + 1);
                } else {
                    prop_assert_eq!(remaining, 0);
                }
            }
            prop_assert!(!weak.is_alive());
        }
    }
}
