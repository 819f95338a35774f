//! Cache invalidation shared by the array cache and the catalog's
//! structural caches.

/// Anything holding derived data that must be rebuilt after a settings or
/// selection change implements this.
pub trait InvalidateCache {
    /// Drop every derived entry so the next request rebuilds it.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

impl<T: InvalidateCache> InvalidateCache for Option<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        if let Some(inner) = self {
            inner.invalidate_cache();
        }
    }
}
