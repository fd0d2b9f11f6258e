//! Cache of rendered emote handles.
//!
//! Rendering an emote produces something presentation-specific (markup, a
//! texture id, a widget). The store does not care what it is; it keeps an
//! opaque [`ElementHandle`] per emote so the same emote is only rendered
//! once.
//!
//! Handles are keyed by emote id alone by default, which means two scopes
//! holding the same id share one handle. [`ElementKeying::ScopeAndId`]
//! keys by scope as well.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use em_core::{ElementKeying, Emote, FxHashMap};
use parking_lot::RwLock;

/// An opaque, shareable rendered representation of an emote.
///
/// # Examples
///
/// ```
/// use em_store::ElementHandle;
///
/// let handle = ElementHandle::new(String::from("<img src=\"a\">"));
/// assert_eq!(handle.downcast_ref::<String>().map(String::as_str), Some("<img src=\"a\">"));
/// assert!(handle.downcast_ref::<u32>().is_none());
/// ```
#[derive(Clone)]
pub struct ElementHandle(Arc<dyn Any + Send + Sync>);

impl ElementHandle {
    /// Wraps a rendered value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the rendered value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns `true` if both handles point at the same rendered value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle").finish_non_exhaustive()
    }
}

/// Produces a handle for an emote.
pub trait Renderer: Send + Sync {
    /// Renders `emote`.
    fn render(&self, emote: &Emote) -> ElementHandle;
}

impl<F> Renderer for F
where
    F: Fn(&Emote) -> ElementHandle + Send + Sync,
{
    fn render(&self, emote: &Emote) -> ElementHandle {
        self(emote)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ElementKey {
    Id(String),
    Scoped { scope: String, id: String },
}

/// Thread-safe map from emote key to rendered handle.
#[derive(Debug)]
pub struct ElementCache {
    keying: ElementKeying,
    entries: RwLock<FxHashMap<ElementKey, ElementHandle>>,
}

impl ElementCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(keying: ElementKeying) -> Self {
        Self {
            keying,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Returns the keying mode.
    #[inline]
    #[must_use]
    pub const fn keying(&self) -> ElementKeying {
        self.keying
    }

    fn key(&self, scope: &str, id: &str) -> ElementKey {
        match self.keying {
            ElementKeying::EmoteId => ElementKey::Id(id.to_owned()),
            ElementKeying::ScopeAndId => ElementKey::Scoped {
                scope: scope.to_owned(),
                id: id.to_owned(),
            },
        }
    }

    /// Returns the cached handle, if any.
    #[must_use]
    pub fn get(&self, scope: &str, id: &str) -> Option<ElementHandle> {
        self.entries.read().get(&self.key(scope, id)).cloned()
    }

    /// Stores `handle`, replacing any previous one, and returns it.
    pub fn insert(&self, scope: &str, id: &str, handle: ElementHandle) -> ElementHandle {
        self.entries
            .write()
            .insert(self.key(scope, id), handle.clone());
        handle
    }

    /// Returns the cached handle or renders, caches and returns a new one.
    ///
    /// Concurrent callers for the same key all get the same handle.
    pub fn get_or_render(&self, scope: &str, emote: &Emote, renderer: &dyn Renderer) -> ElementHandle {
        let key = self.key(scope, emote.id());
        if let Some(handle) = self.entries.read().get(&key) {
            return handle.clone();
        }
        self.entries
            .write()
            .entry(key)
            .or_insert_with(|| renderer.render(emote))
            .clone()
    }

    /// Removes the handle for one emote.
    pub fn remove(&self, scope: &str, id: &str) -> Option<ElementHandle> {
        self.entries.write().remove(&self.key(scope, id))
    }

    /// Returns the number of cached handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every handle.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ElementCache {
    fn default() -> Self {
        Self::new(ElementKeying::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use em_core::{Provider, RawEmoteRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl Renderer for Counting {
        fn render(&self, emote: &Emote) -> ElementHandle {
            self.0.fetch_add(1, Ordering::SeqCst);
            ElementHandle::new(emote.name().to_owned())
        }
    }

    fn emote(id: &str, name: &str) -> Emote {
        Emote::new(RawEmoteRecord::new(id, name, Provider::SevenTv))
    }

    #[test]
    fn test_get_or_render_renders_once() {
        let cache = ElementCache::default();
        let renderer = Counting(AtomicUsize::new(0));
        let kappa = emote("25", "Kappa");

        let first = cache.get_or_render("chan", &kappa, &renderer);
        let second = cache.get_or_render("chan", &kappa, &renderer);

        assert!(first.ptr_eq(&second));
        assert_eq!(renderer.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_id_keying_shares_across_scopes() {
        let cache = ElementCache::new(ElementKeying::EmoteId);
        cache.insert("a", "25", ElementHandle::new(1_u8));
        assert!(cache.get("b", "25").is_some());
    }

    #[test]
    fn test_scoped_keying_separates_scopes() {
        let cache = ElementCache::new(ElementKeying::ScopeAndId);
        cache.insert("a", "25", ElementHandle::new(1_u8));
        assert!(cache.get("a", "25").is_some());
        assert!(cache.get("b", "25").is_none());
    }

    #[test]
    fn test_insert_replaces_and_clear() {
        let cache = ElementCache::default();
        cache.insert("a", "1", ElementHandle::new(1_u8));
        cache.insert("a", "1", ElementHandle::new(2_u8));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a", "1").and_then(|h| h.downcast_ref::<u8>().copied()), Some(2));

        assert!(cache.remove("a", "1").is_some());
        assert!(cache.is_empty());

        cache.insert("a", "1", ElementHandle::new(3_u8));
        cache.clear();
        assert!(cache.get("a", "1").is_none());
    }

    #[test]
    fn test_closure_renderer() {
        let cache = ElementCache::default();
        let render = |e: &Emote| ElementHandle::new(e.id().len());
        let handle = cache.get_or_render("chan", &emote("abc", "x"), &render);
        assert_eq!(handle.downcast_ref::<usize>(), Some(&3));
    }
}
