//! The emote registry.
//!
//! [`EmoteStore`] maps scope names to [`EmoteSet`]s. Reads go through an
//! [`ArcSwap`] snapshot and never block; writes are serialized by a mutex
//! and publish a fresh snapshot when they change something. A reader
//! therefore sees either the state before a write or the state after it,
//! never a set that is half rebuilt.
//!
//! Multi-step writes (check a generation, then install a set) run inside
//! [`EmoteStore::transaction`], which holds the writer lock for the whole
//! closure.
//!
//! # Examples
//!
//! ```
//! use em_core::{Provider, RawEmoteRecord, StoreConfig};
//! use em_store::EmoteStore;
//!
//! let store = EmoteStore::new(StoreConfig::default());
//! store.enable_set("12345", vec![RawEmoteRecord::new("a1", "catJAM", Provider::SevenTv)]);
//!
//! assert_eq!(store.get_emote("catJAM").map(|e| e.id().to_owned()), Some("a1".to_owned()));
//! assert_eq!(store.get_emote("a1").map(|e| e.name().to_owned()), Some("catJAM".to_owned()));
//!
//! store.disable_set("12345");
//! assert!(store.get_emote("catJAM").is_none());
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use em_core::{Emote, RawEmoteRecord, StoreConfig};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use crate::element::{ElementCache, ElementHandle, Renderer};
use crate::set::{EmoteSet, PushMode, PushSummary};

/// Scope name to set, in the order scopes were first enabled.
pub type ScopeMap = IndexMap<String, Arc<EmoteSet>, FxBuildHasher>;

/// An emote found by [`EmoteStore::find_emote`], with the scope it was
/// found in.
#[derive(Debug, Clone)]
pub struct EmoteMatch {
    /// Name of the scope holding the emote.
    pub scope: String,

    /// The emote.
    pub emote: Arc<Emote>,
}

/// Registry of emote sets keyed by scope name.
#[derive(Debug)]
pub struct EmoteStore {
    /// Store configuration.
    config: StoreConfig,

    /// Current published state.
    scopes: ArcSwap<ScopeMap>,

    /// Serializes writers.
    write_lock: Mutex<()>,

    /// Rendered handles.
    elements: ElementCache,
}

impl EmoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        let elements = ElementCache::new(config.element_keying);
        Self {
            config,
            scopes: ArcSwap::from_pointee(ScopeMap::default()),
            write_lock: Mutex::new(()),
            elements,
        }
    }

    /// Returns the store configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Installs a set for `name` holding exactly `records`.
    ///
    /// An existing set with the same name is replaced wholesale but keeps
    /// its position in lookup order. Returns the installed set.
    pub fn enable_set(
        &self,
        name: &str,
        records: impl IntoIterator<Item = RawEmoteRecord>,
    ) -> Arc<EmoteSet> {
        self.transaction(|txn| txn.enable_set(name, records))
    }

    /// Removes the set for `name`, returning it. Unknown names are a no-op.
    pub fn disable_set(&self, name: &str) -> Option<Arc<EmoteSet>> {
        self.transaction(|txn| txn.disable_set(name))
    }

    /// Removes every set and drops all rendered handles.
    pub fn clear(&self) {
        self.transaction(StoreTxn::clear);
        self.elements.clear();
    }

    /// Runs `f` with exclusive write access.
    ///
    /// Changes made through the [`StoreTxn`] are published as one snapshot
    /// when `f` returns. No other writer can run in between, so any check
    /// made inside `f` still holds when its changes become visible.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut StoreTxn) -> R) -> R {
        let _guard = self.write_lock.lock();
        let mut txn = StoreTxn {
            scopes: ScopeMap::clone(&self.scopes.load()),
            dirty: false,
        };
        let result = f(&mut txn);
        if txn.dirty {
            self.scopes.store(Arc::new(txn.scopes));
        }
        result
    }

    /// Returns the current state.
    ///
    /// The snapshot is immutable; later writes do not affect it.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<ScopeMap> {
        self.scopes.load_full()
    }

    /// Looks up an emote by id or name across every scope.
    ///
    /// Scopes are searched in install order and the first scope holding a
    /// match wins. Within a scope, an id match is preferred over a name
    /// match, and the first emote with a matching name wins.
    #[must_use]
    pub fn find_emote(&self, name_or_id: &str) -> Option<EmoteMatch> {
        let scopes = self.scopes.load();

        scopes.iter().find_map(|(scope, set)| {
            set.get_emote_by_id(name_or_id)
                .or_else(|| set.get_emote_by_name(name_or_id))
                .map(|emote| EmoteMatch {
                    scope: scope.clone(),
                    emote: Arc::clone(emote),
                })
        })
    }

    /// Looks up an emote by id or name across every scope.
    ///
    /// See [`find_emote`](Self::find_emote) for resolution order.
    #[must_use]
    pub fn get_emote(&self, name_or_id: &str) -> Option<Arc<Emote>> {
        self.find_emote(name_or_id).map(|found| found.emote)
    }

    /// Returns the set installed for `name`.
    #[must_use]
    pub fn get_set(&self, name: &str) -> Option<Arc<EmoteSet>> {
        self.scopes.load().get(name).cloned()
    }

    /// Returns the installed scope names in lookup order.
    #[must_use]
    pub fn scope_names(&self) -> Vec<String> {
        self.scopes.load().keys().cloned().collect()
    }

    /// Returns the number of installed scopes.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.load().len()
    }

    /// Returns the total number of emotes across all scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.load().values().map(|set| set.len()).sum()
    }

    /// Returns `true` if no scope holds any emote.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.load().values().all(|set| set.is_empty())
    }

    /// Returns the cached handle for an emote.
    #[must_use]
    pub fn get_element(&self, scope: &str, emote_id: &str) -> Option<ElementHandle> {
        self.elements.get(scope, emote_id)
    }

    /// Caches a handle for an emote and returns it.
    pub fn add_element(&self, scope: &str, emote_id: &str, handle: ElementHandle) -> ElementHandle {
        self.elements.insert(scope, emote_id, handle)
    }

    /// Returns the handle for an emote, rendering and caching it on a miss.
    pub fn element_for(
        &self,
        scope: &str,
        emote: &Emote,
        renderer: &dyn Renderer,
    ) -> ElementHandle {
        self.elements.get_or_render(scope, emote, renderer)
    }

    /// Returns the element cache.
    #[inline]
    #[must_use]
    pub const fn elements(&self) -> &ElementCache {
        &self.elements
    }
}

impl Default for EmoteStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Write access to an [`EmoteStore`] inside a
/// [`transaction`](EmoteStore::transaction).
#[derive(Debug)]
pub struct StoreTxn {
    scopes: ScopeMap,
    dirty: bool,
}

impl StoreTxn {
    /// Installs a set for `name` holding exactly `records`.
    pub fn enable_set(
        &mut self,
        name: &str,
        records: impl IntoIterator<Item = RawEmoteRecord>,
    ) -> Arc<EmoteSet> {
        let mut set = EmoteSet::new(name);
        let summary = set.push(records, PushMode::Replace);
        debug!(
            scope = name,
            emotes = set.len(),
            skipped = summary.skipped,
            "Enabled emote set"
        );
        self.install_set(set)
    }

    /// Installs an already built set under its own name.
    ///
    /// Replaces any set with that name, keeping its position in lookup order.
    pub fn install_set(&mut self, set: EmoteSet) -> Arc<EmoteSet> {
        let set = Arc::new(set);
        self.scopes.insert(set.name().to_owned(), Arc::clone(&set));
        self.dirty = true;
        set
    }

    /// Removes the set for `name`, keeping the order of the others.
    pub fn disable_set(&mut self, name: &str) -> Option<Arc<EmoteSet>> {
        let removed = self.scopes.shift_remove(name);
        if removed.is_some() {
            debug!(scope = name, "Disabled emote set");
            self.dirty = true;
        } else {
            trace!(scope = name, "Disable requested for unknown scope");
        }
        removed
    }

    /// Merges `records` into the set for `name`, creating it if needed.
    ///
    /// Existing emotes are kept unless a record reuses their id. A merge
    /// copies the staged set once, so it costs O(set size); when every
    /// record is already present unchanged the set is left alone and
    /// nothing is published.
    pub fn merge_into(
        &mut self,
        name: &str,
        records: impl IntoIterator<Item = RawEmoteRecord>,
    ) -> PushSummary {
        let records: Vec<RawEmoteRecord> = records.into_iter().collect();
        if let Some(existing) = self.scopes.get(name) {
            let unchanged = records.iter().all(|record| {
                existing
                    .get_emote_by_id(&record.id)
                    .is_some_and(|emote| emote.resolve() == record)
            });
            if unchanged {
                trace!(scope = name, records = records.len(), "Merge changes nothing");
                return PushSummary::default();
            }
        }

        let entry = self
            .scopes
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(EmoteSet::new(name)));
        let summary = Arc::make_mut(entry).push(records, PushMode::Merge);
        self.dirty = true;
        summary
    }

    /// Returns the set for `name` as staged in this transaction.
    #[must_use]
    pub fn get_set(&self, name: &str) -> Option<&Arc<EmoteSet>> {
        self.scopes.get(name)
    }

    /// Returns `true` if `name` is staged in this transaction.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// Removes every set.
    pub fn clear(&mut self) {
        if !self.scopes.is_empty() {
            self.scopes.clear();
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use em_core::Provider;

    fn record(id: &str, name: &str) -> RawEmoteRecord {
        RawEmoteRecord::new(id, name, Provider::SevenTv)
    }

    #[test]
    fn test_enable_set_replaces_contents() {
        let store = EmoteStore::default();
        store.enable_set("chan", [record("a", "A"), record("b", "B")]);
        store.enable_set("chan", [record("c", "C")]);

        let set = store.get_set("chan").unwrap();
        assert_eq!(set.len(), 1);
        assert!(store.get_emote("A").is_none());
        assert!(store.get_emote("C").is_some());
    }

    #[test]
    fn test_enable_set_keeps_scope_position() {
        let store = EmoteStore::default();
        store.enable_set("first", [record("1", "x")]);
        store.enable_set("second", [record("2", "x")]);
        store.enable_set("first", [record("3", "x")]);

        assert_eq!(store.scope_names(), ["first", "second"]);
        assert_eq!(store.get_emote("x").map(|e| e.id().to_owned()).as_deref(), Some("3"));
    }

    #[test]
    fn test_disable_unknown_is_noop() {
        let store = EmoteStore::default();
        store.enable_set("chan", [record("a", "A")]);
        let before = store.snapshot();

        assert!(store.disable_set("missing").is_none());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_disable_keeps_remaining_order() {
        let store = EmoteStore::default();
        for name in ["a", "b", "c"] {
            store.enable_set(name, [record(name, name)]);
        }
        store.disable_set("b");
        assert_eq!(store.scope_names(), ["a", "c"]);
    }

    #[test]
    fn test_get_emote_earlier_scope_wins_over_id_match() {
        let store = EmoteStore::default();
        // "x" is a name in the earlier scope and an id in the later one.
        store.enable_set("twitch", [record("1", "x")]);
        store.enable_set("channelA", [record("x", "other")]);

        let found = store.find_emote("x").unwrap();
        assert_eq!(found.scope, "twitch");
        assert_eq!(found.emote.id(), "1");
    }

    #[test]
    fn test_get_emote_prefers_id_within_scope() {
        let store = EmoteStore::default();
        store.enable_set("chan", [record("1", "2"), record("2", "two")]);

        assert_eq!(store.get_emote("2").map(|e| e.name().to_owned()).as_deref(), Some("two"));
    }

    #[test]
    fn test_get_emote_name_follows_scope_order() {
        let store = EmoteStore::default();
        store.enable_set("early", [record("1", "dup")]);
        store.enable_set("late", [record("2", "dup")]);

        assert_eq!(store.find_emote("dup").map(|m| m.scope).as_deref(), Some("early"));
    }

    #[test]
    fn test_get_emote_absent() {
        let store = EmoteStore::default();
        assert!(store.get_emote("anything").is_none());
        store.enable_set("chan", [record("1", "a")]);
        assert!(store.get_emote("b").is_none());
    }

    #[test]
    fn test_snapshot_unaffected_by_later_writes() {
        let store = EmoteStore::default();
        store.enable_set("chan", [record("a", "A")]);
        let snapshot = store.snapshot();

        store.enable_set("chan", [record("b", "B")]);
        store.disable_set("chan");

        let old = snapshot.get("chan").unwrap();
        assert!(old.get_emote_by_id("a").is_some());
        assert!(store.get_set("chan").is_none());
    }

    #[test]
    fn test_transaction_is_one_publish() {
        let store = EmoteStore::default();
        store.enable_set("old", [record("1", "a")]);
        let before = store.snapshot();

        store.transaction(|txn| {
            txn.disable_set("old");
            txn.enable_set("new", [record("2", "b")]);
        });

        assert!(before.contains_key("old"));
        assert!(!before.contains_key("new"));
        assert_eq!(store.scope_names(), ["new"]);
    }

    #[test]
    fn test_transaction_without_changes_keeps_snapshot() {
        let store = EmoteStore::default();
        store.enable_set("chan", [record("a", "A")]);
        let before = store.snapshot();

        let present = store.transaction(|txn| txn.contains("chan"));
        assert!(present);
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_merge_into_creates_and_merges() {
        let store = EmoteStore::default();
        store.transaction(|txn| txn.merge_into("twitch", [record("1", "a")]));
        store.transaction(|txn| txn.merge_into("twitch", [record("2", "b"), record("1", "a2")]));

        let set = store.get_set("twitch").unwrap();
        let ids: Vec<_> = set.emotes().map(|e| e.id()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(set.get_emote_by_id("1").map(|e| e.name()), Some("a2"));
    }

    #[test]
    fn test_merge_into_known_record_publishes_nothing() {
        let store = EmoteStore::default();
        store.transaction(|txn| txn.merge_into("twitch", [record("1", "a")]));
        let before = store.snapshot();

        let summary = store.transaction(|txn| txn.merge_into("twitch", [record("1", "a")]));
        assert_eq!(summary, PushSummary::default());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));

        store.transaction(|txn| txn.merge_into("twitch", [record("1", "renamed")]));
        assert!(!Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_merge_into_leaves_old_snapshot_intact() {
        let store = EmoteStore::default();
        store.transaction(|txn| txn.merge_into("twitch", [record("1", "a")]));
        let before = store.get_set("twitch").unwrap();

        store.transaction(|txn| txn.merge_into("twitch", [record("2", "b")]));
        assert_eq!(before.len(), 1);
        assert_eq!(store.get_set("twitch").unwrap().len(), 2);
    }

    #[test]
    fn test_len_and_clear() {
        let store = EmoteStore::default();
        assert!(store.is_empty());
        store.enable_set("a", [record("1", "x"), record("2", "y")]);
        store.enable_set("b", [record("3", "z")]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.scope_count(), 2);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.scope_count(), 0);
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let store = Arc::new(EmoteStore::default());
        let full: Vec<_> = (0..50).map(|i| record(&i.to_string(), "e")).collect();
        store.enable_set("chan", full.clone());

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    if let Some(set) = store.get_set("chan") {
                        assert!(set.len() == 50 || set.len() == 1);
                    }
                }
            })
        };

        for i in 0..200 {
            if i % 2 == 0 {
                store.enable_set("chan", [record("only", "e")]);
            } else {
                store.enable_set("chan", full.clone());
            }
        }
        reader.join().unwrap();
    }
}
