//! Named, keyed collections of emotes.
//!
//! An [`EmoteSet`] holds the emotes of one scope (a channel id, or a fixed
//! global name such as `"twitch"`), keyed by emote id and iterated in
//! insertion order.
//!
//! # Examples
//!
//! ```
//! use em_core::{Provider, RawEmoteRecord};
//! use em_store::{EmoteSet, PushMode};
//!
//! let mut set = EmoteSet::new("twitch");
//! set.push(vec![RawEmoteRecord::new("25", "Kappa", Provider::Twitch)], PushMode::Replace);
//! set.push(vec![RawEmoteRecord::new("88", "PogChamp", Provider::Twitch)], PushMode::Merge);
//!
//! assert_eq!(set.len(), 2);
//! assert!(set.get_emote_by_name("Kappa").is_some());
//! ```

use std::sync::Arc;

use em_core::{Emote, RawEmoteRecord};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How [`EmoteSet::push`] treats entries already in the set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PushMode {
    /// Clear the set first. The set then holds exactly the pushed records.
    #[default]
    Replace,

    /// Keep existing entries, overwriting only those whose id collides with
    /// a pushed record.
    Merge,
}

/// Outcome of a [`push`](EmoteSet::push).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Records turned into emotes (duplicates within the batch included).
    pub accepted: usize,

    /// Records rejected because they failed validation.
    pub skipped: usize,
}

/// The serializable form of a set: its name and its records in iteration
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSet {
    /// Scope name.
    pub name: String,

    /// Records in the set's iteration order.
    pub emotes: Vec<RawEmoteRecord>,
}

/// A named collection of emotes keyed by id.
///
/// Ids are unique within a set: pushing a record whose id is already
/// present overwrites the old emote in place, keeping its position. Emotes
/// are shared behind [`Arc`], so cloning a set is cheap and readers can keep
/// emotes after the set is replaced.
#[derive(Debug, Clone)]
pub struct EmoteSet {
    /// Scope name.
    name: String,

    /// Emotes by id, in insertion order.
    emotes: IndexMap<String, Arc<Emote>, FxBuildHasher>,
}

impl EmoteSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emotes: IndexMap::default(),
        }
    }

    /// Creates a set holding `records`.
    #[must_use]
    pub fn from_records(
        name: impl Into<String>,
        records: impl IntoIterator<Item = RawEmoteRecord>,
    ) -> Self {
        let mut set = Self::new(name);
        set.push(records, PushMode::Replace);
        set
    }

    /// Returns the scope name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds records to the set.
    ///
    /// With [`PushMode::Replace`] the set is cleared first; with
    /// [`PushMode::Merge`] only colliding ids are overwritten. Within one
    /// batch, later records win over earlier ones with the same id.
    ///
    /// Records with an empty id are skipped and logged; the rest of the
    /// batch is still applied.
    pub fn push(
        &mut self,
        records: impl IntoIterator<Item = RawEmoteRecord>,
        mode: PushMode,
    ) -> PushSummary {
        if mode == PushMode::Replace {
            self.emotes.clear();
        }

        let mut summary = PushSummary::default();
        for (index, record) in records.into_iter().enumerate() {
            if let Err(error) = record.validate_at(index) {
                warn!(scope = %self.name, %error, "Skipping emote record");
                summary.skipped += 1;
                continue;
            }
            self.emotes
                .insert(record.id.clone(), Arc::new(Emote::new(record)));
            summary.accepted += 1;
        }
        summary
    }

    /// Returns the emote with the given id.
    #[inline]
    #[must_use]
    pub fn get_emote_by_id(&self, id: &str) -> Option<&Arc<Emote>> {
        self.emotes.get(id)
    }

    /// Returns the first emote, in iteration order, with the given name.
    ///
    /// Names are not indexed; this is a linear scan.
    #[must_use]
    pub fn get_emote_by_name(&self, name: &str) -> Option<&Arc<Emote>> {
        self.emotes.values().find(|emote| emote.name() == name)
    }

    /// Returns `true` if an emote with this id is present.
    #[inline]
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.emotes.contains_key(id)
    }

    /// Iterates over the emotes in insertion order.
    pub fn emotes(&self) -> impl Iterator<Item = &Arc<Emote>> {
        self.emotes.values()
    }

    /// Returns the number of emotes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.emotes.len()
    }

    /// Returns `true` if the set holds no emotes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emotes.is_empty()
    }

    /// Converts the set back into its records.
    #[must_use]
    pub fn resolve(&self) -> ResolvedSet {
        ResolvedSet {
            name: self.name.clone(),
            emotes: self
                .emotes
                .values()
                .map(|emote| emote.resolve().clone())
                .collect(),
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

    fn ids(set: &EmoteSet) -> Vec<&str> {
        set.emotes().map(|e| e.id()).collect()
    }

    #[test]
    fn test_push_replace_drops_old_ids() {
        let mut set = EmoteSet::from_records("chan", [record("a", "A"), record("b", "B")]);
        set.push([record("c", "C")], PushMode::Replace);
        assert_eq!(ids(&set), ["c"]);
    }

    #[test]
    fn test_push_merge_keeps_non_colliding() {
        let mut set = EmoteSet::from_records("chan", [record("a", "A"), record("b", "B")]);
        set.push([record("b", "B2"), record("c", "C")], PushMode::Merge);

        assert_eq!(ids(&set), ["a", "b", "c"]);
        assert_eq!(set.get_emote_by_id("b").map(|e| e.name()), Some("B2"));
    }

    #[test]
    fn test_push_later_duplicate_wins() {
        let set = EmoteSet::from_records("chan", [record("x", "first"), record("x", "second")]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_emote_by_id("x").map(|e| e.name()), Some("second"));
    }

    #[test]
    fn test_push_ids_unique() {
        let set = EmoteSet::from_records(
            "chan",
            [record("1", "a"), record("2", "b"), record("1", "c"), record("3", "a")],
        );
        let mut seen = ids(&set);
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), total);
        assert_eq!(total, 3);
    }

    #[test]
    fn test_push_skips_empty_id() {
        let mut set = EmoteSet::new("chan");
        let summary = set.push([record("", "ghost"), record("1", "real")], PushMode::Replace);
        assert_eq!(summary, PushSummary { accepted: 1, skipped: 1 });
        assert_eq!(ids(&set), ["1"]);
    }

    #[test]
    fn test_get_emote_by_name_first_match() {
        let set = EmoteSet::from_records("chan", [record("1", "dup"), record("2", "dup")]);
        assert_eq!(set.get_emote_by_name("dup").map(|e| e.id()), Some("1"));
        assert!(set.get_emote_by_name("missing").is_none());
        assert!(set.get_emote_by_id("missing").is_none());
    }

    #[test]
    fn test_resolve_preserves_order_and_records() {
        let records = vec![record("b", "B"), record("a", "A")];
        let set = EmoteSet::from_records("chan", records.clone());
        let resolved = set.resolve();
        assert_eq!(resolved.name, "chan");
        assert_eq!(resolved.emotes, records);
    }

    #[test]
    fn test_resolve_snapshot() {
        let set = EmoteSet::from_records(
            "emoji",
            [RawEmoteRecord::new("1F600", "grinning face", Provider::Emoji)],
        );
        let json = serde_json::to_string(&set.resolve()).unwrap();
        insta::assert_snapshot!(json, @r#"{"name":"emoji","emotes":[{"id":"1F600","name":"grinning face","mime":"","tags":[],"visibility":0,"provider":"EMOJI","urls":[]}]}"#);
    }
}
