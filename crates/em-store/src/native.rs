//! Ad-hoc injection of platform-native emotes and emoji.
//!
//! Native emotes are not fetched from a provider. They show up inside chat
//! messages and are merged into fixed scopes (`twitch` and `emoji` by
//! default) the first time they are seen.

use std::sync::Arc;

use em_core::{Emote, FxHashMap, Provider, RawEmoteRecord, SizeKey, Visibility};
use tracing::trace;

use crate::store::EmoteStore;

/// A native emote reference taken from a chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwitchEmoteRef {
    /// Platform emote id, when the message carries one.
    pub emote_id: Option<String>,

    /// Emote text as typed in chat.
    pub alt: String,
}

/// An emoji image found in a chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiRef {
    /// The emoji itself.
    pub alt: String,

    /// Image URL.
    pub src: String,
}

/// Catalog data for one emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiInfo {
    /// Uppercase hex code points joined by `-`, e.g. `1F468-200D-1F4BB`.
    pub unified: String,

    /// Human-readable name.
    pub name: String,
}

/// Looks up emoji by code point sequence.
pub trait EmojiCatalog {
    /// Returns the entry for `code_point`, formatted as by [`code_point`].
    fn lookup(&self, code_point: &str) -> Option<EmojiInfo>;
}

impl EmojiCatalog for FxHashMap<String, EmojiInfo> {
    fn lookup(&self, code_point: &str) -> Option<EmojiInfo> {
        self.get(code_point).cloned()
    }
}

/// A catalog that knows no emoji.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl EmojiCatalog for NoCatalog {
    fn lookup(&self, _code_point: &str) -> Option<EmojiInfo> {
        None
    }
}

/// Formats the code points of `text` as uppercase hex joined by `-`.
///
/// # Examples
///
/// ```
/// use em_store::code_point;
///
/// assert_eq!(code_point("😀"), "1F600");
/// assert_eq!(code_point("\u{1F468}\u{200D}\u{1F4BB}"), "1F468-200D-1F4BB");
/// ```
#[must_use]
pub fn code_point(text: &str) -> String {
    text.chars()
        .map(|c| format!("{:X}", u32::from(c)))
        .collect::<Vec<_>>()
        .join("-")
}

impl EmoteStore {
    /// Records a native emote seen in chat and returns it.
    ///
    /// The emote is merged into the configured Twitch scope, creating it if
    /// needed; other emotes already there are kept. A reference without an id
    /// cannot be stored, so it only resolves if an emote with the same name
    /// was recorded earlier.
    pub fn from_twitch_emote(&self, data: &TwitchEmoteRef) -> Option<Arc<Emote>> {
        let scope = self.config().twitch_set.clone();
        let record = RawEmoteRecord::new(
            data.emote_id.clone().unwrap_or_default(),
            data.alt.clone(),
            Provider::Twitch,
        );

        self.transaction(|txn| {
            txn.merge_into(&scope, [record]);
            let emote = txn
                .get_set(&scope)
                .and_then(|set| set.get_emote_by_name(&data.alt))
                .cloned();
            trace!(scope = %scope, alt = %data.alt, found = emote.is_some(), "Injected native emote");
            emote
        })
    }

    /// Records an emoji seen in chat and returns it.
    ///
    /// The emoji's id is its catalog code point sequence, or the
    /// percent-encoded emoji text when the catalog does not know it. Every
    /// size points at the image the message used.
    pub fn from_emoji(&self, data: &EmojiRef, catalog: &dyn EmojiCatalog) -> Option<Arc<Emote>> {
        let scope = self.config().emoji_set.clone();
        let (id, name) = match catalog.lookup(&code_point(&data.alt)) {
            Some(info) => (info.unified, info.name.to_lowercase()),
            None => (urlencoding::encode(&data.alt).into_owned(), String::new()),
        };

        let mut record = RawEmoteRecord::new(id.clone(), name, Provider::Emoji)
            .with_visibility(Visibility::GLOBAL);
        for size in SizeKey::ALL {
            record = record.with_url(size.as_str(), data.src.clone());
        }

        self.transaction(|txn| {
            txn.merge_into(&scope, [record]);
            txn.get_set(&scope)
                .and_then(|set| set.get_emote_by_id(&id))
                .cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use em_core::StoreConfig;

    fn catalog() -> FxHashMap<String, EmojiInfo> {
        let mut map = FxHashMap::default();
        map.insert(
            "1F600".to_owned(),
            EmojiInfo {
                unified: "1F600".to_owned(),
                name: "GRINNING FACE".to_owned(),
            },
        );
        map
    }

    #[test]
    fn test_code_point_single_and_sequence() {
        assert_eq!(code_point("a"), "61");
        assert_eq!(code_point("\u{2764}\u{FE0F}"), "2764-FE0F");
        assert_eq!(code_point(""), "");
    }

    #[test]
    fn test_from_twitch_emote_merges() {
        let store = EmoteStore::default();
        let kappa = store
            .from_twitch_emote(&TwitchEmoteRef {
                emote_id: Some("25".to_owned()),
                alt: "Kappa".to_owned(),
            })
            .unwrap();
        assert_eq!(kappa.id(), "25");
        assert_eq!(kappa.provider(), Provider::Twitch);

        store.from_twitch_emote(&TwitchEmoteRef {
            emote_id: Some("88".to_owned()),
            alt: "PogChamp".to_owned(),
        });

        let set = store.get_set("twitch").unwrap();
        assert_eq!(set.len(), 2);
        assert!(store.get_emote("Kappa").is_some());
    }

    #[test]
    fn test_from_twitch_emote_without_id() {
        let store = EmoteStore::default();
        let emote = store.from_twitch_emote(&TwitchEmoteRef {
            emote_id: None,
            alt: "Kappa".to_owned(),
        });
        assert!(emote.is_none());
    }

    #[test]
    fn test_from_twitch_emote_custom_scope() {
        let store = EmoteStore::new(StoreConfig {
            twitch_set: "native".to_owned(),
            ..StoreConfig::default()
        });
        store.from_twitch_emote(&TwitchEmoteRef {
            emote_id: Some("25".to_owned()),
            alt: "Kappa".to_owned(),
        });
        assert_eq!(store.scope_names(), ["native"]);
    }

    #[test]
    fn test_from_emoji_known() {
        let store = EmoteStore::default();
        let emoji = store
            .from_emoji(
                &EmojiRef {
                    alt: "😀".to_owned(),
                    src: "https://twemoji/1f600.svg".to_owned(),
                },
                &catalog(),
            )
            .unwrap();

        assert_eq!(emoji.id(), "1F600");
        assert_eq!(emoji.name(), "grinning face");
        assert!(emoji.is_global());
        assert_eq!(emoji.urls().len(), 4);
        assert_eq!(emoji.cdn(SizeKey::Three), "https://twemoji/1f600.svg");
    }

    #[test]
    fn test_from_emoji_unknown_uses_encoded_alt() {
        let store = EmoteStore::default();
        let emoji = store
            .from_emoji(
                &EmojiRef {
                    alt: "🦀".to_owned(),
                    src: "https://twemoji/1f980.svg".to_owned(),
                },
                &NoCatalog,
            )
            .unwrap();
        assert_eq!(emoji.id(), "%F0%9F%A6%80");
        assert_eq!(emoji.name(), "");
    }

    #[test]
    fn test_from_emoji_keeps_other_emoji() {
        let store = EmoteStore::default();
        for alt in ["😀", "🦀"] {
            store.from_emoji(
                &EmojiRef {
                    alt: alt.to_owned(),
                    src: String::new(),
                },
                &catalog(),
            );
        }
        assert_eq!(store.get_set("emoji").unwrap().len(), 2);
    }
}
