//! The immutable emote value.

use std::borrow::Cow;

use crate::types::{PartialUser, Provider, RawEmoteRecord, SizeKey, Visibility};

/// Base URL for native Twitch emote images.
pub const TWITCH_CDN_BASE: &str = "https://static-cdn.jtvnw.net/emoticons/v2";

/// An emote, wrapping the provider record it was built from.
///
/// Emotes are immutable. Sets hand them out behind `Arc`, so a reader
/// holding one keeps it alive even after its set has been replaced.
///
/// # Examples
///
/// ```
/// use em_core::{Emote, Provider, RawEmoteRecord, SizeKey};
///
/// let emote = Emote::new(
///     RawEmoteRecord::new("603cb219", "catJAM", Provider::SevenTv)
///         .with_url("1", "https://cdn.7tv.app/emote/603cb219/1x")
///         .with_url("2", "https://cdn.7tv.app/emote/603cb219/2x"),
/// );
///
/// assert_eq!(emote.cdn(SizeKey::One), "https://cdn.7tv.app/emote/603cb219/1x");
/// // Missing sizes fall back to the last URL.
/// assert_eq!(emote.cdn(SizeKey::Four), "https://cdn.7tv.app/emote/603cb219/2x");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emote {
    record: RawEmoteRecord,
}

impl Emote {
    /// Wraps a provider record.
    #[inline]
    #[must_use]
    pub const fn new(record: RawEmoteRecord) -> Self {
        Self { record }
    }

    /// Returns the provider-assigned id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Returns the MIME type, empty if unknown.
    #[inline]
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.record.mime
    }

    /// Returns the tags.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.record.tags
    }

    /// Returns the visibility bits.
    #[inline]
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.record.visibility
    }

    /// Returns the owner, if known.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> Option<&PartialUser> {
        self.record.owner.as_ref()
    }

    /// Returns the originating provider.
    #[inline]
    #[must_use]
    pub const fn provider(&self) -> Provider {
        self.record.provider
    }

    /// Returns the stored `(size, url)` pairs.
    #[inline]
    #[must_use]
    pub fn urls(&self) -> &[(String, String)] {
        &self.record.urls
    }

    /// Returns the image URL for `size`.
    ///
    /// Twitch emotes always get a URL built from their id, whatever the
    /// record stores. Everything else uses the stored URL for `size`, or the
    /// last stored URL when that size is missing. A record without any URL
    /// yields an empty string.
    #[must_use]
    pub fn cdn(&self, size: SizeKey) -> Cow<'_, str> {
        if self.record.provider == Provider::Twitch {
            return Cow::Owned(format!(
                "{TWITCH_CDN_BASE}/{}/default/dark/{}.0",
                self.record.id,
                size.as_str()
            ));
        }

        self.record
            .urls
            .iter()
            .find(|(key, _)| key == size.as_str())
            .or_else(|| self.record.urls.last())
            .map_or(Cow::Borrowed(""), |(_, url)| Cow::Borrowed(url.as_str()))
    }

    /// Returns `true` if the emote has the [`GLOBAL`](Visibility::GLOBAL) bit.
    #[inline]
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.record.visibility.contains(Visibility::GLOBAL)
    }

    /// Returns `true` if the emote has the [`PRIVATE`](Visibility::PRIVATE) bit.
    #[inline]
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.record.visibility.contains(Visibility::PRIVATE)
    }

    /// Returns `true` if the emote has the
    /// [`ZERO_WIDTH`](Visibility::ZERO_WIDTH) bit.
    #[inline]
    #[must_use]
    pub const fn is_zero_width(&self) -> bool {
        self.record.visibility.contains(Visibility::ZERO_WIDTH)
    }

    /// Returns the exact record this emote was built from.
    #[inline]
    #[must_use]
    pub const fn resolve(&self) -> &RawEmoteRecord {
        &self.record
    }

    /// Consumes the emote, returning its record.
    #[inline]
    #[must_use]
    pub fn into_record(self) -> RawEmoteRecord {
        self.record
    }
}

impl From<RawEmoteRecord> for Emote {
    fn from(record: RawEmoteRecord) -> Self {
        Self::new(record)
    }
}
