//! Emote provider identifiers.

use serde::{Deserialize, Serialize};

/// The service an emote record originates from.
///
/// Serialized with the wire names providers use (`"7TV"`, `"TWITCH"`, ...).
/// `"SEVENTV"` is accepted as an alias when decoding.
///
/// # Examples
///
/// ```
/// use em_core::Provider;
///
/// assert_eq!(Provider::default(), Provider::SevenTv);
/// assert_eq!(Provider::Twitch.label(), "Twitch");
/// assert!(Provider::Twitch.is_native());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Provider {
    /// 7TV, the default when a record does not say.
    #[default]
    #[serde(rename = "7TV", alias = "SEVENTV")]
    SevenTv,

    /// Native Twitch emotes.
    #[serde(rename = "TWITCH")]
    Twitch,

    /// Unicode emoji rendered as images.
    #[serde(rename = "EMOJI")]
    Emoji,

    /// `FrankerFaceZ`.
    #[serde(rename = "FFZ")]
    Ffz,

    /// `BetterTTV`.
    #[serde(rename = "BTTV")]
    Bttv,
}

impl Provider {
    /// All providers, in a stable order.
    pub const ALL: [Self; 5] = [Self::SevenTv, Self::Twitch, Self::Emoji, Self::Ffz, Self::Bttv];

    /// Returns `true` for emotes owned by the chat platform itself.
    #[inline]
    #[must_use]
    pub const fn is_native(self) -> bool {
        matches!(self, Self::Twitch | Self::Emoji)
    }

    /// Returns a human-readable label for this provider.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SevenTv => "7TV",
            Self::Twitch => "Twitch",
            Self::Emoji => "Emoji",
            Self::Ffz => "FrankerFaceZ",
            Self::Bttv => "BetterTTV",
        }
    }

    /// Returns a short lowercase slug, suitable for directory names and log
    /// fields.
    #[inline]
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::SevenTv => "7tv",
            Self::Twitch => "twitch",
            Self::Emoji => "emoji",
            Self::Ffz => "ffz",
            Self::Bttv => "bttv",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_serialization() {
        assert_eq!(serde_json::to_string(&Provider::SevenTv).unwrap(), r#""7TV""#);
        assert_eq!(serde_json::to_string(&Provider::Twitch).unwrap(), r#""TWITCH""#);
        assert_eq!(serde_json::to_string(&Provider::Ffz).unwrap(), r#""FFZ""#);
        assert_eq!(serde_json::to_string(&Provider::Bttv).unwrap(), r#""BTTV""#);
        assert_eq!(serde_json::to_string(&Provider::Emoji).unwrap(), r#""EMOJI""#);
    }

    #[test]
    fn test_provider_seventv_alias() {
        let provider: Provider = serde_json::from_str(r#""SEVENTV""#).unwrap();
        assert_eq!(provider, Provider::SevenTv);
        let provider: Provider = serde_json::from_str(r#""7TV""#).unwrap();
        assert_eq!(provider, Provider::SevenTv);
    }

    #[test]
    fn test_provider_unknown_rejected() {
        assert!(serde_json::from_str::<Provider>(r#""DISCORD""#).is_err());
    }

    #[test]
    fn test_provider_slugs_unique() {
        let mut slugs: Vec<_> = Provider::ALL.iter().map(|p| p.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), Provider::ALL.len());
    }
}
