//! Emote visibility flags.
//!
//! Visibility travels as an unsigned integer on the wire. Bits are
//! independent: an emote can be global and zero-width at the same time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags::bitflags! {
    /// Visibility bits attached to an emote record.
    ///
    /// Unknown bits are retained so that a record serializes back to the
    /// exact integer it was read from.
    ///
    /// # Examples
    ///
    /// ```
    /// use em_core::Visibility;
    ///
    /// let vis = Visibility::GLOBAL | Visibility::ZERO_WIDTH;
    /// assert!(vis.contains(Visibility::GLOBAL));
    /// assert!(!vis.contains(Visibility::PRIVATE));
    /// assert_eq!(vis.bits(), 0b1000_0010);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Visibility: u32 {
        /// Only usable by its owner.
        const PRIVATE = 1 << 0;
        /// Enabled everywhere, not tied to a channel.
        const GLOBAL = 1 << 1;
        /// Hidden from public listings.
        const UNLISTED = 1 << 2;
        /// Takes precedence over a `BetterTTV` emote with the same name.
        const OVERRIDE_BTTV = 1 << 3;
        /// Takes precedence over a `FrankerFaceZ` emote with the same name.
        const OVERRIDE_FFZ = 1 << 4;
        /// Takes precedence over a global Twitch emote with the same name.
        const OVERRIDE_TWITCH_GLOBAL = 1 << 5;
        /// Takes precedence over a Twitch subscriber emote with the same name.
        const OVERRIDE_TWITCH_SUBSCRIBER = 1 << 6;
        /// Rendered on top of the preceding emote.
        const ZERO_WIDTH = 1 << 7;
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_serializes_as_integer() {
        let vis = Visibility::GLOBAL | Visibility::PRIVATE;
        assert_eq!(serde_json::to_string(&vis).unwrap(), "3");
    }

    #[test]
    fn test_visibility_retains_unknown_bits() {
        let vis: Visibility = serde_json::from_str("1026").unwrap();
        assert!(vis.contains(Visibility::GLOBAL));
        assert_eq!(vis.bits(), 1026);
        assert_eq!(serde_json::to_string(&vis).unwrap(), "1026");
    }

    #[test]
    fn test_visibility_bits_are_independent() {
        let vis = Visibility::GLOBAL | Visibility::PRIVATE | Visibility::ZERO_WIDTH;
        assert!(vis.contains(Visibility::GLOBAL));
        assert!(vis.contains(Visibility::PRIVATE));
        assert!(vis.intersects(Visibility::ZERO_WIDTH | Visibility::UNLISTED));
        assert!(!vis.contains(Visibility::ZERO_WIDTH | Visibility::UNLISTED));
    }

    #[test]
    fn test_visibility_default_is_empty() {
        assert!(Visibility::default().is_empty());
    }
}
