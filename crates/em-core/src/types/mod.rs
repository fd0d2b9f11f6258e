//! Domain types for the emote registry.
//!
//! # Module Organization
//!
//! - [`provider`] - The service an emote comes from
//! - [`visibility`] - Visibility bit flags
//! - [`record`] - Raw provider records, size keys, and lenient decoding
//! - [`emote`] - The immutable [`Emote`] value
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use em_core::{Emote, Provider, RawEmoteRecord, SizeKey, Visibility};
//! ```

pub mod emote;
pub mod provider;
pub mod record;
pub mod visibility;

pub use emote::{Emote, TWITCH_CDN_BASE};
pub use provider::Provider;
pub use record::{decode_records, DecodedRecords, PartialUser, RawEmoteRecord, SizeKey, UrlList};
pub use visibility::Visibility;
