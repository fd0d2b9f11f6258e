//! In-memory emote registry.
//!
//! This crate holds the emotes currently usable in chat:
//!
//! - [`EmoteSet`]: one scope's emotes, keyed by id
//! - [`EmoteStore`]: every enabled scope, with lock-free reads and
//!   transactional writes
//! - [`ElementCache`]: rendered handles, one per emote
//! - [`BadgeIndex`] and [`AssetStore`]: the cosmetics that travel with
//!   emotes
//!
//! Fetching emotes from providers lives in `em-sync`.

pub mod assets;
pub mod badge;
pub mod element;
pub mod native;
pub mod set;
pub mod store;

pub use assets::AssetStore;
pub use badge::{Badge, BadgeIndex, UserKey};
pub use element::{ElementCache, ElementHandle, Renderer};
pub use native::{code_point, EmojiCatalog, EmojiInfo, EmojiRef, NoCatalog, TwitchEmoteRef};
pub use set::{EmoteSet, PushMode, PushSummary, ResolvedSet};
pub use store::{EmoteMatch, EmoteStore, ScopeMap, StoreTxn};
