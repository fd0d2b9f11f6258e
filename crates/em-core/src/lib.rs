//! Core types, errors, and configuration for the emote registry.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`RawEmoteRecord`], the strict record shape every provider produces
//! - [`Emote`], the immutable value wrapping a record
//! - [`Provider`], [`Visibility`], and [`SizeKey`]
//! - Configuration structures ([`Config`] and its sections)
//! - Error types ([`ConfigError`], [`RecordError`])
//! - Type aliases for `FxHashMap`/`FxHashSet`

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{AggregatorConfig, Config, ElementKeying, StoreConfig, SwitcherConfig};
pub use error::{ConfigError, RecordError};
pub use types::{
    decode_records, DecodedRecords, Emote, PartialUser, Provider, RawEmoteRecord, SizeKey,
    UrlList, Visibility, TWITCH_CDN_BASE,
};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
