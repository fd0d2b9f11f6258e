//! Provider fan-out and channel switching.
//!
//! This crate fills an [`EmoteStore`](em_store::EmoteStore) from provider
//! sources:
//!
//! - [`EmoteSource`]: the provider seam, with [`StaticSource`] and
//!   [`FixtureSource`] implementations
//! - [`Aggregator`]: concurrent fetch, per-source fallback, one atomic
//!   install per channel
//! - [`ScopeSwitcher`]: last-request-wins channel changes with
//!   [`ScopeEvent`] notifications
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use em_core::{AggregatorConfig, Provider, RawEmoteRecord, SwitcherConfig};
//! use em_store::EmoteStore;
//! use em_sync::{
//!     Aggregator, ChannelRef, NoSubscriptions, ScopeSwitcher, SourceScope, StaticSource,
//!     SwitchRequest,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(EmoteStore::default());
//! let globals = StaticSource::new(
//!     "7tv-global",
//!     SourceScope::Global,
//!     vec![RawEmoteRecord::new("60ae958e", "peepoHappy", Provider::SevenTv)],
//! );
//! let aggregator = Aggregator::new(
//!     Arc::clone(&store),
//!     vec![Arc::new(globals)],
//!     AggregatorConfig::default(),
//! );
//! let switcher = ScopeSwitcher::new(
//!     Arc::new(aggregator),
//!     Arc::new(NoSubscriptions),
//!     SwitcherConfig::default(),
//! );
//!
//! let outcome = switcher
//!     .switch(SwitchRequest::new(ChannelRef::new("12345", "forsen")))
//!     .await;
//! assert!(outcome.is_switched());
//! assert!(store.get_emote("peepoHappy").is_some());
//! # }
//! ```

pub mod aggregator;
pub mod error;
pub mod events;
pub mod report;
pub mod source;
pub mod stats;
pub mod switcher;

pub use aggregator::Aggregator;
pub use error::{AggregationError, SourceError};
pub use events::ScopeEvent;
pub use report::{AggregationReport, SourceOutcome, SourceReport};
pub use source::{standard_sources, ChannelRef, EmoteSource, FixtureSource, SourceScope, StaticSource};
pub use stats::{SyncStats, SyncStatsSnapshot};
pub use switcher::{ChannelSubscriptions, NoSubscriptions, ScopeSwitcher, SwitchOutcome, SwitchRequest};
