//! Channel emote fan-out.
//!
//! The [`Aggregator`] asks every configured source for a channel's emotes
//! at once, waits for all of them, and installs the concatenated result
//! into the store under the channel id.
//!
//! # Failure handling
//!
//! - A failing or slow source contributes an empty list; the others still
//!   count. The failure is logged and shows up in the report.
//! - If no valid record comes back, nothing is installed and the previous
//!   set for that scope stays readable.
//!
//! # Supersession
//!
//! Every aggregation is tagged with a generation from
//! [`Aggregator::begin`]. The install happens inside a store transaction
//! that first checks the generation is still the latest one; a result for
//! an older generation is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use em_core::{AggregatorConfig, RawEmoteRecord};
use em_store::{EmoteSet, EmoteStore};
use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use crate::error::{AggregationError, SourceError};
use crate::report::{AggregationReport, SourceOutcome, SourceReport};
use crate::source::{ChannelRef, EmoteSource};
use crate::stats::SyncStats;

/// Fans out to provider sources and installs the merged result.
pub struct Aggregator {
    store: Arc<EmoteStore>,
    sources: Vec<Arc<dyn EmoteSource>>,
    config: AggregatorConfig,
    generation: AtomicU64,
    stats: SyncStats,
}

impl Aggregator {
    /// Creates an aggregator over `sources`, in declaration order.
    #[must_use]
    pub fn new(
        store: Arc<EmoteStore>,
        sources: Vec<Arc<dyn EmoteSource>>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            store,
            sources,
            config,
            generation: AtomicU64::new(0),
            stats: SyncStats::new(),
        }
    }

    /// Returns the store results are installed into.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &Arc<EmoteStore> {
        &self.store
    }

    /// Returns the configured sources.
    #[inline]
    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn EmoteSource>] {
        &self.sources
    }

    /// Returns the activity counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Starts a new generation and returns it.
    ///
    /// Any aggregation tagged with an earlier generation will no longer
    /// install.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the latest generation handed out by [`begin`](Self::begin).
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns `true` if `generation` is still the latest.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Starts a new generation and aggregates `channel` under it.
    pub async fn refresh(&self, channel: &ChannelRef) -> Result<AggregationReport, AggregationError> {
        let generation = self.begin();
        self.aggregate(channel, generation).await
    }

    /// Fetches `channel` from every source and installs the merged set.
    ///
    /// All sources are queried concurrently and the merge waits for every
    /// one of them. Records are concatenated in source declaration order,
    /// so on duplicate ids the later source wins.
    ///
    /// # Errors
    ///
    /// - [`AggregationError::Empty`] if no source produced a valid record.
    ///   The scope's existing set is left as it was.
    /// - [`AggregationError::Superseded`] if `generation` is no longer
    ///   current when the results are in. Nothing is installed.
    pub async fn aggregate(
        &self,
        channel: &ChannelRef,
        generation: u64,
    ) -> Result<AggregationReport, AggregationError> {
        self.stats.increment_aggregations();
        let timeout = self.config.source_timeout();
        debug!(
            scope = %channel.id,
            channel = %channel.name,
            generation,
            sources = self.sources.len(),
            "Aggregating channel emotes"
        );

        let calls = self
            .sources
            .iter()
            .map(|source| fetch_bounded(source.as_ref(), channel, timeout));
        let results = join_all(calls).await;

        let mut records: Vec<RawEmoteRecord> = Vec::new();
        let mut reports = Vec::with_capacity(self.sources.len());
        for (source, result) in self.sources.iter().zip(results) {
            let outcome = match result {
                Ok(batch) => {
                    let count = batch.len();
                    records.extend(batch);
                    SourceOutcome::Loaded { records: count }
                }
                Err(err) => {
                    self.record_source_failure(source.as_ref(), channel, &err);
                    SourceOutcome::Failed {
                        error: err.to_string(),
                        timed_out: err.is_timeout(),
                    }
                }
            };
            reports.push(SourceReport {
                source: source.name().to_owned(),
                scope: source.scope(),
                outcome,
            });
        }

        let mut report = AggregationReport {
            scope: channel.id.clone(),
            generation,
            sources: reports,
            installed: 0,
        };

        let set = EmoteSet::from_records(channel.id.as_str(), records);
        if set.is_empty() {
            self.stats.increment_failures();
            let failed = report.failed_count();
            error!(
                scope = %channel.id,
                channel = %channel.name,
                failed,
                total = self.sources.len(),
                "No emotes loaded, keeping existing set"
            );
            return Err(AggregationError::Empty {
                scope: channel.id.clone(),
                failed,
                total: self.sources.len(),
                report: Box::new(report),
            });
        }

        let installed = self.store.transaction(|txn| {
            self.is_current(generation)
                .then(|| txn.install_set(set).len())
        });

        let Some(installed) = installed else {
            self.stats.increment_stale_discards();
            debug!(
                scope = %channel.id,
                generation,
                current = self.current_generation(),
                "Discarding superseded aggregation"
            );
            return Err(AggregationError::superseded(channel.id.clone(), generation));
        };

        self.stats.increment_installs();
        report.installed = installed;
        info!(
            scope = %channel.id,
            channel = %channel.name,
            generation,
            emotes = installed,
            failed_sources = report.failed_count(),
            "Installed channel emotes"
        );
        Ok(report)
    }

    fn record_source_failure(&self, source: &dyn EmoteSource, channel: &ChannelRef, err: &SourceError) {
        self.stats.increment_source_failures();
        if err.is_timeout() {
            self.stats.increment_timeouts();
        }
        if err.is_not_found() {
            debug!(source = source.name(), scope = %channel.id, error = %err, "Source has no emotes");
        } else {
            warn!(source = source.name(), scope = %channel.id, error = %err, "Source failed");
        }
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("config", &self.config)
            .field("generation", &self.current_generation())
            .finish_non_exhaustive()
    }
}

/// Calls one source, turning an elapsed timeout into a [`SourceError`].
async fn fetch_bounded(
    source: &dyn EmoteSource,
    channel: &ChannelRef,
    timeout: Duration,
) -> Result<Vec<RawEmoteRecord>, SourceError> {
    match tokio::time::timeout(timeout, source.fetch(channel)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::timeout(source.name(), timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceScope, StaticSource};
    use async_trait::async_trait;
    use em_core::Provider;

    struct Failing;

    #[async_trait]
    impl EmoteSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn scope(&self) -> SourceScope {
            SourceScope::Global
        }

        async fn fetch(&self, _channel: &ChannelRef) -> Result<Vec<RawEmoteRecord>, SourceError> {
            Err(SourceError::request("failing", "HTTP 500"))
        }
    }

    struct Slow;

    #[async_trait]
    impl EmoteSource for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn scope(&self) -> SourceScope {
            SourceScope::Channel
        }

        async fn fetch(&self, _channel: &ChannelRef) -> Result<Vec<RawEmoteRecord>, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![RawEmoteRecord::new("late", "late", Provider::Bttv)])
        }
    }

    fn fixed(name: &str, ids: &[&str]) -> Arc<dyn EmoteSource> {
        Arc::new(StaticSource::new(
            name,
            SourceScope::Channel,
            ids.iter()
                .map(|id| RawEmoteRecord::new(*id, format!("{name}-{id}"), Provider::SevenTv))
                .collect(),
        ))
    }

    fn aggregator(sources: Vec<Arc<dyn EmoteSource>>) -> Aggregator {
        Aggregator::new(
            Arc::new(EmoteStore::default()),
            sources,
            AggregatorConfig {
                source_timeout_ms: 50,
            },
        )
    }

    #[tokio::test]
    async fn test_aggregate_concatenates_in_declaration_order() {
        let agg = aggregator(vec![fixed("a", &["1", "2"]), fixed("b", &["3"])]);
        let report = agg.refresh(&ChannelRef::new("chan", "")).await.unwrap();

        assert_eq!(report.installed, 3);
        let set = agg.store().get_set("chan").unwrap();
        let ids: Vec<_> = set.emotes().map(|e| e.id()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_aggregate_later_source_wins_collision() {
        let agg = aggregator(vec![fixed("a", &["x"]), fixed("b", &["x"])]);
        let report = agg.refresh(&ChannelRef::new("chan", "")).await.unwrap();

        assert_eq!(report.installed, 1);
        assert_eq!(report.total_records(), 2);
        let emote = agg.store().get_emote("x").unwrap();
        assert_eq!(emote.name(), "b-x");
    }

    #[tokio::test]
    async fn test_aggregate_timeout_is_source_failure() {
        let agg = aggregator(vec![fixed("a", &["1"]), Arc::new(Slow)]);
        let report = agg.refresh(&ChannelRef::new("chan", "")).await.unwrap();

        assert_eq!(report.installed, 1);
        assert!(matches!(
            report.sources[1].outcome,
            SourceOutcome::Failed { timed_out: true, .. }
        ));
        let stats = agg.stats().snapshot();
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.source_failures, 1);
    }

    #[tokio::test]
    async fn test_aggregate_all_failed_keeps_existing_set() {
        let agg = aggregator(vec![Arc::new(Failing), Arc::new(Failing)]);
        agg.store()
            .enable_set("chan", [RawEmoteRecord::new("old", "old", Provider::SevenTv)]);

        let err = agg.refresh(&ChannelRef::new("chan", "")).await.unwrap_err();
        assert!(matches!(err, AggregationError::Empty { failed: 2, total: 2, .. }));
        assert_eq!(err.report().map(AggregationReport::failed_count), Some(2));
        assert!(agg.store().get_emote("old").is_some());
        assert_eq!(agg.stats().snapshot().failures, 1);
    }

    #[tokio::test]
    async fn test_aggregate_empty_sources_is_failure() {
        let agg = aggregator(vec![fixed("a", &[])]);
        let err = agg.refresh(&ChannelRef::new("chan", "")).await.unwrap_err();
        assert!(matches!(err, AggregationError::Empty { failed: 0, total: 1, .. }));
        assert!(agg.store().get_set("chan").is_none());
    }

    #[tokio::test]
    async fn test_aggregate_stale_generation_not_installed() {
        let agg = aggregator(vec![fixed("a", &["1"])]);
        let stale = agg.begin();
        agg.begin();

        let err = agg
            .aggregate(&ChannelRef::new("chan", ""), stale)
            .await
            .unwrap_err();
        assert!(err.is_superseded());
        assert!(agg.store().get_set("chan").is_none());
        assert_eq!(agg.stats().snapshot().stale_discards, 1);
    }

    #[test]
    fn test_generations_increase() {
        let agg = aggregator(Vec::new());
        assert_eq!(agg.current_generation(), 0);
        let first = agg.begin();
        let second = agg.begin();
        assert!(second > first);
        assert!(agg.is_current(second));
        assert!(!agg.is_current(first));
    }
}
