//! Sync statistics with atomic counters.
//!
//! [`SyncStats`] counts what the aggregator does across its lifetime;
//! [`SyncStatsSnapshot`] is a serializable point-in-time copy.
//!
//! All counters use [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. They are informational only.
//!
//! # Examples
//!
//! ```
//! use em_sync::SyncStats;
//!
//! let stats = SyncStats::new();
//! stats.increment_aggregations();
//! stats.increment_installs();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.aggregations, 1);
//! assert_eq!(snapshot.installs, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for aggregation activity.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Aggregations started.
    aggregations: AtomicU64,
    /// Sets installed.
    installs: AtomicU64,
    /// Aggregations that produced no valid records.
    failures: AtomicU64,
    /// Individual source failures, timeouts included.
    source_failures: AtomicU64,
    /// Source calls that timed out.
    timeouts: AtomicU64,
    /// Results dropped because a newer request took over.
    stale_discards: AtomicU64,
}

impl SyncStats {
    /// Creates a new [`SyncStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the aggregations counter.
    #[inline]
    pub fn increment_aggregations(&self) {
        self.aggregations.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the installs counter.
    #[inline]
    pub fn increment_installs(&self) {
        self.installs.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the failed aggregations counter.
    #[inline]
    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the source failures counter.
    #[inline]
    pub fn increment_source_failures(&self) {
        self.source_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the timeouts counter.
    #[inline]
    pub fn increment_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the stale discards counter.
    #[inline]
    pub fn increment_stale_discards(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            aggregations: self.aggregations.load(Ordering::Relaxed),
            installs: self.installs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            stale_discards: self.stale_discards.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.aggregations.store(0, Ordering::Relaxed);
        self.installs.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.source_failures.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.stale_discards.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`SyncStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatsSnapshot {
    /// Aggregations started.
    pub aggregations: u64,
    /// Sets installed.
    pub installs: u64,
    /// Aggregations that produced no valid records.
    pub failures: u64,
    /// Individual source failures, timeouts included.
    pub source_failures: u64,
    /// Source calls that timed out.
    pub timeouts: u64,
    /// Results dropped because a newer request took over.
    pub stale_discards: u64,
}

impl SyncStatsSnapshot {
    /// Returns the fraction of started aggregations that were installed,
    /// as a percentage. Zero when nothing has run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn install_rate(&self) -> f64 {
        if self.aggregations == 0 {
            return 0.0;
        }
        (self.installs as f64 / self.aggregations as f64) * 100.0
    }
}
