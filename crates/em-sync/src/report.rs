//! Per-aggregation reporting.

use serde::{Deserialize, Serialize};

use crate::source::SourceScope;

/// What one source contributed to an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    /// The source answered with this many records.
    Loaded {
        /// Number of records returned.
        records: usize,
    },

    /// The source failed and contributed nothing.
    Failed {
        /// The error, rendered for display.
        error: String,
        /// Whether the failure was a timeout.
        timed_out: bool,
    },
}

impl SourceOutcome {
    /// Returns `true` if the source failed.
    #[inline]
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the number of records contributed.
    #[inline]
    #[must_use]
    pub const fn records(&self) -> usize {
        match self {
            Self::Loaded { records } => *records,
            Self::Failed { .. } => 0,
        }
    }
}

/// One source's line in an [`AggregationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Source name.
    pub source: String,

    /// Whether the source is channel or global scoped.
    pub scope: SourceScope,

    /// What happened.
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Summary of one aggregation, in source declaration order.
///
/// # Examples
///
/// ```
/// use em_sync::{AggregationReport, SourceOutcome, SourceReport, SourceScope};
///
/// let report = AggregationReport {
///     scope: "12345".into(),
///     generation: 1,
///     sources: vec![
///         SourceReport {
///             source: "7tv-channel".into(),
///             scope: SourceScope::Channel,
///             outcome: SourceOutcome::Loaded { records: 3 },
///         },
///         SourceReport {
///             source: "ffz-global".into(),
///             scope: SourceScope::Global,
///             outcome: SourceOutcome::Failed { error: "boom".into(), timed_out: false },
///         },
///     ],
///     installed: 3,
/// };
///
/// assert_eq!(report.failed_count(), 1);
/// assert_eq!(report.total_records(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// The target scope.
    pub scope: String,

    /// Generation the aggregation was issued for.
    pub generation: u64,

    /// Per-source outcomes.
    pub sources: Vec<SourceReport>,

    /// Emotes in the installed set, after duplicate ids collapsed.
    pub installed: usize,
}

impl AggregationReport {
    /// Returns the number of sources that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.sources.iter().filter(|s| s.outcome.is_failed()).count()
    }

    /// Returns the number of records fetched before merging.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.sources.iter().map(|s| s.outcome.records()).sum()
    }
}
