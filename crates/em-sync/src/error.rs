//! Error types for the em-sync crate.
//!
//! # Error Recovery Strategy
//!
//! - **Source errors** ([`SourceError`]): recovered by the aggregator. The
//!   failing source contributes nothing and the error is logged.
//! - **Aggregation errors** ([`AggregationError`]): reported to the caller.
//!   [`Empty`](AggregationError::Empty) leaves the installed set untouched;
//!   [`Superseded`](AggregationError::Superseded) means a newer request
//!   took over and the result was dropped.

use std::time::Duration;

use camino::Utf8PathBuf;
use em_core::RecordError;

use crate::report::AggregationReport;

/// A single provider source failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source did not answer within the configured timeout.
    #[error("source {source_name} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Name of the source.
        source_name: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The source reported a failure of its own.
    #[error("source {source_name} failed: {message}")]
    Request {
        /// Name of the source.
        source_name: String,
        /// What went wrong.
        message: String,
    },

    /// Failed to read a fixture file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A fixture file is not valid JSON.
    #[error("failed to decode {path}: {source}")]
    Decode {
        /// The file that couldn't be decoded.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A payload is valid JSON but not a list of records.
    #[error("unexpected payload in {path}: {source}")]
    Payload {
        /// The offending file.
        path: Utf8PathBuf,
        /// What was wrong with it.
        #[source]
        source: RecordError,
    },
}

impl SourceError {
    /// Creates a new [`SourceError::Timeout`] error.
    #[inline]
    pub fn timeout(source_name: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            source_name: source_name.into(),
            timeout,
        }
    }

    /// Creates a new [`SourceError::Request`] error.
    #[inline]
    pub fn request(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a new [`SourceError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`SourceError::Decode`] error.
    #[inline]
    pub fn decode(path: impl Into<Utf8PathBuf>, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the source timed out.
    #[inline]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the source simply has nothing for this channel.
    ///
    /// Providers without data for a channel answer "not found"; that is
    /// routine and logged quietly.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Aggregating a channel's emotes did not produce an installed set.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// Every source failed or returned no valid record. Nothing was installed.
    #[error("no emotes loaded for scope {scope} ({failed} of {total} sources failed)")]
    Empty {
        /// The target scope.
        scope: String,
        /// Number of sources that failed.
        failed: usize,
        /// Number of sources queried.
        total: usize,
        /// Per-source detail.
        report: Box<AggregationReport>,
    },

    /// A newer request started before this one could install.
    #[error("aggregation for scope {scope} (generation {generation}) was superseded")]
    Superseded {
        /// The target scope.
        scope: String,
        /// The generation this aggregation was issued for.
        generation: u64,
    },
}

impl AggregationError {
    /// Creates a new [`AggregationError::Superseded`] error.
    #[inline]
    pub fn superseded(scope: impl Into<String>, generation: u64) -> Self {
        Self::Superseded {
            scope: scope.into(),
            generation,
        }
    }

    /// Returns `true` if the result was dropped in favour of a newer request.
    #[inline]
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }

    /// Returns the target scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        match self {
            Self::Empty { scope, .. } | Self::Superseded { scope, .. } => scope,
        }
    }

    /// Returns the per-source report, when all sources were heard from.
    #[must_use]
    pub fn report(&self) -> Option<&AggregationReport> {
        match self {
            Self::Empty { report, .. } => Some(&**report),
            Self::Superseded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::timeout("ffz-global", Duration::from_millis(1500));
        assert_eq!(err.to_string(), "source ffz-global timed out after 1500ms");
        assert!(err.is_timeout());

        let err = SourceError::request("bttv-channel", "HTTP 503");
        assert_eq!(err.to_string(), "source bttv-channel failed: HTTP 503");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_source_error_not_found() {
        let missing = SourceError::read(
            "fixtures/ffz/1.json",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(missing.is_not_found());

        let denied = SourceError::read(
            "fixtures/ffz/1.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!denied.is_not_found());
    }

    #[test]
    fn test_aggregation_error_helpers() {
        let err = AggregationError::superseded("12345", 7);
        assert!(err.is_superseded());
        assert_eq!(err.scope(), "12345");
        assert!(err.report().is_none());
        assert_eq!(
            err.to_string(),
            "aggregation for scope 12345 (generation 7) was superseded"
        );
    }
}
