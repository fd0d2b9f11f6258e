//! Error types for the em-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and
//! validation, and [`RecordError`] for provider records that cannot be
//! turned into emotes.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use em_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingFile(Utf8PathBuf::from("/etc/emotes.json"));
/// assert!(error.to_string().contains("/etc/emotes.json"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {0}")]
    MissingFile(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// A provider record that was rejected while building an emote set.
///
/// Rejections are per record: the surrounding batch keeps every record
/// that passed, so these errors are logged and counted rather than
/// propagated.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The provider payload was not a list of records.
    #[error("expected a list of emote records, found {found}")]
    NotAList {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A record could not be decoded (missing `id`/`name`, wrong types).
    #[error("record #{index} is malformed: {source}")]
    Malformed {
        /// Position of the record in the payload.
        index: usize,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A record decoded but carries an empty id.
    #[error("record #{index} ('{name}') has an empty id")]
    EmptyId {
        /// Position of the record in the payload.
        index: usize,
        /// Name of the offending record, for log context.
        name: String,
    },
}

impl RecordError {
    /// Returns the payload position of the rejected record, if the error is
    /// about a single record.
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Malformed { index, .. } | Self::EmptyId { index, .. } => Some(*index),
            Self::NotAList { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::invalid_option("source_timeout_ms", "must be positive");
        let msg = error.to_string();
        assert!(msg.contains("source_timeout_ms"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_missing_file_display() {
        let error = ConfigError::MissingFile(Utf8PathBuf::from("/missing/emotes.json"));
        assert!(error.to_string().contains("/missing/emotes.json"));
    }

    #[test]
    fn test_record_error_index() {
        let err = RecordError::EmptyId {
            index: 3,
            name: "Kappa".to_owned(),
        };
        assert_eq!(err.index(), Some(3));
        assert!(err.to_string().contains("Kappa"));

        let err = RecordError::NotAList { found: "object" };
        assert_eq!(err.index(), None);
        assert_eq!(
            err.to_string(),
            "expected a list of emote records, found object"
        );
    }
}
