//! Configuration structures for the emote registry.
//!
//! This module provides configuration types for each component:
//!
//! - [`StoreConfig`] - Registry settings (global set names, element cache keying)
//! - [`AggregatorConfig`] - Provider fan-out settings (per-source timeout)
//! - [`SwitcherConfig`] - Scope switcher settings (notifier capacity)
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`], and every field is
//! optional when deserializing.

use std::time::Duration;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the registry keys cached visual elements.
///
/// The element cache can either share one element per emote id across all
/// scopes, or keep a separate element per `(scope, id)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKeying {
    /// One element per emote id, shared by every scope holding that id.
    #[default]
    EmoteId,
    /// One element per `(scope, id)` pair.
    ScopeAndId,
}

/// Configuration for the emote registry.
///
/// # Examples
///
/// ```
/// use em_core::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.twitch_set, "twitch");
/// assert_eq!(config.emoji_set, "emoji");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Scope name for ad-hoc native platform emotes.
    pub twitch_set: String,

    /// Scope name for emoji.
    pub emoji_set: String,

    /// Keying strategy for the element cache.
    pub element_keying: ElementKeying,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            twitch_set: "twitch".to_owned(),
            emoji_set: "emoji".to_owned(),
            element_keying: ElementKeying::EmoteId,
        }
    }
}

/// Configuration for the provider aggregator.
///
/// # Examples
///
/// ```
/// use em_core::AggregatorConfig;
/// use std::time::Duration;
///
/// let config = AggregatorConfig::default();
/// assert_eq!(config.source_timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Upper bound on a single provider call, in milliseconds.
    ///
    /// A provider that does not answer in time contributes nothing.
    pub source_timeout_ms: u64,
}

impl AggregatorConfig {
    /// Returns the per-source timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 10_000,
        }
    }
}

/// Configuration for the scope switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    /// Capacity of the scope event broadcast channel.
    ///
    /// Slow subscribers that fall further behind than this lose the oldest
    /// events.
    pub event_capacity: usize,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self { event_capacity: 32 }
    }
}

/// Root configuration for the emote registry.
///
/// # Examples
///
/// ```
/// use em_core::Config;
///
/// let config = Config::default();
/// assert!(config.validate().is_ok());
///
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("source_timeout_ms"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry configuration.
    pub store: StoreConfig,

    /// Aggregator configuration.
    pub aggregator: AggregatorConfig,

    /// Scope switcher configuration.
    pub switcher: SwitcherConfig,
}

impl Config {
    /// Loads and validates a configuration file in JSON format.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if `path` does not exist,
    /// [`ConfigError::Io`] or [`ConfigError::Parse`] if it cannot be read or
    /// decoded, and [`ConfigError::InvalidOption`] if validation fails.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_owned()));
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that would make a component unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a zero timeout, a zero
    /// event capacity, or an empty or shared global set name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregator.source_timeout_ms == 0 {
            return Err(ConfigError::invalid_option(
                "aggregator.source_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.switcher.event_capacity == 0 {
            return Err(ConfigError::invalid_option(
                "switcher.event_capacity",
                "must be greater than zero",
            ));
        }
        if self.store.twitch_set.is_empty() || self.store.emoji_set.is_empty() {
            return Err(ConfigError::invalid_option(
                "store",
                "global set names must not be empty",
            ));
        }
        if self.store.twitch_set == self.store.emoji_set {
            return Err(ConfigError::invalid_option(
                "store.emoji_set",
                "must differ from store.twitch_set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.twitch_set, "twitch");
        assert_eq!(config.emoji_set, "emoji");
        assert_eq!(config.element_keying, ElementKeying::EmoteId);
    }

    #[test]
    fn test_aggregator_config_defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.source_timeout_ms, 10_000);
        assert_eq!(config.source_timeout(), Duration::from_millis(10_000));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"aggregator": {"source_timeout_ms": 2500}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.aggregator.source_timeout_ms, 2500);
        assert_eq!(config.store.twitch_set, "twitch");
        assert_eq!(config.switcher.event_capacity, 32);
    }

    #[test]
    fn test_element_keying_serialization() {
        assert_eq!(
            serde_json::to_string(&ElementKeying::EmoteId).unwrap(),
            r#""emote_id""#
        );
        assert_eq!(
            serde_json::to_string(&ElementKeying::ScopeAndId).unwrap(),
            r#""scope_and_id""#
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.aggregator.source_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_shared_set_names() {
        let mut config = Config::default();
        config.store.emoji_set = "twitch".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Utf8Path::new("/nonexistent/emotes.json"));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotes.json");
        std::fs::write(&path, r#"{"store": {"element_keying": "scope_and_id"}}"#).unwrap();

        let path = Utf8Path::from_path(&path).unwrap();
        let config = Config::load(path).unwrap();
        assert_eq!(config.store.element_keying, ElementKeying::ScopeAndId);
        assert_eq!(config.aggregator, AggregatorConfig::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotes.json");
        std::fs::write(&path, "{ not json").unwrap();

        let path = Utf8Path::from_path(&path).unwrap();
        assert!(matches!(Config::load(path), Err(ConfigError::Parse(_))));
    }
}
