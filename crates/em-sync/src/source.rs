//! Provider sources.
//!
//! An [`EmoteSource`] answers one question: which records does this
//! provider have for a channel? Sources are either channel scoped or global
//! scoped; global sources ignore the channel they are asked about.
//!
//! Two implementations ship here:
//!
//! - [`StaticSource`]: a fixed list of records, for preloaded sets and tests
//! - [`FixtureSource`]: JSON files on disk, laid out by provider slug

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use em_core::{decode_records, Provider, RawEmoteRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SourceError;

/// The channel an aggregation is for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Platform channel id. Also the scope name the channel's set is
    /// installed under.
    pub id: String,

    /// Channel login, for logging.
    #[serde(default)]
    pub name: String,
}

impl ChannelRef {
    /// Creates a channel reference.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Whether a source's emotes depend on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceScope {
    /// Emotes enabled for one channel.
    Channel,

    /// Emotes enabled everywhere.
    Global,
}

impl SourceScope {
    /// Returns the lowercase name of this scope.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for SourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider of emote records.
///
/// Implementations must be safe to call concurrently with other sources.
/// The aggregator bounds every call with its own timeout, so sources need
/// not enforce one.
#[async_trait]
pub trait EmoteSource: Send + Sync {
    /// Human-readable name for logging and reports.
    fn name(&self) -> &str;

    /// Whether this source is channel or global scoped.
    fn scope(&self) -> SourceScope;

    /// Fetches the records this source has for `channel`.
    async fn fetch(&self, channel: &ChannelRef) -> Result<Vec<RawEmoteRecord>, SourceError>;
}

/// A source answering with a fixed list of records.
///
/// # Examples
///
/// ```
/// use em_core::{Provider, RawEmoteRecord};
/// use em_sync::{ChannelRef, EmoteSource, SourceScope, StaticSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = StaticSource::new(
///     "twitch-global",
///     SourceScope::Global,
///     vec![RawEmoteRecord::new("25", "Kappa", Provider::Twitch)],
/// );
/// let records = source.fetch(&ChannelRef::new("1", "forsen")).await.unwrap();
/// assert_eq!(records.len(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    scope: SourceScope,
    records: Vec<RawEmoteRecord>,
}

impl StaticSource {
    /// Creates a source that always returns `records`.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: SourceScope, records: Vec<RawEmoteRecord>) -> Self {
        Self {
            name: name.into(),
            scope,
            records,
        }
    }
}

#[async_trait]
impl EmoteSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> SourceScope {
        self.scope
    }

    async fn fetch(&self, _channel: &ChannelRef) -> Result<Vec<RawEmoteRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

/// A source reading provider payloads from a fixture directory.
///
/// Channel-scoped sources read `<dir>/<provider slug>/<channel id>.json`;
/// global-scoped sources read `<dir>/<provider slug>/global.json`. Each
/// file holds a JSON array of records. Malformed records are skipped with
/// a warning; a missing file is a source failure.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    name: String,
    provider: Provider,
    scope: SourceScope,
    root: Utf8PathBuf,
}

impl FixtureSource {
    /// Creates a fixture source for `provider` rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, provider: Provider, scope: SourceScope) -> Self {
        Self {
            name: format!("{}-{}", provider.slug(), scope.as_str()),
            provider,
            scope,
            root: root.into(),
        }
    }

    /// Returns the provider this source reads.
    #[inline]
    #[must_use]
    pub const fn provider(&self) -> Provider {
        self.provider
    }

    /// Returns the file this source reads for `channel`.
    #[must_use]
    pub fn path_for(&self, channel: &ChannelRef) -> Utf8PathBuf {
        let file = match self.scope {
            SourceScope::Channel => format!("{}.json", channel.id),
            SourceScope::Global => "global.json".to_owned(),
        };
        self.root.join(self.provider.slug()).join(file)
    }

    /// Returns the fixture directory.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[async_trait]
impl EmoteSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> SourceScope {
        self.scope
    }

    async fn fetch(&self, channel: &ChannelRef) -> Result<Vec<RawEmoteRecord>, SourceError> {
        let path = self.path_for(channel);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SourceError::read(path.clone(), e))?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| SourceError::decode(path.clone(), e))?;
        let decoded = decode_records(value).map_err(|source| SourceError::Payload {
            path: path.clone(),
            source,
        })?;

        for skipped in &decoded.skipped {
            warn!(source = %self.name, path = %path, error = %skipped, "Skipping malformed record");
        }
        debug!(
            source = %self.name,
            path = %path,
            records = decoded.records.len(),
            "Read fixture"
        );
        Ok(decoded.records)
    }
}

/// Builds the standard provider line-up over a fixture directory.
///
/// Declaration order is 7TV channel, 7TV global, FFZ channel, FFZ global,
/// BTTV channel, BTTV global. On id collisions the later source wins.
#[must_use]
pub fn standard_sources(root: &Utf8Path) -> Vec<Arc<dyn EmoteSource>> {
    [Provider::SevenTv, Provider::Ffz, Provider::Bttv]
        .into_iter()
        .flat_map(|provider| {
            [SourceScope::Channel, SourceScope::Global].map(|scope| {
                Arc::new(FixtureSource::new(root.to_owned(), provider, scope))
                    as Arc<dyn EmoteSource>
            })
        })
        .collect()
}
