//! Raw emote records as produced by providers.
//!
//! [`RawEmoteRecord`] is the one strict shape every provider source must
//! produce. Providers hand over untyped JSON; [`decode_records`] turns it
//! into records one at a time so a single bad entry does not sink the
//! whole payload.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::RecordError;
use crate::types::{Provider, Visibility};

/// Ordered `(size key, url)` pairs as stored on a record.
///
/// Providers ship at most four sizes, so these stay inline.
pub type UrlList = SmallVec<[(String, String); 4]>;

/// An image size requested from a CDN.
///
/// # Examples
///
/// ```
/// use em_core::SizeKey;
///
/// assert_eq!(SizeKey::Three.as_str(), "3");
/// assert_eq!("2".parse::<SizeKey>(), Ok(SizeKey::Two));
/// assert!("5".parse::<SizeKey>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeKey {
    /// Size "1" (1x).
    One,
    /// Size "2" (2x).
    Two,
    /// Size "3" (3x).
    Three,
    /// Size "4" (4x).
    Four,
}

impl SizeKey {
    /// All sizes, smallest first.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// Returns the wire key for this size.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
        }
    }
}

impl std::str::FromStr for SizeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "3" => Ok(Self::Three),
            "4" => Ok(Self::Four),
            other => Err(format!("unknown size key '{other}', expected 1-4")),
        }
    }
}

impl std::fmt::Display for SizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial reference to the user who owns an emote.
///
/// Providers fill in whatever they know; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialUser {
    /// Provider-side user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Platform user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitch_id: Option<String>,

    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// An emote as delivered by a provider.
///
/// `id` and `name` are required; every other field falls back to its
/// default when absent. An [`Emote`](crate::Emote) keeps the record it was
/// built from verbatim, so serializing it again yields the same record.
///
/// # Examples
///
/// ```
/// use em_core::{Provider, RawEmoteRecord, Visibility};
///
/// let record = RawEmoteRecord::new("60ae958e", "peepoHappy", Provider::SevenTv)
///     .with_visibility(Visibility::GLOBAL)
///     .with_url("1", "https://cdn.example/60ae958e/1x.webp");
///
/// assert_eq!(record.urls.len(), 1);
/// assert!(record.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEmoteRecord {
    /// Provider-assigned identifier.
    pub id: String,

    /// Display and search key. Not unique.
    pub name: String,

    /// MIME type of the image, if the provider reports one.
    #[serde(default)]
    pub mime: String,

    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Visibility bits.
    #[serde(default)]
    pub visibility: Visibility,

    /// The owning user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<PartialUser>,

    /// Originating provider.
    #[serde(default)]
    pub provider: Provider,

    /// Image URLs by size key, in provider order.
    #[serde(default)]
    pub urls: UrlList,
}

impl RawEmoteRecord {
    /// Creates a record with the required fields and empty defaults.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, provider: Provider) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime: String::new(),
            tags: Vec::new(),
            visibility: Visibility::empty(),
            owner: None,
            provider,
            urls: UrlList::new(),
        }
    }

    /// Sets the visibility bits.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Appends a `(size, url)` pair.
    #[must_use]
    pub fn with_url(mut self, size: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.push((size.into(), url.into()));
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: PartialUser) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Checks the invariants an emote set relies on.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::EmptyId`] (with index 0) when the id is empty.
    pub fn validate(&self) -> Result<(), RecordError> {
        self.validate_at(0)
    }

    /// Like [`validate`](Self::validate), tagging the error with the
    /// record's position in a batch.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::EmptyId`] when the id is empty.
    pub fn validate_at(&self, index: usize) -> Result<(), RecordError> {
        if self.id.is_empty() {
            return Err(RecordError::EmptyId {
                index,
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Result of decoding a provider payload.
#[derive(Debug, Default)]
pub struct DecodedRecords {
    /// Records that decoded and validated, in payload order.
    pub records: Vec<RawEmoteRecord>,

    /// One entry per rejected record.
    pub skipped: Vec<RecordError>,
}

/// Decodes a JSON array of records, skipping entries that are malformed
/// or fail validation.
///
/// # Errors
///
/// Returns [`RecordError::NotAList`] if `value` is not an array. Individual
/// bad records never fail the call; they are reported in
/// [`DecodedRecords::skipped`].
///
/// # Examples
///
/// ```
/// use em_core::decode_records;
/// use serde_json::json;
///
/// let payload = json!([
///     {"id": "1", "name": "Kappa", "provider": "TWITCH"},
///     {"name": "no id here"},
///     {"id": "2", "name": "PogChamp", "provider": "TWITCH"},
/// ]);
///
/// let decoded = decode_records(payload).unwrap();
/// assert_eq!(decoded.records.len(), 2);
/// assert_eq!(decoded.skipped.len(), 1);
/// ```
pub fn decode_records(value: serde_json::Value) -> Result<DecodedRecords, RecordError> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(RecordError::NotAList {
                found: json_type_name(&other),
            });
        }
    };

    let mut decoded = DecodedRecords {
        records: Vec::with_capacity(items.len()),
        skipped: Vec::new(),
    };

    for (index, item) in items.into_iter().enumerate() {
        let record = match serde_json::from_value::<RawEmoteRecord>(item) {
            Ok(record) => record,
            Err(source) => {
                decoded.skipped.push(RecordError::Malformed { index, source });
                continue;
            }
        };
        match record.validate_at(index) {
            Ok(()) => decoded.records.push(record),
            Err(err) => decoded.skipped.push(err),
        }
    }

    Ok(decoded)
}

const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
