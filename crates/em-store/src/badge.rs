//! Per-user badge lookup.
//!
//! Badges arrive as a list, each naming the users that wear it. Users are
//! referred to by numeric platform id or by login; [`BadgeIndex`] indexes
//! both forms so a lookup by either finds the same badges.

use em_core::{FxHashMap, UrlList};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A cosmetic badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Badge id.
    pub id: String,

    /// Badge name.
    pub name: String,

    /// Hover text.
    #[serde(default)]
    pub tooltip: String,

    /// Image URLs by size key.
    #[serde(default)]
    pub urls: UrlList,

    /// Users wearing this badge, as numeric ids or logins.
    #[serde(default)]
    pub users: Vec<String>,
}

/// How a user is referred to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserKey {
    /// Numeric platform id.
    Numeric(u64),

    /// Login name.
    Login(String),
}

impl From<&str> for UserKey {
    fn from(value: &str) -> Self {
        value
            .parse()
            .map_or_else(|_| Self::Login(value.to_owned()), Self::Numeric)
    }
}

/// Badges indexed by the users that wear them.
///
/// # Examples
///
/// ```
/// use em_store::{Badge, BadgeIndex};
///
/// let index = BadgeIndex::new(vec![Badge {
///     id: "b1".into(),
///     name: "Contributor".into(),
///     tooltip: String::new(),
///     urls: Default::default(),
///     users: vec!["12345".into(), "anatole".into()],
/// }]);
///
/// assert_eq!(index.badges_for("12345").len(), 1);
/// assert_eq!(index.badges_for("anatole").len(), 1);
/// assert!(index.badges_for("nobody").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BadgeIndex {
    badges: Vec<Badge>,
    by_user: FxHashMap<UserKey, SmallVec<[usize; 2]>>,
}

impl BadgeIndex {
    /// Builds the index.
    #[must_use]
    pub fn new(badges: Vec<Badge>) -> Self {
        let mut by_user: FxHashMap<UserKey, SmallVec<[usize; 2]>> = FxHashMap::default();
        for (position, badge) in badges.iter().enumerate() {
            for user in &badge.users {
                let slots = by_user.entry(UserKey::from(user.as_str())).or_default();
                if !slots.contains(&position) {
                    slots.push(position);
                }
            }
        }
        Self { badges, by_user }
    }

    /// Returns the badges worn by `user`, in list order.
    #[must_use]
    pub fn badges_for(&self, user: &str) -> Vec<&Badge> {
        self.by_user
            .get(&UserKey::from(user))
            .map(|slots| slots.iter().filter_map(|&i| self.badges.get(i)).collect())
            .unwrap_or_default()
    }

    /// Returns every badge.
    #[must_use]
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    /// Returns the number of badges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.badges.len()
    }

    /// Returns `true` if there are no badges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}
