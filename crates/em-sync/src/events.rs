//! Scope change notifications.
//!
//! The [`ScopeSwitcher`](crate::ScopeSwitcher) broadcasts a [`ScopeEvent`]
//! at every step of a switch. UI code hides scope-dependent elements on
//! [`Switching`](ScopeEvent::Switching), shows them again on
//! [`Ready`](ScopeEvent::Ready), and tells the user on
//! [`Degraded`](ScopeEvent::Degraded).

use serde::Serialize;

/// A step in a scope switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScopeEvent {
    /// A switch to `scope` has started. `previous` is no longer current.
    Switching {
        /// Target scope.
        scope: String,
        /// The scope that was current before, if any.
        previous: Option<String>,
        /// Generation of this switch.
        generation: u64,
    },

    /// `scope` is loaded and current.
    Ready {
        /// The new current scope.
        scope: String,
        /// Generation of the switch that completed.
        generation: u64,
        /// Emotes installed for the scope.
        emotes: usize,
    },

    /// Loading `scope` failed. No scope is current.
    Degraded {
        /// The scope that failed to load.
        scope: String,
        /// Generation of the failed switch.
        generation: u64,
        /// User-facing reason.
        reason: String,
    },
}

impl ScopeEvent {
    /// Returns the scope this event is about.
    #[must_use]
    pub fn scope(&self) -> &str {
        match self {
            Self::Switching { scope, .. } | Self::Ready { scope, .. } | Self::Degraded { scope, .. } => {
                scope
            }
        }
    }

    /// Returns the generation of the switch this event belongs to.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::Switching { generation, .. }
            | Self::Ready { generation, .. }
            | Self::Degraded { generation, .. } => *generation,
        }
    }

    /// Returns `true` if this is a [`Switching`](Self::Switching) event.
    #[inline]
    #[must_use]
    pub const fn is_switching(&self) -> bool {
        matches!(self, Self::Switching { .. })
    }

    /// Returns `true` if this is a [`Ready`](Self::Ready) event.
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns `true` if this is a [`Degraded`](Self::Degraded) event.
    #[inline]
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}
