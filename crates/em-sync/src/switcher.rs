//! Channel-change sequencing.
//!
//! [`ScopeSwitcher`] moves the registry from one channel to the next:
//!
//! 1. Disable the previous channel's set and any stale set for the target.
//! 2. Drop the previous channel's chat event subscription.
//! 3. Aggregate the target channel.
//! 4. On success, make it current and subscribe; on failure, leave no
//!    channel current and emit a degraded notice.
//!
//! A request arriving mid-switch cancels the one in flight. Only the latest
//! request ever becomes current, and the aggregator's generation check
//! keeps a cancelled switch from installing anything.

use std::sync::Arc;

use em_core::SwitcherConfig;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::aggregator::Aggregator;
use crate::error::AggregationError;
use crate::events::ScopeEvent;
use crate::report::AggregationReport;
use crate::source::ChannelRef;

/// The chat event stream, subscribed per current channel.
pub trait ChannelSubscriptions: Send + Sync {
    /// Starts receiving events for `channel_id`.
    fn add_channel(&self, channel_id: &str);

    /// Stops receiving events for `channel_id`.
    fn remove_channel(&self, channel_id: &str);
}

/// Subscriptions that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubscriptions;

impl ChannelSubscriptions for NoSubscriptions {
    fn add_channel(&self, _channel_id: &str) {}

    fn remove_channel(&self, _channel_id: &str) {}
}

/// A request to make a channel current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchRequest {
    /// The channel to switch to.
    pub channel: ChannelRef,

    /// Another scope name the channel may have been installed under. Its
    /// set is disabled along with the previous channel's.
    pub alias: Option<String>,
}

impl SwitchRequest {
    /// Creates a request for `channel`.
    #[must_use]
    pub const fn new(channel: ChannelRef) -> Self {
        Self {
            channel,
            alias: None,
        }
    }

    /// Sets the alias scope.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// How a switch ended.
#[derive(Debug)]
pub enum SwitchOutcome {
    /// The channel is loaded and current.
    Switched(AggregationReport),

    /// Loading failed; no channel is current.
    Failed(AggregationError),

    /// A newer request took over before this one finished.
    Superseded {
        /// Generation of the abandoned switch.
        generation: u64,
    },
}

impl SwitchOutcome {
    /// Returns `true` if the switch completed.
    #[inline]
    #[must_use]
    pub const fn is_switched(&self) -> bool {
        matches!(self, Self::Switched(_))
    }

    /// Returns `true` if the switch failed.
    #[inline]
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns `true` if a newer request took over.
    #[inline]
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }

    /// Returns the aggregation report, if the switch completed.
    #[must_use]
    pub const fn report(&self) -> Option<&AggregationReport> {
        match self {
            Self::Switched(report) => Some(report),
            Self::Failed(_) | Self::Superseded { .. } => None,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    scope: String,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct SwitchState {
    current: Option<String>,
    in_flight: Option<InFlight>,
}

/// Sequences channel switches over an [`Aggregator`].
pub struct ScopeSwitcher {
    aggregator: Arc<Aggregator>,
    subscriptions: Arc<dyn ChannelSubscriptions>,
    state: Mutex<SwitchState>,
    events: broadcast::Sender<ScopeEvent>,
}

impl ScopeSwitcher {
    /// Creates a switcher.
    #[must_use]
    pub fn new(
        aggregator: Arc<Aggregator>,
        subscriptions: Arc<dyn ChannelSubscriptions>,
        config: SwitcherConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            aggregator,
            subscriptions,
            state: Mutex::new(SwitchState::default()),
            events,
        }
    }

    /// Returns the aggregator.
    #[inline]
    #[must_use]
    pub const fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Subscribes to scope events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ScopeEvent> {
        self.events.subscribe()
    }

    /// Returns the current scope, if a switch has completed and none is in
    /// progress.
    #[must_use]
    pub fn current_scope(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    /// Returns the scope being switched to, if any.
    #[must_use]
    pub fn switching_to(&self) -> Option<String> {
        self.state.lock().in_flight.as_ref().map(|f| f.scope.clone())
    }

    /// Returns `true` while a switch is in progress.
    #[must_use]
    pub fn is_switching(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Switches to the requested channel.
    ///
    /// Cancels any switch already in progress. Returns once this switch has
    /// completed, failed, or been superseded itself.
    pub async fn switch(&self, request: SwitchRequest) -> SwitchOutcome {
        let SwitchRequest { channel, alias } = request;
        let scope = channel.id.clone();
        let cancel = CancellationToken::new();

        let (generation, previous, abandoned) = {
            let mut state = self.state.lock();
            // Issued under the lock so generation order matches in-flight order.
            let generation = self.aggregator.begin();
            let abandoned = state.in_flight.replace(InFlight {
                generation,
                scope: scope.clone(),
                cancel: cancel.clone(),
            });
            if let Some(old) = &abandoned {
                debug!(scope = %old.scope, generation = old.generation, "Cancelling in-flight switch");
                old.cancel.cancel();
            }

            let previous = state.current.take();
            if let Some(prev) = &previous {
                self.subscriptions.remove_channel(prev);
            }
            self.emit(ScopeEvent::Switching {
                scope: scope.clone(),
                previous: previous.clone(),
                generation,
            });
            (generation, previous, abandoned.map(|f| f.scope))
        };

        self.aggregator.store().transaction(|txn| {
            for stale in [previous.as_deref(), abandoned.as_deref(), Some(scope.as_str()), alias.as_deref()]
                .into_iter()
                .flatten()
            {
                txn.disable_set(stale);
            }
        });
        info!(scope = %scope, channel = %channel.name, previous = ?previous, generation, "Switching channel");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AggregationError::superseded(scope.clone(), generation)),
            result = self.aggregator.aggregate(&channel, generation) => result,
        };

        match result {
            Ok(report) => self.finish_success(&scope, generation, report),
            Err(err) if err.is_superseded() => {
                trace!(scope = %scope, generation, "Switch superseded");
                SwitchOutcome::Superseded { generation }
            }
            Err(err) => self.finish_failure(&scope, generation, err),
        }
    }

    fn finish_success(&self, scope: &str, generation: u64, report: AggregationReport) -> SwitchOutcome {
        let mut state = self.state.lock();
        if !state.in_flight.as_ref().is_some_and(|f| f.generation == generation) {
            return SwitchOutcome::Superseded { generation };
        }
        state.in_flight = None;
        state.current = Some(scope.to_owned());
        self.subscriptions.add_channel(scope);
        self.emit(ScopeEvent::Ready {
            scope: scope.to_owned(),
            generation,
            emotes: report.installed,
        });
        info!(scope, generation, emotes = report.installed, "Channel ready");
        SwitchOutcome::Switched(report)
    }

    fn finish_failure(&self, scope: &str, generation: u64, err: AggregationError) -> SwitchOutcome {
        let mut state = self.state.lock();
        if !state.in_flight.as_ref().is_some_and(|f| f.generation == generation) {
            return SwitchOutcome::Superseded { generation };
        }
        state.in_flight = None;
        self.emit(ScopeEvent::Degraded {
            scope: scope.to_owned(),
            generation,
            reason: err.to_string(),
        });
        warn!(scope, generation, error = %err, "Channel emotes unavailable, running degraded");
        SwitchOutcome::Failed(err)
    }

    fn emit(&self, event: ScopeEvent) {
        if self.events.send(event).is_err() {
            trace!("No scope event listeners");
        }
    }
}

impl std::fmt::Debug for ScopeSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeSwitcher")
            .field("aggregator", &self.aggregator)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
