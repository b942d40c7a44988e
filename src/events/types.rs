//! Event types published on subscription state transitions.

use crate::types::{SubscriptionId, Timestamp};
use serde::{Deserialize, Serialize};

/// Events emitted by the hub after each successful transition.
///
/// Notification delivery is a downstream consumer of these; the hub only
/// publishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriptionEvent {
    /// A subscriber asked for access to a group.
    Requested {
        subscriber: String,
        group: String,
        requested_at: Timestamp,
    },

    /// An admin approved a pending request.
    Approved {
        subscription_id: SubscriptionId,
        subscriber: String,
        group: String,
        subscribed_at: Timestamp,
    },

    /// An admin rejected a pending request.
    Rejected {
        subscriber: String,
        group: String,
    },

    /// An admin revoked an active subscription.
    Revoked {
        subscription_id: SubscriptionId,
        subscriber: String,
        group: String,
    },

    /// The watcher was dropped; no further events will arrive.
    Dropped {
        reason: DropReason,
    },
}

impl SubscriptionEvent {
    /// The subscriber this event concerns, if any.
    pub fn subscriber(&self) -> Option<&str> {
        match self {
            SubscriptionEvent::Requested { subscriber, .. }
            | SubscriptionEvent::Approved { subscriber, .. }
            | SubscriptionEvent::Rejected { subscriber, .. }
            | SubscriptionEvent::Revoked { subscriber, .. } => Some(subscriber),
            SubscriptionEvent::Dropped { .. } => None,
        }
    }

    /// The group this event concerns, if any.
    pub fn group(&self) -> Option<&str> {
        match self {
            SubscriptionEvent::Requested { group, .. }
            | SubscriptionEvent::Approved { group, .. }
            | SubscriptionEvent::Rejected { group, .. }
            | SubscriptionEvent::Revoked { group, .. } => Some(group),
            SubscriptionEvent::Dropped { .. } => None,
        }
    }
}

/// Why a watcher was dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unwatched.
    Unwatched,
}

/// Filter criteria for a watcher.
#[derive(Clone, Debug)]
pub struct EventFilter {
    /// Only events for these subscribers (None = all).
    pub subscribers: Option<Vec<String>>,

    /// Only events for these groups (None = all).
    pub groups: Option<Vec<String>>,

    /// Include `Requested` events.
    pub include_requests: bool,

    /// Include `Approved` and `Rejected` events.
    pub include_decisions: bool,

    /// Include `Revoked` events.
    pub include_revocations: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl EventFilter {
    /// Every event.
    pub fn all() -> Self {
        Self {
            subscribers: None,
            groups: None,
            include_requests: true,
            include_decisions: true,
            include_revocations: true,
        }
    }

    /// Every event touching one subscriber (their notification feed).
    pub fn for_subscriber(subscriber: impl Into<String>) -> Self {
        Self {
            subscribers: Some(vec![subscriber.into()]),
            ..Self::all()
        }
    }

    /// Only admin decisions (approve/reject/revoke), e.g. for an audit sink.
    pub fn decisions() -> Self {
        Self {
            include_requests: false,
            ..Self::all()
        }
    }
}

/// Configuration for a watcher.
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// Max buffered events before the watcher is dropped.
    /// Default: 256
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: EventFilter,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            filter: EventFilter::default(),
        }
    }
}

/// Unique identifier for a watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatcherId(pub u64);

/// Handle for receiving events from the bus.
pub struct WatcherHandle {
    pub id: WatcherId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<SubscriptionEvent>,
}

impl WatcherHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<SubscriptionEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<SubscriptionEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<SubscriptionEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
