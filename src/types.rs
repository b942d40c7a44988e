//! Core types for the subscription lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for an active subscription.
///
/// A surrogate id is required because admin revoke targets a row picked from
/// a list, not a (subscriber, group) composite.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Composite identity for a subscriber/group pair.
///
/// Requests are keyed by this, and the per-pair lock space is keyed by this.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub subscriber: String,
    pub group: String,
}

impl RequestKey {
    pub fn new(subscriber: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            group: group.into(),
        }
    }
}

impl fmt::Debug for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestKey({}/{})", self.subscriber, self.group)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subscriber, self.group)
    }
}

/// A subscribable report-access group.
///
/// Administered out of band; read-only to the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub description: String,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A subscriber's unresolved ask for access to a group.
///
/// At most one exists per key; exactly one of approve/reject consumes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub key: RequestKey,
    pub requested_at: Timestamp,
}

/// Active, approved access to a group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub subscriber: String,
    pub group: String,
    pub subscribed_at: Timestamp,
}

impl Subscription {
    /// The pair this subscription covers.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.subscriber.clone(), self.group.clone())
    }
}

/// Derived status of a subscriber/group pair. Never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatus {
    Unsubscribed,
    Pending,
    Subscribed,
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupStatus::Unsubscribed => write!(f, "Unsubscribed"),
            GroupStatus::Pending => write!(f, "Pending"),
            GroupStatus::Subscribed => write!(f, "Subscribed"),
        }
    }
}

// --- Wire views for the boundary surface ---

/// One row of a subscriber's dashboard projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRow {
    pub group: String,
    pub description: String,
    pub status: GroupStatus,
}

/// Admin view of one pending request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub subscriber: String,
    pub group: String,
    pub requested_at: Timestamp,
}

impl From<&SubscriptionRequest> for PendingRequestView {
    fn from(request: &SubscriptionRequest) -> Self {
        Self {
            subscriber: request.key.subscriber.clone(),
            group: request.key.group.clone(),
            requested_at: request.requested_at,
        }
    }
}

/// Admin view of one active subscription (the revoke table).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSubscriptionView {
    pub subscription_id: SubscriptionId,
    pub subscriber: String,
    pub group: String,
    pub subscribed_at: Timestamp,
}

impl From<&Subscription> for ActiveSubscriptionView {
    fn from(subscription: &Subscription) -> Self {
        Self {
            subscription_id: subscription.id,
            subscriber: subscription.subscriber.clone(),
            group: subscription.group.clone(),
            subscribed_at: subscription.subscribed_at,
        }
    }
}

/// Hub-wide counters for the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HubStats {
    pub groups: usize,
    pub pending_requests: usize,
    pub active_subscriptions: usize,
}
