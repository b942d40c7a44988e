//! Table of active subscriptions.

use crate::error::{Result, SubscriptionError};
use crate::types::{RequestKey, Subscription, SubscriptionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Active subscriptions, addressable by surrogate id and by pair.
///
/// Admin revoke identifies a row positionally from a list, so the primary
/// key is the surrogate id; `by_pair` enforces the one-subscription-per-pair
/// invariant and serves the projection lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionTable {
    entries: HashMap<SubscriptionId, Subscription>,
    by_pair: HashMap<RequestKey, SubscriptionId>,
    next_id: u64,
}

impl Default for SubscriptionTable {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            by_pair: HashMap::new(),
            next_id: 1,
        }
    }
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All subscriptions belonging to one subscriber.
    pub fn find(&self, subscriber: &str) -> Vec<Subscription> {
        self.entries
            .values()
            .filter(|s| s.subscriber == subscriber)
            .cloned()
            .collect()
    }

    /// Look up the subscription covering one pair.
    pub fn find_by_key(&self, key: &RequestKey) -> Option<&Subscription> {
        let id = self.by_pair.get(key)?;
        self.entries.get(id)
    }

    /// Look up a subscription by surrogate id.
    pub fn find_by_id(&self, id: SubscriptionId) -> Option<&Subscription> {
        self.entries.get(&id)
    }

    /// Insert a new subscription for a pair, assigning the next id.
    ///
    /// A second subscription for the same pair is rejected, never
    /// silently duplicated.
    pub fn insert(&mut self, key: RequestKey, subscribed_at: Timestamp) -> Result<SubscriptionId> {
        if self.by_pair.contains_key(&key) {
            return Err(SubscriptionError::Conflict(key));
        }

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let subscription = Subscription {
            id,
            subscriber: key.subscriber.clone(),
            group: key.group.clone(),
            subscribed_at,
        };
        self.entries.insert(id, subscription);
        self.by_pair.insert(key, id);
        Ok(id)
    }

    /// Remove and return the subscription for a pair.
    pub fn delete_by_key(&mut self, key: &RequestKey) -> Result<Subscription> {
        let id = self
            .by_pair
            .remove(key)
            .ok_or_else(|| SubscriptionError::NoSubscriptionForPair(key.clone()))?;
        Ok(self
            .entries
            .remove(&id)
            .expect("by_pair and entries are kept in step"))
    }

    /// Remove and return the subscription with a given id.
    pub fn delete_by_id(&mut self, id: SubscriptionId) -> Result<Subscription> {
        let subscription = self
            .entries
            .remove(&id)
            .ok_or(SubscriptionError::SubscriptionNotFound(id))?;
        self.by_pair.remove(&subscription.key());
        Ok(subscription)
    }

    /// All subscriptions, unfiltered.
    pub fn all(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
