//! Table of pending subscription requests.

use crate::error::{Result, SubscriptionError};
use crate::types::{RequestKey, SubscriptionRequest, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pending requests keyed by (subscriber, group).
///
/// Plain data structure; locking and persistence are owned by the hub,
/// which is the only permitted writer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestTable {
    entries: HashMap<RequestKey, SubscriptionRequest>,
}

impl RequestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests belonging to one subscriber.
    pub fn find(&self, subscriber: &str) -> Vec<SubscriptionRequest> {
        self.entries
            .values()
            .filter(|r| r.key.subscriber == subscriber)
            .cloned()
            .collect()
    }

    /// Look up the request for one pair.
    pub fn find_by_key(&self, key: &RequestKey) -> Option<&SubscriptionRequest> {
        self.entries.get(key)
    }

    /// Insert a new request. At most one request may exist per pair.
    pub fn insert(&mut self, key: RequestKey, requested_at: Timestamp) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(SubscriptionError::Conflict(key));
        }
        let request = SubscriptionRequest {
            key: key.clone(),
            requested_at,
        };
        self.entries.insert(key, request);
        Ok(())
    }

    /// Remove and return the request for a pair.
    pub fn delete_by_key(&mut self, key: &RequestKey) -> Result<SubscriptionRequest> {
        self.entries
            .remove(key)
            .ok_or_else(|| SubscriptionError::RequestNotFound(key.clone()))
    }

    /// All requests, unfiltered.
    pub fn all(&self) -> impl Iterator<Item = &SubscriptionRequest> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find() {
        let mut table = RequestTable::new();
        let key = RequestKey::new("alice", "Finance_Reports");
        table.insert(key.clone(), Timestamp(1)).unwrap();

        assert!(table.find_by_key(&key).is_some());
        assert_eq!(table.find("alice").len(), 1);
        assert!(table.find("bob").is_empty());
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let mut table = RequestTable::new();
        let key = RequestKey::new("alice", "Finance_Reports");
        table.insert(key.clone(), Timestamp(1)).unwrap();

        let result = table.insert(key, Timestamp(2));
        assert!(matches!(result, Err(SubscriptionError::Conflict(_))));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_delete_by_key() {
        let mut table = RequestTable::new();
        let key = RequestKey::new("alice", "Finance_Reports");
        table.insert(key.clone(), Timestamp(1)).unwrap();

        let removed = table.delete_by_key(&key).unwrap();
        assert_eq!(removed.key, key);
        assert!(table.is_empty());

        let result = table.delete_by_key(&key);
        assert!(matches!(result, Err(SubscriptionError::RequestNotFound(_))));
    }

    #[test]
    fn test_find_scopes_to_subscriber() {
        let mut table = RequestTable::new();
        table
            .insert(RequestKey::new("alice", "Finance_Reports"), Timestamp(1))
            .unwrap();
        table
            .insert(RequestKey::new("alice", "Ops_Reports"), Timestamp(2))
            .unwrap();
        table
            .insert(RequestKey::new("bob", "Ops_Reports"), Timestamp(3))
            .unwrap();

        assert_eq!(table.find("alice").len(), 2);
        assert_eq!(table.find("bob").len(), 1);
    }
}
