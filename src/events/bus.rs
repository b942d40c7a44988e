//! Event bus broadcasting transition events to watchers.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{
    DropReason, EventFilter, SubscriptionEvent, WatcherConfig, WatcherHandle, WatcherId,
};

/// Internal watcher state.
struct Watcher {
    config: WatcherConfig,
    sender: Sender<SubscriptionEvent>,
}

impl Watcher {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (the watcher will be dropped).
    fn try_send(&self, event: SubscriptionEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn matches(&self, event: &SubscriptionEvent) -> bool {
        let filter = &self.config.filter;

        let wanted = match event {
            SubscriptionEvent::Requested { .. } => filter.include_requests,
            SubscriptionEvent::Approved { .. } | SubscriptionEvent::Rejected { .. } => {
                filter.include_decisions
            }
            SubscriptionEvent::Revoked { .. } => filter.include_revocations,
            SubscriptionEvent::Dropped { .. } => return false,
        };
        if !wanted {
            return false;
        }

        if let Some(ref subscribers) = filter.subscribers {
            match event.subscriber() {
                Some(s) if subscribers.iter().any(|w| w == s) => {}
                _ => return false,
            }
        }

        if let Some(ref groups) = filter.groups {
            match event.group() {
                Some(g) if groups.iter().any(|w| w == g) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Fans transition events out to registered watchers.
///
/// Slow watchers are dropped rather than allowed to block the hub.
pub struct EventBus {
    /// Active watchers by ID.
    watchers: RwLock<HashMap<WatcherId, Watcher>>,
    /// Counter for generating watcher IDs.
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            watchers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new watcher and return a handle for receiving events.
    pub fn watch(&self, config: WatcherConfig) -> WatcherHandle {
        let id = WatcherId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        self.watchers.write().insert(id, Watcher { config, sender });

        WatcherHandle { id, receiver }
    }

    /// Register a watcher with a filter and default buffering.
    pub fn watch_filtered(&self, filter: EventFilter) -> WatcherHandle {
        self.watch(WatcherConfig {
            filter,
            ..Default::default()
        })
    }

    /// Unregister a watcher.
    pub fn unwatch(&self, id: WatcherId) {
        let mut watchers = self.watchers.write();
        if let Some(watcher) = watchers.remove(&id) {
            // Terminal event, best effort
            let _ = watcher.sender.try_send(SubscriptionEvent::Dropped {
                reason: DropReason::Unwatched,
            });
        }
    }

    /// Get watcher count.
    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }

    /// Broadcast an event to matching watchers, dropping any that fail
    /// to receive.
    pub fn publish(&self, event: SubscriptionEvent) {
        let mut to_remove = Vec::new();

        {
            let watchers = self.watchers.read();
            for (id, watcher) in watchers.iter() {
                if watcher.matches(&event) && !watcher.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut watchers = self.watchers.write();
            for id in to_remove {
                if let Some(watcher) = watchers.remove(&id) {
                    // Might fail, that's ok
                    let _ = watcher.sender.try_send(SubscriptionEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
