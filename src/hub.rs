//! The subscription hub: the only writer to the tables of record.

use crate::catalog::GroupCatalog;
use crate::error::{Result, SubscriptionError};
use crate::events::{EventBus, EventFilter, SubscriptionEvent, WatcherHandle};
use crate::tables::Tables;
use crate::types::{
    ActiveSubscriptionView, GroupStatus, HubStats, PendingRequestView, RequestKey, StatusRow,
    SubscriptionId, Timestamp,
};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hub configuration for durable mode.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Data directory holding the lock file and tables snapshot.
    pub path: PathBuf,

    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./subhub"),
            create_if_missing: true,
        }
    }
}

/// Durable backing for the tables.
struct Storage {
    /// Path of the tables snapshot.
    tables_path: PathBuf,

    /// Lock file for exclusive access to the data directory.
    _lock_file: File,
}

/// Orchestrates the per-pair state machine
/// `Unsubscribed -> Pending -> Subscribed` (plus reject and revoke back to
/// `Unsubscribed`).
///
/// All mutations pass through here; the tables have no other writer. Each
/// transition serializes against other transitions on the same
/// (subscriber, group) pair, while disjoint pairs proceed concurrently.
/// Reads see a point-in-time consistent snapshot of both tables.
pub struct SubscriptionHub {
    /// Externally administered group catalog.
    catalog: Arc<GroupCatalog>,

    /// Both tables of record under one lock, so approve's
    /// delete-then-insert commits as a unit and readers never see the
    /// intermediate state.
    tables: RwLock<Tables>,

    /// Per-pair transition locks. Entries are retained for the life of the
    /// hub; the keyspace is bounded by subscribers x catalog groups.
    pair_locks: Mutex<HashMap<RequestKey, Arc<Mutex<()>>>>,

    /// Transition event fan-out.
    events: EventBus,

    /// Durable backing, absent for in-memory hubs.
    storage: Option<Storage>,
}

impl SubscriptionHub {
    /// Create a hub with no durable backing.
    pub fn in_memory(catalog: Arc<GroupCatalog>) -> Self {
        Self {
            catalog,
            tables: RwLock::new(Tables::new()),
            pair_locks: Mutex::new(HashMap::new()),
            events: EventBus::new(),
            storage: None,
        }
    }

    /// Open a durable hub, loading the tables snapshot if one exists.
    ///
    /// The data directory is locked exclusively; a second opener fails
    /// with [`SubscriptionError::Locked`].
    pub fn open_or_create(catalog: Arc<GroupCatalog>, config: HubConfig) -> Result<Self> {
        if !config.path.exists() {
            if !config.create_if_missing {
                return Err(SubscriptionError::StoreUnavailable(format!(
                    "data directory does not exist: {}",
                    config.path.display()
                )));
            }
            fs::create_dir_all(&config.path)?;
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(config.path.join("lock"))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| SubscriptionError::Locked)?;

        let tables_path = config.path.join("tables.bin");
        let tables = if tables_path.exists() {
            Tables::load(&tables_path)?
        } else {
            Tables::new()
        };

        Ok(Self {
            catalog,
            tables: RwLock::new(tables),
            pair_locks: Mutex::new(HashMap::new()),
            events: EventBus::new(),
            storage: Some(Storage {
                tables_path,
                _lock_file: lock_file,
            }),
        })
    }

    /// The event bus for registering transition watchers.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Convenience: register a filtered watcher with default buffering.
    pub fn watch(&self, filter: EventFilter) -> WatcherHandle {
        self.events.watch_filtered(filter)
    }

    // --- Transitions ---

    /// `Unsubscribed -> Pending`: record a subscriber's ask for a group.
    pub fn request_subscription(&self, subscriber: &str, group: &str) -> Result<()> {
        if !self.catalog.contains(group) {
            return Err(SubscriptionError::UnknownGroup(group.to_string()));
        }

        let key = RequestKey::new(subscriber, group);
        let lock = self.pair_lock(&key);
        let _transition = lock.lock();

        {
            let tables = self.tables.read();
            if tables.subscriptions.find_by_key(&key).is_some() {
                return Err(SubscriptionError::AlreadySubscribed(key));
            }
            if tables.requests.find_by_key(&key).is_some() {
                return Err(SubscriptionError::AlreadyPending(key));
            }
        }

        let requested_at = Timestamp::now();
        {
            let mut tables = self.tables.write();
            tables.requests.insert(key.clone(), requested_at)?;
            self.persist(&tables)?;
        }

        debug!(%key, "subscription requested");
        self.events.publish(SubscriptionEvent::Requested {
            subscriber: key.subscriber,
            group: key.group,
            requested_at,
        });
        Ok(())
    }

    /// `Pending -> Subscribed`: consume the request and create a
    /// subscription, as one atomic unit.
    ///
    /// If the pair already holds a subscription the call fails with
    /// `Conflict` and the request stays consumed; a duplicate approval can
    /// never create a second row or resurrect the request.
    pub fn approve(&self, key: &RequestKey) -> Result<SubscriptionId> {
        let lock = self.pair_lock(key);
        let _transition = lock.lock();

        let subscribed_at = Timestamp::now();
        let id = {
            let mut tables = self.tables.write();
            tables.requests.delete_by_key(key)?;

            match tables.subscriptions.insert(key.clone(), subscribed_at) {
                Ok(id) => {
                    self.persist(&tables)?;
                    id
                }
                Err(e) => {
                    // Request is consumed regardless; keep the delete.
                    self.persist(&tables)?;
                    warn!(%key, "approve raced an existing subscription");
                    return Err(e);
                }
            }
        };

        debug!(%key, %id, "request approved");
        self.events.publish(SubscriptionEvent::Approved {
            subscription_id: id,
            subscriber: key.subscriber.clone(),
            group: key.group.clone(),
            subscribed_at,
        });
        Ok(id)
    }

    /// `Pending -> Unsubscribed`: consume the request without creating a
    /// subscription.
    pub fn reject(&self, key: &RequestKey) -> Result<()> {
        let lock = self.pair_lock(key);
        let _transition = lock.lock();

        {
            let mut tables = self.tables.write();
            tables.requests.delete_by_key(key)?;
            self.persist(&tables)?;
        }

        debug!(%key, "request rejected");
        self.events.publish(SubscriptionEvent::Rejected {
            subscriber: key.subscriber.clone(),
            group: key.group.clone(),
        });
        Ok(())
    }

    /// `Subscribed -> Unsubscribed`: remove an active subscription by id.
    ///
    /// Never touches request state; a later request for the pair succeeds.
    pub fn revoke(&self, id: SubscriptionId) -> Result<()> {
        let key = {
            let tables = self.tables.read();
            tables
                .subscriptions
                .find_by_id(id)
                .map(|s| s.key())
                .ok_or(SubscriptionError::SubscriptionNotFound(id))?
        };

        let lock = self.pair_lock(&key);
        let _transition = lock.lock();

        {
            let mut tables = self.tables.write();
            // Re-check under the pair lock; a racing revoke may have won.
            tables.subscriptions.delete_by_id(id)?;
            self.persist(&tables)?;
        }

        debug!(%key, %id, "subscription revoked");
        self.events.publish(SubscriptionEvent::Revoked {
            subscription_id: id,
            subscriber: key.subscriber,
            group: key.group,
        });
        Ok(())
    }

    // --- Read projections ---

    /// Status of every catalog group for one subscriber, in catalog order.
    ///
    /// Computed inside a single read guard over both tables, so a pair can
    /// never show two statuses from interleaved reads.
    pub fn status_for_subscriber(&self, subscriber: &str) -> Vec<StatusRow> {
        let tables = self.tables.read();

        self.catalog
            .list()
            .into_iter()
            .map(|group| {
                let key = RequestKey::new(subscriber, group.name.as_str());
                let status = if tables.subscriptions.find_by_key(&key).is_some() {
                    GroupStatus::Subscribed
                } else if tables.requests.find_by_key(&key).is_some() {
                    GroupStatus::Pending
                } else {
                    GroupStatus::Unsubscribed
                };
                StatusRow {
                    group: group.name,
                    description: group.description,
                    status,
                }
            })
            .collect()
    }

    /// Every pending request, sorted by (subscriber, group).
    pub fn list_pending_requests(&self) -> Vec<PendingRequestView> {
        let tables = self.tables.read();
        let mut views: Vec<PendingRequestView> =
            tables.requests.all().map(PendingRequestView::from).collect();
        views.sort_by(|a, b| (&a.subscriber, &a.group).cmp(&(&b.subscriber, &b.group)));
        views
    }

    /// Every active subscription, sorted by id.
    pub fn list_active_subscriptions(&self) -> Vec<ActiveSubscriptionView> {
        let tables = self.tables.read();
        let mut views: Vec<ActiveSubscriptionView> = tables
            .subscriptions
            .all()
            .map(ActiveSubscriptionView::from)
            .collect();
        views.sort_by_key(|v| v.subscription_id);
        views
    }

    /// Hub-wide counters.
    pub fn stats(&self) -> HubStats {
        let tables = self.tables.read();
        HubStats {
            groups: self.catalog.len(),
            pending_requests: tables.requests.len(),
            active_subscriptions: tables.subscriptions.len(),
        }
    }

    // --- Internals ---

    /// The transition lock for one pair.
    fn pair_lock(&self, key: &RequestKey) -> Arc<Mutex<()>> {
        let mut locks = self.pair_locks.lock();
        locks.entry(key.clone()).or_default().clone()
    }

    /// Snapshot the tables to disk. Called while holding the write guard
    /// so the file always reflects a consistent pair of tables.
    fn persist(&self, tables: &Tables) -> Result<()> {
        if let Some(ref storage) = self.storage {
            tables.save(&storage.tables_path)?;
        }
        Ok(())
    }
}
