//! # Subscription Hub
//!
//! Subscription lifecycle core for report-access groups: a subscriber asks
//! for access to a named group, an admin approves, rejects, or revokes it,
//! and the subscriber's dashboard reflects the derived status per group.
//!
//! ## Core Concepts
//!
//! - **Groups**: Named report-access scopes, administered out of band
//! - **Requests**: Unresolved asks, keyed by (subscriber, group)
//! - **Subscriptions**: Approved access, keyed by surrogate id
//! - **Status**: Derived per pair, never stored: Subscribed beats Pending
//!   beats Unsubscribed
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use subhub::{Group, GroupCatalog, RequestKey, SubscriptionHub};
//!
//! let catalog = Arc::new(GroupCatalog::new(vec![
//!     Group::new("Finance_Reports", "Monthly finance reports"),
//! ]));
//! let hub = SubscriptionHub::in_memory(catalog);
//!
//! hub.request_subscription("alice", "Finance_Reports")?;
//! let id = hub.approve(&RequestKey::new("alice", "Finance_Reports"))?;
//!
//! // Dashboard projection
//! let rows = hub.status_for_subscriber("alice");
//!
//! hub.revoke(id)?;
//! ```

pub mod catalog;
pub mod error;
pub mod events;
pub mod hub;
pub mod tables;
pub mod types;

// Re-exports
pub use catalog::GroupCatalog;
pub use error::{Result, SubscriptionError};
pub use events::{
    DropReason, EventBus, EventFilter, SubscriptionEvent, WatcherConfig, WatcherHandle, WatcherId,
};
pub use hub::{HubConfig, SubscriptionHub};
pub use tables::{RequestTable, SubscriptionTable, Tables};
pub use types::*;
