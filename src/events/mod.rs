//! Domain events published on each state transition.
//!
//! Consumers (notification panels, audit sinks) register a watcher and
//! receive [`SubscriptionEvent`]s over a bounded channel. Delivery beyond
//! the channel is an external concern.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{
    DropReason, EventFilter, SubscriptionEvent, WatcherConfig, WatcherHandle, WatcherId,
};
