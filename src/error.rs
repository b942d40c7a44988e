//! Error types for the subscription core.

use crate::types::{RequestKey, SubscriptionId};
use thiserror::Error;

/// Main error type for subscription operations.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request not found: {0}")]
    RequestNotFound(RequestKey),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    #[error("No subscription for pair: {0}")]
    NoSubscriptionForPair(RequestKey),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Request already pending: {0}")]
    AlreadyPending(RequestKey),

    #[error("Already subscribed: {0}")]
    AlreadySubscribed(RequestKey),

    #[error("Subscription already exists: {0}")]
    Conflict(RequestKey),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Hub data directory is locked by another process")]
    Locked,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),
}

impl SubscriptionError {
    /// HTTP-style status code for the boundary surface.
    ///
    /// Presentation collaborators map core errors onto their responses with
    /// this; the core itself never speaks HTTP.
    pub fn code(&self) -> u16 {
        match self {
            SubscriptionError::RequestNotFound(_)
            | SubscriptionError::SubscriptionNotFound(_)
            | SubscriptionError::NoSubscriptionForPair(_)
            | SubscriptionError::UnknownGroup(_) => 404,

            SubscriptionError::AlreadyPending(_)
            | SubscriptionError::AlreadySubscribed(_)
            | SubscriptionError::Conflict(_) => 409,

            SubscriptionError::Io(_)
            | SubscriptionError::StoreUnavailable(_)
            | SubscriptionError::Locked => 503,

            SubscriptionError::Serialization(_)
            | SubscriptionError::Deserialization(_)
            | SubscriptionError::InvalidFormat(_) => 500,
        }
    }

    /// Whether a caller may reasonably retry the same call.
    ///
    /// Everything except transient store failure means the caller holds a
    /// stale view and should re-fetch status instead of retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::StoreUnavailable(_) | SubscriptionError::Io(_)
        )
    }
}

impl From<serde_json::Error> for SubscriptionError {
    fn from(e: serde_json::Error) -> Self {
        SubscriptionError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for SubscriptionError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        SubscriptionError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SubscriptionError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        SubscriptionError::Deserialization(e.to_string())
    }
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, SubscriptionError>;
