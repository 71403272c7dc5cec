use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during order, address and cart-snapshot operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Address not found: {0}")]
    AddressNotFound(String),
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Unexpected storage reply: {0}")]
    UnexpectedReply(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    /// Maps a framework error for the order store, where a missing id is a missing order.
    pub fn from_order_store(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => Self::NotFound(id),
            other => Self::from_store(other),
        }
    }

    /// Maps a framework error for the address store.
    pub fn from_address_store(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => Self::AddressNotFound(id),
            other => Self::from_store(other),
        }
    }

    pub fn from_store(err: FrameworkError) -> Self {
        match err {
            FrameworkError::Rejected(reason) => Self::Rejected(reason),
            other => Self::ActorCommunicationError(other.to_string()),
        }
    }
}
