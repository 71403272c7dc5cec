use thiserror::Error;

use crate::cart::{CartError, LocalStorageError};
use crate::checkout::CheckoutError;

/// Failures while starting, running or stopping the system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Actor task failed: {0}")]
    TaskFailed(String),
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
    #[error(transparent)]
    LocalStorage(#[from] LocalStorageError),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error("Order error: {0}")]
    Order(#[from] crate::order_actor::OrderError),
}
