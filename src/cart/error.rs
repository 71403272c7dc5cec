use thiserror::Error;

/// Errors surfaced to whoever edits the cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Not enough stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Cart item not found: {0}")]
    ItemNotFound(String),
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

/// Errors from a persistence tier. The context absorbs these and falls back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartStoreError {
    #[error("Cart backend unavailable: {0}")]
    Unavailable(String),
    #[error("Cart table does not exist")]
    SchemaMissing,
    #[error("Cart storage error: {0}")]
    Storage(String),
}
