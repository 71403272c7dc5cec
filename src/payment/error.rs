use thiserror::Error;

/// Errors from the simulated payment gateway.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    /// The customer closed the payment page. Distinct from a declined payment.
    #[error("Payment cancelled: {reference}")]
    Cancelled { reference: String },
    #[error("Payment prompt failed: {0}")]
    Prompt(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
