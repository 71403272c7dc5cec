use tokio::sync::oneshot;

use crate::payment::{
    MockTransaction, PaymentError, TransactionInit, TransactionRequest, TransactionStatus, Verification,
};

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed messages for the payment gateway actor. Each variant carries its
/// parameters and a oneshot channel for the response.
#[derive(Debug)]
pub enum PaymentRequest {
    InitializeTransaction {
        request: TransactionRequest,
        respond_to: ServiceResponse<TransactionInit, PaymentError>,
    },
    VerifyTransaction {
        reference: String,
        respond_to: ServiceResponse<Verification, PaymentError>,
    },
    CompleteTransaction {
        reference: String,
        status: TransactionStatus,
        respond_to: ServiceResponse<MockTransaction, PaymentError>,
    },
    GetTransaction {
        reference: String,
        respond_to: ServiceResponse<Option<MockTransaction>, PaymentError>,
    },
    Shutdown,
    #[cfg(test)]
    GetTransactionCount {
        respond_to: ServiceResponse<usize, PaymentError>,
    },
}
