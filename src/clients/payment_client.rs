use std::time::Duration;

use tokio::sync::mpsc;

use crate::messages::PaymentRequest;
use crate::payment::{
    MockTransaction, PaymentError, TransactionInit, TransactionRequest, TransactionStatus, Verification,
};

/// Client for the simulated payment gateway.
#[derive(Clone)]
pub struct PaymentClient {
    sender: mpsc::Sender<PaymentRequest>,
    latency: Duration,
}

impl PaymentClient {
    pub fn new(sender: mpsc::Sender<PaymentRequest>, latency: Duration) -> Self {
        Self { sender, latency }
    }

    pub async fn shutdown(&self) -> Result<(), PaymentError> {
        self.sender
            .send(PaymentRequest::Shutdown)
            .await
            .map_err(|_| PaymentError::ActorCommunicationError("Actor closed".to_string()))
    }
}

client_method!(PaymentClient => fn initialize_transaction(request: TransactionRequest) -> TransactionInit as PaymentRequest::InitializeTransaction, Error = PaymentError);
client_method!(PaymentClient => fn verify_transaction(reference: String) -> Verification as PaymentRequest::VerifyTransaction, Error = PaymentError);
client_method!(PaymentClient => fn complete_transaction(reference: String, status: TransactionStatus) -> MockTransaction as PaymentRequest::CompleteTransaction, Error = PaymentError);
client_method!(PaymentClient => fn get_transaction(reference: String) -> Option<MockTransaction> as PaymentRequest::GetTransaction, Error = PaymentError);

#[cfg(test)]
client_method!(PaymentClient => fn get_transaction_count() -> usize as PaymentRequest::GetTransactionCount, Error = PaymentError);
