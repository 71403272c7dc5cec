use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    generate_reference, to_minor_units, Authorization, Customer, MockTransaction, PaymentError,
    PaymentOutcome, PaymentSettings, TransactionInit, TransactionRequest, TransactionStatus,
    Verification, VerificationData, DEFAULT_REFERENCE_PREFIX,
};
use crate::clients::PaymentClient;
use crate::messages::{PaymentRequest, ServiceResponse};

const AUTHORIZATION_BASE_URL: &str = "https://checkout.mock-payments.local";
const FEE_RATE: Decimal = dec!(0.015);

/// Simulated payment gateway actor. Owns every transaction started in this process.
pub struct PaymentService {
    receiver: mpsc::Receiver<PaymentRequest>,
    transactions: HashMap<String, MockTransaction>,
    outcome: Box<dyn PaymentOutcome>,
    currency: String,
    next_id: u64,
}

impl PaymentService {
    pub fn new(buffer_size: usize, settings: &PaymentSettings) -> (Self, PaymentClient) {
        Self::with_outcome(buffer_size, settings, settings.outcome.build())
    }

    pub fn with_outcome(
        buffer_size: usize,
        settings: &PaymentSettings,
        outcome: Box<dyn PaymentOutcome>,
    ) -> (Self, PaymentClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            transactions: HashMap::new(),
            outcome,
            currency: settings.currency.clone(),
            next_id: 1,
        };
        (service, PaymentClient::new(sender, settings.latency))
    }

    #[instrument(name = "payment_service", skip(self))]
    pub async fn run(mut self) {
        info!("PaymentService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                PaymentRequest::InitializeTransaction { request, respond_to } => {
                    self.handle_initialize(request, respond_to);
                }
                PaymentRequest::VerifyTransaction { reference, respond_to } => {
                    self.handle_verify(reference, respond_to);
                }
                PaymentRequest::CompleteTransaction { reference, status, respond_to } => {
                    self.handle_complete(reference, status, respond_to);
                }
                PaymentRequest::GetTransaction { reference, respond_to } => {
                    let _ = respond_to.send(Ok(self.transactions.get(&reference).cloned()));
                }
                PaymentRequest::Shutdown => {
                    info!("PaymentService shutting down");
                    break;
                }
                #[cfg(test)]
                PaymentRequest::GetTransactionCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.transactions.len()));
                }
            }
        }

        info!("PaymentService stopped");
    }

    #[instrument(fields(email = %request.email, amount = %request.amount), skip(self, request, respond_to))]
    fn handle_initialize(
        &mut self,
        request: TransactionRequest,
        respond_to: ServiceResponse<TransactionInit, PaymentError>,
    ) {
        debug!("Processing initialize_transaction request");

        if request.amount <= Decimal::ZERO {
            warn!("Rejecting non-positive amount");
            let _ = respond_to.send(Err(PaymentError::InvalidAmount(request.amount.to_string())));
            return;
        }
        if let Err(err) = to_minor_units(request.amount) {
            warn!("Rejecting amount with no minor-unit representation");
            let _ = respond_to.send(Err(err));
            return;
        }

        let reference = request
            .reference
            .unwrap_or_else(|| generate_reference(DEFAULT_REFERENCE_PREFIX));
        let transaction = MockTransaction {
            reference: reference.clone(),
            amount: request.amount,
            currency: request.currency.unwrap_or_else(|| self.currency.clone()),
            email: request.email,
            status: TransactionStatus::Pending,
            metadata: request.metadata,
            created_at: Utc::now(),
            settled_at: None,
        };
        self.transactions.insert(reference.clone(), transaction);

        let access_code = Uuid::new_v4().simple().to_string();
        info!(reference = %reference, "Transaction initialized");
        let _ = respond_to.send(Ok(TransactionInit {
            authorization_url: format!("{}/{}", AUTHORIZATION_BASE_URL, access_code),
            access_code,
            reference,
        }));
    }

    #[instrument(fields(reference = %reference), skip(self, respond_to))]
    fn handle_verify(&mut self, reference: String, respond_to: ServiceResponse<Verification, PaymentError>) {
        debug!("Processing verify_transaction request");

        let Some(stored) = self.transactions.get_mut(&reference) else {
            debug!("Transaction not found");
            let _ = respond_to.send(Ok(Verification::not_found()));
            return;
        };

        // The stored record changes only once the reply has been built.
        let mut settled = stored.clone();
        settled.status = self.outcome.decide(stored);
        settled.settled_at = Some(Utc::now());
        let verification = match verification_for(self.next_id, &settled) {
            Ok(verification) => verification,
            Err(err) => {
                warn!(error = %err, "Verification payload could not be built");
                let _ = respond_to.send(Err(err));
                return;
            }
        };

        self.next_id += 1;
        info!(status = %settled.status, "Transaction verified");
        *stored = settled;
        let _ = respond_to.send(Ok(verification));
    }

    #[instrument(fields(reference = %reference, status = %status), skip(self, respond_to))]
    fn handle_complete(
        &mut self,
        reference: String,
        status: TransactionStatus,
        respond_to: ServiceResponse<MockTransaction, PaymentError>,
    ) {
        debug!("Processing complete_transaction request");
        let result = match self.transactions.get_mut(&reference) {
            Some(transaction) => {
                transaction.status = status;
                transaction.settled_at = (status != TransactionStatus::Pending).then(Utc::now);
                info!("Transaction outcome recorded");
                Ok(transaction.clone())
            }
            None => Err(PaymentError::TransactionNotFound(reference)),
        };
        let _ = respond_to.send(result);
    }
}

fn verification_for(id: u64, transaction: &MockTransaction) -> Result<Verification, PaymentError> {
    let success = transaction.status == TransactionStatus::Success;
    let fee = transaction
        .amount
        .checked_mul(FEE_RATE)
        .ok_or_else(|| PaymentError::InvalidAmount(transaction.amount.to_string()))?;
    let fees = to_minor_units(fee)?;
    Ok(Verification {
        status: true,
        message: "Verification successful".to_string(),
        data: Some(VerificationData {
            id,
            status: transaction.status,
            reference: transaction.reference.clone(),
            amount: to_minor_units(transaction.amount)?,
            currency: transaction.currency.clone(),
            fees,
            gateway_response: if success { "Successful" } else { "Declined" }.to_string(),
            channel: "card".to_string(),
            paid_at: if success { transaction.settled_at } else { None },
            authorization: Authorization {
                authorization_code: format!("AUTH_{}", &Uuid::new_v4().simple().to_string()[..10]),
                card_type: "visa".to_string(),
                last4: "4081".to_string(),
                exp_month: "12".to_string(),
                exp_year: "2030".to_string(),
                bank: "Mock Bank".to_string(),
                reusable: success,
            },
            customer: Customer {
                email: transaction.email.clone(),
                customer_code: format!("CUS_{}", &Uuid::new_v4().simple().to_string()[..12]),
            },
            metadata: transaction.metadata.clone(),
        }),
    })
}
