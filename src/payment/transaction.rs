use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        })
    }
}

/// What checkout sends to start a payment.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// Amount in major units.
    pub amount: Decimal,
    pub email: String,
    pub reference: Option<String>,
    pub currency: Option<String>,
    pub metadata: Value,
}

/// A payment attempt held by the simulated gateway for the life of the process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockTransaction {
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub status: TransactionStatus,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionInit {
    pub reference: String,
    pub access_code: String,
    pub authorization_url: String,
}

/// Gateway-shaped verification reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub status: bool,
    pub message: String,
    pub data: Option<VerificationData>,
}

impl Verification {
    pub fn not_found() -> Self {
        Self {
            status: false,
            message: "Transaction not found".to_string(),
            data: None,
        }
    }

    pub fn outcome(&self) -> Option<TransactionStatus> {
        self.data.as_ref().map(|data| data.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationData {
    pub id: u64,
    pub status: TransactionStatus,
    pub reference: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    /// Minor units.
    pub fees: i64,
    pub gateway_response: String,
    pub channel: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub authorization: Authorization,
    pub customer: Customer,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Authorization {
    pub authorization_code: String,
    pub card_type: String,
    pub last4: String,
    pub exp_month: String,
    pub exp_year: String,
    pub bank: String,
    pub reusable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub email: String,
    pub customer_code: String,
}

/// What the caller of the simulated payment page gets back when it was not cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct MockPaymentResult {
    pub reference: String,
    pub status: TransactionStatus,
    pub channel: String,
}
