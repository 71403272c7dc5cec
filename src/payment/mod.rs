//! Hosted-payment-page simulation: transaction records, verification, and the
//! confirmation prompt that stands in for the redirect flow.

pub mod error;
pub mod outcome;
pub mod prompt;
pub mod service;
pub mod transaction;
pub mod units;

use std::time::Duration;

pub use error::*;
pub use outcome::*;
pub use prompt::*;
pub use service::*;
pub use transaction::*;
pub use units::*;

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub currency: String,
    pub latency: Duration,
    pub outcome: OutcomeConfig,
}
