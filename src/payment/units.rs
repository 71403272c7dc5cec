use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::PaymentError;

pub const DEFAULT_REFERENCE_PREFIX: &str = "MOCK";

/// Major units to the gateway's minor unit (kobo, cents), rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// `<PREFIX>_<unix millis>_<9 lowercase alphanumerics>`
pub fn generate_reference(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}
