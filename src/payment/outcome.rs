use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{MockTransaction, TransactionStatus};

/// Decides how a verification resolves. Injected so tests can force an outcome.
pub trait PaymentOutcome: Send {
    fn decide(&mut self, transaction: &MockTransaction) -> TransactionStatus;
}

/// Resolves to `Success` with probability `success_rate`, otherwise `Failed`.
pub struct RandomOutcome {
    rng: StdRng,
    success_rate: f64,
}

impl RandomOutcome {
    pub fn new(success_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl PaymentOutcome for RandomOutcome {
    fn decide(&mut self, _transaction: &MockTransaction) -> TransactionStatus {
        if self.rng.random_bool(self.success_rate) {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        }
    }
}

/// Always resolves the same way.
pub struct FixedOutcome(pub TransactionStatus);

impl PaymentOutcome for FixedOutcome {
    fn decide(&mut self, _transaction: &MockTransaction) -> TransactionStatus {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeConfig {
    Random { success_rate: f64, seed: Option<u64> },
    Always(TransactionStatus),
}

impl OutcomeConfig {
    pub fn build(&self) -> Box<dyn PaymentOutcome> {
        match *self {
            Self::Random { success_rate, seed } => Box::new(RandomOutcome::new(success_rate, seed)),
            Self::Always(status) => Box::new(FixedOutcome(status)),
        }
    }
}
