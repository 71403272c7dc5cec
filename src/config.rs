//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::checkout::PricingPolicy;
use crate::payment::{OutcomeConfig, PaymentSettings};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Simulated storefront order, cart and payment backend")]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Log output format
    #[arg(long, env = "STOREFRONT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Simulated latency of read operations
    #[arg(long, env = "STOREFRONT_READ_LATENCY_MS", default_value_t = 300)]
    pub read_latency_ms: u64,

    /// Simulated latency of write operations
    #[arg(long, env = "STOREFRONT_WRITE_LATENCY_MS", default_value_t = 500)]
    pub write_latency_ms: u64,

    /// Simulated latency of notification sends
    #[arg(long, env = "STOREFRONT_NOTIFY_LATENCY_MS", default_value_t = 200)]
    pub notify_latency_ms: u64,

    /// Simulated latency of payment gateway calls
    #[arg(long, env = "STOREFRONT_PAYMENT_LATENCY_MS", default_value_t = 1000)]
    pub payment_latency_ms: u64,

    /// Probability that verifying a transaction succeeds
    #[arg(long, env = "STOREFRONT_SUCCESS_RATE", default_value_t = 0.8)]
    pub success_rate: f64,

    /// Seed for the payment outcome generator
    #[arg(long, env = "STOREFRONT_PAYMENT_SEED")]
    pub payment_seed: Option<u64>,

    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "NGN")]
    pub currency: String,

    /// File backing the local (browser-like) cart storage
    #[arg(long, env = "STOREFRONT_LOCAL_STORAGE", default_value = ".storefront/local_storage.json")]
    pub local_storage: PathBuf,

    #[arg(long, env = "STOREFRONT_SHIPPING_FEE", default_value_t = dec!(2500))]
    pub shipping_fee: Decimal,

    #[arg(long, env = "STOREFRONT_FREE_SHIPPING_THRESHOLD", default_value_t = dec!(50000))]
    pub free_shipping_threshold: Decimal,

    #[arg(long, env = "STOREFRONT_TAX_RATE", default_value_t = dec!(0.075))]
    pub tax_rate: Decimal,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the payment webhook endpoints
    Serve {
        #[arg(long, env = "STOREFRONT_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Shared secret used to sign gateway webhooks
        #[arg(long, env = "PAYSTACK_SECRET_KEY")]
        webhook_secret: Option<String>,
    },
    /// Run a guest-cart to confirmed-order walkthrough
    Demo {
        /// Ask for the simulated payment outcome on the terminal
        #[arg(long)]
        interactive: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

impl AppConfig {
    pub fn system_settings(&self) -> SystemSettings {
        SystemSettings {
            buffer_size: 100,
            latency: SimulatedLatency {
                read: Duration::from_millis(self.read_latency_ms),
                write: Duration::from_millis(self.write_latency_ms),
                notify: Duration::from_millis(self.notify_latency_ms),
            },
            payment: PaymentSettings {
                currency: self.currency.clone(),
                latency: Duration::from_millis(self.payment_latency_ms),
                outcome: OutcomeConfig::Random {
                    success_rate: self.success_rate,
                    seed: self.payment_seed,
                },
            },
        }
    }

    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            shipping_fee: self.shipping_fee,
            free_shipping_threshold: Some(self.free_shipping_threshold),
            tax_rate: self.tax_rate,
        }
    }
}

/// Everything needed to start a [`crate::app_system::StorefrontSystem`].
#[derive(Debug, Clone)]
pub struct SystemSettings {
    pub buffer_size: usize,
    pub latency: SimulatedLatency,
    pub payment: PaymentSettings,
}

/// Artificial delays standing in for network round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulatedLatency {
    pub read: Duration,
    pub write: Duration,
    pub notify: Duration,
}

impl SimulatedLatency {
    pub fn none() -> Self {
        Self::default()
    }

    pub async fn read(&self) {
        pause(self.read).await;
    }

    pub async fn write(&self) {
        pause(self.write).await;
    }

    pub async fn notify(&self) {
        pause(self.notify).await;
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::try_parse_from(["storefront", "demo"]).unwrap();
        let settings = config.system_settings();
        assert_eq!(settings.latency.read, Duration::from_millis(300));
        assert_eq!(settings.latency.write, Duration::from_millis(500));
        assert_eq!(settings.payment.currency, "NGN");
        assert_eq!(settings.payment.latency, Duration::from_millis(1000));
        assert!(matches!(
            settings.payment.outcome,
            OutcomeConfig::Random { seed: None, .. }
        ));
        assert_eq!(config.pricing().tax_rate, dec!(0.075));
        assert!(matches!(config.command, Command::Demo { interactive: false }));
    }

    #[test]
    fn serve_accepts_bind_and_secret() {
        let config = AppConfig::try_parse_from([
            "storefront",
            "--payment-seed",
            "7",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--webhook-secret",
            "sk_test",
        ])
        .unwrap();
        match &config.command {
            Command::Serve { bind, webhook_secret } => {
                assert_eq!(bind.port(), 9000);
                assert_eq!(webhook_secret.as_deref(), Some("sk_test"));
            }
            Command::Demo { .. } => panic!("expected serve"),
        }
        assert!(matches!(
            config.system_settings().payment.outcome,
            OutcomeConfig::Random { seed: Some(7), .. }
        ));
    }
}
