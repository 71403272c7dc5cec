#[macro_use]
mod macros;

pub mod order_client;
pub mod payment_client;

pub use order_client::OrderClient;
pub use payment_client::PaymentClient;
