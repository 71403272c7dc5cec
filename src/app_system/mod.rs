//! System orchestration, startup, and shutdown logic.

pub mod demo;
pub mod error;
pub mod storefront_system;
pub mod tracing;

pub use self::tracing::*;
pub use error::*;
pub use storefront_system::*;
