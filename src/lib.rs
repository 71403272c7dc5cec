//! Storefront simulation: mock order storage and service, a simulated payment
//! gateway, the cart context with its two persistence tiers, checkout and the
//! payment webhooks. Every stateful part runs as an actor owned by
//! [`app_system::StorefrontSystem`].

pub mod actor_framework;
pub mod address_actor;
pub mod app_system;
pub mod cart;
pub mod checkout;
pub mod clients;
pub mod config;
pub mod domain;
pub mod messages;
pub mod order_actor;
pub mod payment;
pub mod storage;
pub mod validation;
pub mod webhooks;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;
