//! In-progress cart: pure line rules, the two persistence tiers and the
//! context that keeps them in step with the in-memory cart.

pub mod context;
pub mod error;
pub mod lines;
pub mod local_storage;
pub mod store;

pub use context::CartContext;
pub use error::*;
pub use local_storage::{LocalStorage, LocalStorageError};
pub use store::*;
