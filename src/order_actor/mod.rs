//! Order record lifecycle: creation totals, status and payment transitions, tracking log.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
