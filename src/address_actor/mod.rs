//! Address-book records with the single-default rule.

mod actions;
pub mod entity;

pub use actions::*;
