//! Database models for the Demand Replenishment Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
