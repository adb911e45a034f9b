//! Shared types and models for the Demand Replenishment Platform
//!
//! This crate contains the domain records and wire types shared between the
//! backend services, admin tooling, and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
