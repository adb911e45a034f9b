//! Domain models for the Demand Replenishment Platform

mod forecast;
mod inventory;
mod notification;
mod purchase_order;
mod sales;
mod supplier;

pub use forecast::*;
pub use inventory::*;
pub use notification::*;
pub use purchase_order::*;
pub use sales::*;
pub use supplier::*;
