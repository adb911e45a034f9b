//! HTTP handlers for the Demand Replenishment Platform

mod forecast;
mod health;
mod inventory;
mod jobs;
mod notification;
mod purchase_order;
mod supplier;

pub use forecast::*;
pub use health::*;
pub use inventory::*;
pub use jobs::*;
pub use notification::*;
pub use purchase_order::*;
pub use supplier::*;
