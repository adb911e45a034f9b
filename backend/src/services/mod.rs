//! Business logic services for the Demand Replenishment Platform

pub mod forecast;
pub mod heuristic;
pub mod inventory;
pub mod llm_predictor;
pub mod notification;
pub mod predictor;
pub mod purchase_order;
pub mod reorder;
pub mod supplier;

pub use forecast::ForecastService;
pub use heuristic::HeuristicPredictor;
pub use inventory::InventoryService;
pub use llm_predictor::LlmPredictor;
pub use notification::NotificationService;
pub use predictor::{DemandPredictor, FallbackPredictor};
pub use purchase_order::PurchaseOrderService;
pub use reorder::ReorderService;
pub use supplier::SupplierService;
