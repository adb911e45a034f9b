//! Demand Replenishment Platform - Backend
//!
//! Demand forecasting and replenishment services for an e-commerce store:
//! multi-horizon forecasts over sales history, low-stock reorder advice,
//! purchase order lifecycle with inventory reconciliation, and the
//! scheduled workers that keep forecasts current.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;

use jobs::scheduler::JobsHandle;
use services::predictor::DemandPredictor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub predictor: Arc<dyn DemandPredictor>,
    pub jobs: JobsHandle,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> axum::Router {
    use tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/", axum::routing::get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Demand Replenishment Platform API v1.0"
}

/// Composition root for the demand predictor: LLM-backed with heuristic
/// fallback when an API key is configured, heuristic alone otherwise.
pub fn build_predictor(config: &Config) -> error::AppResult<Arc<dyn DemandPredictor>> {
    let heuristic = Arc::new(services::HeuristicPredictor::new());

    if config.llm.is_enabled() {
        let client = external::LlmClient::new(
            config.llm.endpoint.clone(),
            config.llm.api_key.clone(),
            config.llm.model.clone(),
            std::time::Duration::from_secs(config.llm.timeout_seconds),
        )?;
        let llm = Arc::new(services::LlmPredictor::new(client));
        tracing::info!(model = %config.llm.model, "LLM predictor enabled with heuristic fallback");
        Ok(Arc::new(services::FallbackPredictor::new(llm, heuristic)))
    } else {
        tracing::info!("no LLM API key configured, using heuristic predictor");
        Ok(heuristic)
    }
}
