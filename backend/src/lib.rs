//! Supply restock platform backend
//!
//! Reconciles per-property requirement profiles against a shared warehouse
//! stock ledger, and tracks the supply requests raised for whatever the
//! warehouse could not cover.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{
    LedgerService, Notifier, PropertyService, RestockEngine, SupplyRequestService,
};
use store::Stores;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: LedgerService,
    pub properties: PropertyService,
    pub engine: RestockEngine,
    pub supply_requests: SupplyRequestService,
}

impl AppState {
    /// Wire the services over a set of stores
    pub fn new(config: Config, stores: Stores, notifier: Arc<dyn Notifier>) -> Self {
        let ledger = LedgerService::new(stores.stock, config.restock.history_window_days);
        let supply_requests = SupplyRequestService::new(
            stores.supply_requests,
            stores.properties.clone(),
            stores.requesters,
            ledger.clone(),
        );
        let engine = RestockEngine::new(
            ledger.clone(),
            stores.properties.clone(),
            supply_requests.clone(),
            notifier,
            config.restock,
        );

        Self {
            config: Arc::new(config),
            ledger,
            properties: PropertyService::new(stores.properties),
            engine,
            supply_requests,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "Supply Restock Platform API v1.0"
}
