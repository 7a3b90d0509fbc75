//! Route definitions for the supply restock platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes; everything except the health check requires a token
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/stock-items", stock_item_routes())
        .nest("/properties", property_routes())
        .nest("/supply-requests", supply_request_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        // Health check (public)
        .route("/health", get(handlers::health_check))
}

/// Warehouse stock ledger routes
fn stock_item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_stock_items).post(handlers::create_stock_item),
        )
        .route("/low", get(handlers::list_low_stock_items))
        .route("/:sku", get(handlers::get_stock_item))
        .route("/:sku/adjust", post(handlers::adjust_stock_item))
        .route("/:sku/consumption", get(handlers::get_consumption_summary))
}

/// Property profile and restock routes
fn property_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:property_id/profile",
            get(handlers::get_profile).put(handlers::save_profile),
        )
        .route(
            "/:property_id/field-reports",
            post(handlers::submit_field_report),
        )
        .route("/:property_id/restock", post(handlers::restock_to_target))
}

/// Supply request lifecycle routes
fn supply_request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_supply_requests).post(handlers::raise_supply_request),
        )
        .route("/:request_id", get(handlers::get_supply_request))
        .route(
            "/:request_id/advance",
            post(handlers::advance_supply_request),
        )
}
