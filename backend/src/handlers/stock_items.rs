//! HTTP handlers for the warehouse stock ledger

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use shared::{AdjustStockInput, Adjustment, ConsumptionSummary, NewStockItem, StockItem};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

/// List all stock items in the caller's scope
pub async fn list_stock_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StockItem>>> {
    let items = state.ledger.list_items(current_user.0.owner_id).await?;
    Ok(Json(items))
}

/// Create a stock item
pub async fn create_stock_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewStockItem>,
) -> AppResult<Json<StockItem>> {
    let item = state
        .ledger
        .create_item(current_user.0.owner_id, input)
        .await?;
    Ok(Json(item))
}

/// Items at or below their alert threshold
pub async fn list_low_stock_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StockItem>>> {
    let items = state.ledger.low_stock_items(current_user.0.owner_id).await?;
    Ok(Json(items))
}

/// Get a stock item by SKU
pub async fn get_stock_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sku): Path<String>,
) -> AppResult<Json<StockItem>> {
    let item = state.ledger.require(current_user.0.owner_id, &sku).await?;
    Ok(Json(item))
}

/// Manually adjust a stock item's quantity
pub async fn adjust_stock_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sku): Path<String>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<Adjustment>> {
    let adjustment = state
        .ledger
        .adjust(current_user.0.owner_id, &sku, input.delta)
        .await?;
    Ok(Json(adjustment))
}

/// Usage over the retained consumption window
pub async fn get_consumption_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sku): Path<String>,
) -> AppResult<Json<ConsumptionSummary>> {
    let summary = state
        .ledger
        .consumption_summary(current_user.0.owner_id, &sku, Utc::now())
        .await?;
    Ok(Json(summary))
}
