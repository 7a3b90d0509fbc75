//! HTTP handlers for supply requests

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{RaiseSupplyRequestInput, SupplyRequest, SupplyRequestAction, SupplyRequestFilter};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

/// List supply requests, optionally filtered by property and status
pub async fn list_supply_requests(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<SupplyRequestFilter>,
) -> AppResult<Json<Vec<SupplyRequest>>> {
    let requests = state
        .supply_requests
        .list(current_user.0.owner_id, &filter)
        .await?;
    Ok(Json(requests))
}

/// Raise a supply request directly. Returns `null` when one is already pending.
pub async fn raise_supply_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RaiseSupplyRequestInput>,
) -> AppResult<Json<Option<SupplyRequest>>> {
    let user = current_user.0;
    let outcome = state
        .supply_requests
        .raise(user.owner_id, user.user_id, input)
        .await?;
    Ok(Json(outcome.created()))
}

/// Get a supply request by ID
pub async fn get_supply_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<SupplyRequest>> {
    let request = state
        .supply_requests
        .get(current_user.0.owner_id, request_id)
        .await?;
    Ok(Json(request))
}

/// Move a supply request through its lifecycle
pub async fn advance_supply_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(action): Json<SupplyRequestAction>,
) -> AppResult<Json<SupplyRequest>> {
    let request = state
        .supply_requests
        .advance(current_user.0.owner_id, request_id, action)
        .await?;
    Ok(Json(request))
}
