//! HTTP handlers for property profiles and restock runs

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{FieldReport, FieldReportResult, PropertyProfile, SaveProfileInput, TopOffSummary};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Get a property's requirement profile
pub async fn get_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(property_id): Path<Uuid>,
) -> AppResult<Json<PropertyProfile>> {
    let profile = state
        .properties
        .load_profile(current_user.0.owner_id, property_id)
        .await?;
    Ok(Json(profile))
}

/// Create or replace a property's requirement profile
pub async fn save_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(property_id): Path<Uuid>,
    Json(input): Json<SaveProfileInput>,
) -> AppResult<Json<PropertyProfile>> {
    let profile = state
        .properties
        .save_profile(current_user.0.owner_id, property_id, input)
        .await?;
    Ok(Json(profile))
}

/// Submit a field report and reconcile it against warehouse stock
pub async fn submit_field_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(property_id): Path<Uuid>,
    Json(report): Json<FieldReport>,
) -> AppResult<Json<FieldReportResult>> {
    let user = current_user.0;
    let result = state
        .engine
        .submit_field_report(user.owner_id, property_id, user.user_id, report)
        .await?;
    Ok(Json(result))
}

/// Top the property off to its full required levels
pub async fn restock_to_target(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(property_id): Path<Uuid>,
) -> AppResult<Json<TopOffSummary>> {
    let summary = state
        .engine
        .restock_property_to_target(current_user.0.owner_id, property_id)
        .await?;
    Ok(Json(summary))
}
