//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filter for listing supply requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplyRequestFilter {
    pub property_id: Option<Uuid>,
    pub status: Option<crate::models::SupplyRequestStatus>,
}

/// Body of a manual stock adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustStockInput {
    pub delta: i64,
}

/// Body of a direct supply request raised by a requester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaiseSupplyRequestInput {
    pub property_id: Uuid,
    pub sku: String,
    pub item_name: Option<String>,
    #[serde(default)]
    pub shortfall_count: i64,
}
