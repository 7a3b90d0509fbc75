//! Property requirement profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-property list of required stock levels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    /// Ordered, unique per SKU
    pub requirements: Vec<RequiredItem>,
    pub updated_at: DateTime<Utc>,
}

/// A single (SKU, required level) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredItem {
    pub sku: String,
    pub required_level: i64,
}

/// Input for replacing a property's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProfileInput {
    pub name: String,
    pub requirements: Vec<RequiredItem>,
}

impl PropertyProfile {
    /// Required level for a SKU, if the profile lists it
    pub fn required_level(&self, sku: &str) -> Option<i64> {
        self.requirements
            .iter()
            .find(|r| r.sku == sku)
            .map(|r| r.required_level)
    }
}

impl RequiredItem {
    pub fn new(sku: impl Into<String>, required_level: i64) -> Self {
        Self {
            sku: sku.into(),
            required_level,
        }
    }
}
