//! Property requirement profiles

use chrono::Utc;
use shared::{validate_requirements, PropertyProfile, SaveProfileInput};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::PropertyStore;

/// Property profile service
#[derive(Clone)]
pub struct PropertyService {
    store: Arc<dyn PropertyStore>,
}

impl PropertyService {
    /// Create a new PropertyService instance
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self { store }
    }

    /// Load a property's requirement profile
    pub async fn load_profile(&self, owner_id: Uuid, property_id: Uuid) -> AppResult<PropertyProfile> {
        self.store
            .profile(owner_id, property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property".to_string()))
    }

    /// Replace a property's name and requirements, creating it if new
    pub async fn save_profile(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        input: SaveProfileInput,
    ) -> AppResult<PropertyProfile> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "Property name is required"));
        }
        validate_requirements(&input.requirements)
            .map_err(|msg| AppError::validation("requirements", msg))?;

        let profile = PropertyProfile {
            id: property_id,
            owner_id,
            name: name.to_string(),
            requirements: input.requirements,
            updated_at: Utc::now(),
        };
        let saved = self.store.save_profile(profile).await?;

        tracing::info!(
            property_id = %saved.id,
            requirements = saved.requirements.len(),
            "Property profile saved"
        );
        Ok(saved)
    }
}
