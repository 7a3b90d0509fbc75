//! Supply request lifecycle management
//!
//! Creation is de-duplicated per (property, SKU): while a request is pending,
//! flagging the same pair again is a no-op. Lifecycle changes are validated
//! against the current status and then applied conditionally, so two callers
//! racing on one request cannot both succeed. Receiving adds the ordered units
//! to the warehouse in the same store operation as the status change.

use shared::{
    plan_transition, validate_sku, NewSupplyRequest, RaiseSupplyRequestInput, SupplyRequest,
    SupplyRequestAction, SupplyRequestFilter,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::LedgerService;
use crate::store::{PropertyStore, RequesterDirectory, SupplyRequestStore};

/// Supply request service
#[derive(Clone)]
pub struct SupplyRequestService {
    store: Arc<dyn SupplyRequestStore>,
    properties: Arc<dyn PropertyStore>,
    requesters: Arc<dyn RequesterDirectory>,
    ledger: LedgerService,
}

/// Outcome of flagging an item for reorder
#[derive(Debug, Clone, PartialEq)]
pub enum FlagOutcome {
    Created(SupplyRequest),
    /// A pending request already covers this (property, SKU)
    AlreadyPending,
}

impl FlagOutcome {
    pub fn created(self) -> Option<SupplyRequest> {
        match self {
            FlagOutcome::Created(request) => Some(request),
            FlagOutcome::AlreadyPending => None,
        }
    }
}

impl SupplyRequestService {
    /// Create a new SupplyRequestService instance
    pub fn new(
        store: Arc<dyn SupplyRequestStore>,
        properties: Arc<dyn PropertyStore>,
        requesters: Arc<dyn RequesterDirectory>,
        ledger: LedgerService,
    ) -> Self {
        Self {
            store,
            properties,
            requesters,
            ledger,
        }
    }

    /// Open a pending request unless one is already pending for the pair
    pub async fn flag_item(&self, request: NewSupplyRequest) -> AppResult<FlagOutcome> {
        let property_id = request.property_id;
        let sku = request.sku.clone();

        match self.store.insert_if_none_pending(request).await? {
            Some(created) => {
                tracing::info!(
                    request_id = %created.id,
                    property_id = %property_id,
                    sku = %sku,
                    "Supply request opened"
                );
                Ok(FlagOutcome::Created(created))
            }
            None => {
                tracing::debug!(
                    property_id = %property_id,
                    sku = %sku,
                    "Supply request already pending, skipping"
                );
                Ok(FlagOutcome::AlreadyPending)
            }
        }
    }

    /// A requester raises a request directly, outside a field report
    pub async fn raise(
        &self,
        owner_id: Uuid,
        requested_by: Uuid,
        input: RaiseSupplyRequestInput,
    ) -> AppResult<FlagOutcome> {
        validate_sku(&input.sku).map_err(|msg| AppError::validation("sku", msg))?;
        if input.shortfall_count < 0 {
            return Err(AppError::validation(
                "shortfall_count",
                "Shortfall count cannot be negative",
            ));
        }

        self.properties
            .profile(owner_id, input.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property".to_string()))?;

        let item_name = match input.item_name {
            Some(name) => name,
            None => self
                .ledger
                .get(owner_id, &input.sku)
                .await?
                .map(|item| item.name)
                .unwrap_or_else(|| input.sku.clone()),
        };

        let requested_by_name = self.resolve_requester(requested_by).await;

        self.flag_item(NewSupplyRequest {
            owner_id,
            property_id: input.property_id,
            sku: input.sku,
            item_name,
            requested_by,
            requested_by_name,
            shortfall_count: input.shortfall_count,
        })
        .await
    }

    /// Cosmetic name lookup; failures leave the name empty
    pub async fn resolve_requester(&self, user_id: Uuid) -> Option<String> {
        match self.requesters.display_name(user_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Requester lookup failed: {}", e);
                None
            }
        }
    }

    /// Get a request within the caller's scope
    pub async fn get(&self, owner_id: Uuid, request_id: Uuid) -> AppResult<SupplyRequest> {
        let request = self
            .store
            .get(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Supply request".to_string()))?;

        if request.owner_id != owner_id {
            return Err(AppError::Unauthorized);
        }
        Ok(request)
    }

    /// List requests of an owner, newest first
    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &SupplyRequestFilter,
    ) -> AppResult<Vec<SupplyRequest>> {
        self.store.list(owner_id, filter).await
    }

    /// Move a request through its lifecycle
    #[tracing::instrument(skip(self))]
    pub async fn advance(
        &self,
        owner_id: Uuid,
        request_id: Uuid,
        action: SupplyRequestAction,
    ) -> AppResult<SupplyRequest> {
        let current = self.get(owner_id, request_id).await?;
        let transition = plan_transition(&current, action)?;

        let applied = self
            .store
            .transition(request_id, transition)
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition(format!(
                    "request is no longer {}, it was changed concurrently",
                    transition.from
                ))
            })?;
        let updated = applied.request;

        tracing::info!(from = %transition.from, to = %transition.to, "Supply request advanced");

        if let Some(received) = transition.restock_quantity.filter(|q| *q > 0) {
            match applied.stock_quantity {
                Some(quantity) => tracing::info!(
                    sku = %updated.sku,
                    received,
                    quantity,
                    "Warehouse replenished"
                ),
                None => tracing::warn!(
                    sku = %updated.sku,
                    "Received request for a SKU with no stock item; nothing replenished"
                ),
            }
        }

        Ok(updated)
    }
}
