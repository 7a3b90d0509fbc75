//! In-memory store used for development and tests
//!
//! Each operation takes the write lock for its whole read-modify-write, which
//! serializes concurrent adjustments of the same SKU and the pending-request
//! check-then-insert. A receive holds the requests lock and then the stock
//! lock; nothing takes them in the other order.

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    Adjustment, ConsumptionEvent, NewStockItem, NewSupplyRequest, PropertyProfile, StockItem,
    SupplyRequest, SupplyRequestFilter, SupplyRequestStatus, Transition,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AppliedTransition, PropertyStore, RequesterDirectory, StockStore, SupplyRequestStore,
};
use crate::error::{AppError, AppResult};

type StockKey = (Uuid, String);

#[derive(Default)]
pub struct MemoryStore {
    stock: RwLock<HashMap<StockKey, StockItem>>,
    properties: RwLock<HashMap<(Uuid, Uuid), PropertyProfile>>,
    requests: RwLock<HashMap<Uuid, SupplyRequest>>,
    requesters: RwLock<HashMap<Uuid, String>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store: every call fails until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Register a display name for a requester
    pub async fn register_requester(&self, user_id: Uuid, name: impl Into<String>) {
        self.requesters.write().await.insert(user_id, name.into());
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StorageError("memory store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.check_available()
    }

    async fn get(&self, owner_id: Uuid, sku: &str) -> AppResult<Option<StockItem>> {
        self.check_available()?;
        let stock = self.stock.read().await;
        Ok(stock.get(&(owner_id, sku.to_string())).cloned())
    }

    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<StockItem>> {
        self.check_available()?;
        let stock = self.stock.read().await;
        let mut items: Vec<StockItem> = stock
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.sku.cmp(&b.sku)));
        Ok(items)
    }

    async fn create(&self, owner_id: Uuid, input: NewStockItem) -> AppResult<StockItem> {
        self.check_available()?;
        let mut stock = self.stock.write().await;
        let key = (owner_id, input.sku.clone());
        if stock.contains_key(&key) {
            return Err(AppError::Conflict(format!("SKU {} already exists", input.sku)));
        }
        let item = StockItem::from_input(owner_id, input, Utc::now());
        stock.insert(key, item.clone());
        Ok(item)
    }

    async fn adjust(&self, owner_id: Uuid, sku: &str, delta: i64) -> AppResult<Option<Adjustment>> {
        self.check_available()?;
        let mut stock = self.stock.write().await;
        Ok(stock
            .get_mut(&(owner_id, sku.to_string()))
            .map(|item| item.adjust(delta, Utc::now())))
    }

    async fn append_consumption(
        &self,
        owner_id: Uuid,
        sku: &str,
        event: ConsumptionEvent,
        window_days: i64,
    ) -> AppResult<bool> {
        self.check_available()?;
        let mut stock = self.stock.write().await;
        match stock.get_mut(&(owner_id, sku.to_string())) {
            Some(item) => {
                item.record_consumption(event, window_days);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn profile(&self, owner_id: Uuid, property_id: Uuid) -> AppResult<Option<PropertyProfile>> {
        self.check_available()?;
        let properties = self.properties.read().await;
        Ok(properties.get(&(owner_id, property_id)).cloned())
    }

    async fn save_profile(&self, profile: PropertyProfile) -> AppResult<PropertyProfile> {
        self.check_available()?;
        let mut properties = self.properties.write().await;
        if properties
            .keys()
            .any(|(owner_id, id)| *id == profile.id && *owner_id != profile.owner_id)
        {
            return Err(AppError::Unauthorized);
        }
        properties.insert((profile.owner_id, profile.id), profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl SupplyRequestStore for MemoryStore {
    async fn insert_if_none_pending(
        &self,
        request: NewSupplyRequest,
    ) -> AppResult<Option<SupplyRequest>> {
        self.check_available()?;
        let mut requests = self.requests.write().await;
        let pending_exists = requests.values().any(|r| {
            r.status == SupplyRequestStatus::Pending
                && r.owner_id == request.owner_id
                && r.property_id == request.property_id
                && r.sku == request.sku
        });
        if pending_exists {
            return Ok(None);
        }
        let created = request.into_pending(Utc::now());
        requests.insert(created.id, created.clone());
        Ok(Some(created))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<SupplyRequest>> {
        self.check_available()?;
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list(
        &self,
        owner_id: Uuid,
        filter: &SupplyRequestFilter,
    ) -> AppResult<Vec<SupplyRequest>> {
        self.check_available()?;
        let requests = self.requests.read().await;
        let mut matching: Vec<SupplyRequest> = requests
            .values()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| filter.property_id.map_or(true, |p| r.property_id == p))
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
    ) -> AppResult<Option<AppliedTransition>> {
        self.check_available()?;
        // Lock order: requests, then stock
        let mut requests = self.requests.write().await;
        let Some(request) = requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != transition.from {
            return Ok(None);
        }

        let now = Utc::now();
        let stock_quantity = match transition.restock_quantity.filter(|q| *q > 0) {
            Some(received) => {
                let mut stock = self.stock.write().await;
                stock
                    .get_mut(&(request.owner_id, request.sku.clone()))
                    .map(|item| item.adjust(received, now).item.quantity)
            }
            None => None,
        };

        request.apply(&transition, now);
        Ok(Some(AppliedTransition {
            request: request.clone(),
            stock_quantity,
        }))
    }
}

#[async_trait]
impl RequesterDirectory for MemoryStore {
    async fn display_name(&self, user_id: Uuid) -> AppResult<Option<String>> {
        self.check_available()?;
        Ok(self.requesters.read().await.get(&user_id).cloned())
    }
}
