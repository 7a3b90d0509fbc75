//! Storage capabilities required by the restock services
//!
//! Every mutating operation here is atomic with respect to concurrent callers
//! touching the same record. Services never read a quantity or a status and
//! write it back in a second call.

use async_trait::async_trait;
use shared::{
    Adjustment, ConsumptionEvent, NewStockItem, NewSupplyRequest, PropertyProfile, StockItem,
    SupplyRequest, SupplyRequestFilter, Transition,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Warehouse stock ledger
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Cheap round trip used by the health check
    async fn ping(&self) -> AppResult<()>;

    async fn get(&self, owner_id: Uuid, sku: &str) -> AppResult<Option<StockItem>>;

    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<StockItem>>;

    /// Insert a new item; fails with a conflict if the SKU already exists
    async fn create(&self, owner_id: Uuid, input: NewStockItem) -> AppResult<StockItem>;

    /// Atomically apply `quantity = max(quantity + delta, 0)`.
    /// Returns `None` when the SKU does not exist in the owner scope.
    async fn adjust(&self, owner_id: Uuid, sku: &str, delta: i64) -> AppResult<Option<Adjustment>>;

    /// Append an event, then drop entries older than `event.date - window_days`.
    /// Returns `false` when the SKU does not exist.
    async fn append_consumption(
        &self,
        owner_id: Uuid,
        sku: &str,
        event: ConsumptionEvent,
        window_days: i64,
    ) -> AppResult<bool>;
}

/// Read access to property requirement profiles, plus operator-side editing
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn profile(&self, owner_id: Uuid, property_id: Uuid) -> AppResult<Option<PropertyProfile>>;

    async fn save_profile(&self, profile: PropertyProfile) -> AppResult<PropertyProfile>;
}

/// Supply request records
#[async_trait]
pub trait SupplyRequestStore: Send + Sync {
    /// Atomically insert unless a pending request already exists for the
    /// same (owner, property, sku). Returns `None` when suppressed.
    async fn insert_if_none_pending(&self, request: NewSupplyRequest)
        -> AppResult<Option<SupplyRequest>>;

    /// Fetch by id regardless of owner; scope checks belong to the caller
    async fn get(&self, id: Uuid) -> AppResult<Option<SupplyRequest>>;

    async fn list(&self, owner_id: Uuid, filter: &SupplyRequestFilter) -> AppResult<Vec<SupplyRequest>>;

    /// Apply `transition` only if the status still equals `transition.from`.
    /// A positive `restock_quantity` is added to the request's stock item in
    /// the same atomic step, so either both changes land or neither does.
    /// Returns `None` when the status moved underneath the caller.
    async fn transition(&self, id: Uuid, transition: Transition)
        -> AppResult<Option<AppliedTransition>>;
}

/// A lifecycle change that was committed
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTransition {
    pub request: SupplyRequest,
    /// Warehouse quantity after the received units were added. `None` when
    /// nothing was added or the SKU has no stock item.
    pub stock_quantity: Option<i64>,
}

/// Resolves a human-readable name for whoever triggered a report
#[async_trait]
pub trait RequesterDirectory: Send + Sync {
    async fn display_name(&self, user_id: Uuid) -> AppResult<Option<String>>;
}

/// The set of stores the services are wired with
#[derive(Clone)]
pub struct Stores {
    pub stock: Arc<dyn StockStore>,
    pub properties: Arc<dyn PropertyStore>,
    pub supply_requests: Arc<dyn SupplyRequestStore>,
    pub requesters: Arc<dyn RequesterDirectory>,
}

impl Stores {
    /// All capabilities backed by one in-memory store
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            stock: store.clone(),
            properties: store.clone(),
            supply_requests: store.clone(),
            requesters: store,
        }
    }

    /// All capabilities backed by PostgreSQL
    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            stock: store.clone(),
            properties: store.clone(),
            supply_requests: store.clone(),
            requesters: store,
        }
    }
}
