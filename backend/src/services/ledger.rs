//! Stock ledger service: the authoritative warehouse count per SKU

use chrono::{DateTime, Utc};
use shared::{
    summarize_consumption, validate_sku, Adjustment, ConsumptionEvent, ConsumptionSummary,
    NewStockItem, StockItem,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::StockStore;

/// Ledger service over an atomic stock store
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn StockStore>,
    history_window_days: i64,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(store: Arc<dyn StockStore>, history_window_days: i64) -> Self {
        Self {
            store,
            history_window_days,
        }
    }

    /// Look up an item; `None` when the SKU is unknown in this scope
    pub async fn get(&self, owner_id: Uuid, sku: &str) -> AppResult<Option<StockItem>> {
        self.store.get(owner_id, sku).await
    }

    /// Look up an item that must exist
    pub async fn require(&self, owner_id: Uuid, sku: &str) -> AppResult<StockItem> {
        self.get(owner_id, sku)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(sku.to_string()))
    }

    /// List all items of an owner
    pub async fn list_items(&self, owner_id: Uuid) -> AppResult<Vec<StockItem>> {
        self.store.list(owner_id).await
    }

    /// Items currently at or below their alert threshold
    pub async fn low_stock_items(&self, owner_id: Uuid) -> AppResult<Vec<StockItem>> {
        let items = self.store.list(owner_id).await?;
        Ok(items.into_iter().filter(Self::is_low).collect())
    }

    /// Create a new stock item
    pub async fn create_item(&self, owner_id: Uuid, input: NewStockItem) -> AppResult<StockItem> {
        input.validate()?;
        validate_sku(&input.sku).map_err(|msg| AppError::validation("sku", msg))?;

        let item = self.store.create(owner_id, input).await?;
        tracing::info!(owner_id = %owner_id, sku = %item.sku, quantity = item.quantity, "Stock item created");
        Ok(item)
    }

    /// Apply `quantity += delta`, clamped at zero, as one atomic step
    pub async fn adjust(&self, owner_id: Uuid, sku: &str, delta: i64) -> AppResult<Adjustment> {
        let adjustment = self
            .store
            .adjust(owner_id, sku, delta)
            .await?
            .ok_or_else(|| AppError::ItemNotFound(sku.to_string()))?;

        tracing::debug!(
            sku = %sku,
            delta,
            before = adjustment.quantity_before,
            after = adjustment.item.quantity,
            "Stock adjusted"
        );
        Ok(adjustment)
    }

    /// Append a consumption event and prune history older than the window
    pub async fn record_consumption(
        &self,
        owner_id: Uuid,
        sku: &str,
        amount_used: i64,
        when: DateTime<Utc>,
    ) -> AppResult<()> {
        if amount_used < 0 {
            return Err(AppError::validation(
                "amount_used",
                "Consumption amount cannot be negative",
            ));
        }

        let event = ConsumptionEvent {
            date: when,
            amount_used,
        };
        let found = self
            .store
            .append_consumption(owner_id, sku, event, self.history_window_days)
            .await?;

        if !found {
            return Err(AppError::ItemNotFound(sku.to_string()));
        }
        Ok(())
    }

    /// Usage over the retained window, read by external trend analysis
    pub async fn consumption_summary(
        &self,
        owner_id: Uuid,
        sku: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ConsumptionSummary> {
        let item = self.require(owner_id, sku).await?;
        Ok(summarize_consumption(
            &item.sku,
            &item.consumption_history,
            now,
            self.history_window_days,
        ))
    }

    /// Whether the backing store answers
    pub async fn storage_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    pub fn is_low(item: &StockItem) -> bool {
        item.is_low()
    }
}
