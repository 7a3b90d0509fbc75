//! PostgreSQL-backed store
//!
//! Quantity adjustments lock the item row for the read-modify-write, pending
//! de-duplication relies on the partial unique index
//! `supply_requests_one_pending`, and lifecycle transitions are conditional
//! updates on the current status. Receiving a request and adding its units to
//! the stock item share one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use shared::{
    Adjustment, ConsumptionEvent, NewStockItem, NewSupplyRequest, PropertyProfile, RequiredItem,
    StockItem, SupplyRequest, SupplyRequestFilter, SupplyRequestStatus, Transition,
};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    AppliedTransition, PropertyStore, RequesterDirectory, StockStore, SupplyRequestStore,
};
use crate::error::{AppError, AppResult};

const STOCK_COLUMNS: &str = "id, owner_id, sku, name, quantity, target_level, alert_threshold, \
                             cost_per_unit, created_at, updated_at";

/// `quantity + $3` clamped to `[0, i64::MAX]`; the sum is taken in NUMERIC so
/// extreme deltas saturate instead of overflowing BIGINT
const SATURATING_QUANTITY: &str =
    "GREATEST(LEAST(quantity::NUMERIC + $3, 9223372036854775807), 0)::BIGINT";

const REQUEST_COLUMNS: &str = "id, owner_id, property_id, sku, item_name, requested_by, \
                               requested_by_name, status, shortfall_count, ordered_quantity, \
                               created_at, ordered_at, received_at, cancelled_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn history_for(&self, item_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<ConsumptionEvent>>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(
            r#"
            SELECT stock_item_id, used_at, amount_used
            FROM consumption_events
            WHERE stock_item_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.db)
        .await?;

        let mut history: HashMap<Uuid, Vec<ConsumptionEvent>> = HashMap::new();
        for row in rows {
            history.entry(row.stock_item_id).or_default().push(ConsumptionEvent {
                date: row.used_at,
                amount_used: row.amount_used,
            });
        }
        Ok(history)
    }
}

/// Database row for a stock item (history is loaded separately)
#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    owner_id: Uuid,
    sku: String,
    name: String,
    quantity: i64,
    target_level: i64,
    alert_threshold: i64,
    cost_per_unit: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockRow {
    fn into_item(self, consumption_history: Vec<ConsumptionEvent>) -> StockItem {
        StockItem {
            id: self.id,
            owner_id: self.owner_id,
            sku: self.sku,
            name: self.name,
            quantity: self.quantity,
            target_level: self.target_level,
            alert_threshold: self.alert_threshold,
            cost_per_unit: self.cost_per_unit,
            consumption_history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ConsumptionRow {
    stock_item_id: Uuid,
    used_at: DateTime<Utc>,
    amount_used: i64,
}

/// Database row for a supply request
#[derive(Debug, FromRow)]
struct SupplyRequestRow {
    id: Uuid,
    owner_id: Uuid,
    property_id: Uuid,
    sku: String,
    item_name: String,
    requested_by: Uuid,
    requested_by_name: Option<String>,
    status: String,
    shortfall_count: i64,
    ordered_quantity: Option<i64>,
    created_at: DateTime<Utc>,
    ordered_at: Option<DateTime<Utc>>,
    received_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<SupplyRequestRow> for SupplyRequest {
    type Error = AppError;

    fn try_from(row: SupplyRequestRow) -> Result<Self, Self::Error> {
        let status: SupplyRequestStatus = row.status.parse().map_err(AppError::StorageError)?;
        Ok(SupplyRequest {
            id: row.id,
            owner_id: row.owner_id,
            property_id: row.property_id,
            sku: row.sku,
            item_name: row.item_name,
            requested_by: row.requested_by,
            requested_by_name: row.requested_by_name,
            status,
            shortfall_count: row.shortfall_count,
            ordered_quantity: row.ordered_quantity,
            created_at: row.created_at,
            ordered_at: row.ordered_at,
            received_at: row.received_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

#[async_trait]
impl StockStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn get(&self, owner_id: Uuid, sku: &str) -> AppResult<Option<StockItem>> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {} FROM stock_items WHERE owner_id = $1 AND sku = $2",
            STOCK_COLUMNS
        ))
        .bind(owner_id)
        .bind(sku)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let mut history = self.history_for(&[row.id]).await?;
                let events = history.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_item(events)))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<StockItem>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            "SELECT {} FROM stock_items WHERE owner_id = $1 ORDER BY name ASC, sku ASC",
            STOCK_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut history = self.history_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let events = history.remove(&row.id).unwrap_or_default();
                row.into_item(events)
            })
            .collect())
    }

    async fn create(&self, owner_id: Uuid, input: NewStockItem) -> AppResult<StockItem> {
        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            INSERT INTO stock_items (id, owner_id, sku, name, quantity, target_level, alert_threshold, cost_per_unit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_id, sku) DO NOTHING
            RETURNING {}
            "#,
            STOCK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(input.quantity.max(0))
        .bind(input.target_level)
        .bind(input.alert_threshold)
        .bind(input.cost_per_unit)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("SKU {} already exists", input.sku)))?;

        Ok(row.into_item(Vec::new()))
    }

    async fn adjust(&self, owner_id: Uuid, sku: &str, delta: i64) -> AppResult<Option<Adjustment>> {
        let mut tx = self.db.begin().await?;

        let quantity_before = sqlx::query_scalar::<_, i64>(
            "SELECT quantity FROM stock_items WHERE owner_id = $1 AND sku = $2 FOR UPDATE",
        )
        .bind(owner_id)
        .bind(sku)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(quantity_before) = quantity_before else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            UPDATE stock_items
            SET quantity = {}, updated_at = NOW()
            WHERE owner_id = $1 AND sku = $2
            RETURNING {}
            "#,
            SATURATING_QUANTITY, STOCK_COLUMNS
        ))
        .bind(owner_id)
        .bind(sku)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut history = self.history_for(&[row.id]).await?;
        let events = history.remove(&row.id).unwrap_or_default();
        Ok(Some(Adjustment {
            quantity_before,
            item: row.into_item(events),
        }))
    }

    async fn append_consumption(
        &self,
        owner_id: Uuid,
        sku: &str,
        event: ConsumptionEvent,
        window_days: i64,
    ) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO consumption_events (stock_item_id, used_at, amount_used)
            SELECT id, $3, $4 FROM stock_items WHERE owner_id = $1 AND sku = $2
            RETURNING stock_item_id
            "#,
        )
        .bind(owner_id)
        .bind(sku)
        .bind(event.date)
        .bind(event.amount_used)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(item_id) = item_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("DELETE FROM consumption_events WHERE stock_item_id = $1 AND used_at < $2")
            .bind(item_id)
            .bind(event.date - Duration::days(window_days))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl PropertyStore for PgStore {
    async fn profile(&self, owner_id: Uuid, property_id: Uuid) -> AppResult<Option<PropertyProfile>> {
        let property = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            "SELECT id, owner_id, name, updated_at FROM properties WHERE id = $1 AND owner_id = $2",
        )
        .bind(property_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;

        let Some((id, owner_id, name, updated_at)) = property else {
            return Ok(None);
        };

        let requirements = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT sku, required_level
            FROM property_requirements
            WHERE property_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(sku, required_level)| RequiredItem { sku, required_level })
        .collect();

        Ok(Some(PropertyProfile {
            id,
            owner_id,
            name,
            requirements,
            updated_at,
        }))
    }

    async fn save_profile(&self, profile: PropertyProfile) -> AppResult<PropertyProfile> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            INSERT INTO properties (id, owner_id, name, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, updated_at = EXCLUDED.updated_at
            WHERE properties.owner_id = EXCLUDED.owner_id
            "#,
        )
        .bind(profile.id)
        .bind(profile.owner_id)
        .bind(&profile.name)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::Unauthorized);
        }

        sqlx::query("DELETE FROM property_requirements WHERE property_id = $1")
            .bind(profile.id)
            .execute(&mut *tx)
            .await?;

        for (position, req) in profile.requirements.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO property_requirements (property_id, position, sku, required_level)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(profile.id)
            .bind(position as i32)
            .bind(&req.sku)
            .bind(req.required_level)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(profile)
    }
}

#[async_trait]
impl SupplyRequestStore for PgStore {
    async fn insert_if_none_pending(
        &self,
        request: NewSupplyRequest,
    ) -> AppResult<Option<SupplyRequest>> {
        let row = sqlx::query_as::<_, SupplyRequestRow>(&format!(
            r#"
            INSERT INTO supply_requests (
                id, owner_id, property_id, sku, item_name, requested_by,
                requested_by_name, status, shortfall_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
            ON CONFLICT (owner_id, property_id, sku) WHERE status = 'pending' DO NOTHING
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(request.owner_id)
        .bind(request.property_id)
        .bind(&request.sku)
        .bind(&request.item_name)
        .bind(request.requested_by)
        .bind(&request.requested_by_name)
        .bind(request.shortfall_count)
        .fetch_optional(&self.db)
        .await?;

        row.map(SupplyRequest::try_from).transpose()
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<SupplyRequest>> {
        let row = sqlx::query_as::<_, SupplyRequestRow>(&format!(
            "SELECT {} FROM supply_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(SupplyRequest::try_from).transpose()
    }

    async fn list(
        &self,
        owner_id: Uuid,
        filter: &SupplyRequestFilter,
    ) -> AppResult<Vec<SupplyRequest>> {
        let rows = sqlx::query_as::<_, SupplyRequestRow>(&format!(
            r#"
            SELECT {}
            FROM supply_requests
            WHERE owner_id = $1
              AND ($2::uuid IS NULL OR property_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
            REQUEST_COLUMNS
        ))
        .bind(owner_id)
        .bind(filter.property_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SupplyRequest::try_from).collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
    ) -> AppResult<Option<AppliedTransition>> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, SupplyRequestRow>(&format!(
            r#"
            UPDATE supply_requests
            SET status = $3,
                ordered_quantity = $4,
                ordered_at = CASE WHEN $3 = 'ordered' THEN NOW() ELSE ordered_at END,
                received_at = CASE WHEN $3 = 'received' THEN NOW() ELSE received_at END,
                cancelled_at = CASE WHEN $3 = 'cancelled' THEN NOW() ELSE cancelled_at END
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(transition.ordered_quantity)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let request = SupplyRequest::try_from(row)?;

        let stock_quantity = match transition.restock_quantity.filter(|q| *q > 0) {
            Some(received) => {
                sqlx::query_scalar::<_, i64>(&format!(
                    r#"
                    UPDATE stock_items
                    SET quantity = {}, updated_at = NOW()
                    WHERE owner_id = $1 AND sku = $2
                    RETURNING quantity
                    "#,
                    SATURATING_QUANTITY
                ))
                .bind(request.owner_id)
                .bind(&request.sku)
                .bind(received)
                .fetch_optional(&mut *tx)
                .await?
            }
            None => None,
        };

        tx.commit().await?;

        Ok(Some(AppliedTransition {
            request,
            stock_quantity,
        }))
    }
}

#[async_trait]
impl RequesterDirectory for PgStore {
    async fn display_name(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT display_name FROM team_members WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(name)
    }
}
