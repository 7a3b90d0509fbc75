//! Stock ledger models: warehouse items, consumption history and low-stock rules

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Days of consumption history retained per item
pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 90;

/// A supply item held in an operator's central warehouse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Unique within the owner scope
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    /// Par level for the warehouse at full capacity
    pub target_level: i64,
    /// `quantity <= alert_threshold` raises a low-stock signal
    pub alert_threshold: i64,
    pub cost_per_unit: Option<Decimal>,
    /// Append order, pruned to the retention window
    pub consumption_history: Vec<ConsumptionEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single consumption event (units released from the warehouse)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumptionEvent {
    pub date: DateTime<Utc>,
    pub amount_used: i64,
}

/// Input for creating a stock item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewStockItem {
    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i64,
    #[validate(range(min = 0, message = "Target level cannot be negative"))]
    pub target_level: i64,
    #[validate(range(min = 0, message = "Alert threshold cannot be negative"))]
    pub alert_threshold: i64,
    pub cost_per_unit: Option<Decimal>,
}

/// Result of an atomic quantity adjustment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Adjustment {
    /// Quantity the adjustment was applied to
    pub quantity_before: i64,
    /// Item state after the adjustment
    pub item: StockItem,
}

impl Adjustment {
    /// Units actually removed from the warehouse (0 for increments)
    pub fn removed(&self) -> i64 {
        (self.quantity_before - self.item.quantity).max(0)
    }

    /// Units actually added to the warehouse (0 for decrements)
    pub fn added(&self) -> i64 {
        (self.item.quantity - self.quantity_before).max(0)
    }
}

/// Aggregated consumption over the retained history window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionSummary {
    pub sku: String,
    pub window_days: i64,
    pub event_count: usize,
    pub total_used: i64,
    pub average_daily_usage: Decimal,
    pub last_consumed_at: Option<DateTime<Utc>>,
}

/// Apply a delta to a quantity, clamping the result at zero
pub fn clamp_quantity(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

/// Drop history entries dated before `now - window_days`
pub fn prune_history(history: &mut Vec<ConsumptionEvent>, now: DateTime<Utc>, window_days: i64) {
    let cutoff = now - Duration::days(window_days);
    history.retain(|event| event.date >= cutoff);
}

/// Summarize the retained history of an item as of `now`
pub fn summarize_consumption(
    sku: &str,
    history: &[ConsumptionEvent],
    now: DateTime<Utc>,
    window_days: i64,
) -> ConsumptionSummary {
    let cutoff = now - Duration::days(window_days);
    let in_window: Vec<&ConsumptionEvent> =
        history.iter().filter(|e| e.date >= cutoff).collect();

    let total_used: i64 = in_window.iter().map(|e| e.amount_used).sum();
    let average_daily_usage = if window_days > 0 {
        (Decimal::from(total_used) / Decimal::from(window_days)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    ConsumptionSummary {
        sku: sku.to_string(),
        window_days,
        event_count: in_window.len(),
        total_used,
        average_daily_usage,
        last_consumed_at: in_window.iter().map(|e| e.date).max(),
    }
}

impl StockItem {
    /// Build a new item for an owner from validated input
    pub fn from_input(owner_id: Uuid, input: NewStockItem, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            sku: input.sku,
            name: input.name,
            quantity: input.quantity.max(0),
            target_level: input.target_level,
            alert_threshold: input.alert_threshold,
            cost_per_unit: input.cost_per_unit,
            consumption_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_low(&self) -> bool {
        is_low(self.quantity, self.alert_threshold)
    }

    /// Apply `delta` with clamping and return the adjustment record
    pub fn adjust(&mut self, delta: i64, now: DateTime<Utc>) -> Adjustment {
        let quantity_before = self.quantity;
        self.quantity = clamp_quantity(self.quantity, delta);
        self.updated_at = now;
        Adjustment {
            quantity_before,
            item: self.clone(),
        }
    }

    /// Append a consumption event, then prune relative to the event date
    pub fn record_consumption(&mut self, event: ConsumptionEvent, window_days: i64) {
        self.consumption_history.push(event);
        prune_history(&mut self.consumption_history, event.date, window_days);
    }
}

/// Low-stock rule shared by the ledger and the client preview
pub fn is_low(quantity: i64, alert_threshold: i64) -> bool {
    quantity <= alert_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn item(quantity: i64, alert_threshold: i64) -> StockItem {
        let now = Utc::now();
        StockItem::from_input(
            Uuid::new_v4(),
            NewStockItem {
                sku: "TP".to_string(),
                name: "Toilet paper".to_string(),
                quantity,
                target_level: 40,
                alert_threshold,
                cost_per_unit: None,
            },
            now,
        )
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::days(day as i64)
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(8, -5), 3);
        assert_eq!(clamp_quantity(3, -5), 0);
        assert_eq!(clamp_quantity(0, 7), 7);
        assert_eq!(clamp_quantity(i64::MIN + 1, -10), 0);
    }

    #[test]
    fn test_is_low_inclusive() {
        assert!(item(5, 5).is_low());
        assert!(item(4, 5).is_low());
        assert!(!item(6, 5).is_low());
    }

    #[test]
    fn test_adjust_reports_moved_units() {
        let mut stock = item(8, 2);
        let adj = stock.adjust(-10, Utc::now());
        assert_eq!(adj.quantity_before, 8);
        assert_eq!(adj.item.quantity, 0);
        assert_eq!(adj.removed(), 8);
        assert_eq!(adj.added(), 0);
    }

    #[test]
    fn test_record_consumption_prunes_old_entries() {
        let mut stock = item(10, 2);
        stock.record_consumption(ConsumptionEvent { date: at(0), amount_used: 3 }, 90);
        stock.record_consumption(ConsumptionEvent { date: at(50), amount_used: 2 }, 90);
        stock.record_consumption(ConsumptionEvent { date: at(100), amount_used: 0 }, 90);

        let amounts: Vec<i64> = stock.consumption_history.iter().map(|e| e.amount_used).collect();
        assert_eq!(amounts, vec![2, 0]);
    }

    #[test]
    fn test_record_consumption_keeps_append_order() {
        let mut stock = item(10, 2);
        stock.record_consumption(ConsumptionEvent { date: at(10), amount_used: 1 }, 90);
        stock.record_consumption(ConsumptionEvent { date: at(5), amount_used: 2 }, 90);

        let amounts: Vec<i64> = stock.consumption_history.iter().map(|e| e.amount_used).collect();
        assert_eq!(amounts, vec![1, 2]);
    }

    #[test]
    fn test_summarize_consumption() {
        let history = vec![
            ConsumptionEvent { date: at(0), amount_used: 30 },
            ConsumptionEvent { date: at(80), amount_used: 60 },
            ConsumptionEvent { date: at(85), amount_used: 30 },
        ];
        let summary = summarize_consumption("TP", &history, at(95), 90);
        assert_eq!(summary.event_count, 2);
        assert_eq!(summary.total_used, 90);
        assert_eq!(summary.average_daily_usage, Decimal::ONE);
        assert_eq!(summary.last_consumed_at, Some(at(85)));
    }

    proptest! {
        #[test]
        fn prop_quantity_never_negative(start in 0i64..10_000, delta in -20_000i64..20_000) {
            let mut stock = item(start, 0);
            let adj = stock.adjust(delta, Utc::now());
            prop_assert!(adj.item.quantity >= 0);
            prop_assert!(adj.removed() <= start);
        }

        #[test]
        fn prop_history_within_window(days in prop::collection::vec(0u32..400, 1..30)) {
            let mut stock = item(0, 0);
            for day in days {
                let when = at(day);
                stock.record_consumption(ConsumptionEvent { date: when, amount_used: 1 }, 90);
                let cutoff = when - Duration::days(90);
                prop_assert!(stock.consumption_history.iter().all(|e| e.date >= cutoff));
            }
        }
    }
}
