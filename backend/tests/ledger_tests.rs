//! Stock ledger tests
//!
//! Tests for the warehouse ledger including:
//! - Quantities never go negative and adjustments clamp at zero
//! - Unknown SKUs surface as ItemNotFound
//! - Consumption history stays inside the retention window
//! - Concurrent adjustments never lose an update

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::Harness;
use proptest::prelude::*;
use restock_backend::AppError;
use rust_decimal::Decimal;
use shared::NewStockItem;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_adjust_adds_and_removes() {
        let h = Harness::new();
        h.seed_item("SOAP", 10, 2).await;

        let removed = h.state.ledger.adjust(h.owner_id, "SOAP", -4).await.unwrap();
        assert_eq!(removed.quantity_before, 10);
        assert_eq!(removed.item.quantity, 6);
        assert_eq!(removed.removed(), 4);

        let added = h.state.ledger.adjust(h.owner_id, "SOAP", 5).await.unwrap();
        assert_eq!(added.added(), 5);
        assert_eq!(h.quantity("SOAP").await, 11);
    }

    #[tokio::test]
    async fn test_adjust_clamps_at_zero() {
        let h = Harness::new();
        h.seed_item("SOAP", 3, 1).await;

        let adjustment = h.state.ledger.adjust(h.owner_id, "SOAP", -10).await.unwrap();
        assert_eq!(adjustment.item.quantity, 0);
        assert_eq!(adjustment.removed(), 3);

        // Draining an empty item stays at zero
        let again = h.state.ledger.adjust(h.owner_id, "SOAP", -1).await.unwrap();
        assert_eq!(again.item.quantity, 0);
        assert_eq!(again.removed(), 0);
    }

    #[tokio::test]
    async fn test_extreme_deltas_saturate() {
        let h = Harness::new();
        h.seed_item("SOAP", 5, 1).await;

        let drained = h.state.ledger.adjust(h.owner_id, "SOAP", i64::MIN).await.unwrap();
        assert_eq!(drained.item.quantity, 0);
        assert_eq!(drained.removed(), 5);

        h.state.ledger.adjust(h.owner_id, "SOAP", 5).await.unwrap();
        let filled = h.state.ledger.adjust(h.owner_id, "SOAP", i64::MAX).await.unwrap();
        assert_eq!(filled.item.quantity, i64::MAX);
    }

    #[tokio::test]
    async fn test_adjust_unknown_sku_is_item_not_found() {
        let h = Harness::new();
        let err = h.state.ledger.adjust(h.owner_id, "NOPE", -1).await.unwrap_err();
        assert!(matches!(err, AppError::ItemNotFound(sku) if sku == "NOPE"));
    }

    #[tokio::test]
    async fn test_get_unknown_sku_is_absent() {
        let h = Harness::new();
        assert!(h.state.ledger.get(h.owner_id, "NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_items_are_owner_scoped() {
        let h = Harness::new();
        h.seed_item("SOAP", 3, 1).await;

        let other_owner = uuid::Uuid::new_v4();
        assert!(h.state.ledger.get(other_owner, "SOAP").await.unwrap().is_none());
        assert!(h.state.ledger.list_items(other_owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let h = Harness::new();
        h.seed_item("SOAP", 3, 1).await;

        let err = h
            .state
            .ledger
            .create_item(
                h.owner_id,
                NewStockItem {
                    sku: "SOAP".to_string(),
                    name: "Soap again".to_string(),
                    quantity: 1,
                    target_level: 1,
                    alert_threshold: 0,
                    cost_per_unit: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_quantity() {
        let h = Harness::new();
        let err = h
            .state
            .ledger
            .create_item(
                h.owner_id,
                NewStockItem {
                    sku: "SOAP".to_string(),
                    name: "Soap".to_string(),
                    quantity: -1,
                    target_level: 1,
                    alert_threshold: 0,
                    cost_per_unit: Some(Decimal::new(150, 2)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_items_at_or_below_threshold() {
        let h = Harness::new();
        h.seed_item("A", 5, 5).await;
        h.seed_item("B", 6, 5).await;
        h.seed_item("C", 0, 0).await;

        let low: Vec<String> = h
            .state
            .ledger
            .low_stock_items(h.owner_id)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.sku)
            .collect();
        assert!(low.contains(&"A".to_string()));
        assert!(low.contains(&"C".to_string()));
        assert!(!low.contains(&"B".to_string()));
    }

    #[tokio::test]
    async fn test_consumption_history_pruned_to_window() {
        let h = Harness::new();
        h.seed_item("TP", 10, 2).await;
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        for day in [0, 30, 60, 95, 120] {
            h.state
                .ledger
                .record_consumption(h.owner_id, "TP", 2, start + Duration::days(day))
                .await
                .unwrap();
        }

        let item = h.state.ledger.require(h.owner_id, "TP").await.unwrap();
        let latest = start + Duration::days(120);
        assert!(item
            .consumption_history
            .iter()
            .all(|e| e.date >= latest - Duration::days(90)));
        // Day 0 is dropped; day 30 sits exactly on the window edge
        assert_eq!(item.consumption_history.len(), 4);
        assert_eq!(item.consumption_history.last().unwrap().date, latest);
    }

    #[tokio::test]
    async fn test_negative_consumption_rejected() {
        let h = Harness::new();
        h.seed_item("TP", 10, 2).await;
        let err = h
            .state
            .ledger
            .record_consumption(h.owner_id, "TP", -1, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_consumption_for_unknown_sku() {
        let h = Harness::new();
        let err = h
            .state
            .ledger
            .record_consumption(h.owner_id, "NOPE", 1, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_consumption_summary_totals_window() {
        let h = Harness::new();
        h.seed_item("TP", 10, 2).await;
        let now = Utc::now();
        for (days_ago, amount) in [(80, 4), (10, 6), (1, 2)] {
            h.state
                .ledger
                .record_consumption(h.owner_id, "TP", amount, now - Duration::days(days_ago))
                .await
                .unwrap();
        }

        let summary = h
            .state
            .ledger
            .consumption_summary(h.owner_id, "TP", now)
            .await
            .unwrap();
        assert_eq!(summary.event_count, 3);
        assert_eq!(summary.total_used, 12);
        assert_eq!(summary.window_days, 90);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let h = Harness::new();
        h.seed_item("TP", 10, 2).await;
        h.store.set_unavailable(true);

        let err = h.state.ledger.adjust(h.owner_id, "TP", -1).await.unwrap_err();
        assert!(err.is_storage_failure());
        assert!(!h.state.ledger.storage_healthy().await);

        h.store.set_unavailable(false);
        assert_eq!(h.quantity("TP").await, 10);
    }

    /// Two restocks draw 5 each from 8 units: one gets 5, the other 3
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_draws_never_oversubscribe() {
        let h = Harness::new();
        h.seed_item("TP", 8, 0).await;

        let a = {
            let ledger = h.state.ledger.clone();
            let owner = h.owner_id;
            tokio::spawn(async move { ledger.adjust(owner, "TP", -5).await })
        };
        let b = {
            let ledger = h.state.ledger.clone();
            let owner = h.owner_id;
            tokio::spawn(async move { ledger.adjust(owner, "TP", -5).await })
        };

        let first = a.await.unwrap().unwrap().removed();
        let second = b.await.unwrap().unwrap().removed();

        let mut removed = [first, second];
        removed.sort();
        assert_eq!(removed, [3, 5]);
        assert_eq!(h.quantity("TP").await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_adjustments_all_applied() {
        let h = Harness::new();
        h.seed_item("TP", 1000, 0).await;

        let mut handles = Vec::new();
        for i in 0..50 {
            let ledger = h.state.ledger.clone();
            let owner = h.owner_id;
            let delta = if i % 2 == 0 { -7 } else { 3 };
            handles.push(tokio::spawn(async move { ledger.adjust(owner, "TP", delta).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 25 draws of 7 and 25 additions of 3, never reaching zero
        assert_eq!(h.quantity("TP").await, 1000 - 25 * 7 + 25 * 3);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Any sequence of adjustments leaves a non-negative quantity equal
        /// to the clamped running sum
        #[test]
        fn prop_adjustments_never_negative(
            start in 0i64..500,
            deltas in prop::collection::vec(-200i64..200, 1..30)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let h = Harness::new();
                h.seed_item("X", start, 0).await;

                let mut expected = start;
                for delta in &deltas {
                    let adjustment = h.state.ledger.adjust(h.owner_id, "X", *delta).await.unwrap();
                    expected = (expected + delta).max(0);
                    assert!(adjustment.item.quantity >= 0);
                    assert_eq!(adjustment.item.quantity, expected);
                }
            });
        }
    }
}
