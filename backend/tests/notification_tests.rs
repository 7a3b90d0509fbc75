//! Notification tests
//!
//! Tests for notice formatting and the logging notifier:
//! - Every notice appears in the formatted message
//! - The logging notifier never fails

use proptest::prelude::*;
use restock_backend::services::notification::{
    low_stock_message, shortage_message, LowStockNotice, ShortageNotice,
};
use restock_backend::services::{Notifier, TracingNotifier};
use uuid::Uuid;

fn low(sku: &str, current_quantity: i64) -> LowStockNotice {
    LowStockNotice {
        name: format!("{} item", sku),
        sku: sku.to_string(),
        current_quantity,
        alert_threshold: 5,
        required_level: 12,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_low_stock_message_names_property() {
        let text = low_stock_message("Seaside Villa", &[low("TP", 2)]);
        assert!(text.contains("Seaside Villa"));
        assert!(text.contains("TP item (TP): 2 left, alert at 5"));
    }

    #[test]
    fn test_shortage_message_shows_needed_and_sent() {
        let text = shortage_message(
            "Seaside Villa",
            &[ShortageNotice {
                name: "Soap".to_string(),
                sku: "SOAP".to_string(),
                needed: 18,
                available: 10,
            }],
        );
        assert!(text.contains("needed 18, sent 10"));
    }

    #[tokio::test]
    async fn test_tracing_notifier_accepts_batches() {
        let notifier = TracingNotifier;
        let owner = Uuid::new_v4();
        assert!(notifier
            .notify_low_stock(owner, "Seaside Villa", &[low("TP", 1), low("SOAP", 0)])
            .await
            .is_ok());
        assert!(notifier.notify_shortage(owner, "Seaside Villa", &[]).await.is_ok());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn sku_strategy() -> impl Strategy<Value = String> {
        "[A-Z]{2,8}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// One line per notice after the heading
        #[test]
        fn prop_message_lists_every_notice(
            items in prop::collection::vec((sku_strategy(), 0i64..100), 0..10)
        ) {
            let notices: Vec<LowStockNotice> =
                items.iter().map(|(sku, qty)| low(sku, *qty)).collect();
            let text = low_stock_message("Cabin", &notices);

            prop_assert_eq!(text.lines().count(), notices.len() + 1);
            for notice in &notices {
                let expected = format!("({})", notice.sku);
                prop_assert!(text.contains(&expected));
            }
        }
    }
}
