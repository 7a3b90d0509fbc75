//! WebAssembly module for the field checklist client
//!
//! Lets field staff preview what a report will do before submitting it:
//! - Deficit and top-off arithmetic
//! - Shortage and low-stock prediction for a cascade line
//! - Offline validation of field reports and requirement lists

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Units a cascade would draw for one item
#[wasm_bindgen]
pub fn needed_units(required_level: i64, observed_count: i64) -> i64 {
    needed_for(required_level, observed_count)
}

/// Units a top-off would move for one item
#[wasm_bindgen]
pub fn top_off_units(required_level: i64, available: i64) -> i64 {
    top_off_amount(required_level, available)
}

/// Whether a quantity sits at or below its alert threshold
#[wasm_bindgen]
pub fn is_low_stock(quantity: i64, alert_threshold: i64) -> bool {
    is_low(quantity, alert_threshold)
}

/// Predict one cascade line from the last known warehouse quantity.
/// Returns the figures as JSON.
#[wasm_bindgen]
pub fn preview_cascade_item(
    required_level: i64,
    observed_count: i64,
    available: i64,
    alert_threshold: i64,
) -> Result<String, JsValue> {
    let figures =
        CascadeFigures::project(required_level, observed_count, available, alert_threshold);
    serde_json::to_string(&figures)
        .map_err(|e| JsValue::from_str(&format!("Failed to encode preview: {}", e)))
}

/// Validate a field report before it is queued for submission
#[wasm_bindgen]
pub fn validate_field_report_json(report_json: &str) -> Result<(), JsValue> {
    let report: FieldReport = serde_json::from_str(report_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid report JSON: {}", e)))?;
    validate_field_report(&report).map_err(JsValue::from_str)
}

/// Validate a requirement list edited offline
#[wasm_bindgen]
pub fn validate_requirements_json(requirements_json: &str) -> Result<(), JsValue> {
    let requirements: Vec<RequiredItem> = serde_json::from_str(requirements_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid requirements JSON: {}", e)))?;
    validate_requirements(&requirements).map_err(JsValue::from_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needed_units() {
        assert_eq!(needed_units(10, 6), 4);
        assert_eq!(needed_units(10, 12), 0);
        assert_eq!(needed_units(0, 0), 0);
    }

    #[test]
    fn test_top_off_units() {
        assert_eq!(top_off_units(10, 50), 10);
        assert_eq!(top_off_units(10, 3), 3);
        assert_eq!(top_off_units(10, 0), 0);
    }

    #[test]
    fn test_is_low_stock() {
        assert!(is_low_stock(5, 5));
        assert!(!is_low_stock(6, 5));
    }

    #[test]
    fn test_preview_cascade_item_shortage() {
        let json = preview_cascade_item(10, 2, 5, 3).unwrap();
        let figures: CascadeFigures = serde_json::from_str(&json).unwrap();
        assert_eq!(figures.needed, 8);
        assert_eq!(figures.fulfilled, 5);
        assert!(figures.shortage);
        assert_eq!(figures.new_quantity, 0);
        assert!(figures.low_stock_alert);
    }

    #[test]
    fn test_preview_cascade_item_nothing_needed() {
        let json = preview_cascade_item(4, 4, 1, 3).unwrap();
        let figures: CascadeFigures = serde_json::from_str(&json).unwrap();
        assert_eq!(figures.needed, 0);
        assert!(!figures.shortage);
        assert!(!figures.low_stock_alert);
    }
}
