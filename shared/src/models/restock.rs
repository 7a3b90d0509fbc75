//! Restock reconciliation: per-item outcomes and the pure arithmetic behind
//! both fulfillment modes.
//!
//! Mode A (cascade) starts from a count observed at the property and draws
//! only the deficit. Mode B (top-off) assumes the property is empty and draws
//! the full required level.

use serde::{Deserialize, Serialize};

use super::{RequiredItem, SupplyRequest};

/// A count observed on site by field staff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservedCount {
    pub sku: String,
    pub observed_count: i64,
}

/// An item field staff flagged as running low
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlaggedItem {
    pub sku: String,
    pub name: String,
}

/// A field report submitted for a property
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldReport {
    #[serde(default)]
    pub observed_counts: Vec<ObservedCount>,
    #[serde(default)]
    pub flagged_low_items: Vec<FlaggedItem>,
}

/// Deficit between the required level and the observed count
pub fn needed_for(required_level: i64, observed_count: i64) -> i64 {
    (required_level - observed_count).max(0)
}

/// Units a top-off can move given what the warehouse holds
pub fn top_off_amount(required_level: i64, available: i64) -> i64 {
    required_level.min(available).max(0)
}

/// Pair each profile requirement with its observed count, in profile order.
/// Report entries without a requirement and requirements without a report
/// entry are both left out.
pub fn pair_report_with_profile<'a>(
    requirements: &'a [RequiredItem],
    observed: &[ObservedCount],
) -> Vec<(&'a RequiredItem, i64)> {
    requirements
        .iter()
        .filter_map(|req| {
            observed
                .iter()
                .find(|o| o.sku == req.sku)
                .map(|o| (req, o.observed_count))
        })
        .collect()
}

// ============================================================================
// Mode A: observed-count cascade
// ============================================================================

/// The numbers of one cascade line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CascadeFigures {
    pub needed: i64,
    pub fulfilled: i64,
    pub shortage: bool,
    pub new_quantity: i64,
    pub low_stock_alert: bool,
}

impl CascadeFigures {
    /// Predict a cascade line from a stock snapshot
    pub fn project(
        required_level: i64,
        observed_count: i64,
        available: i64,
        alert_threshold: i64,
    ) -> Self {
        let available = available.max(0);
        let needed = needed_for(required_level, observed_count);
        if needed == 0 {
            return Self::nothing_needed(available);
        }
        let fulfilled = needed.min(available);
        Self::settle(needed, fulfilled, available - fulfilled, alert_threshold)
    }

    /// Figures once the ledger has released `fulfilled` units
    pub fn settle(needed: i64, fulfilled: i64, new_quantity: i64, alert_threshold: i64) -> Self {
        Self {
            needed,
            fulfilled,
            shortage: fulfilled < needed,
            new_quantity,
            low_stock_alert: super::is_low(new_quantity, alert_threshold),
        }
    }

    /// No deficit: no mutation and therefore no threshold crossing
    pub fn nothing_needed(quantity: i64) -> Self {
        Self {
            needed: 0,
            fulfilled: 0,
            shortage: false,
            new_quantity: quantity,
            low_stock_alert: false,
        }
    }
}

/// Result record for one item of a field report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CascadeLine {
    pub sku: String,
    pub item_name: String,
    pub observed_count: i64,
    pub required_level: i64,
    #[serde(flatten)]
    pub figures: CascadeFigures,
}

/// A requirement whose SKU has no stock item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnknownCascadeItem {
    pub sku: String,
    pub observed_count: i64,
    pub required_level: i64,
    pub needed: i64,
}

/// Per-item outcome of a field report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CascadeOutcome {
    Fulfilled(CascadeLine),
    InsufficientStock(CascadeLine),
    UnknownItem(UnknownCascadeItem),
}

impl CascadeOutcome {
    pub fn from_line(line: CascadeLine) -> Self {
        if line.figures.shortage {
            CascadeOutcome::InsufficientStock(line)
        } else {
            CascadeOutcome::Fulfilled(line)
        }
    }

    pub fn sku(&self) -> &str {
        match self {
            CascadeOutcome::Fulfilled(line) | CascadeOutcome::InsufficientStock(line) => &line.sku,
            CascadeOutcome::UnknownItem(item) => &item.sku,
        }
    }

    pub fn line(&self) -> Option<&CascadeLine> {
        match self {
            CascadeOutcome::Fulfilled(line) | CascadeOutcome::InsufficientStock(line) => Some(line),
            CascadeOutcome::UnknownItem(_) => None,
        }
    }

    pub fn is_shortage(&self) -> bool {
        matches!(self, CascadeOutcome::InsufficientStock(_))
    }

    pub fn low_stock_alert(&self) -> bool {
        self.line().map(|l| l.figures.low_stock_alert).unwrap_or(false)
    }
}

/// Batch result of a submitted field report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReportResult {
    pub per_item_results: Vec<CascadeOutcome>,
    pub has_shortages: bool,
    pub has_low_stock_alerts: bool,
    pub supply_requests_created: Vec<SupplyRequest>,
    /// SKUs whose request was suppressed because one is already pending
    pub supply_requests_skipped: Vec<String>,
}

impl FieldReportResult {
    pub fn new(per_item_results: Vec<CascadeOutcome>) -> Self {
        let has_shortages = per_item_results.iter().any(CascadeOutcome::is_shortage);
        let has_low_stock_alerts = per_item_results.iter().any(CascadeOutcome::low_stock_alert);
        Self {
            per_item_results,
            has_shortages,
            has_low_stock_alerts,
            supply_requests_created: Vec::new(),
            supply_requests_skipped: Vec::new(),
        }
    }
}

// ============================================================================
// Mode B: direct top-off
// ============================================================================

/// Result record for one item of a top-off
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopOffLine {
    pub sku: String,
    pub item_name: Option<String>,
    pub requested: i64,
    pub fulfilled: i64,
    /// Warehouse quantity left after the move
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TopOffOutcome {
    Fulfilled(TopOffLine),
    InsufficientStock(TopOffLine),
    UnknownItem(TopOffLine),
}

impl TopOffOutcome {
    pub fn moved(sku: &str, item_name: &str, requested: i64, fulfilled: i64, remaining: i64) -> Self {
        let line = TopOffLine {
            sku: sku.to_string(),
            item_name: Some(item_name.to_string()),
            requested,
            fulfilled,
            remaining,
        };
        if fulfilled < requested {
            TopOffOutcome::InsufficientStock(line)
        } else {
            TopOffOutcome::Fulfilled(line)
        }
    }

    pub fn unknown(sku: &str, requested: i64) -> Self {
        TopOffOutcome::UnknownItem(TopOffLine {
            sku: sku.to_string(),
            item_name: None,
            requested,
            fulfilled: 0,
            remaining: 0,
        })
    }

    pub fn line(&self) -> &TopOffLine {
        match self {
            TopOffOutcome::Fulfilled(line)
            | TopOffOutcome::InsufficientStock(line)
            | TopOffOutcome::UnknownItem(line) => line,
        }
    }
}

/// Batch result of a top-off, with totals across all items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopOffSummary {
    pub per_item_results: Vec<TopOffOutcome>,
    pub total_requested: i64,
    pub total_fulfilled: i64,
}

impl TopOffSummary {
    pub fn from_outcomes(per_item_results: Vec<TopOffOutcome>) -> Self {
        let total_requested = per_item_results.iter().map(|o| o.line().requested).sum();
        let total_fulfilled = per_item_results.iter().map(|o| o.line().fulfilled).sum();
        Self {
            per_item_results,
            total_requested,
            total_fulfilled,
        }
    }
}
