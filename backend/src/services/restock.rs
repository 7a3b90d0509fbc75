//! Restock engine: reconciles property requirements against warehouse stock
//!
//! Two entry points:
//! - `submit_field_report` (cascade): draws only the deficit between the
//!   required level and the count observed on site
//! - `restock_property_to_target` (top-off): draws the full required level
//!
//! Items are processed independently. A shortage or an unknown SKU is a
//! per-item outcome, never an error. Each draw is a single atomic ledger
//! adjustment, and `fulfilled` is what that adjustment actually removed.

use chrono::{DateTime, Utc};
use shared::{
    needed_for, pair_report_with_profile, top_off_amount, validate_field_report, CascadeFigures,
    CascadeLine, CascadeOutcome, FieldReport, FieldReportResult, NewSupplyRequest,
    PropertyProfile, RequiredItem, TopOffOutcome, TopOffSummary, UnknownCascadeItem,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RestockConfig;
use crate::error::{AppError, AppResult};
use crate::services::notification::{LowStockNotice, Notifier, ShortageNotice};
use crate::services::supply_request::FlagOutcome;
use crate::services::{LedgerService, SupplyRequestService};
use crate::store::PropertyStore;

/// Restock engine with its collaborators injected
#[derive(Clone)]
pub struct RestockEngine {
    ledger: LedgerService,
    properties: Arc<dyn PropertyStore>,
    supply_requests: SupplyRequestService,
    notifier: Arc<dyn Notifier>,
    policy: RestockConfig,
}

/// Notices gathered while processing a batch
#[derive(Default)]
struct Notices {
    low_stock: Vec<LowStockNotice>,
    shortages: Vec<ShortageNotice>,
}

/// Keeps the first structural failure while the rest of the batch proceeds
#[derive(Default)]
struct FirstError(Option<AppError>);

impl FirstError {
    fn record(&mut self, sku: &str, err: AppError) {
        tracing::error!(sku = %sku, "Restock item failed: {}", err);
        if self.0.is_none() {
            self.0 = Some(err);
        }
    }

    fn into_result<T>(self, value: T) -> AppResult<T> {
        match self.0 {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }
}

impl RestockEngine {
    /// Create a new RestockEngine instance
    pub fn new(
        ledger: LedgerService,
        properties: Arc<dyn PropertyStore>,
        supply_requests: SupplyRequestService,
        notifier: Arc<dyn Notifier>,
        policy: RestockConfig,
    ) -> Self {
        Self {
            ledger,
            properties,
            supply_requests,
            notifier,
            policy,
        }
    }

    async fn load_profile(&self, owner_id: Uuid, property_id: Uuid) -> AppResult<PropertyProfile> {
        self.properties
            .profile(owner_id, property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property".to_string()))
    }

    // ========================================================================
    // Observed-count cascade
    // ========================================================================

    /// Reconcile a field report against the property's profile
    #[tracing::instrument(skip(self, report))]
    pub async fn submit_field_report(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
        reported_by: Uuid,
        report: FieldReport,
    ) -> AppResult<FieldReportResult> {
        validate_field_report(&report).map_err(|msg| AppError::validation("observed_counts", msg))?;
        let profile = self.load_profile(owner_id, property_id).await?;
        let now = Utc::now();

        let mut errors = FirstError::default();
        let mut notices = Notices::default();
        let mut outcomes = Vec::new();

        for (required, observed_count) in
            pair_report_with_profile(&profile.requirements, &report.observed_counts)
        {
            match self
                .cascade_item(owner_id, required, observed_count, now, &mut notices)
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => errors.record(&required.sku, e),
            }
        }

        let mut result = FieldReportResult::new(outcomes);

        self.dispatch_notices(owner_id, &profile.name, &notices).await;

        // Shortages first, then items flagged on site; one request per SKU
        let mut to_flag: Vec<(String, String)> = Vec::new();
        for line in result
            .per_item_results
            .iter()
            .filter(|o| o.is_shortage())
            .filter_map(CascadeOutcome::line)
        {
            to_flag.push((line.sku.clone(), line.item_name.clone()));
        }
        for flagged in &report.flagged_low_items {
            if !to_flag.iter().any(|(sku, _)| *sku == flagged.sku) {
                to_flag.push((flagged.sku.clone(), flagged.name.clone()));
            }
        }

        if !to_flag.is_empty() {
            let requested_by_name = self.supply_requests.resolve_requester(reported_by).await;
            for (sku, item_name) in to_flag {
                let shortfall_count = report
                    .observed_counts
                    .iter()
                    .find(|o| o.sku == sku)
                    .map(|o| o.observed_count)
                    .unwrap_or(0);

                let request = NewSupplyRequest {
                    owner_id,
                    property_id,
                    sku: sku.clone(),
                    item_name,
                    requested_by: reported_by,
                    requested_by_name: requested_by_name.clone(),
                    shortfall_count,
                };
                match self.supply_requests.flag_item(request).await {
                    Ok(FlagOutcome::Created(created)) => result.supply_requests_created.push(created),
                    Ok(FlagOutcome::AlreadyPending) => result.supply_requests_skipped.push(sku),
                    Err(e) => errors.record(&sku, e),
                }
            }
        }

        tracing::info!(
            property = %profile.name,
            items = result.per_item_results.len(),
            has_shortages = result.has_shortages,
            has_low_stock_alerts = result.has_low_stock_alerts,
            requests_created = result.supply_requests_created.len(),
            "Field report reconciled"
        );

        errors.into_result(result)
    }

    async fn cascade_item(
        &self,
        owner_id: Uuid,
        required: &RequiredItem,
        observed_count: i64,
        now: DateTime<Utc>,
        notices: &mut Notices,
    ) -> AppResult<CascadeOutcome> {
        let needed = needed_for(required.required_level, observed_count);
        let unknown = || {
            tracing::debug!(sku = %required.sku, "No stock item for required SKU, skipping");
            CascadeOutcome::UnknownItem(UnknownCascadeItem {
                sku: required.sku.clone(),
                observed_count,
                required_level: required.required_level,
                needed,
            })
        };

        let Some(item) = self.ledger.get(owner_id, &required.sku).await? else {
            return Ok(unknown());
        };

        if needed == 0 {
            if self.policy.record_zero_consumption {
                self.ledger
                    .record_consumption(owner_id, &item.sku, 0, now)
                    .await?;
            }
            return Ok(CascadeOutcome::from_line(CascadeLine {
                sku: item.sku,
                item_name: item.name,
                observed_count,
                required_level: required.required_level,
                figures: CascadeFigures::nothing_needed(item.quantity),
            }));
        }

        let adjustment = match self.ledger.adjust(owner_id, &item.sku, -needed).await {
            Ok(adjustment) => adjustment,
            Err(AppError::ItemNotFound(_)) => return Ok(unknown()),
            Err(e) => return Err(e),
        };
        let fulfilled = adjustment.removed();
        self.ledger
            .record_consumption(owner_id, &item.sku, fulfilled, now)
            .await?;

        let after = adjustment.item;
        let figures =
            CascadeFigures::settle(needed, fulfilled, after.quantity, after.alert_threshold);

        tracing::debug!(
            sku = %after.sku,
            needed,
            fulfilled,
            new_quantity = after.quantity,
            "Cascade item settled"
        );

        if figures.low_stock_alert {
            notices.low_stock.push(LowStockNotice {
                name: after.name.clone(),
                sku: after.sku.clone(),
                current_quantity: after.quantity,
                alert_threshold: after.alert_threshold,
                required_level: required.required_level,
            });
        }
        if figures.shortage {
            notices.shortages.push(ShortageNotice {
                name: after.name.clone(),
                sku: after.sku.clone(),
                needed,
                available: fulfilled,
            });
        }

        Ok(CascadeOutcome::from_line(CascadeLine {
            sku: after.sku,
            item_name: after.name,
            observed_count,
            required_level: required.required_level,
            figures,
        }))
    }

    // ========================================================================
    // Direct top-off
    // ========================================================================

    /// Move each required level from the warehouse, assuming the property is empty
    #[tracing::instrument(skip(self))]
    pub async fn restock_property_to_target(
        &self,
        owner_id: Uuid,
        property_id: Uuid,
    ) -> AppResult<TopOffSummary> {
        let profile = self.load_profile(owner_id, property_id).await?;
        let now = Utc::now();

        let mut errors = FirstError::default();
        let mut notices = Notices::default();
        let mut outcomes = Vec::with_capacity(profile.requirements.len());

        for required in &profile.requirements {
            match self.top_off_item(owner_id, required, now, &mut notices).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => errors.record(&required.sku, e),
            }
        }

        let summary = TopOffSummary::from_outcomes(outcomes);
        self.dispatch_notices(owner_id, &profile.name, &notices).await;

        tracing::info!(
            property = %profile.name,
            total_requested = summary.total_requested,
            total_fulfilled = summary.total_fulfilled,
            "Property topped off"
        );

        errors.into_result(summary)
    }

    async fn top_off_item(
        &self,
        owner_id: Uuid,
        required: &RequiredItem,
        now: DateTime<Utc>,
        notices: &mut Notices,
    ) -> AppResult<TopOffOutcome> {
        let Some(item) = self.ledger.get(owner_id, &required.sku).await? else {
            return Ok(TopOffOutcome::unknown(&required.sku, required.required_level));
        };

        if top_off_amount(required.required_level, item.quantity) == 0 {
            return Ok(TopOffOutcome::moved(
                &item.sku,
                &item.name,
                required.required_level,
                0,
                item.quantity,
            ));
        }

        // Draw the full requirement; the ledger clamps to what is on hand
        let adjustment = match self
            .ledger
            .adjust(owner_id, &item.sku, -required.required_level)
            .await
        {
            Ok(adjustment) => adjustment,
            Err(AppError::ItemNotFound(_)) => {
                return Ok(TopOffOutcome::unknown(&required.sku, required.required_level))
            }
            Err(e) => return Err(e),
        };

        let moved = adjustment.removed();
        if moved > 0 {
            self.ledger
                .record_consumption(owner_id, &item.sku, moved, now)
                .await?;
        }

        let after = adjustment.item;
        if moved > 0 && after.is_low() {
            notices.low_stock.push(LowStockNotice {
                name: after.name.clone(),
                sku: after.sku.clone(),
                current_quantity: after.quantity,
                alert_threshold: after.alert_threshold,
                required_level: required.required_level,
            });
        }

        Ok(TopOffOutcome::moved(
            &after.sku,
            &after.name,
            required.required_level,
            moved,
            after.quantity,
        ))
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Deliveries are bounded by `notify_timeout`; a slow or failing notifier
    /// never changes the engine's result
    async fn dispatch_notices(&self, owner_id: Uuid, property_name: &str, notices: &Notices) {
        let limit = self.policy.notify_timeout();

        if !notices.low_stock.is_empty() {
            let delivery = self
                .notifier
                .notify_low_stock(owner_id, property_name, &notices.low_stock);
            match tokio::time::timeout(limit, delivery).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(property = %property_name, "Low-stock notification failed: {}", e)
                }
                Err(_) => tracing::warn!(
                    property = %property_name,
                    timeout_ms = self.policy.notify_timeout_ms,
                    "Low-stock notification timed out"
                ),
            }
        }
        if !notices.shortages.is_empty() {
            let delivery = self
                .notifier
                .notify_shortage(owner_id, property_name, &notices.shortages);
            match tokio::time::timeout(limit, delivery).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(property = %property_name, "Shortage notification failed: {}", e)
                }
                Err(_) => tracing::warn!(
                    property = %property_name,
                    timeout_ms = self.policy.notify_timeout_ms,
                    "Shortage notification timed out"
                ),
            }
        }
    }
}
