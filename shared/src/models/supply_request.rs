//! Supply request lifecycle models
//!
//! pending -> ordered -> received, with cancellation allowed from pending or
//! ordered. `received` and `cancelled` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::validate_positive_quantity;

/// A tracked request to reorder an item externally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplyRequest {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub property_id: Uuid,
    pub sku: String,
    pub item_name: String,
    pub requested_by: Uuid,
    /// Display name of the requester, informational only
    pub requested_by_name: Option<String>,
    pub status: SupplyRequestStatus,
    /// Count observed at the property when the request was raised
    pub shortfall_count: i64,
    pub ordered_quantity: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Status of a supply request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SupplyRequestStatus {
    Pending,
    Ordered,
    Received,
    Cancelled,
}

impl SupplyRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyRequestStatus::Pending => "pending",
            SupplyRequestStatus::Ordered => "ordered",
            SupplyRequestStatus::Received => "received",
            SupplyRequestStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SupplyRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SupplyRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SupplyRequestStatus::Pending),
            "ordered" => Ok(SupplyRequestStatus::Ordered),
            "received" => Ok(SupplyRequestStatus::Received),
            "cancelled" => Ok(SupplyRequestStatus::Cancelled),
            other => Err(format!("unknown supply request status: {}", other)),
        }
    }
}

/// Fields for a request about to be inserted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSupplyRequest {
    pub owner_id: Uuid,
    pub property_id: Uuid,
    pub sku: String,
    pub item_name: String,
    pub requested_by: Uuid,
    pub requested_by_name: Option<String>,
    pub shortfall_count: i64,
}

impl NewSupplyRequest {
    /// Materialize as a pending request
    pub fn into_pending(self, now: DateTime<Utc>) -> SupplyRequest {
        SupplyRequest {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            property_id: self.property_id,
            sku: self.sku,
            item_name: self.item_name,
            requested_by: self.requested_by,
            requested_by_name: self.requested_by_name,
            status: SupplyRequestStatus::Pending,
            shortfall_count: self.shortfall_count,
            ordered_quantity: None,
            created_at: now,
            ordered_at: None,
            received_at: None,
            cancelled_at: None,
        }
    }
}

/// Lifecycle action requested by a caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SupplyRequestAction {
    Order { ordered_quantity: i64 },
    Receive,
    Cancel,
}

/// A validated state change, ready to be applied conditionally on `from`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SupplyRequestStatus,
    pub to: SupplyRequestStatus,
    /// Set when entering `ordered`
    pub ordered_quantity: Option<i64>,
    /// Units to add back to the warehouse when entering `received`
    pub restock_quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("ordered quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    #[error("cannot {action} a request that is {status}")]
    NotAllowed {
        action: &'static str,
        status: SupplyRequestStatus,
    },
}

impl SupplyRequestAction {
    pub fn name(&self) -> &'static str {
        match self {
            SupplyRequestAction::Order { .. } => "order",
            SupplyRequestAction::Receive => "receive",
            SupplyRequestAction::Cancel => "cancel",
        }
    }
}

/// Validate `action` against the request's current state
pub fn plan_transition(
    request: &SupplyRequest,
    action: SupplyRequestAction,
) -> Result<Transition, TransitionError> {
    use SupplyRequestStatus::*;

    let not_allowed = TransitionError::NotAllowed {
        action: action.name(),
        status: request.status,
    };

    match (request.status, action) {
        (Pending, SupplyRequestAction::Order { ordered_quantity }) => {
            validate_positive_quantity(ordered_quantity)
                .map_err(|_| TransitionError::NonPositiveQuantity(ordered_quantity))?;
            Ok(Transition {
                from: Pending,
                to: Ordered,
                ordered_quantity: Some(ordered_quantity),
                restock_quantity: None,
            })
        }
        (Ordered, SupplyRequestAction::Receive) => Ok(Transition {
            from: Ordered,
            to: Received,
            ordered_quantity: request.ordered_quantity,
            restock_quantity: Some(request.ordered_quantity.unwrap_or(0)),
        }),
        (Pending | Ordered, SupplyRequestAction::Cancel) => Ok(Transition {
            from: request.status,
            to: Cancelled,
            ordered_quantity: request.ordered_quantity,
            restock_quantity: None,
        }),
        _ => Err(not_allowed),
    }
}

impl SupplyRequest {
    /// Apply an already validated transition in memory
    pub fn apply(&mut self, transition: &Transition, now: DateTime<Utc>) {
        self.status = transition.to;
        self.ordered_quantity = transition.ordered_quantity;
        match transition.to {
            SupplyRequestStatus::Ordered => self.ordered_at = Some(now),
            SupplyRequestStatus::Received => self.received_at = Some(now),
            SupplyRequestStatus::Cancelled => self.cancelled_at = Some(now),
            SupplyRequestStatus::Pending => {}
        }
    }
}
