//! Business logic services for the supply restock platform

pub mod ledger;
pub mod notification;
pub mod property;
pub mod restock;
pub mod supply_request;

pub use ledger::LedgerService;
pub use notification::{LineNotifier, Notifier, TracingNotifier};
pub use property::PropertyService;
pub use restock::RestockEngine;
pub use supply_request::SupplyRequestService;
