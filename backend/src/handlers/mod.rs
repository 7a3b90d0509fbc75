//! HTTP request handlers

pub mod health;
pub mod properties;
pub mod stock_items;
pub mod supply_requests;

pub use health::health_check;
pub use properties::*;
pub use stock_items::*;
pub use supply_requests::*;
