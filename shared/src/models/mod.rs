//! Domain models for the supply restock platform

mod property;
mod restock;
mod stock;
mod supply_request;

pub use property::*;
pub use restock::*;
pub use stock::*;
pub use supply_request::*;
