//! Order-side logic: the shipment-status consumer and the status rule it applies.

pub mod error;
pub mod handler;
pub mod status;

pub use error::*;
pub use handler::ShipmentStatusHandler;
pub use status::order_status_for;
