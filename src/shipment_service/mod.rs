//! Shipment-side logic: the new-order consumer.

pub mod error;
pub mod handler;

pub use error::*;
pub use handler::NewOrderHandler;
