//! Service handles used by the console and tests.

pub mod order_client;
pub mod shipment_client;

pub use order_client::*;
pub use shipment_client::*;
