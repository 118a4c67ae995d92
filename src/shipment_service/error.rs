//! Error types for the Shipment service.

use crate::model::ShipmentId;
use sync_framework::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("Shipment not found: {0}")]
    NotFound(ShipmentId),

    #[error("Shipment validation error: {0}")]
    ValidationError(String),

    #[error("Shipment pipeline error: {0}")]
    Pipeline(#[from] SyncError),
}
