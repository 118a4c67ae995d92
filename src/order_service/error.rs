//! Error types for the Order service.

use sync_framework::SyncError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// The pipeline could not take the order or failed while stopping.
    #[error("Order pipeline error: {0}")]
    Pipeline(#[from] SyncError),
}
