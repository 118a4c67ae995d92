use crate::model::{Shipment, ShipmentId, ShipmentUpdate};
use crate::shipment_service::ShipmentError;
use std::sync::Arc;
use sync_framework::{DispatchQueue, SharedStore};
use tracing::{debug, info, instrument, warn};

/// Application-facing handle of the Shipment service.
#[derive(Clone)]
pub struct ShipmentClient {
    shipments: SharedStore<ShipmentId, Shipment>,
    dispatch: DispatchQueue<Shipment>,
}

impl ShipmentClient {
    pub fn new(shipments: SharedStore<ShipmentId, Shipment>, dispatch: DispatchQueue<Shipment>) -> Self {
        Self { shipments, dispatch }
    }

    /// Applies `update`, stores the result and queues a status event for the
    /// Order service.
    #[instrument(skip(self, update), fields(shipment_id = %id))]
    pub async fn update_status(&self, id: ShipmentId, update: ShipmentUpdate) -> Result<Shipment, ShipmentError> {
        debug!(?update, "update_status called");
        if let ShipmentUpdate::Ship {
            carrier,
            tracking_number,
        } = &update
        {
            if carrier.trim().is_empty() || tracking_number.trim().is_empty() {
                return Err(ShipmentError::ValidationError(
                    "carrier and tracking number are required to ship".to_string(),
                ));
            }
        }

        let updated = self
            .shipments
            .update(&id, |current| current.apply(update))
            .ok_or(ShipmentError::NotFound(id))?;

        if let Err(e) = self.dispatch.submit(Shipment::clone(&updated)).await {
            warn!(error = %e, "Shipment updated locally but status event not queued");
            return Err(e.into());
        }
        info!(status = %updated.status, "Shipment status updated");
        Ok(Shipment::clone(&updated))
    }

    pub fn get(&self, id: ShipmentId) -> Option<Arc<Shipment>> {
        self.shipments.get(&id)
    }

    /// All shipments, ordered by id.
    pub fn shipments(&self) -> Vec<Arc<Shipment>> {
        self.shipments.values()
    }
}
