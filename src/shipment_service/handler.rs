use crate::model::{OrderPlaced, Shipment, ShipmentId};
use chrono::Utc;
use std::sync::Arc;
use sync_framework::{codec, CodecError, EventHandler, IdAllocator, SharedStore, SyncError};
use tracing::info;

/// Turns new-order events into shipments awaiting dispatch.
///
/// Each order gets at most one shipment: a redelivered event for an order that
/// already has one is ignored.
pub struct NewOrderHandler {
    shipments: SharedStore<ShipmentId, Shipment>,
    ids: Arc<IdAllocator>,
}

impl NewOrderHandler {
    pub fn new(shipments: SharedStore<ShipmentId, Shipment>, ids: Arc<IdAllocator>) -> Self {
        Self { shipments, ids }
    }
}

impl EventHandler for NewOrderHandler {
    type Event = OrderPlaced;
    type Error = SyncError;

    fn decode(&self, payload: &[u8]) -> Result<OrderPlaced, CodecError> {
        codec::decode(payload)
    }

    fn apply(&self, order: OrderPlaced) -> Result<(), SyncError> {
        if let Some(existing) = self.shipments.find(|s| s.order_id == order.id) {
            info!(order_id = %order.id, shipment_id = %existing.id, "Duplicate order event ignored");
            return Ok(());
        }

        let id: ShipmentId = self.ids.next_id()?;
        let shipment = Shipment::for_order(id, &order, Utc::now());
        self.shipments.upsert(id, shipment);
        info!(order_id = %order.id, shipment_id = %id, customer = %order.customer_name, "Shipment created");
        Ok(())
    }
}
