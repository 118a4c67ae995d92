use crate::model::{Order, OrderId, ShipmentStatusEvent};
use crate::order_service::status::order_status_for;
use chrono::Utc;
use std::convert::Infallible;
use sync_framework::{codec, CodecError, EventHandler, SharedStore};
use tracing::info;

/// Folds shipment-status events into the order store.
///
/// Never fails: an event for an order this service does not know creates a
/// placeholder order carrying the derived status.
pub struct ShipmentStatusHandler {
    orders: SharedStore<OrderId, Order>,
}

impl ShipmentStatusHandler {
    pub fn new(orders: SharedStore<OrderId, Order>) -> Self {
        Self { orders }
    }
}

impl EventHandler for ShipmentStatusHandler {
    type Event = ShipmentStatusEvent;
    type Error = Infallible;

    fn decode(&self, payload: &[u8]) -> Result<ShipmentStatusEvent, CodecError> {
        codec::decode(payload)
    }

    fn apply(&self, event: ShipmentStatusEvent) -> Result<(), Infallible> {
        let status = order_status_for(&event.status);
        let order_id = event.order_id;
        let mut synthesized = false;

        self.orders.upsert_with(order_id, |current| match current {
            Some(order) => order.with_status(status),
            None => {
                synthesized = true;
                Order::synthesized(
                    order_id,
                    event.customer_name.as_deref(),
                    event.shipping_address.as_deref(),
                    status,
                    Utc::now(),
                )
            }
        });

        if synthesized {
            info!(%order_id, shipment_id = %event.id, %status, "Order created from shipment event");
        } else {
            info!(%order_id, shipment_id = %event.id, shipment_status = %event.status, %status, "Order status updated");
        }
        Ok(())
    }
}
