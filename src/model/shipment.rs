use crate::model::{OrderId, OrderPlaced, ShipmentId, ShipmentStatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use sync_framework::{codec, CodecError, Outbound};

/// Shipment lifecycle. Values outside the four known states are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShipmentStatus {
    AwaitingShipment,
    Packed,
    Shipped,
    Delivered,
    Other(String),
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AwaitingShipment => "AWAITING_SHIPMENT",
            Self::Packed => "PACKED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for ShipmentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AWAITING_SHIPMENT" | "MENUNGGU_PENGIRIMAN" => Self::AwaitingShipment,
            "PACKED" | "DIKEMAS" => Self::Packed,
            "SHIPPED" | "DIKIRIM" => Self::Shipped,
            "DELIVERED" | "TERKIRIM" => Self::Delivered,
            _ => Self::Other(value),
        }
    }
}

impl From<ShipmentStatus> for String {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub customer_name: String,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

/// Operator-driven status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentUpdate {
    Pack,
    Ship { carrier: String, tracking_number: String },
    Deliver,
}

impl Shipment {
    /// A shipment for a newly received order, awaiting shipment.
    pub fn for_order(id: ShipmentId, order: &OrderPlaced, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            order_id: order.id,
            customer_name: order.customer_name.clone(),
            shipping_address: order.shipping_address.clone(),
            created_at,
            status: ShipmentStatus::AwaitingShipment,
            carrier: None,
            tracking_number: None,
        }
    }

    /// Returns the record after `update`. Carrier and tracking number are only
    /// ever set, never cleared.
    pub fn apply(&self, update: ShipmentUpdate) -> Self {
        let mut next = self.clone();
        match update {
            ShipmentUpdate::Pack => next.status = ShipmentStatus::Packed,
            ShipmentUpdate::Ship {
                carrier,
                tracking_number,
            } => {
                next.status = ShipmentStatus::Shipped;
                next.carrier = Some(carrier);
                next.tracking_number = Some(tracking_number);
            }
            ShipmentUpdate::Deliver => next.status = ShipmentStatus::Delivered,
        }
        next
    }
}

impl Outbound for Shipment {
    type Key = ShipmentId;

    fn key(&self) -> ShipmentId {
        self.id
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(&ShipmentStatusEvent::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting() -> Shipment {
        let order = OrderPlaced {
            id: OrderId(4),
            customer_name: "Budi".to_string(),
            shipping_address: "Jl. Merdeka 1".to_string(),
        };
        Shipment::for_order(ShipmentId(1), &order, Utc::now())
    }

    #[test]
    fn indonesian_status_names_are_accepted() {
        assert_eq!(ShipmentStatus::from("DIKIRIM".to_string()), ShipmentStatus::Shipped);
        assert_eq!(ShipmentStatus::from("MENUNGGU_PENGIRIMAN".to_string()), ShipmentStatus::AwaitingShipment);
        assert_eq!(
            ShipmentStatus::from("RETURNED".to_string()),
            ShipmentStatus::Other("RETURNED".to_string())
        );
        assert_eq!(String::from(ShipmentStatus::Delivered), "DELIVERED");
    }

    #[test]
    fn shipping_sets_carrier_and_later_steps_keep_it() {
        let shipment = awaiting();
        assert_eq!(shipment.status, ShipmentStatus::AwaitingShipment);
        assert!(shipment.carrier.is_none());

        let packed = shipment.apply(ShipmentUpdate::Pack);
        assert!(packed.tracking_number.is_none());

        let shipped = packed.apply(ShipmentUpdate::Ship {
            carrier: "JNE".to_string(),
            tracking_number: "RESI123".to_string(),
        });
        let delivered = shipped.apply(ShipmentUpdate::Deliver);
        assert_eq!(delivered.status, ShipmentStatus::Delivered);
        assert_eq!(delivered.carrier.as_deref(), Some("JNE"));
        assert_eq!(delivered.tracking_number.as_deref(), Some("RESI123"));
        assert_eq!(delivered.id, shipment.id);
    }
}
