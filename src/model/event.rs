//! Wire shapes of the two event kinds.
//!
//! Field names are the broker contract shared with the peer service and must not
//! change: timestamps travel as epoch milliseconds, optional fields are omitted
//! until populated.

use crate::model::{Order, OrderId, OrderStatus, Shipment, ShipmentId, ShipmentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Published by the Order service on `pesanan.baru`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderEvent {
    pub id: OrderId,
    #[serde(rename = "namaPelanggan")]
    pub customer_name: String,
    #[serde(rename = "alamatPengiriman")]
    pub shipping_address: String,
    #[serde(rename = "totalHarga")]
    pub total_price: f64,
    #[serde(rename = "tanggalPesanan", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl From<&Order> for NewOrderEvent {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name.clone(),
            shipping_address: order.shipping_address.clone(),
            total_price: order.total_price,
            created_at: order.created_at,
            status: order.status,
        }
    }
}

/// The part of a new-order event the Shipment service reads.
///
/// Price, timestamp and order status are left to the Order service, so a peer
/// that adds statuses or drops those fields still gets its orders shipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderPlaced {
    pub id: OrderId,
    #[serde(rename = "namaPelanggan")]
    pub customer_name: String,
    #[serde(rename = "alamatPengiriman")]
    pub shipping_address: String,
}

/// Published by the Shipment service on `pesanan.status` after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentStatusEvent {
    pub id: ShipmentId,
    #[serde(rename = "idPesanan")]
    pub order_id: OrderId,
    #[serde(rename = "namaPelanggan", default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(rename = "alamatPengiriman", default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    #[serde(
        rename = "tanggalPengiriman",
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "statusPengiriman")]
    pub status: ShipmentStatus,
    #[serde(rename = "kurirPengiriman", default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(rename = "nomorResi", default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

impl From<&Shipment> for ShipmentStatusEvent {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: shipment.id,
            order_id: shipment.order_id,
            customer_name: Some(shipment.customer_name.clone()),
            shipping_address: Some(shipment.shipping_address.clone()),
            created_at: Some(shipment.created_at),
            status: shipment.status.clone(),
            carrier: shipment.carrier.clone(),
            tracking_number: shipment.tracking_number.clone(),
        }
    }
}
