use crate::model::{NewOrderEvent, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use sync_framework::{codec, CodecError, Outbound};

/// Lifecycle of an order as seen by the Order service.
///
/// Only `New` is set locally; every later state is derived from shipment
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "NEW", alias = "BARU")]
    New,
    #[serde(rename = "DIPROSES")]
    Diproses,
    #[serde(rename = "SEDANG_DIKEMAS")]
    SedangDikemas,
    #[serde(rename = "SEDANG_DIKIRIM")]
    SedangDikirim,
    #[serde(rename = "SELESAI")]
    Selesai,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Diproses => "DIPROSES",
            Self::SedangDikemas => "SEDANG_DIKEMAS",
            Self::SedangDikirim => "SEDANG_DIKIRIM",
            Self::Selesai => "SELESAI",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub shipping_address: String,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Operator input for a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreate {
    pub customer_name: String,
    pub shipping_address: String,
    pub total_price: f64,
}

impl Order {
    /// A freshly placed order, status `NEW`.
    pub fn new(id: OrderId, params: OrderCreate, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_name: params.customer_name,
            shipping_address: params.shipping_address,
            total_price: params.total_price,
            created_at,
            status: OrderStatus::New,
        }
    }

    /// Stand-in for an order this service has not seen, built from whatever a
    /// shipment event carried.
    pub fn synthesized(
        id: OrderId,
        customer_name: Option<&str>,
        shipping_address: Option<&str>,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_name: customer_name.unwrap_or_default().to_string(),
            shipping_address: shipping_address.unwrap_or_default().to_string(),
            total_price: 0.0,
            created_at,
            status,
        }
    }

    pub fn with_status(&self, status: OrderStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl Outbound for Order {
    type Key = OrderId;

    fn key(&self) -> OrderId {
        self.id
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode(&NewOrderEvent::from(self))
    }
}
