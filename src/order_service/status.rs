use crate::model::{OrderStatus, ShipmentStatus};

/// Order status implied by a shipment status.
///
/// | Shipment    | Order            |
/// |-------------|------------------|
/// | `PACKED`    | `SEDANG_DIKEMAS` |
/// | `SHIPPED`   | `SEDANG_DIKIRIM` |
/// | `DELIVERED` | `SELESAI`        |
/// | otherwise   | `DIPROSES`       |
pub fn order_status_for(shipment: &ShipmentStatus) -> OrderStatus {
    match shipment {
        ShipmentStatus::Packed => OrderStatus::SedangDikemas,
        ShipmentStatus::Shipped => OrderStatus::SedangDikirim,
        ShipmentStatus::Delivered => OrderStatus::Selesai,
        ShipmentStatus::AwaitingShipment | ShipmentStatus::Other(_) => OrderStatus::Diproses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_states_map_to_their_order_state() {
        assert_eq!(order_status_for(&ShipmentStatus::Packed), OrderStatus::SedangDikemas);
        assert_eq!(order_status_for(&ShipmentStatus::Shipped), OrderStatus::SedangDikirim);
        assert_eq!(order_status_for(&ShipmentStatus::Delivered), OrderStatus::Selesai);
    }

    #[test]
    fn everything_else_is_diproses() {
        assert_eq!(order_status_for(&ShipmentStatus::AwaitingShipment), OrderStatus::Diproses);
        assert_eq!(
            order_status_for(&ShipmentStatus::Other("RETURNED".to_string())),
            OrderStatus::Diproses
        );
        assert_eq!(order_status_for(&ShipmentStatus::from(String::new())), OrderStatus::Diproses);
    }
}
