use order_sync::config::SyncConfig;
use order_sync::lifecycle::{OrderSystem, ShipmentSystem};
use order_sync::model::{
    NewOrderEvent, OrderCreate, OrderId, OrderStatus, ShipmentId, ShipmentStatus, ShipmentUpdate,
};
use order_sync::order_service::OrderError;
use std::sync::Arc;
use std::time::Duration;
use sync_framework::{codec, Broker, InMemoryBroker, SyncError};

async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

fn order_params(name: &str, address: &str, total_price: f64) -> OrderCreate {
    OrderCreate {
        customer_name: name.to_string(),
        shipping_address: address.to_string(),
        total_price,
    }
}

async fn publish(broker: &InMemoryBroker, route: &sync_framework::Route, payload: Vec<u8>) {
    let channel = broker.open_channel().await.unwrap();
    channel.publish(route, payload).await.unwrap();
}

#[tokio::test]
async fn test_full_order_shipment_flow() {
    let config = SyncConfig::default();
    let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
    let shipments = ShipmentSystem::start(broker.clone(), &config).await;
    let orders = OrderSystem::start(broker, &config).await;

    let order = orders
        .order_client
        .place_order(order_params("Alice", "Jl. A", 50_000.0))
        .await
        .unwrap();
    assert_eq!(order.id, OrderId(1));
    assert_eq!(order.status, OrderStatus::New);

    let shipment_client = &shipments.shipment_client;
    eventually("shipment for order 1", || shipment_client.get(ShipmentId(1)).is_some()).await;
    let shipment = shipment_client.get(ShipmentId(1)).unwrap();
    assert_eq!(shipment.order_id, OrderId(1));
    assert_eq!(shipment.status, ShipmentStatus::AwaitingShipment);
    assert_eq!(shipment.customer_name, "Alice");
    assert_eq!(shipment.shipping_address, "Jl. A");

    let shipped = shipment_client
        .update_status(
            ShipmentId(1),
            ShipmentUpdate::Ship {
                carrier: "JNE".to_string(),
                tracking_number: "RESI123".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(shipped.status, ShipmentStatus::Shipped);

    let order_client = &orders.order_client;
    eventually("order 1 in transit", || {
        order_client
            .get(OrderId(1))
            .is_some_and(|o| o.status == OrderStatus::SedangDikirim)
    })
    .await;
    let order = order_client.get(OrderId(1)).unwrap();
    assert_eq!(order.total_price, 50_000.0);
    assert_eq!(order.customer_name, "Alice");

    shipment_client.update_status(ShipmentId(1), ShipmentUpdate::Deliver).await.unwrap();
    eventually("order 1 completed", || {
        order_client
            .get(OrderId(1))
            .is_some_and(|o| o.status == OrderStatus::Selesai)
    })
    .await;
    assert_eq!(
        shipment_client.get(ShipmentId(1)).unwrap().carrier.as_deref(),
        Some("JNE")
    );

    orders.stop().await.unwrap();
    shipments.stop().await.unwrap();
}

#[tokio::test]
async fn test_orders_arrive_in_submission_order() {
    let config = SyncConfig::default();
    let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
    let shipments = ShipmentSystem::start(broker.clone(), &config).await;
    let orders = OrderSystem::start(broker, &config).await;

    for n in 1..=10 {
        orders
            .order_client
            .place_order(order_params(&format!("Customer {n}"), "Jl. B", n as f64 * 1_000.0))
            .await
            .unwrap();
    }

    let shipment_client = &shipments.shipment_client;
    eventually("ten shipments", || shipment_client.shipments().len() == 10).await;
    for (index, shipment) in shipment_client.shipments().iter().enumerate() {
        let n = index as u32 + 1;
        assert_eq!(shipment.id, ShipmentId(n));
        assert_eq!(shipment.order_id, OrderId(n));
        assert_eq!(shipment.customer_name, format!("Customer {n}"));
    }

    orders.stop().await.unwrap();
    shipments.stop().await.unwrap();
}

#[tokio::test]
async fn test_status_event_for_unknown_order_creates_it() {
    let config = SyncConfig::default();
    let broker = InMemoryBroker::new();
    let orders = OrderSystem::start(Arc::new(broker.clone()), &config).await;

    let payload = br#"{"id":3,"idPesanan":7,"namaPelanggan":"Citra","alamatPengiriman":"Jl. C","statusPengiriman":"PACKED"}"#;
    publish(&broker, &config.status_route(), payload.to_vec()).await;

    let order_client = &orders.order_client;
    eventually("synthesized order 7", || order_client.get(OrderId(7)).is_some()).await;
    let order = order_client.get(OrderId(7)).unwrap();
    assert_eq!(order.status, OrderStatus::SedangDikemas);
    assert_eq!(order.customer_name, "Citra");
    assert_eq!(order.total_price, 0.0);

    // Same event again leaves the record as it was.
    publish(&broker, &config.status_route(), payload.to_vec()).await;
    eventually("status queue drained", || {
        broker.queue_depth("pesanan.status") == Some(0) && broker.unacked_count() == 0
    })
    .await;
    assert_eq!(order_client.get(OrderId(7)), Some(order));
    assert_eq!(order_client.orders().len(), 1);

    orders.stop().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_order_event_creates_one_shipment() {
    let config = SyncConfig::default();
    let broker = InMemoryBroker::new();
    let shipments = ShipmentSystem::start(Arc::new(broker.clone()), &config).await;

    let event = NewOrderEvent {
        id: OrderId(1),
        customer_name: "Alice".to_string(),
        shipping_address: "Jl. A".to_string(),
        total_price: 50_000.0,
        created_at: chrono::Utc::now(),
        status: OrderStatus::New,
    };
    let payload = codec::encode(&event).unwrap();
    publish(&broker, &config.new_order_route(), payload.clone()).await;
    publish(&broker, &config.new_order_route(), payload).await;

    eventually("new-order queue drained", || {
        broker.queue_depth("pesanan.baru") == Some(0) && broker.unacked_count() == 0
    })
    .await;
    assert_eq!(shipments.shipment_client.shipments().len(), 1);

    shipments.stop().await.unwrap();
}

#[tokio::test]
async fn test_malformed_events_are_acknowledged_by_default() {
    let config = SyncConfig::default();
    let broker = InMemoryBroker::new();
    let orders = OrderSystem::start(Arc::new(broker.clone()), &config).await;

    publish(&broker, &config.status_route(), b"{broken".to_vec()).await;
    publish(
        &broker,
        &config.status_route(),
        br#"{"id":1,"idPesanan":1,"statusPengiriman":"DELIVERED"}"#.to_vec(),
    )
    .await;

    let order_client = &orders.order_client;
    eventually("valid event after a broken one", || order_client.get(OrderId(1)).is_some()).await;
    assert_eq!(order_client.get(OrderId(1)).unwrap().status, OrderStatus::Selesai);
    assert!(orders.stopped_loops().is_empty());

    orders.stop().await.unwrap();
}

#[tokio::test]
async fn test_reject_policy_dead_letters_malformed_events() {
    let config = SyncConfig::default().with_dead_letters();
    let broker = InMemoryBroker::new();
    let orders = OrderSystem::start(Arc::new(broker.clone()), &config).await;

    publish(&broker, &config.status_route(), b"not json".to_vec()).await;
    eventually("dead-lettered payload", || {
        broker.peek_messages("pesanan.status.dlq") == vec![b"not json".to_vec()]
    })
    .await;
    assert!(orders.order_client.orders().is_empty());

    orders.stop().await.unwrap();
}

#[tokio::test]
async fn test_unavailable_broker_leaves_service_degraded() {
    let config = SyncConfig::default();
    let broker = InMemoryBroker::new();
    broker.set_available(false);
    let orders = OrderSystem::start(Arc::new(broker.clone()), &config).await;

    eventually("both loops to exit", || orders.stopped_loops().len() == 2).await;

    let result = orders
        .order_client
        .place_order(order_params("Dewi", "Jl. D", 10.0))
        .await;
    assert!(matches!(result, Err(OrderError::Pipeline(SyncError::DispatchClosed))));
    // Local state is still served.
    assert_eq!(
        orders.order_client.get(OrderId(1)).map(|o| o.customer_name.clone()),
        Some("Dewi".to_string())
    );

    orders.stop().await.unwrap();
}
