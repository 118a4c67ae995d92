//! Clients wired to a real publisher over a scripted broker: checks what
//! actually goes on the wire without running the peer service.

use chrono::Utc;
use order_sync::clients::{OrderClient, ShipmentClient};
use order_sync::config::SyncConfig;
use order_sync::model::{OrderCreate, OrderId, Shipment, ShipmentId, ShipmentStatus, ShipmentUpdate};
use order_sync::order_service::OrderError;
use order_sync::shipment_service::ShipmentError;
use serde_json::Value;
use std::sync::Arc;
use sync_framework::mock::MockBroker;
use sync_framework::{IdAllocator, OutboundPublisher, StateStore, SyncError};
use tokio_util::sync::CancellationToken;

fn expect_topology_present(broker: &mut MockBroker) {
    broker.expect_queue_exists("pesanan.baru").return_ok(true);
    broker.expect_queue_exists("pesanan.status").return_ok(true);
}

fn params(name: &str) -> OrderCreate {
    OrderCreate {
        customer_name: name.to_string(),
        shipping_address: "Jl. A".to_string(),
        total_price: 50_000.0,
    }
}

fn awaiting_shipment(id: u32, order_id: u32) -> Shipment {
    Shipment {
        id: ShipmentId(id),
        order_id: OrderId(order_id),
        customer_name: "Alice".to_string(),
        shipping_address: "Jl. A".to_string(),
        created_at: Utc::now(),
        status: ShipmentStatus::AwaitingShipment,
        carrier: None,
        tracking_number: None,
    }
}

#[tokio::test]
async fn test_place_order_publishes_new_order_event() {
    let config = SyncConfig::default();
    let mut broker = MockBroker::new();
    expect_topology_present(&mut broker);
    broker.expect_publish(config.new_order_route()).return_ok(());

    let (publisher, dispatch) =
        OutboundPublisher::new(config.dispatch_capacity, config.new_order_route(), config.topology());
    let client = OrderClient::new(StateStore::shared(), Arc::new(IdAllocator::new()), dispatch);

    let order = client.place_order(params("Alice")).await.unwrap();
    assert_eq!(client.get(order.id).as_deref(), Some(&order));
    drop(client);

    publisher
        .run(Arc::new(broker.clone()), CancellationToken::new())
        .await
        .unwrap();
    broker.verify();

    let published = broker.published();
    assert_eq!(published.len(), 1);
    let body: Value = serde_json::from_slice(&published[0].1).unwrap();
    assert_eq!(body["id"], 1);
    assert_eq!(body["namaPelanggan"], "Alice");
    assert_eq!(body["alamatPengiriman"], "Jl. A");
    assert_eq!(body["totalHarga"], 50_000.0);
    assert_eq!(body["status"], "NEW");
    assert_eq!(body["tanggalPesanan"], order.created_at.timestamp_millis());
}

#[tokio::test]
async fn test_failed_publish_does_not_block_next_order() {
    let config = SyncConfig::default();
    let mut broker = MockBroker::new();
    expect_topology_present(&mut broker);
    broker
        .expect_publish(config.new_order_route())
        .return_err(sync_framework::BrokerError::ChannelClosed);
    broker.expect_publish(config.new_order_route()).return_ok(());

    let (publisher, dispatch) =
        OutboundPublisher::new(config.dispatch_capacity, config.new_order_route(), config.topology());
    let client = OrderClient::new(StateStore::shared(), Arc::new(IdAllocator::new()), dispatch);
    client.place_order(params("First")).await.unwrap();
    client.place_order(params("Second")).await.unwrap();
    let local = client.orders();
    drop(client);

    publisher
        .run(Arc::new(broker.clone()), CancellationToken::new())
        .await
        .unwrap();
    broker.verify();

    // Both orders exist locally; only the second reached the broker.
    assert_eq!(local.len(), 2);
    let published = broker.published();
    assert_eq!(published.len(), 1);
    let body: Value = serde_json::from_slice(&published[0].1).unwrap();
    assert_eq!(body["namaPelanggan"], "Second");
}

#[tokio::test]
async fn test_place_order_validates_input() {
    let config = SyncConfig::default();
    let (_publisher, dispatch) =
        OutboundPublisher::new(config.dispatch_capacity, config.new_order_route(), config.topology());
    let client = OrderClient::new(StateStore::shared(), Arc::new(IdAllocator::new()), dispatch);

    let mut blank_name = params(" ");
    assert!(matches!(
        client.place_order(blank_name.clone()).await,
        Err(OrderError::ValidationError(_))
    ));
    blank_name.customer_name = "Alice".to_string();
    blank_name.total_price = -5.0;
    assert!(matches!(
        client.place_order(blank_name).await,
        Err(OrderError::ValidationError(_))
    ));
    assert!(client.orders().is_empty());
}

#[tokio::test]
async fn test_place_order_after_publisher_gone() {
    let config = SyncConfig::default();
    let (publisher, dispatch) =
        OutboundPublisher::new(config.dispatch_capacity, config.new_order_route(), config.topology());
    let client = OrderClient::new(StateStore::shared(), Arc::new(IdAllocator::new()), dispatch);
    drop(publisher);

    let result = client.place_order(params("Alice")).await;
    assert!(matches!(result, Err(OrderError::Pipeline(SyncError::DispatchClosed))));
    assert!(client.get(OrderId(1)).is_some());
}

#[tokio::test]
async fn test_shipping_publishes_carrier_and_tracking() {
    let config = SyncConfig::default();
    let mut broker = MockBroker::new();
    expect_topology_present(&mut broker);
    broker.expect_publish(config.status_route()).return_ok(());
    broker.expect_publish(config.status_route()).return_ok(());

    let store = StateStore::shared();
    store.upsert(ShipmentId(1), awaiting_shipment(1, 5));
    let (publisher, dispatch) = OutboundPublisher::new(config.dispatch_capacity, config.status_route(), config.topology());
    let client = ShipmentClient::new(store, dispatch);

    client.update_status(ShipmentId(1), ShipmentUpdate::Pack).await.unwrap();
    let shipped = client
        .update_status(
            ShipmentId(1),
            ShipmentUpdate::Ship {
                carrier: "JNE".to_string(),
                tracking_number: "RESI123".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(client.get(ShipmentId(1)).as_deref(), Some(&shipped));
    drop(client);

    publisher
        .run(Arc::new(broker.clone()), CancellationToken::new())
        .await
        .unwrap();
    broker.verify();

    let published = broker.published();
    let packed: Value = serde_json::from_slice(&published[0].1).unwrap();
    assert_eq!(packed["statusPengiriman"], "PACKED");
    assert!(packed.get("kurirPengiriman").is_none());
    assert!(packed.get("nomorResi").is_none());

    let shipped: Value = serde_json::from_slice(&published[1].1).unwrap();
    assert_eq!(shipped["id"], 1);
    assert_eq!(shipped["idPesanan"], 5);
    assert_eq!(shipped["statusPengiriman"], "SHIPPED");
    assert_eq!(shipped["kurirPengiriman"], "JNE");
    assert_eq!(shipped["nomorResi"], "RESI123");
    assert_eq!(shipped["namaPelanggan"], "Alice");
}

#[tokio::test]
async fn test_update_rejects_unknown_shipment_and_missing_carrier() {
    let config = SyncConfig::default();
    let store = StateStore::shared();
    store.upsert(ShipmentId(1), awaiting_shipment(1, 1));
    let (_publisher, dispatch) = OutboundPublisher::new(config.dispatch_capacity, config.status_route(), config.topology());
    let client = ShipmentClient::new(store, dispatch);

    let missing = client.update_status(ShipmentId(9), ShipmentUpdate::Deliver).await;
    assert!(matches!(missing, Err(ShipmentError::NotFound(ShipmentId(9)))));

    let no_carrier = client
        .update_status(
            ShipmentId(1),
            ShipmentUpdate::Ship {
                carrier: String::new(),
                tracking_number: "RESI".to_string(),
            },
        )
        .await;
    assert!(matches!(no_carrier, Err(ShipmentError::ValidationError(_))));
    assert_eq!(
        client.get(ShipmentId(1)).unwrap().status,
        ShipmentStatus::AwaitingShipment
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_updates_never_clear_carrier() {
    let config = SyncConfig::default();
    let store = StateStore::shared();
    for id in 1..=50 {
        store.upsert(ShipmentId(id), awaiting_shipment(id, id));
    }
    let (_publisher, dispatch) = OutboundPublisher::new(config.dispatch_capacity, config.status_route(), config.topology());
    let client = ShipmentClient::new(store, dispatch);

    let mut updates = Vec::new();
    for id in 1..=50 {
        let shipper = client.clone();
        updates.push(tokio::spawn(async move {
            let ship = ShipmentUpdate::Ship {
                carrier: "JNE".to_string(),
                tracking_number: format!("RESI{id}"),
            };
            shipper.update_status(ShipmentId(id), ship).await
        }));
        let courier = client.clone();
        updates.push(tokio::spawn(async move {
            courier.update_status(ShipmentId(id), ShipmentUpdate::Deliver).await
        }));
    }
    for update in updates {
        update.await.unwrap().unwrap();
    }

    // Whichever update landed last, the carrier set by the ship stays.
    for shipment in client.shipments() {
        assert_eq!(shipment.carrier.as_deref(), Some("JNE"));
        assert_eq!(shipment.tracking_number, Some(format!("RESI{}", shipment.id.0)));
    }
}

#[tokio::test]
async fn test_place_order_fails_once_ids_run_out() {
    let config = SyncConfig::default();
    let (_publisher, dispatch) =
        OutboundPublisher::new(config.dispatch_capacity, config.new_order_route(), config.topology());
    let client = OrderClient::new(StateStore::shared(), Arc::new(IdAllocator::starting_at(u32::MAX)), dispatch);

    let last = client.place_order(params("Alice")).await.unwrap();
    assert_eq!(last.id, OrderId(u32::MAX));
    let result = client.place_order(params("Bob")).await;
    assert!(matches!(result, Err(OrderError::Pipeline(SyncError::IdsExhausted))));
    assert_eq!(client.orders().len(), 1);
}
