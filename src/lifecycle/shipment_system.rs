use crate::clients::ShipmentClient;
use crate::config::SyncConfig;
use crate::model::{Shipment, ShipmentId};
use crate::shipment_service::{NewOrderHandler, ShipmentError};
use std::sync::Arc;
use sync_framework::{
    declare_topology, BackgroundTasks, Broker, IdAllocator, InboundConsumer, OutboundPublisher, StateStore,
};
use tracing::{info, warn};

/// Runtime of the Shipment service: consumes `pesanan.baru`, publishes
/// shipment changes to `pesanan.status`.
pub struct ShipmentSystem {
    pub shipment_client: ShipmentClient,
    tasks: BackgroundTasks,
}

impl ShipmentSystem {
    pub async fn start(broker: Arc<dyn Broker>, config: &SyncConfig) -> Self {
        let topology = config.topology();
        if let Err(e) = declare_topology(broker.as_ref(), &topology).await {
            warn!(error = %e, "Shipment service could not declare topology");
        }

        let shipments = StateStore::<ShipmentId, Shipment>::shared();
        let ids = Arc::new(IdAllocator::new());

        let (publisher, dispatch) =
            OutboundPublisher::<Shipment>::new(config.dispatch_capacity, config.status_route(), topology);
        let consumer = InboundConsumer::new(
            config.new_order_queue.clone(),
            Arc::new(NewOrderHandler::new(shipments.clone(), ids)),
            config.failure_policy,
        );

        let mut tasks = BackgroundTasks::new();
        tasks.spawn("shipment-publisher", publisher.run(broker.clone(), tasks.token()));
        tasks.spawn("new-order-consumer", consumer.run(broker, tasks.token()));
        info!("Shipment service started");

        Self {
            shipment_client: ShipmentClient::new(shipments, dispatch),
            tasks,
        }
    }

    pub fn stopped_loops(&self) -> Vec<&'static str> {
        self.tasks.finished()
    }

    pub async fn stop(self) -> Result<(), ShipmentError> {
        info!("Stopping shipment service...");
        drop(self.shipment_client);
        self.tasks.shutdown().await?;
        info!("Shipment service stopped");
        Ok(())
    }
}
