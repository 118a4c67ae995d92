use crate::clients::OrderClient;
use crate::config::SyncConfig;
use crate::model::{Order, OrderId};
use crate::order_service::{OrderError, ShipmentStatusHandler};
use std::sync::Arc;
use sync_framework::{
    declare_topology, BackgroundTasks, Broker, IdAllocator, InboundConsumer, OutboundPublisher, StateStore,
};
use tracing::{info, warn};

/// Runtime of the Order service.
///
/// Owns two background loops:
/// - the publisher that ships new orders to `pesanan.baru`
/// - the consumer that folds `pesanan.status` events into the order store
///
/// ```ignore
/// let system = OrderSystem::start(broker, &SyncConfig::default()).await;
/// let order = system.order_client.place_order(params).await?;
/// system.stop().await?;
/// ```
pub struct OrderSystem {
    pub order_client: OrderClient,
    tasks: BackgroundTasks,
}

impl OrderSystem {
    /// Declares the topology and starts both loops.
    ///
    /// A broker that is down at this point does not fail the start: the loops
    /// log their failure and exit, and the client keeps serving local reads.
    pub async fn start(broker: Arc<dyn Broker>, config: &SyncConfig) -> Self {
        let topology = config.topology();
        if let Err(e) = declare_topology(broker.as_ref(), &topology).await {
            warn!(error = %e, "Order service could not declare topology");
        }

        let orders = StateStore::<OrderId, Order>::shared();
        let ids = Arc::new(IdAllocator::new());

        let (publisher, dispatch) =
            OutboundPublisher::<Order>::new(config.dispatch_capacity, config.new_order_route(), topology);
        let consumer = InboundConsumer::new(
            config.status_queue.clone(),
            Arc::new(ShipmentStatusHandler::new(orders.clone())),
            config.failure_policy,
        );

        let mut tasks = BackgroundTasks::new();
        tasks.spawn("order-publisher", publisher.run(broker.clone(), tasks.token()));
        tasks.spawn("order-status-consumer", consumer.run(broker, tasks.token()));
        info!("Order service started");

        Self {
            order_client: OrderClient::new(orders, ids, dispatch),
            tasks,
        }
    }

    /// Loops that have already exited. Non-empty means the service runs degraded.
    pub fn stopped_loops(&self) -> Vec<&'static str> {
        self.tasks.finished()
    }

    /// Cancels both loops and waits for them.
    pub async fn stop(self) -> Result<(), OrderError> {
        info!("Stopping order service...");
        drop(self.order_client);
        self.tasks.shutdown().await?;
        info!("Order service stopped");
        Ok(())
    }
}
