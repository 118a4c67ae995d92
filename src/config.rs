//! Broker contract and pipeline settings shared by both services.

use sync_framework::{FailurePolicy, QueueCapacity, QueueSpec, Route, Topology};

pub const EXCHANGE: &str = "ecommerce.pesanan";
pub const NEW_ORDER_QUEUE: &str = "pesanan.baru";
pub const STATUS_QUEUE: &str = "pesanan.status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub exchange: String,
    pub new_order_queue: String,
    pub new_order_routing_key: String,
    pub status_queue: String,
    pub status_routing_key: String,
    /// Dead-letter queue for undecodable new-order events.
    pub new_order_dead_letter: Option<String>,
    /// Dead-letter queue for undecodable shipment-status events.
    pub status_dead_letter: Option<String>,
    pub dispatch_capacity: QueueCapacity,
    pub failure_policy: FailurePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            exchange: EXCHANGE.to_string(),
            new_order_queue: NEW_ORDER_QUEUE.to_string(),
            new_order_routing_key: NEW_ORDER_QUEUE.to_string(),
            status_queue: STATUS_QUEUE.to_string(),
            status_routing_key: STATUS_QUEUE.to_string(),
            new_order_dead_letter: None,
            status_dead_letter: None,
            dispatch_capacity: QueueCapacity::Unbounded,
            failure_policy: FailurePolicy::Acknowledge,
        }
    }
}

impl SyncConfig {
    /// Rejects undecodable events into `<queue>.dlq` instead of acknowledging
    /// them.
    pub fn with_dead_letters(mut self) -> Self {
        self.new_order_dead_letter = Some(format!("{}.dlq", self.new_order_queue));
        self.status_dead_letter = Some(format!("{}.dlq", self.status_queue));
        self.failure_policy = FailurePolicy::Reject;
        self
    }

    pub fn with_dispatch_capacity(mut self, capacity: QueueCapacity) -> Self {
        self.dispatch_capacity = capacity;
        self
    }

    /// Exchange, both queues and their bindings.
    pub fn topology(&self) -> Topology {
        let mut new_orders = QueueSpec::new(&self.new_order_queue, &self.new_order_routing_key);
        if let Some(dead) = &self.new_order_dead_letter {
            new_orders = new_orders.with_dead_letter(dead);
        }
        let mut statuses = QueueSpec::new(&self.status_queue, &self.status_routing_key);
        if let Some(dead) = &self.status_dead_letter {
            statuses = statuses.with_dead_letter(dead);
        }
        Topology::new(&self.exchange).with_queue(new_orders).with_queue(statuses)
    }

    pub fn new_order_route(&self) -> Route {
        Route::new(&self.exchange, &self.new_order_routing_key)
    }

    pub fn status_route(&self) -> Route {
        Route::new(&self.exchange, &self.status_routing_key)
    }
}
