//! # Broker Abstraction
//!
//! The pipeline talks to the message broker through two traits:
//!
//! - [`Broker`] is the shared connection. It is only used to open channels and is
//!   safe to share (`Arc<dyn Broker>`) across loops.
//! - [`BrokerChannel`] is owned by exactly one loop. Dropping it releases the
//!   channel: its consumers are cancelled and every delivery it has not settled
//!   goes back to its queue.
//!
//! [`AmqpBroker`](crate::amqp::AmqpBroker) connects to RabbitMQ,
//! [`InMemoryBroker`](crate::memory::InMemoryBroker) keeps everything in one
//! process, and [`MockBroker`](crate::mock::MockBroker) scripts channel
//! behaviour for tests.

use crate::error::BrokerError;
use crate::topology::Topology;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Fixed destination of one message kind: exchange + routing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub exchange: String,
    pub routing_key: String,
}

impl Route {
    pub fn new(exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exchange, self.routing_key)
    }
}

/// A message handed to a consumer. It stays on the broker until the owning
/// channel acks or rejects `tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: u64,
    pub payload: Vec<u8>,
    pub redelivered: bool,
}

/// Push-style stream of deliveries for one consumer.
///
/// Yields `None` once the broker cancels the consumer (queue deleted, channel
/// released).
#[derive(Debug)]
pub struct Subscription {
    consumer_tag: String,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
}

impl Subscription {
    pub fn new(consumer_tag: impl Into<String>, deliveries: mpsc::UnboundedReceiver<Delivery>) -> Self {
        Self {
            consumer_tag: consumer_tag.into(),
            deliveries,
        }
    }

    pub fn consumer_tag(&self) -> &str {
        &self.consumer_tag
    }

    /// Waits for the next delivery.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.deliveries.recv().await
    }
}

/// Connection/channel provider.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn open_channel(&self) -> Result<Box<dyn BrokerChannel>, BrokerError>;
}

/// One broker session. Not shared across tasks.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Idempotently ensures the exchange, queues and bindings exist.
    async fn declare_topology(&self, topology: &Topology) -> Result<(), BrokerError>;

    /// Passive check: `Ok(false)` when the queue does not exist.
    async fn queue_exists(&self, queue: &str) -> Result<bool, BrokerError>;

    async fn publish(&self, route: &Route, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Starts a manual-acknowledgement consumer on `queue`.
    async fn consume(&self, queue: &str) -> Result<Subscription, BrokerError>;

    async fn ack(&self, tag: u64) -> Result<(), BrokerError>;

    /// Settles a delivery as unprocessable. The broker dead-letters it when the
    /// queue was declared with a dead-letter queue, and drops it otherwise.
    async fn reject(&self, tag: u64) -> Result<(), BrokerError>;
}
