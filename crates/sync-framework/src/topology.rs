//! # Topology Declarator
//!
//! Describes the exchange / queue / binding contract both services rely on and
//! provides [`ensure_topology`], the verify → re-declare once → verify routine
//! publishers run before they start draining their queue.

use crate::broker::{Broker, BrokerChannel, Route};
use crate::error::SyncError;
use tracing::{info, warn};

/// A durable queue bound to the topology's exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub routing_key: String,
    /// Queue that receives rejected deliveries, if any.
    pub dead_letter: Option<String>,
}

impl QueueSpec {
    pub fn new(name: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing_key: routing_key.into(),
            dead_letter: None,
        }
    }

    pub fn with_dead_letter(mut self, queue: impl Into<String>) -> Self {
        self.dead_letter = Some(queue.into());
        self
    }
}

/// One direct exchange plus the queues bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub queues: Vec<QueueSpec>,
}

impl Topology {
    pub fn new(exchange: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            queues: Vec::new(),
        }
    }

    pub fn with_queue(mut self, queue: QueueSpec) -> Self {
        self.queues.push(queue);
        self
    }

    pub fn queue(&self, name: &str) -> Option<&QueueSpec> {
        self.queues.iter().find(|q| q.name == name)
    }

    /// Destination that lands messages on queue `name`.
    pub fn route_to(&self, name: &str) -> Option<Route> {
        self.queue(name)
            .map(|q| Route::new(self.exchange.clone(), q.routing_key.clone()))
    }

    /// Every queue the topology requires, dead-letter queues included.
    pub fn required_queues(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for spec in &self.queues {
            names.push(&spec.name);
            if let Some(dead) = &spec.dead_letter {
                names.push(dead);
            }
        }
        names.dedup();
        names
    }
}

/// Names of required queues the broker does not confirm. A failed check counts
/// as missing.
pub async fn missing_queues(channel: &dyn BrokerChannel, topology: &Topology) -> Vec<String> {
    let mut missing = Vec::new();
    for name in topology.required_queues() {
        match channel.queue_exists(name).await {
            Ok(true) => {}
            Ok(false) => missing.push(name.to_string()),
            Err(e) => {
                warn!(queue = name, error = %e, "Queue check failed");
                missing.push(name.to_string());
            }
        }
    }
    missing
}

/// Verifies the topology, re-declaring it once if any queue is missing.
///
/// Returns [`SyncError::TopologyMissing`] when queues are still absent after the
/// re-declaration, and [`SyncError::Transport`] when the re-declaration itself
/// fails.
pub async fn ensure_topology(channel: &dyn BrokerChannel, topology: &Topology) -> Result<(), SyncError> {
    let missing = missing_queues(channel, topology).await;
    if missing.is_empty() {
        return Ok(());
    }

    warn!(exchange = %topology.exchange, ?missing, "Queues missing, re-declaring topology");
    channel.declare_topology(topology).await?;

    let still_missing = missing_queues(channel, topology).await;
    if still_missing.is_empty() {
        info!(exchange = %topology.exchange, "Topology restored");
        Ok(())
    } else {
        Err(SyncError::TopologyMissing(still_missing))
    }
}

/// Declares `topology` on a short-lived channel of its own.
pub async fn declare_topology(broker: &dyn Broker, topology: &Topology) -> Result<(), SyncError> {
    let channel = broker.open_channel().await?;
    channel.declare_topology(topology).await?;
    info!(exchange = %topology.exchange, queues = topology.queues.len(), "Topology declared");
    Ok(())
}
