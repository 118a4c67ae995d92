//! # In-Memory Broker
//!
//! A process-local [`Broker`] with the delivery semantics the pipeline relies on:
//!
//! - direct exchanges route by exact routing-key match; unrouted messages are
//!   dropped, publishing to an undeclared exchange is an error
//! - queues are FIFO and hand messages round-robin to their consumers
//! - deliveries stay unacknowledged until the owning channel acks or rejects
//!   them; releasing the channel requeues them at the front, flagged redelivered
//! - rejected deliveries move to the queue's dead-letter queue when one is
//!   declared
//!
//! Test helpers ([`set_available`](InMemoryBroker::set_available),
//! [`delete_queue`](InMemoryBroker::delete_queue), ...) simulate outages and
//! inspect queue contents.

use crate::broker::{Broker, BrokerChannel, Delivery, Route, Subscription};
use crate::error::BrokerError;
use crate::topology::Topology;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct Message {
    payload: Vec<u8>,
    redelivered: bool,
}

#[derive(Debug)]
struct Consumer {
    tag: String,
    channel: u64,
    sender: mpsc::UnboundedSender<Delivery>,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<Message>,
    consumers: Vec<Consumer>,
    cursor: usize,
    dead_letter: Option<String>,
}

#[derive(Debug)]
struct Unacked {
    channel: u64,
    queue: String,
    message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    routing_key: String,
    queue: String,
}

#[derive(Debug)]
struct BrokerState {
    available: bool,
    exchanges: HashMap<String, Vec<Binding>>,
    queues: HashMap<String, QueueState>,
    unacked: HashMap<u64, Unacked>,
    next_tag: u64,
    next_channel: u64,
    next_consumer: u64,
}

impl BrokerState {
    fn new() -> Self {
        Self {
            available: true,
            exchanges: HashMap::new(),
            queues: HashMap::new(),
            unacked: HashMap::new(),
            next_tag: 1,
            next_channel: 1,
            next_consumer: 1,
        }
    }

    fn check_available(&self) -> Result<(), BrokerError> {
        if self.available {
            Ok(())
        } else {
            Err(BrokerError::Unavailable("in-memory broker is down".to_string()))
        }
    }

    fn declare(&mut self, topology: &Topology) {
        let bindings = self.exchanges.entry(topology.exchange.clone()).or_default();
        for spec in &topology.queues {
            let binding = Binding {
                routing_key: spec.routing_key.clone(),
                queue: spec.name.clone(),
            };
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }
        for spec in &topology.queues {
            if let Some(dead) = &spec.dead_letter {
                self.queues.entry(dead.clone()).or_default();
            }
            let queue = self.queues.entry(spec.name.clone()).or_default();
            queue.dead_letter = spec.dead_letter.clone();
        }
    }

    fn enqueue(&mut self, queue: &str, message: Message) {
        if let Some(state) = self.queues.get_mut(queue) {
            state.ready.push_back(message);
            self.dispatch(queue);
        }
    }

    /// Hands ready messages to consumers until one side runs out.
    fn dispatch(&mut self, queue: &str) {
        let BrokerState {
            queues,
            unacked,
            next_tag,
            ..
        } = self;
        let Some(state) = queues.get_mut(queue) else {
            return;
        };

        while !state.consumers.is_empty() {
            let Some(message) = state.ready.pop_front() else {
                break;
            };
            let index = state.cursor % state.consumers.len();
            let tag = *next_tag;
            let delivery = Delivery {
                tag,
                payload: message.payload.clone(),
                redelivered: message.redelivered,
            };
            let consumer = &state.consumers[index];
            if consumer.sender.send(delivery).is_err() {
                // Receiver gone: cancel the consumer and retry with the next one.
                debug!(queue, consumer = %consumer.tag, "Dropping cancelled consumer");
                state.consumers.remove(index);
                state.ready.push_front(message);
                continue;
            }
            trace!(queue, tag, consumer = %consumer.tag, "Delivered");
            unacked.insert(
                tag,
                Unacked {
                    channel: consumer.channel,
                    queue: queue.to_string(),
                    message,
                },
            );
            *next_tag += 1;
            state.cursor = index + 1;
        }
    }

    fn take_unacked(&mut self, channel: u64, tag: u64) -> Result<Unacked, BrokerError> {
        match self.unacked.get(&tag) {
            Some(entry) if entry.channel == channel => {}
            _ => return Err(BrokerError::UnknownDeliveryTag(tag)),
        }
        self.unacked
            .remove(&tag)
            .ok_or(BrokerError::UnknownDeliveryTag(tag))
    }

    fn release_channel(&mut self, channel: u64) {
        for state in self.queues.values_mut() {
            state.consumers.retain(|c| c.channel != channel);
        }

        let mut tags: Vec<u64> = self
            .unacked
            .iter()
            .filter(|(_, entry)| entry.channel == channel)
            .map(|(tag, _)| *tag)
            .collect();
        tags.sort_unstable();

        let mut touched = Vec::new();
        // Newest first so the oldest delivery ends up at the head again.
        for tag in tags.into_iter().rev() {
            if let Some(entry) = self.unacked.remove(&tag) {
                if let Some(state) = self.queues.get_mut(&entry.queue) {
                    state.ready.push_front(Message {
                        payload: entry.message.payload,
                        redelivered: true,
                    });
                    if !touched.contains(&entry.queue) {
                        touched.push(entry.queue);
                    }
                }
            }
        }
        for queue in touched {
            self.dispatch(&queue);
        }
    }
}

fn lock(state: &Mutex<BrokerState>) -> MutexGuard<'_, BrokerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local broker. Clones share the same exchanges and queues.
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState::new())),
        }
    }

    /// Creates a broker with `topology` already declared.
    pub fn with_topology(topology: &Topology) -> Self {
        let broker = Self::new();
        lock(&broker.state).declare(topology);
        broker
    }

    /// Simulates an outage: while unavailable every operation fails with
    /// [`BrokerError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }

    /// Deletes a queue and its bindings. Its consumers are cancelled and its
    /// ready messages are lost.
    pub fn delete_queue(&self, name: &str) -> bool {
        let mut state = lock(&self.state);
        for bindings in state.exchanges.values_mut() {
            bindings.retain(|b| b.queue != name);
        }
        state.queues.remove(name).is_some()
    }

    /// Number of ready (not yet delivered) messages, `None` if the queue does not
    /// exist.
    pub fn queue_depth(&self, name: &str) -> Option<usize> {
        lock(&self.state).queues.get(name).map(|q| q.ready.len())
    }

    /// Ready message payloads in queue order.
    pub fn peek_messages(&self, name: &str) -> Vec<Vec<u8>> {
        lock(&self.state)
            .queues
            .get(name)
            .map(|q| q.ready.iter().map(|m| m.payload.clone()).collect())
            .unwrap_or_default()
    }

    pub fn consumer_count(&self, name: &str) -> usize {
        lock(&self.state)
            .queues
            .get(name)
            .map(|q| q.consumers.len())
            .unwrap_or(0)
    }

    /// Deliveries handed out but not yet settled, across all queues.
    pub fn unacked_count(&self) -> usize {
        lock(&self.state).unacked.len()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn open_channel(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let id = state.next_channel;
        state.next_channel += 1;
        debug!(channel = id, "Opened channel");
        Ok(Box::new(InMemoryChannel {
            id,
            state: self.state.clone(),
        }))
    }
}

/// Channel on an [`InMemoryBroker`]. Dropping it releases its consumers and
/// requeues its unsettled deliveries.
#[derive(Debug)]
pub struct InMemoryChannel {
    id: u64,
    state: Arc<Mutex<BrokerState>>,
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn declare_topology(&self, topology: &Topology) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        state.check_available()?;
        state.declare(topology);
        Ok(())
    }

    async fn queue_exists(&self, queue: &str) -> Result<bool, BrokerError> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(state.queues.contains_key(queue))
    }

    async fn publish(&self, route: &Route, payload: Vec<u8>) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let targets: Vec<String> = state
            .exchanges
            .get(&route.exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(route.exchange.clone()))?
            .iter()
            .filter(|b| b.routing_key == route.routing_key)
            .map(|b| b.queue.clone())
            .collect();

        if targets.is_empty() {
            debug!(%route, "Unroutable message dropped");
        }
        for queue in targets {
            state.enqueue(
                &queue,
                Message {
                    payload: payload.clone(),
                    redelivered: false,
                },
            );
        }
        Ok(())
    }

    async fn consume(&self, queue: &str) -> Result<Subscription, BrokerError> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let consumer_tag = format!("ctag-{}", state.next_consumer);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue_state = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;
        queue_state.consumers.push(Consumer {
            tag: consumer_tag.clone(),
            channel: self.id,
            sender,
        });
        state.next_consumer += 1;
        state.dispatch(queue);
        debug!(queue, consumer = %consumer_tag, channel = self.id, "Consumer registered");
        Ok(Subscription::new(consumer_tag, receiver))
    }

    async fn ack(&self, tag: u64) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        state.check_available()?;
        state.take_unacked(self.id, tag)?;
        Ok(())
    }

    async fn reject(&self, tag: u64) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let entry = state.take_unacked(self.id, tag)?;
        let dead_letter = state
            .queues
            .get(&entry.queue)
            .and_then(|q| q.dead_letter.clone());
        match dead_letter {
            Some(dead) => {
                debug!(tag, queue = %entry.queue, dead_letter = %dead, "Dead-lettering rejected delivery");
                state.enqueue(
                    &dead,
                    Message {
                        payload: entry.message.payload,
                        redelivered: false,
                    },
                );
            }
            None => debug!(tag, queue = %entry.queue, "Rejected delivery discarded"),
        }
        Ok(())
    }
}

impl Drop for InMemoryChannel {
    fn drop(&mut self) {
        lock(&self.state).release_channel(self.id);
        debug!(channel = self.id, "Channel released");
    }
}
