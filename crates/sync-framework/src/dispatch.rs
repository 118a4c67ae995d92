//! # Outbound Publisher
//!
//! Decouples record production from broker I/O. Application code pushes records
//! into a [`DispatchQueue`] and returns immediately; one [`OutboundPublisher`]
//! task drains the queue in FIFO order and publishes each record to a fixed
//! [`Route`].
//!
//! Before draining, the publisher runs the topology check
//! ([`ensure_topology`]). If the required queues cannot be confirmed it exits
//! with an error instead of publishing into the void. A record that fails to
//! encode or publish is logged and dropped; it never stops the loop.

use crate::broker::{Broker, Route};
use crate::codec::Outbound;
use crate::error::SyncError;
use crate::topology::{ensure_topology, Topology};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of a dispatch queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueCapacity {
    /// `submit` never waits.
    #[default]
    Unbounded,
    /// `submit` waits while this many records are pending.
    Bounded(usize),
}

#[derive(Debug)]
enum QueueSender<T> {
    Unbounded(mpsc::UnboundedSender<T>),
    Bounded(mpsc::Sender<T>),
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Unbounded(sender) => Self::Unbounded(sender.clone()),
            Self::Bounded(sender) => Self::Bounded(sender.clone()),
        }
    }
}

#[derive(Debug)]
enum QueueReceiver<T> {
    Unbounded(mpsc::UnboundedReceiver<T>),
    Bounded(mpsc::Receiver<T>),
}

impl<T> QueueReceiver<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            Self::Unbounded(receiver) => receiver.recv().await,
            Self::Bounded(receiver) => receiver.recv().await,
        }
    }

    /// Closes the queue and counts the records still pending.
    fn close_and_drain(&mut self) -> usize {
        let mut discarded = 0;
        match self {
            Self::Unbounded(receiver) => {
                receiver.close();
                while receiver.try_recv().is_ok() {
                    discarded += 1;
                }
            }
            Self::Bounded(receiver) => {
                receiver.close();
                while receiver.try_recv().is_ok() {
                    discarded += 1;
                }
            }
        }
        discarded
    }
}

/// Producer half of the dispatch queue. Cheap to clone.
#[derive(Debug)]
pub struct DispatchQueue<T> {
    sender: QueueSender<T>,
}

impl<T> Clone for DispatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Outbound> DispatchQueue<T> {
    /// Enqueues `record` for publication.
    ///
    /// Returns [`SyncError::DispatchClosed`] once the publisher has stopped.
    pub async fn submit(&self, record: T) -> Result<(), SyncError> {
        match &self.sender {
            QueueSender::Unbounded(sender) => sender.send(record).map_err(|_| SyncError::DispatchClosed),
            QueueSender::Bounded(sender) => sender.send(record).await.map_err(|_| SyncError::DispatchClosed),
        }
    }

    pub fn is_closed(&self) -> bool {
        match &self.sender {
            QueueSender::Unbounded(sender) => sender.is_closed(),
            QueueSender::Bounded(sender) => sender.is_closed(),
        }
    }
}

/// Consumer half of the dispatch queue: the publishing loop.
#[derive(Debug)]
pub struct OutboundPublisher<T> {
    receiver: QueueReceiver<T>,
    route: Route,
    topology: Topology,
}

impl<T: Outbound> OutboundPublisher<T> {
    /// Creates the publisher and the queue that feeds it.
    pub fn new(capacity: QueueCapacity, route: Route, topology: Topology) -> (Self, DispatchQueue<T>) {
        let (sender, receiver) = match capacity {
            QueueCapacity::Unbounded => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
            }
            QueueCapacity::Bounded(size) => {
                let (tx, rx) = mpsc::channel(size.max(1));
                (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
            }
        };
        let publisher = Self {
            receiver,
            route,
            topology,
        };
        (publisher, DispatchQueue { sender })
    }

    /// Runs until `shutdown` fires or every [`DispatchQueue`] handle is dropped.
    ///
    /// Records still queued when the loop stops are discarded and counted in the
    /// final log line.
    pub async fn run(mut self, broker: Arc<dyn Broker>, shutdown: CancellationToken) -> Result<(), SyncError> {
        let record_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let route = self.route.clone();

        let channel = match broker.open_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                error!(record_type, %route, error = %e, "Publisher could not open channel");
                self.receiver.close_and_drain();
                return Err(e.into());
            }
        };

        if let Err(e) = ensure_topology(channel.as_ref(), &self.topology).await {
            error!(record_type, %route, error = %e, "Topology unavailable, publisher exiting");
            self.receiver.close_and_drain();
            return Err(e);
        }
        info!(record_type, %route, "Publisher started");

        let mut published = 0usize;
        let mut failed = 0usize;
        loop {
            let record = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(record) => record,
                    None => break,
                },
            };

            let key = record.key();
            let payload = match record.encode() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(record_type, %key, error = %e, "Encode failed, record dropped");
                    failed += 1;
                    continue;
                }
            };
            match channel.publish(&route, payload).await {
                Ok(()) => {
                    debug!(record_type, %key, "Published");
                    published += 1;
                }
                Err(e) => {
                    warn!(record_type, %key, error = %e, "Publish failed, record dropped");
                    failed += 1;
                }
            }
        }

        let discarded = self.receiver.close_and_drain();
        info!(record_type, published, failed, discarded, "Publisher stopped");
        Ok(())
    }
}
