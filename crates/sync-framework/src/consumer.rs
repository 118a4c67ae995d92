//! # Inbound Consumer
//!
//! Subscribes to one queue with manual acknowledgement and feeds every delivery
//! through an [`EventHandler`]. Each delivery is settled exactly once after
//! handling, whatever the outcome, so a malformed message never blocks the
//! queue.

use crate::broker::{Broker, Delivery};
use crate::codec::EventHandler;
use crate::error::SyncError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a delivery is settled when decoding or applying it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Acknowledge anyway; the message is gone.
    #[default]
    Acknowledge,
    /// Reject; the broker dead-letters it if the queue has a dead-letter queue.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied,
    Failed,
}

pub struct InboundConsumer<H> {
    queue: String,
    handler: Arc<H>,
    policy: FailurePolicy,
}

impl<H: EventHandler> InboundConsumer<H> {
    pub fn new(queue: impl Into<String>, handler: Arc<H>, policy: FailurePolicy) -> Self {
        Self {
            queue: queue.into(),
            handler,
            policy,
        }
    }

    fn handle(&self, delivery: &Delivery) -> Outcome {
        let event = match self.handler.decode(&delivery.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(queue = %self.queue, tag = delivery.tag, error = %e, "Discarding undecodable message");
                return Outcome::Failed;
            }
        };
        debug!(queue = %self.queue, tag = delivery.tag, redelivered = delivery.redelivered, ?event, "Received");
        match self.handler.apply(event) {
            Ok(()) => Outcome::Applied,
            Err(e) => {
                warn!(queue = %self.queue, tag = delivery.tag, error = %e, "Event handling failed");
                Outcome::Failed
            }
        }
    }

    /// Consumes until `shutdown` fires or the broker cancels the subscription.
    ///
    /// Fails with [`SyncError::Transport`] if the subscription cannot be set up
    /// or a delivery cannot be settled. Dropping the channel on exit returns any
    /// unsettled delivery to the queue.
    pub async fn run(self, broker: Arc<dyn Broker>, shutdown: CancellationToken) -> Result<(), SyncError> {
        let channel = broker.open_channel().await?;
        let mut subscription = channel.consume(&self.queue).await?;
        info!(queue = %self.queue, consumer = subscription.consumer_tag(), "Consumer started");

        let mut applied = 0usize;
        let mut failed = 0usize;
        loop {
            let delivery = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = subscription.next() => match next {
                    Some(delivery) => delivery,
                    None => {
                        warn!(queue = %self.queue, "Subscription cancelled by broker");
                        break;
                    }
                },
            };

            let settled = match (self.handle(&delivery), self.policy) {
                (Outcome::Applied, _) => {
                    applied += 1;
                    channel.ack(delivery.tag).await
                }
                (Outcome::Failed, FailurePolicy::Acknowledge) => {
                    failed += 1;
                    channel.ack(delivery.tag).await
                }
                (Outcome::Failed, FailurePolicy::Reject) => {
                    failed += 1;
                    channel.reject(delivery.tag).await
                }
            };
            settled?;
        }

        info!(queue = %self.queue, applied, failed, "Consumer stopped");
        Ok(())
    }
}
