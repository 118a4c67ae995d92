//! # Sync Framework
//!
//! Building blocks for services that keep local state in sync through a message
//! broker: each service owns a store, publishes its own records through a
//! background publisher and applies the other side's events through a
//! background consumer.
//!
//! ## Architecture Overview
//!
//! ```text
//!  application ──submit──▶ DispatchQueue ──▶ OutboundPublisher ──publish──▶ Broker
//!       │                                                                   │
//!       ▼                                                                   ▼
//!  StateStore ◀──apply── EventHandler ◀──decode── InboundConsumer ◀──deliver─┘
//! ```
//!
//! 1. **Broker layer** ([`Broker`], [`BrokerChannel`]): exchanges, queues,
//!    manual acknowledgement. [`AmqpBroker`] talks to a RabbitMQ server;
//!    [`InMemoryBroker`] implements the same semantics in-process.
//! 2. **Topology** ([`Topology`], [`ensure_topology`]): the shared exchange and
//!    queue contract, verified before publishing starts.
//! 3. **Loops** ([`OutboundPublisher`], [`InboundConsumer`]): generic over the
//!    domain through [`Outbound`] and [`EventHandler`].
//! 4. **State** ([`StateStore`], [`IdAllocator`]): thread-safe records and
//!    dense identifier sequences.
//!
//! [`BackgroundTasks`] ties the loops of one service to a single
//! cancellation token so the service stops as a unit.
//!
//! ## Testing
//!
//! Use [`InMemoryBroker`] for end-to-end tests and [`mock::MockBroker`] to
//! script individual broker failures.

pub mod allocator;
pub mod amqp;
pub mod broker;
pub mod codec;
pub mod consumer;
pub mod dispatch;
pub mod error;
pub mod memory;
pub mod mock;
pub mod store;
pub mod tasks;
pub mod telemetry;
pub mod topology;

pub use allocator::IdAllocator;
pub use amqp::AmqpBroker;
pub use broker::{Broker, BrokerChannel, Delivery, Route, Subscription};
pub use codec::{EventHandler, Outbound};
pub use consumer::{FailurePolicy, InboundConsumer};
pub use dispatch::{DispatchQueue, OutboundPublisher, QueueCapacity};
pub use error::{BrokerError, CodecError, SyncError};
pub use memory::InMemoryBroker;
pub use store::{SharedStore, StateStore};
pub use tasks::BackgroundTasks;
pub use topology::{declare_topology, ensure_topology, QueueSpec, Topology};
