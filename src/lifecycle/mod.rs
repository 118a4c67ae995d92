//! # Service Lifecycle
//!
//! Each service is started as a unit: topology declaration, store and id
//! allocator creation, and the spawning of its publisher and consumer loops.
//! `stop()` cancels both loops through their shared token and joins them.
//!
//! Both services only need an `Arc<dyn Broker>`: the binary hands them an
//! [`AmqpBroker`](sync_framework::AmqpBroker) when they run as separate
//! processes, and the integration tests share one
//! [`InMemoryBroker`](sync_framework::InMemoryBroker) between them.

pub mod order_system;
pub mod shipment_system;

pub use order_system::OrderSystem;
pub use shipment_system::ShipmentSystem;
pub use sync_framework::telemetry::setup_tracing;
