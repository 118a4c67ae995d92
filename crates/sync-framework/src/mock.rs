//! # Mock Broker
//!
//! `MockBroker` hands out channels whose every operation is scripted up front.
//! Use it when a test needs a broker failure that the
//! [`InMemoryBroker`](crate::memory::InMemoryBroker) cannot produce on demand,
//! such as a single publish failing in the middle of a run.
//!
//! Expectations are consumed in order. A call that does not match the next
//! expectation panics, and [`verify`](MockBroker::verify) panics if any
//! expectation was left unused. `ack` and `reject` are not scripted; they are
//! recorded and always succeed.
//!
//! ```rust
//! use std::sync::Arc;
//! use sync_framework::mock::MockBroker;
//! use sync_framework::{BrokerError, OutboundPublisher, QueueCapacity, Route, Topology, QueueSpec};
//! # use sync_framework::{CodecError, Outbound};
//! # #[derive(Debug)] struct Line(&'static str);
//! # impl Outbound for Line {
//! #     type Key = &'static str;
//! #     fn key(&self) -> &'static str { self.0 }
//! #     fn encode(&self) -> Result<Vec<u8>, CodecError> { Ok(self.0.as_bytes().to_vec()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() {
//!     let topology = Topology::new("x").with_queue(QueueSpec::new("q", "k"));
//!     let route = Route::new("x", "k");
//!
//!     let mut broker = MockBroker::new();
//!     broker.expect_queue_exists("q").return_ok(true);
//!     broker.expect_publish(route.clone()).return_err(BrokerError::PublishFailed("nack".into()));
//!     broker.expect_publish(route.clone()).return_ok(());
//!
//!     let (publisher, queue) = OutboundPublisher::new(QueueCapacity::Unbounded, route, topology);
//!     queue.submit(Line("lost")).await.unwrap();
//!     queue.submit(Line("kept")).await.unwrap();
//!     drop(queue);
//!
//!     publisher.run(Arc::new(broker.clone()), Default::default()).await.unwrap();
//!     broker.verify();
//!     assert_eq!(broker.published().len(), 1);
//! }
//! ```

use crate::broker::{Broker, BrokerChannel, Delivery, Route, Subscription};
use crate::error::BrokerError;
use crate::topology::Topology;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug)]
enum Expectation {
    QueueExists {
        queue: String,
        response: Result<bool, BrokerError>,
    },
    Declare {
        response: Result<(), BrokerError>,
    },
    Publish {
        route: Route,
        response: Result<(), BrokerError>,
    },
    Consume {
        queue: String,
        response: Result<Vec<Vec<u8>>, BrokerError>,
    },
}

#[derive(Debug, Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    open_failure: Option<BrokerError>,
    published: Vec<(Route, Vec<u8>)>,
    acked: Vec<u64>,
    rejected: Vec<u64>,
}

type Shared = Arc<Mutex<MockState>>;

/// A broker with scripted channel behaviour. Clones share the script.
#[derive(Debug, Clone, Default)]
pub struct MockBroker {
    state: Shared,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `open_channel` call fail with `error`.
    pub fn fail_open(&mut self, error: BrokerError) {
        self.state.lock().unwrap().open_failure = Some(error);
    }

    /// Expects a passive queue check.
    pub fn expect_queue_exists(&mut self, queue: &str) -> ExpectationBuilder<bool> {
        let queue = queue.to_string();
        ExpectationBuilder::new(self.state.clone(), move |response| Expectation::QueueExists { queue, response })
    }

    /// Expects a topology declaration.
    pub fn expect_declare(&mut self) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(self.state.clone(), |response| Expectation::Declare { response })
    }

    /// Expects a publish to `route`. Successful publishes are recorded.
    pub fn expect_publish(&mut self, route: Route) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(self.state.clone(), move |response| Expectation::Publish { route, response })
    }

    /// Expects a consume on `queue`. `return_ok` takes the payloads to deliver,
    /// after which the subscription ends.
    pub fn expect_consume(&mut self, queue: &str) -> ExpectationBuilder<Vec<Vec<u8>>> {
        let queue = queue.to_string();
        ExpectationBuilder::new(self.state.clone(), move |response| Expectation::Consume { queue, response })
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                state.expectations.len(),
                state.expectations
            );
        }
    }

    pub fn published(&self) -> Vec<(Route, Vec<u8>)> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn acked(&self) -> Vec<u64> {
        self.state.lock().unwrap().acked.clone()
    }

    pub fn rejected(&self) -> Vec<u64> {
        self.state.lock().unwrap().rejected.clone()
    }
}

/// Builder that completes one expectation with its response.
pub struct ExpectationBuilder<T> {
    state: Shared,
    make: Box<dyn FnOnce(Result<T, BrokerError>) -> Expectation + Send>,
}

impl<T> ExpectationBuilder<T> {
    fn new<F>(state: Shared, make: F) -> Self
    where
        F: FnOnce(Result<T, BrokerError>) -> Expectation + Send + 'static,
    {
        Self {
            state,
            make: Box::new(make),
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        let expectation = (self.make)(Ok(value));
        self.state.lock().unwrap().expectations.push_back(expectation);
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: BrokerError) {
        let expectation = (self.make)(Err(error));
        self.state.lock().unwrap().expectations.push_back(expectation);
    }
}

#[async_trait]
impl Broker for MockBroker {
    async fn open_channel(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        if let Some(error) = self.state.lock().unwrap().open_failure.clone() {
            return Err(error);
        }
        Ok(Box::new(MockChannel {
            state: self.state.clone(),
        }))
    }
}

/// Channel handed out by [`MockBroker`].
#[derive(Debug)]
pub struct MockChannel {
    state: Shared,
}

impl MockChannel {
    fn next_expectation(&self, call: &str) -> Expectation {
        match self.state.lock().unwrap().expectations.pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected {call}: no expectations left"),
        }
    }
}

#[async_trait]
impl BrokerChannel for MockChannel {
    async fn declare_topology(&self, _topology: &Topology) -> Result<(), BrokerError> {
        match self.next_expectation("declare_topology") {
            Expectation::Declare { response } => response,
            other => panic!("Unexpected declare_topology, expected {other:?}"),
        }
    }

    async fn queue_exists(&self, queue: &str) -> Result<bool, BrokerError> {
        match self.next_expectation("queue_exists") {
            Expectation::QueueExists { queue: expected, response } if expected == queue => response,
            other => panic!("Unexpected queue_exists({queue}), expected {other:?}"),
        }
    }

    async fn publish(&self, route: &Route, payload: Vec<u8>) -> Result<(), BrokerError> {
        match self.next_expectation("publish") {
            Expectation::Publish { route: expected, response } if &expected == route => {
                if response.is_ok() {
                    self.state.lock().unwrap().published.push((route.clone(), payload));
                }
                response
            }
            other => panic!("Unexpected publish to {route}, expected {other:?}"),
        }
    }

    async fn consume(&self, queue: &str) -> Result<Subscription, BrokerError> {
        match self.next_expectation("consume") {
            Expectation::Consume { queue: expected, response } if expected == queue => {
                let payloads = response?;
                let (sender, receiver) = mpsc::unbounded_channel();
                for (index, payload) in payloads.into_iter().enumerate() {
                    let _ = sender.send(Delivery {
                        tag: index as u64 + 1,
                        payload,
                        redelivered: false,
                    });
                }
                Ok(Subscription::new("mock-consumer", receiver))
            }
            other => panic!("Unexpected consume({queue}), expected {other:?}"),
        }
    }

    async fn ack(&self, tag: u64) -> Result<(), BrokerError> {
        self.state.lock().unwrap().acked.push(tag);
        Ok(())
    }

    async fn reject(&self, tag: u64) -> Result<(), BrokerError> {
        self.state.lock().unwrap().rejected.push(tag);
        Ok(())
    }
}
