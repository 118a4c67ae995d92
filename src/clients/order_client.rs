use crate::model::{Order, OrderCreate, OrderId};
use crate::order_service::OrderError;
use chrono::Utc;
use std::sync::Arc;
use sync_framework::{DispatchQueue, IdAllocator, SharedStore};
use tracing::{debug, info, instrument, warn};

/// Application-facing handle of the Order service.
///
/// Placing an order stores it locally and queues it for publication; the call
/// never waits on the broker.
#[derive(Clone)]
pub struct OrderClient {
    orders: SharedStore<OrderId, Order>,
    ids: Arc<IdAllocator>,
    dispatch: DispatchQueue<Order>,
}

impl OrderClient {
    pub fn new(orders: SharedStore<OrderId, Order>, ids: Arc<IdAllocator>, dispatch: DispatchQueue<Order>) -> Self {
        Self { orders, ids, dispatch }
    }

    #[instrument(skip(self, params))]
    pub async fn place_order(&self, params: OrderCreate) -> Result<Order, OrderError> {
        debug!(?params, "place_order called");
        validate(&params)?;

        let id: OrderId = self.ids.next_id()?;
        let order = Order::new(id, params, Utc::now());
        self.orders.upsert(id, order.clone());

        if let Err(e) = self.dispatch.submit(order.clone()).await {
            warn!(order_id = %id, error = %e, "Order stored locally but not queued for publication");
            return Err(e.into());
        }
        info!(order_id = %id, "Order placed");
        Ok(order)
    }

    pub fn get(&self, id: OrderId) -> Option<Arc<Order>> {
        self.orders.get(&id)
    }

    /// All known orders, ordered by id.
    pub fn orders(&self) -> Vec<Arc<Order>> {
        self.orders.values()
    }
}

fn validate(params: &OrderCreate) -> Result<(), OrderError> {
    if params.customer_name.trim().is_empty() {
        return Err(OrderError::ValidationError("customer name is empty".to_string()));
    }
    if params.shipping_address.trim().is_empty() {
        return Err(OrderError::ValidationError("shipping address is empty".to_string()));
    }
    if !params.total_price.is_finite() || params.total_price < 0.0 {
        return Err(OrderError::ValidationError(format!(
            "total price {} is not a non-negative amount",
            params.total_price
        )));
    }
    Ok(())
}
