use tracing::{debug, info, instrument, warn};

use crate::config::SimulatedLatency;
use crate::domain::{
    AddressCreate, AddressPatch, CartItem, CourierInfo, CustomerAddress, Order, OrderCreate, OrderPage,
    OrderStatus, PaymentStatus, TrackingEvent,
};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use crate::storage::MockOrderStorage;

/// Client-side order service over the mock storage.
///
/// Every operation waits out a simulated round-trip before touching storage.
/// Mutations go through named [`OrderAction`]s and fail with
/// [`OrderError::NotFound`] when the order id is unknown.
#[derive(Clone)]
pub struct OrderClient {
    storage: MockOrderStorage,
    latency: SimulatedLatency,
}

impl OrderClient {
    pub fn new(storage: MockOrderStorage, latency: SimulatedLatency) -> Self {
        Self { storage, latency }
    }

    #[instrument(skip(self, params), fields(user_id = ?params.user_id, items = params.items.len()))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<Order, OrderError> {
        info!("Processing create_order request");
        self.latency.write().await;
        let order = self.storage.create_order(params).await?;
        info!(order_id = %order.id, order_number = %order.order_number, total = %order.total, "Order created");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, OrderError> {
        debug!("Processing get_order request");
        self.latency.read().await;
        self.storage.get_order(id).await
    }

    /// One page of `user_id`'s orders, newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn get_user_orders(
        &self,
        user_id: &str,
        page: usize,
        limit: usize,
    ) -> Result<OrderPage, OrderError> {
        self.latency.read().await;
        let orders = self.storage.user_orders(user_id).await?;
        let page = page.max(1);
        let total = orders.len();
        let orders = orders
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Ok(OrderPage { orders, total, page, limit })
    }

    #[instrument(skip(self, notes))]
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, OrderError> {
        self.latency.write().await;
        if let Some(current) = self.storage.get_order(id).await? {
            if current.status.is_terminal() && current.status != status {
                warn!(from = %current.status, to = %status, "Leaving a terminal status");
            }
        }
        match self.storage.apply_order_action(id, OrderAction::SetStatus { status, notes }).await? {
            OrderActionResult::SetStatus(order) => {
                info!(status = %order.status, "Order status updated");
                Ok(order)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Records a payment outcome. `Paid` also moves the order to `Confirmed`.
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        reference: Option<String>,
        channel: Option<String>,
    ) -> Result<Order, OrderError> {
        self.latency.write().await;
        let action = OrderAction::SetPayment { payment_status, reference, channel };
        match self.storage.apply_order_action(id, action).await? {
            OrderActionResult::SetPayment(order) => {
                info!(payment_status = %order.payment_status, status = %order.status, "Payment status updated");
                Ok(order)
            }
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, description, location, notes))]
    pub async fn add_tracking_event(
        &self,
        id: &str,
        status: OrderStatus,
        description: impl Into<String>,
        location: Option<String>,
        notes: Option<String>,
    ) -> Result<TrackingEvent, OrderError> {
        self.latency.write().await;
        let action = OrderAction::AppendTracking {
            status,
            description: description.into(),
            location,
            notes,
        };
        match self.storage.apply_order_action(id, action).await? {
            OrderActionResult::AppendTracking(event) => Ok(event),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self, info), fields(company = %info.company))]
    pub async fn update_courier_info(&self, id: &str, info: CourierInfo) -> Result<Order, OrderError> {
        self.latency.write().await;
        match self.storage.apply_order_action(id, OrderAction::SetCourier(info)).await? {
            OrderActionResult::SetCourier(order) => Ok(order),
            other => Err(unexpected(other)),
        }
    }

    // --- Address book ---

    /// Saves an address. A new default unsets every other default of the user first.
    #[instrument(skip(self, params), fields(user_id = %params.user_id, is_default = params.is_default))]
    pub async fn add_customer_address(&self, params: AddressCreate) -> Result<CustomerAddress, OrderError> {
        self.latency.write().await;
        if params.is_default {
            self.storage.clear_default_addresses(&params.user_id, None).await?;
        }
        self.storage.create_address(params).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_customer_address(
        &self,
        address_id: &str,
        patch: AddressPatch,
    ) -> Result<CustomerAddress, OrderError> {
        self.latency.write().await;
        if patch.is_default == Some(true) {
            let existing = self
                .storage
                .get_address(address_id)
                .await?
                .ok_or_else(|| OrderError::AddressNotFound(address_id.to_string()))?;
            self.storage
                .clear_default_addresses(&existing.user_id, Some(address_id))
                .await?;
        }
        self.storage.update_address(address_id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn delete_customer_address(&self, address_id: &str) -> Result<(), OrderError> {
        self.latency.write().await;
        self.storage.delete_address(address_id).await
    }

    /// Default address first, then newest first.
    #[instrument(skip(self))]
    pub async fn get_customer_addresses(&self, user_id: &str) -> Result<Vec<CustomerAddress>, OrderError> {
        self.latency.read().await;
        self.storage.user_addresses(user_id).await
    }

    // --- Cart snapshots ---

    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn sync_cart_to_storage(&self, user_id: &str, items: Vec<CartItem>) -> Result<(), OrderError> {
        self.latency.write().await;
        self.storage.set_cart(user_id, items).await
    }

    #[instrument(skip(self))]
    pub async fn get_cart_from_storage(&self, user_id: &str) -> Result<Vec<CartItem>, OrderError> {
        self.latency.read().await;
        Ok(self
            .storage
            .cart(user_id)
            .await?
            .map(|snapshot| snapshot.items)
            .unwrap_or_default())
    }

    #[instrument(skip(self))]
    pub async fn clear_cart_storage(&self, user_id: &str) -> Result<(), OrderError> {
        self.latency.write().await;
        self.storage.clear_cart(user_id).await
    }

    // --- Notifications (log only) ---

    #[instrument(skip(self, order), fields(order_id = %order.id, email = ?order.customer_email))]
    pub async fn send_order_confirmation_email(&self, order: &Order) -> Result<(), OrderError> {
        self.latency.notify().await;
        info!(order_number = %order.order_number, total = %order.total, "Order confirmation email sent");
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, email = ?order.customer_email))]
    pub async fn send_shipping_notification(&self, order: &Order) -> Result<(), OrderError> {
        self.latency.notify().await;
        match &order.courier {
            Some(courier) => info!(
                company = %courier.company,
                tracking_number = %courier.tracking_number,
                "Shipping notification sent"
            ),
            None => info!("Shipping notification sent without courier details"),
        }
        Ok(())
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, email = ?order.customer_email))]
    pub async fn send_delivery_notification(&self, order: &Order) -> Result<(), OrderError> {
        self.latency.notify().await;
        info!(delivered_at = ?order.delivered_at, "Delivery notification sent");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.storage.shutdown().await;
    }
}

fn unexpected(result: OrderActionResult) -> OrderError {
    OrderError::UnexpectedReply(format!("{:?}", result))
}
