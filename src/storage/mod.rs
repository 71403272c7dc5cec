//! In-memory backing store for orders, address books and cart snapshots.
//!
//! Each collection is a [`ResourceActor`] task; [`MockOrderStorage`] is the typed
//! handle over all three. Nothing survives a process restart.

mod cart_snapshot;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::actor_framework::{FrameworkError, ResourceActor, ResourceClient};
use crate::address_actor::AddressAction;
use crate::domain::{
    AddressCreate, AddressPatch, CartItem, CartSnapshot, CustomerAddress, Order, OrderCreate,
};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};

fn next_uuid() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone)]
pub struct MockOrderStorage {
    orders: ResourceClient<Order>,
    addresses: ResourceClient<CustomerAddress>,
    carts: ResourceClient<CartSnapshot>,
}

impl MockOrderStorage {
    pub fn new(
        orders: ResourceClient<Order>,
        addresses: ResourceClient<CustomerAddress>,
        carts: ResourceClient<CartSnapshot>,
    ) -> Self {
        Self { orders, addresses, carts }
    }

    /// Spawns the three collection actors and returns the handle plus their join handles.
    pub fn start(buffer_size: usize) -> (Self, Vec<JoinHandle<()>>) {
        let (order_actor, orders) = ResourceActor::<Order>::new("orders", buffer_size, next_uuid);
        let (address_actor, addresses) =
            ResourceActor::<CustomerAddress>::new("addresses", buffer_size, next_uuid);
        let (cart_actor, carts) = ResourceActor::<CartSnapshot>::new("carts", buffer_size, next_uuid);

        let handles = vec![
            tokio::spawn(order_actor.run()),
            tokio::spawn(address_actor.run()),
            tokio::spawn(cart_actor.run()),
        ];
        (Self::new(orders, addresses, carts), handles)
    }

    // --- Orders ---

    #[instrument(skip(self, params), fields(items = params.items.len()))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<Order, OrderError> {
        self.orders.create(params).await.map_err(OrderError::from_order_store)
    }

    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, OrderError> {
        self.orders.get(id.to_string()).await.map_err(OrderError::from_order_store)
    }

    #[instrument(skip(self, action))]
    pub async fn apply_order_action(
        &self,
        id: &str,
        action: OrderAction,
    ) -> Result<OrderActionResult, OrderError> {
        self.orders
            .perform_action(id.to_string(), action)
            .await
            .map_err(OrderError::from_order_store)
    }

    /// All orders placed by `user_id`, newest first.
    #[instrument(skip(self))]
    pub async fn user_orders(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        let mut orders: Vec<Order> = self
            .orders
            .list()
            .await
            .map_err(OrderError::from_order_store)?
            .into_iter()
            .filter(|order| order.user_id.as_deref() == Some(user_id))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!(count = orders.len(), "Collected user orders");
        Ok(orders)
    }

    // --- Addresses ---

    pub async fn create_address(&self, params: AddressCreate) -> Result<CustomerAddress, OrderError> {
        self.addresses.create(params).await.map_err(OrderError::from_address_store)
    }

    pub async fn get_address(&self, id: &str) -> Result<Option<CustomerAddress>, OrderError> {
        self.addresses.get(id.to_string()).await.map_err(OrderError::from_address_store)
    }

    pub async fn update_address(
        &self,
        id: &str,
        patch: AddressPatch,
    ) -> Result<CustomerAddress, OrderError> {
        self.addresses
            .update(id.to_string(), patch)
            .await
            .map_err(OrderError::from_address_store)
    }

    pub async fn delete_address(&self, id: &str) -> Result<(), OrderError> {
        self.addresses.delete(id.to_string()).await.map_err(OrderError::from_address_store)
    }

    /// Unsets the default flag on every address of `user_id` except `keep`.
    #[instrument(skip(self))]
    pub async fn clear_default_addresses(
        &self,
        user_id: &str,
        keep: Option<&str>,
    ) -> Result<usize, OrderError> {
        let mut cleared = 0;
        for address in self.user_addresses(user_id).await? {
            if !address.is_default || Some(address.id.as_str()) == keep {
                continue;
            }
            if self
                .addresses
                .perform_action(address.id, AddressAction::ClearDefault)
                .await
                .map_err(OrderError::from_address_store)?
            {
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Address book of `user_id`: default first, then newest first.
    pub async fn user_addresses(&self, user_id: &str) -> Result<Vec<CustomerAddress>, OrderError> {
        let mut addresses: Vec<CustomerAddress> = self
            .addresses
            .list()
            .await
            .map_err(OrderError::from_address_store)?
            .into_iter()
            .filter(|address| address.user_id == user_id)
            .collect();
        addresses.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(addresses)
    }

    // --- Cart snapshots ---

    pub async fn cart(&self, user_id: &str) -> Result<Option<CartSnapshot>, OrderError> {
        self.carts.get(user_id.to_string()).await.map_err(OrderError::from_store)
    }

    pub async fn set_cart(&self, user_id: &str, items: Vec<CartItem>) -> Result<(), OrderError> {
        let snapshot = CartSnapshot {
            user_id: user_id.to_string(),
            items,
            updated_at: Utc::now(),
        };
        self.carts.put(snapshot).await.map_err(OrderError::from_store)
    }

    /// Removes the snapshot; clearing an absent cart is not an error.
    pub async fn clear_cart(&self, user_id: &str) -> Result<(), OrderError> {
        match self.carts.delete(user_id.to_string()).await {
            Ok(()) | Err(FrameworkError::NotFound(_)) => Ok(()),
            Err(e) => Err(OrderError::from_store(e)),
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.orders.shutdown().await;
        let _ = self.addresses.shutdown().await;
        let _ = self.carts.shutdown().await;
    }
}
