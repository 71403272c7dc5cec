use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use super::local_storage::{LocalStorage, CART_KEY};
use super::CartStoreError;
use crate::clients::OrderClient;
use crate::domain::CartItem;

/// Reachability of the remote cart table as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Reachable,
    Unreachable,
    SchemaMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartBackend {
    Remote,
    Local,
}

/// Published by the remote tier after every write to a user's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChange {
    pub user_id: String,
}

/// Remote only for a signed-in user with a reachable remote table.
pub fn select_backend(user_id: Option<&str>, remote: RemoteStatus) -> CartBackend {
    match (user_id, remote) {
        (Some(_), RemoteStatus::Reachable) => CartBackend::Remote,
        _ => CartBackend::Local,
    }
}

/// One persistence tier for cart lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn probe(&self) -> RemoteStatus;

    async fn load(&self, user_id: Option<&str>) -> Result<Vec<CartItem>, CartStoreError>;

    async fn save(&self, user_id: Option<&str>, items: &[CartItem]) -> Result<(), CartStoreError>;

    async fn clear(&self, user_id: Option<&str>) -> Result<(), CartStoreError>;

    fn subscribe(&self) -> Option<broadcast::Receiver<CartChange>> {
        None
    }
}

/// Cart snapshots held by the order service, one per signed-in user.
pub struct RemoteCartStore {
    orders: OrderClient,
    status: Arc<RwLock<RemoteStatus>>,
    changes: broadcast::Sender<CartChange>,
}

impl RemoteCartStore {
    pub fn new(orders: OrderClient) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            orders,
            status: Arc::new(RwLock::new(RemoteStatus::Reachable)),
            changes,
        }
    }

    pub fn set_status(&self, status: RemoteStatus) {
        *self.status.write() = status;
    }

    fn available<'a>(&self, user_id: Option<&'a str>) -> Result<&'a str, CartStoreError> {
        match *self.status.read() {
            RemoteStatus::Reachable => {}
            RemoteStatus::Unreachable => return Err(CartStoreError::Unavailable("remote unreachable".into())),
            RemoteStatus::SchemaMissing => return Err(CartStoreError::SchemaMissing),
        }
        user_id.ok_or_else(|| CartStoreError::Unavailable("no signed-in user".into()))
    }
}

#[async_trait]
impl CartStore for RemoteCartStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn probe(&self) -> RemoteStatus {
        *self.status.read()
    }

    #[instrument(skip(self))]
    async fn load(&self, user_id: Option<&str>) -> Result<Vec<CartItem>, CartStoreError> {
        let user_id = self.available(user_id)?;
        self.orders
            .get_cart_from_storage(user_id)
            .await
            .map_err(|err| CartStoreError::Unavailable(err.to_string()))
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    async fn save(&self, user_id: Option<&str>, items: &[CartItem]) -> Result<(), CartStoreError> {
        let user_id = self.available(user_id)?;
        self.orders
            .sync_cart_to_storage(user_id, items.to_vec())
            .await
            .map_err(|err| CartStoreError::Unavailable(err.to_string()))?;
        // No receivers is fine.
        let _ = self.changes.send(CartChange { user_id: user_id.to_string() });
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, user_id: Option<&str>) -> Result<(), CartStoreError> {
        let user_id = self.available(user_id)?;
        self.orders
            .clear_cart_storage(user_id)
            .await
            .map_err(|err| CartStoreError::Unavailable(err.to_string()))?;
        let _ = self.changes.send(CartChange { user_id: user_id.to_string() });
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<CartChange>> {
        Some(self.changes.subscribe())
    }
}

/// The device-local cart under the `cart` key. There is one per device, so
/// the user id is ignored.
pub struct LocalCartStore {
    storage: Arc<LocalStorage>,
}

impl LocalCartStore {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CartStore for LocalCartStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn probe(&self) -> RemoteStatus {
        RemoteStatus::Reachable
    }

    async fn load(&self, _user_id: Option<&str>) -> Result<Vec<CartItem>, CartStoreError> {
        let items = self.storage.get::<Vec<CartItem>>(CART_KEY).map_err(local_error)?;
        Ok(items.unwrap_or_default())
    }

    async fn save(&self, _user_id: Option<&str>, items: &[CartItem]) -> Result<(), CartStoreError> {
        debug!(lines = items.len(), "Saving cart locally");
        self.storage.set(CART_KEY, &items).await.map_err(local_error)
    }

    async fn clear(&self, _user_id: Option<&str>) -> Result<(), CartStoreError> {
        self.storage.remove(CART_KEY).await.map_err(local_error)
    }
}

fn local_error(err: super::LocalStorageError) -> CartStoreError {
    CartStoreError::Storage(err.to_string())
}
