use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::lines;
use super::store::{select_backend, CartBackend, CartStore, RemoteStatus};
use super::{CartError, LocalStorage};
use crate::domain::{CartItem, MockUser, NewCartItem};

/// The in-progress cart.
///
/// Edits apply to the in-memory lines first and are then persisted to the
/// tier chosen by [`select_backend`]. A failing remote write falls back to the
/// local tier; persistence problems are logged and never reach the caller.
#[derive(Clone)]
pub struct CartContext {
    items: Arc<Mutex<Vec<CartItem>>>,
    user_id: Arc<RwLock<Option<String>>>,
    remote: Arc<dyn CartStore>,
    local: Arc<dyn CartStore>,
    session: Option<Arc<LocalStorage>>,
}

impl CartContext {
    pub fn new(remote: Arc<dyn CartStore>, local: Arc<dyn CartStore>) -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            user_id: Arc::new(RwLock::new(None)),
            remote,
            local,
            session: None,
        }
    }

    /// Persists the signed-in user under `current_user` in `storage`.
    pub fn with_session(mut self, storage: Arc<LocalStorage>) -> Self {
        self.session = Some(storage);
        self
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.items.lock().await.clone()
    }

    /// `None` when the cart total overflows.
    pub async fn total_price(&self) -> Option<Decimal> {
        lines::total_price(&self.items.lock().await)
    }

    pub async fn total_items(&self) -> u32 {
        lines::total_items(&self.items.lock().await)
    }

    /// Which tier the next write goes to.
    pub async fn backend(&self) -> CartBackend {
        let user_id = self.user_id();
        let status = match user_id {
            Some(_) => self.remote.probe().await,
            None => RemoteStatus::Unreachable,
        };
        select_backend(user_id.as_deref(), status)
    }

    /// Replaces the in-memory cart with what the current tier holds.
    #[instrument(skip(self), fields(user_id = ?self.user_id()))]
    pub async fn load(&self) {
        let mut items = self.items.lock().await;
        *items = self.fetch().await;
        debug!(lines = items.len(), "Cart loaded");
    }

    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_item(&self, item: NewCartItem) -> Result<(), CartError> {
        let mut items = self.items.lock().await;
        lines::add_line(&mut items, item)?;
        self.persist(&items).await;
        Ok(())
    }

    /// Unknown ids are ignored.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_item_id: &str) {
        let mut items = self.items.lock().await;
        if lines::remove_line(&mut items, cart_item_id) {
            self.persist(&items).await;
        }
    }

    /// Zero removes the line.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, cart_item_id: &str, quantity: u32) -> Result<(), CartError> {
        let mut items = self.items.lock().await;
        lines::set_quantity(&mut items, cart_item_id, quantity)?;
        self.persist(&items).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        let mut items = self.items.lock().await;
        items.clear();
        let user_id = self.user_id();
        if self.backend().await == CartBackend::Remote {
            match self.remote.clear(user_id.as_deref()).await {
                Ok(()) => return,
                Err(err) => warn!(error = %err, "Remote cart clear failed, clearing local cart"),
            }
        }
        if let Err(err) = self.local.clear(user_id.as_deref()).await {
            warn!(error = %err, "Local cart clear failed");
        }
    }

    /// Signs `user_id` in and merges the guest cart into theirs.
    #[instrument(skip(self))]
    pub async fn sign_in(&self, user_id: &str) {
        *self.user_id.write() = Some(user_id.to_string());
        if let Some(storage) = &self.session {
            let known = storage
                .mock_users()
                .map(|users| users.into_iter().find(|user| user.id == user_id));
            let user = match known {
                Ok(Some(user)) => user,
                Ok(None) => MockUser::new(user_id),
                Err(err) => {
                    warn!(error = %err, "Could not read mock users");
                    MockUser::new(user_id)
                }
            };
            if let Err(err) = storage.set_current_user(Some(&user)).await {
                warn!(error = %err, "Could not persist the signed-in user");
            }
        }
        self.sync_cart_from_local_storage().await;
    }

    /// Back to the guest cart held on this device.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        *self.user_id.write() = None;
        if let Some(storage) = &self.session {
            if let Err(err) = storage.set_current_user(None).await {
                warn!(error = %err, "Could not clear the signed-in user");
            }
        }
        self.load().await;
    }

    /// Picks up the user persisted by an earlier [`sign_in`](Self::sign_in)
    /// and loads their cart. Returns the restored user id.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Option<String> {
        let user = match self.session.as_ref().map(|storage| storage.current_user()) {
            Some(Ok(user)) => user,
            Some(Err(err)) => {
                warn!(error = %err, "Could not read the signed-in user");
                None
            }
            None => None,
        };
        *self.user_id.write() = user.as_ref().map(|user| user.id.clone());
        self.load().await;
        user.map(|user| user.id)
    }

    /// Guest-to-user merge.
    ///
    /// Loads the user's cart, merges every local line into it clamped at the
    /// inventory and persists the result. The local cart is only cleared once
    /// the merged cart reached the remote tier.
    #[instrument(skip(self), fields(user_id = ?self.user_id()))]
    pub async fn sync_cart_from_local_storage(&self) {
        let mut items = self.items.lock().await;
        *items = self.fetch().await;

        let guest_lines = match self.local.load(None).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "Could not read local cart");
                return;
            }
        };
        if guest_lines.is_empty() || self.backend().await == CartBackend::Local {
            return;
        }

        for line in &guest_lines {
            let dropped = lines::merge_line(&mut items, NewCartItem::from(line));
            if dropped > 0 {
                warn!(product_id = %line.product_id, dropped, "Merged quantity capped at inventory");
            }
        }

        if self.persist(&items).await == CartBackend::Remote {
            if let Err(err) = self.local.clear(None).await {
                warn!(error = %err, "Could not clear local cart after merge");
            }
            info!(merged = guest_lines.len(), "Guest cart merged");
        }
    }

    /// Reloads the cart whenever the remote tier reports a change for the
    /// signed-in user. Returns `None` when there is nothing to listen to.
    #[instrument(skip(self))]
    pub async fn subscribe_to_changes(&self) -> Option<JoinHandle<()>> {
        let user_id = self.user_id()?;
        match self.remote.probe().await {
            RemoteStatus::Reachable => {}
            status => {
                debug!(?status, "Skipping cart change subscription");
                return None;
            }
        }
        let mut changes = self.remote.subscribe()?;
        let context = self.clone();

        Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.user_id == user_id => {
                        if context.user_id().as_deref() != Some(user_id.as_str()) {
                            break;
                        }
                        context.load().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Cart change subscriber lagged");
                        context.load().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!(user_id = %user_id, "Cart change subscription ended");
        }))
    }

    async fn fetch(&self) -> Vec<CartItem> {
        let user_id = self.user_id();
        if self.backend().await == CartBackend::Remote {
            match self.remote.load(user_id.as_deref()).await {
                Ok(items) => return items,
                Err(err) => warn!(error = %err, "Remote cart load failed, using local cart"),
            }
        }
        self.local.load(user_id.as_deref()).await.unwrap_or_else(|err| {
            warn!(error = %err, "Local cart load failed, starting empty");
            Vec::new()
        })
    }

    /// Returns the tier the lines ended up in.
    async fn persist(&self, items: &[CartItem]) -> CartBackend {
        let user_id = self.user_id();
        if self.backend().await == CartBackend::Remote {
            match self.remote.save(user_id.as_deref(), items).await {
                Ok(()) => return CartBackend::Remote,
                Err(err) => warn!(store = self.remote.name(), error = %err, "Remote cart write failed, saving locally"),
            }
        }
        if let Err(err) = self.local.save(user_id.as_deref(), items).await {
            warn!(store = self.local.name(), error = %err, "Local cart write failed");
        }
        CartBackend::Local
    }
}
