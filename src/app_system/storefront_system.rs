use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::SystemError;
use crate::cart::{CartContext, LocalCartStore, LocalStorage, RemoteCartStore};
use crate::checkout::{CheckoutFlow, PricingPolicy};
use crate::clients::{OrderClient, PaymentClient};
use crate::config::SystemSettings;
use crate::payment::PaymentService;
use crate::storage::MockOrderStorage;
use crate::webhooks::AppState;

/// Owns every actor of one storefront process.
///
/// Starts the storage collections and the payment gateway, hands out clients,
/// and stops them again on shutdown.
pub struct StorefrontSystem {
    pub order_client: OrderClient,
    pub payment_client: PaymentClient,
    handles: Vec<JoinHandle<()>>,
}

impl StorefrontSystem {
    pub fn new(settings: &SystemSettings) -> Self {
        // 1. Storage collections (orders, addresses, cart snapshots)
        let (storage, mut handles) = MockOrderStorage::start(settings.buffer_size);
        let order_client = OrderClient::new(storage, settings.latency);

        // 2. Payment gateway
        let (payment_service, payment_client) = PaymentService::new(settings.buffer_size, &settings.payment);
        handles.push(tokio::spawn(payment_service.run()));

        info!(actors = handles.len(), "Storefront system started");
        Self {
            order_client,
            payment_client,
            handles,
        }
    }

    /// A cart bound to this system's remote tier and the given device storage.
    pub fn cart(&self, local_storage: Arc<LocalStorage>) -> (CartContext, Arc<RemoteCartStore>) {
        let remote = Arc::new(RemoteCartStore::new(self.order_client.clone()));
        let local = Arc::new(LocalCartStore::new(local_storage.clone()));
        (CartContext::new(remote.clone(), local).with_session(local_storage), remote)
    }

    pub fn checkout(&self, pricing: PricingPolicy) -> CheckoutFlow {
        CheckoutFlow::new(self.order_client.clone(), self.payment_client.clone(), pricing)
    }

    pub fn webhook_state(&self, secret: Option<&str>) -> AppState {
        AppState {
            orders: self.order_client.clone(),
            payments: self.payment_client.clone(),
            secret: secret.map(Arc::from),
        }
    }

    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        self.order_client.shutdown().await;
        if let Err(e) = self.payment_client.shutdown().await {
            error!(error = %e, "Payment service already stopped");
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::TaskFailed(e.to_string()));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
