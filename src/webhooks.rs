//! Payment gateway webhook endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha512;
use tracing::{debug, info, instrument, warn};

use crate::clients::{OrderClient, PaymentClient};
use crate::domain::PaymentStatus;
use crate::payment::{PaymentError, TransactionStatus};

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

type HmacSha512 = Hmac<Sha512>;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderClient,
    pub payments: PaymentClient,
    /// Shared secret for gateway signatures. Without one the signed endpoint is disabled.
    pub secret: Option<Arc<str>>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/webhooks/paystack", post(paystack_webhook))
        .route("/api/webhooks/mock-payment", post(mock_payment_webhook))
        .with_state(state)
}

/// Serves the webhook router until Ctrl-C.
pub async fn serve(bind: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, "Webhook server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}

/// Hex HMAC-SHA512 of `body`, as the gateway sends it.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[instrument(skip_all)]
async fn paystack_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> HandlerResult {
    let Some(secret) = state.secret.as_deref() else {
        warn!("Webhook secret not configured");
        return Err(reject(StatusCode::SERVICE_UNAVAILABLE, "Webhook secret not configured"));
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing signature"))?;
    if !verify_signature(secret, &body, signature) {
        warn!("Rejecting webhook with invalid signature");
        return Err(reject(StatusCode::UNAUTHORIZED, "Invalid signature"));
    }
    receive(&state, &body).await
}

#[instrument(skip_all)]
async fn mock_payment_webhook(State(state): State<AppState>, body: Bytes) -> HandlerResult {
    receive(&state, &body).await
}

async fn receive(state: &AppState, body: &[u8]) -> HandlerResult {
    let event: WebhookEvent = serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "Malformed webhook body");
        reject(StatusCode::BAD_REQUEST, "Invalid JSON payload")
    })?;
    dispatch(state, &event).await;
    Ok(Json(json!({ "received": true })))
}

/// Applies a gateway event. Processing problems are logged; the sender
/// always gets an acknowledgement.
#[instrument(skip(state, event), fields(event = %event.event))]
pub async fn dispatch(state: &AppState, event: &WebhookEvent) {
    match event.event.as_str() {
        "charge.success" => settle_charge(state, &event.data, PaymentStatus::Paid, TransactionStatus::Success).await,
        "charge.failed" => settle_charge(state, &event.data, PaymentStatus::Failed, TransactionStatus::Failed).await,
        "transfer.success" => info!(reference = ?str_field(&event.data, "reference"), "Transfer succeeded"),
        "transfer.failed" => warn!(reference = ?str_field(&event.data, "reference"), "Transfer failed"),
        other => info!(event = other, "Unhandled webhook event"),
    }
}

async fn settle_charge(
    state: &AppState,
    data: &Value,
    payment_status: PaymentStatus,
    transaction_status: TransactionStatus,
) {
    let reference = str_field(data, "reference");
    let channel = str_field(data, "channel");
    let Some(order_id) = data.pointer("/metadata/order_id").and_then(Value::as_str) else {
        warn!(reference = ?reference, "Charge event without metadata.order_id");
        return;
    };

    match state
        .orders
        .update_payment_status(order_id, payment_status, reference.clone(), channel)
        .await
    {
        Ok(order) => info!(
            order_id,
            payment_status = %order.payment_status,
            status = %order.status,
            "Order payment updated from webhook"
        ),
        Err(err) => warn!(order_id, error = %err, "Could not apply webhook to order"),
    }

    if let Some(reference) = reference {
        match state.payments.complete_transaction(reference, transaction_status).await {
            Ok(_) | Err(PaymentError::TransactionNotFound(_)) => {}
            Err(err) => warn!(error = %err, "Could not update mock transaction"),
        }
    }
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}
