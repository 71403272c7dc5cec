use std::sync::Arc;

use rust_decimal_macros::dec;
use tracing::{info, info_span, warn, Instrument};

use super::{StorefrontSystem, SystemError};
use crate::cart::LocalStorage;
use crate::checkout::{CheckoutOutcome, CheckoutRequest};
use crate::config::AppConfig;
use crate::domain::{
    Address, AddressCreate, CourierInfo, MockEmail, MockEmailKind, MockUser, NewCartItem, OrderStatus, PaymentMethod,
};
use crate::payment::{PaymentPrompt, PromptChoice, ScriptedPrompt, TerminalPrompt};

const DEMO_USER: &str = "user_demo";

fn demo_address() -> Address {
    Address {
        full_name: "Ada Obi".into(),
        phone: "+234 803 123 4567".into(),
        address_line1: "12 Allen Avenue".into(),
        address_line2: None,
        city: "Ikeja".into(),
        state: "Lagos".into(),
        postal_code: Some("100271".into()),
        country: "Nigeria".into(),
    }
}

/// Guest cart, sign-in merge, checkout, payment and delivery, logged step by step.
pub async fn run(system: &StorefrontSystem, config: &AppConfig, interactive: bool) -> Result<(), SystemError> {
    let local_storage = Arc::new(LocalStorage::open(&config.local_storage).await?);
    let guest_id = local_storage.guest_session_id().await?;
    let (cart, _remote) = system.cart(local_storage.clone());

    if let Some(user_id) = cart.restore_session().await {
        info!(user_id = %user_id, "Signing out the session left by a previous run");
        cart.sign_out().await;
    }

    // 1. Browse as a guest
    async {
        cart.load().await;
        cart.add_item(NewCartItem::new("prod_tote", "Ankara tote bag", dec!(18500), 10).with_image("/images/tote.jpg"))
            .await?;
        cart.add_item(
            NewCartItem::new("prod_scarf", "Adire silk scarf", dec!(12000), 4).with_variant("indigo", "Indigo"),
        )
        .await?;
        info!(
            items = cart.total_items().await,
            total = ?cart.total_price().await,
            "Guest cart ready"
        );
        Ok::<_, SystemError>(())
    }
    .instrument(info_span!("guest_cart", guest_id = %guest_id))
    .await?;

    // 2. Register and sign in; the guest cart merges into the user's cart
    let account = MockUser::new(DEMO_USER)
        .with_email("ada@example.com")
        .with_full_name("Ada Obi");
    if !local_storage.mock_users()?.iter().any(|user| user.id == DEMO_USER) {
        local_storage.save_mock_user(&account).await?;
        local_storage
            .record_mock_email(&MockEmail::new("ada@example.com", MockEmailKind::Activation))
            .await?;
        info!(user_id = DEMO_USER, "Mock account registered");
    }
    cart.sign_in(DEMO_USER).await;
    let subscription = cart.subscribe_to_changes().await;
    info!(items = cart.total_items().await, backend = ?cart.backend().await, "Signed in");

    system
        .order_client
        .add_customer_address(AddressCreate {
            user_id: DEMO_USER.into(),
            label: Some("Home".into()),
            address: demo_address(),
            is_default: true,
        })
        .await?;

    // 3. Checkout
    let prompt: Box<dyn PaymentPrompt> = if interactive {
        Box::new(TerminalPrompt)
    } else {
        Box::new(ScriptedPrompt::always(PromptChoice::Success))
    };
    let request = CheckoutRequest {
        email: "ada@example.com".into(),
        shipping_address: demo_address(),
        billing_address: None,
        payment_method: PaymentMethod::Card,
        notes: Some("Leave with the gateman".into()),
    };
    let outcome = system
        .checkout(config.pricing())
        .place_order(&cart, request, prompt.as_ref())
        .instrument(info_span!("checkout", user_id = DEMO_USER))
        .await?;

    match outcome {
        CheckoutOutcome::Confirmed { order, reference } => {
            info!(order_number = %order.order_number, reference = %reference, total = %order.total, "Order confirmed");
            fulfil(system, &order.id).instrument(info_span!("fulfilment", order_id = %order.id)).await?;
        }
        CheckoutOutcome::PaymentFailed { order_id, reference } => {
            warn!(order_id = %order_id, reference = %reference, "Payment declined; cart kept for a retry");
        }
        CheckoutOutcome::Cancelled { order_id } => {
            warn!(order_id = %order_id, "Payment cancelled; order left pending");
        }
    }

    let history = system.order_client.get_user_orders(DEMO_USER, 1, 10).await?;
    for order in &history.orders {
        info!(
            order_number = %order.order_number,
            status = %order.status,
            payment_status = %order.payment_status,
            tracking_events = order.tracking.len(),
            "Order history"
        );
    }

    if let Some(handle) = subscription {
        handle.abort();
    }
    Ok(())
}

async fn fulfil(system: &StorefrontSystem, order_id: &str) -> Result<(), SystemError> {
    let orders = &system.order_client;
    orders.update_order_status(order_id, OrderStatus::Processing, None).await?;

    orders
        .update_courier_info(
            order_id,
            CourierInfo {
                company: "GIG Logistics".into(),
                tracking_number: "GIG-20931-LOS".into(),
                estimated_delivery: Some(chrono::Utc::now() + chrono::Duration::days(3)),
                actual_delivery: None,
                pickup_date: Some(chrono::Utc::now()),
            },
        )
        .await?;
    let shipped = orders.update_order_status(order_id, OrderStatus::Shipped, None).await?;
    orders.send_shipping_notification(&shipped).await?;

    orders
        .add_tracking_event(order_id, OrderStatus::Shipped, "Arrived at Ikeja hub", Some("Ikeja".into()), None)
        .await?;
    let delivered = orders
        .update_order_status(order_id, OrderStatus::Delivered, Some("Received by customer".into()))
        .await?;
    orders.send_delivery_notification(&delivered).await?;
    info!(tracking_events = delivered.tracking.len(), "Order delivered");
    Ok(())
}
