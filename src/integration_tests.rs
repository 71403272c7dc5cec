#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::app_system::StorefrontSystem;
    use crate::actor_framework::Entity;
    use crate::cart::{CartBackend, LocalStorage};
    use crate::checkout::{CheckoutOutcome, CheckoutRequest, PricingPolicy};
    use crate::clients::OrderClient;
    use crate::config::{SimulatedLatency, SystemSettings};
    use crate::domain::{
        Address, CartSnapshot, CustomerAddress, NewCartItem, Order, OrderCreate, OrderItem, OrderStatus, PaymentMethod,
        PaymentStatus,
    };
    use crate::mock_framework::{create_mock_client, expect_action, expect_get};
    use crate::order_actor::{OrderAction, OrderActionResult};
    use crate::payment::{OutcomeConfig, PaymentSettings, PromptChoice, ScriptedPrompt, TransactionStatus};
    use crate::storage::MockOrderStorage;
    use crate::webhooks::{dispatch, WebhookEvent};

    fn system() -> StorefrontSystem {
        StorefrontSystem::new(&SystemSettings {
            buffer_size: 32,
            latency: SimulatedLatency::none(),
            payment: PaymentSettings {
                currency: "NGN".into(),
                latency: Duration::ZERO,
                outcome: OutcomeConfig::Random { success_rate: 0.8, seed: Some(11) },
            },
        })
    }

    fn pricing() -> PricingPolicy {
        PricingPolicy {
            shipping_fee: dec!(2500),
            free_shipping_threshold: Some(dec!(50000)),
            tax_rate: dec!(0.075),
        }
    }

    fn checkout_request() -> CheckoutRequest {
        CheckoutRequest {
            email: "ada@example.com".into(),
            shipping_address: Address {
                full_name: "Ada Obi".into(),
                phone: "08031234567".into(),
                address_line1: "12 Allen Avenue".into(),
                address_line2: None,
                city: "Ikeja".into(),
                state: "Lagos".into(),
                postal_code: None,
                country: "Nigeria".into(),
            },
            billing_address: None,
            payment_method: PaymentMethod::Card,
            notes: None,
        }
    }

    #[tokio::test]
    async fn guest_to_delivered_order() {
        let system = system();
        let (cart, _remote) = system.cart(Arc::new(LocalStorage::in_memory()));

        // 1. Guest cart lives in local storage only
        cart.add_item(NewCartItem::new("p1", "Ankara tote", dec!(18500), 10)).await.unwrap();
        cart.add_item(NewCartItem::new("p2", "Silk scarf", dec!(12000), 3).with_variant("indigo", "Indigo"))
            .await
            .unwrap();
        assert_eq!(cart.backend().await, CartBackend::Local);

        // 2. Sign-in merges it into the remote cart
        cart.sign_in("u1").await;
        assert_eq!(cart.backend().await, CartBackend::Remote);
        let remote_lines = system.order_client.get_cart_from_storage("u1").await.unwrap();
        assert_eq!(remote_lines.len(), 2);

        // 3. Checkout with a successful payment
        let outcome = system
            .checkout(pricing())
            .place_order(&cart, checkout_request(), &ScriptedPrompt::always(PromptChoice::Success))
            .await
            .unwrap();
        let CheckoutOutcome::Confirmed { order, reference } = outcome else {
            panic!("expected confirmation, got {outcome:?}");
        };
        assert_eq!(order.subtotal, dec!(30500));
        assert_eq!(order.shipping, dec!(2500));
        assert_eq!(order.tax, dec!(2287.50));
        assert_eq!(order.total, dec!(35287.50));
        assert!(cart.items().await.is_empty());

        // 4. Verification reports a settled outcome that matches the stored transaction
        let verification = system.payment_client.verify_transaction(reference.clone()).await.unwrap();
        let stored = system.payment_client.get_transaction(reference).await.unwrap().unwrap();
        assert_eq!(verification.outcome(), Some(stored.status));

        // 5. Fulfilment appends one tracking event per explicit status change
        let orders = &system.order_client;
        orders.update_order_status(&order.id, OrderStatus::Processing, None).await.unwrap();
        orders.update_order_status(&order.id, OrderStatus::Shipped, None).await.unwrap();
        let delivered = orders.update_order_status(&order.id, OrderStatus::Delivered, None).await.unwrap();
        let statuses: Vec<_> = delivered.tracking.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered
            ]
        );
        assert!(delivered.delivered_at.is_some());

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn webhook_settles_an_order_left_pending() {
        let system = system();
        let (cart, _remote) = system.cart(Arc::new(LocalStorage::in_memory()));
        cart.sign_in("u2").await;
        cart.add_item(NewCartItem::new("p1", "Ankara tote", dec!(60000), 2)).await.unwrap();

        let outcome = system
            .checkout(pricing())
            .place_order(&cart, checkout_request(), &ScriptedPrompt::always(PromptChoice::Cancel))
            .await
            .unwrap();
        let CheckoutOutcome::Cancelled { order_id } = outcome else {
            panic!("expected cancellation, got {outcome:?}");
        };

        let state = system.webhook_state(None);
        let event: WebhookEvent = serde_json::from_value(json!({
            "event": "charge.success",
            "data": { "reference": "PSK_123", "channel": "bank", "metadata": { "order_id": order_id } }
        }))
        .unwrap();
        dispatch(&state, &event).await;

        let order = system.order_client.get_order(&order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("PSK_123"));
        assert_eq!(order.shipping, dec!(0));

        let page = system.order_client.get_user_orders("u2", 1, 10).await.unwrap();
        assert_eq!(page.total, 1);
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn seeded_verification_matches_stored_status() {
        let system = system();
        for _ in 0..10 {
            let init = system
                .payment_client
                .initialize_transaction(crate::payment::TransactionRequest {
                    amount: dec!(100),
                    email: "a@b.com".into(),
                    reference: None,
                    currency: None,
                    metadata: json!({}),
                })
                .await
                .unwrap();
            let verification = system.payment_client.verify_transaction(init.reference.clone()).await.unwrap();
            let outcome = verification.outcome().unwrap();
            assert!(matches!(outcome, TransactionStatus::Success | TransactionStatus::Failed));
            let stored = system.payment_client.get_transaction(init.reference).await.unwrap().unwrap();
            assert_eq!(stored.status, outcome);
        }
        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn terminal_status_change_goes_through_storage_actions() {
        // 1. Setup Mocks
        let (orders_inner, mut order_rx) = create_mock_client::<Order>(10);
        let (addresses_inner, _address_rx) = create_mock_client::<CustomerAddress>(10);
        let (carts_inner, _cart_rx) = create_mock_client::<CartSnapshot>(10);
        let storage = MockOrderStorage::new(orders_inner, addresses_inner, carts_inner);
        let client = OrderClient::new(storage, SimulatedLatency::none());

        let mut delivered = <Order as Entity>::from_create_params(
            "o1".to_string(),
            OrderCreate {
                user_id: Some("u1".into()),
                customer_email: None,
                items: vec![OrderItem {
                    product_id: "p1".into(),
                    name: "Tote".into(),
                    image: None,
                    unit_price: dec!(10),
                    quantity: 1,
                }],
                shipping: dec!(0),
                tax: dec!(0),
                discount: dec!(0),
                shipping_address: checkout_request().shipping_address,
                billing_address: None,
                payment_method: PaymentMethod::Card,
                notes: None,
            },
        )
        .unwrap();
        delivered.status = OrderStatus::Delivered;

        // 2. Execute in background
        let task = tokio::spawn(async move {
            client.update_order_status("o1", OrderStatus::Refunded, Some("returned".into())).await
        });

        // 3. The current status is read first, then the action is forwarded unchanged
        let (id, responder) = expect_get(&mut order_rx).await.expect("Expected Order Get");
        assert_eq!(id, "o1");
        responder.send(Ok(Some(delivered.clone()))).unwrap();

        let (id, action, responder) = expect_action(&mut order_rx).await.expect("Expected Order Action");
        assert_eq!(id, "o1");
        match action {
            OrderAction::SetStatus { status, notes } => {
                assert_eq!(status, OrderStatus::Refunded);
                assert_eq!(notes.as_deref(), Some("returned"));
            }
            other => panic!("Unexpected action: {:?}", other),
        }
        let mut refunded = delivered;
        refunded.status = OrderStatus::Refunded;
        responder.send(Ok(OrderActionResult::SetStatus(refunded))).unwrap();

        // 4. Verify Result
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.status, OrderStatus::Refunded);
    }
}
