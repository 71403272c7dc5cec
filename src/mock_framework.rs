//! # Mock Framework
//!
//! Utilities for testing code that talks to a [`ResourceClient`] without
//! spinning up the [`ResourceActor`](crate::actor_framework::ResourceActor).
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_list`] or [`expect_action`] to assert the
//! requests that arrive and answer them by hand.

use crate::actor_framework::{Entity, Response, ResourceClient, ResourceRequest};
use tokio::sync::mpsc;

/// Creates a mock client and a receiver for asserting requests.
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Next message must be a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Response<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Next message must be a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Next message must be a Put request
pub async fn expect_put<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T, Response<()>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Put { item, respond_to }) => Some((item, respond_to)),
        _ => None,
    }
}

/// Next message must be a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<Response<Vec<T>>> {
    match receiver.recv().await {
        Some(ResourceRequest::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Next message must be an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::FrameworkError;
    use crate::address_actor::AddressAction;
    use crate::domain::{
        Address, AddressCreate, CartSnapshot, CustomerAddress, Order, OrderCreate, OrderItem, OrderStatus, PaymentMethod,
    };
    use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
    use crate::storage::MockOrderStorage;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn address(id: &str, user: &str, is_default: bool, age_minutes: i64) -> CustomerAddress {
        let at = Utc::now() - Duration::minutes(age_minutes);
        CustomerAddress {
            id: id.into(),
            user_id: user.into(),
            label: None,
            address: Address::default(),
            is_default,
            created_at: at,
            updated_at: at,
        }
    }

    fn order(id: &str, user: &str, age_minutes: i64) -> Order {
        let mut order = <Order as Entity>::from_create_params(
            id.to_string(),
            OrderCreate {
                user_id: Some(user.into()),
                customer_email: None,
                items: vec![OrderItem {
                    product_id: "p1".into(),
                    name: "Tote".into(),
                    image: None,
                    unit_price: dec!(10),
                    quantity: 1,
                }],
                shipping: Decimal::ZERO,
                tax: Decimal::ZERO,
                discount: Decimal::ZERO,
                shipping_address: Address::default(),
                billing_address: None,
                payment_method: PaymentMethod::Card,
                notes: None,
            },
        )
        .unwrap();
        order.created_at = Utc::now() - Duration::minutes(age_minutes);
        order
    }

    struct Mocks {
        storage: MockOrderStorage,
        orders: mpsc::Receiver<ResourceRequest<Order>>,
        addresses: mpsc::Receiver<ResourceRequest<CustomerAddress>>,
        carts: mpsc::Receiver<ResourceRequest<CartSnapshot>>,
    }

    fn mocks() -> Mocks {
        let (orders_client, orders) = create_mock_client::<Order>(10);
        let (addresses_client, addresses) = create_mock_client::<CustomerAddress>(10);
        let (carts_client, carts) = create_mock_client::<CartSnapshot>(10);
        Mocks {
            storage: MockOrderStorage::new(orders_client, addresses_client, carts_client),
            orders,
            addresses,
            carts,
        }
    }

    #[tokio::test]
    async fn clearing_defaults_only_touches_other_defaults() {
        let mut m = mocks();
        let storage = m.storage.clone();
        let task = tokio::spawn(async move { storage.clear_default_addresses("u1", Some("keep")).await });

        let listing = expect_list(&mut m.addresses).await.expect("Expected List request");
        listing
            .send(Ok(vec![
                address("keep", "u1", true, 1),
                address("old", "u1", true, 5),
                address("plain", "u1", false, 2),
                address("foreign", "u2", true, 3),
            ]))
            .unwrap();

        let (id, action, responder) = expect_action(&mut m.addresses).await.expect("Expected Action request");
        assert_eq!(id, "old");
        assert!(matches!(action, AddressAction::ClearDefault));
        responder.send(Ok(true)).unwrap();

        assert_eq!(task.await.unwrap(), Ok(1));
    }

    #[tokio::test]
    async fn user_orders_are_filtered_and_sorted() {
        let mut m = mocks();
        let storage = m.storage.clone();
        let task = tokio::spawn(async move { storage.user_orders("u1").await });

        let listing = expect_list(&mut m.orders).await.expect("Expected List request");
        listing
            .send(Ok(vec![order("a", "u1", 30), order("b", "u2", 0), order("c", "u1", 10)]))
            .unwrap();

        let ids: Vec<String> = task.await.unwrap().unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["c".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn framework_errors_map_to_order_errors() {
        let mut m = mocks();
        let storage = m.storage.clone();
        let task = tokio::spawn(async move {
            storage
                .apply_order_action("ghost", OrderAction::SetStatus { status: OrderStatus::Shipped, notes: None })
                .await
        });
        let (id, _action, responder) = expect_action(&mut m.orders).await.expect("Expected Action request");
        assert_eq!(id, "ghost");
        responder.send(Err(FrameworkError::NotFound(id))).unwrap();
        let result: Result<OrderActionResult, OrderError> = task.await.unwrap();
        assert_eq!(result.unwrap_err(), OrderError::NotFound("ghost".into()));
    }

    #[tokio::test]
    async fn cart_snapshots_are_put_whole() {
        let mut m = mocks();
        let storage = m.storage.clone();
        let task = tokio::spawn(async move { storage.set_cart("u1", Vec::new()).await });

        let (snapshot, responder) = expect_put(&mut m.carts).await.expect("Expected Put request");
        assert_eq!(snapshot.user_id, "u1");
        assert!(snapshot.items.is_empty());
        responder.send(Ok(())).unwrap();
        assert_eq!(task.await.unwrap(), Ok(()));

        let storage = m.storage.clone();
        let task = tokio::spawn(async move { storage.get_order("o1").await });
        let (id, responder) = expect_get(&mut m.orders).await.expect("Expected Get request");
        assert_eq!(id, "o1");
        responder.send(Ok(None)).unwrap();
        assert_eq!(task.await.unwrap(), Ok(None));
    }

    #[tokio::test]
    async fn create_passes_params_through() {
        let mut m = mocks();
        let storage = m.storage.clone();
        let task = tokio::spawn(async move {
            storage
                .create_address(AddressCreate {
                    user_id: "u1".into(),
                    label: Some("Home".into()),
                    address: Address::default(),
                    is_default: false,
                })
                .await
        });

        let (params, responder) = expect_create(&mut m.addresses).await.expect("Expected Create request");
        assert_eq!(params.label.as_deref(), Some("Home"));
        responder.send(Ok(address("a1", "u1", false, 0))).unwrap();
        assert_eq!(task.await.unwrap().unwrap().id, "a1");
    }
}
