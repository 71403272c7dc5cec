use chrono::Utc;
use uuid::Uuid;

use super::actions::{OrderAction, OrderActionResult};
use crate::actor_framework::Entity;
use crate::domain::{
    generate_order_number, items_subtotal, Order, OrderCreate, OrderStatus, PaymentStatus, TrackingEvent,
};

const PAYMENT_CONFIRMED_DESCRIPTION: &str = "Payment received, order confirmed";
const AMOUNT_OVERFLOW: &str = "amount overflow";

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Patch = ();
    type Action = OrderAction;
    type ActionResult = OrderActionResult;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a pending order, computing the totals once.
    ///
    /// `total = subtotal + shipping + tax - discount`. The order starts as
    /// `pending`/`pending` with a single "placed" tracking event. Amounts that
    /// overflow a `Decimal` reject the order.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, String> {
        let now = Utc::now();
        let subtotal = items_subtotal(&params.items).ok_or_else(|| AMOUNT_OVERFLOW.to_string())?;
        let total = subtotal
            .checked_add(params.shipping)
            .and_then(|sum| sum.checked_add(params.tax))
            .and_then(|sum| sum.checked_sub(params.discount))
            .ok_or_else(|| AMOUNT_OVERFLOW.to_string())?;

        let mut order = Self {
            order_number: generate_order_number(now),
            user_id: params.user_id,
            customer_email: params.customer_email,
            items: params.items,
            subtotal,
            shipping: params.shipping,
            tax: params.tax,
            discount: params.discount,
            total,
            shipping_address: params.shipping_address,
            billing_address: params.billing_address,
            payment_method: params.payment_method,
            payment_channel: None,
            payment_reference: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            notes: params.notes,
            created_at: now,
            updated_at: now,
            delivered_at: None,
            courier: None,
            tracking: Vec::new(),
            id,
        };
        order.push_tracking(
            OrderStatus::Pending,
            OrderStatus::Pending.tracking_description().to_string(),
            None,
            None,
        );
        Ok(order)
    }

    /// Orders are never patched field by field; use [`OrderAction`] instead.
    fn on_update(&mut self, _patch: ()) -> Result<(), String> {
        Err("orders change only through named actions".to_string())
    }

    fn on_delete(&self) -> Result<(), String> {
        Err("orders are never deleted".to_string())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, String> {
        match action {
            OrderAction::SetStatus { status, notes } => {
                let now = Utc::now();
                self.status = status;
                self.updated_at = now;
                if status == OrderStatus::Delivered {
                    self.delivered_at = Some(now);
                }
                self.push_tracking(status, status.tracking_description().to_string(), None, notes);
                Ok(OrderActionResult::SetStatus(self.clone()))
            }
            OrderAction::SetPayment { payment_status, reference, channel } => {
                self.payment_status = payment_status;
                if reference.is_some() {
                    self.payment_reference = reference;
                }
                if channel.is_some() {
                    self.payment_channel = channel;
                }
                self.updated_at = Utc::now();
                if payment_status == PaymentStatus::Paid {
                    self.status = OrderStatus::Confirmed;
                    self.push_tracking(
                        OrderStatus::Confirmed,
                        PAYMENT_CONFIRMED_DESCRIPTION.to_string(),
                        None,
                        None,
                    );
                }
                Ok(OrderActionResult::SetPayment(self.clone()))
            }
            OrderAction::AppendTracking { status, description, location, notes } => {
                self.updated_at = Utc::now();
                let event = self.push_tracking(status, description, location, notes);
                Ok(OrderActionResult::AppendTracking(event))
            }
            OrderAction::SetCourier(info) => {
                self.courier = Some(info);
                self.updated_at = Utc::now();
                Ok(OrderActionResult::SetCourier(self.clone()))
            }
        }
    }
}

impl Order {
    fn push_tracking(
        &mut self,
        status: OrderStatus,
        description: String,
        location: Option<String>,
        notes: Option<String>,
    ) -> TrackingEvent {
        let event = TrackingEvent {
            id: Uuid::new_v4().to_string(),
            order_id: self.id.clone(),
            status,
            description,
            location,
            notes,
            created_at: Utc::now(),
        };
        self.tracking.push(event.clone());
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use crate::domain::{Address, CourierInfo, OrderItem, PaymentMethod};
    use rust_decimal_macros::dec;

    fn params() -> OrderCreate {
        OrderCreate {
            user_id: Some("user_1".into()),
            customer_email: Some("a@b.com".into()),
            items: vec![OrderItem {
                product_id: "p1".into(),
                name: "Black soap".into(),
                image: None,
                unit_price: dec!(100),
                quantity: 2,
            }],
            shipping: dec!(10),
            tax: dec!(5),
            discount: Decimal::ZERO,
            shipping_address: Address::default(),
            billing_address: None,
            payment_method: PaymentMethod::Card,
            notes: None,
        }
    }

    #[test]
    fn creation_computes_totals_and_seeds_tracking() {
        let order = Order::from_create_params("o1".into(), params()).unwrap();
        assert_eq!(order.subtotal, dec!(200));
        assert_eq!(order.total, dec!(215));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.tracking.len(), 1);
        assert_eq!(order.tracking[0].description, "Order placed and awaiting confirmation");
        assert_eq!(order.tracking[0].order_id, "o1");
    }

    #[test]
    fn discount_is_subtracted() {
        let mut p = params();
        p.discount = dec!(15);
        let order = Order::from_create_params("o1".into(), p).unwrap();
        assert_eq!(order.total, dec!(200));
    }

    #[test]
    fn empty_orders_are_accepted_with_zero_subtotal() {
        let mut p = params();
        p.items.clear();
        let order = Order::from_create_params("o1".into(), p).unwrap();
        assert_eq!(order.subtotal, Decimal::ZERO);
        assert_eq!(order.total, dec!(15));
    }

    #[test]
    fn overflowing_amounts_are_rejected() {
        let mut p = params();
        p.items[0].unit_price = Decimal::MAX;
        assert_eq!(Order::from_create_params("o1".into(), p).unwrap_err(), "amount overflow");

        let mut p = params();
        p.shipping = Decimal::MAX;
        assert!(Order::from_create_params("o1".into(), p).is_err());

        let mut p = params();
        p.discount = Decimal::MIN;
        assert!(Order::from_create_params("o1".into(), p).is_err());
    }

    #[test]
    fn paid_forces_confirmed_with_tracking() {
        let mut order = Order::from_create_params("o1".into(), params()).unwrap();
        order
            .handle_action(OrderAction::SetPayment {
                payment_status: PaymentStatus::Paid,
                reference: Some("MOCK_1".into()),
                channel: Some("card".into()),
            })
            .unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_reference.as_deref(), Some("MOCK_1"));
        let last = order.tracking.last().unwrap();
        assert_eq!(last.status, OrderStatus::Confirmed);
        assert_eq!(order.tracking.len(), 2);
    }

    #[test]
    fn failed_payment_leaves_status_alone() {
        let mut order = Order::from_create_params("o1".into(), params()).unwrap();
        order
            .handle_action(OrderAction::SetPayment {
                payment_status: PaymentStatus::Failed,
                reference: None,
                channel: None,
            })
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.tracking.len(), 1);
    }

    #[test]
    fn delivered_sets_timestamp_and_any_transition_is_allowed() {
        let mut order = Order::from_create_params("o1".into(), params()).unwrap();
        order
            .handle_action(OrderAction::SetStatus { status: OrderStatus::Delivered, notes: None })
            .unwrap();
        assert!(order.delivered_at.is_some());

        order
            .handle_action(OrderAction::SetStatus {
                status: OrderStatus::Processing,
                notes: Some("reopened".into()),
            })
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.tracking.last().unwrap().notes.as_deref(), Some("reopened"));
    }

    #[test]
    fn courier_replaces_without_tracking() {
        let mut order = Order::from_create_params("o1".into(), params()).unwrap();
        let info = |n: &str| CourierInfo {
            company: "GIG".into(),
            tracking_number: n.into(),
            estimated_delivery: None,
            actual_delivery: None,
            pickup_date: None,
        };
        order.handle_action(OrderAction::SetCourier(info("T1"))).unwrap();
        order.handle_action(OrderAction::SetCourier(info("T2"))).unwrap();
        assert_eq!(order.courier.unwrap().tracking_number, "T2");
        assert_eq!(order.tracking.len(), 1);
    }

    #[test]
    fn patch_and_delete_are_refused() {
        let mut order = Order::from_create_params("o1".into(), params()).unwrap();
        assert!(order.on_update(()).is_err());
        assert!(order.on_delete().is_err());
    }
}
