//! Placing an order from the cart: validate, create the order, run the
//! simulated payment page and settle the result.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::CartContext;
use crate::clients::{OrderClient, PaymentClient};
use crate::domain::{items_subtotal, Address, Order, OrderCreate, OrderItem, PaymentMethod, PaymentStatus};
use crate::order_actor::OrderError;
use crate::payment::{initialize_mock_payment, PaymentError, PaymentPrompt, TransactionRequest, TransactionStatus};
use crate::validation::{validate_email, validate_shipping_address, ValidationError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Order amount is too large")]
    AmountOverflow,
    #[error("Order error: {0}")]
    Order(#[from] OrderError),
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),
}

/// Shipping and tax rules applied to a cart subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    pub shipping_fee: Decimal,
    /// Subtotals at or above this ship free.
    pub free_shipping_threshold: Option<Decimal>,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl PricingPolicy {
    /// `None` when any amount overflows a `Decimal`.
    pub fn quote(&self, subtotal: Decimal) -> Option<PriceBreakdown> {
        let ships_free = self
            .free_shipping_threshold
            .is_some_and(|threshold| subtotal >= threshold);
        let shipping = if ships_free { Decimal::ZERO } else { self.shipping_fee };
        let tax = subtotal
            .checked_mul(self.tax_rate)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let discount = Decimal::ZERO;
        let total = subtotal.checked_add(shipping)?.checked_add(tax)?.checked_sub(discount)?;
        Some(PriceBreakdown {
            subtotal,
            shipping,
            tax,
            discount,
            total,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub email: String,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Paid. The cart has been cleared.
    Confirmed { order: Order, reference: String },
    /// Declined. The order is kept with payment status `failed`.
    PaymentFailed { order_id: String, reference: String },
    /// The payment page was closed. The order stays pending.
    Cancelled { order_id: String },
}

pub struct CheckoutFlow {
    orders: OrderClient,
    payments: PaymentClient,
    pricing: PricingPolicy,
}

impl CheckoutFlow {
    pub fn new(orders: OrderClient, payments: PaymentClient, pricing: PricingPolicy) -> Self {
        Self { orders, payments, pricing }
    }

    #[instrument(skip_all, fields(user_id = ?cart.user_id()))]
    pub async fn place_order(
        &self,
        cart: &CartContext,
        request: CheckoutRequest,
        prompt: &dyn PaymentPrompt,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let email = validate_email(&request.email)?;
        validate_shipping_address(&request.shipping_address)?;

        let lines = cart.items().await;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id.clone(),
                name: match &line.variant_name {
                    Some(variant) => format!("{} ({})", line.name, variant),
                    None => line.name.clone(),
                },
                image: line.image.clone(),
                unit_price: line.price,
                quantity: line.quantity,
            })
            .collect();
        let quote = items_subtotal(&items)
            .and_then(|subtotal| self.pricing.quote(subtotal))
            .ok_or(CheckoutError::AmountOverflow)?;

        let order = self
            .orders
            .create_order(OrderCreate {
                user_id: cart.user_id(),
                customer_email: Some(email.to_string()),
                items,
                shipping: quote.shipping,
                tax: quote.tax,
                discount: quote.discount,
                shipping_address: request.shipping_address,
                billing_address: request.billing_address,
                payment_method: request.payment_method,
                notes: request.notes,
            })
            .await?;

        let payment = TransactionRequest {
            amount: order.total,
            email: email.to_string(),
            reference: None,
            currency: None,
            metadata: json!({
                "order_id": order.id,
                "order_number": order.order_number,
            }),
        };

        let result = match initialize_mock_payment(&self.payments, payment, prompt).await {
            Ok(result) => result,
            Err(PaymentError::Cancelled { reference }) => {
                info!(order_id = %order.id, reference = %reference, "Checkout cancelled at payment");
                return Ok(CheckoutOutcome::Cancelled { order_id: order.id });
            }
            Err(err) => return Err(err.into()),
        };

        if result.status != TransactionStatus::Success {
            if let Err(err) = self
                .orders
                .update_payment_status(
                    &order.id,
                    PaymentStatus::Failed,
                    Some(result.reference.clone()),
                    Some(result.channel.clone()),
                )
                .await
            {
                warn!(order_id = %order.id, error = %err, "Could not record failed payment");
            }
            info!(order_id = %order.id, reference = %result.reference, "Payment declined");
            return Ok(CheckoutOutcome::PaymentFailed {
                order_id: order.id,
                reference: result.reference,
            });
        }

        // From here on the payment went through; bookkeeping failures are logged only.
        let order = match self
            .orders
            .update_payment_status(
                &order.id,
                PaymentStatus::Paid,
                Some(result.reference.clone()),
                Some(result.channel.clone()),
            )
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                warn!(order_id = %order.id, error = %err, "Could not mark order paid");
                order
            }
        };
        if let Err(err) = self.orders.send_order_confirmation_email(&order).await {
            warn!(order_id = %order.id, error = %err, "Confirmation email failed");
        }
        cart.clear_cart().await;

        info!(order_id = %order.id, order_number = %order.order_number, reference = %result.reference, "Checkout complete");
        Ok(CheckoutOutcome::Confirmed {
            order,
            reference: result.reference,
        })
    }
}
