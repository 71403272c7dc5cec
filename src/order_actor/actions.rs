use crate::domain::{CourierInfo, Order, OrderStatus, PaymentStatus, TrackingEvent};

/// Named mutations on an order. Every change to a stored order goes through one of these.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Explicit status transition. Appends a tracking event describing it.
    SetStatus {
        status: OrderStatus,
        notes: Option<String>,
    },
    /// Payment outcome. `Paid` forces the order to `Confirmed` and appends a tracking event.
    SetPayment {
        payment_status: PaymentStatus,
        reference: Option<String>,
        channel: Option<String>,
    },
    /// Appends an arbitrary tracking event without touching the status.
    AppendTracking {
        status: OrderStatus,
        description: String,
        location: Option<String>,
        notes: Option<String>,
    },
    /// Replaces the courier slot wholesale.
    SetCourier(CourierInfo),
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    SetStatus(Order),
    SetPayment(Order),
    AppendTracking(TrackingEvent),
    SetCourier(Order),
}
