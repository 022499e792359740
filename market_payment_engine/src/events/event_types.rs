use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Payment, Receipt};

/// A payment was confirmed by the gateway and its receipt has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub payment: Payment,
    pub receipt: Receipt,
}

impl PaymentConfirmedEvent {
    pub fn new(payment: Payment, receipt: Receipt) -> Self {
        Self { payment, receipt }
    }
}

/// A successful payment was refunded through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCancelledEvent {
    pub payment: Payment,
}

impl PaymentCancelledEvent {
    pub fn new(payment: Payment) -> Self {
        Self { payment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}
