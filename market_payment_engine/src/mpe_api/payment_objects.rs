use serde::{Deserialize, Serialize};
use toss_tools::{PaymentCancellation, PaymentConfirmation};

use crate::db_types::{CardReceipt, Customer, Order, OrderId, Payment, Receipt, Won};

/// The fields the checkout widget needs to start a card payment. Nothing has been sent to the gateway yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub customer_api_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: Won,
    /// The order key the gateway will be told about
    pub order_id: OrderId,
    pub order_name: String,
}

impl PaymentIntent {
    pub fn new(order: &Order, payment: &Payment, customer: &Customer) -> Self {
        Self {
            customer_api_id: customer.api_id.clone(),
            customer_name: payment.customer_name.clone(),
            customer_email: payment.customer_email.clone(),
            amount: payment.amount,
            order_id: order.api_id.clone(),
            order_name: payment.order_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub confirmation: PaymentConfirmation,
    pub receipt_id: String,
    /// `true` when the payment had already been confirmed with the same key and the stored receipt was returned
    /// instead of calling the gateway.
    pub replayed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationResult {
    pub payment: Payment,
    pub cancellation: PaymentCancellation,
}

/// Output of the single transaction that closes a confirmation.
#[derive(Debug, Clone)]
pub struct CompletedPayment {
    pub payment: Payment,
    pub receipt: Receipt,
    pub card_receipt: CardReceipt,
    /// `false` if a concurrent confirmation with the same key got there first
    pub inserted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDetail {
    pub receipt: Receipt,
    pub card_receipt: CardReceipt,
}
