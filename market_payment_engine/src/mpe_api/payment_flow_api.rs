use std::fmt::Debug;

use log::*;
use toss_tools::{PaymentCancellation, PaymentConfirmation};

use crate::{
    db_types::{
        confirmation_from_receipt,
        Article,
        Customer,
        NewOrder,
        NewPayment,
        OrderId,
        Payment,
        PaymentStatus,
        Won,
    },
    events::{EventProducers, PaymentCancelledEvent, PaymentConfirmedEvent},
    payment_objects::{CancellationResult, ConfirmationResult, PaymentIntent},
    traits::{ArticleProvider, MarketplaceDatabase, PaymentGatewayClient, ReceiptManagement, UserProvider},
    MarketplaceError,
};

/// The gateway status of a fully refunded payment.
const GATEWAY_CANCELED: &str = "CANCELED";
/// Cancel reason sent to the gateway when a charge it confirmed could not be recorded locally.
pub const UNRECORDED_CHARGE_REASON: &str = "Payment could not be recorded by the merchant";

/// `PaymentFlowApi` drives a payment from intent to confirmation, failure or cancellation.
///
/// ```text
///   PENDING ──confirm──▶ SUCCESS ──cancel──▶ CANCELED
///      │
///      └──mark_failed──▶ FAILED
/// ```
///
/// FAILED and CANCELED are terminal. Gateway calls are never made while a database transaction is open: the local
/// state is read, the gateway is called, and the outcome is committed in one short transaction that re-checks the
/// state it read. The order key (the order's api id) ties the steps together.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B: Clone, G: Clone> Clone for PaymentFlowApi<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: self.gateway.clone(), producers: self.producers.clone() }
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: MarketplaceDatabase + ReceiptManagement,
    G: PaymentGatewayClient,
{
    /// The caller-facing "start payment": resolves the article and the buyer, then registers the intent.
    pub async fn start_payment<A, U>(
        &self,
        articles: &A,
        users: &U,
        article_id: &str,
        username: &str,
    ) -> Result<PaymentIntent, MarketplaceError>
    where
        A: ArticleProvider,
        U: UserProvider,
    {
        let article = articles
            .fetch_article(article_id)
            .await?
            .ok_or_else(|| MarketplaceError::ArticleNotFound(article_id.to_string()))?;
        let customer =
            users.fetch_user(username).await?.ok_or_else(|| MarketplaceError::UserNotFound(username.to_string()))?;
        self.create_intent(&article, &customer).await
    }

    /// Creates the order and its PENDING payment in one transaction. The gateway is not contacted.
    pub async fn create_intent(
        &self,
        article: &Article,
        customer: &Customer,
    ) -> Result<PaymentIntent, MarketplaceError> {
        let order = NewOrder::new(article, &customer.username);
        let payment = NewPayment::new(article, customer);
        let (order, payment) = self.db.insert_order_with_payment(order, payment).await?;
        info!(
            "💳️ Payment intent for order {} registered: {} for '{}' by {}",
            order.api_id, payment.amount, payment.order_name, customer.username
        );
        Ok(PaymentIntent::new(&order, &payment, customer))
    }

    /// Confirms a payment the buyer has authorized in the checkout widget.
    ///
    /// The amount is compared with the stored intent before anything else happens; a mismatch never reaches the
    /// gateway. Confirming an already successful payment again with the same payment key returns the stored
    /// receipt instead of charging twice. If the gateway confirms but the payment can no longer be completed
    /// locally, the charge is cancelled at the gateway and the local error is returned.
    pub async fn confirm(
        &self,
        payment_key: &str,
        order_id: &OrderId,
        amount: Won,
    ) -> Result<ConfirmationResult, MarketplaceError> {
        let payment = self.fetch_payment(order_id).await?;
        if payment.amount != amount {
            warn!(
                "💳️ Rejected confirmation for order {order_id}. Stored amount is {}, but {amount} was submitted",
                payment.amount
            );
            return Err(MarketplaceError::InvalidAmount { expected: payment.amount, received: amount });
        }
        match payment.status {
            PaymentStatus::Pending => {},
            PaymentStatus::Success if payment.payment_key.as_deref() == Some(payment_key) => {
                debug!("💳️ Order {order_id} is already confirmed with this payment key. Replaying the receipt");
                return self.replay_confirmation(&payment).await;
            },
            status => {
                warn!("💳️ Confirmation for order {order_id} rejected. The payment is already {status}");
                return Err(MarketplaceError::AlreadyProcessed(format!("Payment for order {order_id} is {status}")));
            },
        }
        let confirmation = self.gateway.confirm_payment(payment_key, order_id.as_str(), amount).await?;
        validate_confirmation(&confirmation, order_id, amount)?;
        let completed = match self.db.complete_payment(order_id, payment_key, &confirmation).await {
            Ok(completed) => completed,
            Err(e) => {
                self.reverse_charge(order_id, payment_key, &e).await;
                return Err(e);
            },
        };
        if !completed.inserted {
            let confirmation = confirmation_from_receipt(&completed.receipt, &completed.card_receipt);
            return Ok(ConfirmationResult { confirmation, receipt_id: completed.receipt.api_id, replayed: true });
        }
        info!("💳️ Payment for order {order_id} confirmed. Receipt {}", completed.receipt.api_id);
        let receipt_id = completed.receipt.api_id.clone();
        self.call_payment_confirmed_hook(PaymentConfirmedEvent::new(completed.payment, completed.receipt)).await;
        Ok(ConfirmationResult { confirmation, receipt_id, replayed: false })
    }

    /// Records that the checkout failed at the gateway. Only a PENDING payment can fail.
    pub async fn mark_failed(
        &self,
        order_id: &OrderId,
        code: &str,
        message: &str,
    ) -> Result<Payment, MarketplaceError> {
        let payment = self.db.mark_payment_failed(order_id, code, message).await?;
        info!("💳️ Payment for order {order_id} failed. [{code}] {message}");
        Ok(payment)
    }

    /// Refunds a successful payment through the gateway.
    ///
    /// The reason is checked before anything else. Only a SUCCESS payment can be cancelled: a PENDING or FAILED
    /// payment has no payment key, so there is nothing to refund.
    pub async fn cancel(
        &self,
        order_id: &OrderId,
        cancel_reason: Option<&str>,
    ) -> Result<CancellationResult, MarketplaceError> {
        let reason =
            cancel_reason.map(str::trim).filter(|r| !r.is_empty()).ok_or(MarketplaceError::MissingCancelReason)?;
        let payment = self.fetch_payment(order_id).await?;
        let payment_key = match (payment.status, payment.payment_key.as_deref()) {
            (PaymentStatus::Success, Some(key)) => key,
            (PaymentStatus::Canceled, _) => {
                let msg = format!("Payment for order {order_id} is already CANCELED");
                return Err(MarketplaceError::AlreadyProcessed(msg));
            },
            (status, _) => {
                return Err(MarketplaceError::InvalidStateTransition(format!(
                    "Payment for order {order_id} is {status} and cannot be cancelled"
                )))
            },
        };
        let cancellation = self.gateway.cancel_payment(payment_key, reason).await?;
        validate_cancellation(&cancellation, order_id)?;
        let payment = self.db.record_payment_cancellation(order_id, reason).await?;
        info!("💳️ Payment for order {order_id} cancelled. Reason: {reason}");
        self.call_payment_cancelled_hook(PaymentCancelledEvent::new(payment.clone())).await;
        Ok(CancellationResult { payment, cancellation })
    }

    /// The (non-deleted) payment for the given order, if there is one.
    pub async fn payment_for_order(&self, order_id: &OrderId) -> Result<Option<Payment>, MarketplaceError> {
        self.db.fetch_payment_by_order_key(order_id).await
    }

    async fn fetch_payment(&self, order_id: &OrderId) -> Result<Payment, MarketplaceError> {
        self.db
            .fetch_payment_by_order_key(order_id)
            .await?
            .ok_or_else(|| MarketplaceError::PaymentNotFound(order_id.as_str().to_string()))
    }

    /// The gateway has captured the charge, but the payment could not be closed locally (it left PENDING while the
    /// gateway call was in flight, or the database write failed). The charge is cancelled so that no money is held
    /// without a receipt. If that fails too, the keys are logged for manual reconciliation.
    async fn reverse_charge(&self, order_id: &OrderId, payment_key: &str, cause: &MarketplaceError) {
        warn!("💳️ Gateway confirmed order {order_id}, but it could not be recorded ({cause}). Reversing the charge");
        match self.gateway.cancel_payment(payment_key, UNRECORDED_CHARGE_REASON).await {
            Ok(c) if c.status == GATEWAY_CANCELED => {
                info!("💳️ Unrecorded charge {payment_key} for order {order_id} was reversed at the gateway");
            },
            Ok(c) => error!(
                "💳️ RECONCILE: reversal of unrecorded charge for order {order_id} (payment key {payment_key}) left it \
                 {} at the gateway",
                c.status
            ),
            Err(e) => error!(
                "💳️ RECONCILE: order {order_id} was charged at the gateway (payment key {payment_key}) but has no \
                 receipt, and the reversal failed. {e}"
            ),
        }
    }

    async fn replay_confirmation(&self, payment: &Payment) -> Result<ConfirmationResult, MarketplaceError> {
        let receipt = self.db.fetch_receipt_for_payment(payment.id).await?.ok_or_else(|| {
            error!("💳️ Payment #{} is SUCCESS but has no receipt. The payment records are corrupt", payment.id);
            MarketplaceError::ReceiptNotFound(payment.order_key.as_str().to_string())
        })?;
        let card = self.db.fetch_card_receipt(receipt.id).await?.ok_or_else(|| {
            error!("💳️ Receipt {} has no card receipt. The payment records are corrupt", receipt.api_id);
            MarketplaceError::CardReceiptNotFound(receipt.api_id.clone())
        })?;
        let confirmation = confirmation_from_receipt(&receipt, &card);
        Ok(ConfirmationResult { confirmation, receipt_id: receipt.api_id, replayed: true })
    }

    async fn call_payment_confirmed_hook(&self, event: PaymentConfirmedEvent) {
        for emitter in &self.producers.payment_confirmed_producer {
            debug!("💳️ Notifying payment confirmed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    async fn call_payment_cancelled_hook(&self, event: PaymentCancelledEvent) {
        for emitter in &self.producers.payment_cancelled_producer {
            debug!("💳️ Notifying payment cancelled hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

/// The gateway must confirm exactly what was asked for, and include the card details for the receipt.
fn validate_confirmation(
    confirmation: &PaymentConfirmation,
    order_id: &OrderId,
    amount: Won,
) -> Result<(), MarketplaceError> {
    if confirmation.order_id != order_id.as_str() {
        error!("💳️ Gateway confirmed order {} when {order_id} was requested", confirmation.order_id);
        return Err(MarketplaceError::ExternalServiceError(format!(
            "Gateway confirmed order {} instead of {}",
            confirmation.order_id,
            order_id.as_str()
        )));
    }
    if confirmation.total_amount != amount {
        error!("💳️ Gateway confirmed {} for order {order_id}, but {amount} was requested", confirmation.total_amount);
        return Err(MarketplaceError::ExternalServiceError(format!(
            "Gateway confirmed {} instead of {amount}",
            confirmation.total_amount
        )));
    }
    if confirmation.card.is_none() {
        error!("💳️ Gateway confirmation for order {order_id} carries no card details");
        return Err(MarketplaceError::ExternalServiceError("The confirmation carries no card details".to_string()));
    }
    Ok(())
}

fn validate_cancellation(cancellation: &PaymentCancellation, order_id: &OrderId) -> Result<(), MarketplaceError> {
    if cancellation.order_id != order_id.as_str() || cancellation.status != GATEWAY_CANCELED {
        error!(
            "💳️ Unexpected cancellation response for order {order_id}: order {} is {}",
            cancellation.order_id, cancellation.status
        );
        return Err(MarketplaceError::ExternalServiceError(format!(
            "Gateway reported order {} as {} after cancellation",
            cancellation.order_id, cancellation.status
        )));
    }
    Ok(())
}
