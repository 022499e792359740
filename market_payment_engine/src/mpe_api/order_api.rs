use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Article, NewOrder, Order, OrderId, OrderStatusType, PaymentStatus},
    events::{EventProducers, OrderStatusChangedEvent},
    order_objects::{OrderDetail, OrderPage, OrderQueryFilter, OrderRole, Paging},
    traits::{ArticleProvider, MarketplaceDatabase, PaymentGatewayClient, ReceiptManagement},
    MarketplaceError,
    PaymentFlowApi,
};

/// Failure code recorded on a pending payment whose order was cancelled before checkout finished.
pub const ORDER_CANCELLED_CODE: &str = "ORDER_CANCELLED";

/// `OrderApi` manages the order lifecycle. The caller's username is passed explicitly to every operation that
/// depends on who is asking.
///
/// | From \ To | PROGRESS | END | CANCEL |
/// |-----------|----------|-----|--------|
/// | PROGRESS  | Err      | Ok  | Ok (1) |
/// | END       | Err      | Err | Err    |
/// | CANCEL    | Err      | Err | Err    |
///
/// (1) Cancelling an order with a payment needs a reason. A successful payment is refunded through the gateway
/// before the order changes; if the refund fails, the order stays in PROGRESS. A pending payment is marked FAILED
/// in the same transaction as the order change.
pub struct OrderApi<B, G> {
    db: B,
    payments: PaymentFlowApi<B, G>,
    producers: EventProducers,
}

impl<B, G> Debug for OrderApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B: Clone, G> OrderApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        let payments = PaymentFlowApi::new(db.clone(), gateway, producers.clone());
        Self { db, payments, producers }
    }
}

impl<B, G> OrderApi<B, G> {
    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn payments(&self) -> &PaymentFlowApi<B, G> {
        &self.payments
    }
}

impl<B, G> OrderApi<B, G>
where
    B: MarketplaceDatabase + ReceiptManagement,
    G: PaymentGatewayClient,
{
    /// Saves an order in PROGRESS without a payment.
    pub async fn create_order(&self, article: &Article, consumer: &str) -> Result<Order, MarketplaceError> {
        let order = self.db.insert_order(NewOrder::new(article, consumer)).await?;
        info!("📦️ Order {} created for '{}' by {consumer}", order.api_id, order.article_title);
        Ok(order)
    }

    pub async fn order_by_api_id(&self, id: &OrderId) -> Result<Order, MarketplaceError> {
        self.db.fetch_order_by_api_id(id, false).await?.ok_or_else(|| MarketplaceError::OrderNotFound(id.0.clone()))
    }

    /// Same as [`Self::order_by_api_id`], but also finds soft-deleted orders. Meant for audits.
    pub async fn order_by_api_id_including_deleted(&self, id: &OrderId) -> Result<Order, MarketplaceError> {
        self.db.fetch_order_by_api_id(id, true).await?.ok_or_else(|| MarketplaceError::OrderNotFound(id.0.clone()))
    }

    /// The order, its payment and the api id of its receipt, for either party of the trade.
    pub async fn order_detail(&self, id: &OrderId, caller: &str) -> Result<OrderDetail, MarketplaceError> {
        let order = self.order_for_party(id, caller).await?;
        let payment = self.db.fetch_payment_for_order(order.id).await?;
        let receipt_api_id = match &payment {
            Some(p) => self.db.fetch_receipt_for_payment(p.id).await?.map(|r| r.api_id),
            None => None,
        };
        Ok(OrderDetail { order, payment, receipt_api_id })
    }

    /// Moves a PROGRESS order to END or CANCEL. See the table on [`OrderApi`] for the rules.
    pub async fn update_status(
        &self,
        id: &OrderId,
        caller: &str,
        new_status: OrderStatusType,
        cancel_reason: Option<&str>,
    ) -> Result<Order, MarketplaceError> {
        let order = self.order_for_party(id, caller).await?;
        if !order.status.can_transition_to(new_status) {
            warn!("📦️ {caller} tried to move order {id} from {} to {new_status}", order.status);
            return Err(MarketplaceError::InvalidStateTransition(format!(
                "Order {id} cannot move from {} to {new_status}",
                order.status
            )));
        }
        let mut fail_pending = None;
        if new_status == OrderStatusType::Cancel {
            if let Some(payment) = self.db.fetch_payment_for_order(order.id).await? {
                let reason = cancel_reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or(MarketplaceError::MissingCancelReason)?;
                match payment.status {
                    PaymentStatus::Success => {
                        debug!("📦️ Order {id} has a successful payment. Refunding it before cancelling the order");
                        self.payments.cancel(&order.api_id, Some(reason)).await?;
                    },
                    PaymentStatus::Pending => fail_pending = Some((ORDER_CANCELLED_CODE, reason)),
                    PaymentStatus::Failed | PaymentStatus::Canceled => {},
                }
            }
        }
        let updated = self.db.update_order_status(&order, new_status, fail_pending).await?;
        info!("📦️ Order {id} is now {new_status}");
        self.call_order_status_changed_hook(OrderStatusChangedEvent::new(order.status, updated.clone())).await;
        Ok(updated)
    }

    /// Hides the order from normal lookups and listings. The row is kept for the audit trail. An unsettled (PENDING
    /// or FAILED) payment is hidden with it; a payment where money has moved stays visible and has to be cancelled
    /// explicitly.
    pub async fn soft_delete(&self, id: &OrderId, caller: &str) -> Result<Order, MarketplaceError> {
        let order = self.order_for_party(id, caller).await?;
        let deleted = self.db.soft_delete_order(&order).await?;
        info!("📦️ Order {id} deleted by {caller}");
        Ok(deleted)
    }

    /// The orders placed against one article. Only the article's seller may see them.
    pub async fn orders_for_article<A: ArticleProvider>(
        &self,
        articles: &A,
        article_id: &str,
        caller: &str,
        status: Option<OrderStatusType>,
        paging: Paging,
    ) -> Result<OrderPage, MarketplaceError> {
        let article = articles
            .fetch_article(article_id)
            .await?
            .ok_or_else(|| MarketplaceError::ArticleNotFound(article_id.to_string()))?;
        if article.seller != caller {
            warn!("📦️ {caller} asked for the orders of article {article_id}, which belongs to {}", article.seller);
            return Err(MarketplaceError::AccessDenied(format!("{caller} is not the seller of article {article_id}")));
        }
        let mut query = OrderQueryFilter::default().with_article_id(article_id).with_seller(caller);
        if let Some(status) = status {
            query = query.with_status(status);
        }
        self.fetch_page(query, paging).await
    }

    /// The caller's own orders, either as seller or as buyer.
    pub async fn orders_for_user(
        &self,
        caller: &str,
        role: OrderRole,
        status: Option<OrderStatusType>,
        search_text: Option<&str>,
        paging: Paging,
    ) -> Result<OrderPage, MarketplaceError> {
        let mut query = OrderQueryFilter::default().for_role(role, caller);
        if let Some(status) = status {
            query = query.with_status(status);
        }
        if let Some(text) = search_text {
            query = query.with_search_text(text);
        }
        self.fetch_page(query, paging).await
    }

    async fn fetch_page(&self, query: OrderQueryFilter, paging: Paging) -> Result<OrderPage, MarketplaceError> {
        trace!("📦️ Searching orders. {query}");
        let (orders, total) = self.db.search_orders(query, paging).await?;
        Ok(OrderPage { orders, page: paging.page, limit: paging.limit, total })
    }

    async fn order_for_party(&self, id: &OrderId, caller: &str) -> Result<Order, MarketplaceError> {
        let order = self.order_by_api_id(id).await?;
        if !order.is_party(caller) {
            warn!("📦️ {caller} is neither the seller nor the buyer of order {id}");
            return Err(MarketplaceError::AccessDenied(format!("{caller} is not a party to order {id}")));
        }
        Ok(order)
    }

    async fn call_order_status_changed_hook(&self, event: OrderStatusChangedEvent) {
        for emitter in &self.producers.order_status_changed_producer {
            debug!("📦️ Notifying order status changed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
