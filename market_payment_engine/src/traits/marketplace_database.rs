use toss_tools::PaymentConfirmation;

use crate::{
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderStatusType, Payment},
    order_objects::{OrderQueryFilter, Paging},
    payment_objects::CompletedPayment,
    MarketplaceError,
};

/// Storage for orders and payments.
///
/// Every method that writes more than one row does so in a single transaction: either all of its writes become
/// visible or none do. Status changes are conditional on the current status, so two concurrent callers cannot both
/// move the same record out of a given state.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in PROGRESS without a payment.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, MarketplaceError>;

    /// Stores a new order in PROGRESS together with its PENDING payment. The payment's order key is the order's api
    /// id.
    async fn insert_order_with_payment(
        &self,
        order: NewOrder,
        payment: NewPayment,
    ) -> Result<(Order, Payment), MarketplaceError>;

    /// Fetches an order by its api id. Soft-deleted orders are returned only if `include_deleted` is true.
    async fn fetch_order_by_api_id(
        &self,
        api_id: &OrderId,
        include_deleted: bool,
    ) -> Result<Option<Order>, MarketplaceError>;

    /// Returns one page of (non-deleted) orders and the total number of matches.
    async fn search_orders(
        &self,
        query: OrderQueryFilter,
        paging: Paging,
    ) -> Result<(Vec<Order>, i64), MarketplaceError>;

    async fn fetch_payment_by_order_key(&self, order_key: &OrderId) -> Result<Option<Payment>, MarketplaceError>;

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, MarketplaceError>;

    /// Moves a PROGRESS order to `new_status`.
    ///
    /// If `fail_pending_payment` carries a `(code, message)` pair, the order's payment is moved from PENDING to FAILED
    /// in the same transaction. A payment that is already FAILED is left alone. If the payment has meanwhile become
    /// SUCCESS or CANCELED, nothing is written and the call fails with `InvalidStateTransition`; the caller has to
    /// re-read the payment and go through the refund path instead.
    ///
    /// Fails with `InvalidStateTransition` if the order is no longer in PROGRESS.
    async fn update_order_status(
        &self,
        order: &Order,
        new_status: OrderStatusType,
        fail_pending_payment: Option<(&str, &str)>,
    ) -> Result<Order, MarketplaceError>;

    /// Marks the order as deleted, along with its payment if that payment is PENDING or FAILED.
    async fn soft_delete_order(&self, order: &Order) -> Result<Order, MarketplaceError>;

    /// PENDING -> FAILED for the payment with the given order key, recording the gateway's code and message.
    async fn mark_payment_failed(
        &self,
        order_key: &OrderId,
        code: &str,
        message: &str,
    ) -> Result<Payment, MarketplaceError>;

    /// Closes a gateway confirmation in one transaction:
    /// * re-reads the payment and checks it is still PENDING,
    /// * stores the receipt and card receipt built from `confirmation`,
    /// * moves the payment to SUCCESS and records the payment key.
    ///
    /// If another confirmation with the same payment key won the race, the stored records are returned with
    /// `inserted == false`. Any other non-PENDING state is `AlreadyProcessed`.
    async fn complete_payment(
        &self,
        order_key: &OrderId,
        payment_key: &str,
        confirmation: &PaymentConfirmation,
    ) -> Result<CompletedPayment, MarketplaceError>;

    /// SUCCESS -> CANCELED for the payment with the given order key, recording the reason and the time.
    async fn record_payment_cancellation(
        &self,
        order_key: &OrderId,
        cancel_reason: &str,
    ) -> Result<Payment, MarketplaceError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}
